//! Fetch failure taxonomy
//!
//! Every variant is recovered into `FetchState::error`; none of them is
//! returned across the subscription boundary.

use thiserror::Error;

/// Why a single fetch attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Request could not be sent, the connection failed, or it timed out
    #[error("network error: {0}")]
    Network(String),

    /// Server answered with a non-2xx status
    #[error("HTTP {status}")]
    Http { status: u16 },

    /// 2xx with no usable body
    #[error("response has no data")]
    EmptyResponse,

    /// Body was not JSON, or not the shape the subscriber asked for
    #[error("could not decode response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Build a network error from a reqwest send failure
    pub fn from_send(e: &reqwest::Error, timeout_secs: u64) -> Self {
        let msg = if e.is_timeout() {
            format!("request timed out ({}s)", timeout_secs)
        } else if e.is_connect() {
            format!("connection failed: {}", e)
        } else {
            format!("request failed: {}", e)
        };
        FetchError::Network(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(FetchError::Http { status: 404 }.to_string(), "HTTP 404");
        assert_eq!(FetchError::EmptyResponse.to_string(), "response has no data");
        assert_eq!(
            FetchError::Network("connection failed: refused".into()).to_string(),
            "network error: connection failed: refused"
        );
    }
}
