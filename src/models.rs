use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Identifies one subscriber handle
pub type SubscriberId = u64;

/// What a subscriber wants loaded.
///
/// Compared by value: a change of either field is a new request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub url: String,
    #[serde(default)]
    pub refresh_key: u64,
}

impl ResourceRequest {
    pub fn new(url: impl Into<String>) -> Self {
        ResourceRequest {
            url: url.into(),
            refresh_key: 0,
        }
    }

    pub fn with_refresh_key(mut self, refresh_key: u64) -> Self {
        self.refresh_key = refresh_key;
        self
    }

    /// Same URL, next refresh key
    pub fn refreshed(&self) -> Self {
        ResourceRequest {
            url: self.url.clone(),
            refresh_key: self.refresh_key.wrapping_add(1),
        }
    }
}

/// Snapshot of a subscriber's resource.
///
/// While `loading` is set, `data` and `error` still describe the last
/// completed fetch.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<FetchError>,
    /// Time of the last successful settle
    pub updated_at: Option<DateTime<Utc>>,
}

impl<T> FetchState<T> {
    /// State of a freshly mounted subscriber
    pub fn initial() -> Self {
        FetchState {
            data: None,
            loading: true,
            error: None,
            updated_at: None,
        }
    }

    /// Settled with data and no error
    pub fn is_ready(&self) -> bool {
        !self.loading && self.error.is_none() && self.data.is_some()
    }

    pub(crate) fn begin(&mut self) {
        self.loading = true;
    }

    pub(crate) fn succeed(&mut self, data: T) {
        self.data = Some(data);
        self.loading = false;
        self.error = None;
        self.updated_at = Some(Utc::now());
    }

    /// `data` is left untouched so the last good value survives
    pub(crate) fn fail(&mut self, error: FetchError) {
        self.loading = false;
        self.error = Some(error);
    }
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self::initial()
    }
}

/// An API base plus an optional key sent as a query parameter
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoint {
    pub base_url: String,
    pub api_key: Option<String>,
    pub key_param: String,
}

impl ApiEndpoint {
    pub fn new(base_url: impl Into<String>) -> Self {
        ApiEndpoint {
            base_url: base_url.into(),
            api_key: None,
            key_param: String::from(crate::constants::DEFAULT_KEY_PARAM),
        }
    }

    pub fn with_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Full URL for `path`, with the API key appended when configured.
    ///
    /// An absolute `path` replaces the base.
    pub fn url_for(&self, path: &str) -> Result<String> {
        let joined = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            let base = self.base_url.trim_end_matches('/');
            if path.is_empty() || path.starts_with('/') || path.starts_with('?') {
                format!("{}{}", base, path)
            } else {
                format!("{}/{}", base, path)
            }
        };

        let mut url = reqwest::Url::parse(&joined)
            .with_context(|| format!("Invalid resource URL {:?}", joined))?;

        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair(&self.key_param, key);
        }

        Ok(url.to_string())
    }

    /// Request for `path` with refresh key 0
    pub fn request(&self, path: &str) -> Result<ResourceRequest> {
        Ok(ResourceRequest::new(self.url_for(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_identity_is_by_value() {
        let a = ResourceRequest::new("/current.json?q=Warwick,RI");
        let b = ResourceRequest::new("/current.json?q=Warwick,RI");
        assert_eq!(a, b);
        assert_ne!(a, a.refreshed());
        assert_eq!(a.refreshed().refresh_key, 1);
        assert_ne!(a, ResourceRequest::new("/forecast.json?q=Warwick,RI"));
    }

    #[test]
    fn test_failure_keeps_data() {
        let mut state: FetchState<u32> = FetchState::initial();
        state.succeed(7);
        assert!(state.is_ready());
        assert!(state.updated_at.is_some());

        state.begin();
        assert_eq!(state.data, Some(7));
        assert!(state.loading);

        state.fail(FetchError::Http { status: 500 });
        assert_eq!(state.data, Some(7));
        assert!(!state.loading);
        assert_eq!(state.error, Some(FetchError::Http { status: 500 }));
    }

    #[test]
    fn test_endpoint_appends_key() {
        let endpoint = ApiEndpoint::new("https://api.weatherapi.com/v1").with_key("abc");
        let url = endpoint.url_for("/current.json?q=Warwick,RI").unwrap();
        assert_eq!(url, "https://api.weatherapi.com/v1/current.json?q=Warwick,RI&key=abc");
    }

    #[test]
    fn test_endpoint_without_key_or_query() {
        let endpoint = ApiEndpoint::new("https://example.com/products/");
        assert_eq!(
            endpoint.url_for("42.json").unwrap(),
            "https://example.com/products/42.json"
        );

        let keyed = endpoint.clone().with_key("k");
        assert_eq!(
            keyed.url_for("/42.json").unwrap(),
            "https://example.com/products/42.json?key=k"
        );
    }

    #[test]
    fn test_endpoint_rejects_garbage() {
        let endpoint = ApiEndpoint::new("not a url");
        assert!(endpoint.url_for("/x").is_err());
    }
}
