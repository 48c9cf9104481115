//! HTTP client wrapper - fetches a URL and classifies the outcome

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;

use crate::config::Config;
use crate::error::FetchError;

/// The network boundary of the loader.
///
/// Implementations return the parsed JSON body; any shape is passed through.
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    async fn fetch(&self, url: &str) -> Result<Value, FetchError>;
}

/// `Fetcher` backed by a shared reqwest client
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Self {
        HttpFetcher {
            client: create_client(config.timeout_secs, &config.user_agent),
            timeout_secs: config.timeout_secs,
        }
    }

    pub fn with_client(client: reqwest::Client, timeout_secs: u64) -> Self {
        HttpFetcher {
            client,
            timeout_secs,
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        let resp = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::from_send(&e, self.timeout_secs))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::Network(format!("error reading body: {}", e)))?;

        parse_body(&body)
    }
}

/// Parse a 2xx body. Blank bodies and a bare `null` count as empty.
pub fn parse_body(body: &str) -> Result<Value, FetchError> {
    if body.trim().is_empty() {
        return Err(FetchError::EmptyResponse);
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Null) => Err(FetchError::EmptyResponse),
        Ok(json) => Ok(json),
        Err(e) => Err(FetchError::Decode(e.to_string())),
    }
}

/// Create an HTTP client with the given timeout
pub fn create_client(timeout_secs: u64, user_agent: &str) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(user_agent)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
