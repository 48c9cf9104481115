//! Scripted `Fetcher` for loader tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::FetchError;
use crate::network::Fetcher;

type Outcome = Result<Value, FetchError>;

/// Answers per URL, either immediately or when the test opens a gate
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    calls: Mutex<Vec<String>>,
    responses: Mutex<HashMap<String, Outcome>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<Outcome>>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every fetch of `url` with `outcome` right away
    pub fn respond(&self, url: &str, outcome: Outcome) {
        self.responses.lock().unwrap().insert(url.to_string(), outcome);
    }

    /// Hold the next fetch of `url` until the returned sender fires
    pub fn gate(&self, url: &str) -> oneshot::Sender<Outcome> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(url.to_string(), rx);
        tx
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());

        let gate = self.gates.lock().unwrap().remove(url);
        if let Some(rx) = gate {
            return rx
                .await
                .unwrap_or_else(|_| Err(FetchError::Network("gate dropped".into())));
        }

        let canned = self.responses.lock().unwrap().get(url).cloned();
        canned.unwrap_or_else(|| Err(FetchError::Network(format!("no route for {}", url))))
    }
}
