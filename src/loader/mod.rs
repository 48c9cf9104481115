//! Loader layer - remote resources exposed as `{data, loading, error}`
//!
//! Each `Subscription` owns its own `FetchState`. Fetches run on the fetch
//! actor; completions are settled straight into the subscriber's cell, which
//! drops anything older than the last issued request.

pub mod cell;
pub mod subscription;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::mpsc;

use crate::messages::LoaderCommand;
use crate::models::ResourceRequest;
use crate::network::{FetchActor, Fetcher};

pub use subscription::Subscription;

/// Handle to a running loader. Cheap to clone; all clones share one actor.
#[derive(Clone)]
pub struct RemoteResourceLoader {
    commands: mpsc::UnboundedSender<LoaderCommand>,
    next_id: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl RemoteResourceLoader {
    /// Start the fetch actor on the current Tokio runtime
    pub fn spawn<F: Fetcher>(fetcher: F) -> Self {
        Self::spawn_shared(Arc::new(fetcher))
    }

    pub fn spawn_shared(fetcher: Arc<dyn Fetcher>) -> Self {
        let (commands, cmd_rx) = mpsc::unbounded_channel();
        tokio::spawn(FetchActor::new(fetcher).run(cmd_rx));
        RemoteResourceLoader {
            commands,
            next_id: Arc::new(AtomicU64::new(1)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Mount a subscriber with nothing requested yet
    pub fn subscriber<T>(&self) -> Subscription<T>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Subscription::new(id, self.commands.clone(), self.closed.clone())
    }

    /// Mount a subscriber and issue its first request
    pub fn subscribe<T>(&self, request: ResourceRequest) -> Subscription<T>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let mut subscription = self.subscriber();
        subscription.subscribe(request);
        subscription
    }

    /// Abort every in-flight fetch and stop the actor.
    ///
    /// Pending fetches settle with a `Network` error; later subscribes fail
    /// immediately the same way.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let _ = self.commands.send(LoaderCommand::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedFetcher;
    use super::*;
    use crate::error::FetchError;
    use serde::Deserialize;
    use serde_json::{json, Value};
    use std::time::Duration;

    const CURRENT: &str = "/current.json?q=Warwick,RI";

    fn loader(fetcher: &Arc<ScriptedFetcher>) -> RemoteResourceLoader {
        RemoteResourceLoader::spawn_shared(fetcher.clone())
    }

    async fn let_tasks_run() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_weather_example() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond(CURRENT, Ok(json!({"temp_f": 72, "condition": {"text": "Clear"}})));
        let loader = loader(&fetcher);

        let mut sub = loader.subscriber::<Value>();
        let first = sub.subscribe(ResourceRequest::new(CURRENT));
        assert!(first.loading);
        assert!(first.data.is_none());
        assert!(first.error.is_none());

        let state = sub.settled().await;
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(state.data.unwrap()["condition"]["text"], "Clear");
        assert_eq!(fetcher.calls(), vec![CURRENT.to_string()]);

        let refreshing = sub.subscribe(ResourceRequest::new(CURRENT).with_refresh_key(1));
        assert!(refreshing.loading);
        assert!(refreshing.data.is_some());
        sub.settled().await;
        assert_eq!(fetcher.call_count(), 2);
    }

    #[tokio::test]
    async fn test_identical_request_does_not_refetch() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("/a", Ok(json!({"id": 1})));
        let loader = loader(&fetcher);

        let mut sub = loader.subscribe::<Value>(ResourceRequest::new("/a"));
        sub.settled().await;

        let again = sub.subscribe(ResourceRequest::new("/a"));
        assert!(!again.loading);
        let_tasks_run().await;
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_one_fetch_per_distinct_request() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("/a", Ok(json!("a")));
        fetcher.respond("/b", Ok(json!("b")));
        let loader = loader(&fetcher);

        let mut sub = loader.subscriber::<Value>();
        for request in [
            ResourceRequest::new("/a"),
            ResourceRequest::new("/a"),
            ResourceRequest::new("/b"),
            ResourceRequest::new("/b").with_refresh_key(1),
            ResourceRequest::new("/b").with_refresh_key(1),
        ] {
            sub.subscribe(request);
            sub.settled().await;
        }

        assert_eq!(fetcher.calls(), vec!["/a", "/b", "/b"]);
        assert_eq!(sub.state().data, Some(json!("b")));
    }

    #[tokio::test]
    async fn test_later_request_wins_when_it_resolves_first() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let slow = fetcher.gate("/r1");
        let fast = fetcher.gate("/r2");
        let loader = loader(&fetcher);

        let mut sub = loader.subscribe::<Value>(ResourceRequest::new("/r1"));
        let_tasks_run().await;
        sub.subscribe(ResourceRequest::new("/r2"));
        let_tasks_run().await;

        let _ = fast.send(Ok(json!({"from": "r2"})));
        let state = sub.settled().await;
        assert_eq!(state.data, Some(json!({"from": "r2"})));

        // r1 was aborted when superseded; a late answer must change nothing
        let _ = slow.send(Ok(json!({"from": "r1"})));
        let_tasks_run().await;
        assert_eq!(sub.state().data, Some(json!({"from": "r2"})));
        assert!(!sub.state().loading);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_data() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("/products/3.json", Ok(json!({"title": "Backpack"})));
        let loader = loader(&fetcher);

        let mut sub = loader.subscribe::<Value>(ResourceRequest::new("/products/3.json"));
        assert!(sub.settled().await.is_ready());

        fetcher.respond("/products/3.json", Err(FetchError::Http { status: 503 }));
        sub.refresh();
        let state = sub.settled().await;

        assert_eq!(state.data, Some(json!({"title": "Backpack"})));
        assert_eq!(state.error, Some(FetchError::Http { status: 503 }));
        assert!(!state.loading);

        // Failures are terminal; the next refresh is the retry
        fetcher.respond("/products/3.json", Ok(json!({"title": "Backpack v2"})));
        sub.refresh();
        let state = sub.settled().await;
        assert!(state.error.is_none());
        assert_eq!(state.data, Some(json!({"title": "Backpack v2"})));
        assert_eq!(fetcher.call_count(), 3);
    }

    #[tokio::test]
    async fn test_unmount_during_fetch() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let gate = fetcher.gate("/slow");
        let loader = loader(&fetcher);

        let sub = loader.subscribe::<Value>(ResourceRequest::new("/slow"));
        let rx = sub.watch();
        let_tasks_run().await;
        drop(sub);
        let_tasks_run().await;

        let _ = gate.send(Ok(json!({"late": true})));
        let_tasks_run().await;

        let state = rx.borrow().clone();
        assert!(state.loading);
        assert!(state.data.is_none());
    }

    #[tokio::test]
    async fn test_subscribers_are_independent() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("/current.json", Ok(json!({"temp_f": 60})));
        fetcher.respond("/forecast.json", Err(FetchError::EmptyResponse));
        let loader = loader(&fetcher);

        let mut current = loader.subscribe::<Value>(ResourceRequest::new("/current.json"));
        let mut forecast = loader.subscribe::<Value>(ResourceRequest::new("/forecast.json"));
        assert_ne!(current.id(), forecast.id());

        assert!(current.settled().await.is_ready());
        let forecast_state = forecast.settled().await;
        assert_eq!(forecast_state.error, Some(FetchError::EmptyResponse));
        assert!(forecast_state.data.is_none());
    }

    #[tokio::test]
    async fn test_typed_subscription() {
        #[derive(Debug, Clone, PartialEq, Deserialize)]
        struct Condition {
            text: String,
        }

        #[derive(Debug, Clone, PartialEq, Deserialize)]
        struct Current {
            temp_f: f64,
            condition: Condition,
        }

        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond(CURRENT, Ok(json!({"temp_f": 72, "condition": {"text": "Clear"}, "uv": 5})));
        fetcher.respond("/broken", Ok(json!({"temp_f": "hot"})));
        let loader = loader(&fetcher);

        let mut sub = loader.subscribe::<Current>(ResourceRequest::new(CURRENT));
        let state = sub.settled().await;
        assert_eq!(
            state.data,
            Some(Current {
                temp_f: 72.0,
                condition: Condition { text: "Clear".into() }
            })
        );

        sub.subscribe(ResourceRequest::new("/broken"));
        let state = sub.settled().await;
        assert!(matches!(state.error, Some(FetchError::Decode(_))));
        assert_eq!(state.data.map(|c| c.temp_f), Some(72.0));
    }

    #[tokio::test]
    async fn test_refresh_without_request_is_noop() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let loader = loader(&fetcher);

        let mut sub = loader.subscriber::<Value>();
        let state = sub.refresh();
        assert_eq!(state, crate::models::FetchState::initial());
        assert!(sub.request().is_none());
        let_tasks_run().await;
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_subscribe_after_shutdown_reports_error() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let loader = loader(&fetcher);
        loader.shutdown();

        // No yield: the actor has not seen Shutdown yet
        let mut sub = loader.subscriber::<Value>();
        let state = sub.subscribe(ResourceRequest::new("/a"));
        assert!(!state.loading);
        assert!(matches!(state.error, Some(FetchError::Network(_))));

        let_tasks_run().await;
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_queued_behind_shutdown_is_failed() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let loader = loader(&fetcher);

        // Shutdown sent without setting the loader's flag, so the Fetch
        // reaches the channel behind it
        let _ = loader.commands.send(LoaderCommand::Shutdown);
        let mut sub = loader.subscriber::<Value>();
        assert!(sub.subscribe(ResourceRequest::new("/a")).loading);

        let state = tokio::time::timeout(Duration::from_secs(1), sub.settled())
            .await
            .expect("queued fetch never settled");
        assert!(!state.loading);
        assert_eq!(
            state.error,
            Some(FetchError::Network("loader is shut down".into()))
        );
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_in_flight_fetch_fails_on_shutdown() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("/slow", Ok(json!({"v": 1})));
        let loader = loader(&fetcher);

        let mut sub = loader.subscribe::<Value>(ResourceRequest::new("/slow"));
        assert!(sub.settled().await.is_ready());

        let _gate = fetcher.gate("/slow");
        sub.refresh();
        let_tasks_run().await;
        loader.shutdown();

        let state = tokio::time::timeout(Duration::from_secs(1), sub.settled())
            .await
            .expect("in-flight fetch never settled");
        assert!(!state.loading);
        assert!(matches!(state.error, Some(FetchError::Network(_))));
        assert_eq!(state.data, Some(json!({"v": 1})));
    }
}
