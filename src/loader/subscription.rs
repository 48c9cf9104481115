//! Subscriber handle - one consumer's view of one resource

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::{mpsc, watch};

use crate::error::FetchError;
use crate::loader::cell::{StateCell, StateSink};
use crate::messages::LoaderCommand;
use crate::models::{FetchState, ResourceRequest, SubscriberId};

/// A mounted subscriber.
///
/// Dropping it unmounts: the pending fetch is aborted and its completion, if
/// it still races in, is discarded.
pub struct Subscription<T> {
    id: SubscriberId,
    cell: Arc<StateCell<T>>,
    rx: watch::Receiver<FetchState<T>>,
    last_request: Option<ResourceRequest>,
    commands: mpsc::UnboundedSender<LoaderCommand>,
    /// Set by `RemoteResourceLoader::shutdown`
    closed: Arc<AtomicBool>,
}

impl<T> Subscription<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        id: SubscriberId,
        commands: mpsc::UnboundedSender<LoaderCommand>,
        closed: Arc<AtomicBool>,
    ) -> Self {
        let cell = Arc::new(StateCell::new());
        let rx = cell.subscribe();
        Subscription {
            id,
            cell,
            rx,
            last_request: None,
            commands,
            closed,
        }
    }

    /// Register interest in `request` and return the current state.
    ///
    /// A request equal to the previous one is a no-op. Anything else issues
    /// exactly one fetch, which supersedes the one in flight.
    pub fn subscribe(&mut self, request: ResourceRequest) -> FetchState<T> {
        if self.last_request.as_ref() == Some(&request) {
            return self.state();
        }

        let generation = self.cell.begin();
        tracing::info!(
            subscriber = self.id,
            generation,
            url = %request.url,
            refresh_key = request.refresh_key,
            "Issuing fetch"
        );

        let sink: Arc<dyn StateSink> = self.cell.clone();
        let cmd = LoaderCommand::Fetch {
            id: self.id,
            generation,
            url: request.url.clone(),
            sink,
        };
        // A fetch queued behind Shutdown is failed by the actor's drain
        if self.closed.load(Ordering::SeqCst) || self.commands.send(cmd).is_err() {
            tracing::warn!(subscriber = self.id, "Loader is shut down; fetch not issued");
            self.cell.fail(
                generation,
                FetchError::Network(String::from("loader is shut down")),
            );
        }

        self.last_request = Some(request);
        self.state()
    }

    /// Re-issue the current request with the next refresh key
    pub fn refresh(&mut self) -> FetchState<T> {
        match &self.last_request {
            Some(request) => {
                let next = request.refreshed();
                self.subscribe(next)
            }
            None => self.state(),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> FetchState<T> {
        self.rx.borrow().clone()
    }

    /// Last request passed to `subscribe`
    pub fn request(&self) -> Option<&ResourceRequest> {
        self.last_request.as_ref()
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Independent receiver for the state, e.g. for a render loop
    pub fn watch(&self) -> watch::Receiver<FetchState<T>> {
        self.rx.clone()
    }

    /// Wait for the next state change and return it
    pub async fn changed(&mut self) -> FetchState<T> {
        let _ = self.rx.changed().await;
        self.rx.borrow_and_update().clone()
    }

    /// Wait until no fetch is pending and return the settled state
    pub async fn settled(&mut self) -> FetchState<T> {
        let settled = self
            .rx
            .wait_for(|state| !state.loading)
            .await
            .map(|state| state.clone());
        settled.unwrap_or_else(|_| self.state())
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.cell.retire();
        if self.last_request.is_some() {
            let _ = self.commands.send(LoaderCommand::Cancel(self.id));
        }
        tracing::debug!(subscriber = self.id, "Subscriber unmounted");
    }
}
