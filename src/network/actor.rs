//! Fetch actor - runs resource fetches in the Tokio async runtime

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinSet};

use crate::error::FetchError;
use crate::loader::cell::StateSink;
use crate::messages::LoaderCommand;
use crate::models::SubscriberId;
use crate::network::client::Fetcher;

/// Tracks the fetch a subscriber currently has in flight
struct ActiveFetch {
    generation: u64,
    abort: AbortHandle,
    sink: Arc<dyn StateSink>,
}

fn shut_down_error() -> FetchError {
    FetchError::Network(String::from("loader is shut down"))
}

/// Returned by every finished fetch task
struct Completion {
    id: SubscriberId,
    generation: u64,
}

/// Actor that owns every in-flight fetch.
///
/// At most one fetch per subscriber is alive: a newer `Fetch` or a `Cancel`
/// aborts the previous task.
pub struct FetchActor {
    fetcher: Arc<dyn Fetcher>,
    active_fetches: JoinSet<Completion>,
    in_flight: HashMap<SubscriberId, ActiveFetch>,
}

impl FetchActor {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        FetchActor {
            fetcher,
            active_fetches: JoinSet::new(),
            in_flight: HashMap::new(),
        }
    }

    /// Run the actor message loop
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<LoaderCommand>) {
        loop {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => {
                    if let Some(cmd) = &cmd {
                        tracing::trace!(id = ?cmd.id(), ?cmd, "Loader command");
                    }
                    match cmd {
                        Some(LoaderCommand::Fetch { id, generation, url, sink }) => {
                            self.abort(id, "superseded");

                            let fetcher = self.fetcher.clone();
                            let task_sink = sink.clone();
                            let abort = self.active_fetches.spawn(async move {
                                tracing::info!(id, generation, url = %url, "Fetching resource");
                                let result = fetcher.fetch(&url).await;
                                let failed = result.as_ref().err().map(ToString::to_string);
                                if task_sink.settle(generation, result) {
                                    match failed {
                                        Some(error) => tracing::warn!(id, generation, %error, "Fetch failed"),
                                        None => tracing::info!(id, generation, "Fetch settled"),
                                    }
                                } else {
                                    tracing::debug!(id, generation, "Discarded stale completion");
                                }
                                Completion { id, generation }
                            });

                            self.in_flight.insert(id, ActiveFetch { generation, abort, sink });
                        }

                        Some(LoaderCommand::Cancel(id)) => {
                            self.abort(id, "unmounted");
                        }

                        Some(LoaderCommand::Shutdown) | None => {
                            self.shutdown(&mut cmd_rx);
                            break;
                        }
                    }
                }

                // Forget finished fetches; aborted ones come back as JoinError
                Some(joined) = self.active_fetches.join_next() => {
                    if let Ok(done) = joined {
                        let current = self.in_flight.get(&done.id).map(|f| f.generation);
                        if current == Some(done.generation) {
                            self.in_flight.remove(&done.id);
                        }
                    }
                }
            }
        }
    }

    /// Abort everything and fail every fetch still pending, in flight or queued
    fn shutdown(&mut self, cmd_rx: &mut mpsc::UnboundedReceiver<LoaderCommand>) {
        tracing::info!(pending = self.in_flight.len(), "Fetch actor shutting down");
        self.active_fetches.abort_all();
        for (id, active) in self.in_flight.drain() {
            if active.sink.settle(active.generation, Err(shut_down_error())) {
                tracing::debug!(id, generation = active.generation, "Failed in-flight fetch on shutdown");
            }
        }

        cmd_rx.close();
        while let Ok(cmd) = cmd_rx.try_recv() {
            if let LoaderCommand::Fetch { id, generation, sink, .. } = cmd {
                tracing::debug!(id, generation, "Failed queued fetch on shutdown");
                sink.settle(generation, Err(shut_down_error()));
            }
        }
    }

    fn abort(&mut self, id: SubscriberId, reason: &'static str) {
        if let Some(active) = self.in_flight.remove(&id) {
            tracing::debug!(id, generation = active.generation, reason, "Aborting fetch");
            active.abort.abort();
        }
    }
}
