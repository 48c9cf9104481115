//! Per-subscriber state cell with the stale-response guard

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;

use crate::error::FetchError;
use crate::models::FetchState;

/// Type-erased target a fetch task settles into
pub trait StateSink: Send + Sync {
    /// Apply the outcome of the fetch issued as `generation`.
    ///
    /// Returns false when a newer request was issued since, the generation
    /// already settled, or the owner unmounted; the state is then left
    /// untouched.
    fn settle(&self, generation: u64, result: Result<Value, FetchError>) -> bool;
}

/// Owns one subscriber's `FetchState`.
///
/// `generation` and `retired` only change inside the watch channel's write
/// lock, so a settle can never interleave with a newer `begin`.
pub struct StateCell<T> {
    tx: watch::Sender<FetchState<T>>,
    generation: AtomicU64,
    retired: AtomicBool,
}

impl<T> StateCell<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(FetchState::initial());
        StateCell {
            tx,
            generation: AtomicU64::new(0),
            retired: AtomicBool::new(false),
        }
    }

    /// Mark loading and open a new generation; completions of older
    /// generations are discarded from here on.
    pub fn begin(&self) -> u64 {
        let mut issued = 0;
        self.tx.send_modify(|state| {
            issued = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.begin();
        });
        issued
    }

    /// Settle without going through the network (e.g. the actor is gone)
    pub fn fail(&self, generation: u64, error: FetchError) -> bool {
        self.apply(generation, Err(error))
    }

    /// Unmount: nothing may write the state after this
    pub fn retire(&self) {
        self.tx.send_if_modified(|_| {
            self.retired.store(true, Ordering::SeqCst);
            self.generation.fetch_add(1, Ordering::SeqCst);
            false
        });
    }

    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.tx.subscribe()
    }

    fn apply(&self, generation: u64, outcome: Result<T, FetchError>) -> bool {
        self.tx.send_if_modified(|state| {
            if self.retired.load(Ordering::SeqCst)
                || self.generation.load(Ordering::SeqCst) != generation
                || !state.loading
            {
                return false;
            }
            match outcome {
                Ok(data) => state.succeed(data),
                Err(error) => state.fail(error),
            }
            true
        })
    }
}

impl<T> Default for StateCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> StateSink for StateCell<T>
where
    T: DeserializeOwned + Send + Sync,
{
    fn settle(&self, generation: u64, result: Result<Value, FetchError>) -> bool {
        let decoded = result.and_then(|body| {
            serde_json::from_value::<T>(body).map_err(|e| FetchError::Decode(e.to_string()))
        });
        self.apply(generation, decoded)
    }
}
