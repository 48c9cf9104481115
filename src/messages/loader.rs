//! Loader messages - communication between subscriber handles and the fetch actor

use std::fmt;
use std::sync::Arc;

use crate::loader::cell::StateSink;
use crate::models::SubscriberId;

/// Commands sent from subscriber handles to the fetch actor
pub enum LoaderCommand {
    /// Fetch `url` and settle the result into `sink` under `generation`.
    /// Supersedes any fetch still running for the same subscriber.
    Fetch {
        id: SubscriberId,
        generation: u64,
        url: String,
        sink: Arc<dyn StateSink>,
    },
    /// Subscriber unmounted; abort whatever it has in flight
    Cancel(SubscriberId),
    /// Abort everything and stop the actor
    Shutdown,
}

impl LoaderCommand {
    /// Subscriber the command concerns, if any
    pub fn id(&self) -> Option<SubscriberId> {
        match self {
            LoaderCommand::Fetch { id, .. } => Some(*id),
            LoaderCommand::Cancel(id) => Some(*id),
            LoaderCommand::Shutdown => None,
        }
    }
}

impl fmt::Debug for LoaderCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderCommand::Fetch { id, generation, url, .. } => f
                .debug_struct("Fetch")
                .field("id", id)
                .field("generation", generation)
                .field("url", url)
                .finish_non_exhaustive(),
            LoaderCommand::Cancel(id) => f.debug_tuple("Cancel").field(id).finish(),
            LoaderCommand::Shutdown => f.write_str("Shutdown"),
        }
    }
}
