//! App layer - viewer state and event processing
//!
//! The App actor receives UI events and fetch state changes, updates the
//! viewer state and emits render state.

pub mod actor;
pub mod state;

pub use actor::AppActor;
pub use state::ViewerState;
