//! Message types for inter-layer communication in the actor-based architecture.
//!
//! Subscriber handles talk to the fetch actor with `LoaderCommand`; the viewer
//! binary turns key presses into `UiEvent` and draws from `RenderState`.

pub mod loader;
pub mod render;
pub mod ui_events;

pub use loader::LoaderCommand;
pub use render::RenderState;
pub use ui_events::UiEvent;
