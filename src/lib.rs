//! # loadstate
//!
//! Remote JSON resources exposed as `{data, loading, error}`.
//!
//! ## Features
//! - One fetch per distinct `(url, refresh_key)` request
//! - Stale-while-loading: the last good data stays visible while refetching
//!   and after a failed attempt
//! - Last request wins: older completions never overwrite newer ones
//! - Dropping a subscription cancels its fetch
//! - Key-value store service for favorites and saved locations
//! - Terminal viewer binary
//!
//! ## Architecture
//! Actor-based with channels:
//! - UI Layer (Ratatui) - synchronous
//! - App Layer (viewer state)
//! - Loader Layer (subscriptions + fetch actor on Tokio)
//!
//! ```ignore
//! let loader = RemoteResourceLoader::spawn(HttpFetcher::default());
//! let mut sub = loader.subscribe::<serde_json::Value>(ResourceRequest::new(url));
//! let state = sub.settled().await;
//! sub.refresh();
//! ```

pub mod app;
pub mod config;
pub mod constants;
pub mod error;
pub mod loader;
pub mod messages;
pub mod models;
pub mod network;
pub mod storage;
pub mod ui;

// Re-export commonly used types
pub use error::FetchError;
pub use loader::{RemoteResourceLoader, Subscription};
pub use models::{ApiEndpoint, FetchState, ResourceRequest, SubscriberId};
pub use network::{Fetcher, HttpFetcher};
pub use storage::{Favorites, FileStore, KeyValueStore, MemoryStore, SavedLocation, SavedLocations};
