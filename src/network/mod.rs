//! Network layer - resource fetching
//!
//! The fetch actor receives loader commands and runs fetches through a
//! `Fetcher`; results are settled straight into the subscriber's state cell.

pub mod actor;
pub mod client;

pub use actor::FetchActor;
pub use client::{Fetcher, HttpFetcher};
