//! Peek - data layer for a Move-chain explorer
//!
//! Normalizes addresses and hashes, maps resource types to URL slugs, keeps
//! fetched chain data in an observable store and drives it with
//! deduplicating fetch hooks and per-screen pollers.

pub mod config;
pub mod core;
pub mod domain;
pub mod infrastructure;
pub mod store;

pub use crate::config::Config;
pub use crate::core::{AppContext, ExplorerError, Route};
pub use crate::infrastructure::runtime::{
    spawn_poller, DataFetcher, Liveness, PollHandle, RefreshOutcome, RouteView, Screen,
    SearchResult,
};
pub use crate::store::Store;
