//! Infrastructure layer - External service integrations
//!
//! This layer contains:
//! - The chain client trait with its REST and mock implementations
//! - The Tokio-side fetch hooks and pollers that drive the store

pub mod runtime;
pub mod sdk;

pub use runtime::{spawn_poller, DataFetcher, Liveness, PollHandle, Screen};
pub use sdk::{create_client, ChainClient};
