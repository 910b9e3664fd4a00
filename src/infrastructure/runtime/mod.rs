//! Runtime infrastructure - fetch hooks, request dedup and polling

mod fetcher;
mod inflight;
mod liveness;
mod poller;

pub use fetcher::{DataFetcher, RefreshOutcome, RouteView, SearchResult, SEARCH_NOT_FOUND};
pub use inflight::InFlight;
pub use liveness::Liveness;
pub use poller::{spawn_poller, PollHandle, Screen};
