pub mod context;
pub mod error;
pub mod route;

pub use context::{AppContext, ClientFactory};
pub use error::{ClientError, ExplorerError};
pub use route::Route;
