//! Chain SDK contract and its implementations
//!
//! Every network read goes through [`ChainClient`]. Two implementations are
//! interchangeable behind it: [`RestClient`] talks to a node's REST API and
//! [`MockClient`] serves fixture data. [`create_client`] picks one once, at
//! initialization.

mod mock;
mod parse;
mod rest;

use std::sync::Arc;

use crate::config::Config;
use crate::core::{ClientError, ExplorerError};
use crate::domain::{AccountInfo, LedgerInfo, Resource, Transaction, TransactionDetail};

pub use mock::MockClient;
pub use rest::RestClient;

/// Operations the explorer needs from a chain node.
#[async_trait::async_trait]
pub trait ChainClient: Send + Sync + 'static {
    /// Current ledger header (height, epoch, chain id)
    async fn ledger_info(&self) -> Result<LedgerInfo, ClientError>;

    /// Most recent transactions, newest first
    async fn transactions(&self, limit: usize) -> Result<Vec<Transaction>, ClientError>;

    /// A single transaction by its canonical hash
    async fn transaction_by_hash(&self, hash: &str) -> Result<TransactionDetail, ClientError>;

    /// All resources stored under a canonical address
    async fn account_resources(&self, address: &str) -> Result<Vec<Resource>, ClientError>;

    async fn account(&self, address: &str) -> Result<AccountInfo, ClientError>;

    /// Endpoint display name
    fn endpoint_name(&self) -> String;
}

/// Build the client for `config`.
///
/// In debug mode a client that cannot be constructed is replaced by the
/// mock; otherwise the failure is returned.
pub fn create_client(config: &Config) -> Result<Arc<dyn ChainClient>, ExplorerError> {
    let url = config.rpc_url();
    match RestClient::connect(&url) {
        Ok(client) => {
            log::info!("using chain endpoint {}", client.endpoint_name());
            Ok(Arc::new(client))
        }
        Err(err) if config.debug => {
            log::warn!("{err}; debug mode, falling back to mock data");
            Ok(Arc::new(MockClient::new()))
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_mode_falls_back_to_mock() {
        let config = Config {
            rpc_url: Some("not a url".into()),
            debug: true,
            ..Config::default()
        };
        let client = create_client(&config).unwrap();
        assert_eq!(client.endpoint_name(), "mock");
    }

    #[test]
    fn production_init_failure_is_terminal() {
        let config = Config {
            rpc_url: Some("not a url".into()),
            ..Config::default()
        };
        assert!(matches!(
            create_client(&config),
            Err(ExplorerError::InitializationFailure(_))
        ));
    }

    #[test]
    fn valid_url_builds_rest_client() {
        let config = Config {
            rpc_url: Some("http://127.0.0.1:8080/v1/".into()),
            ..Config::default()
        };
        let client = create_client(&config).unwrap();
        assert_eq!(client.endpoint_name(), "http://127.0.0.1:8080/v1");
    }
}
