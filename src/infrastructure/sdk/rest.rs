//! REST implementation of the chain client

use std::time::Duration;

use serde_json::Value;

use super::parse::{
    parse_account_info, parse_ledger_info, parse_resources, parse_transaction_detail,
    parse_transactions,
};
use super::ChainClient;
use crate::core::{ClientError, ExplorerError};
use crate::domain::{AccountInfo, LedgerInfo, Resource, Transaction, TransactionDetail};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for a node's `/v1` REST API
pub struct RestClient {
    http: reqwest::Client,
    base: String,
}

impl RestClient {
    /// Validate the endpoint and build the HTTP client. No request is made.
    pub fn connect(url: &str) -> Result<Self, ExplorerError> {
        let base = url.trim().trim_end_matches('/').to_string();
        let parsed = reqwest::Url::parse(&base).map_err(|err| {
            ExplorerError::InitializationFailure(format!("invalid RPC URL `{url}`: {err}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ExplorerError::InitializationFailure(format!(
                "unsupported RPC URL scheme `{}`",
                parsed.scheme()
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| ExplorerError::InitializationFailure(err.to_string()))?;

        Ok(Self { http, base })
    }

    async fn get_json(&self, path: &str) -> Result<Value, ClientError> {
        let url = format!("{}{}", self.base, path);
        log::debug!("GET {url}");

        let res = self.http.get(&url).send().await?;
        let status = res.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound);
        }
        if !status.is_success() {
            let body: Value = res.json().await.unwrap_or(Value::Null);
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("no message");
            return Err(ClientError::Network(format!("HTTP {status}: {message}")));
        }
        res.json::<Value>()
            .await
            .map_err(|err| ClientError::Decode(err.to_string()))
    }
}

fn transactions_path(limit: usize) -> String {
    format!("/transactions?limit={}", limit.max(1))
}

#[async_trait::async_trait]
impl ChainClient for RestClient {
    async fn ledger_info(&self) -> Result<LedgerInfo, ClientError> {
        parse_ledger_info(&self.get_json("/").await?)
    }

    async fn transactions(&self, limit: usize) -> Result<Vec<Transaction>, ClientError> {
        // Without `start` the node returns the latest page
        let json = self.get_json(&transactions_path(limit)).await?;
        parse_transactions(&json)
    }

    async fn transaction_by_hash(&self, hash: &str) -> Result<TransactionDetail, ClientError> {
        let json = self
            .get_json(&format!("/transactions/by_hash/{hash}"))
            .await?;
        parse_transaction_detail(&json)
    }

    async fn account_resources(&self, address: &str) -> Result<Vec<Resource>, ClientError> {
        let json = self
            .get_json(&format!("/accounts/{address}/resources"))
            .await?;
        parse_resources(&json)
    }

    async fn account(&self, address: &str) -> Result<AccountInfo, ClientError> {
        parse_account_info(&self.get_json(&format!("/accounts/{address}")).await?)
    }

    fn endpoint_name(&self) -> String {
        self.base.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_page_needs_no_ledger_lookup() {
        assert_eq!(transactions_path(25), "/transactions?limit=25");
        assert_eq!(transactions_path(0), "/transactions?limit=1");
    }

    #[test]
    fn rejects_non_http_endpoints() {
        assert!(matches!(
            RestClient::connect("ftp://node"),
            Err(ExplorerError::InitializationFailure(_))
        ));
        let client = RestClient::connect("https://node.example/v1/").unwrap();
        assert_eq!(client.endpoint_name(), "https://node.example/v1");
    }
}
