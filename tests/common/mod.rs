//! Scripted chain client shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use peek::config::Config;
use peek::core::ClientError;
use peek::domain::{
    normalize_address, AccountInfo, LedgerInfo, Resource, Transaction, TransactionDetail, TxStatus,
};
use peek::infrastructure::sdk::ChainClient;
use peek::{AppContext, DataFetcher};
use serde_json::json;

pub const ACCOUNT: &str = "9A710919b1a1e67eda335269c0085c91";
pub const TX_HASH: &str = "0xcf4776b92c291291e0ee31107ab5984acba3f3ed5a76b5406d8dcf22d1834d18";

/// Answers from fixed data after `delay`, counting every call.
pub struct ScriptedClient {
    pub delay: Duration,
    pub fail_ledger: AtomicBool,
    pub fail_transactions: AtomicBool,
    pub ledger_calls: AtomicUsize,
    pub transaction_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub account_calls: AtomicUsize,
    pub resource_calls: AtomicUsize,
    height: AtomicU64,
}

impl ScriptedClient {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            fail_ledger: AtomicBool::new(false),
            fail_transactions: AtomicBool::new(false),
            ledger_calls: AtomicUsize::new(0),
            transaction_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
            account_calls: AtomicUsize::new(0),
            resource_calls: AtomicUsize::new(0),
            height: AtomicU64::new(100),
        })
    }

    pub fn ledger_count(&self) -> usize {
        self.ledger_calls.load(Ordering::SeqCst)
    }

    pub fn account_count(&self) -> usize {
        self.account_calls.load(Ordering::SeqCst)
    }

    pub fn detail_count(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.ledger_count()
            + self.transaction_calls.load(Ordering::SeqCst)
            + self.detail_count()
            + self.account_count()
            + self.resource_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    fn transaction(&self, version: u64) -> Transaction {
        Transaction {
            hash: format!("0x{version:064x}"),
            version,
            sender: None,
            sequence_number: None,
            timestamp_us: 1_700_000_000_000_000 + version,
            tx_type: "block_metadata_transaction".into(),
            status: TxStatus::Success,
            gas_used: 0,
            gas_unit_price: 0,
            block_height: Some(version),
        }
    }
}

#[async_trait::async_trait]
impl ChainClient for ScriptedClient {
    async fn ledger_info(&self) -> Result<LedgerInfo, ClientError> {
        self.ledger_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_ledger.load(Ordering::SeqCst) {
            return Err(ClientError::Network("ledger unavailable".into()));
        }
        let height = self.height.fetch_add(1, Ordering::SeqCst);
        Ok(LedgerInfo {
            chain_id: "1".into(),
            epoch: 7,
            block_height: height,
            ledger_version: height * 3,
            ledger_timestamp_us: 1_700_000_000_000_000 + height * 1_000_000,
        })
    }

    async fn transactions(&self, limit: usize) -> Result<Vec<Transaction>, ClientError> {
        self.transaction_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_transactions.load(Ordering::SeqCst) {
            return Err(ClientError::Network("transactions unavailable".into()));
        }
        Ok((0..limit as u64).rev().map(|v| self.transaction(v)).collect())
    }

    async fn transaction_by_hash(&self, hash: &str) -> Result<TransactionDetail, ClientError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if hash != TX_HASH {
            return Err(ClientError::NotFound);
        }
        let mut summary = self.transaction(9);
        summary.hash = TX_HASH.into();
        Ok(TransactionDetail {
            summary,
            vm_status: "Executed successfully".into(),
            epoch: Some(7),
            round: Some(1),
            state_change_hash: None,
            event_root_hash: None,
            accumulator_root_hash: None,
            events: Vec::new(),
            changes: Vec::new(),
            payload: serde_json::Value::Null,
        })
    }

    async fn account_resources(&self, address: &str) -> Result<Vec<Resource>, ClientError> {
        self.resource_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if Some(address) != normalize_address(ACCOUNT).ok().as_deref() {
            return Err(ClientError::NotFound);
        }
        Ok(vec![
            Resource {
                type_name: "0x1::coin::CoinStore<0x1::libra_coin::LibraCoin>".into(),
                data: json!({"coin": {"value": "500"}}),
            },
            Resource {
                type_name: "0x1::vouch::MyVouches".into(),
                data: json!({"my_buddies": []}),
            },
        ])
    }

    async fn account(&self, address: &str) -> Result<AccountInfo, ClientError> {
        self.account_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if Some(address) != normalize_address(ACCOUNT).ok().as_deref() {
            return Err(ClientError::NotFound);
        }
        Ok(AccountInfo {
            sequence_number: 3,
            authentication_key: None,
        })
    }

    fn endpoint_name(&self) -> String {
        "scripted".into()
    }
}

pub fn fetcher_with(client: Arc<ScriptedClient>, config: Config) -> Arc<DataFetcher> {
    DataFetcher::new(AppContext::with_client(config, client))
}

pub fn fetcher(client: Arc<ScriptedClient>) -> Arc<DataFetcher> {
    fetcher_with(client, Config::default())
}
