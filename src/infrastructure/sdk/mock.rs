//! Fixture-backed chain client used in debug mode
//!
//! The ledger advances by one block per `ledger_info` call so polling views
//! show movement. Transaction hashes encode their version, which lets
//! `transaction_by_hash` answer for anything `transactions` handed out.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::json;

use super::ChainClient;
use crate::core::ClientError;
use crate::domain::{
    normalize_address, AccountInfo, LedgerInfo, Resource, Transaction, TransactionDetail, TxStatus,
};

const GENESIS_HEIGHT: u64 = 1_000_000;
const TXS_PER_BLOCK: u64 = 4;
const BLOCK_TIME_US: u64 = 400_000;
const START_TIMESTAMP_US: u64 = 1_700_000_000_000_000;

/// Validator fixture, also reachable by its legacy 32-digit form
const VALIDATOR: &str = "9a710919b1a1e67eda335269c0085c91";

pub struct MockClient {
    blocks: AtomicU64,
}

impl MockClient {
    pub fn new() -> Self {
        Self {
            blocks: AtomicU64::new(0),
        }
    }

    fn height(&self) -> u64 {
        GENESIS_HEIGHT + self.blocks.load(Ordering::SeqCst)
    }

    fn latest_version(&self) -> u64 {
        self.height() * TXS_PER_BLOCK
    }

    fn transaction(&self, version: u64) -> Transaction {
        let block_height = version / TXS_PER_BLOCK;
        let user = version % TXS_PER_BLOCK != 0;
        Transaction {
            hash: format!("0x{version:064x}"),
            version,
            sender: user.then(|| format!("0x{:064x}", version % 7 + 1)),
            sequence_number: user.then_some(version / 7),
            timestamp_us: START_TIMESTAMP_US + block_height * BLOCK_TIME_US,
            tx_type: if user {
                "user_transaction".into()
            } else {
                "block_metadata_transaction".into()
            },
            status: if version % 13 == 0 {
                TxStatus::Failure
            } else {
                TxStatus::Success
            },
            gas_used: if user { 6 + version % 5 } else { 0 },
            gas_unit_price: if user { 100 } else { 0 },
            block_height: Some(block_height),
        }
    }

    fn fixture_resources(address: &str) -> Option<Vec<Resource>> {
        let framework = normalize_address("0x1").ok()?;
        let validator = normalize_address(VALIDATOR).ok()?;

        let coin = |amount: &str| Resource {
            type_name: "0x1::coin::CoinStore<0x1::libra_coin::LibraCoin>".into(),
            data: json!({"coin": amount, "frozen": false}),
        };
        let account = |seq: u64| Resource {
            type_name: "0x1::account::Account".into(),
            data: json!({"sequence_number": seq.to_string()}),
        };

        if address == framework {
            Some(vec![account(0), coin("0")])
        } else if address == validator {
            Some(vec![
                account(42),
                coin("1250000000"),
                Resource {
                    type_name: "0x1::stake::ValidatorConfig".into(),
                    data: json!({"validator_index": "3"}),
                },
                Resource {
                    type_name: "0x1::vouch::ReceivedVouches".into(),
                    data: json!({"incoming_vouches": [framework.clone()]}),
                },
                Resource {
                    type_name: "0x1::ancestry::Ancestry".into(),
                    data: json!({"tree": [framework]}),
                },
                Resource {
                    type_name: "0x1::slow_wallet::SlowWallet".into(),
                    data: json!({"unlocked": "100", "transferred": "0"}),
                },
            ])
        } else {
            None
        }
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ChainClient for MockClient {
    async fn ledger_info(&self) -> Result<LedgerInfo, ClientError> {
        self.blocks.fetch_add(1, Ordering::SeqCst);
        let height = self.height();
        Ok(LedgerInfo {
            chain_id: "mock".into(),
            epoch: 42 + (height - GENESIS_HEIGHT) / 1_000,
            block_height: height,
            ledger_version: self.latest_version(),
            ledger_timestamp_us: START_TIMESTAMP_US + height * BLOCK_TIME_US,
        })
    }

    async fn transactions(&self, limit: usize) -> Result<Vec<Transaction>, ClientError> {
        let latest = self.latest_version();
        Ok((0..limit as u64)
            .take_while(|offset| *offset <= latest)
            .map(|offset| self.transaction(latest - offset))
            .collect())
    }

    async fn transaction_by_hash(&self, hash: &str) -> Result<TransactionDetail, ClientError> {
        let payload = hash.trim_start_matches("0x");
        let version = u64::from_str_radix(payload, 16).map_err(|_| ClientError::NotFound)?;
        if version > self.latest_version() {
            return Err(ClientError::NotFound);
        }
        let summary = self.transaction(version);
        Ok(TransactionDetail {
            vm_status: match summary.status {
                TxStatus::Failure => "Move abort".into(),
                _ => "Executed successfully".into(),
            },
            epoch: Some(42),
            round: summary.block_height,
            state_change_hash: Some(format!("0x{:064x}", version ^ 0x5c)),
            event_root_hash: Some(format!("0x{:064x}", version ^ 0xe7)),
            accumulator_root_hash: Some(format!("0x{:064x}", version ^ 0xac)),
            events: vec![json!({"type": "0x1::transaction_fee::FeeStatement", "data": {"total_charge_gas_units": summary.gas_used.to_string()}})],
            changes: Vec::new(),
            payload: json!({"function": "0x1::ol_account::transfer", "arguments": []}),
            summary,
        })
    }

    async fn account_resources(&self, address: &str) -> Result<Vec<Resource>, ClientError> {
        Self::fixture_resources(address).ok_or(ClientError::NotFound)
    }

    async fn account(&self, address: &str) -> Result<AccountInfo, ClientError> {
        let resources = Self::fixture_resources(address).ok_or(ClientError::NotFound)?;
        let sequence_number = resources
            .iter()
            .find(|r| r.type_name == "0x1::account::Account")
            .and_then(|r| r.data.get("sequence_number"))
            .and_then(crate::domain::unwrap::value_as_u64)
            .unwrap_or(0);
        Ok(AccountInfo {
            sequence_number,
            authentication_key: Some(address.to_string()),
        })
    }

    fn endpoint_name(&self) -> String {
        "mock".into()
    }
}
