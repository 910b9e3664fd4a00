//! Chain data as the explorer stores it

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Header data from the ledger info endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerInfo {
    pub chain_id: String,
    pub epoch: u64,
    pub block_height: u64,
    pub ledger_version: u64,
    pub ledger_timestamp_us: u64,
}

/// Global chain statistics. Always replaced as a whole.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockchainStats {
    pub block_height: u64,
    pub epoch: u64,
    pub chain_id: String,
    pub block_time_ms: f64,
    pub ledger_timestamp_us: u64,
    pub last_updated: DateTime<Utc>,
}

impl BlockchainStats {
    /// Build stats from a ledger snapshot, deriving block time from the
    /// previous snapshot when the chain has advanced.
    pub fn from_ledger(ledger: &LedgerInfo, previous: Option<&BlockchainStats>) -> Self {
        let block_time_ms = match previous {
            Some(prev) if ledger.block_height > prev.block_height => {
                let blocks = (ledger.block_height - prev.block_height) as f64;
                let elapsed_us = ledger.ledger_timestamp_us.saturating_sub(prev.ledger_timestamp_us);
                (elapsed_us as f64 / 1000.0) / blocks
            }
            Some(prev) => prev.block_time_ms,
            None => 0.0,
        };

        Self {
            block_height: ledger.block_height,
            epoch: ledger.epoch,
            chain_id: ledger.chain_id.clone(),
            block_time_ms,
            ledger_timestamp_us: ledger.ledger_timestamp_us,
            last_updated: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Success,
    Failure,
    Pending,
}

impl TxStatus {
    pub fn label(self) -> &'static str {
        match self {
            TxStatus::Success => "success",
            TxStatus::Failure => "failure",
            TxStatus::Pending => "pending",
        }
    }
}

/// Transaction as shown in lists
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub hash: String,
    pub version: u64,
    pub sender: Option<String>,
    pub sequence_number: Option<u64>,
    pub timestamp_us: u64,
    pub tx_type: String,
    pub status: TxStatus,
    pub gas_used: u64,
    pub gas_unit_price: u64,
    pub block_height: Option<u64>,
}

/// Full transaction, fetched on first view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionDetail {
    pub summary: Transaction,
    pub vm_status: String,
    pub epoch: Option<u64>,
    pub round: Option<u64>,
    pub state_change_hash: Option<String>,
    pub event_root_hash: Option<String>,
    pub accumulator_root_hash: Option<String>,
    pub events: Vec<Value>,
    pub changes: Vec<Value>,
    pub payload: Value,
}

/// A typed data blob attached to an account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub type_name: String,
    pub data: Value,
}

/// Basic account record from the SDK
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountInfo {
    pub sequence_number: u64,
    pub authentication_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// Canonical form, see [`normalize_address`](crate::domain::normalize_address)
    pub address: String,
    /// Base units
    pub balance: u128,
    pub sequence_number: u64,
    pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccountKind {
    Regular,
    Validator,
    CommunityWallet,
    SlowWallet,
}

impl AccountKind {
    pub fn label(self) -> &'static str {
        match self {
            AccountKind::Regular => "regular",
            AccountKind::Validator => "validator",
            AccountKind::CommunityWallet => "community wallet",
            AccountKind::SlowWallet => "slow wallet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VouchingStatus {
    /// Whether the account may vouch for others
    pub eligible: bool,
    /// Vouches received from other accounts
    pub received: usize,
}

/// Derived analysis computed once per account fetch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtendedData {
    pub kind: AccountKind,
    pub vouching: VouchingStatus,
    /// Sorted, de-duplicated resource types
    pub resource_types: Vec<String>,
}
