//! Cache freshness policy

use std::time::Duration;

use tokio::time::Instant;

use crate::config::TtlConfig;

/// Kinds of data the store caches, each with its own lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFamily {
    Stats,
    Transactions,
    Account,
    TransactionDetail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    pub stats: Duration,
    pub transactions: Duration,
    pub account: Duration,
    pub transaction_detail: Duration,
}

impl TtlPolicy {
    pub fn ttl(&self, family: DataFamily) -> Duration {
        match family {
            DataFamily::Stats => self.stats,
            DataFamily::Transactions => self.transactions,
            DataFamily::Account => self.account,
            DataFamily::TransactionDetail => self.transaction_detail,
        }
    }

    /// Stale once `now - fetched_at` exceeds the family's TTL.
    pub fn is_fresh(&self, family: DataFamily, fetched_at: Instant, now: Instant) -> bool {
        now.saturating_duration_since(fetched_at) <= self.ttl(family)
    }
}

impl From<&TtlConfig> for TtlPolicy {
    fn from(config: &TtlConfig) -> Self {
        Self {
            stats: Duration::from_secs(config.stats_secs),
            transactions: Duration::from_secs(config.transactions_secs),
            account: Duration::from_secs(config.account_secs),
            transaction_detail: Duration::from_secs(config.transaction_detail_secs),
        }
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::from(&TtlConfig::default())
    }
}
