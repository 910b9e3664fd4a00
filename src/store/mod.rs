//! Observable store - the single source of truth for fetched chain data
//!
//! State is only changed through the action methods below. Every action
//! bumps a revision counter that listeners follow via [`Store::subscribe`];
//! readers that prefer polling take a [`Store::snapshot`].

mod freshness;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::watch;
use tokio::time::Instant;

use crate::domain::{Account, BlockchainStats, ExtendedData, Transaction, TransactionDetail};

pub use freshness::{DataFamily, TtlPolicy};

/// A cached account together with its derived analysis
#[derive(Debug, Clone)]
pub struct AccountEntry {
    pub account: Account,
    pub extended: ExtendedData,
    pub last_fetched: Instant,
}

impl AccountEntry {
    pub fn new(account: Account, extended: ExtendedData) -> Self {
        Self {
            account,
            extended,
            last_fetched: Instant::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetailEntry {
    pub detail: TransactionDetail,
    pub last_fetched: Instant,
}

impl DetailEntry {
    pub fn new(detail: TransactionDetail) -> Self {
        Self {
            detail,
            last_fetched: Instant::now(),
        }
    }
}

/// Global fields, as seen at one revision
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub revision: u64,
    pub stats: Option<BlockchainStats>,
    pub transactions: Vec<Transaction>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub current_limit: usize,
}

#[derive(Debug)]
struct StoreState {
    stats: Option<BlockchainStats>,
    stats_fetched: Option<Instant>,
    transactions: Vec<Transaction>,
    transactions_fetched: Option<Instant>,
    is_loading: bool,
    error: Option<String>,
    current_limit: usize,
    accounts: HashMap<String, Arc<AccountEntry>>,
    details: HashMap<String, Arc<DetailEntry>>,
    accounts_in_flight: usize,
    details_in_flight: usize,
}

impl StoreState {
    fn new(current_limit: usize) -> Self {
        Self {
            stats: None,
            stats_fetched: None,
            transactions: Vec::new(),
            transactions_fetched: None,
            is_loading: false,
            error: None,
            current_limit,
            accounts: HashMap::new(),
            details: HashMap::new(),
            accounts_in_flight: 0,
            details_in_flight: 0,
        }
    }
}

/// Result of one blockchain refresh cycle, written in a single action
#[derive(Debug, Default)]
pub struct RefreshWrite {
    pub stats: Option<BlockchainStats>,
    pub transactions: Option<Vec<Transaction>>,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct Store {
    state: RwLock<StoreState>,
    revision: watch::Sender<u64>,
    default_limit: usize,
    ttl: TtlPolicy,
}

impl Store {
    pub fn new(default_limit: usize, ttl: TtlPolicy) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: RwLock::new(StoreState::new(default_limit)),
            revision,
            default_limit,
            ttl,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` under the write lock, then notify listeners.
    fn mutate<R>(&self, f: impl FnOnce(&mut StoreState) -> R) -> R {
        let out = {
            let mut state = self.write();
            f(&mut state)
        };
        self.revision.send_modify(|rev| *rev += 1);
        out
    }

    // === Subscription ===

    /// Change listener: the receiver sees the revision after every action.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.read();
        StoreSnapshot {
            revision: self.revision(),
            stats: state.stats.clone(),
            transactions: state.transactions.clone(),
            is_loading: state.is_loading,
            error: state.error.clone(),
            current_limit: state.current_limit,
        }
    }

    // === Actions ===

    pub fn set_transactions(&self, transactions: Vec<Transaction>) {
        self.mutate(|state| {
            state.transactions = transactions;
            state.transactions_fetched = Some(Instant::now());
        });
    }

    pub fn set_stats(&self, stats: BlockchainStats) {
        self.mutate(|state| {
            state.stats = Some(stats);
            state.stats_fetched = Some(Instant::now());
        });
    }

    pub fn set_loading(&self, loading: bool) {
        self.mutate(|state| state.is_loading = loading);
    }

    pub fn set_error(&self, error: Option<String>) {
        self.mutate(|state| state.error = error);
    }

    pub fn set_limit(&self, limit: usize) {
        self.mutate(|state| state.current_limit = limit.max(1));
    }

    /// Apply a whole refresh cycle at once. Fields left `None` keep their
    /// previous value; the error field is always replaced.
    pub fn apply_refresh(&self, write: RefreshWrite) {
        let now = Instant::now();
        self.mutate(|state| {
            if let Some(stats) = write.stats {
                state.stats = Some(stats);
                state.stats_fetched = Some(now);
            }
            if let Some(transactions) = write.transactions {
                state.transactions = transactions;
                state.transactions_fetched = Some(now);
            }
            state.error = write.error;
        });
    }

    /// Cache an account and its analysis under its (already normalized) address.
    pub fn put_account(&self, account: Account, extended: ExtendedData) -> Arc<AccountEntry> {
        let entry = Arc::new(AccountEntry::new(account, extended));
        self.insert_account(Arc::clone(&entry));
        entry
    }

    /// Insert a prepared entry. Re-inserting the entry already cached is a no-op.
    pub fn insert_account(&self, entry: Arc<AccountEntry>) {
        let key = entry.account.address.clone();
        if self
            .account(&key)
            .is_some_and(|current| Arc::ptr_eq(&current, &entry))
        {
            return;
        }
        self.mutate(|state| {
            state.accounts.insert(key, entry);
        });
    }

    pub fn insert_transaction_detail(&self, entry: Arc<DetailEntry>) {
        let key = entry.detail.summary.hash.clone();
        if self
            .transaction_detail(&key)
            .is_some_and(|current| Arc::ptr_eq(&current, &entry))
        {
            return;
        }
        self.mutate(|state| {
            state.details.insert(key, entry);
        });
    }

    /// Drop all data and return to the initial state.
    pub fn reset(&self) {
        let limit = self.default_limit;
        self.mutate(|state| *state = StoreState::new(limit));
    }

    /// Mark one fetch of `family` as in flight until the guard drops.
    pub fn begin_fetch(self: &Arc<Self>, family: DataFamily) -> FetchGuard {
        self.adjust_in_flight(family, true);
        FetchGuard {
            store: Arc::clone(self),
            family,
        }
    }

    fn adjust_in_flight(&self, family: DataFamily, up: bool) {
        self.mutate(|state| {
            let counter = match family {
                DataFamily::Account => &mut state.accounts_in_flight,
                DataFamily::TransactionDetail => &mut state.details_in_flight,
                DataFamily::Stats | DataFamily::Transactions => return,
            };
            *counter = if up {
                *counter + 1
            } else {
                counter.saturating_sub(1)
            };
        });
    }

    // === Reads ===

    pub fn stats(&self) -> Option<BlockchainStats> {
        self.read().stats.clone()
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.read().transactions.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.read().is_loading
    }

    /// True iff at least one fetch of `family` is in flight.
    pub fn is_loading_family(&self, family: DataFamily) -> bool {
        let state = self.read();
        match family {
            DataFamily::Stats | DataFamily::Transactions => state.is_loading,
            DataFamily::Account => state.accounts_in_flight > 0,
            DataFamily::TransactionDetail => state.details_in_flight > 0,
        }
    }

    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    pub fn current_limit(&self) -> usize {
        self.read().current_limit
    }

    pub fn ttl(&self) -> &TtlPolicy {
        &self.ttl
    }

    pub fn account(&self, address: &str) -> Option<Arc<AccountEntry>> {
        self.read().accounts.get(address).cloned()
    }

    pub fn fresh_account(&self, address: &str) -> Option<Arc<AccountEntry>> {
        self.account(address)
            .filter(|entry| self.is_fresh(DataFamily::Account, entry.last_fetched))
    }

    pub fn transaction_detail(&self, hash: &str) -> Option<Arc<DetailEntry>> {
        self.read().details.get(hash).cloned()
    }

    pub fn fresh_transaction_detail(&self, hash: &str) -> Option<Arc<DetailEntry>> {
        self.transaction_detail(hash)
            .filter(|entry| self.is_fresh(DataFamily::TransactionDetail, entry.last_fetched))
    }

    /// Whether both stats and the transaction list are within their TTL.
    pub fn blockchain_is_fresh(&self) -> bool {
        let state = self.read();
        let now = Instant::now();
        let fresh = |family, at: Option<Instant>| {
            at.is_some_and(|at| self.ttl.is_fresh(family, at, now))
        };
        fresh(DataFamily::Stats, state.stats_fetched)
            && fresh(DataFamily::Transactions, state.transactions_fetched)
    }

    fn is_fresh(&self, family: DataFamily, fetched_at: Instant) -> bool {
        self.ttl.is_fresh(family, fetched_at, Instant::now())
    }
}

/// Keeps a family's in-flight counter raised while alive
#[derive(Debug)]
pub struct FetchGuard {
    store: Arc<Store>,
    family: DataFamily,
}

impl Drop for FetchGuard {
    fn drop(&mut self) {
        self.store.adjust_in_flight(self.family, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountKind, TxStatus, VouchingStatus};

    fn store() -> Arc<Store> {
        Arc::new(Store::new(25, TtlPolicy::default()))
    }

    fn tx(hash: &str) -> Transaction {
        Transaction {
            hash: hash.to_string(),
            version: 1,
            sender: None,
            sequence_number: None,
            timestamp_us: 0,
            tx_type: "user_transaction".into(),
            status: TxStatus::Success,
            gas_used: 0,
            gas_unit_price: 0,
            block_height: None,
        }
    }

    fn stats(height: u64) -> BlockchainStats {
        BlockchainStats {
            block_height: height,
            epoch: 1,
            chain_id: "1".into(),
            block_time_ms: 0.0,
            ledger_timestamp_us: 0,
            last_updated: chrono::Utc::now(),
        }
    }

    #[test]
    fn transactions_are_replaced_not_merged() {
        let store = store();
        store.set_transactions(vec![tx("0xa"), tx("0xb")]);
        store.set_transactions(vec![tx("0xc")]);
        let hashes: Vec<String> = store.transactions().into_iter().map(|t| t.hash).collect();
        assert_eq!(hashes, vec!["0xc"]);
    }

    #[test]
    fn refresh_keeps_fields_it_does_not_carry() {
        let store = store();
        store.apply_refresh(RefreshWrite {
            stats: Some(stats(10)),
            transactions: Some(vec![tx("0xa")]),
            error: None,
        });
        store.apply_refresh(RefreshWrite {
            stats: Some(stats(11)),
            transactions: None,
            error: Some("boom".into()),
        });
        let snap = store.snapshot();
        assert_eq!(snap.stats.map(|s| s.block_height), Some(11));
        assert_eq!(snap.transactions.len(), 1);
        assert_eq!(snap.error.as_deref(), Some("boom"));
    }

    #[test]
    fn every_action_bumps_revision() {
        let store = store();
        let rx = store.subscribe();
        store.set_loading(true);
        store.set_error(Some("x".into()));
        store.set_limit(0);
        assert_eq!(*rx.borrow(), 3);
        assert_eq!(store.current_limit(), 1);
        assert!(store.is_loading_family(DataFamily::Stats));
    }

    #[test]
    fn fetch_guard_tracks_in_flight() {
        let store = store();
        let first = store.begin_fetch(DataFamily::Account);
        let second = store.begin_fetch(DataFamily::Account);
        assert!(store.is_loading_family(DataFamily::Account));
        assert!(!store.is_loading_family(DataFamily::TransactionDetail));
        drop(first);
        assert!(store.is_loading_family(DataFamily::Account));
        drop(second);
        assert!(!store.is_loading_family(DataFamily::Account));
    }

    #[test]
    fn reset_restores_defaults() {
        let store = store();
        store.set_limit(99);
        store.set_stats(stats(3));
        store.put_account(
            Account {
                address: "0x1".into(),
                balance: 0,
                sequence_number: 0,
                resources: Vec::new(),
            },
            ExtendedData {
                kind: AccountKind::Regular,
                vouching: VouchingStatus {
                    eligible: false,
                    received: 0,
                },
                resource_types: Vec::new(),
            },
        );
        store.reset();
        assert_eq!(store.current_limit(), 25);
        assert!(store.stats().is_none());
        assert!(store.account("0x1").is_none());
    }

    #[test]
    fn reinserting_same_entry_does_not_notify() {
        let store = store();
        let entry = store.put_account(
            Account {
                address: "0x2".into(),
                balance: 1,
                sequence_number: 0,
                resources: Vec::new(),
            },
            ExtendedData {
                kind: AccountKind::Regular,
                vouching: VouchingStatus {
                    eligible: false,
                    received: 0,
                },
                resource_types: Vec::new(),
            },
        );
        let revision = store.revision();
        store.insert_account(Arc::clone(&entry));
        assert_eq!(store.revision(), revision);
    }

    #[tokio::test(start_paused = true)]
    async fn accounts_go_stale_after_ttl() {
        let store = store();
        store.put_account(
            Account {
                address: "0x1".into(),
                balance: 5,
                sequence_number: 0,
                resources: Vec::new(),
            },
            ExtendedData {
                kind: AccountKind::Regular,
                vouching: VouchingStatus {
                    eligible: false,
                    received: 0,
                },
                resource_types: Vec::new(),
            },
        );
        assert!(store.fresh_account("0x1").is_some());
        tokio::time::advance(store.ttl().account + std::time::Duration::from_secs(1)).await;
        assert!(store.fresh_account("0x1").is_none());
        assert!(store.account("0x1").is_some());
    }
}
