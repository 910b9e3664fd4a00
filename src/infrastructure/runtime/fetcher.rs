//! Data-fetch hooks - the only callers of the chain client
//!
//! Each hook normalizes its input, consults the store, calls the client at
//! most once per key at a time and writes the result back. Network and
//! initialization failures are recorded in the store's error field so views
//! can keep showing cached data; the same error is also returned to the
//! caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::{AppContext, ClientError, ExplorerError, Route};
use crate::domain::{
    analyze_account, extract_balance, is_valid_address_format, normalize_address,
    normalize_transaction_hash, slug_to_resource_type, Account, BlockchainStats, Resource,
};
use crate::infrastructure::runtime::inflight::InFlight;
use crate::infrastructure::runtime::liveness::Liveness;
use crate::infrastructure::sdk::ChainClient;
use crate::store::{AccountEntry, DataFamily, DetailEntry, RefreshWrite, Store, StoreSnapshot};

/// Shown when a search matches nothing
pub const SEARCH_NOT_FOUND: &str = "No account or transaction found with this identifier";

type AccountResult = Result<Arc<AccountEntry>, ExplorerError>;
type DetailResult = Result<Arc<DetailEntry>, ExplorerError>;

/// How a blockchain refresh ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Stats and transactions were both written
    Updated,
    /// Cached data was still fresh; nothing was fetched
    Fresh,
    /// Another refresh was already running
    Skipped,
    /// The consumer went away before the response arrived
    Discarded,
    /// At least one sub-fetch failed; whatever succeeded was still written
    Failed(ExplorerError),
}

#[derive(Debug, Clone)]
pub enum SearchResult {
    Account(Arc<AccountEntry>),
    Transaction(Arc<DetailEntry>),
    NotFound(String),
    Failed(ExplorerError),
}

/// What a route resolved to
#[derive(Debug, Clone)]
pub enum RouteView {
    Home(StoreSnapshot),
    Account(Arc<AccountEntry>),
    Resource {
        account: Arc<AccountEntry>,
        slug: String,
        resource: Resource,
    },
    Transaction(Arc<DetailEntry>),
}

pub struct DataFetcher {
    ctx: Arc<AppContext>,
    refreshing: AtomicBool,
    accounts: InFlight<String, AccountResult>,
    details: InFlight<String, DetailResult>,
}

/// Clears the refresh flag and the loading state however the refresh ends
struct RefreshGuard<'a> {
    flag: &'a AtomicBool,
    store: &'a Store,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.store.set_loading(false);
        self.flag.store(false, Ordering::SeqCst);
    }
}

fn refresh_error(err: ClientError) -> ExplorerError {
    match err {
        ClientError::NotFound => ExplorerError::NetworkFailure("ledger endpoint not found".into()),
        other => other.into_explorer("ledger", "latest"),
    }
}

async fn fetch_account_from(
    client: Arc<dyn ChainClient>,
    store: Arc<Store>,
    address: String,
) -> AccountResult {
    let _loading = store.begin_fetch(DataFamily::Account);
    log::debug!("fetching account {address}");
    let (info, resources) =
        futures::try_join!(client.account(&address), client.account_resources(&address))
            .map_err(|err| err.into_explorer("account", &address))?;

    let extended = analyze_account(&resources);
    let account = Account {
        balance: extract_balance(&resources),
        sequence_number: info.sequence_number,
        resources,
        address,
    };
    Ok(Arc::new(AccountEntry::new(account, extended)))
}

async fn fetch_detail_from(
    client: Arc<dyn ChainClient>,
    store: Arc<Store>,
    hash: String,
) -> DetailResult {
    let _loading = store.begin_fetch(DataFamily::TransactionDetail);
    log::debug!("fetching transaction {hash}");
    let detail = client
        .transaction_by_hash(&hash)
        .await
        .map_err(|err| err.into_explorer("transaction", &hash))?;
    Ok(Arc::new(DetailEntry::new(detail)))
}

impl DataFetcher {
    pub fn new(ctx: Arc<AppContext>) -> Arc<Self> {
        Arc::new(Self {
            ctx,
            refreshing: AtomicBool::new(false),
            accounts: InFlight::new(),
            details: InFlight::new(),
        })
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.ctx
    }

    pub fn store(&self) -> &Arc<Store> {
        self.ctx.store()
    }

    fn record(&self, err: &ExplorerError, liveness: &Liveness) {
        if err.is_surfaced() && liveness.is_alive() {
            self.store().set_error(Some(err.user_message()));
        }
    }

    // === Global stats and transactions ===

    /// Refresh stats and the transaction list. No-op while another refresh
    /// is running.
    pub async fn refresh_blockchain_data(&self) -> RefreshOutcome {
        self.refresh_blockchain_data_for(&Liveness::detached()).await
    }

    /// Refresh only if stats or transactions have outlived their TTL.
    pub async fn ensure_blockchain_data(&self) -> RefreshOutcome {
        if self.store().blockchain_is_fresh() {
            return RefreshOutcome::Fresh;
        }
        self.refresh_blockchain_data().await
    }

    pub async fn refresh_blockchain_data_for(&self, liveness: &Liveness) -> RefreshOutcome {
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::debug!("refresh already in flight, skipping");
            return RefreshOutcome::Skipped;
        }
        let store = self.store();
        let _guard = RefreshGuard {
            flag: &self.refreshing,
            store,
        };
        store.set_loading(true);

        let client = match self.ctx.client() {
            Ok(client) => client,
            Err(err) => {
                log::warn!("refresh aborted: {err}");
                self.record(&err, liveness);
                return RefreshOutcome::Failed(err);
            }
        };

        let limit = store.current_limit();
        let (ledger, transactions) =
            tokio::join!(client.ledger_info(), client.transactions(limit));

        if !liveness.is_alive() {
            log::debug!("discarding refresh for unmounted consumer");
            return RefreshOutcome::Discarded;
        }

        let previous = store.stats();
        let mut write = RefreshWrite::default();
        let mut failure = None;

        match ledger {
            Ok(ledger) => write.stats = Some(BlockchainStats::from_ledger(&ledger, previous.as_ref())),
            Err(err) => failure = Some(refresh_error(err)),
        }
        match transactions {
            Ok(transactions) => write.transactions = Some(transactions),
            Err(err) => {
                failure.get_or_insert(refresh_error(err));
            }
        }
        write.error = failure.as_ref().map(ExplorerError::user_message);
        store.apply_refresh(write);

        match failure {
            Some(err) => {
                log::warn!("refresh failed: {err}");
                RefreshOutcome::Failed(err)
            }
            None => {
                log::debug!("refresh complete at revision {}", store.revision());
                RefreshOutcome::Updated
            }
        }
    }

    // === Accounts ===

    /// Cached account if fresh, otherwise fetched.
    pub async fn fetch_account(&self, address: &str) -> AccountResult {
        self.load_account(address, &Liveness::detached(), true).await
    }

    /// Always fetch, for polling views.
    pub async fn refresh_account(&self, address: &str, liveness: &Liveness) -> AccountResult {
        self.load_account(address, liveness, false).await
    }

    async fn load_account(&self, address: &str, liveness: &Liveness, use_cache: bool) -> AccountResult {
        let address = normalize_address(address)?;
        if use_cache {
            if let Some(entry) = self.store().fresh_account(&address) {
                log::debug!("account {address} served from cache");
                return Ok(entry);
            }
        }

        let client = self.ctx.client().inspect_err(|err| self.record(err, liveness))?;
        let store = Arc::clone(self.store());
        let key = address.clone();

        let result = self
            .accounts
            .run(key, move || fetch_account_from(client, store, address))
            .await;

        match &result {
            Ok(entry) if liveness.is_alive() => self.store().insert_account(Arc::clone(entry)),
            Ok(_) => log::debug!("discarding account response for unmounted consumer"),
            Err(err) => self.record(err, liveness),
        }
        result
    }

    // === Transaction details ===

    /// Cached detail if fresh, otherwise fetched. A string that is not a
    /// transaction hash is `NotFound` without touching the network.
    pub async fn fetch_transaction_by_hash(&self, hash: &str) -> DetailResult {
        self.load_transaction(hash, &Liveness::detached(), true).await
    }

    pub async fn refresh_transaction(&self, hash: &str, liveness: &Liveness) -> DetailResult {
        self.load_transaction(hash, liveness, false).await
    }

    async fn load_transaction(&self, hash: &str, liveness: &Liveness, use_cache: bool) -> DetailResult {
        let Some(hash) = normalize_transaction_hash(hash) else {
            return Err(ExplorerError::NotFound {
                kind: "transaction",
                id: hash.to_string(),
            });
        };
        if use_cache {
            if let Some(entry) = self.store().fresh_transaction_detail(&hash) {
                log::debug!("transaction {hash} served from cache");
                return Ok(entry);
            }
        }

        let client = self.ctx.client().inspect_err(|err| self.record(err, liveness))?;
        let store = Arc::clone(self.store());
        let key = hash.clone();

        let result = self
            .details
            .run(key, move || fetch_detail_from(client, store, hash))
            .await;

        match &result {
            Ok(entry) if liveness.is_alive() => {
                self.store().insert_transaction_detail(Arc::clone(entry))
            }
            Ok(_) => log::debug!("discarding transaction response for unmounted consumer"),
            Err(err) => self.record(err, liveness),
        }
        result
    }

    // === Search and routes ===

    /// Look an identifier up as an account, then as a transaction.
    pub async fn search(&self, identifier: &str) -> SearchResult {
        let identifier = identifier.trim();

        if is_valid_address_format(identifier) {
            match self.fetch_account(identifier).await {
                Ok(entry) => return SearchResult::Account(entry),
                Err(ExplorerError::NotFound { .. }) | Err(ExplorerError::InvalidFormat { .. }) => {}
                Err(err) => return SearchResult::Failed(err),
            }
        }

        match self.fetch_transaction_by_hash(identifier).await {
            Ok(entry) => SearchResult::Transaction(entry),
            Err(ExplorerError::NotFound { .. }) | Err(ExplorerError::InvalidFormat { .. }) => {
                SearchResult::NotFound(SEARCH_NOT_FOUND.to_string())
            }
            Err(err) => SearchResult::Failed(err),
        }
    }

    /// Fetch whatever `route` names.
    pub async fn open_route(&self, route: &Route) -> Result<RouteView, ExplorerError> {
        match route {
            Route::Home => {
                self.ensure_blockchain_data().await;
                Ok(RouteView::Home(self.store().snapshot()))
            }
            Route::Account { address } => self.fetch_account(address).await.map(RouteView::Account),
            Route::AccountResource { address, slug } => {
                let account = self.fetch_account(address).await?;
                let resource_type = slug_to_resource_type(&account.extended.resource_types, slug)
                    .ok_or_else(|| ExplorerError::NotFound {
                        kind: "resource",
                        id: slug.clone(),
                    })?
                    .to_string();
                let resource = account
                    .account
                    .resources
                    .iter()
                    .find(|r| r.type_name == resource_type)
                    .cloned()
                    .ok_or_else(|| ExplorerError::NotFound {
                        kind: "resource",
                        id: slug.clone(),
                    })?;
                Ok(RouteView::Resource {
                    account,
                    slug: slug.clone(),
                    resource,
                })
            }
            Route::Transaction { hash } => self
                .fetch_transaction_by_hash(hash)
                .await
                .map(RouteView::Transaction),
        }
    }
}
