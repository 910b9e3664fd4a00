//! Application context handed to the fetch hooks
//!
//! Owns the store and the chain client. Built once per process; the only
//! way back to a clean slate is [`AppContext::reinitialize`].

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::watch;

use crate::config::Config;
use crate::core::ExplorerError;
use crate::infrastructure::sdk::{create_client, ChainClient};
use crate::store::{Store, TtlPolicy};

/// Builds the chain client from the config
pub type ClientFactory =
    Arc<dyn Fn(&Config) -> Result<Arc<dyn ChainClient>, ExplorerError> + Send + Sync>;

pub struct AppContext {
    config: Config,
    factory: ClientFactory,
    store: Arc<Store>,
    client: RwLock<Option<Arc<dyn ChainClient>>>,
    /// Flips to true the first time a client is available
    ready: watch::Sender<bool>,
}

impl AppContext {
    fn empty(config: Config, factory: ClientFactory) -> Self {
        let store = Arc::new(Store::new(
            config.default_tx_limit,
            TtlPolicy::from(&config.ttl),
        ));
        let (ready, _) = watch::channel(false);
        Self {
            config,
            factory,
            store,
            client: RwLock::new(None),
            ready,
        }
    }

    /// Build the context and try to construct the client right away.
    ///
    /// A construction failure is recorded in the store, not returned; later
    /// calls to [`client`](Self::client) retry it.
    pub fn initialize(config: Config) -> Arc<Self> {
        Self::with_factory(config, Arc::new(create_client))
    }

    /// Like [`initialize`](Self::initialize), building clients with `factory`.
    pub fn with_factory(config: Config, factory: ClientFactory) -> Arc<Self> {
        let ctx = Self::empty(config, factory);
        if let Err(err) = ctx.client() {
            log::warn!("{err}");
            ctx.store.set_error(Some(err.user_message()));
        }
        Arc::new(ctx)
    }

    /// Context around an already-built client.
    pub fn with_client(config: Config, client: Arc<dyn ChainClient>) -> Arc<Self> {
        let ctx = Self::empty(config, Arc::new(create_client));
        ctx.install(client);
        Arc::new(ctx)
    }

    fn install(&self, client: Arc<dyn ChainClient>) {
        *self.client.write().unwrap_or_else(PoisonError::into_inner) = Some(client);
        self.ready.send_replace(true);
    }

    /// The chain client, constructing it first if no attempt has succeeded yet.
    pub fn client(&self) -> Result<Arc<dyn ChainClient>, ExplorerError> {
        if let Some(client) = self
            .client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(Arc::clone(client));
        }

        let client = (self.factory)(&self.config)?;
        self.install(Arc::clone(&client));
        Ok(client)
    }

    /// Drop all cached data and the client, then connect again.
    pub fn reinitialize(&self) -> Result<(), ExplorerError> {
        self.teardown();
        self.client().map(|_| ())
    }

    /// Like [`reinitialize`](Self::reinitialize) but with a given client.
    pub fn reinitialize_with(&self, client: Arc<dyn ChainClient>) {
        self.teardown();
        self.install(client);
    }

    fn teardown(&self) {
        log::info!("reinitializing explorer context");
        self.store.reset();
        *self.client.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.ready.send_replace(false);
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Follow client readiness; changes on first connect and on reinitialize.
    pub fn ready(&self) -> watch::Receiver<bool> {
        self.ready.subscribe()
    }
}
