use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use peek::config::{self, Network};
use peek::domain::{
    categorize_resource_types, format_address_for_display, format_hash_for_display,
    resource_type_to_slug, strip_leading_zeros, BlockchainStats, Transaction,
};
use peek::store::{AccountEntry, DetailEntry, StoreSnapshot};
use peek::{
    spawn_poller, AppContext, DataFetcher, RefreshOutcome, Route, RouteView, Screen, SearchResult,
};

#[derive(Debug, Parser)]
#[command(name = "peek", version, about = "Peek: a terminal explorer for Move chains")]
struct Args {
    /// REST endpoint (e.g. https://rpc.openlibra.space:8080/v1)
    #[arg(long, global = true)]
    rpc: Option<String>,

    /// mainnet, testnet, devnet or local
    #[arg(long, global = true)]
    network: Option<Network>,

    /// Number of recent transactions to fetch
    #[arg(long, global = true)]
    limit: Option<usize>,

    /// Serve mock data when the endpoint cannot be reached
    #[arg(long, global = true)]
    debug: bool,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Block height, epoch and chain id
    Stats,
    /// Recent transactions
    Txs,
    /// One transaction by hash
    Tx { hash: String },
    /// Account summary, or one resource with --resource
    Account {
        address: String,
        #[arg(long)]
        resource: Option<String>,
    },
    /// Categorized resource index with slugs
    Resources { address: String },
    /// Look up an address or transaction hash
    Search { identifier: String },
    /// Open an explorer path like /account/0x1/resources/coin-coin-store
    Open { path: String },
    /// Poll and print updates until Ctrl-C
    Watch {
        #[arg(long)]
        account: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let default_filter = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut config = config::load()?;
    if let Some(network) = args.network {
        config.network = network;
    }
    if let Some(rpc) = args.rpc {
        config.rpc_url = Some(rpc);
    }
    if let Some(limit) = args.limit {
        config.default_tx_limit = limit.max(1);
    }
    config.debug |= args.debug;

    let ctx = AppContext::initialize(config);
    let fetcher = DataFetcher::new(ctx);

    match args.command {
        Command::Stats => {
            refresh(&fetcher).await?;
            print_stats(&fetcher.store().snapshot());
        }
        Command::Txs => {
            refresh(&fetcher).await?;
            print_transactions(&fetcher.store().transactions());
        }
        Command::Tx { hash } => {
            let entry = fetcher.fetch_transaction_by_hash(&hash).await?;
            print_detail(&entry);
        }
        Command::Account { address, resource } => match resource {
            Some(slug) => {
                let route = Route::account(&address)?;
                let path = format!("{route}/resources/{}", slug.to_ascii_lowercase());
                open(&fetcher, &path).await?;
            }
            None => print_account(&*fetcher.fetch_account(&address).await?),
        },
        Command::Resources { address } => {
            let entry = fetcher.fetch_account(&address).await?;
            print_resources(&entry);
        }
        Command::Search { identifier } => match fetcher.search(&identifier).await {
            SearchResult::Account(entry) => print_account(&entry),
            SearchResult::Transaction(entry) => print_detail(&entry),
            SearchResult::NotFound(message) => println!("{message}"),
            SearchResult::Failed(err) => bail!(err.user_message()),
        },
        Command::Open { path } => open(&fetcher, &path).await?,
        Command::Watch { account } => watch(fetcher, account).await?,
    }
    Ok(())
}

async fn refresh(fetcher: &DataFetcher) -> Result<()> {
    match fetcher.refresh_blockchain_data().await {
        RefreshOutcome::Failed(err) => bail!(err.user_message()),
        outcome => {
            log::info!("refresh: {outcome:?}");
            Ok(())
        }
    }
}

async fn open(fetcher: &DataFetcher, path: &str) -> Result<()> {
    let route = Route::parse(path)?;
    match fetcher.open_route(&route).await? {
        RouteView::Home(snapshot) => {
            print_stats(&snapshot);
            print_transactions(&snapshot.transactions);
        }
        RouteView::Account(entry) => print_account(&entry),
        RouteView::Resource { resource, slug, .. } => {
            println!("{} ({slug})", resource.type_name);
            let data = serde_json::to_string_pretty(&resource.data)
                .context("render resource data")?;
            println!("{data}");
        }
        RouteView::Transaction(entry) => print_detail(&entry),
    }
    Ok(())
}

async fn watch(fetcher: Arc<DataFetcher>, account: Option<String>) -> Result<()> {
    let screen = match account {
        Some(address) => Screen::Account(peek::domain::normalize_address(&address)?),
        None => Screen::Global,
    };
    let _global = spawn_poller(Arc::clone(&fetcher), Screen::Global);
    let _detail = match &screen {
        Screen::Global => None,
        other => Some(spawn_poller(Arc::clone(&fetcher), other.clone())),
    };

    let store = Arc::clone(fetcher.store());
    let mut changes = store.subscribe();
    let mut last_height = None;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = store.snapshot();
                if let Some(err) = &snapshot.error {
                    eprintln!("error: {err}");
                }
                let height = snapshot.stats.as_ref().map(|s| s.block_height);
                if height.is_some() && height != last_height {
                    last_height = height;
                    print_stats(&snapshot);
                }
                if let Screen::Account(address) = &screen {
                    if let Some(entry) = store.account(address) {
                        println!(
                            "{}  balance {}  seq {}",
                            strip_leading_zeros(address),
                            entry.account.balance,
                            entry.account.sequence_number
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

fn print_stats(snapshot: &StoreSnapshot) {
    match &snapshot.stats {
        Some(BlockchainStats {
            block_height,
            epoch,
            chain_id,
            block_time_ms,
            last_updated,
            ..
        }) => println!(
            "height {block_height}  epoch {epoch}  chain {chain_id}  block time {block_time_ms:.0}ms  (updated {})",
            last_updated.format("%H:%M:%S")
        ),
        None => println!("no stats yet"),
    }
}

fn print_transactions(transactions: &[Transaction]) {
    for tx in transactions {
        let sender = tx
            .sender
            .as_deref()
            .map(|s| format_address_for_display(s, 6, 4))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>10}  {}  {:<24}  {:<8}  {}",
            tx.version,
            format_hash_for_display(&tx.hash, 8, 6),
            tx.tx_type,
            tx.status.label(),
            sender
        );
    }
}

fn print_detail(entry: &DetailEntry) {
    let detail = &entry.detail;
    let tx = &detail.summary;
    println!("hash      {}", tx.hash);
    println!("version   {}", tx.version);
    println!("type      {}", tx.tx_type);
    println!("status    {} ({})", tx.status.label(), detail.vm_status);
    if let Some(sender) = &tx.sender {
        println!("sender    {sender}");
    }
    println!("gas       {} @ {}", tx.gas_used, tx.gas_unit_price);
    println!("events    {}", detail.events.len());
    println!("changes   {}", detail.changes.len());
}

fn print_account(entry: &AccountEntry) {
    let account = &entry.account;
    let extended = &entry.extended;
    println!("address   {}", account.address);
    println!("kind      {}", extended.kind.label());
    println!("balance   {}", account.balance);
    println!("sequence  {}", account.sequence_number);
    println!(
        "vouching  {} ({} received)",
        if extended.vouching.eligible { "eligible" } else { "not eligible" },
        extended.vouching.received
    );
    println!("resources {}", account.resources.len());
}

fn print_resources(entry: &AccountEntry) {
    for (category, types) in categorize_resource_types(&entry.extended.resource_types) {
        println!("{}", category.label());
        for resource_type in types {
            println!("  {:<40} {resource_type}", resource_type_to_slug(&resource_type));
        }
    }
}
