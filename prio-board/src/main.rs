//! prio-board - Use-case prioritization board
//!
//! CLI over the record store: rank use cases locally, import cards from a
//! board list, push selected records back, and replay the ranked order onto
//! the list. State lives in a local JSON mirror plus an optional remote
//! blob store.

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use prio_board::gateway::CardGateway;
use prio_board::persist::{self, HttpSnapshotStore, PersistenceCoordinator, SnapshotStore};
use prio_board::store::{RecordStore, SortDirection, SortKey};
use prio_board::sync::{OrderSynchronizer, RemoteSyncReconciler};
use prio_board::trello::TrelloGateway;
use prio_common::config::AppConfig;
use prio_common::events::EventBus;
use prio_common::model::ScoringScheme;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Parser)]
#[command(name = "prio-board", version, about = "Use-case prioritization board")]
struct Cli {
    /// Config file (defaults to $PRIO_CONFIG, then the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Destination list id, overriding the configured one
    #[arg(long, global = true)]
    list: Option<String>,

    /// Scoring scheme: "weighted" or "reach"
    #[arg(long, global = true, default_value = "weighted")]
    scheme: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the ranked backlog
    Rank {
        /// Sort key: score, name, owner, effort, value, or a factor key
        #[arg(long, default_value = "score")]
        key: String,
        /// Sort ascending instead of descending
        #[arg(long)]
        asc: bool,
        /// Apply a named weight preset before scoring
        #[arg(long)]
        preset: Option<String>,
    },
    /// List the boards visible to the configured credentials
    Boards,
    /// List the lists on a board
    Lists { board_id: String },
    /// Import cards from a list into the backlog
    Import {
        /// List to import from; defaults to the configured list
        list_id: Option<String>,
    },
    /// Push selected records to the board
    Push {
        /// Select every record before pushing
        #[arg(long)]
        all: bool,
    },
    /// Replay the ranked order onto the board via move-to-top
    Reorder,
    /// Pull the remote snapshot and overwrite local state
    Load,
    /// Save the current snapshot to the remote store
    Save,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::resolve(cli.config.as_deref())?;

    let scheme = match cli.scheme.as_str() {
        "weighted" => ScoringScheme::weighted(),
        "reach" => ScoringScheme::reach(),
        other => bail!("unknown scheme '{other}' (expected 'weighted' or 'reach')"),
    };

    let bus = EventBus::default();
    let mut store = RecordStore::new(scheme, bus.clone());
    let mirror_path = config.snapshot_path();
    if let Some(snapshot) = persist::read_mirror(&mirror_path)? {
        store.restore(snapshot);
    }
    let store = Arc::new(RwLock::new(store));

    let dest_list = cli.list.clone().or_else(|| config.list_id.clone());

    match cli.command {
        Command::Rank { key, asc, preset } => {
            if let Some(name) = preset {
                let weights = prio_common::model::WeightConfig::presets()
                    .into_iter()
                    .find(|(n, _)| n.eq_ignore_ascii_case(&name))
                    .map(|(_, w)| w)
                    .ok_or_else(|| anyhow!("unknown preset '{name}'"))?;
                let mut store = store.write().await;
                let pairs: Vec<_> = weights.iter().map(|(k, v)| (k.clone(), *v)).collect();
                for (k, v) in pairs {
                    store.set_weight(&k, v);
                }
            }
            let key: SortKey = key.parse()?;
            let direction = if asc {
                SortDirection::Asc
            } else {
                SortDirection::Desc
            };
            let view = store.read().await.sort_view(&key, direction);
            println!("{:>5}  {:<7}  {:>6}  {:>6}  {}", "score", "color", "effort", "value", "name");
            for row in view {
                println!(
                    "{:>5}  {:<7}  {:>6.1}  {:>6.1}  {}",
                    row.score, row.color, row.effort, row.value, row.record.name
                );
            }
        }

        Command::Boards => {
            let gateway = gateway(&config)?;
            for board in gateway.list_boards().await? {
                println!("{}  {}", board.id, board.name);
            }
        }

        Command::Lists { board_id } => {
            let gateway = gateway(&config)?;
            for list in gateway.list_lists(&board_id).await? {
                println!("{}  {}", list.id, list.name);
            }
        }

        Command::Import { list_id } => {
            let list_id = list_id
                .or(dest_list)
                .ok_or_else(|| anyhow!("no list id given and none configured"))?;
            let gateway = gateway(&config)?;
            let cards = gateway.list_cards(&list_id).await?;
            let mut store = store.write().await;
            for card in &cards {
                store.add_imported(card);
            }
            persist::write_mirror(&mirror_path, &store.snapshot())?;
            info!(count = cards.len(), list_id = %list_id, "Import complete");
            println!("imported {} cards from {list_id}", cards.len());
        }

        Command::Push { all } => {
            if all {
                let mut store = store.write().await;
                let ids: Vec<_> = store.records().iter().map(|r| r.id).collect();
                for id in ids {
                    store.set_selected(id, true)?;
                }
            }
            let gateway: Arc<dyn CardGateway> = Arc::new(gateway(&config)?);
            let reconciler = RemoteSyncReconciler::new(gateway, store.clone());
            let report = reconciler.push_selected(dest_list.as_deref()).await?;
            persist::write_mirror(&mirror_path, &store.read().await.snapshot())?;
            println!(
                "created {}  updated {}  copied {}  failed {}",
                report.created, report.updated, report.copied, report.failed
            );
            if let Some(error) = report.first_error {
                eprintln!("first error: {error}");
            }
        }

        Command::Reorder => {
            let ordered: Vec<_> = store
                .read()
                .await
                .sort_view(&SortKey::Score, SortDirection::Desc)
                .into_iter()
                .map(|row| row.record)
                .collect();
            let gateway: Arc<dyn CardGateway> = Arc::new(gateway(&config)?);
            let report = OrderSynchronizer::new(gateway).replay(&ordered).await;
            println!(
                "moved {}  skipped {}  of {}",
                report.moved, report.skipped, report.total
            );
            if let Some(error) = report.error {
                eprintln!("stopped early: {error}");
            }
        }

        Command::Load => {
            let coordinator = coordinator(&config, store.clone(), bus)?;
            if coordinator.load_remote().await? {
                let store = store.read().await;
                persist::write_mirror(&mirror_path, &store.snapshot())?;
                println!("loaded {} records", store.records().len());
            } else {
                println!("remote store is empty; local state kept");
            }
        }

        Command::Save => {
            let coordinator = coordinator(&config, store.clone(), bus)?;
            coordinator.save_remote().await?;
            let store = store.read().await;
            persist::write_mirror(&mirror_path, &store.snapshot())?;
            println!("saved {} records", store.records().len());
        }
    }

    Ok(())
}

fn gateway(config: &AppConfig) -> Result<TrelloGateway> {
    let (key, token) = config.trello_credentials()?;
    Ok(TrelloGateway::new(key, token)?)
}

fn coordinator(
    config: &AppConfig,
    store: Arc<RwLock<RecordStore>>,
    bus: EventBus,
) -> Result<PersistenceCoordinator> {
    let storage_url = config
        .storage_url
        .clone()
        .ok_or_else(|| anyhow!("storage_url is not configured (set PRIO_STORAGE_URL)"))?;
    let secret = config
        .shared_secret
        .clone()
        .filter(|s| !s.is_empty() && s != "0");
    let remote: Arc<dyn SnapshotStore> = Arc::new(HttpSnapshotStore::new(storage_url, secret)?);
    Ok(PersistenceCoordinator::new(
        store,
        remote,
        config.snapshot_path(),
        config.debounce(),
        config.autosave(),
        bus,
    ))
}
