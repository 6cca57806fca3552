use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use payroute::application::engine::PayoutEngine;
use payroute::config::PayoutConfig;
use payroute::domain::outcome::ProviderOutcome;
use payroute::domain::payout::{PayoutFilter, PayoutItem, PayoutProvider, PayoutStatus};
use payroute::domain::ports::{DoctorStore, DoctorStoreBox, PayoutStore, PayoutStoreBox};
use payroute::error::PayoutError;
use payroute::infrastructure::in_memory::{InMemoryDoctorStore, InMemoryPayoutStore};
use payroute::infrastructure::providers::registry_from_config;
use payroute::interfaces::csv::doctor_reader::DoctorReader;
use payroute::interfaces::csv::payout_reader::{ItemReader, PayoutReader};
use payroute::interfaces::csv::payout_writer::PayoutWriter;
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Payouts CSV used to seed the store
    #[arg(long)]
    payouts: Option<PathBuf>,

    /// Doctor settlement profiles CSV used to seed the store
    #[arg(long)]
    doctors: Option<PathBuf>,

    /// Payout line items CSV, attached to seeded payouts
    #[arg(long)]
    items: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Settle the given payouts through their providers
    Trigger {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Record an admin approval
    Approve {
        id: String,
        #[arg(long)]
        admin: Option<String>,
    },
    /// Release a payout stuck in PROCESSING by marking it FAILED
    Abandon {
        id: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Settle every approved payout
    Settle {
        /// Retry failed payouts as well
        #[arg(long)]
        include_failed: bool,
    },
    /// Print one payout with its doctor profile as JSON
    Show { id: String },
    /// Print payouts, most recent period first
    List {
        #[arg(long)]
        status: Option<PayoutStatus>,
        #[arg(long)]
        doctor: Option<String>,
        #[arg(long)]
        provider: Option<PayoutProvider>,
    },
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(db_path: Option<PathBuf>) -> Result<(PayoutStoreBox, DoctorStoreBox)> {
    use payroute::infrastructure::rocksdb::RocksDBStore;

    if let Some(db_path) = db_path {
        let store = RocksDBStore::open(db_path).into_diagnostic()?;
        return Ok((Box::new(store.clone()), Box::new(store)));
    }
    Ok(in_memory_stores())
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(db_path: Option<PathBuf>) -> Result<(PayoutStoreBox, DoctorStoreBox)> {
    if db_path.is_some() {
        warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(in_memory_stores())
}

fn in_memory_stores() -> (PayoutStoreBox, DoctorStoreBox) {
    (
        Box::new(InMemoryPayoutStore::new()),
        Box::new(InMemoryDoctorStore::new()),
    )
}

fn read_items(path: Option<PathBuf>) -> Result<HashMap<String, Vec<PayoutItem>>> {
    let mut items: HashMap<String, Vec<PayoutItem>> = HashMap::new();
    let Some(path) = path else {
        return Ok(items);
    };

    let file = File::open(path).into_diagnostic()?;
    for item_result in ItemReader::new(file).items() {
        match item_result {
            Ok((payout_id, item)) => items.entry(payout_id).or_default().push(item),
            Err(e) => eprintln!("Error reading payout item: {}", e),
        }
    }
    Ok(items)
}

/// Loads the CSV inputs. Payouts already present in a persistent store keep
/// their stored state.
async fn seed(
    cli: &Cli,
    payout_store: &PayoutStoreBox,
    doctor_store: &DoctorStoreBox,
) -> Result<()> {
    if let Some(path) = &cli.doctors {
        let file = File::open(path).into_diagnostic()?;
        for profile_result in DoctorReader::new(file).profiles() {
            match profile_result {
                Ok(profile) => doctor_store.store(profile).await.into_diagnostic()?,
                Err(e) => eprintln!("Error reading doctor profile: {}", e),
            }
        }
    }

    let mut items = read_items(cli.items.clone())?;

    if let Some(path) = &cli.payouts {
        let file = File::open(path).into_diagnostic()?;
        for payout_result in PayoutReader::new(file).payouts() {
            match payout_result {
                Ok(payout) => {
                    if payout_store
                        .find_payout(&payout.id)
                        .await
                        .into_diagnostic()?
                        .is_some()
                    {
                        debug!(payout_id = %payout.id, "Payout already stored, keeping stored state");
                        items.remove(&payout.id);
                        continue;
                    }
                    let payout_items = items.remove(&payout.id).unwrap_or_default();
                    payout_store
                        .insert(payout.with_items(payout_items))
                        .await
                        .into_diagnostic()?;
                }
                Err(e) => eprintln!("Error reading payout: {}", e),
            }
        }
    }

    for payout_id in items.keys() {
        warn!(payout_id = %payout_id, "Items reference a payout that was not loaded");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let config = PayoutConfig::from_env().into_diagnostic()?;
    let providers = registry_from_config(&config).into_diagnostic()?;

    let (payout_store, doctor_store) = open_stores(cli.db_path.clone())?;
    seed(&cli, &payout_store, &doctor_store).await?;

    let engine = PayoutEngine::new(payout_store, doctor_store, providers)
        .with_provider_timeout(config.provider_timeout);

    let stdout = io::stdout();
    match cli.command {
        Command::Trigger { ids } => {
            let mut outcomes = Vec::with_capacity(ids.len());
            for id in ids {
                let outcome = match engine.trigger_payout(&id).await {
                    Ok(outcome) => outcome,
                    Err(err @ (PayoutError::NotFound(_) | PayoutError::InvalidTransition { .. })) => {
                        ProviderOutcome::from(err)
                    }
                    Err(err) => return Err(err).into_diagnostic(),
                };
                outcomes.push((id, outcome));
            }
            PayoutWriter::new(stdout.lock())
                .write_outcomes(outcomes.iter().map(|(id, o)| (id.as_str(), o)))
                .into_diagnostic()?;
        }
        Command::Approve { id, admin } => {
            let payout = engine
                .mark_payout_as_approved(&id, admin)
                .await
                .into_diagnostic()?;
            PayoutWriter::new(stdout.lock())
                .write_payouts([&payout])
                .into_diagnostic()?;
        }
        Command::Abandon { id, reason } => {
            let payout = engine.abandon_payout(&id, reason).await.into_diagnostic()?;
            PayoutWriter::new(stdout.lock())
                .write_payouts([&payout])
                .into_diagnostic()?;
        }
        Command::Settle { include_failed } => {
            let outcomes = engine.settle_pending(include_failed).await.into_diagnostic()?;
            PayoutWriter::new(stdout.lock())
                .write_outcomes(outcomes.iter().map(|(id, o)| (id.as_str(), o)))
                .into_diagnostic()?;
        }
        Command::Show { id } => {
            let details = engine
                .get_payout_by_id(&id)
                .await
                .into_diagnostic()?
                .ok_or(PayoutError::NotFound(id))
                .into_diagnostic()?;
            let json = serde_json::to_string_pretty(&details).into_diagnostic()?;
            println!("{json}");
        }
        Command::List {
            status,
            doctor,
            provider,
        } => {
            let filter = PayoutFilter {
                status,
                doctor_id: doctor,
                provider,
                ..Default::default()
            };
            let payouts = engine.list_payouts(&filter).await.into_diagnostic()?;
            PayoutWriter::new(stdout.lock())
                .write_payouts(&payouts)
                .into_diagnostic()?;
        }
    }

    Ok(())
}
