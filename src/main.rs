use clap::Parser;
use miette::{IntoDiagnostic, Result};
use scholarflow::application::approvals::{ApprovalStageEngine, StageSelector};
use scholarflow::application::payments::PaymentRecordManager;
use scholarflow::application::queries::{RecordFilter, RecordQueries, RecordQuery};
use scholarflow::config::WorkflowConfig;
use scholarflow::domain::ports::{DirectoryHandle, StoreHandle};
use scholarflow::infrastructure::in_memory::{InMemoryDirectory, InMemoryStore};
#[cfg(feature = "storage-rocksdb")]
use scholarflow::infrastructure::rocksdb::RocksDBStore;
use scholarflow::interfaces::csv::command_reader::{Command, CommandReader};
use scholarflow::interfaces::csv::record_writer::RecordWriter;
use scholarflow::interfaces::json::directory_loader::DirectoryLoader;
use scholarflow::telemetry;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Workflow commands CSV file
    input: PathBuf,

    /// Institution configuration (JSON)
    #[arg(long)]
    config: PathBuf,

    /// Subjects and actors (JSON). Without it the directory is empty.
    #[arg(long)]
    directory: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// List only this subject's records
    #[arg(long)]
    subject: Option<u32>,

    /// Reviewer role for a scoped listing; requires --actor
    #[arg(long)]
    role: Option<String>,

    /// Reviewer id for a scoped listing; requires --role
    #[arg(long)]
    actor: Option<u32>,

    /// Listing filter: current, previous, approved, pending, role_approved,
    /// role_pending or a month name
    #[arg(long = "type")]
    filter: Option<String>,

    /// Print the stage history of this record instead of a record listing
    #[arg(long, value_name = "RECORD")]
    stages: Option<u64>,

    /// Which stages to print: all or latest
    #[arg(long, default_value = "all")]
    select: String,
}

fn open_store(db_path: Option<PathBuf>) -> Result<StoreHandle> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => Ok(Arc::new(RocksDBStore::open(path).into_diagnostic()?)),
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            warn!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Arc::new(InMemoryStore::new()))
        }
        None => Ok(Arc::new(InMemoryStore::new())),
    }
}

fn open_directory(path: Option<PathBuf>, config: &WorkflowConfig) -> Result<DirectoryHandle> {
    let directory = match path {
        Some(path) => {
            let file = File::open(path).into_diagnostic()?;
            DirectoryLoader::new(config).load(file).into_diagnostic()?
        }
        None => InMemoryDirectory::new(),
    };
    Ok(Arc::new(directory))
}

async fn execute(
    command: Command,
    manager: &PaymentRecordManager,
    engine: &ApprovalStageEngine,
) -> scholarflow::error::Result<()> {
    match command {
        Command::OpenPeriod(period) => {
            manager.open_period(period).await?;
        }
        Command::Create {
            subject,
            period,
            days,
        } => {
            manager.create(subject, period, days).await?;
        }
        Command::Release { record, subject } => {
            manager.release(record, subject).await?;
        }
        Command::Decide(request) => {
            engine.submit_decision(request).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    let config = Arc::new(WorkflowConfig::load(&cli.config).into_diagnostic()?);
    let directory = open_directory(cli.directory, &config)?;
    let store = open_store(cli.db_path)?;

    let manager = PaymentRecordManager::new(store.clone(), directory.clone(), config.clone());
    let engine = ApprovalStageEngine::new(store.clone(), directory.clone(), config.clone());
    let queries = RecordQueries::new(store, directory, config);

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for (line, command) in reader.commands().enumerate() {
        match command {
            Ok(command) => {
                if let Err(e) = execute(command, &manager, &engine).await {
                    warn!(line = line + 1, error = %e, "Error processing command");
                }
            }
            Err(e) => {
                warn!(line = line + 1, error = %e, "Error reading command");
            }
        }
    }

    let stdout = io::stdout();
    let mut writer = RecordWriter::new(stdout.lock());
    if let Some(record) = cli.stages {
        let selector = StageSelector::from_str(&cli.select).into_diagnostic()?;
        let stages = engine.list_stages(record, selector).await.into_diagnostic()?;
        writer.write_stages(&stages).into_diagnostic()?;
    } else {
        let query = RecordQuery {
            subject: cli.subject,
            role: cli.role,
            actor: cli.actor,
            filter: cli
                .filter
                .as_deref()
                .map(RecordFilter::from_str)
                .transpose()
                .into_diagnostic()?,
        };
        let records = queries.find(&query).await.into_diagnostic()?;
        writer.write_records(&records).into_diagnostic()?;
    }

    Ok(())
}
