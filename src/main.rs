use clap::Parser;
use freelance_ledger::application::engine::LedgerEngine;
use freelance_ledger::domain::ports::LedgerStoreRef;
use freelance_ledger::infrastructure::in_memory::InMemoryLedgerStore;
use freelance_ledger::interfaces::csv::operation_reader::OperationReader;
use freelance_ledger::interfaces::csv::profile_writer::ProfileWriter;
use freelance_ledger::interfaces::seed::LedgerSeed;
use freelance_ledger::telemetry;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Operations CSV file (`type, profile, job, amount`)
    input: PathBuf,

    /// JSON file with profiles, contracts and jobs to load before running
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn open_store(db_path: Option<PathBuf>) -> Result<LedgerStoreRef> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store = freelance_ledger::infrastructure::rocksdb::RocksDbLedgerStore::open(path)
                .into_diagnostic()?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            warn!(
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
            );
            Ok(Arc::new(InMemoryLedgerStore::new()))
        }
        None => Ok(Arc::new(InMemoryLedgerStore::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    let store = open_store(cli.db_path)?;

    if let Some(seed_path) = cli.seed {
        let file = File::open(seed_path).into_diagnostic()?;
        let seed = LedgerSeed::from_reader(file).into_diagnostic()?;
        seed.load_into(store.as_ref()).await.into_diagnostic()?;
    }

    let engine = LedgerEngine::new(store);

    // Rejected operations are reported and skipped; the batch keeps going.
    let file = File::open(cli.input).into_diagnostic()?;
    let reader = OperationReader::new(file);
    for (row, op_result) in reader.operations().enumerate() {
        match op_result {
            Ok(op) => {
                if let Err(e) = engine.process_operation(op).await {
                    warn!(row = row + 1, error = %e, "Error processing operation");
                }
            }
            Err(e) => {
                warn!(row = row + 1, error = %e, "Error reading operation");
            }
        }
    }

    let profiles = engine.into_results().await.into_diagnostic()?;

    let stdout = io::stdout();
    let mut writer = ProfileWriter::new(stdout.lock());
    writer.write_profiles(&profiles).into_diagnostic()?;

    Ok(())
}
