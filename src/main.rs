//! # Marine Ingest CLI (`mingest`)
//!
//! ## Usage
//!
//! ```bash
//! mingest --config ./config/mingest.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `mingest init` | Create the SQLite database and one table per schema |
//! | `mingest schemas` | Print the active canonical schema registry |
//! | `mingest detect <file>` | Score a file against every schema without writing |
//! | `mingest ingest <file>` | Detect, map, and commit a file |
//! | `mingest serve` | Start the HTTP upload server |
//!
//! ## Examples
//!
//! ```bash
//! mingest init --config ./config/mingest.toml
//! mingest detect ./survey_2023.csv
//! mingest ingest ./survey_2023.csv
//! mingest serve
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use marine_ingest::{config, ingest, migrate, schemas, server};

const DEFAULT_LOG_FILTER: &str = "marine_ingest=info,marine_ingest_core=info,tower_http=info";

/// Marine Ingest CLI: schema detection and standardized ingestion for
/// marine research datasets.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/mingest.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "mingest",
    version,
    about = "Schema-detecting ingestion for marine research datasets"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "./config/mingest.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database.
    ///
    /// Creates the SQLite file and one table per registered schema.
    /// Safe to run multiple times.
    Init,

    /// List the canonical schemas and detection thresholds.
    Schemas,

    /// Parse a file and report the detected schema and column mapping
    /// without writing anything.
    Detect {
        /// CSV or JSON file (`.json` selects JSON, anything else CSV).
        file: PathBuf,
    },

    /// Detect, standardize, and commit a file as a single batch.
    Ingest {
        /// CSV or JSON file (`.json` selects JSON, anything else CSV).
        file: PathBuf,
    },

    /// Start the HTTP upload server.
    Serve,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Schemas => {
            schemas::list_schemas(&cfg)?;
        }
        Commands::Detect { file } => {
            ingest::run_detect(&cfg, &file)?;
        }
        Commands::Ingest { file } => {
            ingest::run_ingest(&cfg, &file).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
