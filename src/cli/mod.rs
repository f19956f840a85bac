mod noninteractive;
mod output;
mod repl;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::core::error::SmartSpendError;
use crate::core::store::KeyValueStore;
use crate::session::ChatSession;
use crate::storage::{Database, MemoryStore};

pub use output::{SurfaceMode, TerminalSurface};

#[derive(Parser, Debug)]
#[command(name = "smartspend", version, about = "Expense categorization assistant for the terminal")]
struct Cli {
    /// Categorize one expense description and exit
    #[arg(short, long, conflicts_with_all = ["query", "classify"])]
    expense: Option<String>,

    /// Ask one question and exit
    #[arg(short, long, conflicts_with = "classify")]
    query: Option<String>,

    /// Classify locally without contacting the service
    #[arg(long)]
    classify: Option<String>,

    /// Output format for one-shot mode
    #[arg(short = 'f', long, default_value = "text")]
    output_format: OutputFormat,

    /// Base URL of the categorization service
    #[arg(long, env = "SMARTSPEND_API_URL")]
    api_url: Option<String>,

    /// Working directory
    #[arg(short = 'c', long = "cwd")]
    working_dir: Option<PathBuf>,

    /// Directory for the history store (defaults to the user data directory)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Keep history in memory only
    #[arg(long)]
    ephemeral: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub async fn run_cli() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = crate::core::config::load_config(cli.working_dir.clone())
        .map_err(SmartSpendError::from)?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }

    let filter = if cli.debug || config.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Some(text) = cli.classify {
        noninteractive::classify(&text, cli.output_format)?;
        return Ok(ExitCode::SUCCESS);
    }

    let store: Arc<dyn KeyValueStore> = if cli.ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        let db = Database::open(&config)
            .await
            .map_err(SmartSpendError::from)?;
        db.run_migrations()
            .await
            .map_err(SmartSpendError::from)?;
        Arc::new(db.kv())
    };

    let service = crate::providers::create_service(&config).map_err(SmartSpendError::from)?;
    let mode = match (&cli.expense, &cli.query, &cli.output_format) {
        (None, None, _) => SurfaceMode::Interactive,
        (_, _, OutputFormat::Text) => SurfaceMode::OneShot,
        (_, _, OutputFormat::Json) => SurfaceMode::Silent,
    };
    let surface = Arc::new(TerminalSurface::with_mode(mode));
    let session = ChatSession::start(service, store, surface.clone()).await;
    tracing::debug!(session_id = %session.id(), api = %config.api_base(), "session started");

    let request = match (cli.expense, cli.query) {
        (Some(text), _) => noninteractive::Request::Expense(text),
        (None, Some(text)) => noninteractive::Request::Query(text),
        (None, None) => {
            repl::run(session, surface).await?;
            return Ok(ExitCode::SUCCESS);
        }
    };
    match noninteractive::run(session, request, cli.output_format).await? {
        Some(_) => Ok(ExitCode::SUCCESS),
        None => Ok(ExitCode::FAILURE),
    }
}
