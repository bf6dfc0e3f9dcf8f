use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use radio_catalog::app::{DebugTagsUseCase, SyncUseCase, TagFilter};
use radio_catalog::config::{Config, DEFAULT_CONFIG_PATH};
use radio_catalog::constants::DEBUG_TAGS_FILE;
use radio_catalog::db::{CatalogDb, CatalogReader};
use radio_catalog::infra::ReqwestHttp;
use radio_catalog::logging;
use radio_catalog::observability;
use radio_catalog::pipeline::ingestion::ExportFetcher;
use radio_catalog::pipeline::processing::VocabularyTagMapper;
use radio_catalog::server;

#[derive(Parser)]
#[command(name = "radio_catalog")]
#[command(about = "Radio station catalog synced from the radio-browser.info export")]
#[command(version)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the stored catalog with the latest export
    Sync,
    /// List every raw tag of the latest export with its mapped tag
    DebugTags {
        /// Only list tags with a mapping
        #[arg(short, long, conflicts_with = "unmapped")]
        mapped: bool,
        /// Only list tags without a mapping
        #[arg(short, long)]
        unmapped: bool,
        /// Also write the listing to debug_tags.txt in the working directory
        #[arg(short, long)]
        save: bool,
    },
    /// Serve the read API
    Serve {
        /// Port to listen on, overrides the config
        #[arg(long)]
        port: Option<u16>,
    },
}

fn export_fetcher(config: &Config) -> anyhow::Result<ExportFetcher> {
    let http = ReqwestHttp::new(&config.export).context("Failed to build HTTP client")?;
    Ok(ExportFetcher::new(Arc::new(http), config.export.url.clone()))
}

async fn run_sync(config: &Config) -> anyhow::Result<()> {
    let use_case = SyncUseCase::with_defaults(export_fetcher(config)?);
    let mut db = CatalogDb::open(&config.database).context("Failed to open catalog database")?;

    let report = use_case.run(&mut db).await.context("Sync failed")?;

    println!("\n📊 Sync results:");
    println!("   Records seen: {}", report.records_seen);
    println!("   Eligible: {}", report.records_eligible);
    println!("   Skipped: {}", report.records_skipped);
    println!("   Stations: {}", report.stations);
    println!("   Countries: {}", report.countries);
    println!("   Languages: {}", report.languages);
    println!("   Tags: {}", report.tags);
    println!("   Duration: {:.1}s", report.duration_secs());
    Ok(())
}

async fn run_debug_tags(
    config: &Config,
    mapped: bool,
    unmapped: bool,
    save: bool,
) -> anyhow::Result<()> {
    let records = export_fetcher(config)?
        .fetch()
        .await
        .context("Failed to fetch export")?;

    let use_case = DebugTagsUseCase::new(Box::new(VocabularyTagMapper::new()));
    let lines = use_case.listing(&records, TagFilter::from_flags(mapped, unmapped));
    for line in &lines {
        println!("{line}");
    }

    if save {
        DebugTagsUseCase::save(&lines, DEBUG_TAGS_FILE)
            .with_context(|| format!("Failed to write {DEBUG_TAGS_FILE}"))?;
    }
    Ok(())
}

async fn run_serve(config: &Config, port: Option<u16>) -> anyhow::Result<()> {
    // Creates the schema and switches the file to WAL before readers attach
    CatalogDb::open(&config.database).context("Failed to open catalog database")?;
    let port = port.unwrap_or(config.server.port);
    server::start_server(CatalogReader::new(&config.database), port).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_from(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    if let Some(port) = config.metrics.port {
        observability::init(port);
    }

    match cli.command {
        Commands::Sync => {
            println!("🔄 Syncing radio catalog...");
            run_sync(&config).await
        }
        Commands::DebugTags {
            mapped,
            unmapped,
            save,
        } => run_debug_tags(&config, mapped, unmapped, save).await,
        Commands::Serve { port } => run_serve(&config, port).await,
    }
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => info!("Done"),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("❌ {:#}", e);
            std::process::exit(1);
        }
    }
}
