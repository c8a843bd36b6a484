use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rift_report::config::AppConfig;
use rift_report::pipeline::Pipeline;
use rift_report::report::{GeminiBackend, LlmBackend};
use rift_report::riot::RiotClient;

#[derive(Parser)]
#[command(name = "rift-report")]
#[command(about = "League of Legends champion performance tracker with AI-generated reports")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write an HTML report
    Run {
        /// Challenger players to sample
        #[arg(long)]
        top: Option<usize>,

        /// Matches fetched per player
        #[arg(long)]
        matches_per_player: Option<u32>,

        /// Report output directory
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Fetch and aggregate, printing the summary as JSON (no LLM call)
    Stats {
        #[arg(long)]
        top: Option<usize>,

        #[arg(long)]
        matches_per_player: Option<u32>,
    },

    /// Check that the configured LLM backend is reachable
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting rift-report v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load_or_default(Path::new(&cli.config))
        .with_context(|| format!("loading config from {}", cli.config))?;

    match cli.command {
        Commands::Run {
            top,
            matches_per_player,
            out,
        } => {
            let client = build_client(&config)?;
            let backend = build_backend(&config)?;
            let output_dir = out.unwrap_or_else(|| config.report.output_dir.clone());

            let pipeline = Pipeline::new(client, output_dir).with_backend(backend);
            let path = pipeline
                .run(
                    top.unwrap_or(config.report.top_players),
                    matches_per_player.unwrap_or(config.report.matches_per_player),
                )
                .await
                .context("pipeline run failed")?;

            println!("Report written to {}", path.display());
        }

        Commands::Stats {
            top,
            matches_per_player,
        } => {
            let client = build_client(&config)?;
            let pipeline = Pipeline::new(client, config.report.output_dir.clone());

            let players = pipeline
                .top_players(top.unwrap_or(config.report.top_players))
                .await?;
            let matches = pipeline
                .matches_for_players(
                    &players,
                    matches_per_player.unwrap_or(config.report.matches_per_player),
                )
                .await?;
            let summary = pipeline.aggregate_matches(&matches)?;

            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Commands::Health => {
            let backend = build_backend(&config)?;
            if backend.health_check().await {
                println!("{} backend is reachable", backend.name());
            } else {
                bail!("{} backend is not reachable", backend.name());
            }
        }
    }

    Ok(())
}

fn build_client(config: &AppConfig) -> Result<Arc<RiotClient>> {
    let api_key = config.riot.api_key().context("resolving Riot API key")?;
    let client = RiotClient::new(
        api_key,
        config.riot.window_limits(),
        config.riot.client_config(),
    )
    .context("building Riot client")?;
    Ok(Arc::new(client))
}

fn build_backend(config: &AppConfig) -> Result<Arc<dyn LlmBackend>> {
    let backend = GeminiBackend::from_env(
        config.ai.base_url.clone(),
        config.ai.model.clone(),
        &config.ai.api_key_env,
        std::time::Duration::from_secs(config.ai.timeout_seconds),
    )
    .context("building LLM backend")?;
    Ok(Arc::new(backend))
}
