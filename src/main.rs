use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use quill::context::ContextAggregator;
use quill::insight::InsightExtractor;
use quill::kernel::telemetry::TelemetryRecorder;
use quill::services::llm::HttpProvider;
use quill::{CycleOrchestrator, CycleRequest, PipelineConfig};

#[derive(Parser)]
#[command(name = "quill", version, about = "Narrative reasoning cycle for manuscripts in progress")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one full cycle against the configured model and print the plan
    Run {
        /// Cycle request JSON (trigger, upstream payloads, recent scenes)
        #[arg(long)]
        request: PathBuf,
        /// Optional TOML config
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Aggregate and interpret only; no network call
    Interpret {
        #[arg(long)]
        request: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn read_request(path: &Path) -> Result<CycleRequest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read request {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid cycle request in {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { request, config } => {
            let config = PipelineConfig::load(config.as_deref())?;
            let request = read_request(&request)?;

            let provider = HttpProvider::new(&config.llm)?;
            let orchestrator = CycleOrchestrator::new(&config, Arc::new(provider));
            let mut telemetry = TelemetryRecorder::new();

            let outcome = orchestrator.run_cycle(&request, &mut telemetry).await?;
            tracing::info!(
                trace = %serde_json::to_string(&outcome.trace)?,
                telemetry = %serde_json::to_string(&telemetry.snapshot())?,
                "cycle summary"
            );
            println!("{}", serde_json::to_string_pretty(&outcome.plan)?);
        }
        Commands::Interpret { request, config } => {
            let config = PipelineConfig::load(config.as_deref())?;
            let request = read_request(&request)?;

            let snapshot = ContextAggregator::new(config.aggregator).aggregate(&request.trigger, &request.payloads);
            let insights = InsightExtractor::new().extract(&snapshot);
            println!("{}", serde_json::to_string_pretty(&insights)?);
        }
    }

    Ok(())
}
