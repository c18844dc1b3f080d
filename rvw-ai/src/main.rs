//! rvw-ai - Review analysis command line
//!
//! `analyze` sends grouped product comments to the model in batches and
//! prints the aggregate (analyses plus per-batch diagnostics) as JSON on
//! stdout. `repair` runs the recovery parser on a saved model response.
//!
//! Per-batch failures never change the exit code; only I/O and
//! configuration errors do.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use rvw_ai::config::{resolve_analyzer_settings, CliOverrides};
use rvw_ai::models::parse_records_json;
use rvw_ai::services::{BatchOrchestrator, OllamaClient, RecoveryParser};
use rvw_common::config::{load_bootstrap_config, ConfigSource};

/// Command-line arguments for rvw-ai
#[derive(Parser, Debug)]
#[command(name = "rvw-ai")]
#[command(about = "Batch analysis of product comments with tolerant model output recovery")]
#[command(version)]
struct Args {
    /// TOML config file (default: RVW_CONFIG, then <config_dir>/rvw/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a JSON array of {product, comments} records or {product, comment} rows
    Analyze {
        /// Input JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Records per model call
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Model identifier
        #[arg(short, long)]
        model: Option<String>,

        /// Sampling temperature
        #[arg(short, long)]
        temperature: Option<f32>,

        /// Ollama base URL
        #[arg(long)]
        ollama_url: Option<String>,

        /// Also print the run summary to stderr
        #[arg(long, default_value_t = false)]
        summary: bool,
    },
    /// Recover structured output from a raw model response (file or stdin)
    Repair {
        /// Raw response file; reads stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (toml_config, source) =
        load_bootstrap_config(args.config.as_deref()).context("Failed to load configuration")?;
    rvw_common::logging::init_logging(&toml_config.logging).context("Failed to initialize logging")?;

    match &source {
        ConfigSource::File(path) => info!("Configuration: {}", path.display()),
        ConfigSource::Missing(path) => warn!("Config file {} not found, using defaults", path.display()),
        ConfigSource::Defaults => info!("No config file, using defaults"),
    }

    match args.command {
        Command::Analyze {
            input,
            batch_size,
            model,
            temperature,
            ollama_url,
            summary,
        } => {
            let overrides = CliOverrides {
                model,
                temperature,
                ollama_url,
                batch_size,
            };
            let settings = resolve_analyzer_settings(&overrides, &toml_config.analyzer)
                .context("Invalid analyzer settings")?;
            info!(
                model = %settings.service.model,
                temperature = settings.service.temperature,
                endpoint = %settings.service.endpoint,
                batch_size = settings.batch_size,
                "Analyzer settings resolved"
            );

            let text = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let records = parse_records_json(&text, settings.max_comments)
                .with_context(|| format!("Failed to parse {}", input.display()))?;
            if records.is_empty() {
                warn!("No records with comments in {}", input.display());
            }

            let client = OllamaClient::new(settings.service.clone()).context("Failed to create Ollama client")?;
            let orchestrator = BatchOrchestrator::new(Arc::new(client), settings.batch_size)?;
            let run = orchestrator.run_with_summary(&records).await;

            println!("{}", serde_json::to_string_pretty(&run.result)?);
            if summary {
                eprintln!("{}", serde_json::to_string_pretty(&run.summary)?);
            }
        }
        Command::Repair { input } => {
            let raw = match input {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buffer)
                        .context("Failed to read stdin")?;
                    buffer
                }
            };

            let outcome = RecoveryParser::default().parse(&raw, 1);
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}
