// Mealcast - recipe recommendation service
// Main entry point

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mealcast::config::load_config;
use mealcast::metrics::TrainingSource;
use mealcast::models::RecipeId;
use mealcast::server::types::{parse_predict_body, TrainResponse};
use mealcast::training::synthetic::{self, DEFAULT_SYNTHETIC_COUNT, DEFAULT_SYNTHETIC_SEED};
use mealcast::training::TrainingRow;
use mealcast::{logging, RecommenderService};

/// Recipe recommendations from kitchen history
///
/// Trains a gradient-boosted classifier on past services and ranks recipes
/// for a new context. Runs as an HTTP service by default.
#[derive(Parser, Debug)]
#[command(name = "mealcast")]
#[command(version)]
#[command(about, long_about = None)]
struct Cli {
    /// Config file (otherwise $MEALCAST_CONFIG, then the user config dir)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level for mealcast and the HTTP layer; RUST_LOG overrides it
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default)
    Serve {
        /// Override the configured bind address
        #[arg(long)]
        bind: Option<String>,
    },

    /// Train from a JSON file: `{"training_data": [...]}` or a bare array
    Train { file: PathBuf },

    /// Predict for the context in a JSON file
    Predict {
        file: PathBuf,

        /// Number of recipes to return
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },

    /// Generate synthetic training rows
    Synth {
        /// Recipe ids, comma separated; the first two get a weekday bias
        #[arg(long, value_delimiter = ',', required = true)]
        recipes: Vec<RecipeId>,

        #[arg(long, default_value_t = DEFAULT_SYNTHETIC_COUNT)]
        count: usize,

        #[arg(long, default_value_t = DEFAULT_SYNTHETIC_SEED)]
        seed: u64,

        /// Write rows here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Train on the rows instead of printing them
        #[arg(long, conflicts_with = "output")]
        train: bool,
    },

    /// Show the stored model
    Info,
}

#[derive(Deserialize, Serialize)]
#[serde(untagged)]
enum TrainingFile {
    Wrapped { training_data: Vec<TrainingRow> },
    Rows(Vec<TrainingRow>),
}

impl TrainingFile {
    fn into_rows(self) -> Vec<TrainingRow> {
        match self {
            Self::Wrapped { training_data } => training_data,
            Self::Rows(rows) => rows,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref());

    let mut settings = load_config(cli.config.as_deref())?;
    if let Some(Command::Serve { bind: Some(bind) }) = &cli.command {
        settings.server.bind_address = bind.clone();
    }

    let service = Arc::new(RecommenderService::new(settings)?);

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { .. } => mealcast::server::serve(service).await,
        Command::Train { file } => {
            let rows = read_json::<TrainingFile>(&file)?.into_rows();
            let report = service.train(rows, TrainingSource::Cli).await?;
            print_json(&TrainResponse::from(report))
        }
        Command::Predict { file, count } => {
            let mut request = parse_predict_body(read_json(&file)?)?;
            if count.is_some() {
                request.num_predictions = count;
            }
            let result = service.predict(request, Local::now().date_naive()).await?;
            print_json(&result)
        }
        Command::Synth {
            recipes,
            count,
            seed,
            output,
            train,
        } => {
            let today = Local::now().date_naive();
            if train {
                let report = service.train_synthetic(&recipes, count, seed, today).await?;
                return print_json(&TrainResponse::from(report));
            }

            let rows = synthetic::generate(&recipes, count, seed, today)?;
            let file = TrainingFile::Wrapped {
                training_data: rows,
            };
            match output {
                Some(path) => {
                    let json = serde_json::to_string_pretty(&file)?;
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    eprintln!("✓ Wrote {} rows to {}", count, path.display());
                    Ok(())
                }
                None => print_json(&file),
            }
        }
        Command::Info => print_json(&service.status().await?),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
