//! Catena CLI - Command-line interface for the fine-tuning data workflow
//!
//! This CLI provides a `catena` command for validating JSONL training data,
//! scoring readiness, driving the cloud customization workflow, publishing
//! artifacts to the model hub, and running local fine-tuning jobs.

mod commands;

use clap::{Parser, Subcommand};
use commands::{cloud, hub, readiness, train, validate};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Catena CLI - fine-tuning data preparation and launch
///
/// Catena prepares, validates, and launches a language-model fine-tuning
/// workflow: JSONL dataset checks, readiness scoring, cloud customization
/// jobs, model-hub publishing, and local adapter training.
#[derive(Parser, Debug)]
#[command(
    name = "catena",
    author,
    version,
    about = "Catena - fine-tuning data preparation and launch toolkit"
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a JSONL training file
    ///
    /// Checks JSON syntax, required fields, message roles, citation markers
    /// and answer-structure tags. Exits 0 exactly when no line produced an
    /// error; warnings alone do not fail validation.
    Validate {
        /// Path to the JSONL file
        file: PathBuf,

        /// Print dataset statistics after a successful validation
        #[arg(long)]
        analyze: bool,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether the collected training data is ready for fine-tuning
    ///
    /// Scans a directory of JSONL files, totals the examples, checks the
    /// volume thresholds and prints a cost estimate. The recommendation is
    /// advisory; only a failed scan exits nonzero.
    Readiness {
        /// Directory containing *.jsonl training files
        #[arg(long, default_value = "training_data/collected_data")]
        data_dir: PathBuf,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Drive the cloud model-customization workflow
    #[command(subcommand)]
    Cloud(cloud::CloudCommand),

    /// Publish model artifacts to the model hub
    #[command(subcommand)]
    Hub(hub::HubCommand),

    /// Run fine-tuning jobs
    #[command(subcommand)]
    Train(train::TrainCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber =
        FmtSubscriber::builder().with_max_level(level).without_time().with_target(false).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Validate { file, analyze, json } => {
            let valid = validate::execute(&file, analyze, json).await?;
            if !valid {
                std::process::exit(1);
            }
        }
        Command::Readiness { data_dir, json } => {
            // Readiness is advisory; the recommendation is the output, not
            // the exit status.
            readiness::execute(data_dir, json).await?;
        }
        Command::Cloud(cmd) => {
            cloud::execute(cmd).await?;
        }
        Command::Hub(cmd) => {
            hub::execute(cmd).await?;
        }
        Command::Train(cmd) => {
            train::execute(cmd).await?;
        }
    }

    Ok(())
}
