//! Training command implementation.

use anyhow::{Context, Result};
use catena_train::{
    LocalLoraTrainer, ModelSpec, StdoutProgressSink, Trainer, TrainingJobSpec,
};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum TrainCommand {
    /// Run a fixed-configuration local fine-tuning job
    Local {
        /// JSONL chat dataset
        #[arg(long)]
        dataset: PathBuf,

        /// Output directory for adapter, tokenizer, and manifest
        #[arg(long, default_value = "outputs")]
        output_dir: PathBuf,

        /// Base model identifier recorded in the manifest
        #[arg(long, default_value = "llama-3-8b-bnb-4bit")]
        base_model: String,

        /// Override the fixed step count
        #[arg(long)]
        max_steps: Option<u32>,

        /// Output the training manifest as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn execute(cmd: TrainCommand) -> Result<()> {
    match cmd {
        TrainCommand::Local { dataset, output_dir, base_model, max_steps, json } => {
            local(dataset, output_dir, base_model, max_steps, json).await
        }
    }
}

async fn local(
    dataset: PathBuf,
    output_dir: PathBuf,
    base_model: String,
    max_steps: Option<u32>,
    json: bool,
) -> Result<()> {
    let mut job = TrainingJobSpec::new(
        ModelSpec { engine: "local".to_string(), model_id: base_model },
        dataset,
    );
    if let Some(steps) = max_steps {
        job.hyperparams.max_steps = steps;
        job.hyperparams.warmup_steps = job.hyperparams.warmup_steps.min(steps.saturating_sub(1));
    }

    let trainer = LocalLoraTrainer::new(output_dir);
    trainer.prepare(&job).await.context("failed to prepare training job")?;
    let manifest = trainer.run(&job, &StdoutProgressSink).await.context("training failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
        return Ok(());
    }

    println!();
    println!("{}", "Local training complete".bold().green());
    println!("  Job: {}", manifest.job_id.0.cyan());
    if let Some(loss) = manifest.metrics.train_loss {
        println!("  Final loss: {loss:.4}");
    }
    for artifact in &manifest.artifacts {
        println!("  Saved: {}", artifact.path.display().to_string().dimmed());
    }
    println!();
    Ok(())
}
