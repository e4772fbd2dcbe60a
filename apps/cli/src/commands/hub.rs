//! Model-hub publishing command implementation.

use anyhow::{Context, Result};
use catena_cloud::{CloudConfig, HubClient};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum HubCommand {
    /// Upload a local model artifact to a hub repository
    Upload {
        /// Target repository (e.g. acme/my-model-gguf)
        #[arg(long)]
        repo_id: String,

        /// Local artifact file
        #[arg(long)]
        file: PathBuf,

        /// Name of the file inside the repository (defaults to the local name)
        #[arg(long)]
        remote_name: Option<String>,
    },
}

pub async fn execute(cmd: HubCommand) -> Result<()> {
    match cmd {
        HubCommand::Upload { repo_id, file, remote_name } => upload(repo_id, file, remote_name).await,
    }
}

async fn upload(repo_id: String, file: PathBuf, remote_name: Option<String>) -> Result<()> {
    // Precondition: fail before any network call when the artifact is
    // missing, and say where we looked from.
    if !file.exists() {
        let cwd = std::env::current_dir()
            .map_or_else(|_| "<unknown>".to_string(), |d| d.display().to_string());
        eprintln!("{} local artifact not found: {}", "error:".red().bold(), file.display());
        eprintln!("  Current directory: {cwd}");
        std::process::exit(1);
    }

    let remote_name = remote_name.unwrap_or_else(|| {
        file.file_name().map_or_else(|| "model".to_string(), |n| n.to_string_lossy().to_string())
    });

    let config = CloudConfig::default();
    let client = HubClient::new(&config).context("hub credentials missing")?;

    println!("{} Ensuring repository {} exists...", "→".cyan(), repo_id.cyan());
    match client.ensure_repo(&repo_id).await {
        Ok(true) => println!("{} Repository created", "✓".green()),
        Ok(false) => println!("{} Repository ready", "✓".green()),
        // Creation failure is recoverable: the repository may already exist
        // with permissions we cannot see, so try the upload anyway.
        Err(e) => {
            println!("{} Could not create repository: {e}", "⚠".yellow());
            println!("  Attempting the upload anyway...");
        }
    }

    println!("{} Uploading {}...", "→".cyan(), file.display());
    client
        .upload_file(&repo_id, &file, &remote_name)
        .await
        .with_context(|| format!("failed to upload {} to {repo_id}", file.display()))?;

    println!("{} Upload complete: {}/{}", "✓".green(), repo_id.cyan(), remote_name);
    Ok(())
}
