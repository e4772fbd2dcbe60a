//! Cloud customization command implementation.

use anyhow::{Context, Result};
use catena_cloud::{
    CloudConfig, CustomizationClient, CustomizationHyperParams, CustomizationJobRequest, JobState,
    StorageClient,
};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum CloudCommand {
    /// Create the training-data bucket (idempotent)
    CreateBucket {
        /// Bucket name
        #[arg(long)]
        bucket: Option<String>,

        /// Service region
        #[arg(long, default_value = "us-east-1")]
        region: String,
    },

    /// Upload a training file to the bucket
    Upload {
        /// Local JSONL file
        file: PathBuf,

        /// Object key (defaults to training/<file name>)
        #[arg(long)]
        key: Option<String>,

        /// Bucket name
        #[arg(long)]
        bucket: Option<String>,

        /// Service region
        #[arg(long, default_value = "us-east-1")]
        region: String,
    },

    /// List base models available for fine-tuning
    Models {
        /// Substring used to pick the preferred base model
        #[arg(long)]
        filter: Option<String>,

        /// Service region
        #[arg(long, default_value = "us-east-1")]
        region: String,
    },

    /// Submit a model-customization job
    Submit {
        /// Job name (the custom model is named <job>-model)
        job_name: String,

        /// Training data location (s3://bucket/key)
        #[arg(long)]
        training_data: String,

        /// Optional validation data location
        #[arg(long)]
        validation_data: Option<String>,

        /// IAM role the service assumes to read training data
        #[arg(long)]
        role_arn: String,

        /// Base model id (discovered via the filter when omitted)
        #[arg(long)]
        base_model: Option<String>,

        /// Service region
        #[arg(long, default_value = "us-east-1")]
        region: String,
    },

    /// Show the status of a customization job
    Status {
        /// Job ARN returned by submit
        job_arn: String,

        /// Service region
        #[arg(long, default_value = "us-east-1")]
        region: String,
    },
}

pub async fn execute(cmd: CloudCommand) -> Result<()> {
    match cmd {
        CloudCommand::CreateBucket { bucket, region } => create_bucket(bucket, &region).await,
        CloudCommand::Upload { file, key, bucket, region } => {
            upload(file, key, bucket, &region).await
        }
        CloudCommand::Models { filter, region } => models(filter, &region).await,
        CloudCommand::Submit { job_name, training_data, validation_data, role_arn, base_model, region } => {
            submit(job_name, training_data, validation_data, role_arn, base_model, &region).await
        }
        CloudCommand::Status { job_arn, region } => status(&job_arn, &region).await,
    }
}

async fn create_bucket(bucket: Option<String>, region: &str) -> Result<()> {
    let config = CloudConfig::for_region(region);
    let bucket = bucket.unwrap_or_else(|| config.bucket.clone());
    let client = StorageClient::new(&config).context("storage credentials missing")?;

    let created = client
        .create_bucket(&bucket)
        .await
        .with_context(|| format!("failed to create bucket {bucket}"))?;

    if created {
        println!("{} Created bucket: {}", "✓".green(), bucket.cyan());
    } else {
        println!("{} Bucket already exists: {}", "✓".green(), bucket.cyan());
    }
    Ok(())
}

async fn upload(
    file: PathBuf,
    key: Option<String>,
    bucket: Option<String>,
    region: &str,
) -> Result<()> {
    let config = CloudConfig::for_region(region);
    let bucket = bucket.unwrap_or_else(|| config.bucket.clone());
    let key = key.unwrap_or_else(|| {
        let name = file.file_name().map_or_else(String::new, |n| n.to_string_lossy().to_string());
        format!("training/{name}")
    });

    let client = StorageClient::new(&config).context("storage credentials missing")?;
    let uri = client
        .upload_object(&bucket, &key, &file)
        .await
        .with_context(|| format!("failed to upload {}", file.display()))?;

    println!("{} Uploaded {} to {}", "✓".green(), file.display(), uri.cyan());
    Ok(())
}

async fn models(filter: Option<String>, region: &str) -> Result<()> {
    let config = CloudConfig::for_region(region);
    let filter = filter.unwrap_or_else(|| config.base_model_filter.clone());
    let client = CustomizationClient::new(&config).context("cloud credentials missing")?;

    let all = client.list_customizable_models().await.context("failed to list base models")?;
    println!();
    println!("{}", format!("Customizable base models ({})", all.len()).bold().cyan());
    for model in &all {
        println!("  {}", model.model_id);
    }
    println!();

    match client.find_base_model(&filter).await? {
        Some(model) => {
            println!("{} {} available for fine-tuning", "✓".green(), model.model_id.cyan());
        }
        None => {
            println!(
                "{} No base model matching '{}'. Check model access in the service console.",
                "✗".red(),
                filter
            );
        }
    }
    Ok(())
}

async fn submit(
    job_name: String,
    training_data: String,
    validation_data: Option<String>,
    role_arn: String,
    base_model: Option<String>,
    region: &str,
) -> Result<()> {
    let config = CloudConfig::for_region(region);
    let client = CustomizationClient::new(&config).context("cloud credentials missing")?;

    let base_model_id = match base_model {
        Some(id) => id,
        None => client
            .find_base_model(&config.base_model_filter)
            .await?
            .map(|m| m.model_id)
            .with_context(|| {
                format!("no base model matching '{}' supports fine-tuning", config.base_model_filter)
            })?,
    };

    let request = CustomizationJobRequest {
        job_name,
        base_model_id,
        role_arn,
        training_data_uri: training_data,
        validation_data_uri: validation_data,
        hyperparams: CustomizationHyperParams::default(),
    };

    let job_arn =
        client.submit_job(&request).await.context("failed to create fine-tuning job")?;
    println!("{} Fine-tuning job created: {}", "✓".green(), job_arn.cyan());
    Ok(())
}

async fn status(job_arn: &str, region: &str) -> Result<()> {
    let config = CloudConfig::for_region(region);
    let client = CustomizationClient::new(&config).context("cloud credentials missing")?;

    let job = client.job_status(job_arn).await.context("failed to check job status")?;
    match job.status {
        JobState::Completed => {
            println!("{}", "Fine-tuning completed".bold().green());
            if let Some(arn) = job.custom_model_arn {
                println!("  Custom model: {}", arn.cyan());
            }
        }
        JobState::Failed => {
            println!("{}", "Fine-tuning failed".bold().red());
            let reason = job.failure_message.unwrap_or_else(|| "no message".to_string());
            println!("  Failure reason: {reason}");
        }
        JobState::InProgress => println!("Job status: {}", "InProgress".yellow()),
        JobState::Stopping => println!("Job status: {}", "Stopping".yellow()),
        JobState::Stopped => println!("Job status: Stopped"),
    }
    Ok(())
}
