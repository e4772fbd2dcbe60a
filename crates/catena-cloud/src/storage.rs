//! Object-storage client for training data uploads.

use crate::config::{token_from_env, CloudConfig, CLOUD_TOKEN_ENV};
use crate::error::{CloudError, CloudResult};
use reqwest::Client;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Client for the object-storage API.
#[derive(Debug, Clone)]
pub struct StorageClient {
    endpoint: String,
    region: String,
    needs_location_constraint: bool,
    token: String,
    client: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CreateBucketConfiguration {
    location_constraint: String,
}

impl StorageClient {
    /// Build a client from config, resolving credentials from the
    /// environment.
    pub fn new(config: &CloudConfig) -> CloudResult<Self> {
        Ok(Self::with_token(config, token_from_env(CLOUD_TOKEN_ENV)?))
    }

    /// Build a client with an explicit token (used by tests).
    #[must_use]
    pub fn with_token(config: &CloudConfig, token: String) -> Self {
        Self {
            endpoint: config.storage_endpoint.trim_end_matches('/').to_string(),
            region: config.region.clone(),
            needs_location_constraint: config.needs_location_constraint(),
            token,
            client: Client::new(),
        }
    }

    /// Create a bucket for training data.
    ///
    /// Idempotent: a bucket this account already owns is treated as success.
    /// Returns `true` when the bucket was newly created.
    pub async fn create_bucket(&self, bucket: &str) -> CloudResult<bool> {
        let url = format!("{}/{bucket}", self.endpoint);
        debug!(bucket, region = %self.region, "creating storage bucket");

        let mut request = self.client.put(&url).bearer_auth(&self.token);
        if self.needs_location_constraint {
            request = request.json(&CreateBucketConfiguration {
                location_constraint: self.region.clone(),
            });
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            info!(bucket, "storage bucket created");
            return Ok(true);
        }

        let body = response.text().await.unwrap_or_default();
        match CloudError::from_status(status, body) {
            CloudError::AlreadyExists(_) => {
                info!(bucket, "storage bucket already exists");
                Ok(false)
            }
            other => Err(other),
        }
    }

    /// Upload a local file as an object, returning the composed location
    /// identifier (`s3://bucket/key`).
    pub async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
    ) -> CloudResult<String> {
        let bytes = tokio::fs::read(local_path).await?;
        let url = format!("{}/{bucket}/{key}", self.endpoint);
        debug!(bucket, key, size = bytes.len(), "uploading object");

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.token)
            .header("content-type", "application/octet-stream")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CloudError::from_status(status, body));
        }

        let uri = format!("s3://{bucket}/{key}");
        info!(%uri, "training data uploaded");
        Ok(uri)
    }
}
