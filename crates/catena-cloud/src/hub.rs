//! Model-hub client for publishing fine-tuned artifacts.

use crate::config::{token_from_env, CloudConfig, HUB_TOKEN_ENV};
use crate::error::{CloudError, CloudResult};
use reqwest::Client;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Client for the model hub's repository and upload endpoints.
#[derive(Debug, Clone)]
pub struct HubClient {
    endpoint: String,
    token: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct CreateRepoBody<'a> {
    #[serde(rename = "type")]
    repo_type: &'static str,
    name: &'a str,
}

impl HubClient {
    pub fn new(config: &CloudConfig) -> CloudResult<Self> {
        Ok(Self::with_token(config, token_from_env(HUB_TOKEN_ENV)?))
    }

    #[must_use]
    pub fn with_token(config: &CloudConfig, token: String) -> Self {
        Self {
            endpoint: config.hub_endpoint.trim_end_matches('/').to_string(),
            token,
            client: Client::new(),
        }
    }

    /// Ensure a model repository exists. Idempotent: an existing repository
    /// is success. Returns `true` when the repository was newly created.
    pub async fn ensure_repo(&self, repo_id: &str) -> CloudResult<bool> {
        let url = format!("{}/api/repos/create", self.endpoint);
        debug!(repo_id, "ensuring hub repository exists");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&CreateRepoBody { repo_type: "model", name: repo_id })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!(repo_id, "hub repository created");
            return Ok(true);
        }

        let body = response.text().await.unwrap_or_default();
        match CloudError::from_status(status, body) {
            CloudError::AlreadyExists(_) => {
                debug!(repo_id, "hub repository already exists");
                Ok(false)
            }
            other => Err(other),
        }
    }

    /// Upload one local artifact file under a fixed remote name.
    pub async fn upload_file(
        &self,
        repo_id: &str,
        local_path: &Path,
        remote_name: &str,
    ) -> CloudResult<()> {
        let bytes = tokio::fs::read(local_path).await?;
        let url = format!("{}/api/models/{repo_id}/upload/main/{remote_name}", self.endpoint);
        debug!(repo_id, remote_name, size = bytes.len(), "uploading artifact to hub");

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

        info!(repo_id, remote_name, "artifact upload complete");
        Ok(())
    }
}
