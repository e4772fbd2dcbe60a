//! Client for the managed model-customization API.
//!
//! Wraps the four remote calls the fine-tuning workflow needs: list the
//! customizable base models, pick one, submit a customization job, and poll
//! its status. Wire types mirror the service's camelCase JSON.

use crate::config::{token_from_env, CloudConfig, CLOUD_TOKEN_ENV};
use crate::error::{CloudError, CloudResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One entry from the foundation-model listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSummary {
    pub model_id: String,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub customizations_supported: Vec<String>,
}

/// Conservative fixed hyperparameters for a customization job. The service
/// takes string values.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationHyperParams {
    pub learning_rate_multiplier: String,
    pub batch_size: String,
    pub epoch_count: String,
}

impl Default for CustomizationHyperParams {
    fn default() -> Self {
        Self {
            learning_rate_multiplier: "1.0".to_string(),
            batch_size: "16".to_string(),
            epoch_count: "3".to_string(),
        }
    }
}

/// Everything needed to submit one customization job.
#[derive(Debug, Clone)]
pub struct CustomizationJobRequest {
    pub job_name: String,
    pub base_model_id: String,
    pub role_arn: String,
    pub training_data_uri: String,
    pub validation_data_uri: Option<String>,
    pub hyperparams: CustomizationHyperParams,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DataConfig {
    s3_uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateJobBody {
    customization_type: &'static str,
    base_model_identifier: String,
    job_name: String,
    custom_model_name: String,
    role_arn: String,
    training_data_config: DataConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation_data_config: Option<DataConfig>,
    hyper_parameters: CustomizationHyperParams,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateJobResponse {
    job_arn: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    model_summaries: Vec<ModelSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum JobState {
    InProgress,
    Completed,
    Failed,
    Stopping,
    Stopped,
}

/// Status of a customization job as reported by the service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub status: JobState,
    #[serde(default)]
    pub failure_message: Option<String>,
    #[serde(default)]
    pub custom_model_arn: Option<String>,
}

/// Client for the model-customization API.
#[derive(Debug, Clone)]
pub struct CustomizationClient {
    endpoint: String,
    token: String,
    client: Client,
}

impl CustomizationClient {
    pub fn new(config: &CloudConfig) -> CloudResult<Self> {
        Ok(Self::with_token(config, token_from_env(CLOUD_TOKEN_ENV)?))
    }

    #[must_use]
    pub fn with_token(config: &CloudConfig, token: String) -> Self {
        Self {
            endpoint: config.customization_endpoint.trim_end_matches('/').to_string(),
            token,
            client: Client::new(),
        }
    }

    /// List base models that support fine-tuning.
    pub async fn list_customizable_models(&self) -> CloudResult<Vec<ModelSummary>> {
        let url = format!("{}/foundation-models?customizationType=FINE_TUNING", self.endpoint);
        debug!("listing customizable foundation models");

        let response = self.client.get(&url).bearer_auth(&self.token).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CloudError::from_status(status, body));
        }

        let listing: ListModelsResponse = response.json().await?;
        Ok(listing.model_summaries)
    }

    /// First customizable model whose id contains `filter`, or `None`.
    pub async fn find_base_model(&self, filter: &str) -> CloudResult<Option<ModelSummary>> {
        let models = self.list_customizable_models().await?;
        let found = models
            .into_iter()
            .find(|m| m.model_id.contains(filter) && m.customizations_supported.iter().any(|c| c == "FINE_TUNING"));
        if let Some(ref model) = found {
            info!(model_id = %model.model_id, "base model available for fine-tuning");
        }
        Ok(found)
    }

    /// Submit a customization job; returns the job ARN.
    pub async fn submit_job(&self, request: &CustomizationJobRequest) -> CloudResult<String> {
        let body = CreateJobBody {
            customization_type: "FINE_TUNING",
            base_model_identifier: request.base_model_id.clone(),
            job_name: request.job_name.clone(),
            custom_model_name: format!("{}-model", request.job_name),
            role_arn: request.role_arn.clone(),
            training_data_config: DataConfig { s3_uri: request.training_data_uri.clone() },
            validation_data_config: request
                .validation_data_uri
                .clone()
                .map(|s3_uri| DataConfig { s3_uri }),
            hyper_parameters: request.hyperparams.clone(),
        };

        let url = format!("{}/model-customization-jobs", self.endpoint);
        debug!(job_name = %request.job_name, base_model = %request.base_model_id, "submitting customization job");

        let response =
            self.client.post(&url).bearer_auth(&self.token).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CloudError::from_status(status, body));
        }

        let created: CreateJobResponse = response.json().await?;
        info!(job_arn = %created.job_arn, "customization job created");
        Ok(created.job_arn)
    }

    /// Fetch the current status of a customization job.
    pub async fn job_status(&self, job_arn: &str) -> CloudResult<JobStatus> {
        let url = format!("{}/model-customization-jobs/{job_arn}", self.endpoint);
        let response = self.client.get(&url).bearer_auth(&self.token).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CloudError::from_status(status, body));
        }

        Ok(response.json().await?)
    }
}
