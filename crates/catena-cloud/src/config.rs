//! Connection settings for the remote services.
//!
//! The original workflow embedded region, bucket, role and repository names
//! as literals; this struct names them with documented defaults so a caller
//! (or a CLI flag) can override any of them without editing source.
//! Credentials stay out of the struct and are resolved from the environment
//! when a client is built.

use crate::error::{CloudError, CloudResult};
use std::env;

/// Environment variable holding the customization/storage API token.
pub const CLOUD_TOKEN_ENV: &str = "CATENA_CLOUD_TOKEN";

/// Environment variable holding the model-hub API token.
pub const HUB_TOKEN_ENV: &str = "CATENA_HUB_TOKEN";

#[derive(Debug, Clone)]
pub struct CloudConfig {
    /// Service region. Buckets created outside the default region carry an
    /// explicit location constraint.
    pub region: String,
    /// Base URL of the model-customization API.
    pub customization_endpoint: String,
    /// Base URL of the object-storage API.
    pub storage_endpoint: String,
    /// Base URL of the model hub.
    pub hub_endpoint: String,
    /// Bucket that receives training data uploads.
    pub bucket: String,
    /// IAM role the customization service assumes to read training data.
    pub role_arn: String,
    /// Substring used to pick a base model from the customizable list.
    pub base_model_filter: String,
}

impl Default for CloudConfig {
    fn default() -> Self {
        let region = "us-east-1".to_string();
        Self {
            customization_endpoint: format!("https://bedrock.{region}.amazonaws.com"),
            storage_endpoint: format!("https://s3.{region}.amazonaws.com"),
            hub_endpoint: "https://huggingface.co".to_string(),
            bucket: "catena-training-data".to_string(),
            role_arn: String::new(),
            base_model_filter: "claude-3-haiku".to_string(),
            region,
        }
    }
}

impl CloudConfig {
    #[must_use]
    pub fn for_region(region: &str) -> Self {
        Self {
            region: region.to_string(),
            customization_endpoint: format!("https://bedrock.{region}.amazonaws.com"),
            storage_endpoint: format!("https://s3.{region}.amazonaws.com"),
            ..Self::default()
        }
    }

    /// Whether bucket creation needs an explicit location constraint.
    #[must_use]
    pub fn needs_location_constraint(&self) -> bool {
        self.region != "us-east-1"
    }
}

pub(crate) fn token_from_env(var: &'static str) -> CloudResult<String> {
    env::var(var).map_err(|_| CloudError::MissingCredentials(var))
}
