//! Catena Cloud
//!
//! Thin async clients over the remote services the fine-tuning workflow
//! touches:
//! - Object storage for training data (`StorageClient`)
//! - The model-customization API (`CustomizationClient`)
//! - The model hub for publishing artifacts (`HubClient`)
//!
//! Every operation is a single call returning a typed `CloudError`; callers
//! decide whether a failure is worth retrying. No client retries, backs off,
//! or rolls back on its own.

pub mod config;
pub mod customization;
pub mod error;
pub mod hub;
pub mod storage;

pub use config::CloudConfig;
pub use customization::{
    CustomizationClient, CustomizationHyperParams, CustomizationJobRequest, JobState, JobStatus,
    ModelSummary,
};
pub use error::{CloudError, CloudResult};
pub use hub::HubClient;
pub use storage::StorageClient;
