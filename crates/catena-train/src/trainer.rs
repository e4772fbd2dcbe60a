use crate::artifacts::TrainingManifest;
use crate::error::TrainResult;
use crate::job::{TrainingJobId, TrainingJobSpec};
use crate::progress::ProgressSink;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainerStatus {
    Idle,
    Preparing,
    Running,
    Finished,
    Failed(String),
    Cancelled,
}

/// A training backend. One implementation runs locally; a cloud backend
/// would submit a customization job instead.
#[async_trait]
pub trait Trainer: Send + Sync {
    fn id(&self) -> &'static str;

    async fn prepare(&self, job: &TrainingJobSpec) -> TrainResult<()>;

    async fn run(
        &self,
        job: &TrainingJobSpec,
        progress: &dyn ProgressSink,
    ) -> TrainResult<TrainingManifest>;

    async fn status(&self, job_id: &TrainingJobId) -> TrainResult<TrainerStatus>;

    async fn cancel(&self, job_id: &TrainingJobId) -> TrainResult<()>;
}
