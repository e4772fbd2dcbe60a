use crate::error::TrainResult;
use crate::job::TrainingJobId;
use std::path::{Path, PathBuf};

/// Filesystem layout for local training outputs.
///
/// Default layout is `outputs/<job_id>/{adapter_model.json, tokenizer.json,
/// training_config.json, training_manifest.json}`.
#[derive(Debug, Clone)]
pub struct TrainingLayout {
    root: PathBuf,
}

impl TrainingLayout {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn default_root() -> Self {
        Self::new(PathBuf::from("outputs"))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn job_dir(&self, job_id: &TrainingJobId) -> PathBuf {
        self.root.join(job_id.0.as_str())
    }

    #[must_use]
    pub fn adapter_path(&self, job_id: &TrainingJobId) -> PathBuf {
        self.job_dir(job_id).join("adapter_model.json")
    }

    #[must_use]
    pub fn tokenizer_path(&self, job_id: &TrainingJobId) -> PathBuf {
        self.job_dir(job_id).join("tokenizer.json")
    }

    #[must_use]
    pub fn config_path(&self, job_id: &TrainingJobId) -> PathBuf {
        self.job_dir(job_id).join("training_config.json")
    }

    #[must_use]
    pub fn manifest_path(&self, job_id: &TrainingJobId) -> PathBuf {
        self.job_dir(job_id).join("training_manifest.json")
    }

    pub fn ensure_job_dir(&self, job_id: &TrainingJobId) -> TrainResult<()> {
        std::fs::create_dir_all(self.job_dir(job_id))?;
        Ok(())
    }
}
