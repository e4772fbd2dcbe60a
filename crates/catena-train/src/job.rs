use crate::error::{TrainError, TrainResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Identifier for a training job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrainingJobId(pub String);

impl TrainingJobId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for TrainingJobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TrainingJobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Backend-agnostic model reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Engine/provider identifier (e.g., "local", "aws-bedrock")
    pub engine: String,
    /// Model ID/name (engine-specific)
    pub model_id: String,
}

/// Low-rank adaptation settings: the trainer touches only the adapter
/// parameters, never the (frozen) base model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoraConfig {
    pub rank: u32,
    pub alpha: u32,
    pub dropout: f64,
    pub bias: LoraBias,
    pub target_modules: Vec<String>,
}

impl Default for LoraConfig {
    fn default() -> Self {
        Self {
            rank: 16,
            alpha: 16,
            dropout: 0.0,
            bias: LoraBias::None,
            target_modules: vec![
                "q_proj".to_string(),
                "k_proj".to_string(),
                "v_proj".to_string(),
                "o_proj".to_string(),
                "gate_proj".to_string(),
                "up_proj".to_string(),
                "down_proj".to_string(),
            ],
        }
    }
}

impl LoraConfig {
    pub fn validate(&self) -> TrainResult<()> {
        if self.rank == 0 {
            return Err(TrainError::InvalidSpec("lora rank must be >= 1".to_string()));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(TrainError::InvalidSpec("lora dropout must be in [0, 1)".to_string()));
        }
        Ok(())
    }

    /// The LoRA scaling factor alpha/r applied to the adapter output.
    #[must_use]
    pub fn scaling(&self) -> f32 {
        self.alpha as f32 / self.rank as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoraBias {
    None,
    All,
    LoraOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LrSchedule {
    Linear,
    Constant,
}

/// Numeric precision for the training loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    /// Pick bf16 when the CPU advertises it, fp16 otherwise.
    Auto,
    Fp16,
    Bf16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedPrecision {
    Fp16,
    Bf16,
}

impl Precision {
    /// Resolve `Auto` against hardware capabilities.
    #[must_use]
    pub fn resolve(self) -> ResolvedPrecision {
        match self {
            Self::Fp16 => ResolvedPrecision::Fp16,
            Self::Bf16 => ResolvedPrecision::Bf16,
            Self::Auto => {
                if bf16_supported() {
                    ResolvedPrecision::Bf16
                } else {
                    ResolvedPrecision::Fp16
                }
            }
        }
    }
}

#[cfg(target_arch = "x86_64")]
fn bf16_supported() -> bool {
    std::arch::is_x86_feature_detected!("avx512bf16")
}

#[cfg(target_arch = "aarch64")]
fn bf16_supported() -> bool {
    std::arch::is_aarch64_feature_detected!("bf16")
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn bf16_supported() -> bool {
    false
}

/// Fixed hyperparameter set for one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingHyperParams {
    pub batch_size: u32,
    pub gradient_accumulation_steps: u32,
    pub warmup_steps: u32,
    pub max_steps: u32,
    pub learning_rate: f64,
    pub weight_decay: f64,
    pub optimizer: String,
    pub schedule: LrSchedule,
    pub seed: u64,
    pub max_seq_len: u32,
}

impl Default for TrainingHyperParams {
    fn default() -> Self {
        Self {
            batch_size: 2,
            gradient_accumulation_steps: 4,
            warmup_steps: 5,
            max_steps: 100,
            learning_rate: 2e-4,
            weight_decay: 0.01,
            optimizer: "adamw_8bit".to_string(),
            schedule: LrSchedule::Linear,
            seed: 3407,
            max_seq_len: 2048,
        }
    }
}

impl TrainingHyperParams {
    pub fn validate(&self) -> TrainResult<()> {
        if self.batch_size == 0 {
            return Err(TrainError::InvalidSpec("batch_size must be >= 1".to_string()));
        }
        if self.gradient_accumulation_steps == 0 {
            return Err(TrainError::InvalidSpec(
                "gradient_accumulation_steps must be >= 1".to_string(),
            ));
        }
        if self.max_steps == 0 {
            return Err(TrainError::InvalidSpec("max_steps must be >= 1".to_string()));
        }
        if self.warmup_steps >= self.max_steps {
            return Err(TrainError::InvalidSpec("warmup_steps must be < max_steps".to_string()));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(TrainError::InvalidSpec("learning_rate must be > 0".to_string()));
        }
        if self.max_seq_len == 0 {
            return Err(TrainError::InvalidSpec("max_seq_len must be >= 1".to_string()));
        }
        Ok(())
    }
}

/// Complete description of one local fine-tuning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingJobSpec {
    pub job_id: TrainingJobId,
    pub created_at: DateTime<Utc>,
    pub base_model: ModelSpec,
    /// JSONL chat dataset, one record per line.
    pub dataset: PathBuf,
    pub lora: LoraConfig,
    pub hyperparams: TrainingHyperParams,
    pub precision: Precision,
}

impl TrainingJobSpec {
    #[must_use]
    pub fn new(base_model: ModelSpec, dataset: PathBuf) -> Self {
        Self {
            job_id: TrainingJobId::new(),
            created_at: Utc::now(),
            base_model,
            dataset,
            lora: LoraConfig::default(),
            hyperparams: TrainingHyperParams::default(),
            precision: Precision::Auto,
        }
    }

    pub fn validate(&self) -> TrainResult<()> {
        if self.base_model.engine.trim().is_empty() {
            return Err(TrainError::InvalidSpec("base_model.engine is required".to_string()));
        }
        if self.base_model.model_id.trim().is_empty() {
            return Err(TrainError::InvalidSpec("base_model.model_id is required".to_string()));
        }
        self.lora.validate()?;
        self.hyperparams.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_spec_validate_requires_base_model_fields() {
        let spec = TrainingJobSpec::new(
            ModelSpec { engine: "".to_string(), model_id: "".to_string() },
            PathBuf::from("data.jsonl"),
        );
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_default_hyperparams_are_valid() {
        assert!(TrainingHyperParams::default().validate().is_ok());
        assert!(LoraConfig::default().validate().is_ok());
    }

    #[test]
    fn test_warmup_must_stay_below_max_steps() {
        let params = TrainingHyperParams { warmup_steps: 100, max_steps: 100, ..Default::default() };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_lora_scaling() {
        let lora = LoraConfig { rank: 8, alpha: 16, ..Default::default() };
        assert!((lora.scaling() - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_precision_resolution_is_concrete() {
        // Whatever the host supports, Auto must land on a concrete choice.
        let resolved = Precision::Auto.resolve();
        assert!(matches!(resolved, ResolvedPrecision::Fp16 | ResolvedPrecision::Bf16));
        assert_eq!(Precision::Bf16.resolve(), ResolvedPrecision::Bf16);
    }
}
