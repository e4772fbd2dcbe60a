//! Catena Train
//!
//! Local fine-tuning primitives:
//! - Defining training jobs (`TrainingJobSpec`, `LoraConfig`)
//! - Reading chat datasets and flattening them to chat-markup text
//! - Writing training artifacts + manifests
//! - Implementing training backends (`Trainer`, `LocalLoraTrainer`)

pub mod artifacts;
pub mod dataset;
pub mod error;
pub mod job;
pub mod layout;
pub mod local;
pub mod progress;
pub mod trainer;

pub use artifacts::{make_artifact, ArtifactKind, TrainingArtifact, TrainingManifest, TrainingMetrics};
pub use dataset::{read_chat_jsonl, to_chatml, ChatMessage, ChatRecord};
pub use error::{TrainError, TrainResult};
pub use job::{
    LoraBias, LoraConfig, LrSchedule, ModelSpec, Precision, ResolvedPrecision,
    TrainingHyperParams, TrainingJobId, TrainingJobSpec,
};
pub use layout::TrainingLayout;
pub use local::LocalLoraTrainer;
pub use progress::{ProgressEvent, ProgressSink, StdoutProgressSink};
pub use trainer::{Trainer, TrainerStatus};
