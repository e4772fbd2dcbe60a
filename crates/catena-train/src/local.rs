//! Local fine-tuning backend.
//!
//! `LocalLoraTrainer` runs one fixed-configuration training job entirely on
//! the local machine: the dataset is flattened to chat-markup text, a
//! character vocabulary acts as the tokenizer, the base next-character model
//! is frozen (uniform), and only a rank-`r` adapter (`A · B`, scaled by
//! `alpha/r`) is trained by mini-batch gradient descent over consecutive
//! character pairs. No checkpointing policy, no early stopping, no
//! validation loop; on completion the adapter, tokenizer, resolved config
//! and a manifest are serialized to the job's output directory.

use crate::artifacts::{make_artifact, sha256_file, ArtifactKind, TrainingManifest, TrainingMetrics};
use crate::dataset::{read_chat_jsonl, to_chatml};
use crate::error::{TrainError, TrainResult};
use crate::job::{LrSchedule, ResolvedPrecision, TrainingJobId, TrainingJobSpec};
use crate::layout::TrainingLayout;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::trainer::{Trainer, TrainerStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Local trainer producing a low-rank adapter checkpoint.
#[derive(Clone)]
pub struct LocalLoraTrainer {
    layout: TrainingLayout,
    statuses: Arc<Mutex<HashMap<String, TrainerStatus>>>,
}

impl LocalLoraTrainer {
    #[must_use]
    pub fn new(output_root: PathBuf) -> Self {
        Self {
            layout: TrainingLayout::new(output_root),
            statuses: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn set_status(&self, job_id: &TrainingJobId, status: TrainerStatus) {
        if let Ok(mut s) = self.statuses.lock() {
            s.insert(job_id.0.clone(), status);
        }
    }
}

/// Serialized adapter: the only trained parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterCheckpoint {
    pub rank: u32,
    pub alpha: u32,
    pub target_modules: Vec<String>,
    pub precision: ResolvedPrecision,
    pub vocab_size: usize,
    /// `vocab_size x rank`
    pub a: Vec<Vec<f32>>,
    /// `rank x vocab_size`
    pub b: Vec<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenizerFile {
    vocab: Vec<String>,
}

/// Splitmix-style deterministic generator; training must be reproducible
/// from the seed alone.
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(1))
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
        self.0
    }

    /// Uniform in [0, 1).
    fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }
}

struct Corpus {
    vocab: Vec<char>,
    /// Consecutive-character index pairs in dataset order.
    pairs: Vec<(usize, usize)>,
}

fn build_corpus(texts: &[String], max_seq_len: usize) -> TrainResult<Corpus> {
    let truncated: Vec<String> =
        texts.iter().map(|t| t.chars().take(max_seq_len).collect()).collect();

    let mut set = BTreeSet::new();
    for text in &truncated {
        for ch in text.chars() {
            set.insert(ch);
        }
    }
    let vocab: Vec<char> = set.into_iter().collect();
    if vocab.len() < 2 {
        return Err(TrainError::Dataset("dataset text is too small to train on".to_string()));
    }

    let index: HashMap<char, usize> = vocab.iter().enumerate().map(|(i, c)| (*c, i)).collect();

    let mut pairs = Vec::new();
    for text in &truncated {
        let mut prev: Option<usize> = None;
        for ch in text.chars() {
            let cur = index[&ch];
            if let Some(p) = prev {
                pairs.push((p, cur));
            }
            prev = Some(cur);
        }
    }

    if pairs.is_empty() {
        return Err(TrainError::Dataset("dataset text is too small to train on".to_string()));
    }

    Ok(Corpus { vocab, pairs })
}

struct TrainOutcome {
    adapter: AdapterCheckpoint,
    final_loss: f64,
}

/// One full training run over the corpus. The base model is frozen, so the
/// logits for pair `(i, j)` are just the adapter's contribution
/// `scale * A[i] · B[:, j]` on top of a uniform distribution.
fn train_adapter(job: &TrainingJobSpec, corpus: &Corpus, progress: &dyn ProgressSink) -> TrainOutcome {
    let hp = &job.hyperparams;
    let lora = &job.lora;
    let n = corpus.vocab.len();
    let r = lora.rank as usize;
    let scale = lora.scaling();
    let dropout = lora.dropout as f32;
    let examples_per_step = (hp.batch_size * hp.gradient_accumulation_steps) as usize;

    let mut rng = Rng::new(hp.seed);
    // LoRA convention: A random near zero, B zero, so the adapter starts as
    // the identity over the base model.
    let mut a: Vec<Vec<f32>> =
        (0..n).map(|_| (0..r).map(|_| (rng.next_f32() - 0.5) * 0.02).collect()).collect();
    let mut b: Vec<Vec<f32>> = vec![vec![0.0; n]; r];

    let mut cursor = 0usize;
    let mut final_loss = 0.0f64;

    for step in 1..=hp.max_steps {
        let lr = step_lr(hp.learning_rate, hp.schedule, step, hp.warmup_steps, hp.max_steps) as f32;

        let mut grad_a: HashMap<usize, Vec<f32>> = HashMap::new();
        let mut grad_b: Vec<Vec<f32>> = vec![vec![0.0; n]; r];
        let mut step_loss = 0.0f64;

        for _ in 0..examples_per_step {
            let (i, j) = corpus.pairs[cursor];
            cursor = (cursor + 1) % corpus.pairs.len();

            // Adapter activation with optional dropout on the rank dimension.
            let mut h: Vec<f32> = a[i].clone();
            if dropout > 0.0 {
                let keep = 1.0 - dropout;
                for v in &mut h {
                    if rng.next_f32() < dropout {
                        *v = 0.0;
                    } else {
                        *v /= keep;
                    }
                }
            }

            let mut logits = vec![0.0f32; n];
            for (t, ht) in h.iter().enumerate() {
                if *ht == 0.0 {
                    continue;
                }
                for (k, l) in logits.iter_mut().enumerate() {
                    *l += scale * ht * b[t][k];
                }
            }

            // Stable softmax + NLL.
            let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let mut probs: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
            let sum: f32 = probs.iter().sum();
            for p in &mut probs {
                *p /= sum;
            }
            step_loss -= f64::from(probs[j].max(f32::MIN_POSITIVE)).ln();

            // d loss / d logits = p - onehot(j)
            probs[j] -= 1.0;
            let dlogits = probs;

            let ga = grad_a.entry(i).or_insert_with(|| vec![0.0; r]);
            for t in 0..r {
                let mut dh = 0.0f32;
                for (k, dl) in dlogits.iter().enumerate() {
                    grad_b[t][k] += scale * h[t] * dl;
                    dh += scale * dl * b[t][k];
                }
                ga[t] += dh;
            }
        }

        let inv_batch = 1.0 / examples_per_step as f32;
        let wd = hp.weight_decay as f32;
        for (i, ga) in grad_a {
            for t in 0..r {
                a[i][t] -= lr * (ga[t] * inv_batch + wd * a[i][t]);
            }
        }
        for t in 0..r {
            for k in 0..n {
                b[t][k] -= lr * (grad_b[t][k] * inv_batch + wd * b[t][k]);
            }
        }

        final_loss = step_loss / examples_per_step as f64;
        progress.on_event(ProgressEvent::Step {
            job_id: job.job_id.clone(),
            step: u64::from(step),
            total: Some(u64::from(hp.max_steps)),
            loss: Some(final_loss),
        });
    }

    let adapter = AdapterCheckpoint {
        rank: lora.rank,
        alpha: lora.alpha,
        target_modules: lora.target_modules.clone(),
        precision: job.precision.resolve(),
        vocab_size: n,
        a,
        b,
    };

    TrainOutcome { adapter, final_loss }
}

/// Linear warmup, then (for the linear schedule) linear decay to zero.
fn step_lr(base: f64, schedule: LrSchedule, step: u32, warmup: u32, max_steps: u32) -> f64 {
    if warmup > 0 && step <= warmup {
        return base * f64::from(step) / f64::from(warmup);
    }
    match schedule {
        LrSchedule::Constant => base,
        LrSchedule::Linear => {
            let remaining = f64::from(max_steps - step);
            let span = f64::from(max_steps - warmup);
            base * (remaining / span).max(0.0)
        }
    }
}

fn write_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> TrainResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[async_trait]
impl Trainer for LocalLoraTrainer {
    fn id(&self) -> &'static str {
        "local-lora"
    }

    async fn prepare(&self, job: &TrainingJobSpec) -> TrainResult<()> {
        job.validate()?;
        if !job.dataset.exists() {
            return Err(TrainError::Dataset(format!(
                "dataset file does not exist: {}",
                job.dataset.display()
            )));
        }
        self.layout.ensure_job_dir(&job.job_id)?;
        Ok(())
    }

    async fn run(&self, job: &TrainingJobSpec, progress: &dyn ProgressSink) -> TrainResult<TrainingManifest> {
        job.validate()?;

        let job_id = job.job_id.clone();
        progress.on_event(ProgressEvent::Started { job_id: job_id.clone() });
        self.set_status(&job_id, TrainerStatus::Preparing);

        self.layout.ensure_job_dir(&job_id)?;

        progress.on_event(ProgressEvent::Message {
            job_id: job_id.clone(),
            message: format!("loading dataset from {}", job.dataset.display()),
        });

        let records = read_chat_jsonl(&job.dataset)?;
        let texts: Vec<String> = records.iter().map(to_chatml).collect();
        let corpus = build_corpus(&texts, job.hyperparams.max_seq_len as usize)?;

        tracing::debug!(
            examples = records.len(),
            vocab = corpus.vocab.len(),
            pairs = corpus.pairs.len(),
            "corpus prepared"
        );

        self.set_status(&job_id, TrainerStatus::Running);
        progress.on_event(ProgressEvent::Message {
            job_id: job_id.clone(),
            message: format!(
                "training rank-{} adapter for {} steps",
                job.lora.rank, job.hyperparams.max_steps
            ),
        });

        let outcome = train_adapter(job, &corpus, progress);

        progress.on_event(ProgressEvent::Message {
            job_id: job_id.clone(),
            message: "saving model".to_string(),
        });

        let tokenizer =
            TokenizerFile { vocab: corpus.vocab.iter().map(|c| c.to_string()).collect() };
        let adapter_path = self.layout.adapter_path(&job_id);
        let tokenizer_path = self.layout.tokenizer_path(&job_id);
        let config_path = self.layout.config_path(&job_id);
        write_json(&adapter_path, &outcome.adapter)?;
        write_json(&tokenizer_path, &tokenizer)?;
        write_json(&config_path, job)?;

        let artifacts = vec![
            make_artifact(ArtifactKind::Adapter, adapter_path)?,
            make_artifact(ArtifactKind::Tokenizer, tokenizer_path)?,
            make_artifact(ArtifactKind::Config, config_path)?,
        ];

        let manifest = TrainingManifest {
            job_id: job_id.clone(),
            created_at: chrono::Utc::now(),
            base_model: job.base_model.clone(),
            lora: job.lora.clone(),
            dataset_sha256: sha256_file(&job.dataset)?,
            metrics: TrainingMetrics {
                train_loss: Some(outcome.final_loss),
                steps: Some(u64::from(job.hyperparams.max_steps)),
            },
            artifacts,
        };
        write_json(self.layout.manifest_path(&job_id), &manifest)?;

        self.set_status(&job_id, TrainerStatus::Finished);
        progress.on_event(ProgressEvent::Finished { job_id });
        Ok(manifest)
    }

    async fn status(&self, job_id: &TrainingJobId) -> TrainResult<TrainerStatus> {
        Ok(self
            .statuses
            .lock()
            .ok()
            .and_then(|s| s.get(&job_id.0).cloned())
            .unwrap_or(TrainerStatus::Idle))
    }

    async fn cancel(&self, job_id: &TrainingJobId) -> TrainResult<()> {
        self.set_status(job_id, TrainerStatus::Cancelled);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::ModelSpec;
    use crate::progress::StdoutProgressSink;
    use tempfile::TempDir;

    fn write_dataset(dir: &Path) -> PathBuf {
        let path = dir.join("data.jsonl");
        let mut body = String::new();
        for i in 0..8 {
            body.push_str(
                &serde_json::json!({
                    "system": "s",
                    "messages": [
                        {"role": "user", "content": format!("question number {i} about grace")},
                        {"role": "assistant", "content": format!("answer number {i} with some text")}
                    ]
                })
                .to_string(),
            );
            body.push('\n');
        }
        std::fs::write(&path, body).unwrap();
        path
    }

    fn small_job(dataset: PathBuf) -> TrainingJobSpec {
        let mut job = TrainingJobSpec::new(
            ModelSpec { engine: "local".to_string(), model_id: "llama-3-8b-4bit".to_string() },
            dataset,
        );
        job.hyperparams.max_steps = 12;
        job.hyperparams.warmup_steps = 2;
        job
    }

    #[tokio::test]
    async fn test_run_writes_adapter_tokenizer_and_manifest() {
        let temp = TempDir::new().unwrap();
        let dataset = write_dataset(temp.path());
        let trainer = LocalLoraTrainer::new(temp.path().join("outputs"));

        let job = small_job(dataset);
        trainer.prepare(&job).await.unwrap();
        let manifest = trainer.run(&job, &StdoutProgressSink).await.unwrap();

        let layout = TrainingLayout::new(temp.path().join("outputs"));
        assert!(layout.adapter_path(&job.job_id).exists());
        assert!(layout.tokenizer_path(&job.job_id).exists());
        assert!(layout.manifest_path(&job.job_id).exists());
        assert_eq!(manifest.artifacts.len(), 3);
        assert_eq!(manifest.metrics.steps, Some(12));
        assert!(manifest.metrics.train_loss.unwrap().is_finite());
        assert_eq!(trainer.status(&job.job_id).await.unwrap(), TrainerStatus::Finished);
    }

    #[tokio::test]
    async fn test_training_reduces_loss_against_uniform() {
        let temp = TempDir::new().unwrap();
        let dataset = write_dataset(temp.path());
        let trainer = LocalLoraTrainer::new(temp.path().join("outputs"));

        let mut job = small_job(dataset);
        job.hyperparams.max_steps = 150;
        job.hyperparams.learning_rate = 0.1;

        let manifest = trainer.run(&job, &StdoutProgressSink).await.unwrap();

        // Reload the vocabulary to know the uniform baseline.
        let layout = TrainingLayout::new(temp.path().join("outputs"));
        let tokenizer: TokenizerFile = serde_json::from_str(
            &std::fs::read_to_string(layout.tokenizer_path(&job.job_id)).unwrap(),
        )
        .unwrap();
        let uniform = (tokenizer.vocab.len() as f64).ln();

        assert!(manifest.metrics.train_loss.unwrap() < uniform);
    }

    #[tokio::test]
    async fn test_training_is_deterministic_for_a_seed() {
        let temp = TempDir::new().unwrap();
        let dataset = write_dataset(temp.path());

        let run = |root: PathBuf, dataset: PathBuf| async move {
            let trainer = LocalLoraTrainer::new(root);
            let mut job = small_job(dataset);
            job.job_id = TrainingJobId("fixed".to_string());
            trainer.run(&job, &NullSink).await.unwrap()
        };

        let first = run(temp.path().join("out1"), dataset.clone()).await;
        let second = run(temp.path().join("out2"), dataset).await;
        assert_eq!(first.metrics.train_loss, second.metrics.train_loss);
    }

    #[tokio::test]
    async fn test_prepare_rejects_missing_dataset() {
        let temp = TempDir::new().unwrap();
        let trainer = LocalLoraTrainer::new(temp.path().join("outputs"));
        let job = small_job(temp.path().join("missing.jsonl"));
        assert!(matches!(trainer.prepare(&job).await, Err(TrainError::Dataset(_))));
    }

    #[tokio::test]
    async fn test_status_starts_idle_and_cancel_records() {
        let temp = TempDir::new().unwrap();
        let trainer = LocalLoraTrainer::new(temp.path().join("outputs"));
        let id = TrainingJobId("job-x".to_string());

        assert_eq!(trainer.status(&id).await.unwrap(), TrainerStatus::Idle);
        trainer.cancel(&id).await.unwrap();
        assert_eq!(trainer.status(&id).await.unwrap(), TrainerStatus::Cancelled);
    }

    struct NullSink;
    impl ProgressSink for NullSink {
        fn on_event(&self, _event: ProgressEvent) {}
    }
}
