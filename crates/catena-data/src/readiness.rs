//! Go/no-go scoring for a directory of JSONL training files.
//!
//! Counts non-blank lines across every `*.jsonl` file (skipping backup
//! copies), compares the total against three fixed thresholds, and carries
//! enough numbers for a rough cost estimate. A file that cannot be read is
//! recorded as an error and contributes nothing; the scan continues.

use crate::error::{DataError, DataResult};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Tunables for the readiness scan. Formerly hard-coded constants; kept as
/// named fields so callers can override without editing source.
#[derive(Debug, Clone)]
pub struct ReadinessConfig {
    /// Directory scanned for `*.jsonl` files.
    pub data_dir: PathBuf,
    /// Files whose name ends with this suffix are excluded from the scan.
    pub backup_suffix: String,
    /// Minimum examples for basic fine-tuning.
    pub min_examples: u64,
    /// Recommended examples for good results.
    pub recommended_examples: u64,
    /// Optimal examples for excellent results.
    pub optimal_examples: u64,
    /// Conservative per-example token estimate.
    pub tokens_per_example: u64,
    /// Training price per 1K tokens, in dollars.
    pub price_per_1k_tokens: f64,
    /// Number of hyperparameter runs budgeted for.
    pub tuning_runs: u32,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("training_data/collected_data"),
            backup_suffix: "_backup.jsonl".to_string(),
            min_examples: 100,
            recommended_examples: 300,
            optimal_examples: 500,
            tokens_per_example: 500,
            price_per_1k_tokens: 0.008,
            tuning_runs: 5,
        }
    }
}

impl ReadinessConfig {
    #[must_use]
    pub fn for_dir(data_dir: PathBuf) -> Self {
        Self { data_dir, ..Self::default() }
    }
}

/// Example count for one successfully read file.
#[derive(Debug, Clone, Serialize)]
pub struct FileCount {
    pub name: String,
    pub examples: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessBand {
    /// Below the minimum; do not fine-tune yet.
    Insufficient,
    /// Fine-tuning possible but results may be limited.
    Minimal,
    /// Good data volume; ready to proceed.
    Ready,
}

/// Outcome of a readiness scan.
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessReport {
    pub files: Vec<FileCount>,
    /// Files that failed to open or read, with the reported error.
    pub read_errors: Vec<(String, String)>,
    pub valid_files: u64,
    pub total_examples: u64,
    #[serde(skip)]
    pub config: ReadinessConfig,
}

impl ReadinessReport {
    /// Go/no-go: total examples meet the minimum threshold.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.total_examples >= self.config.min_examples
    }

    #[must_use]
    pub fn band(&self) -> ReadinessBand {
        if self.total_examples < self.config.min_examples {
            ReadinessBand::Insufficient
        } else if self.total_examples < self.config.recommended_examples {
            ReadinessBand::Minimal
        } else {
            ReadinessBand::Ready
        }
    }

    /// The three threshold checks, as (description, threshold, passed).
    #[must_use]
    pub fn threshold_checks(&self) -> Vec<(&'static str, u64, bool)> {
        let c = &self.config;
        vec![
            ("Minimum examples for basic fine-tuning", c.min_examples, self.total_examples >= c.min_examples),
            ("Recommended examples for good results", c.recommended_examples, self.total_examples >= c.recommended_examples),
            ("Optimal examples for excellent results", c.optimal_examples, self.total_examples >= c.optimal_examples),
        ]
    }

    #[must_use]
    pub fn estimated_tokens(&self) -> u64 {
        self.total_examples * self.config.tokens_per_example
    }

    /// Single-run training cost in dollars.
    #[must_use]
    pub fn estimated_cost(&self) -> f64 {
        self.estimated_tokens() as f64 / 1000.0 * self.config.price_per_1k_tokens
    }

    /// Cost across all budgeted hyperparameter runs.
    #[must_use]
    pub fn estimated_cost_all_runs(&self) -> f64 {
        self.estimated_cost() * f64::from(self.config.tuning_runs)
    }
}

/// Scan the configured directory and score its training data.
pub fn check_readiness(config: &ReadinessConfig) -> DataResult<ReadinessReport> {
    if !config.data_dir.is_dir() {
        return Err(DataError::MissingDirectory(config.data_dir.clone()));
    }

    let pattern = config.data_dir.join("*.jsonl");
    let entries = glob::glob(&pattern.to_string_lossy())?;

    let mut report = ReadinessReport {
        files: Vec::new(),
        read_errors: Vec::new(),
        valid_files: 0,
        total_examples: 0,
        config: config.clone(),
    };

    for entry in entries {
        let path = match entry {
            Ok(p) => p,
            Err(e) => {
                report.read_errors.push((e.path().display().to_string(), e.to_string()));
                continue;
            }
        };
        let name = file_name(&path);
        if name.ends_with(&config.backup_suffix) {
            continue;
        }

        match count_examples(&path) {
            Ok(examples) => {
                report.total_examples += examples;
                report.valid_files += 1;
                report.files.push(FileCount { name, examples });
            }
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "failed to read training file");
                report.read_errors.push((name, e.to_string()));
            }
        }
    }

    Ok(report)
}

fn count_examples(path: &Path) -> std::io::Result<u64> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents.lines().filter(|line| !line.trim().is_empty()).count() as u64)
}

fn file_name(path: &Path) -> String {
    path.file_name().map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_lines(dir: &Path, name: &str, count: usize) {
        let mut body = String::new();
        for i in 0..count {
            body.push_str(&format!("{{\"line\": {i}}}\n"));
        }
        std::fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn test_totals_and_thresholds() {
        let temp = TempDir::new().unwrap();
        write_lines(temp.path(), "batch_01.jsonl", 60);
        write_lines(temp.path(), "batch_02.jsonl", 45);

        let config = ReadinessConfig::for_dir(temp.path().to_path_buf());
        let report = check_readiness(&config).unwrap();

        assert_eq!(report.total_examples, 105);
        assert_eq!(report.valid_files, 2);
        assert!(report.is_ready());

        let checks = report.threshold_checks();
        assert!(checks[0].2);
        assert!(!checks[1].2);
        assert!(!checks[2].2);
        assert_eq!(report.band(), ReadinessBand::Minimal);
    }

    #[test]
    fn test_backup_files_are_excluded() {
        let temp = TempDir::new().unwrap();
        write_lines(temp.path(), "batch_01.jsonl", 10);
        write_lines(temp.path(), "batch_01_backup.jsonl", 400);

        let config = ReadinessConfig::for_dir(temp.path().to_path_buf());
        let report = check_readiness(&config).unwrap();

        assert_eq!(report.total_examples, 10);
        assert_eq!(report.valid_files, 1);
        assert_eq!(report.band(), ReadinessBand::Insufficient);
    }

    #[test]
    fn test_blank_lines_do_not_count() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.jsonl"), "{}\n\n  \n{}\n").unwrap();

        let config = ReadinessConfig::for_dir(temp.path().to_path_buf());
        let report = check_readiness(&config).unwrap();
        assert_eq!(report.total_examples, 2);
    }

    #[test]
    fn test_missing_directory_is_error() {
        let config = ReadinessConfig::for_dir(PathBuf::from("/nonexistent/dir"));
        assert!(matches!(check_readiness(&config), Err(DataError::MissingDirectory(_))));
    }

    #[test]
    fn test_cost_estimate() {
        let temp = TempDir::new().unwrap();
        write_lines(temp.path(), "a.jsonl", 100);

        let config = ReadinessConfig::for_dir(temp.path().to_path_buf());
        let report = check_readiness(&config).unwrap();

        assert_eq!(report.estimated_tokens(), 50_000);
        assert!((report.estimated_cost() - 0.4).abs() < 1e-9);
        assert!((report.estimated_cost_all_runs() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_ready_band_at_recommended() {
        let temp = TempDir::new().unwrap();
        write_lines(temp.path(), "a.jsonl", 300);

        let config = ReadinessConfig::for_dir(temp.path().to_path_buf());
        let report = check_readiness(&config).unwrap();
        assert_eq!(report.band(), ReadinessBand::Ready);
    }
}
