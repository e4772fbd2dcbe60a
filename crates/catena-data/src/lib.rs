//! Catena Data
//!
//! Training-data primitives for the fine-tuning workflow:
//! - Structural validation of JSONL chat datasets (`validate_file`)
//! - Descriptive statistics over validated datasets (`analyze_file`)
//! - Go/no-go readiness scoring across a dataset directory (`check_readiness`)

pub mod analyze;
pub mod error;
pub mod readiness;
pub mod validate;

pub use analyze::{analyze_file, extract_citations, source_label, FileAnalysis};
pub use error::{DataError, DataResult};
pub use readiness::{check_readiness, FileCount, ReadinessBand, ReadinessConfig, ReadinessReport};
pub use validate::{validate_file, Finding, LineReport, Severity, ValidationReport, REQUIRED_TAGS};
