//! Structural validation of JSONL training files.
//!
//! Each line is an independent JSON document of the shape
//! `{"system": "...", "messages": [{role, content}, {role, content}]}`.
//! Errors fail validation; warnings are reported but the line still counts
//! as valid. Validation is a pure function of file content.

use crate::error::{DataError, DataResult};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Structure tags expected inside every assistant answer.
pub const REQUIRED_TAGS: [&str; 4] = ["<answer>", "<summary>", "<explanation>", "<citations>"];

/// Literal prefix of a citation marker inside an answer.
pub const CITATION_MARKER: &str = "[Source:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// One classified issue on one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    EmptyLine,
    JsonSyntax { message: String },
    MissingSystem,
    MissingMessages,
    MessagesNotArray,
    MessageCount { found: usize },
    MessageMissing { index: usize },
    FirstRoleNotUser,
    SecondRoleNotAssistant,
    NoCitations,
    MissingTags { tags: Vec<String> },
}

impl Finding {
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::JsonSyntax { .. }
            | Self::MissingSystem
            | Self::MissingMessages
            | Self::MessagesNotArray
            | Self::MessageMissing { .. }
            | Self::FirstRoleNotUser
            | Self::SecondRoleNotAssistant => Severity::Error,
            Self::EmptyLine
            | Self::MessageCount { .. }
            | Self::NoCitations
            | Self::MissingTags { .. } => Severity::Warning,
        }
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyLine => write!(f, "empty line (skipping)"),
            Self::JsonSyntax { message } => write!(f, "JSON syntax error: {message}"),
            Self::MissingSystem => write!(f, "missing 'system' field"),
            Self::MissingMessages => write!(f, "missing 'messages' field"),
            Self::MessagesNotArray => write!(f, "'messages' must be an array"),
            Self::MessageCount { found } => {
                write!(f, "expected 2 messages (user + assistant), found {found}")
            }
            Self::MessageMissing { index } => write!(f, "message at index {index} is missing"),
            Self::FirstRoleNotUser => write!(f, "first message must have role='user'"),
            Self::SecondRoleNotAssistant => write!(f, "second message must have role='assistant'"),
            Self::NoCitations => write!(f, "no citations found in answer"),
            Self::MissingTags { tags } => {
                write!(f, "missing structure tags: {}", tags.join(", "))
            }
        }
    }
}

/// Findings for a single 1-based line.
#[derive(Debug, Clone, Serialize)]
pub struct LineReport {
    pub line: usize,
    pub valid: bool,
    pub findings: Vec<Finding>,
}

/// Aggregate validation outcome for one file.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub path: PathBuf,
    pub lines: Vec<LineReport>,
    pub valid_count: u64,
    pub warning_count: u64,
    pub error_count: u64,
    pub total_lines: u64,
}

impl ValidationReport {
    /// Exit-code contract: valid exactly when no line produced an error.
    /// Warnings alone never fail validation.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.error_count == 0
    }
}

/// Validate a JSONL training file.
///
/// An unreadable or empty file is a hard failure. Every other problem is
/// classified per line and accumulated; no line-level failure aborts the scan.
pub fn validate_file(path: &Path) -> DataResult<ValidationReport> {
    let contents = std::fs::read_to_string(path)?;
    if contents.is_empty() {
        return Err(DataError::EmptyFile(path.to_path_buf()));
    }

    let mut report = ValidationReport {
        path: path.to_path_buf(),
        lines: Vec::new(),
        valid_count: 0,
        warning_count: 0,
        error_count: 0,
        total_lines: 0,
    };

    for (idx, raw) in contents.lines().enumerate() {
        report.total_lines += 1;
        let (valid, findings) = check_line(raw.trim());

        for finding in &findings {
            match finding.severity() {
                Severity::Warning => report.warning_count += 1,
                Severity::Error => report.error_count += 1,
            }
        }
        if valid {
            report.valid_count += 1;
        }

        report.lines.push(LineReport { line: idx + 1, valid, findings });
    }

    tracing::debug!(
        path = %path.display(),
        valid = report.valid_count,
        warnings = report.warning_count,
        errors = report.error_count,
        "validated training file"
    );

    Ok(report)
}

/// Classify a single (already trimmed) line.
///
/// Each line produces at most one error; once an error is recorded the
/// remaining checks on that line are skipped. Warnings accumulate.
fn check_line(line: &str) -> (bool, Vec<Finding>) {
    let mut findings = Vec::new();

    if line.is_empty() {
        return (false, vec![Finding::EmptyLine]);
    }

    let data: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            return (false, vec![Finding::JsonSyntax { message: e.to_string() }]);
        }
    };

    if data.get("system").is_none() {
        return (false, vec![Finding::MissingSystem]);
    }

    let Some(messages) = data.get("messages") else {
        return (false, vec![Finding::MissingMessages]);
    };

    let Some(messages) = messages.as_array() else {
        return (false, vec![Finding::MessagesNotArray]);
    };

    if messages.len() != 2 {
        findings.push(Finding::MessageCount { found: messages.len() });
    }

    let Some(user_msg) = messages.first() else {
        findings.push(Finding::MessageMissing { index: 0 });
        return (false, findings);
    };
    if user_msg.get("role").and_then(Value::as_str) != Some("user") {
        findings.push(Finding::FirstRoleNotUser);
        return (false, findings);
    }

    let Some(asst_msg) = messages.get(1) else {
        findings.push(Finding::MessageMissing { index: 1 });
        return (false, findings);
    };
    if asst_msg.get("role").and_then(Value::as_str) != Some("assistant") {
        findings.push(Finding::SecondRoleNotAssistant);
        return (false, findings);
    }

    let answer = asst_msg.get("content").and_then(Value::as_str).unwrap_or("");

    if !answer.contains(CITATION_MARKER) {
        findings.push(Finding::NoCitations);
    }

    let missing: Vec<String> = REQUIRED_TAGS
        .iter()
        .filter(|tag| !answer.contains(*tag))
        .map(|tag| (*tag).to_string())
        .collect();
    if !missing.is_empty() {
        findings.push(Finding::MissingTags { tags: missing });
    }

    (true, findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn good_line() -> String {
        serde_json::json!({
            "system": "You are a careful assistant.",
            "messages": [
                {"role": "user", "content": "What is grace?"},
                {"role": "assistant", "content": "<answer><summary>s</summary><explanation>e [Source: CCC, 1996]</explanation><citations>c</citations></answer>"}
            ]
        })
        .to_string()
    }

    fn write_file(lines: &[String]) -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.jsonl");
        std::fs::write(&path, lines.join("\n") + "\n").unwrap();
        (temp, path)
    }

    #[test]
    fn test_well_formed_line_has_no_findings() {
        let (_temp, path) = write_file(&[good_line()]);
        let report = validate_file(&path).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.valid_count, 1);
        assert_eq!(report.warning_count, 0);
        assert_eq!(report.error_count, 0);
        assert!(report.lines[0].findings.is_empty());
    }

    #[test]
    fn test_empty_file_is_hard_failure() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.jsonl");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(validate_file(&path), Err(DataError::EmptyFile(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            validate_file(Path::new("/nonexistent/data.jsonl")),
            Err(DataError::Io(_))
        ));
    }

    #[test]
    fn test_json_syntax_error_counts_once() {
        let (_temp, path) = write_file(&["{not json".to_string(), good_line()]);
        let report = validate_file(&path).unwrap();
        assert_eq!(report.error_count, 1);
        assert_eq!(report.valid_count, 1);
        assert!(!report.is_valid());
        assert!(!report.lines[0].valid);
    }

    #[test]
    fn test_missing_fields_are_errors() {
        let (_temp, path) = write_file(&[
            r#"{"messages": []}"#.to_string(),
            r#"{"system": "s"}"#.to_string(),
            r#"{"system": "s", "messages": "nope"}"#.to_string(),
        ]);
        let report = validate_file(&path).unwrap();
        assert_eq!(report.error_count, 3);
        assert_eq!(report.valid_count, 0);
        assert_eq!(report.lines[0].findings, vec![Finding::MissingSystem]);
        assert_eq!(report.lines[1].findings, vec![Finding::MissingMessages]);
        assert_eq!(report.lines[2].findings, vec![Finding::MessagesNotArray]);
    }

    #[test]
    fn test_wrong_second_role_fails_overall_validation() {
        let bad = serde_json::json!({
            "system": "s",
            "messages": [
                {"role": "user", "content": "q"},
                {"role": "user", "content": "a"}
            ]
        })
        .to_string();
        let (_temp, path) = write_file(&[good_line(), bad, good_line()]);
        let report = validate_file(&path).unwrap();
        assert_eq!(report.error_count, 1);
        assert_eq!(report.valid_count, 2);
        assert!(!report.is_valid());
        assert!(report.lines[1].findings.contains(&Finding::SecondRoleNotAssistant));
    }

    #[test]
    fn test_single_message_warns_then_errors() {
        let one = serde_json::json!({
            "system": "s",
            "messages": [{"role": "user", "content": "q"}]
        })
        .to_string();
        let (_temp, path) = write_file(&[one]);
        let report = validate_file(&path).unwrap();
        assert_eq!(report.warning_count, 1);
        assert_eq!(report.error_count, 1);
        assert_eq!(report.valid_count, 0);
        assert_eq!(
            report.lines[0].findings,
            vec![Finding::MessageCount { found: 1 }, Finding::MessageMissing { index: 1 }]
        );
    }

    #[test]
    fn test_extra_messages_warn_but_line_stays_valid() {
        let three = serde_json::json!({
            "system": "s",
            "messages": [
                {"role": "user", "content": "q"},
                {"role": "assistant", "content": "<answer><summary></summary><explanation>[Source: CCC, 1]</explanation><citations></citations></answer>"},
                {"role": "user", "content": "extra"}
            ]
        })
        .to_string();
        let (_temp, path) = write_file(&[three]);
        let report = validate_file(&path).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.valid_count, 1);
        assert_eq!(report.warning_count, 1);
    }

    #[test]
    fn test_missing_citations_and_tags_are_warnings_only() {
        let plain = serde_json::json!({
            "system": "s",
            "messages": [
                {"role": "user", "content": "q"},
                {"role": "assistant", "content": "just an answer"}
            ]
        })
        .to_string();
        let (_temp, path) = write_file(&[plain]);
        let report = validate_file(&path).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.valid_count, 1);
        // One warning for citations, one listing all four missing tags.
        assert_eq!(report.warning_count, 2);
        assert!(matches!(
            &report.lines[0].findings[1],
            Finding::MissingTags { tags } if tags.len() == 4
        ));
    }

    #[test]
    fn test_blank_line_is_warning() {
        let (_temp, path) = write_file(&[good_line(), String::new(), good_line()]);
        let report = validate_file(&path).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.total_lines, 3);
        assert_eq!(report.valid_count, 2);
        assert_eq!(report.warning_count, 1);
    }

    #[test]
    fn test_validation_is_deterministic() {
        let (_temp, path) = write_file(&[good_line(), "{broken".to_string(), String::new()]);
        let first = validate_file(&path).unwrap();
        let second = validate_file(&path).unwrap();
        assert_eq!(first.valid_count, second.valid_count);
        assert_eq!(first.warning_count, second.warning_count);
        assert_eq!(first.error_count, second.error_count);
        assert_eq!(first.total_lines, second.total_lines);
    }
}
