//! Descriptive statistics over a validated JSONL training file.
//!
//! Counts citations per answer, average question/answer lengths, and the
//! most common citation sources. Runs as a second pass over the file and
//! assumes validation already succeeded; a JSON parse failure here aborts
//! the analysis. A file with zero examples reports all averages as zero
//! instead of failing on the division.

use crate::error::DataResult;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

static CITATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[Source: [^\]]+\]").expect("citation pattern is valid"));

/// Extract every citation marker of the form `[Source: ...]` from an answer.
#[must_use]
pub fn extract_citations(answer: &str) -> Vec<String> {
    CITATION_RE.find_iter(answer).map(|m| m.as_str().to_string()).collect()
}

/// Derive the source label used to bucket a citation.
///
/// Two literal parsing branches, kept exactly as historical runs computed
/// them (changing either branch changes reported statistics):
/// - with a comma, the text between `[Source:` and the first comma:
///   `[Source: CCC, 123]` -> `CCC`
/// - without a comma, drop everything from the first `]`, split on `:` and
///   take the second piece: `[Source: John 3:16]` -> `John 3`
#[must_use]
pub fn source_label(citation: &str) -> String {
    if citation.contains(',') {
        citation
            .split("[Source:")
            .nth(1)
            .unwrap_or("")
            .split(',')
            .next()
            .unwrap_or("")
            .trim()
            .to_string()
    } else {
        citation
            .split(']')
            .next()
            .unwrap_or("")
            .split(':')
            .nth(1)
            .unwrap_or("")
            .trim()
            .to_string()
    }
}

/// Aggregated statistics for one training file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileAnalysis {
    pub total_examples: u64,
    pub total_citations: u64,
    pub question_words: u64,
    pub answer_words: u64,
    /// Per-source citation counts in first-occurrence order.
    pub source_counts: Vec<(String, u64)>,
}

impl FileAnalysis {
    #[must_use]
    pub fn avg_citations(&self) -> f64 {
        if self.total_examples == 0 {
            return 0.0;
        }
        self.total_citations as f64 / self.total_examples as f64
    }

    #[must_use]
    pub fn avg_question_words(&self) -> f64 {
        if self.total_examples == 0 {
            return 0.0;
        }
        self.question_words as f64 / self.total_examples as f64
    }

    #[must_use]
    pub fn avg_answer_words(&self) -> f64 {
        if self.total_examples == 0 {
            return 0.0;
        }
        self.answer_words as f64 / self.total_examples as f64
    }

    /// Top sources by descending count. The sort is stable over a list built
    /// in file order, so ties keep the insertion order of first occurrence.
    #[must_use]
    pub fn top_sources(&self, n: usize) -> Vec<(&str, u64)> {
        let mut sources: Vec<(&str, u64)> =
            self.source_counts.iter().map(|(s, c)| (s.as_str(), *c)).collect();
        sources.sort_by(|a, b| b.1.cmp(&a.1));
        sources.truncate(n);
        sources
    }
}

/// Analyze a JSONL training file.
///
/// Records with fewer than two messages contribute nothing; everything else
/// is tallied from the first (question) and second (answer) message.
pub fn analyze_file(path: &Path) -> DataResult<FileAnalysis> {
    let contents = std::fs::read_to_string(path)?;

    let mut analysis = FileAnalysis::default();
    let mut index: HashMap<String, usize> = HashMap::new();

    for line in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
        analysis.total_examples += 1;

        let data: Value = serde_json::from_str(line)?;
        let messages = data.get("messages").and_then(Value::as_array);
        let Some(messages) = messages else { continue };
        if messages.len() < 2 {
            continue;
        }

        let question = messages[0].get("content").and_then(Value::as_str).unwrap_or("");
        analysis.question_words += question.split_whitespace().count() as u64;

        let answer = messages[1].get("content").and_then(Value::as_str).unwrap_or("");
        analysis.answer_words += answer.split_whitespace().count() as u64;

        for citation in extract_citations(answer) {
            analysis.total_citations += 1;
            let label = source_label(&citation);
            match index.get(&label) {
                Some(&i) => analysis.source_counts[i].1 += 1,
                None => {
                    index.insert(label.clone(), analysis.source_counts.len());
                    analysis.source_counts.push((label, 1));
                }
            }
        }
    }

    tracing::debug!(
        path = %path.display(),
        examples = analysis.total_examples,
        citations = analysis.total_citations,
        "analyzed training file"
    );

    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extract_citations() {
        let answer = "See [Source: CCC, 123] and also [Source: John 3:16], nothing else.";
        let citations = extract_citations(answer);
        assert_eq!(citations, vec!["[Source: CCC, 123]", "[Source: John 3:16]"]);
    }

    #[test]
    fn test_source_label_comma_branch() {
        assert_eq!(source_label("[Source: CCC, 123]"), "CCC");
        assert_eq!(source_label("[Source: Lumen Gentium, 16]"), "Lumen Gentium");
    }

    #[test]
    fn test_source_label_comma_absent_branch() {
        // Documented historical behavior: the colon split keeps the piece
        // between the first and second colon, so verse references lose their
        // verse number.
        assert_eq!(source_label("[Source: John 3:16]"), "John 3");
        assert_eq!(source_label("[Source: Catechism]"), "Catechism");
    }

    fn record(question: &str, answer: &str) -> String {
        serde_json::json!({
            "system": "s",
            "messages": [
                {"role": "user", "content": question},
                {"role": "assistant", "content": answer}
            ]
        })
        .to_string()
    }

    #[test]
    fn test_analyze_counts_and_averages() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.jsonl");
        std::fs::write(
            &path,
            [
                record("what is one", "short answer [Source: CCC, 1]"),
                record("two words", "a longer answer here [Source: CCC, 2] [Source: John 3:16]"),
                String::new(),
            ]
            .join("\n"),
        )
        .unwrap();

        let analysis = analyze_file(&path).unwrap();
        assert_eq!(analysis.total_examples, 2);
        assert_eq!(analysis.total_citations, 3);
        assert!((analysis.avg_citations() - 1.5).abs() < f64::EPSILON);
        assert_eq!(analysis.question_words, 5);
        assert_eq!(
            analysis.source_counts,
            vec![("CCC".to_string(), 2), ("John 3".to_string(), 1)]
        );
    }

    #[test]
    fn test_top_sources_ties_keep_insertion_order() {
        let analysis = FileAnalysis {
            source_counts: vec![
                ("B".to_string(), 1),
                ("A".to_string(), 3),
                ("C".to_string(), 1),
            ],
            ..Default::default()
        };
        assert_eq!(analysis.top_sources(10), vec![("A", 3), ("B", 1), ("C", 1)]);
        assert_eq!(analysis.top_sources(2), vec![("A", 3), ("B", 1)]);
    }

    #[test]
    fn test_blank_only_file_reports_zero_averages() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.jsonl");
        std::fs::write(&path, "\n  \n\n").unwrap();

        let analysis = analyze_file(&path).unwrap();
        assert_eq!(analysis.total_examples, 0);
        assert_eq!(analysis.avg_citations(), 0.0);
        assert_eq!(analysis.avg_question_words(), 0.0);
        assert_eq!(analysis.avg_answer_words(), 0.0);
    }

    #[test]
    fn test_short_records_are_skipped() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.jsonl");
        let one = serde_json::json!({"system": "s", "messages": [{"role": "user", "content": "q"}]});
        std::fs::write(&path, one.to_string()).unwrap();

        let analysis = analyze_file(&path).unwrap();
        assert_eq!(analysis.total_examples, 1);
        assert_eq!(analysis.total_citations, 0);
        assert_eq!(analysis.question_words, 0);
    }
}
