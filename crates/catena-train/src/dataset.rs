//! Chat dataset loading and flattening.
//!
//! Training data is the same JSONL shape the validator checks: a `system`
//! prompt plus an ordered `[user, assistant]` message pair per line. For
//! training, each record is flattened into a single turn-delimited text
//! field using the fixed chat-markup template.

use crate::error::{TrainError, TrainResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// One training record as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRecord {
    #[serde(default)]
    pub system: Option<String>,
    pub messages: Vec<ChatMessage>,
}

/// Read a JSONL chat dataset, skipping blank lines.
pub fn read_chat_jsonl(path: &Path) -> TrainResult<Vec<ChatRecord>> {
    let contents = std::fs::read_to_string(path)?;
    let mut records = Vec::new();

    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: ChatRecord = serde_json::from_str(line).map_err(|e| {
            TrainError::Dataset(format!("failed to parse jsonl line {}: {}", idx + 1, e))
        })?;
        records.push(record);
    }

    if records.is_empty() {
        return Err(TrainError::Dataset(format!("dataset is empty: {}", path.display())));
    }

    Ok(records)
}

/// Flatten one record into chat-markup text.
///
/// Template, per message: `<|im_start|>{role}\n{content}<|im_end|>\n`.
/// The `system` field is not included; only the message turns are emitted
/// (preserved from the original formatter).
#[must_use]
pub fn to_chatml(record: &ChatRecord) -> String {
    let mut text = String::new();
    for msg in &record.messages {
        text.push_str("<|im_start|>");
        text.push_str(&msg.role);
        text.push('\n');
        text.push_str(&msg.content);
        text.push_str("<|im_end|>\n");
    }
    text
}
