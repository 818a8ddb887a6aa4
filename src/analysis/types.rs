use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::email::EmailRecord;

/// Outcome of one batch analysis; every field is always present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub total_emails: usize,
    pub analysis_timestamp: String,
    pub comprehensive_summary: String,
    pub high_priority_emails: Vec<HighPriorityEntry>,
    pub action_items: Vec<ActionItem>,
    pub email_categories: BTreeMap<String, u64>,
    pub processing_notes: String,
    #[serde(rename = "raw_emails", default)]
    pub raw_records: Vec<EmailRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighPriorityEntry {
    #[serde(default, deserialize_with = "lenient_number")]
    pub email_number: Option<u64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub subject: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sender: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub priority_level: String,
    #[serde(rename = "reason_for_priority", default, deserialize_with = "lenient_string")]
    pub reason: String,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub key_points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub action: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub priority: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub deadline: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub source_email: String,
}

// Models return numbers as strings and strings as numbers; accept both.

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().trim_start_matches('#').parse().ok(),
        _ => None,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(value_to_string(Value::deserialize(deserializer)?))
}

fn lenient_strings<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(value_to_string)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::Null => Vec::new(),
        other => vec![value_to_string(other)],
    })
}

pub(crate) fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
