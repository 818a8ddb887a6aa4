/// Common structures for email records
use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "No Subject";
pub const DEFAULT_SENDER: &str = "Unknown Sender";
pub const DEFAULT_DATE: &str = "Unknown Date";
pub const DEFAULT_TEXT: &str = "No content available";

/// One email as handed over by mail retrieval, flattened to plain text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecord {
    pub title: String,
    pub sender: String,
    pub date: String,
    pub text: String,
}

impl EmailRecord {
    /// Build a record, substituting the fixed defaults for blank fields
    pub fn new(
        title: Option<&str>,
        sender: Option<&str>,
        date: Option<&str>,
        text: Option<&str>,
    ) -> Self {
        EmailRecord {
            title: non_blank_or(title, DEFAULT_TITLE),
            sender: non_blank_or(sender, DEFAULT_SENDER),
            date: non_blank_or(date, DEFAULT_DATE),
            text: non_blank_or(text, DEFAULT_TEXT),
        }
    }
}

fn non_blank_or(value: Option<&str>, default: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}
