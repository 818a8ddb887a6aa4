use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;

use super::common::EmailRecord;

/// One email from the retriever's JSON export
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrievedEmail {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
}

impl RetrievedEmail {
    /// Parse a JSON array of retrieved emails
    pub fn parse_list(json: &str) -> Result<Vec<RetrievedEmail>> {
        let emails: Vec<RetrievedEmail> = serde_json::from_str(json)
            .context("Retrieved emails export is not a JSON array of emails")?;
        debug!("Loaded {} retrieved email(s) from JSON export", emails.len());
        Ok(emails)
    }

    /// The body wins over the snippet unless it is blank
    pub fn to_record(&self) -> EmailRecord {
        let body = self
            .body
            .as_deref()
            .filter(|b| !b.trim().is_empty() && b.trim() != "No content");
        let text = body.or(self.snippet.as_deref());

        EmailRecord::new(
            self.subject.as_deref(),
            self.sender.as_deref(),
            self.date.as_deref(),
            text,
        )
    }
}

/// Write records in the flat text format read by [`super::RecordParser`]
pub fn to_extracted_text(records: &[EmailRecord]) -> String {
    let entries: Vec<String> = records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            format!(
                "EMAIL {}\n{}\nTitle: {}\nFrom: {}\nDate: {}\nContent:\n{}\n{}\n",
                i + 1,
                "-".repeat(30),
                record.title,
                record.sender,
                record.date,
                record.text,
                "=".repeat(60)
            )
        })
        .collect();

    entries.join("\n")
}
