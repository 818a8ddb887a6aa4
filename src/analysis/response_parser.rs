//! Turns free-form model output into an [`AnalysisResult`].
//!
//! Parsing never fails. Extraction runs in stages of decreasing precision
//! and the stage that produced the summary is written to
//! `processing_notes`:
//!
//! 1. code fences are stripped;
//! 2. the span from the first `{` to the last `}` is parsed as JSON and
//!    missing fields are back-filled;
//! 3. otherwise the quoted value after the `comprehensive_summary` key is
//!    scanned for (no escape handling, last resort only);
//! 4. otherwise the head of the raw text becomes the summary.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, SecondsFormat};
use log::{debug, warn};
use serde_json::{Map, Value};

use super::prompt::truncate_chars;
use super::types::{value_to_string, ActionItem, AnalysisResult, HighPriorityEntry};
use crate::email::EmailRecord;

const SUMMARY_KEY: &str = "comprehensive_summary";
const BACKFILL_SUMMARY_CHARS: usize = 500;
const FALLBACK_SUMMARY_CHARS: usize = 200;
const STORED_SUMMARY_CHARS: usize = 1000;
const PARSED_AS_JSON: &str = "Parsed as JSON.";

/// Why the structured stage did not produce the result
#[derive(Debug)]
enum ParseFailure {
    NoJsonObject,
    InvalidJson(serde_json::Error),
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseFailure::NoJsonObject => write!(f, "no JSON object in response"),
            ParseFailure::InvalidJson(e) => write!(f, "JSON parsing error: {}", e),
        }
    }
}

pub struct ResponseParser;

impl ResponseParser {
    /// Parse a reply on its own; `total_emails` comes from the reply if it has one
    pub fn parse(raw: &str) -> AnalysisResult {
        Self::parse_at(raw, Local::now())
    }

    /// Parse the reply to a batch prompt built from `records`
    pub fn parse_batch(raw: &str, records: Vec<EmailRecord>, timestamp: DateTime<Local>) -> AnalysisResult {
        let mut result = Self::parse_at(raw, timestamp);
        result.total_emails = records.len();
        result.raw_records = records;
        result
    }

    fn parse_at(raw: &str, timestamp: DateTime<Local>) -> AnalysisResult {
        let analysis_timestamp = timestamp.to_rfc3339_opts(SecondsFormat::Secs, false);

        // 1. Strip markdown code fences
        let text = strip_code_fences(raw);

        // 2. Structured parse of the outermost braces
        let failure = match parse_json_object(&text) {
            Ok(object) => {
                debug!("Model reply parsed as JSON ({} fields)", object.len());
                return from_object(object, raw, analysis_timestamp);
            }
            Err(failure) => failure,
        };
        warn!("⚠️  Could not parse model reply as JSON: {}", failure);

        // 3. Scan for the summary value
        if let Some(summary) = scan_summary_value(&text) {
            return fallback_result(
                summary.to_string(),
                format!("{}. Using summary extracted by key scan.", failure),
                analysis_timestamp,
            );
        }

        // 4. Head of the raw text
        let head = truncate_chars(&text, FALLBACK_SUMMARY_CHARS);
        fallback_result(
            truncate_chars(&head, STORED_SUMMARY_CHARS),
            format!("{}. Using the beginning of the raw response as summary.", failure),
            analysis_timestamp,
        )
    }
}

fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```JSON", "").replace("```", "")
}

fn parse_json_object(text: &str) -> Result<Map<String, Value>, ParseFailure> {
    let (start, end) = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => return Err(ParseFailure::NoJsonObject),
    };

    match serde_json::from_str::<Value>(text[start..=end].trim()) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(ParseFailure::NoJsonObject),
        Err(e) => Err(ParseFailure::InvalidJson(e)),
    }
}

/// Build the result from a parsed object, back-filling whatever is missing
///
/// A missing summary is taken from the raw reply, fences included.
fn from_object(mut object: Map<String, Value>, raw: &str, analysis_timestamp: String) -> AnalysisResult {
    let mut backfilled = Vec::new();

    let comprehensive_summary = match object.remove(SUMMARY_KEY).map(value_to_string) {
        Some(summary) if !summary.trim().is_empty() => summary,
        _ => {
            backfilled.push(SUMMARY_KEY);
            truncate_chars(raw.trim(), BACKFILL_SUMMARY_CHARS)
        }
    };

    let high_priority_emails: Vec<HighPriorityEntry> =
        entries(object.remove("high_priority_emails"), "high_priority_emails", &mut backfilled);
    let action_items: Vec<ActionItem> = entries(object.remove("action_items"), "action_items", &mut backfilled);

    let email_categories = match object.remove("email_categories") {
        Some(Value::Object(map)) => categories(map),
        _ => {
            backfilled.push("email_categories");
            BTreeMap::new()
        }
    };

    let total_emails = object
        .get("total_emails")
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .unwrap_or(0);

    let mut notes: Vec<String> = object
        .remove("processing_notes")
        .map(value_to_string)
        .filter(|note| !note.trim().is_empty())
        .into_iter()
        .collect();
    if !backfilled.is_empty() {
        notes.push(format!("Missing from model reply, defaulted: {}.", backfilled.join(", ")));
    }
    notes.push(PARSED_AS_JSON.to_string());
    let processing_notes = notes.join(" ");

    AnalysisResult {
        total_emails,
        analysis_timestamp,
        comprehensive_summary,
        high_priority_emails,
        action_items,
        email_categories,
        processing_notes,
        raw_records: Vec::new(),
    }
}

/// Deserialize each array element on its own; malformed elements are skipped
fn entries<T: serde::de::DeserializeOwned>(
    value: Option<Value>,
    field: &'static str,
    backfilled: &mut Vec<&'static str>,
) -> Vec<T> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Skipping malformed {} entry: {}", field, e);
                    None
                }
            })
            .collect(),
        _ => {
            backfilled.push(field);
            Vec::new()
        }
    }
}

fn categories(map: Map<String, Value>) -> BTreeMap<String, u64> {
    map.into_iter()
        .filter_map(|(name, count)| {
            let count = match count {
                Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }?;
            Some((name, count))
        })
        .collect()
}

/// Quoted value following the summary key's colon, if non-blank
fn scan_summary_value(text: &str) -> Option<&str> {
    let key_pos = text
        .find(&format!("\"{}\"", SUMMARY_KEY))
        .or_else(|| text.find(SUMMARY_KEY))?;
    let after_key = &text[key_pos..];
    let colon = after_key.find(':')?;
    let after_colon = &after_key[colon + 1..];
    let open = after_colon.find('"')?;
    let value = &after_colon[open + 1..];
    let close = value.find('"')?;
    let summary = &value[..close];

    if summary.trim().is_empty() {
        None
    } else {
        Some(summary)
    }
}

fn fallback_result(comprehensive_summary: String, processing_notes: String, analysis_timestamp: String) -> AnalysisResult {
    AnalysisResult {
        total_emails: 0,
        analysis_timestamp,
        comprehensive_summary,
        high_priority_emails: Vec::new(),
        action_items: Vec::new(),
        email_categories: BTreeMap::new(),
        processing_notes,
        raw_records: Vec::new(),
    }
}
