use std::sync::OnceLock;

use log::{debug, info};
use regex::Regex;

use super::common::EmailRecord;

/// Line opening every record ("EMAIL 3")
const RECORD_START: &str = r"(?m)^EMAIL \d+[ \t]*\r?$";

/// Line made only of `=` characters closing the content block
const BOUNDARY: &str = r"(?m)^={20,}[ \t]*\r?$";

const TITLE_LABEL: &str = "Title:";
const SENDER_LABEL: &str = "From:";
const DATE_LABEL: &str = "Date:";
/// `Content:` used as a line label, not inside a header value
const CONTENT_LABEL: &str = r"(?m)^[ \t]*Content:";

fn record_start() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(RECORD_START).expect("record start pattern is valid"))
}

fn content_label() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(CONTENT_LABEL).expect("content label pattern is valid"))
}

fn boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(BOUNDARY).expect("boundary pattern is valid"))
}

/// Rebuilds email records from the flat text export
///
/// Expected layout, repeated for every email:
/// ```text
/// EMAIL 1
/// ------------------------------
/// Title: Invoice Due
/// From: billing@x.com
/// Date: 2025-01-01
/// Content:
/// Pay by Friday
/// ============================================================
/// ```
/// Anything before the first `EMAIL <n>` line is a header and is ignored.
pub struct RecordParser;

impl RecordParser {
    pub fn parse(blob: &str) -> Vec<EmailRecord> {
        let starts: Vec<(usize, usize)> = record_start()
            .find_iter(blob)
            .map(|m| (m.start(), m.end()))
            .collect();

        debug!("Found {} record start token(s) in {} bytes", starts.len(), blob.len());

        let mut records = Vec::with_capacity(starts.len());
        let mut dropped = 0;

        for (index, &(_, section_start)) in starts.iter().enumerate() {
            let section_end = starts
                .get(index + 1)
                .map(|&(next_start, _)| next_start)
                .unwrap_or(blob.len());
            let section = &blob[section_start..section_end];

            if section.trim().is_empty() {
                continue;
            }

            match Self::parse_section(section) {
                Some(record) => records.push(record),
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            debug!("Dropped {} section(s) without title nor content", dropped);
        }
        info!("📧 Parsed {} email record(s)", records.len());

        records
    }

    /// Parse one section; `None` when it carries neither a title nor content
    fn parse_section(section: &str) -> Option<EmailRecord> {
        // Labels are only looked up before the `Content:` line so a body
        // quoting "From:" cannot override the header.
        let content = content_label().find(section);
        let header = match content {
            Some(m) => &section[..m.start()],
            None => section,
        };

        let title = Self::labeled_value(header, TITLE_LABEL);
        let sender = Self::labeled_value(header, SENDER_LABEL);
        let date = Self::labeled_value(header, DATE_LABEL);
        let text = content.and_then(|m| Self::content_block(&section[m.end()..]));

        if title.is_none() && text.is_none() {
            return None;
        }

        Some(EmailRecord::new(title, sender, date, text))
    }

    /// Value following the first line starting with `label`, up to the line break
    fn labeled_value<'a>(header: &'a str, label: &str) -> Option<&'a str> {
        header
            .lines()
            .find_map(|line| line.trim_start().strip_prefix(label))
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Everything up to the boundary line, or the end of the section without one
    fn content_block(body: &str) -> Option<&str> {
        let end = match boundary().find(body) {
            Some(m) => m.start(),
            None => body.len(),
        };
        let text = body[..end].trim();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
