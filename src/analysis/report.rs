use chrono::DateTime;

use super::types::AnalysisResult;

pub const NO_HIGH_PRIORITY: &str = "No high priority emails identified.";
pub const NO_ACTION_ITEMS: &str = "No action items identified.";

/// Plain-text rendering of an analysis
pub struct ReportRenderer;

impl ReportRenderer {
    pub fn render(result: &AnalysisResult) -> String {
        let mut out = String::new();
        let section_rule = format!("{}\n", "-".repeat(40));

        out.push_str("COMPREHENSIVE EMAIL ANALYSIS REPORT\n");
        out.push_str(&"=".repeat(60));
        out.push_str("\n\n");
        out.push_str(&format!("Generated: {}\n", generated_at(&result.analysis_timestamp)));
        out.push_str(&format!("Total emails analyzed: {}\n", result.total_emails));
        out.push_str(&format!("Analysis timestamp: {}\n\n", result.analysis_timestamp));

        out.push_str("📋 COMPREHENSIVE SUMMARY\n");
        out.push_str(&section_rule);
        let summary = or_default(&result.comprehensive_summary, "No summary available");
        out.push_str(&format!("{}\n\n", summary));

        out.push_str("🚨 HIGH PRIORITY EMAILS\n");
        out.push_str(&section_rule);
        if result.high_priority_emails.is_empty() {
            out.push_str(&format!("{}\n\n", NO_HIGH_PRIORITY));
        }
        for email in &result.high_priority_emails {
            let number = email
                .email_number
                .map(|n| n.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            out.push_str(&format!("📧 Email {}: {}\n", number, or_default(&email.subject, "No Subject")));
            out.push_str(&format!("   From: {}\n", or_default(&email.sender, "Unknown")));
            out.push_str(&format!("   Priority: {}\n", or_default(&email.priority_level, "Unknown")));
            out.push_str(&format!("   Reason: {}\n", or_default(&email.reason, "No reason given")));
            out.push_str(&format!("   Key Points: {}\n", email.key_points.join(", ")));
            out.push_str(&format!("{}\n\n", "-".repeat(30)));
        }

        out.push_str("✅ ACTION ITEMS\n");
        out.push_str(&section_rule);
        if result.action_items.is_empty() {
            out.push_str(&format!("{}\n\n", NO_ACTION_ITEMS));
        }
        for (i, item) in result.action_items.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, or_default(&item.action, "No action specified")));
            out.push_str(&format!("   Priority: {}\n", or_default(&item.priority, "Unknown")));
            out.push_str(&format!("   Deadline: {}\n", or_default(&item.deadline, "No deadline")));
            out.push_str(&format!("   Source: {}\n", or_default(&item.source_email, "Unknown email")));
            out.push_str(&format!("{}\n\n", "-".repeat(20)));
        }

        if !result.email_categories.is_empty() {
            out.push_str("📊 EMAIL CATEGORIES\n");
            out.push_str(&section_rule);
            for (category, count) in &result.email_categories {
                out.push_str(&format!("{}: {}\n", title_case(category), count));
            }
            out.push('\n');
        }

        out
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() {
        default
    } else {
        value
    }
}

/// Human-readable form of the analysis timestamp, or the raw string
fn generated_at(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        Err(_) => timestamp.to_string(),
    }
}

/// Capitalize every word: "social_media" -> "Social_Media"
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}
