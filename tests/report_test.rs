use std::collections::BTreeMap;

use mailsummary::analysis::report::{NO_ACTION_ITEMS, NO_HIGH_PRIORITY};
use mailsummary::analysis::{ActionItem, AnalysisResult, HighPriorityEntry, ReportRenderer};

fn bare_result() -> AnalysisResult {
    AnalysisResult {
        total_emails: 3,
        analysis_timestamp: "2025-01-06T08:15:00+01:00".to_string(),
        comprehensive_summary: "A quiet Monday.".to_string(),
        high_priority_emails: Vec::new(),
        action_items: Vec::new(),
        email_categories: BTreeMap::new(),
        processing_notes: String::new(),
        raw_records: Vec::new(),
    }
}

#[test]
fn test_empty_sections_use_fixed_notices() {
    let report = ReportRenderer::render(&bare_result());

    assert!(report.starts_with("COMPREHENSIVE EMAIL ANALYSIS REPORT\n"));
    assert!(report.contains("Generated: 2025-01-06 08:15:00"));
    assert!(report.contains("Total emails analyzed: 3"));
    assert!(report.contains("A quiet Monday."));
    assert!(report.contains(NO_HIGH_PRIORITY));
    assert!(report.contains(NO_ACTION_ITEMS));
    assert!(report.contains("No action items identified."));
    assert!(!report.contains("EMAIL CATEGORIES"));
}

#[test]
fn test_full_report_sections_in_order() {
    let mut result = bare_result();
    result.high_priority_emails.push(HighPriorityEntry {
        email_number: Some(1),
        subject: "Invoice Due".to_string(),
        sender: "billing@x.com".to_string(),
        priority_level: "high".to_string(),
        reason: "Payment deadline".to_string(),
        key_points: vec!["Amount due".to_string(), "Pay by Friday".to_string()],
    });
    result.action_items.push(ActionItem {
        action: "Pay the invoice".to_string(),
        priority: "high".to_string(),
        deadline: String::new(),
        source_email: "Invoice Due".to_string(),
    });
    result.email_categories.insert("work".to_string(), 2);
    result.email_categories.insert("marketing".to_string(), 1);

    let report = ReportRenderer::render(&result);

    assert!(report.contains("📧 Email 1: Invoice Due"));
    assert!(report.contains("   Key Points: Amount due, Pay by Friday"));
    assert!(report.contains("1. Pay the invoice"));
    assert!(report.contains("   Deadline: No deadline"));
    assert!(!report.contains(NO_HIGH_PRIORITY));
    assert!(!report.contains(NO_ACTION_ITEMS));

    let summary = report.find("📋 COMPREHENSIVE SUMMARY").unwrap();
    let priority = report.find("🚨 HIGH PRIORITY EMAILS").unwrap();
    let actions = report.find("✅ ACTION ITEMS").unwrap();
    let categories = report.find("📊 EMAIL CATEGORIES").unwrap();
    assert!(summary < priority && priority < actions && actions < categories);

    // Categories come out sorted by name
    let marketing = report.find("Marketing: 1").unwrap();
    let work = report.find("Work: 2").unwrap();
    assert!(marketing < work);
}

#[test]
fn test_rendering_is_deterministic() {
    let mut result = bare_result();
    for (name, count) in [("work", 4), ("personal", 2), ("finance", 1)] {
        result.email_categories.insert(name.to_string(), count);
    }

    assert_eq!(ReportRenderer::render(&result), ReportRenderer::render(&result.clone()));
}

#[test]
fn test_blank_summary_and_unknown_number() {
    let mut result = bare_result();
    result.comprehensive_summary = "  ".to_string();
    result.high_priority_emails.push(HighPriorityEntry {
        email_number: None,
        subject: String::new(),
        sender: String::new(),
        priority_level: "medium".to_string(),
        reason: String::new(),
        key_points: Vec::new(),
    });

    let report = ReportRenderer::render(&result);

    assert!(report.contains("No summary available"));
    assert!(report.contains("📧 Email N/A: No Subject"));
    assert!(report.contains("   From: Unknown"));
}
