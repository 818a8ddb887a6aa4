use chrono::Local;
use mailsummary::analysis::ResponseParser;
use mailsummary::email::EmailRecord;

#[test]
fn test_fenced_json_with_prose() {
    let raw = "Here is the result:\n```json\n{\"comprehensive_summary\": \"All clear.\"}\n```";
    let result = ResponseParser::parse(raw);

    assert_eq!(result.comprehensive_summary, "All clear.");
    assert!(result.high_priority_emails.is_empty());
    assert!(result.action_items.is_empty());
    assert!(result.email_categories.is_empty());
}

#[test]
fn test_prose_without_braces_uses_head() {
    let raw: String = "The inbox was quiet today. ".repeat(12).chars().take(300).collect();
    assert_eq!(raw.chars().count(), 300);

    let result = ResponseParser::parse(&raw);

    let expected = format!("{}...", raw.chars().take(200).collect::<String>());
    assert_eq!(result.comprehensive_summary, expected);
    assert!(result.processing_notes.contains("no JSON object"));
}

#[test]
fn test_short_prose_is_kept_whole() {
    let result = ResponseParser::parse("Nothing important.");
    assert_eq!(result.comprehensive_summary, "Nothing important.");
}

#[test]
fn test_never_fails_on_odd_inputs() {
    let inputs = [
        "",
        "   ",
        "}{",
        "{",
        "{\"comprehensive_summary\": ",
        "{\"comprehensive_summary\": \"unterminated",
        "{{{{ }",
        "[1, 2, 3]",
        "{\"a\": [1, 2}",
        "```json\n```",
        "{\"comprehensive_summary\": null, \"high_priority_emails\": \"none\", \"email_categories\": []}",
    ];

    for raw in inputs {
        let result = ResponseParser::parse(raw);
        let value = serde_json::to_value(&result).unwrap();

        assert!(value["high_priority_emails"].is_array(), "input {:?}", raw);
        assert!(value["action_items"].is_array(), "input {:?}", raw);
        assert!(value["email_categories"].is_object(), "input {:?}", raw);
        assert!(!result.processing_notes.is_empty(), "input {:?}", raw);
        assert!(result.comprehensive_summary.chars().count() <= 1003);
        assert!(!result.analysis_timestamp.is_empty());
    }
}

#[test]
fn test_broken_json_falls_back_to_key_scan() {
    let raw = r#"{"comprehensive_summary": "Three invoices and a newsletter", "action_items": [{"action": "Pay"#;
    let result = ResponseParser::parse(raw);

    assert_eq!(result.comprehensive_summary, "Three invoices and a newsletter");
    assert!(result.action_items.is_empty());
    assert!(result.processing_notes.contains("key scan"));
}

#[test]
fn test_full_reply() {
    let raw = r#"```json
{
    "comprehensive_summary": "Two emails: one invoice, one newsletter.",
    "high_priority_emails": [
        {
            "email_number": 1,
            "subject": "Invoice Due",
            "sender": "billing@x.com",
            "priority_level": "high",
            "reason_for_priority": "Payment deadline",
            "key_points": ["Amount due", "Pay by Friday"]
        }
    ],
    "action_items": [
        {"action": "Pay the invoice", "priority": "high", "deadline": "Friday", "source_email": "Invoice Due"}
    ],
    "email_categories": {"work": 1, "marketing": 1},
    "processing_notes": "Small batch"
}
```"#;
    let records = vec![
        EmailRecord::new(Some("Invoice Due"), Some("billing@x.com"), Some("2025-01-01"), Some("Pay by Friday")),
        EmailRecord::new(Some("Newsletter"), Some("news@y.com"), Some("2025-01-01"), Some("Weekly digest")),
    ];

    let result = ResponseParser::parse_batch(raw, records.clone(), Local::now());

    assert_eq!(result.total_emails, 2);
    assert_eq!(result.raw_records, records);
    assert_eq!(result.high_priority_emails.len(), 1);
    assert_eq!(result.high_priority_emails[0].email_number, Some(1));
    assert_eq!(result.high_priority_emails[0].reason, "Payment deadline");
    assert_eq!(result.high_priority_emails[0].key_points.len(), 2);
    assert_eq!(result.action_items[0].deadline, "Friday");
    assert_eq!(result.email_categories.get("marketing"), Some(&1));
    assert_eq!(result.processing_notes, "Small batch Parsed as JSON.");
}

#[test]
fn test_result_serializes_with_expected_field_names() {
    let result = ResponseParser::parse(r#"{"comprehensive_summary": "S"}"#);
    let value = serde_json::to_value(&result).unwrap();

    for field in [
        "total_emails",
        "analysis_timestamp",
        "comprehensive_summary",
        "high_priority_emails",
        "action_items",
        "email_categories",
        "processing_notes",
    ] {
        assert!(value.get(field).is_some(), "missing field {}", field);
    }
    assert!(value["high_priority_emails"].is_array());
    assert!(value["email_categories"].is_object());
}
