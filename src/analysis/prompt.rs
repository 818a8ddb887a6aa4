use crate::email::EmailRecord;

/// Characters of email content kept in the batch prompt
pub const CONTENT_PREVIEW_CHARS: usize = 500;

const ELLIPSIS: &str = "...";

const RESPONSE_SHAPE: &str = r#"{
    "comprehensive_summary": "A 3-4 paragraph summary of all emails received, highlighting main themes and patterns",
    "high_priority_emails": [
        {
            "email_number": 1,
            "subject": "Email subject",
            "sender": "Sender email",
            "priority_level": "high/medium",
            "reason_for_priority": "Why this email is important",
            "key_points": ["Point 1", "Point 2", "Point 3"]
        }
    ],
    "action_items": [
        {
            "action": "What needs to be done",
            "priority": "high/medium/low",
            "deadline": "When it needs to be done (if mentioned)",
            "source_email": "Which email this action item came from"
        }
    ],
    "email_categories": {
        "work": 0,
        "personal": 0,
        "marketing": 0,
        "notifications": 0,
        "other": 0
    },
    "processing_notes": "Any additional insights or observations about the email batch"
}"#;

const FOCUS: &str = "Focus on:
1. Identifying truly important emails that require immediate attention
2. Extracting all actionable items and tasks
3. Categorizing emails by type
4. Providing a comprehensive overview of the email batch
5. Highlighting urgent matters and deadlines

Remember: Return ONLY the JSON object, no additional formatting or text.";

/// Renders the prompts sent to the model
pub struct PromptBuilder;

impl PromptBuilder {
    /// Batch-analysis prompt for all records; same records, same text
    pub fn build(records: &[EmailRecord]) -> String {
        let email_blocks: Vec<String> = records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                format!(
                    "\nEmail {}:\n- Subject: {}\n- From: {}\n- Date: {}\n- Content: {}",
                    i + 1,
                    record.title,
                    record.sender,
                    record.date,
                    truncate_chars(&record.text, CONTENT_PREVIEW_CHARS)
                )
            })
            .collect();

        format!(
            "\nPlease analyze the following {} emails and provide a comprehensive summary. \
             Focus on identifying high-priority emails and actionable items.\n\
             {}\n\n\
             IMPORTANT: Respond with ONLY a single valid JSON object with exactly the fields below. \
             Do not include any markdown formatting, code blocks, or additional text.\n\n\
             {}\n\n{}\n",
            records.len(),
            email_blocks.join("\n"),
            RESPONSE_SHAPE,
            FOCUS
        )
    }

    /// Conversational read-aloud summary of an already rendered report
    pub fn executive(report: &str) -> String {
        format!(
            "\nYou are a personal assistant creating a morning/evening email summary that will be read aloud by a text-to-speech app.\n\n\
             Please read the following email summary report and create a conversational, storytelling summary that:\n\
             1. Sounds natural when spoken aloud (like a friend telling you about your emails)\n\
             2. Uses conversational language and natural speech patterns\n\
             3. Tells a story about what happened in your inbox today\n\
             4. Highlights the most important and interesting emails\n\
             5. Is engaging and easy to listen to\n\
             6. Gives you a complete picture without being overwhelming\n\
             7. Uses phrases like \"You received\", \"There was\", \"You have\", etc.\n\
             8. Is 2-3 paragraphs maximum for easy listening\n\
             9. Highlights the key action items that you need to do today (if any)\n\n\
             The tone should be friendly and conversational, as if someone is personally updating you about your emails over coffee.\n\n\
             Do NOT include any other text in your response.\n\n\
             Here is the email summary report:\n\n{}\n",
            report
        )
    }
}

/// First `max` characters of `text`, with an ellipsis when something was cut
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}
