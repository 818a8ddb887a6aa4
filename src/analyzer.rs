use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use log::{debug, info, warn};

use crate::analysis::{AnalysisResult, PromptBuilder, ReportRenderer, ResponseParser};
use crate::config::LlmConfig;
use crate::email::{to_extracted_text, EmailRecord, RecordParser, RetrievedEmail};
use crate::error::LlmError;
use crate::llm::{ProviderClient, UsageStatus};

/// Batch pipeline: records -> prompt -> model -> structured result
pub struct EmailAnalyzer {
    client: ProviderClient,
}

impl EmailAnalyzer {
    pub fn new(client: ProviderClient) -> Self {
        EmailAnalyzer { client }
    }

    /// Build the analyzer from configuration; the credential must be set
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config.api_key.as_deref().unwrap_or_default();
        let mut client = ProviderClient::new(config.provider, api_key, config.limits.clone())
            .context("Unable to initialize the LLM client")?;
        if let Some(endpoint) = &config.endpoint {
            info!("Using custom endpoint {}", endpoint);
            client = client.with_endpoint(endpoint.clone());
        }
        Ok(EmailAnalyzer::new(client))
    }

    pub fn client(&self) -> &ProviderClient {
        &self.client
    }

    pub async fn usage_status(&self) -> UsageStatus {
        self.client.usage_status().await
    }

    /// Parse an extracted-text file and analyze its records
    pub async fn analyze_file(&self, path: &Path) -> Result<AnalysisResult> {
        info!("Reading extracted emails from {:?}", path);
        let blob = fs::read_to_string(path)
            .with_context(|| format!("Unable to read extracted email file {:?}", path))?;

        let result = self
            .analyze_text(&blob)
            .await
            .context("Error while analyzing emails")?;
        Ok(result)
    }

    pub async fn analyze_text(&self, blob: &str) -> Result<AnalysisResult, LlmError> {
        let records = RecordParser::parse(blob);
        self.analyze_records(records).await
    }

    /// One model call for the whole batch
    ///
    /// Only transport and quota failures are errors; an unusable reply
    /// still yields a complete result.
    pub async fn analyze_records(&self, records: Vec<EmailRecord>) -> Result<AnalysisResult, LlmError> {
        if records.is_empty() {
            warn!("❌ No emails found, skipping model call");
            return Ok(empty_result());
        }

        info!(
            "📧 Processing {} emails through {} in batch...",
            records.len(),
            self.client.provider().name().to_uppercase()
        );

        // 1. Build the batch prompt
        let prompt = PromptBuilder::build(&records);
        debug!("Batch prompt: {} characters", prompt.chars().count());

        // 2. Send it
        let raw = self.client.send(&prompt).await?;

        // 3. Parse whatever came back
        let result = ResponseParser::parse_batch(&raw, records, Local::now());

        info!(
            "✅ Analysis done: {} high priority email(s), {} action item(s)",
            result.high_priority_emails.len(),
            result.action_items.len()
        );

        Ok(result)
    }

    /// Conversational summary of a rendered report, code fence removed
    pub async fn executive_summary(&self, report: &str) -> Result<String, LlmError> {
        info!("🎙️ Generating storytelling summary ({} characters of report)", report.len());
        let raw = self.client.send(&PromptBuilder::executive(report)).await?;
        Ok(strip_outer_fence(raw.trim()))
    }
}

fn empty_result() -> AnalysisResult {
    AnalysisResult {
        total_emails: 0,
        analysis_timestamp: Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, false),
        comprehensive_summary: "No emails to analyze.".to_string(),
        high_priority_emails: Vec::new(),
        action_items: Vec::new(),
        email_categories: Default::default(),
        processing_notes: "No email records parsed from input; model not called.".to_string(),
        raw_records: Vec::new(),
    }
}

/// Drop the first and last lines when the text is wrapped in a code fence
fn strip_outer_fence(text: &str) -> String {
    if !text.starts_with("```") {
        return text.to_string();
    }
    let lines: Vec<&str> = text.lines().collect();
    let end = if lines.len() > 1 && lines[lines.len() - 1].trim_start().starts_with("```") {
        lines.len() - 1
    } else {
        lines.len()
    };
    lines[1..end].join("\n").trim().to_string()
}

/// Read the input as flat text, converting a JSON export in memory
pub fn read_input(path: &Path, from_json: bool) -> Result<String> {
    let raw = fs::read_to_string(path).with_context(|| format!("Unable to read input file {:?}", path))?;
    if !from_json {
        return Ok(raw);
    }

    let records: Vec<EmailRecord> = RetrievedEmail::parse_list(&raw)?
        .iter()
        .map(RetrievedEmail::to_record)
        .collect();
    debug!("Converted {} exported email(s) to flat text", records.len());
    Ok(to_extracted_text(&records))
}

/// Write the flat text produced from a JSON export
pub fn save_extracted(blob: &str, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    fs::write(path, blob).with_context(|| format!("Unable to write extracted content to {:?}", path))?;
    info!("💾 Extracted content saved to: {:?}", path);
    Ok(())
}

/// Write the result as pretty JSON
pub fn save_results(result: &AnalysisResult, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(result).context("Unable to serialize analysis result")?;
    fs::write(path, json).with_context(|| format!("Unable to write results to {:?}", path))?;
    info!("💾 Processed results saved to: {:?}", path);
    Ok(())
}

/// Render the report and write it; the rendered text is returned
pub fn write_report(result: &AnalysisResult, path: &Path) -> Result<String> {
    ensure_parent_dir(path)?;
    let report = ReportRenderer::render(result);
    fs::write(path, &report).with_context(|| format!("Unable to write report to {:?}", path))?;
    info!("📊 Summary report saved to: {:?}", path);
    Ok(report)
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Unable to create directory {:?}", parent))?;
    }
    Ok(())
}
