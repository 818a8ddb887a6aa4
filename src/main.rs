use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use log::{error, info};

use mailsummary::analysis::PromptBuilder;
use mailsummary::analyzer::{read_input, save_extracted, save_results, write_report, EmailAnalyzer};
use mailsummary::config::Config;
use mailsummary::email::RecordParser;
use mailsummary::llm::Provider;

#[derive(Parser)]
#[command(name = "mailsummary")]
#[command(about = "Summarize a batch of emails through a hosted LLM")]
#[command(version = "0.1.0")]
struct Args {
    /// Extracted email text file (or JSON export with --from-json)
    input: PathBuf,

    /// LLM provider: openai, anthropic or google (overrides LLM_PROVIDER)
    #[arg(short, long)]
    provider: Option<Provider>,

    /// Input is a JSON export of retrieved emails
    #[arg(long)]
    from_json: bool,

    /// Output directory for reports and results (overrides OUTPUT_DIR)
    #[arg(short = 'o', long)]
    output_dir: Option<String>,

    /// Parse the input and build the prompt without calling the API
    #[arg(short, long)]
    dry_run: bool,

    /// Also generate the storytelling summary from the report
    #[arg(long)]
    executive: bool,

    /// Check the configuration without calling the API
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    dotenv::dotenv().ok();

    let args = Args::parse();

    env_logger::init();

    let mut config = Config::new()?;
    if let Some(provider) = args.provider {
        config = config.with_provider(provider, |name| std::env::var(name).ok());
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }

    if args.check_config {
        println!("✅ Configuration loaded");
        println!("🤖 Provider: {} ({})", config.llm.provider, config.llm.provider.model());
        println!(
            "🔑 Credential ({}): {}",
            config.llm.provider.api_key_env(),
            if config.llm.api_key.is_some() { "set" } else { "MISSING" }
        );
        println!(
            "🌐 Endpoint: {}",
            config.llm.endpoint.as_deref().unwrap_or(config.llm.provider.default_endpoint())
        );
        println!(
            "📊 Rate Limits: {} requests/min, {} tokens/min, {} requests/day, {:.1}s between requests",
            config.llm.limits.requests_per_minute,
            config.llm.limits.tokens_per_minute,
            config.llm.limits.requests_per_day,
            config.llm.limits.min_delay.as_secs_f64()
        );
        println!("📁 Output directory: {}", config.output_dir);
        return Ok(());
    }

    let today = Local::now().format("%Y%m%d").to_string();
    let output_dir = PathBuf::from(&config.output_dir);

    // 1. Load the flat text, converting a JSON export first if needed
    let blob = read_input(&args.input, args.from_json)?;

    if args.dry_run {
        let records = RecordParser::parse(&blob);
        let prompt = PromptBuilder::build(&records);
        println!("\n{}", "=".repeat(60));
        println!("🧪 DRY-RUN - {} email(s) parsed from {:?}", records.len(), args.input);
        println!("{}", "=".repeat(60));
        for (i, record) in records.iter().enumerate() {
            println!("📧 {}. {} ({}, {})", i + 1, record.title, record.sender, record.date);
        }
        println!("\n📏 Prompt size: {} characters", prompt.chars().count());
        return Ok(());
    }

    if args.from_json {
        save_extracted(&blob, &output_dir.join(format!("{}_extracted.txt", today)))?;
    }

    config.require_api_key()?;
    let analyzer = EmailAnalyzer::from_config(&config.llm)?;

    // 2. Analyze the batch
    let result = match analyzer.analyze_text(&blob).await {
        Ok(result) => result,
        Err(e) => {
            error!("❌ Error processing emails in batch: {}", e);
            return Err(e.into());
        }
    };

    // 3. Save the JSON results and the report
    let results_path = output_dir.join(format!("{}_llm_processed.json", today));
    let report_path = output_dir.join(format!("{}_email_summary_report.txt", today));
    save_results(&result, &results_path)?;
    let report = write_report(&result, &report_path)?;

    println!("✅ Successfully processed {} emails in batch", result.total_emails);
    println!("   - Results: {:?}", results_path);
    println!("   - Report: {:?}", report_path);
    println!("   - High priority emails: {}", result.high_priority_emails.len());
    println!("   - Action items: {}", result.action_items.len());

    println!("\n📋 Report Preview:");
    println!("{}", "-".repeat(50));
    println!("{}", report.chars().take(500).collect::<String>());

    // 4. Optional storytelling summary
    if args.executive && result.total_emails > 0 {
        let summary = analyzer.executive_summary(&report).await?;
        let summary_path = output_dir.join(format!("{}_storytelling_summary.txt", today));
        fs::write(&summary_path, &summary)
            .with_context(|| format!("Unable to write storytelling summary to {:?}", summary_path))?;
        info!("🎙️ Storytelling summary saved to: {:?}", summary_path);
        println!("\n📖 STORYTELLING SUMMARY:");
        println!("{}", "-".repeat(50));
        println!("{}", summary);
    }

    println!("\n📊 Current API Usage Status:");
    println!("{}", analyzer.usage_status().await);

    Ok(())
}
