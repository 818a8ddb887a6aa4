/// Batch analysis: prompt in, structured result and report out
pub mod prompt;
pub mod report;
pub mod response_parser;
pub mod types;

pub use prompt::PromptBuilder;
pub use report::ReportRenderer;
pub use response_parser::ResponseParser;
pub use types::{ActionItem, AnalysisResult, HighPriorityEntry};
