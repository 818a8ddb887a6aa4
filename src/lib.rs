// Library exports for mailsummary crate
// This allows tests and other crates to use the modules

pub mod analysis;
pub mod analyzer;
pub mod config;
pub mod email;
pub mod error;
pub mod llm;

pub use analysis::AnalysisResult;
pub use analyzer::EmailAnalyzer;
pub use error::LlmError;
