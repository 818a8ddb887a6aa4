pub mod common;
pub mod export;
pub mod record_parser;

// Re-export commonly used items
pub use common::EmailRecord;
pub use export::{to_extracted_text, RetrievedEmail};
pub use record_parser::RecordParser;
