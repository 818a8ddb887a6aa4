/// LLM access: provider variants, quota accounting and the HTTP client
pub mod client;
pub mod clock;
pub mod provider;
pub mod usage;

pub use client::ProviderClient;
pub use clock::{Clock, ManualClock, SystemClock};
pub use provider::Provider;
pub use usage::{estimate_tokens, SharedUsage, UsageLimits, UsageState, UsageStatus, UsageTracker};
