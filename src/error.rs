//! Error types for the LLM client.
//!
//! Only conditions the caller cannot work around are errors here. Parsing
//! a model reply never fails: see [`crate::analysis::ResponseParser`].

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Which quota window refused an admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaKind {
    Daily,
}

impl fmt::Display for QuotaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaKind::Daily => write!(f, "daily"),
        }
    }
}

#[derive(Error, Debug)]
pub enum LlmError {
    /// The provider credential is missing or empty.
    #[error("{provider} is not configured: set {env_var}")]
    Config {
        provider: String,
        env_var: String,
    },

    /// The provider answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Transport {
        status: u16,
        body: String,
    },

    /// The request never got an HTTP answer.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// 2xx answer whose body does not have the provider's envelope shape.
    #[error("malformed response envelope: {0}")]
    MalformedEnvelope(String),

    #[error("{kind} quota exceeded ({limit} requests), retry in {}s", retry_after.as_secs())]
    QuotaExceeded {
        kind: QuotaKind,
        limit: u32,
        retry_after: Duration,
    },
}

impl LlmError {
    /// True for every failure of the HTTP exchange itself.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            LlmError::Transport { .. } | LlmError::Network(_) | LlmError::MalformedEnvelope(_)
        )
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::Transport { status, .. } => Some(*status),
            LlmError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;
