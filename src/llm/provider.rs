//! Hosted LLM backends and their wire formats.
//!
//! Each [`Provider`] variant knows its endpoint, how it authenticates,
//! how to shape a request body and where the completion text sits in the
//! response envelope. Model, temperature and output length are fixed per
//! variant.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;

use crate::error::{LlmError, Result};

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const GOOGLE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-lite:generateContent";

const ANTHROPIC_VERSION: &str = "2023-06-01";
const SYSTEM_PROMPT: &str = "You are an email analysis assistant. Always respond with valid JSON.";

const TEMPERATURE: f64 = 0.3;
const MAX_OUTPUT_TOKENS: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Chat-completion style API
    OpenAi,
    /// Message style API
    Anthropic,
    /// Generate-content style API (Gemini)
    Google,
}

/// How the credential travels with the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Bearer,
    Header(&'static str),
    QueryKey(&'static str),
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::OpenAi, Provider::Anthropic, Provider::Google];

    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Google => "google",
        }
    }

    /// Environment variable holding the credential
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::Google => "GOOGLE_API_KEY",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Provider::OpenAi => OPENAI_URL,
            Provider::Anthropic => ANTHROPIC_URL,
            Provider::Google => GOOGLE_URL,
        }
    }

    pub fn model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-3.5-turbo",
            Provider::Anthropic => "claude-3-sonnet-20240229",
            Provider::Google => "gemini-2.0-flash-lite",
        }
    }

    pub fn auth_scheme(&self) -> AuthScheme {
        match self {
            Provider::OpenAi => AuthScheme::Bearer,
            Provider::Anthropic => AuthScheme::Header("x-api-key"),
            Provider::Google => AuthScheme::QueryKey("key"),
        }
    }

    /// Extra headers the provider requires besides authentication
    pub fn extra_headers(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Provider::Anthropic => &[("anthropic-version", ANTHROPIC_VERSION)],
            Provider::OpenAi | Provider::Google => &[],
        }
    }

    /// Request body in the provider's own schema
    pub fn request_body(&self, prompt: &str) -> Value {
        let body = match self {
            Provider::OpenAi => serde_json::to_value(ChatCompletionRequest {
                model: self.model(),
                messages: vec![
                    ChatMessage { role: "system", content: SYSTEM_PROMPT },
                    ChatMessage { role: "user", content: prompt },
                ],
                temperature: TEMPERATURE,
                max_tokens: MAX_OUTPUT_TOKENS,
            }),
            Provider::Anthropic => serde_json::to_value(MessagesRequest {
                model: self.model(),
                max_tokens: MAX_OUTPUT_TOKENS,
                temperature: TEMPERATURE,
                messages: vec![ChatMessage { role: "user", content: prompt }],
            }),
            Provider::Google => serde_json::to_value(GenerateContentRequest {
                contents: vec![Content {
                    parts: vec![Part { text: prompt }],
                }],
                generation_config: GenerationConfig {
                    temperature: TEMPERATURE,
                    max_output_tokens: MAX_OUTPUT_TOKENS,
                },
            }),
        };
        // These structs only hold strings and numbers
        body.unwrap_or(Value::Null)
    }

    /// Pull the completion text out of the response envelope
    pub fn extract_text(&self, envelope: &Value) -> Result<String> {
        let pointer = match self {
            Provider::OpenAi => "/choices/0/message/content",
            Provider::Anthropic => "/content/0/text",
            Provider::Google => "/candidates/0/content/parts/0/text",
        };

        envelope
            .pointer(pointer)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                LlmError::MalformedEnvelope(format!(
                    "{} response has no text at {}",
                    self.name(),
                    pointer
                ))
            })
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            "google" | "gemini" => Ok(Provider::Google),
            other => Err(format!(
                "unsupported provider '{}' (expected openai, anthropic or google)",
                other
            )),
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}
