use std::time::Duration;

use anyhow::Result;
use log::warn;

use crate::llm::{Provider, UsageLimits};

#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub output_dir: String,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: Provider,
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub limits: UsageLimits,
}

impl Config {
    /// Load the configuration from the process environment
    pub fn new() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = match lookup("LLM_PROVIDER") {
            Some(name) => name.parse::<Provider>().map_err(anyhow::Error::msg)?,
            None => Provider::Google,
        };

        let defaults = UsageLimits::default();
        let limits = UsageLimits {
            requests_per_minute: parse_or(&lookup, "LLM_REQUESTS_PER_MINUTE", defaults.requests_per_minute),
            tokens_per_minute: parse_or(&lookup, "LLM_TOKENS_PER_MINUTE", defaults.tokens_per_minute),
            requests_per_day: parse_or(&lookup, "LLM_REQUESTS_PER_DAY", defaults.requests_per_day),
            min_delay: Duration::try_from_secs_f64(parse_or(
                &lookup,
                "LLM_MIN_DELAY_SECONDS",
                defaults.min_delay.as_secs_f64(),
            ))
            .unwrap_or(defaults.min_delay),
        };

        Ok(Config {
            llm: LlmConfig {
                provider,
                api_key: lookup(provider.api_key_env()).filter(|key| !key.trim().is_empty()),
                endpoint: lookup("LLM_ENDPOINT").filter(|url| !url.trim().is_empty()),
                limits,
            },
            output_dir: lookup("OUTPUT_DIR").unwrap_or_else(|| "./logs".to_string()),
        })
    }

    /// Override the provider chosen by the environment
    pub fn with_provider<F>(mut self, provider: Provider, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if provider != self.llm.provider {
            self.llm.provider = provider;
            self.llm.api_key = lookup(provider.api_key_env()).filter(|key| !key.trim().is_empty());
        }
        self
    }

    /// The credential of the selected provider, or a message explaining how to set it
    pub fn require_api_key(&self) -> Result<&str> {
        match self.llm.api_key.as_deref() {
            Some(key) => Ok(key),
            None => {
                let var = self.llm.provider.api_key_env();
                anyhow::bail!(
                    "Missing environment variable: {}\n\
                     \n\
                     💡 Solutions :\n\
                     1. Create a .env file with your credentials:\n\
                        {}=your-key-here\n\
                        LLM_PROVIDER={}\n\
                     \n\
                     2. Or export the variable manually:\n\
                        export {}=your-key-here\n\
                        mailsummary emails_extracted.txt",
                    var,
                    var,
                    self.llm.provider,
                    var
                );
            }
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match lookup(name) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("{}={} is not valid, using default {}", name, raw, default);
                default
            }
        },
        None => default,
    }
}
