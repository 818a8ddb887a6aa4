use log::{debug, info, warn};
use serde_json::Value;

use super::provider::{AuthScheme, Provider};
use super::usage::{estimate_tokens, SharedUsage, UsageLimits, UsageStatus, UsageTracker};
use crate::error::{LlmError, Result};

/// Sends prompts to one provider, throttled by its usage tracker
///
/// The tracker lock is held from admission to accounting, so clients
/// sharing a [`SharedUsage`] never have two calls in flight at once.
pub struct ProviderClient {
    provider: Provider,
    api_key: String,
    endpoint: String,
    http: reqwest::Client,
    usage: SharedUsage,
}

impl ProviderClient {
    /// Build a client with its own tracker; fails when the credential is blank
    pub fn new(provider: Provider, api_key: &str, limits: UsageLimits) -> Result<Self> {
        Self::with_usage(provider, api_key, UsageTracker::new(limits).shared())
    }

    /// Build a client on an existing tracker shared with other clients
    pub fn with_usage(provider: Provider, api_key: &str, usage: SharedUsage) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(LlmError::Config {
                provider: provider.name().to_string(),
                env_var: provider.api_key_env().to_string(),
            });
        }

        info!("🤖 {} client ready (model {})", provider, provider.model());

        Ok(ProviderClient {
            provider,
            api_key: api_key.to_string(),
            endpoint: provider.default_endpoint().to_string(),
            http: reqwest::Client::new(),
            usage,
        })
    }

    /// Point the client at another URL (proxy, mock server)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn usage(&self) -> SharedUsage {
        self.usage.clone()
    }

    pub async fn usage_status(&self) -> UsageStatus {
        self.usage.lock().await.status()
    }

    /// Send one prompt and return the raw completion text
    ///
    /// Transport failures are returned as-is: nothing is retried here.
    pub async fn send(&self, prompt: &str) -> Result<String> {
        let estimated_tokens = estimate_tokens(prompt);

        let mut usage = self.usage.lock().await;
        usage.admit(estimated_tokens).await?;

        info!(
            "🔄 Sending request to {} (~{} tokens)",
            self.provider.name().to_uppercase(),
            estimated_tokens
        );

        let mut request = self
            .http
            .post(&self.endpoint)
            .header("Content-Type", "application/json");

        request = match self.provider.auth_scheme() {
            AuthScheme::Bearer => request.bearer_auth(&self.api_key),
            AuthScheme::Header(name) => request.header(name, self.api_key.as_str()),
            AuthScheme::QueryKey(name) => request.query(&[(name, self.api_key.as_str())]),
        };
        for (name, value) in self.provider.extra_headers() {
            request = request.header(*name, *value);
        }

        let response = request
            .json(&self.provider.request_body(prompt))
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("❌ {} answered HTTP {}", self.provider, status);
            return Err(LlmError::Transport {
                status: status.as_u16(),
                body,
            });
        }

        // The call counts against the quota from here on, whatever the body holds
        usage.record(estimated_tokens);
        drop(usage);

        let envelope: Value = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedEnvelope(format!("body is not JSON: {}", e)))?;

        let text = self.provider.extract_text(&envelope)?;
        debug!("Received {} characters from {}", text.len(), self.provider);

        Ok(text)
    }
}
