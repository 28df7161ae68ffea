use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Timeout applied to every provider call
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Sampling temperature sent with every generation request
pub const TEMPERATURE: f64 = 0.7;

/// Token cap sent with every generation request
pub const MAX_TOKENS: u32 = 8000;

/// Errors that can occur while configuring or calling a provider
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Provider configuration error: {0}")]
    Configuration(String),

    #[error("API key for {0} not found")]
    MissingCredential(ProviderKind),

    #[error("{provider} API call failed: {cause}")]
    CallFailed {
        provider: ProviderKind,
        cause: String,
    },

    #[error("Unexpected {provider} response: {detail}")]
    UnexpectedResponse {
        provider: ProviderKind,
        detail: String,
    },
}

/// Supported LLM backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "gemini")]
    Gemini,
    #[serde(rename = "claude")]
    Claude,
    #[serde(rename = "enterprise_gateway")]
    EnterpriseGateway,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::OpenAi,
        ProviderKind::Gemini,
        ProviderKind::Claude,
        ProviderKind::EnterpriseGateway,
    ];

    /// Identifier used in settings files and API payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Claude => "claude",
            ProviderKind::EnterpriseGateway => "enterprise_gateway",
        }
    }

    /// Human-readable name (e.g., "OpenAI", "Enterprise Gateway")
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Gemini => "Gemini",
            ProviderKind::Claude => "Claude",
            ProviderKind::EnterpriseGateway => "Enterprise Gateway",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "gemini" => Ok(ProviderKind::Gemini),
            "claude" | "anthropic" => Ok(ProviderKind::Claude),
            "enterprise_gateway" | "enterprise-gateway" | "gateway" => {
                Ok(ProviderKind::EnterpriseGateway)
            }
            _ => Err(ProviderError::UnsupportedProvider(s.to_string())),
        }
    }
}

/// Connection settings for one provider, built fresh for every request
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub provider: ProviderKind,
    pub api_key: String,
    /// Base URL override (required for Gemini and the enterprise gateway)
    pub base_url: Option<String>,
    /// Model override (ignored by the enterprise gateway)
    pub model: Option<String>,
}

impl ProviderConfig {
    pub fn new(provider: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            base_url: None,
            model: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Base URL with blank values treated as unset
    pub fn base_url(&self) -> Option<&str> {
        non_blank(self.base_url.as_deref())
    }

    /// Model with blank values treated as unset
    pub fn model(&self) -> Option<&str> {
        non_blank(self.model.as_deref())
    }
}

// Keys must never reach logs.
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A single system-prompt + user-message exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub user_message: String,
}

impl GenerationRequest {
    pub fn new(system_prompt: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_message: user_message.into(),
        }
    }
}

/// The core abstraction for LLM backends
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human-readable name of the provider (e.g., "OpenAI", "Gemini")
    fn name(&self) -> &str;

    /// The provider type
    fn kind(&self) -> ProviderKind;

    /// Generate text for a system prompt and a user message
    async fn generate(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, ProviderError> {
        self.complete(&GenerationRequest::new(system_prompt, user_message))
            .await
    }

    /// Send a prepared request and return the generated text
    async fn complete(&self, request: &GenerationRequest) -> Result<String, ProviderError>;
}
