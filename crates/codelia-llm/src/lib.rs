//! # codelia-llm
//!
//! Provider abstraction for the LLM backends codelia scores and rewrites
//! requirements with.
//!
//! ## Key Types
//!
//! - [`LlmProvider`] - `generate(system_prompt, user_message) -> text`
//! - [`Provider`] - closed set of adapters, built by [`create_provider`]
//! - [`ProviderConfig`] - provider, API key and optional URL/model overrides
//! - [`ProviderError`] - configuration and call failures

mod claude;
pub mod endpoint;
mod gateway;
mod gemini;
mod openai;
mod traits;
mod transport;

use async_trait::async_trait;
use tracing::debug;

pub use claude::{ClaudeProvider, ANTHROPIC_VERSION, DEFAULT_CLAUDE_MODEL, DEFAULT_CLAUDE_URL};
pub use gateway::GatewayProvider;
pub use gemini::{GeminiProvider, DEFAULT_GEMINI_MODEL};
pub use openai::{OpenAiProvider, DEFAULT_OPENAI_MODEL, DEFAULT_OPENAI_URL};
pub use traits::{
    GenerationRequest, LlmProvider, ProviderConfig, ProviderError, ProviderKind, MAX_TOKENS,
    REQUEST_TIMEOUT, TEMPERATURE,
};
pub use transport::{HttpRequest, HttpTransport};

/// One adapter per supported backend
pub enum Provider {
    OpenAi(OpenAiProvider),
    Gemini(GeminiProvider),
    Claude(ClaudeProvider),
    EnterpriseGateway(GatewayProvider),
}

impl Provider {
    fn inner(&self) -> &dyn LlmProvider {
        match self {
            Provider::OpenAi(p) => p,
            Provider::Gemini(p) => p,
            Provider::Claude(p) => p,
            Provider::EnterpriseGateway(p) => p,
        }
    }

    /// Build the HTTP request this provider would send
    pub fn build_request(&self, request: &GenerationRequest) -> HttpRequest {
        match self {
            Provider::OpenAi(p) => p.build_request(request),
            Provider::Gemini(p) => p.build_request(request),
            Provider::Claude(p) => p.build_request(request),
            Provider::EnterpriseGateway(p) => p.build_request(request),
        }
    }
}

#[async_trait]
impl LlmProvider for Provider {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn kind(&self) -> ProviderKind {
        self.inner().kind()
    }

    async fn complete(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        self.inner().complete(request).await
    }
}

/// Create the adapter for a provider configuration.
///
/// The API key is checked before anything else so a missing credential never
/// reaches the network. OpenAI and Claude fall back to their public hosts;
/// Gemini and the enterprise gateway have no safe default and require a base URL.
pub fn create_provider(config: &ProviderConfig) -> Result<Provider, ProviderError> {
    let api_key = config.api_key.trim();
    if api_key.is_empty() {
        return Err(ProviderError::MissingCredential(config.provider));
    }

    debug!(config = ?config, "Creating provider");

    let provider = match config.provider {
        ProviderKind::OpenAi => Provider::OpenAi(OpenAiProvider::new(
            api_key,
            config.base_url().unwrap_or(DEFAULT_OPENAI_URL),
            config.model().unwrap_or(DEFAULT_OPENAI_MODEL),
        )?),
        ProviderKind::Claude => Provider::Claude(ClaudeProvider::new(
            api_key,
            config.base_url().unwrap_or(DEFAULT_CLAUDE_URL),
            config.model().unwrap_or(DEFAULT_CLAUDE_MODEL),
        )?),
        ProviderKind::Gemini => {
            let base_url = config.base_url().ok_or_else(|| {
                ProviderError::Configuration("Gemini requires a Base URL".to_string())
            })?;
            Provider::Gemini(GeminiProvider::new(
                api_key,
                base_url,
                config.model().unwrap_or(DEFAULT_GEMINI_MODEL),
            )?)
        }
        ProviderKind::EnterpriseGateway => {
            let base_url = config.base_url().ok_or_else(|| {
                ProviderError::Configuration("Enterprise Gateway requires a Base URL".to_string())
            })?;
            Provider::EnterpriseGateway(GatewayProvider::new(api_key, base_url)?)
        }
    };

    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_defaults() {
        let provider = create_provider(&ProviderConfig::new(ProviderKind::OpenAi, "sk-1")).unwrap();
        let Provider::OpenAi(inner) = &provider else {
            panic!("expected OpenAI adapter");
        };
        assert_eq!(inner.model(), "gpt-4o-mini");
        assert_eq!(
            inner.endpoint().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(provider.name(), "OpenAI");
    }

    #[test]
    fn test_claude_defaults_and_model_override() {
        let config = ProviderConfig::new(ProviderKind::Claude, "ak-1").with_model("claude-3-opus");
        let provider = create_provider(&config).unwrap();
        let Provider::Claude(inner) = &provider else {
            panic!("expected Claude adapter");
        };
        assert_eq!(inner.model(), "claude-3-opus");
        assert_eq!(
            inner.endpoint().as_str(),
            "https://api.anthropic.com/v1/messages"
        );
    }

    #[test]
    fn test_gemini_requires_base_url() {
        let result = create_provider(&ProviderConfig::new(ProviderKind::Gemini, "g-1"));
        assert!(matches!(result, Err(ProviderError::Configuration(_))));

        let config = ProviderConfig::new(ProviderKind::Gemini, "g-1")
            .with_base_url("https://generativelanguage.googleapis.com/v1beta");
        let provider = create_provider(&config).unwrap();
        let Provider::Gemini(inner) = &provider else {
            panic!("expected Gemini adapter");
        };
        assert_eq!(inner.model(), "gemini-2.0-flash");
    }

    #[test]
    fn test_gateway_requires_base_url() {
        let result = create_provider(
            &ProviderConfig::new(ProviderKind::EnterpriseGateway, "gw-1").with_base_url(" "),
        );
        assert!(matches!(result, Err(ProviderError::Configuration(_))));
    }

    #[test]
    fn test_missing_credential_checked_first() {
        for kind in ProviderKind::ALL {
            let result = create_provider(&ProviderConfig::new(kind, "  "));
            assert!(
                matches!(result, Err(ProviderError::MissingCredential(k)) if k == kind),
                "{} should fail with MissingCredential",
                kind
            );
        }
    }

    #[test]
    fn test_invalid_base_url_is_configuration_error() {
        let config =
            ProviderConfig::new(ProviderKind::OpenAi, "sk-1").with_base_url("not a url");
        assert!(matches!(
            create_provider(&config),
            Err(ProviderError::Configuration(_))
        ));
    }
}
