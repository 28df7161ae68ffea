use async_trait::async_trait;
use reqwest::Url;
use serde_json::{json, Value};
use tracing::debug;

use crate::endpoint::{append_path, has_query_key, parse_base_url, with_query_key};
use crate::transport::{text_at, HttpRequest, HttpTransport};
use crate::{GenerationRequest, LlmProvider, ProviderError, ProviderKind, MAX_TOKENS, TEMPERATURE};

pub const DEFAULT_CLAUDE_URL: &str = "https://api.anthropic.com/v1";
pub const DEFAULT_CLAUDE_MODEL: &str = "claude-3-sonnet-20240229";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic messages API provider (direct or through a gateway)
pub struct ClaudeProvider {
    transport: HttpTransport,
    api_key: String,
    endpoint: Url,
    model: String,
    gateway: bool,
}

impl ClaudeProvider {
    pub fn new(api_key: &str, base_url: &str, model: &str) -> Result<Self, ProviderError> {
        let base = parse_base_url(base_url)?;
        let gateway = Self::is_gateway(&base);
        let endpoint = if gateway {
            with_query_key(base, api_key)
        } else if base.path().ends_with("/messages") {
            base
        } else {
            append_path(base, "messages")
        };

        Ok(Self {
            transport: HttpTransport::new()?,
            api_key: api_key.to_string(),
            endpoint,
            model: model.to_string(),
            gateway,
        })
    }

    /// Only a `key` query parameter marks a gateway; a bare `/messages`
    /// URL is still the direct API.
    fn is_gateway(base: &Url) -> bool {
        has_query_key(base)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_gateway_endpoint(&self) -> bool {
        self.gateway
    }

    pub fn build_request(&self, request: &GenerationRequest) -> HttpRequest {
        let body = json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
            "system": request.system_prompt,
            "messages": [
                {"role": "user", "content": request.user_message},
            ],
        });

        let http = HttpRequest::new(self.endpoint.clone(), body);
        if self.gateway {
            http.with_bearer(&self.api_key)
        } else {
            http.with_header("x-api-key", self.api_key.as_str())
                .with_header("anthropic-version", ANTHROPIC_VERSION)
        }
    }

    pub fn extract_text(response: &Value) -> Result<String, ProviderError> {
        text_at(ProviderKind::Claude, response, "/content/0/text")
    }
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
    fn name(&self) -> &str {
        "Claude"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Claude
    }

    async fn complete(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        debug!(
            provider = self.name(),
            model = %self.model,
            gateway = self.gateway,
            prompt_len = request.system_prompt.len() + request.user_message.len(),
            "Calling provider"
        );

        let response = self
            .transport
            .post_json(self.kind(), self.build_request(request))
            .await?;
        Self::extract_text(&response)
    }
}
