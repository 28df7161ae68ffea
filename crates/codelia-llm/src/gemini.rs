use async_trait::async_trait;
use reqwest::Url;
use serde_json::{json, Value};
use tracing::debug;

use crate::endpoint::{append_path, parse_base_url, with_query_key};
use crate::transport::{text_at, HttpRequest, HttpTransport};
use crate::{GenerationRequest, LlmProvider, ProviderError, ProviderKind};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Google Gemini generateContent provider
///
/// Gemini has no separate system role here: the system prompt is folded into
/// the single user turn. The API key always travels as the `key` query
/// parameter.
pub struct GeminiProvider {
    transport: HttpTransport,
    endpoint: Url,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: &str, base_url: &str, model: &str) -> Result<Self, ProviderError> {
        let base = parse_base_url(base_url)?;
        Ok(Self {
            transport: HttpTransport::new()?,
            endpoint: Self::resolve_endpoint(base, model, api_key),
            model: model.to_string(),
        })
    }

    fn resolve_endpoint(base: Url, model: &str, api_key: &str) -> Url {
        let path = base.path();
        let endpoint = if path.contains(":generateContent") || path.contains("/models/") {
            base
        } else if path.ends_with("/models") {
            append_path(base, &format!("{}:generateContent", model))
        } else {
            append_path(base, &format!("models/{}:generateContent", model))
        };
        with_query_key(endpoint, api_key)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn build_request(&self, request: &GenerationRequest) -> HttpRequest {
        let full_prompt = format!(
            "{}\n\nUser Request:\n{}",
            request.system_prompt, request.user_message
        );
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": full_prompt}],
            }],
        });

        HttpRequest::new(self.endpoint.clone(), body)
    }

    pub fn extract_text(response: &Value) -> Result<String, ProviderError> {
        text_at(
            ProviderKind::Gemini,
            response,
            "/candidates/0/content/parts/0/text",
        )
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "Gemini"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn complete(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        debug!(
            provider = self.name(),
            model = %self.model,
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
