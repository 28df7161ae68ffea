use async_trait::async_trait;
use reqwest::Url;
use serde_json::{json, Value};
use tracing::debug;

use crate::endpoint::{append_path, parse_base_url, with_query_key};
use crate::transport::{text_at, HttpRequest, HttpTransport};
use crate::{GenerationRequest, LlmProvider, ProviderError, ProviderKind, MAX_TOKENS, TEMPERATURE};

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// OpenAI-compatible chat completions provider
pub struct OpenAiProvider {
    transport: HttpTransport,
    api_key: String,
    endpoint: Url,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, base_url: &str, model: &str) -> Result<Self, ProviderError> {
        let base = parse_base_url(base_url)?;
        Ok(Self {
            transport: HttpTransport::new()?,
            api_key: api_key.to_string(),
            endpoint: Self::resolve_endpoint(base, api_key),
            model: model.to_string(),
        })
    }

    /// A URL that already names a completion or model-select path is used as
    /// is (gateway style, key in the query); a root host gets `/chat/completions`.
    fn resolve_endpoint(base: Url, api_key: &str) -> Url {
        let path = base.path();
        if path.contains("/chat/completions") || path.contains("/models/") {
            with_query_key(base, api_key)
        } else {
            append_path(base, "chat/completions")
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn build_request(&self, request: &GenerationRequest) -> HttpRequest {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": request.system_prompt},
                {"role": "user", "content": request.user_message},
            ],
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
        });

        HttpRequest::new(self.endpoint.clone(), body).with_bearer(&self.api_key)
    }

    pub fn extract_text(response: &Value) -> Result<String, ProviderError> {
        text_at(ProviderKind::OpenAi, response, "/choices/0/message/content")
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "OpenAI"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_host_gets_chat_completions() {
        let provider = OpenAiProvider::new("sk-1", DEFAULT_OPENAI_URL, DEFAULT_OPENAI_MODEL).unwrap();
        assert_eq!(
            provider.endpoint().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_endpoint_shaped_url_used_verbatim_with_key() {
        let provider = OpenAiProvider::new(
            "sk-1",
            "https://gw.example.com/openai/deployments/x/chat/completions",
            "gpt-4o",
        )
        .unwrap();
        assert_eq!(
            provider.endpoint().as_str(),
            "https://gw.example.com/openai/deployments/x/chat/completions?key=sk-1"
        );
    }

    #[test]
    fn test_request_shape() {
        let provider = OpenAiProvider::new("sk-1", DEFAULT_OPENAI_URL, "gpt-4o").unwrap();
        let request = provider.build_request(&GenerationRequest::new("rubric", "text"));

        assert_eq!(request.header("authorization"), Some("Bearer sk-1"));
        assert_eq!(request.body["model"], "gpt-4o");
        assert_eq!(request.body["messages"][0]["role"], "system");
        assert_eq!(request.body["messages"][0]["content"], "rubric");
        assert_eq!(request.body["messages"][1]["role"], "user");
        assert_eq!(request.body["messages"][1]["content"], "text");
        assert_eq!(request.body["max_tokens"], 8000);
        assert_eq!(request.body["temperature"], 0.7);
    }

    #[test]
    fn test_extract_text() {
        let response = serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "{\"P1\":{\"score\":5}}"}}]
        });
        assert_eq!(
            OpenAiProvider::extract_text(&response).unwrap(),
            "{\"P1\":{\"score\":5}}"
        );
    }
}
