use async_trait::async_trait;
use reqwest::Url;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::endpoint::parse_endpoint;
use crate::transport::{text_at, HttpRequest, HttpTransport};
use crate::{GenerationRequest, LlmProvider, ProviderError, ProviderKind, MAX_TOKENS, TEMPERATURE};

/// Generic enterprise gateway passthrough
///
/// The configured URL is the full endpoint; the gateway picks the model.
pub struct GatewayProvider {
    transport: HttpTransport,
    api_key: String,
    endpoint: Url,
}

impl GatewayProvider {
    pub fn new(api_key: &str, url: &str) -> Result<Self, ProviderError> {
        Ok(Self {
            transport: HttpTransport::new()?,
            api_key: api_key.to_string(),
            endpoint: parse_endpoint(url)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn build_request(&self, request: &GenerationRequest) -> HttpRequest {
        let body = json!({
            "messages": [
                {"role": "system", "content": request.system_prompt},
                {"role": "user", "content": request.user_message},
            ],
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
        });

        HttpRequest::new(self.endpoint.clone(), body).with_bearer(&self.api_key)
    }

    /// Gateways answer in several shapes. The first key present wins:
    /// `choices` (`choices[0].message.content`), then `content`
    /// (`content[0].text` when it is a list), then `response`, else the whole
    /// document as text.
    pub fn extract_text(response: &Value) -> Result<String, ProviderError> {
        let kind = ProviderKind::EnterpriseGateway;

        if response.get("choices").is_some() {
            return text_at(kind, response, "/choices/0/message/content");
        }
        if let Some(content) = response.get("content") {
            return match content {
                Value::Array(_) => text_at(kind, response, "/content/0/text"),
                other => Ok(value_text(other)),
            };
        }
        if let Some(text) = response.get("response") {
            return Ok(value_text(text));
        }

        warn!("Gateway response had no recognised text field, using raw body");
        Ok(response.to_string())
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl LlmProvider for GatewayProvider {
    fn name(&self) -> &str {
        "Enterprise Gateway"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::EnterpriseGateway
    }

    async fn complete(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        debug!(
            provider = self.name(),
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
