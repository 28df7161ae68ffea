use reqwest::{Client, Url};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, trace};

use crate::{ProviderError, ProviderKind, REQUEST_TIMEOUT};

/// Longest slice of an error body kept in failure messages
const ERROR_BODY_LIMIT: usize = 500;

/// A fully prepared provider call: endpoint, extra headers and JSON body
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: Url,
    pub headers: Vec<(&'static str, String)>,
    pub body: Value,
}

impl HttpRequest {
    pub fn new(url: Url, body: Value) -> Self {
        Self {
            url,
            headers: Vec::new(),
            body,
        }
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn with_bearer(self, token: &str) -> Self {
        self.with_header("authorization", format!("Bearer {}", token))
    }

    /// Look up a header value by name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Shared HTTP plumbing for every provider adapter
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                ProviderError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(Self { client })
    }

    /// POST a JSON body and decode the JSON response.
    ///
    /// Non-2xx statuses, connection errors and timeouts become
    /// [`ProviderError::CallFailed`]; a 2xx body that is not JSON becomes
    /// [`ProviderError::UnexpectedResponse`]. Nothing is retried.
    pub async fn post_json(
        &self,
        provider: ProviderKind,
        request: HttpRequest,
    ) -> Result<Value, ProviderError> {
        let start = Instant::now();

        // The query string may carry the API key, so only host and path are logged.
        debug!(
            provider = %provider,
            host = request.url.host_str().unwrap_or_default(),
            path = request.url.path(),
            "Sending generation request"
        );

        let mut builder = self
            .client
            .post(request.url)
            .header("content-type", "application/json")
            .json(&request.body);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| transport_failure(provider, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_failure(provider, e))?;

        debug!(
            provider = %provider,
            status = status.as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Provider responded"
        );
        trace!(body = %text, "Provider response body");

        if !status.is_success() {
            return Err(ProviderError::CallFailed {
                provider,
                cause: format!("HTTP {}: {}", status, truncate(&text, ERROR_BODY_LIMIT)),
            });
        }

        serde_json::from_str(&text).map_err(|e| ProviderError::UnexpectedResponse {
            provider,
            detail: format!("response body is not JSON: {}", e),
        })
    }
}

fn transport_failure(provider: ProviderKind, error: reqwest::Error) -> ProviderError {
    let cause = if error.is_timeout() {
        format!("request timed out after {}s", REQUEST_TIMEOUT.as_secs())
    } else {
        error.without_url().to_string()
    };
    ProviderError::CallFailed { provider, cause }
}

/// Extract a string field at a JSON pointer, or fail with the pointer in the message
pub(crate) fn text_at(
    provider: ProviderKind,
    response: &Value,
    pointer: &str,
) -> Result<String, ProviderError> {
    response
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ProviderError::UnexpectedResponse {
            provider,
            detail: format!("missing text at {}", pointer),
        })
}

fn truncate(text: &str, max_len: usize) -> &str {
    if text.len() <= max_len {
        return text;
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
