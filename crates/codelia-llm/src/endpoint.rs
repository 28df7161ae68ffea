//! Base-URL sniffing shared by the adapters.
//!
//! A provider family can be reached directly (a root API host such as
//! `https://api.openai.com/v1`) or through a gateway that already exposes a
//! complete endpoint. These helpers decide which case a configured URL is in.

use reqwest::Url;

use crate::ProviderError;

/// Parse a URL that is used as given (gateway endpoints)
pub fn parse_endpoint(raw: &str) -> Result<Url, ProviderError> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed)
        .map_err(|e| ProviderError::Configuration(format!("Invalid base URL '{}': {}", trimmed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ProviderError::Configuration(format!(
            "Base URL must use http or https: {}",
            trimmed
        )));
    }
    Ok(url)
}

/// Parse a configured base URL, ignoring trailing slashes on the path
pub fn parse_base_url(raw: &str) -> Result<Url, ProviderError> {
    let mut url = parse_endpoint(raw)?;
    let path = url.path().trim_end_matches('/').to_string();
    url.set_path(&path);
    Ok(url)
}

/// Append path segments (given as `a/b:c`) to the URL path, keeping any query
pub fn append_path(mut url: Url, suffix: &str) -> Url {
    let path = format!(
        "{}/{}",
        url.path().trim_end_matches('/'),
        suffix.trim_start_matches('/')
    );
    url.set_path(&path);
    url
}

/// Whether the URL already carries a `key` query parameter
pub fn has_query_key(url: &Url) -> bool {
    url.query_pairs().any(|(name, _)| name == "key")
}

/// Add `key=<api_key>` unless a `key` parameter is already present
pub fn with_query_key(mut url: Url, api_key: &str) -> Url {
    if !has_query_key(&url) {
        url.query_pairs_mut().append_pair("key", api_key);
    }
    url
}
