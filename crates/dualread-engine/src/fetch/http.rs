use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CACHE_CONTROL;

use super::{CacheMode, Fetch, FetchError, FetchOptions, FetchResponse};

/// Loads annotation resources over HTTP.
///
/// The body is only read for successful responses.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

/// `Cache-Control` request directive for a cache mode, if any.
pub fn cache_control(mode: CacheMode) -> Option<&'static str> {
    match mode {
        CacheMode::Default => None,
        CacheMode::NoStore => Some("no-store"),
        CacheMode::Reload | CacheMode::NoCache => Some("no-cache"),
        CacheMode::ForceCache => Some("max-stale"),
        CacheMode::OnlyIfCached => Some("only-if-cached"),
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(
        &self,
        locator: &str,
        options: &FetchOptions,
    ) -> Result<FetchResponse, FetchError> {
        let mut request = self.client.get(locator);

        let has_cache_header = options
            .headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case(CACHE_CONTROL.as_str()));
        if !has_cache_header && let Some(directive) = cache_control(options.cache_mode()) {
            request = request.header(CACHE_CONTROL, directive);
        }
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Ok(FetchResponse::new(status.as_u16(), String::new()));
        }

        let body = response.text().await?;
        Ok(FetchResponse::new(status.as_u16(), body))
    }
}
