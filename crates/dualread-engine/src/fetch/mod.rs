//! # Fetching
//!
//! The capability used to load annotation resources. The engine only depends
//! on the [`Fetch`] trait; [`FileFetcher`] and [`HttpFetcher`] are the two
//! implementations shipped with the crate.

pub mod file;
pub mod http;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

pub use file::FileFetcher;
pub use http::HttpFetcher;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Status(u16),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid locator: {0}")]
    InvalidLocator(String),
    #[error("Unknown cache mode: {0}")]
    UnknownCacheMode(String),
}

/// How a fetch may use intermediate caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    Default,
    NoStore,
    Reload,
    NoCache,
    /// Prefer any cached copy, even a stale one.
    #[default]
    ForceCache,
    OnlyIfCached,
}

impl CacheMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheMode::Default => "default",
            CacheMode::NoStore => "no-store",
            CacheMode::Reload => "reload",
            CacheMode::NoCache => "no-cache",
            CacheMode::ForceCache => "force-cache",
            CacheMode::OnlyIfCached => "only-if-cached",
        }
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheMode {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(CacheMode::Default),
            "no-store" => Ok(CacheMode::NoStore),
            "reload" => Ok(CacheMode::Reload),
            "no-cache" => Ok(CacheMode::NoCache),
            "force-cache" => Ok(CacheMode::ForceCache),
            "only-if-cached" => Ok(CacheMode::OnlyIfCached),
            other => Err(FetchError::UnknownCacheMode(other.to_string())),
        }
    }
}

/// Request options passed to every fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    pub headers: BTreeMap<String, String>,
    pub cache: Option<CacheMode>,
}

impl FetchOptions {
    /// Layers `request_headers` over `base`. Request headers win on conflict
    /// and the cache mode falls back to [`CacheMode::ForceCache`].
    pub fn compose(base: &FetchOptions, request_headers: &BTreeMap<String, String>) -> Self {
        let mut headers = base.headers.clone();
        headers.extend(
            request_headers
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );

        Self {
            headers,
            cache: Some(base.cache.unwrap_or_default()),
        }
    }

    pub fn cache_mode(&self) -> CacheMode {
        self.cache.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    body: String,
}

impl FetchResponse {
    pub const OK: u16 = 200;
    pub const NOT_FOUND: u16 = 404;

    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(Self::OK, body)
    }

    pub fn not_found() -> Self {
        Self::new(Self::NOT_FOUND, String::new())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Self::NOT_FOUND
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn into_text(self) -> String {
        self.body
    }
}

#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, locator: &str, options: &FetchOptions)
    -> Result<FetchResponse, FetchError>;
}
