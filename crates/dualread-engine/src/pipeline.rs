//! # Pipeline Adapter
//!
//! Entry points for a rendering pipeline. Every path out of the adapter is a
//! complete document: either the merged result or the original content.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::cache::ResourceCache;
use crate::fetch::{Fetch, FetchOptions};
use crate::locator::{BasePath, DEFAULT_EXTENSION, DEFAULT_SUFFIX, PathResolver};
use crate::merge::Merger;

/// Which extension point performs the merge. The other one passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookStage {
    /// Raw markdown, before the pipeline parses it.
    #[default]
    BeforeParse,
    /// Rendered markup, after the pipeline produced it.
    AfterRender,
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown hook stage: {0}")]
pub struct UnknownHookStage(String);

impl FromStr for HookStage {
    type Err = UnknownHookStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "before-parse" => Ok(HookStage::BeforeParse),
            "after-render" => Ok(HookStage::AfterRender),
            other => Err(UnknownHookStage(other.to_string())),
        }
    }
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HookStage::BeforeParse => "before-parse",
            HookStage::AfterRender => "after-render",
        })
    }
}

/// The page being rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Route {
    /// Locator of the primary document, if the page has one.
    pub file: Option<String>,
}

impl Route {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_path: BasePath,
    pub suffix: String,
    pub extension: String,
    pub hook: HookStage,
    /// Base fetch options.
    pub fetch: FetchOptions,
    /// Extra request headers layered over `fetch.headers`.
    pub request_headers: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_path: BasePath::default(),
            suffix: DEFAULT_SUFFIX.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            hook: HookStage::default(),
            fetch: FetchOptions::default(),
            request_headers: BTreeMap::new(),
        }
    }
}

impl Settings {
    pub fn resolver(&self) -> PathResolver {
        PathResolver::new(self.base_path.clone())
            .with_suffix(self.suffix.clone())
            .with_extension(self.extension.clone())
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions::compose(&self.fetch, &self.request_headers)
    }
}

pub struct DualRead<F> {
    resolver: PathResolver,
    cache: Arc<ResourceCache<F>>,
    merger: Merger,
    stage: HookStage,
}

impl<F: Fetch + 'static> DualRead<F> {
    /// Builds an adapter around a cache that may be shared with other adapters.
    pub fn new(settings: &Settings, cache: Arc<ResourceCache<F>>) -> Self {
        Self {
            resolver: settings.resolver(),
            cache,
            merger: Merger::default(),
            stage: settings.hook,
        }
    }

    /// Builds an adapter with its own cache over `fetcher`.
    pub fn with_fetcher(settings: &Settings, fetcher: F) -> Self {
        let cache = Arc::new(ResourceCache::new(fetcher, settings.fetch_options()));
        Self::new(settings, cache)
    }

    #[must_use]
    pub fn with_merger(mut self, merger: Merger) -> Self {
        self.merger = merger;
        self
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn cache(&self) -> &Arc<ResourceCache<F>> {
        &self.cache
    }

    pub fn stage(&self) -> HookStage {
        self.stage
    }

    /// "Before parse" hook: raw markdown in, markdown out.
    pub async fn before_parse(&self, content: &str, route: &Route) -> String {
        if self.stage != HookStage::BeforeParse {
            return content.to_string();
        }
        self.annotate(content, route).await
    }

    /// "After render" hook: rendered markup in, markup out.
    pub async fn after_render(&self, html: &str, route: &Route) -> String {
        if self.stage != HookStage::AfterRender {
            return html.to_string();
        }
        self.annotate(html, route).await
    }

    /// Resolves, fetches and merges, returning `content` unchanged on any failure.
    pub async fn annotate(&self, content: &str, route: &Route) -> String {
        let Some(file) = route.file.as_deref() else {
            return content.to_string();
        };

        let locator = match self.resolver.resolve(file) {
            Ok(locator) => locator,
            Err(e) => {
                log::debug!("Skipping annotation: {e}");
                return content.to_string();
            }
        };

        let Some(annotation) = self.cache.get(&locator).await else {
            return content.to_string();
        };

        match self.merger.merge(content, &annotation) {
            Ok(outcome) => outcome.content,
            Err(e) => {
                log::error!("Failed to merge annotation content for {file}: {e}");
                content.to_string()
            }
        }
    }
}
