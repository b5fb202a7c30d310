//! # Locator Resolution
//!
//! Derives the annotation locator for a primary document: the language
//! suffix goes in front of the final extension (`guide.md` -> `guide_en.md`)
//! and the result is joined onto the configured base path.
//!
//! Resolution is pure and performs no I/O.

use std::sync::OnceLock;

use regex::Regex;

pub const DEFAULT_SUFFIX: &str = "_en";
pub const DEFAULT_EXTENSION: &str = "md";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("Not an annotatable document: {0}")]
    NotAnnotatable(String),
    #[error("Annotation locator equals the document locator: {0}")]
    Unchanged(String),
}

/// Where annotation resources live. Only the first candidate is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BasePath {
    Single(String),
    Candidates(Vec<String>),
}

impl Default for BasePath {
    fn default() -> Self {
        BasePath::Single(String::new())
    }
}

impl BasePath {
    /// The effective base, empty when nothing is configured.
    pub fn first(&self) -> &str {
        match self {
            BasePath::Single(base) => base,
            BasePath::Candidates(candidates) => candidates.first().map_or("", String::as_str),
        }
    }
}

impl From<&str> for BasePath {
    fn from(base: &str) -> Self {
        BasePath::Single(base.to_string())
    }
}

impl From<Vec<String>> for BasePath {
    fn from(candidates: Vec<String>) -> Self {
        BasePath::Candidates(candidates)
    }
}

/// True for scheme-qualified (`https://`) or protocol-relative (`//`) locators.
pub fn is_absolute(locator: &str) -> bool {
    static ABSOLUTE: OnceLock<Regex> = OnceLock::new();
    ABSOLUTE
        .get_or_init(|| Regex::new(r"(?i)^(?:[a-z]+:)?//").expect("Invalid absolute locator regex"))
        .is_match(locator)
}

/// Joins `reference` onto `base` with exactly one `/` between them.
///
/// Absolute references and empty bases return the reference unchanged.
pub fn join_base_path(base: &BasePath, reference: &str) -> String {
    if is_absolute(reference) {
        return reference.to_string();
    }

    let base = base.first();
    if base.is_empty() {
        return reference.to_string();
    }

    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        reference.trim_start_matches('/')
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    base: BasePath,
    suffix: String,
    extension: String,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(BasePath::default())
    }
}

impl PathResolver {
    pub fn new(base: BasePath) -> Self {
        Self {
            base,
            suffix: DEFAULT_SUFFIX.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Sets the annotatable extension, with or without the leading dot.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    pub fn base(&self) -> &BasePath {
        &self.base
    }

    /// Inserts the language suffix before the final extension.
    ///
    /// The extension match ignores ASCII case and the document's own casing
    /// is kept: `Guide.MD` becomes `Guide_en.MD`, not `Guide_en.md`. On a
    /// case-sensitive host the annotation file must therefore use the same
    /// extension casing as its document.
    pub fn rewrite(&self, primary: &str) -> Result<String, ResolveError> {
        let not_annotatable = || ResolveError::NotAnnotatable(primary.to_string());

        let dotted_len = self.extension.len() + 1;
        let split = primary
            .len()
            .checked_sub(dotted_len)
            .ok_or_else(not_annotatable)?;
        let tail = primary.get(split..).ok_or_else(not_annotatable)?;

        let is_match = tail.starts_with('.') && tail[1..].eq_ignore_ascii_case(&self.extension);
        if !is_match {
            return Err(not_annotatable());
        }

        let rewritten = format!("{}{}{}", &primary[..split], self.suffix, tail);
        if rewritten == primary {
            return Err(ResolveError::Unchanged(primary.to_string()));
        }
        Ok(rewritten)
    }

    /// Rewrites `primary` and joins it onto the base path.
    pub fn resolve(&self, primary: &str) -> Result<String, ResolveError> {
        let rewritten = self.rewrite(primary)?;
        Ok(join_base_path(&self.base, &rewritten))
    }
}
