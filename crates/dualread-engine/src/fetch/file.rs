use std::path::{Path, PathBuf};

use async_trait::async_trait;
use relative_path::RelativePath;

use super::{Fetch, FetchError, FetchOptions, FetchResponse};
use crate::locator::is_absolute;

/// Loads annotation resources from a directory on disk.
///
/// Locators are read as paths relative to `root`. A missing file is reported
/// as a not-found response rather than an error.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, locator: &str) -> Result<PathBuf, FetchError> {
        if is_absolute(locator) {
            return Err(FetchError::InvalidLocator(locator.to_string()));
        }
        let relative = RelativePath::new(locator.trim_start_matches('/'));
        Ok(relative.to_path(&self.root))
    }
}

#[async_trait]
impl Fetch for FileFetcher {
    async fn fetch(
        &self,
        locator: &str,
        _options: &FetchOptions,
    ) -> Result<FetchResponse, FetchError> {
        let path = self.path_for(locator)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Ok(FetchResponse::ok(body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FetchResponse::not_found()),
            Err(e) => Err(FetchError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn notes_dir() -> TempDir {
        TempDir::new().expect("Failed to create temp directory")
    }

    #[tokio::test]
    async fn reads_existing_file() {
        let dir = notes_dir();
        std::fs::create_dir_all(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/guide_en.md"), "Hello\n\nWorld").unwrap();

        let fetcher = FileFetcher::new(dir.path());
        let response = fetcher
            .fetch("docs/guide_en.md", &FetchOptions::default())
            .await
            .unwrap();

        assert!(response.is_success());
        assert_eq!(response.text(), "Hello\n\nWorld");
    }

    #[tokio::test]
    async fn leading_slash_is_relative_to_root() {
        let dir = notes_dir();
        std::fs::write(dir.path().join("a_en.md"), "A").unwrap();

        let response = FileFetcher::new(dir.path())
            .fetch("/a_en.md", &FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(response.text(), "A");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = notes_dir();
        let response = FileFetcher::new(dir.path())
            .fetch("missing_en.md", &FetchOptions::default())
            .await
            .unwrap();

        assert!(response.is_not_found());
    }

    #[tokio::test]
    async fn urls_are_rejected() {
        let dir = notes_dir();
        let result = FileFetcher::new(dir.path())
            .fetch("https://example.com/a_en.md", &FetchOptions::default())
            .await;

        assert!(matches!(result, Err(FetchError::InvalidLocator(_))));
    }

    #[tokio::test]
    async fn directory_is_an_io_error() {
        let dir = notes_dir();
        std::fs::create_dir_all(dir.path().join("folder_en.md")).unwrap();

        let result = FileFetcher::new(dir.path())
            .fetch("folder_en.md", &FetchOptions::default())
            .await;

        assert!(matches!(result, Err(FetchError::Io(_))));
    }
}
