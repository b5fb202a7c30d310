pub mod cache;
pub mod classify;
pub mod fetch;
pub mod locator;
pub mod merge;
pub mod pipeline;
pub mod segment;

#[cfg(test)]
pub mod test_support;

// Re-export key types for easier usage
pub use cache::{CacheStats, ResourceCache};
pub use classify::{Classifier, Eligibility, ExclusionRule, is_eligible};
pub use fetch::{CacheMode, Fetch, FetchError, FetchOptions, FetchResponse, FileFetcher, HttpFetcher};
pub use locator::{BasePath, PathResolver, ResolveError};
pub use merge::{MergeError, MergeOutcome, Merger, merge};
pub use pipeline::{DualRead, HookStage, Route, Settings};
pub use segment::{Segment, segment_exact, segment_units};
