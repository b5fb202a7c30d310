//! # Annotation Resource Cache
//!
//! Fetches annotation text once per locator and keeps the settled value for
//! the lifetime of the cache, including "absent" outcomes.
//!
//! Each locator owns a `watch` slot. The first `get` creates the slot and
//! spawns the fetch on its own task; every other caller, concurrent or later,
//! waits on the same slot. Because the fetch is not tied to any caller it
//! settles and populates the cache even if the caller that started it went
//! away. Requires a running tokio runtime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use crate::fetch::{Fetch, FetchError, FetchOptions};

/// `None` while pending, `Some(None)` for absent or failed, `Some(Some(text))` when loaded.
type Slot = watch::Receiver<Option<Option<String>>>;

/// Counters describing cache behaviour.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Fetches started.
    fetches: AtomicU64,
    /// Lookups served by an existing entry, pending or settled.
    hits: AtomicU64,
    /// Fetches that failed for a reason other than not found.
    failures: AtomicU64,
}

impl CacheStats {
    pub fn fetches(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

pub struct ResourceCache<F> {
    fetcher: Arc<F>,
    options: FetchOptions,
    entries: Mutex<HashMap<String, Slot>>,
    stats: Arc<CacheStats>,
}

impl<F> std::fmt::Debug for ResourceCache<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("options", &self.options)
            .field("entries", &self.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl<F: Fetch + 'static> ResourceCache<F> {
    pub fn new(fetcher: F, options: FetchOptions) -> Self {
        Self::from_arc(Arc::new(fetcher), options)
    }

    pub fn from_arc(fetcher: Arc<F>, options: FetchOptions) -> Self {
        Self {
            fetcher,
            options,
            entries: Mutex::new(HashMap::new()),
            stats: Arc::new(CacheStats::default()),
        }
    }

    /// Returns the annotation text for `locator`, or `None` when it does not
    /// exist or could not be loaded. Never fails.
    pub async fn get(&self, locator: &str) -> Option<String> {
        let mut slot = self.slot(locator);
        match slot.wait_for(Option::is_some).await {
            Ok(value) => value.clone().flatten(),
            Err(_) => {
                log::warn!("Annotation fetch for {locator} ended without a result");
                None
            }
        }
    }

    /// Looks up the slot for `locator`, creating it and starting the fetch on
    /// first use. The lock is released before anything is awaited.
    fn slot(&self, locator: &str) -> Slot {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = entries.get(locator) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return slot.clone();
        }

        let (tx, rx) = watch::channel(None);
        entries.insert(locator.to_string(), rx.clone());
        drop(entries);

        self.stats.fetches.fetch_add(1, Ordering::Relaxed);
        let fetcher = Arc::clone(&self.fetcher);
        let options = self.options.clone();
        let stats = Arc::clone(&self.stats);
        let locator = locator.to_string();

        tokio::spawn(async move {
            let value = load(fetcher.as_ref(), &locator, &options, &stats).await;
            tx.send_replace(Some(value));
        });

        rx
    }
}

impl<F> ResourceCache<F> {
    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Number of locators seen so far.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The settled value for `locator`, or `None` if unknown or still pending.
    pub fn peek(&self, locator: &str) -> Option<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(locator).and_then(|slot| slot.borrow().clone())
    }
}

async fn load<F: Fetch + ?Sized>(
    fetcher: &F,
    locator: &str,
    options: &FetchOptions,
    stats: &CacheStats,
) -> Option<String> {
    let error = match fetcher.fetch(locator, options).await {
        Ok(response) if response.is_success() => return Some(response.into_text()),
        Ok(response) if response.is_not_found() => {
            log::debug!("No annotation file at {locator}");
            return None;
        }
        Ok(response) => FetchError::Status(response.status),
        Err(e) => e,
    };

    stats.failures.fetch_add(1, Ordering::Relaxed);
    log::warn!("Failed to load annotation file {locator}: {error}");
    None
}
