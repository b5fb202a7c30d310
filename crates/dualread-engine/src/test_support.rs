use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, Once};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::fetch::{Fetch, FetchError, FetchOptions, FetchResponse};

/// In-memory fetcher that records how it was called.
///
/// Unknown locators answer 404.
#[derive(Debug, Default)]
pub struct StubFetcher {
    responses: HashMap<String, FetchResponse>,
    errors: HashSet<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_options: Mutex<Option<FetchOptions>>,
}

impl StubFetcher {
    pub fn with_text(mut self, locator: &str, text: &str) -> Self {
        self.responses
            .insert(locator.to_string(), FetchResponse::ok(text));
        self
    }

    pub fn with_status(mut self, locator: &str, status: u16) -> Self {
        self.responses
            .insert(locator.to_string(), FetchResponse::new(status, ""));
        self
    }

    pub fn with_error(mut self, locator: &str) -> Self {
        self.errors.insert(locator.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<FetchOptions> {
        self.last_options.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetch for StubFetcher {
    async fn fetch(
        &self,
        locator: &str,
        options: &FetchOptions,
    ) -> Result<FetchResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock().unwrap() = Some(options.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.errors.contains(locator) {
            return Err(FetchError::Io(std::io::Error::other("connection reset")));
        }

        Ok(self
            .responses
            .get(locator)
            .cloned()
            .unwrap_or_else(FetchResponse::not_found))
    }
}

thread_local! {
    static CAPTURED: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
}

/// Records log lines per thread so parallel tests do not see each other.
///
/// `#[tokio::test]` runs spawned tasks on the test thread, so records from
/// cache loads land in the test's own buffer.
struct ThreadLogger;

impl Log for ThreadLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        CAPTURED.with(|captured| {
            captured
                .borrow_mut()
                .push((record.level(), record.args().to_string()))
        });
    }

    fn flush(&self) {}
}

static LOGGER: ThreadLogger = ThreadLogger;

/// Handle over the current thread's captured log lines.
#[derive(Debug)]
pub struct LogCapture(());

/// Installs the capturing logger once per process and clears this thread's buffer.
pub fn capture_logs() -> LogCapture {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        log::set_logger(&LOGGER).expect("another logger is already installed");
        log::set_max_level(LevelFilter::Trace);
    });
    CAPTURED.with(|captured| captured.borrow_mut().clear());
    LogCapture(())
}

impl LogCapture {
    pub fn at(&self, level: Level) -> Vec<String> {
        CAPTURED.with(|captured| {
            captured
                .borrow()
                .iter()
                .filter(|(l, _)| *l == level)
                .map(|(_, message)| message.clone())
                .collect()
        })
    }

    pub fn warnings(&self) -> Vec<String> {
        self.at(Level::Warn)
    }

    pub fn errors(&self) -> Vec<String> {
        self.at(Level::Error)
    }
}
