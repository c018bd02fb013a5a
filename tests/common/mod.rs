#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use a11y_scan_engine::checks::{default_checks, Check};
use a11y_scan_engine::config::ScanConfig;
use a11y_scan_engine::error::{AppError, Result};
use a11y_scan_engine::services::{PageFetcher, ScanObserver, Scanner};

pub const ACCESSIBLE: &str = include_str!("../fixtures/accessible.html");
pub const INACCESSIBLE: &str = include_str!("../fixtures/inaccessible.html");

/// What the fixture fetcher does for one URL.
pub enum Route {
    Page(&'static str),
    /// Fails with a retryable error this many times, then serves the page.
    Flaky(usize, &'static str),
    Status(u16),
    /// Serves the page after a delay in milliseconds.
    Slow(u64, &'static str),
    /// Never answers.
    Hang,
}

/// Decrements the in-flight counter when a fetch ends or is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Serves canned pages keyed by URL and counts every call.
#[derive(Default)]
pub struct FixtureFetcher {
    routes: HashMap<String, Route>,
    calls: Mutex<HashMap<String, usize>>,
    closes: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url: &str, route: Route) -> Self {
        self.routes.insert(url.to_string(), route);
        self
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Highest number of fetches observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for FixtureFetcher {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn fetch_rendered(&self, url: &str, _options: &ScanConfig) -> Result<String> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        match self.routes.get(url) {
            Some(Route::Page(html)) => Ok(html.to_string()),
            Some(Route::Flaky(failures, html)) => {
                if call <= *failures {
                    Err(AppError::FetchError("connection reset".to_string()))
                } else {
                    Ok(html.to_string())
                }
            }
            Some(Route::Status(code)) => Err(AppError::HttpStatus(*code)),
            Some(Route::Slow(ms, html)) => {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
                Ok(html.to_string())
            }
            Some(Route::Hang) => std::future::pending().await,
            None => Err(AppError::HttpStatus(404)),
        }
    }

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Records observer callbacks as `event:check` strings.
#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl ScanObserver for RecordingObserver {
    fn check_started(&self, check: &str, _url: &str) {
        self.events.lock().unwrap().push(format!("started:{}", check));
    }

    fn check_completed(&self, check: &str, _url: &str, _issue_count: usize) {
        self.events.lock().unwrap().push(format!("completed:{}", check));
    }

    fn check_failed(&self, check: &str, _url: &str, _error: &str) {
        self.events.lock().unwrap().push(format!("failed:{}", check));
    }
}

/// Scan options that never sleep between retries.
pub fn fast_config() -> ScanConfig {
    ScanConfig {
        timeout: 5,
        max_retries: 2,
        retry_backoff_ms: 0,
        max_concurrent_scans: 2,
        ..ScanConfig::default()
    }
}

pub fn scanner_with(fetcher: Arc<FixtureFetcher>, config: ScanConfig) -> Arc<Scanner> {
    Arc::new(Scanner::with_defaults(fetcher, config))
}

pub fn scanner_with_checks(
    fetcher: Arc<FixtureFetcher>,
    extra: Vec<Box<dyn Check>>,
    observer: Arc<RecordingObserver>,
) -> Arc<Scanner> {
    let config = fast_config();
    let mut checks = default_checks(&config.checks);
    checks.extend(extra);
    Arc::new(Scanner::new(checks, fetcher, observer, config))
}
