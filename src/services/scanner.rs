use futures::future::join_all;
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use url::Url;
use uuid::Uuid;

use super::{PageFetcher, ScanObserver, TracingObserver};
use crate::checks::{default_checks, Check};
use crate::config::ScanConfig;
use crate::dedup::deduplicate;
use crate::dom::Document;
use crate::error::{AppError, Result};
use crate::models::{AccessibilityIssue, ScanResult};

pub const NO_CONTENT_MESSAGE: &str = "No visible content found to scan";

/// Runs every registered check against fetched pages.
pub struct Scanner {
    checks: Vec<Box<dyn Check>>,
    fetcher: Arc<dyn PageFetcher>,
    observer: Arc<dyn ScanObserver>,
    config: ScanConfig,
    semaphore: Arc<Semaphore>,
    closed: AtomicBool,
}

/// Accepts only absolute URLs with a scheme and a host.
pub fn validate_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| AppError::InvalidUrl(format!("{}: {}", raw, e)))?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(AppError::InvalidUrl(format!("{}: missing host", raw))),
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "check panicked".to_string()
    }
}

impl Scanner {
    pub fn new(
        checks: Vec<Box<dyn Check>>,
        fetcher: Arc<dyn PageFetcher>,
        observer: Arc<dyn ScanObserver>,
        config: ScanConfig,
    ) -> Self {
        let permits = config.max_concurrent_scans.max(1);
        Self {
            checks,
            fetcher,
            observer,
            config,
            semaphore: Arc::new(Semaphore::new(permits)),
            closed: AtomicBool::new(false),
        }
    }

    /// Built-in checks as configured, logging through `tracing`.
    pub fn with_defaults(fetcher: Arc<dyn PageFetcher>, config: ScanConfig) -> Self {
        let checks = default_checks(&config.checks);
        Self::new(checks, fetcher, Arc::new(TracingObserver), config)
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn check_names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    pub fn fetcher_name(&self) -> &'static str {
        self.fetcher.name()
    }

    /// Scans one page. Failures are reported inside the result, never raised.
    pub async fn scan_url(&self, url: &str) -> ScanResult {
        let start = Instant::now();
        let scan_id = Uuid::new_v4().to_string();
        info!(%scan_id, "Scanning {}", url);

        if let Err(e) = validate_url(url) {
            warn!("Rejected {}: {}", url, e);
            return ScanResult::failed(url, e.to_string(), start.elapsed().as_secs_f64())
                .with_metadata("scan_id", scan_id);
        }

        let (fetched, attempts) = self.acquire(url).await;
        let result = match fetched {
            Ok(html) => self.analyze(url, &html, start),
            Err(e) => {
                error!("Failed to acquire {}: {}", url, e);
                ScanResult::failed(url, e.to_string(), start.elapsed().as_secs_f64())
            }
        };

        info!(
            "Scanned {} in {:.2}s: {} issues",
            url,
            result.scan_duration(),
            result.total_issues()
        );

        result
            .with_metadata("scan_id", scan_id)
            .with_metadata("fetcher", self.fetcher.name())
            .with_metadata("fetch_attempts", attempts)
    }

    /// Scans caller-supplied markup without fetching anything.
    pub fn scan_html(&self, url: &str, html: &str) -> ScanResult {
        let start = Instant::now();
        self.analyze(url, html, start)
            .with_metadata("scan_id", Uuid::new_v4().to_string())
            .with_metadata("fetcher", "inline")
            .with_metadata("fetch_attempts", 0)
    }

    /// Scans `urls` with at most `max_concurrent_scans` in flight. Results
    /// come back in input order.
    pub async fn scan_multiple(self: &Arc<Self>, urls: &[String]) -> Vec<ScanResult> {
        if urls.is_empty() {
            return Vec::new();
        }
        info!("Starting scan of {} URLs", urls.len());

        let handles: Vec<_> = urls
            .iter()
            .map(|url| {
                let scanner = Arc::clone(self);
                let semaphore = Arc::clone(&self.semaphore);
                let url = url.clone();
                tokio::spawn(async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => return ScanResult::failed(url, e.to_string(), 0.0),
                    };
                    scanner.scan_url(&url).await
                })
            })
            .collect();

        let results = join_all(handles)
            .await
            .into_iter()
            .zip(urls)
            .map(|(joined, url)| {
                joined.unwrap_or_else(|e| {
                    error!("Scan task for {} aborted: {}", url, e);
                    ScanResult::failed(url.as_str(), format!("Scan task failed: {}", e), 0.0)
                })
            })
            .collect();

        info!("Completed scanning {} URLs", urls.len());
        results
    }

    /// Closes the fetcher. Later calls do nothing.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.fetcher.close().await
    }

    /// Fetches with a per-attempt timeout and exponential backoff between
    /// retryable failures. Returns the outcome and the attempts made.
    async fn acquire(&self, url: &str) -> (Result<String>, u32) {
        let max_attempts = self.config.max_retries + 1;
        let timeout = Duration::from_secs(self.config.timeout);
        let mut attempt = 0;

        loop {
            attempt += 1;
            if attempt > 1 {
                let backoff = self.config.retry_backoff_ms.saturating_mul(1 << (attempt - 2).min(16));
                warn!(
                    "Retrying {} (attempt {}/{}) after {}ms",
                    url, attempt, max_attempts, backoff
                );
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            let outcome = tokio::time::timeout(timeout, self.fetcher.fetch_rendered(url, &self.config))
                .await
                .unwrap_or_else(|_| Err(AppError::Timeout(self.config.timeout)));

            match outcome {
                Ok(html) => return (Ok(html), attempt),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    warn!("Attempt {} for {} failed: {}", attempt, url, e);
                }
                Err(e) => return (Err(e), attempt),
            }
        }
    }

    /// Parses and checks one page. Synchronous: the parsed document never
    /// lives across an await point.
    fn analyze(&self, url: &str, html: &str, start: Instant) -> ScanResult {
        let document = Document::parse(html);
        let title = document.title();
        let description = document.meta_content("description").filter(|d| !d.is_empty());

        if !document.has_visible_content() {
            info!("{}: {}", url, NO_CONTENT_MESSAGE);
            return ScanResult::completed(url, Vec::new(), start.elapsed().as_secs_f64())
                .with_page_info(title, description)
                .with_message(NO_CONTENT_MESSAGE)
                .with_metadata("checks_run", 0)
                .with_metadata("checks_failed", Value::Array(Vec::new()))
                .with_metadata("raw_issue_count", 0);
        }

        let mut raw: Vec<AccessibilityIssue> = Vec::new();
        let mut failed: Vec<Value> = Vec::new();

        for check in &self.checks {
            let name = check.name();
            self.observer.check_started(name, url);

            let outcome = catch_unwind(AssertUnwindSafe(|| check.evaluate(&document, url)))
                .unwrap_or_else(|payload| {
                    Err(AppError::CheckFailed {
                        check: name.to_string(),
                        reason: panic_message(payload),
                    })
                });

            match outcome {
                Ok(issues) => {
                    self.observer.check_completed(name, url, issues.len());
                    raw.extend(issues);
                }
                Err(e) => {
                    self.observer.check_failed(name, url, &e.to_string());
                    failed.push(Value::from(name));
                }
            }
        }

        let raw_count = raw.len();
        let issues = deduplicate(&raw);

        ScanResult::completed(url, issues, start.elapsed().as_secs_f64())
            .with_page_info(title, description)
            .with_metadata("checks_run", self.checks.len())
            .with_metadata("checks_failed", Value::Array(failed))
            .with_metadata("raw_issue_count", raw_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_need_scheme_and_host() {
        assert!(validate_url("https://example.com/page").is_ok());
        assert!(validate_url("example.com").is_err());
        assert!(validate_url("mailto:someone@example.com").is_err());
        assert!(validate_url("").is_err());
    }

    #[test]
    fn panic_payloads_become_messages() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new(String::from("bang"))), "bang");
        assert_eq!(panic_message(Box::new(42)), "check panicked");
    }
}
