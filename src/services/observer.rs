use tracing::{debug, warn};

/// Receives per-check progress from the scanner.
///
/// Injected into [`Scanner`](super::Scanner) so tests can record events and
/// services can route them wherever they like.
pub trait ScanObserver: Send + Sync {
    fn check_started(&self, check: &str, url: &str);

    fn check_completed(&self, check: &str, url: &str, issue_count: usize);

    fn check_failed(&self, check: &str, url: &str, error: &str);
}

/// Emits check progress as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ScanObserver for TracingObserver {
    fn check_started(&self, check: &str, url: &str) {
        debug!(check, url, "Running check");
    }

    fn check_completed(&self, check: &str, url: &str, issue_count: usize) {
        debug!(check, url, issues = issue_count, "Check completed");
    }

    fn check_failed(&self, check: &str, url: &str, error: &str) {
        warn!(check, url, error, "Check failed, its issues are dropped for this page");
    }
}
