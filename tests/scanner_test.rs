mod common;

use pretty_assertions::assert_eq;
use serde_json::Value;
use std::sync::Arc;
use tokio_test::assert_ok;

use a11y_scan_engine::checks::Check;
use a11y_scan_engine::dom::Document;
use a11y_scan_engine::config::ScanConfig;
use a11y_scan_engine::error::{AppError, Result};
use a11y_scan_engine::models::{AccessibilityIssue, IssueKind, ScanStatus, Severity};
use a11y_scan_engine::services::scanner::NO_CONTENT_MESSAGE;

use common::{
    fast_config, scanner_with, scanner_with_checks, FixtureFetcher, RecordingObserver, Route,
    ACCESSIBLE, INACCESSIBLE,
};

struct PanickingCheck;

impl Check for PanickingCheck {
    fn name(&self) -> &'static str {
        "panicking"
    }

    fn evaluate(&self, _document: &Document, _url: &str) -> Result<Vec<AccessibilityIssue>> {
        panic!("selector table corrupted")
    }
}

#[tokio::test]
async fn accessible_page_scores_above_inaccessible_page() {
    let fetcher = Arc::new(
        FixtureFetcher::new()
            .route("https://good.example/", Route::Page(ACCESSIBLE))
            .route("https://bad.example/", Route::Page(INACCESSIBLE)),
    );
    let scanner = scanner_with(fetcher, fast_config());

    let good = scanner.scan_url("https://good.example/").await;
    let bad = scanner.scan_url("https://bad.example/").await;

    assert_eq!(good.status(), ScanStatus::Completed);
    assert_eq!(good.critical_count(), 0);
    assert_eq!(good.page_title(), Some("Riverside Library - Opening Hours"));
    assert!(good.page_description().is_some());

    assert_eq!(bad.status(), ScanStatus::Completed);
    assert!(bad.total_issues() > good.total_issues());
    assert!(bad.accessibility_score() < good.accessibility_score());
    assert!(bad.critical_count() > 0);

    for kind in [
        IssueKind::MissingAltText,
        IssueKind::ImproperHeadingHierarchy,
        IssueKind::MissingFormLabels,
        IssueKind::NonDescriptiveLinks,
        IssueKind::MissingLandmarks,
        IssueKind::PoorColorContrast,
    ] {
        assert!(!bad.issues_by_kind(kind).is_empty(), "expected a {} issue", kind);
    }
}

#[tokio::test]
async fn batch_keeps_input_order_and_isolates_failures() {
    let fetcher = Arc::new(
        FixtureFetcher::new()
            .route("https://one.example/", Route::Page(ACCESSIBLE))
            .route("https://two.example/", Route::Status(404))
            .route("https://three.example/", Route::Page(INACCESSIBLE)),
    );
    let scanner = scanner_with(fetcher, fast_config());

    let urls = vec![
        "https://one.example/".to_string(),
        "https://two.example/".to_string(),
        "https://three.example/".to_string(),
    ];
    let results = scanner.scan_multiple(&urls).await;

    assert_eq!(results.len(), 3);
    for (result, url) in results.iter().zip(&urls) {
        assert_eq!(result.url(), url);
    }
    assert!(results[0].is_success());
    assert_eq!(results[1].status(), ScanStatus::Failed);
    assert_eq!(results[1].error_message(), Some("HTTP 404 returned by target"));
    assert_eq!(results[1].total_issues(), 0);
    assert!(results[2].is_success());
}

#[tokio::test]
async fn empty_batch_returns_nothing() {
    let scanner = scanner_with(Arc::new(FixtureFetcher::new()), fast_config());
    assert!(scanner.scan_multiple(&[]).await.is_empty());
}

#[tokio::test]
async fn invalid_url_fails_without_fetching() {
    let fetcher = Arc::new(FixtureFetcher::new());
    let scanner = scanner_with(Arc::clone(&fetcher), fast_config());

    let result = scanner.scan_url("not a url").await;

    assert_eq!(result.status(), ScanStatus::Failed);
    assert!(result.error_message().unwrap().starts_with("Invalid URL"));
    assert_eq!(fetcher.calls("not a url"), 0);
}

#[tokio::test]
async fn retryable_failures_are_retried() {
    let fetcher = Arc::new(
        FixtureFetcher::new()
            .route("https://flaky.example/", Route::Flaky(2, ACCESSIBLE))
            .route("https://down.example/", Route::Flaky(10, ACCESSIBLE))
            .route("https://gone.example/", Route::Status(410)),
    );
    let scanner = scanner_with(Arc::clone(&fetcher), fast_config());

    let flaky = scanner.scan_url("https://flaky.example/").await;
    assert!(flaky.is_success());
    assert_eq!(flaky.metadata()["fetch_attempts"], Value::from(3));
    assert_eq!(fetcher.calls("https://flaky.example/"), 3);

    let down = scanner.scan_url("https://down.example/").await;
    assert_eq!(down.status(), ScanStatus::Failed);
    assert_eq!(fetcher.calls("https://down.example/"), 3);

    let gone = scanner.scan_url("https://gone.example/").await;
    assert_eq!(gone.status(), ScanStatus::Failed);
    assert_eq!(fetcher.calls("https://gone.example/"), 1);
}

#[tokio::test]
async fn panicking_check_does_not_sink_the_page() {
    let fetcher = Arc::new(
        FixtureFetcher::new().route("https://bad.example/", Route::Page(INACCESSIBLE)),
    );
    let observer = Arc::new(RecordingObserver::default());
    let scanner = scanner_with_checks(
        fetcher,
        vec![Box::new(PanickingCheck)],
        Arc::clone(&observer),
    );

    let result = scanner.scan_url("https://bad.example/").await;

    assert!(result.is_success());
    assert!(result.total_issues() > 0);
    assert_eq!(
        result.metadata()["checks_failed"],
        Value::Array(vec![Value::from("panicking")])
    );

    let events = observer.events();
    assert!(events.contains(&"started:panicking".to_string()));
    assert!(events.contains(&"failed:panicking".to_string()));
    assert!(events.contains(&"completed:alt_text".to_string()));
    assert!(!events.contains(&"completed:panicking".to_string()));
}

#[tokio::test]
async fn page_without_visible_content_reports_message() {
    let fetcher = Arc::new(FixtureFetcher::new().route(
        "https://blank.example/",
        Route::Page("<html><head><title>Loading</title></head><body>   </body></html>"),
    ));
    let scanner = scanner_with(fetcher, fast_config());

    let result = scanner.scan_url("https://blank.example/").await;

    assert!(result.is_success());
    assert_eq!(result.total_issues(), 0);
    assert_eq!(result.message(), Some(NO_CONTENT_MESSAGE));
    assert_eq!(result.accessibility_score(), 100.0);
}

#[test]
fn inline_html_scan_skips_fetching() {
    let fetcher = Arc::new(FixtureFetcher::new());
    let scanner = scanner_with(Arc::clone(&fetcher), fast_config());

    let result = scanner.scan_html("about:blank", INACCESSIBLE);

    assert!(result.is_success());
    assert!(result.critical_count() > 0);
    assert_eq!(result.metadata()["fetcher"], Value::from("inline"));
    assert_eq!(result.metadata()["fetch_attempts"], Value::from(0));
}

#[test]
fn min_severity_filter_drops_lower_issues() {
    let scanner = scanner_with(Arc::new(FixtureFetcher::new()), fast_config());

    let result = scanner.scan_html("about:blank", INACCESSIBLE);
    let critical_only = result.filter_by_severity(Severity::Critical);

    assert_eq!(critical_only.total_issues(), result.critical_count());
    assert!(critical_only
        .issues()
        .iter()
        .all(|i| i.severity() == Severity::Critical));
}

#[tokio::test]
async fn close_is_idempotent() {
    let fetcher = Arc::new(FixtureFetcher::new());
    let scanner = scanner_with(Arc::clone(&fetcher), fast_config());

    assert_ok!(scanner.close().await);
    assert_ok!(scanner.close().await);

    assert_eq!(fetcher.closes(), 1);
}

#[tokio::test]
async fn batch_never_exceeds_concurrency_limit() {
    let urls: Vec<String> = (0..9).map(|i| format!("https://page{}.example/", i)).collect();
    let fetcher = Arc::new(urls.iter().fold(FixtureFetcher::new(), |f, url| {
        f.route(url, Route::Slow(50, ACCESSIBLE))
    }));
    let config = ScanConfig {
        max_concurrent_scans: 3,
        ..fast_config()
    };
    let scanner = scanner_with(Arc::clone(&fetcher), config);

    let results = scanner.scan_multiple(&urls).await;

    assert_eq!(results.len(), 9);
    assert!(results.iter().all(|r| r.is_success()));
    assert!(fetcher.max_in_flight() <= 3);
    assert!(fetcher.max_in_flight() >= 1);
}

#[tokio::test]
async fn timeout_fails_only_the_hanging_url() {
    let fetcher = Arc::new(
        FixtureFetcher::new()
            .route("https://first.example/", Route::Slow(20, ACCESSIBLE))
            .route("https://hang.example/", Route::Hang)
            .route("https://last.example/", Route::Page(INACCESSIBLE)),
    );
    let config = ScanConfig {
        timeout: 1,
        max_retries: 0,
        ..fast_config()
    };
    let scanner = scanner_with(Arc::clone(&fetcher), config);

    let urls = vec![
        "https://first.example/".to_string(),
        "https://hang.example/".to_string(),
        "https://last.example/".to_string(),
    ];
    let results = scanner.scan_multiple(&urls).await;

    for (result, url) in results.iter().zip(&urls) {
        assert_eq!(result.url(), url);
    }
    assert!(results[0].is_success());
    assert_eq!(results[1].status(), ScanStatus::Failed);
    assert_eq!(
        results[1].error_message(),
        Some(AppError::Timeout(1).to_string().as_str())
    );
    assert!(results[2].is_success());
    assert_eq!(fetcher.calls("https://hang.example/"), 1);
}
