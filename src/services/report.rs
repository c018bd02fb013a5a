//! Projections of scan results for export. JSON keeps everything; CSV and
//! text drop detail but never change a count, score or duration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};

use crate::error::{AppError, Result};
use crate::models::{ScanResult, ScanStatus, ScanSummary};

const TOP_PAGES: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub summary: ScanSummary,
    pub results: Vec<ScanResult>,
}

impl Report {
    pub fn new(results: Vec<ScanResult>) -> Self {
        Self {
            generated_at: Utc::now(),
            summary: ScanSummary::from_results(&results),
            results,
        }
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    url: &'a str,
    status: ScanStatus,
    timestamp: String,
    total_issues: usize,
    critical_issues: usize,
    moderate_issues: usize,
    low_issues: usize,
    accessibility_score: f64,
    scan_duration: f64,
    page_title: &'a str,
    error_message: &'a str,
}

pub fn to_json(results: &[ScanResult]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&Report::new(results.to_vec()))?)
}

pub fn from_json(json: &str) -> Result<Report> {
    Ok(serde_json::from_str(json)?)
}

/// One row per page.
pub fn to_csv(results: &[ScanResult]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for result in results {
        writer.serialize(CsvRow {
            url: result.url(),
            status: result.status(),
            timestamp: result.timestamp().to_rfc3339(),
            total_issues: result.total_issues(),
            critical_issues: result.critical_count(),
            moderate_issues: result.moderate_count(),
            low_issues: result.low_count(),
            accessibility_score: result.accessibility_score(),
            scan_duration: result.scan_duration(),
            page_title: result.page_title().unwrap_or_default(),
            error_message: result.error_message().unwrap_or_default(),
        })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AppError::Export(e.to_string()))
}

/// Plain-text overview with the pages that have the most issues.
pub fn to_text(results: &[ScanResult]) -> Result<String> {
    let mut out = String::new();
    write_text(&mut out, results).map_err(|e| AppError::Export(e.to_string()))?;
    Ok(out)
}

fn write_text(out: &mut String, results: &[ScanResult]) -> fmt::Result {
    let summary = ScanSummary::from_results(results);

    writeln!(out, "Accessibility Scan Report")?;
    writeln!(out, "=========================")?;
    writeln!(out, "Pages scanned:    {}", summary.total_scans)?;
    writeln!(out, "Successful:       {}", summary.successful_scans)?;
    writeln!(out, "Failed:           {}", summary.failed_scans)?;
    writeln!(out, "Total issues:     {}", summary.total_issues)?;
    writeln!(out, "  Critical:       {}", summary.critical_issues)?;
    writeln!(out, "  Moderate:       {}", summary.moderate_issues)?;
    writeln!(out, "  Low:            {}", summary.low_issues)?;
    writeln!(out, "Average score:    {}", summary.average_score)?;
    writeln!(out, "Total scan time:  {}s", summary.total_scan_duration)?;

    let mut ranked: Vec<&ScanResult> = results.iter().filter(|r| r.is_success()).collect();
    ranked.sort_by(|a, b| b.total_issues().cmp(&a.total_issues()));

    if !ranked.is_empty() {
        writeln!(out)?;
        writeln!(out, "Pages with the most issues")?;
        writeln!(out, "--------------------------")?;
        for (rank, result) in ranked.iter().take(TOP_PAGES).enumerate() {
            writeln!(
                out,
                "{}. {} - {} issues (critical {}, moderate {}, low {}), score {}",
                rank + 1,
                result.url(),
                result.total_issues(),
                result.critical_count(),
                result.moderate_count(),
                result.low_count(),
                result.accessibility_score()
            )?;
        }
    }

    let failed: Vec<&ScanResult> = results.iter().filter(|r| !r.is_success()).collect();
    if !failed.is_empty() {
        writeln!(out)?;
        writeln!(out, "Failed scans")?;
        writeln!(out, "------------")?;
        for result in failed {
            writeln!(
                out,
                "- {}: {}",
                result.url(),
                result.error_message().unwrap_or("unknown error")
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccessibilityIssue, IssueKind, Severity};
    use pretty_assertions::assert_eq;

    fn page(url: &str, severities: &[Severity]) -> ScanResult {
        let issues = severities
            .iter()
            .map(|s| {
                AccessibilityIssue::draft(IssueKind::Other, *s)
                    .description("Problem")
                    .element("<div>")
                    .suggested_fix("Fix")
                    .build()
                    .unwrap()
            })
            .collect();
        ScanResult::completed(url, issues, 0.25)
    }

    fn sample() -> Vec<ScanResult> {
        vec![
            page("https://a.example/", &[Severity::Low]),
            ScanResult::failed("https://b.example/", "HTTP 503 returned by target", 0.5),
            page("https://c.example/", &[Severity::Critical, Severity::Moderate]),
        ]
    }

    #[test]
    fn json_report_round_trips() {
        let results = sample();
        let report = from_json(&to_json(&results).unwrap()).unwrap();

        assert_eq!(report.summary, ScanSummary::from_results(&results));
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.results[2].accessibility_score(), results[2].accessibility_score());
    }

    #[test]
    fn csv_has_one_row_per_page() {
        let csv = to_csv(&sample()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("url,status,timestamp,total_issues"));
        assert!(lines[1].starts_with("https://a.example/,completed,"));
        assert!(lines[1].contains(",1,0,0,1,66.7,0.25,"));
        assert!(lines[2].contains("HTTP 503 returned by target"));
    }

    #[test]
    fn text_ranks_pages_by_issue_count() {
        let text = to_text(&sample()).unwrap();

        assert!(text.contains("Pages scanned:    3"));
        assert!(text.contains("Average score:    41.7"));
        let c = text.find("1. https://c.example/").unwrap();
        let a = text.find("2. https://a.example/").unwrap();
        assert!(c < a);
        assert!(text.contains("- https://b.example/: HTTP 503 returned by target"));
    }
}
