use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use super::issue::{AccessibilityIssue, IssueKind, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Completed,
    Failed,
}

/// Outcome of scanning one page. Counts and the score are derived from
/// `issues` on every call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScanResult {
    url: String,
    timestamp: DateTime<Utc>,
    status: ScanStatus,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    page_title: Option<String>,
    #[serde(default)]
    page_description: Option<String>,
    #[serde(default)]
    issues: Vec<AccessibilityIssue>,
    /// Seconds.
    scan_duration: f64,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl ScanResult {
    pub fn completed(url: impl Into<String>, issues: Vec<AccessibilityIssue>, scan_duration: f64) -> Self {
        Self {
            url: url.into(),
            timestamp: Utc::now(),
            status: ScanStatus::Completed,
            error_message: None,
            message: None,
            page_title: None,
            page_description: None,
            issues,
            scan_duration,
            metadata: Map::new(),
        }
    }

    pub fn failed(url: impl Into<String>, error_message: impl Into<String>, scan_duration: f64) -> Self {
        Self {
            url: url.into(),
            timestamp: Utc::now(),
            status: ScanStatus::Failed,
            error_message: Some(error_message.into()),
            message: None,
            page_title: None,
            page_description: None,
            issues: Vec::new(),
            scan_duration,
            metadata: Map::new(),
        }
    }

    pub fn with_page_info(mut self, title: Option<String>, description: Option<String>) -> Self {
        self.page_title = title;
        self.page_description = description;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn status(&self) -> ScanStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == ScanStatus::Completed
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn page_title(&self) -> Option<&str> {
        self.page_title.as_deref()
    }

    pub fn page_description(&self) -> Option<&str> {
        self.page_description.as_deref()
    }

    pub fn issues(&self) -> &[AccessibilityIssue] {
        &self.issues
    }

    pub fn scan_duration(&self) -> f64 {
        self.scan_duration
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn domain(&self) -> Option<String> {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity() == severity).count()
    }

    pub fn critical_count(&self) -> usize {
        self.count(Severity::Critical)
    }

    pub fn moderate_count(&self) -> usize {
        self.count(Severity::Moderate)
    }

    pub fn low_count(&self) -> usize {
        self.count(Severity::Low)
    }

    pub fn total_issues(&self) -> usize {
        self.issues.len()
    }

    /// 100 for a clean page, otherwise 100 minus the severity-weighted share
    /// of the worst case (every issue critical), rounded to one decimal.
    pub fn accessibility_score(&self) -> f64 {
        if self.issues.is_empty() {
            return 100.0;
        }

        let weighted: u32 = self.issues.iter().map(|i| i.severity().weight()).sum();
        let max_weight = (self.issues.len() as u32) * Severity::Critical.weight();
        let score = 100.0 - 100.0 * f64::from(weighted) / f64::from(max_weight);

        round1(score.max(0.0))
    }

    pub fn issues_by_severity(&self, severity: Severity) -> Vec<&AccessibilityIssue> {
        self.issues.iter().filter(|i| i.severity() == severity).collect()
    }

    pub fn issues_by_kind(&self, kind: IssueKind) -> Vec<&AccessibilityIssue> {
        self.issues.iter().filter(|i| i.kind() == kind).collect()
    }

    /// Copy of this result keeping only issues at or above `min`.
    pub fn filter_by_severity(&self, min: Severity) -> ScanResult {
        ScanResult {
            issues: self
                .issues
                .iter()
                .filter(|i| i.severity() >= min)
                .cloned()
                .collect(),
            ..self.clone()
        }
    }
}

/// Applies [`ScanResult::filter_by_severity`] to every result. Failed
/// results pass through unchanged so batch positions stay aligned.
pub fn filter_by_severity(results: &[ScanResult], min: Severity) -> Vec<ScanResult> {
    results.iter().map(|r| r.filter_by_severity(min)).collect()
}

#[derive(Serialize)]
struct ResultSummary {
    total_issues: usize,
    critical_issues: usize,
    moderate_issues: usize,
    low_issues: usize,
    accessibility_score: f64,
}

impl Serialize for ScanResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ScanResult", 11)?;
        state.serialize_field("url", &self.url)?;
        state.serialize_field("timestamp", &self.timestamp)?;
        state.serialize_field("status", &self.status)?;
        state.serialize_field("error_message", &self.error_message)?;
        state.serialize_field("message", &self.message)?;
        state.serialize_field("page_title", &self.page_title)?;
        state.serialize_field("page_description", &self.page_description)?;
        state.serialize_field("issues", &self.issues)?;
        state.serialize_field("scan_duration", &self.scan_duration)?;
        state.serialize_field("metadata", &self.metadata)?;
        state.serialize_field(
            "summary",
            &ResultSummary {
                total_issues: self.total_issues(),
                critical_issues: self.critical_count(),
                moderate_issues: self.moderate_count(),
                low_issues: self.low_count(),
                accessibility_score: self.accessibility_score(),
            },
        )?;
        state.end()
    }
}

/// Batch-level projection; always recomputable from the results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total_scans: usize,
    pub successful_scans: usize,
    pub failed_scans: usize,
    pub total_issues: usize,
    pub critical_issues: usize,
    pub moderate_issues: usize,
    pub low_issues: usize,
    /// Mean score over successful scans only.
    pub average_score: f64,
    /// Seconds, failed scans included.
    pub total_scan_duration: f64,
}

impl ScanSummary {
    pub fn from_results(results: &[ScanResult]) -> Self {
        let successful: Vec<&ScanResult> = results.iter().filter(|r| r.is_success()).collect();

        let average_score = if successful.is_empty() {
            0.0
        } else {
            let total: f64 = successful.iter().map(|r| r.accessibility_score()).sum();
            round1(total / successful.len() as f64)
        };

        ScanSummary {
            total_scans: results.len(),
            successful_scans: successful.len(),
            failed_scans: results.len() - successful.len(),
            total_issues: results.iter().map(ScanResult::total_issues).sum(),
            critical_issues: results.iter().map(ScanResult::critical_count).sum(),
            moderate_issues: results.iter().map(ScanResult::moderate_count).sum(),
            low_issues: results.iter().map(ScanResult::low_count).sum(),
            average_score,
            total_scan_duration: results.iter().map(ScanResult::scan_duration).sum(),
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn issue(severity: Severity) -> AccessibilityIssue {
        AccessibilityIssue::draft(IssueKind::Other, severity)
            .description("Something is wrong")
            .element("<div>")
            .suggested_fix("Fix it")
            .build()
            .unwrap()
    }

    fn result_with(severities: &[Severity]) -> ScanResult {
        let issues = severities.iter().map(|s| issue(*s)).collect();
        ScanResult::completed("https://example.com/page", issues, 1.5)
    }

    #[test]
    fn clean_page_scores_100() {
        let result = result_with(&[]);
        assert_eq!(result.accessibility_score(), 100.0);
        assert_eq!(result.total_issues(), 0);
    }

    #[test]
    fn score_follows_severity_mix() {
        use Severity::*;
        assert_eq!(result_with(&[Critical, Critical]).accessibility_score(), 0.0);
        assert_eq!(result_with(&[Low]).accessibility_score(), 66.7);
        assert_eq!(result_with(&[Moderate]).accessibility_score(), 33.3);
        // 6 of a possible 9 weight points
        assert_eq!(result_with(&[Critical, Moderate, Low]).accessibility_score(), 33.3);
    }

    #[test]
    fn score_never_increases_when_issues_get_worse() {
        use Severity::*;
        let mild = result_with(&[Low, Low, Moderate]).accessibility_score();
        let worse = result_with(&[Low, Moderate, Moderate]).accessibility_score();
        let worst = result_with(&[Critical, Moderate, Moderate]).accessibility_score();
        assert!(mild >= worse);
        assert!(worse >= worst);
        assert!(worst < 100.0);
    }

    #[test]
    fn json_round_trip_keeps_derived_values() {
        use Severity::*;
        let result = result_with(&[Critical, Moderate, Low, Low])
            .with_page_info(Some("Home".into()), None)
            .with_metadata("scan_id", "abc");
        let json = serde_json::to_string(&result).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["summary"]["total_issues"], 4);
        assert_eq!(value["summary"]["low_issues"], 2);

        let back: ScanResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.total_issues(), result.total_issues());
        assert_eq!(back.accessibility_score(), result.accessibility_score());
        assert_eq!(back.critical_count(), 1);
        assert_eq!(back.moderate_count(), 1);
        assert_eq!(back.low_count(), 2);
        assert_eq!(back, result);
    }

    #[test]
    fn filter_returns_new_results() {
        use Severity::*;
        let original = result_with(&[Critical, Moderate, Low]);
        let failed = ScanResult::failed("https://down.example", "HTTP 500", 0.2);
        let filtered = filter_by_severity(&[original.clone(), failed], Moderate);

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].total_issues(), 2);
        assert_eq!(original.total_issues(), 3);
        assert!(!filtered[1].is_success());
    }

    #[test]
    fn summary_averages_successful_only() {
        use Severity::*;
        let results = vec![
            result_with(&[]),
            result_with(&[Critical]),
            ScanResult::failed("https://down.example", "timeout", 30.0),
        ];
        let summary = ScanSummary::from_results(&results);
        assert_eq!(summary.total_scans, 3);
        assert_eq!(summary.successful_scans, 2);
        assert_eq!(summary.failed_scans, 1);
        assert_eq!(summary.critical_issues, 1);
        assert_eq!(summary.average_score, 50.0);
        assert_eq!(summary.total_scan_duration, 33.0);
    }

    #[test]
    fn summary_of_failures_only() {
        let summary = ScanSummary::from_results(&[ScanResult::failed("x", "bad", 1.0)]);
        assert_eq!(summary.average_score, 0.0);
        assert_eq!(summary.total_scan_duration, 1.0);
    }

    #[test]
    fn domain_from_url() {
        assert_eq!(result_with(&[]).domain().as_deref(), Some("example.com"));
    }
}
