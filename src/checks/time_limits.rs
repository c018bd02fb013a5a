use super::Check;
use crate::dom::Document;
use crate::error::Result;
use crate::models::{AccessibilityIssue, IssueKind, Severity};

const TIMEOUT_PHRASES: &[&str] = &[
    "session will expire",
    "session timeout",
    "auto logout",
    "auto-logout",
    "log out in",
    "timed out",
    "expires in",
];

pub struct TimeLimitCheck;

/// Delay in seconds from a refresh `content` value such as `"5; url=/next"`.
fn refresh_delay(content: &str) -> Option<f64> {
    content
        .split([';', ','])
        .next()
        .and_then(|delay| delay.trim().parse::<f64>().ok())
}

impl Check for TimeLimitCheck {
    fn name(&self) -> &'static str {
        "time_limits"
    }

    fn evaluate(&self, document: &Document, _url: &str) -> Result<Vec<AccessibilityIssue>> {
        let mut issues = Vec::new();

        for meta in document.find_by_tag(&["meta"]) {
            if meta.attr_lower("http-equiv").as_deref() != Some("refresh") {
                continue;
            }
            let content = meta.attr("content").unwrap_or_default().trim();
            // An immediate redirect imposes no time limit.
            let delay = refresh_delay(content).unwrap_or(0.0);
            if delay <= 0.0 {
                continue;
            }
            issues.push(
                meta.issue(IssueKind::Other, Severity::Moderate)
                    .description("Page uses meta refresh (time-limited refresh/redirect).")
                    .suggested_fix(
                        "Remove the timed meta refresh; let users trigger navigation or extend the time.",
                    )
                    .wcag(&["2.2.1", "2.2.4"])
                    .meta("content", content)
                    .meta("delay_seconds", delay)
                    .build()?,
            );
        }

        let text = document.visible_text().to_lowercase();
        if let Some(phrase) = TIMEOUT_PHRASES.iter().find(|p| text.contains(*p)) {
            issues.push(
                AccessibilityIssue::draft(IssueKind::Other, Severity::Low)
                    .description("Page mentions session timeout; verify extend-time or save controls are provided.")
                    .element("<body>")
                    .context("document body")
                    .suggested_fix("Offer a way to extend the time limit, save progress, or turn the limit off.")
                    .wcag(&["2.2.1"])
                    .meta("phrase", *phrase)
                    .build()?,
            );
        }

        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::{descriptions, run};
    use pretty_assertions::assert_eq;

    #[test]
    fn timed_refresh_is_flagged() {
        let html = r#"<html><head><meta http-equiv="Refresh" content="30; url=/next"></head><body><p>x</p></body></html>"#;
        let issues = run(&TimeLimitCheck, html);
        assert_eq!(
            descriptions(&issues),
            vec!["Page uses meta refresh (time-limited refresh/redirect)."]
        );
        assert_eq!(issues[0].metadata()["delay_seconds"], 30.0);
    }

    #[test]
    fn immediate_redirect_is_ignored() {
        let html = r#"<html><head><meta http-equiv="refresh" content="0; url=/next"></head><body><p>x</p></body></html>"#;
        assert!(run(&TimeLimitCheck, html).is_empty());
    }

    #[test]
    fn timeout_warning_text_is_low() {
        let html = "<html><body><p>Your session will expire in 2 minutes.</p></body></html>";
        let issues = run(&TimeLimitCheck, html);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity(), Severity::Low);
    }
}
