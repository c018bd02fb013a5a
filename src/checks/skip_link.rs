use std::collections::HashSet;

use super::Check;
use crate::dom::{Document, Element};
use crate::error::Result;
use crate::models::{AccessibilityIssue, IssueKind, Severity};

const WCAG: &[&str] = &["2.4.1"];

/// Ids conventionally given to the main content region.
const MAIN_IDS: &[&str] = &["main", "content", "primary", "maincontent", "primarycontent"];

/// Anchors that look like a "skip to content" link, in document order.
pub(crate) fn skip_link_candidates(document: &Document) -> Vec<Element<'_>> {
    document
        .find_by_tag(&["a"])
        .into_iter()
        .filter(|a| {
            let text = a.text().to_lowercase();
            let href = a.attr_lower("href").unwrap_or_default();
            let rel = a.attr_lower("rel").unwrap_or_default();
            let skip_class = a.classes().iter().any(|c| c.to_lowercase().contains("skip"));
            text.contains("skip")
                || href.contains("skip")
                || rel.contains("skip")
                || skip_class
                || a.attr_lower("role").as_deref() == Some("skiplink")
        })
        .collect()
}

/// Page ids, lowercased for case-insensitive matching.
fn target_ids(document: &Document) -> HashSet<String> {
    document.ids().map(str::to_lowercase).collect()
}

pub struct SkipLinkCheck;

impl Check for SkipLinkCheck {
    fn name(&self) -> &'static str {
        "skip_link"
    }

    fn evaluate(&self, document: &Document, _url: &str) -> Result<Vec<AccessibilityIssue>> {
        let candidates = skip_link_candidates(document);

        let Some(first) = candidates.first() else {
            let issue = AccessibilityIssue::draft(IssueKind::MissingSkipLinks, Severity::Low)
                .description("No 'Skip to main content' link found.")
                .element("<a>")
                .context("document head/body")
                .suggested_fix(
                    "Add a skip link as the first focusable element, pointing at #main or the \
                     main region, and make it visible on focus.",
                )
                .wcag(WCAG)
                .meta("common_targets", MAIN_IDS)
                .build()?;
            return Ok(vec![issue]);
        };

        let ids = target_ids(document);
        let valid = candidates.iter().any(|a| {
            a.attr("href")
                .and_then(|href| href.strip_prefix('#'))
                .filter(|target| !target.is_empty())
                .map(|target| ids.contains(&target.to_lowercase()))
                .unwrap_or(false)
        });

        if valid {
            return Ok(Vec::new());
        }

        let issue = first
            .issue(IssueKind::MissingSkipLinks, Severity::Moderate)
            .description("Skip link present but target is missing or invalid.")
            .suggested_fix("Point the skip link href at an id that exists on the main content, e.g. #main.")
            .wcag(WCAG)
            .build()?;
        Ok(vec![issue])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::{descriptions, run};

    #[test]
    fn valid_skip_link_passes() {
        let html = r##"<html><body><a href="#Main">Skip to content</a><main id="main">x</main></body></html>"##;
        assert!(run(&SkipLinkCheck, html).is_empty());
    }

    #[test]
    fn missing_skip_link_is_low() {
        let issues = run(&SkipLinkCheck, r#"<html><body><a href="/about">About</a></body></html>"#);
        assert_eq!(descriptions(&issues), vec!["No 'Skip to main content' link found."]);
        assert_eq!(issues[0].severity(), Severity::Low);
    }

    #[test]
    fn target_ids_cover_every_element_once() {
        let doc = Document::parse(
            r#"<html><body><nav id="Menu"></nav><main id="main"><p id="intro">x</p></main></body></html>"#,
        );
        let mut ids: Vec<String> = target_ids(&doc).into_iter().collect();
        ids.sort();
        assert_eq!(ids, vec!["intro", "main", "menu"]);
    }

    #[test]
    fn dangling_target_is_moderate() {
        let html = r##"<html><body><a class="skip-link" href="#nowhere">Jump</a><main>x</main></body></html>"##;
        let issues = run(&SkipLinkCheck, html);
        assert_eq!(
            descriptions(&issues),
            vec!["Skip link present but target is missing or invalid."]
        );
        assert_eq!(issues[0].severity(), Severity::Moderate);
    }
}
