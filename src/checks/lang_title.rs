use super::Check;
use crate::dom::Document;
use crate::error::Result;
use crate::models::{AccessibilityIssue, IssueKind, Severity};

const GENERIC_TITLES: &[&str] = &["home", "homepage", "untitled", "index", "page", "document"];

const MIN_TITLE_CHARS: usize = 4;

/// Page language and document title.
pub struct LangTitleCheck;

impl Check for LangTitleCheck {
    fn name(&self) -> &'static str {
        "lang_title"
    }

    fn evaluate(&self, document: &Document, _url: &str) -> Result<Vec<AccessibilityIssue>> {
        let mut issues = Vec::new();

        let root = document.root();
        let has_lang = root.attr("lang").map(|l| !l.trim().is_empty()).unwrap_or(false);
        if !has_lang {
            issues.push(
                root.issue(IssueKind::Other, Severity::Moderate)
                    .description("Missing or empty html lang attribute.")
                    .context("document root")
                    .suggested_fix("Set the page language on the root element, e.g. <html lang=\"en\">.")
                    .wcag(&["3.1.1"])
                    .build()?,
            );
        }

        match document.title() {
            None => issues.push(
                AccessibilityIssue::draft(IssueKind::Other, Severity::Moderate)
                    .description("Missing or empty document title.")
                    .element("<title>")
                    .context("document head")
                    .suggested_fix("Give the page a short <title> that says what it is for.")
                    .wcag(&["2.4.2"])
                    .build()?,
            ),
            Some(title) => {
                let generic = GENERIC_TITLES.contains(&title.to_lowercase().as_str())
                    || title.chars().count() < MIN_TITLE_CHARS;
                if generic {
                    issues.push(
                        AccessibilityIssue::draft(IssueKind::Other, Severity::Low)
                            .description(format!("Title may be too generic: '{}'.", title))
                            .element("<title>")
                            .context("document head")
                            .suggested_fix("Make the title specific to this page, e.g. 'Pricing - Acme'.")
                            .wcag(&["2.4.2"])
                            .meta("title", title)
                            .build()?,
                    );
                }
            }
        }

        Ok(issues)
    }
}
