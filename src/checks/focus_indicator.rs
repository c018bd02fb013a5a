use super::Check;
use crate::dom::Document;
use crate::error::Result;
use crate::models::{AccessibilityIssue, IssueKind, Severity};

const INTERACTIVE_TAGS: &[&str] = &["a", "button", "input", "textarea", "select", "summary"];

const WCAG: &[&str] = &["2.4.7"];

pub struct FocusIndicatorCheck;

fn removes_outline(declarations: &str) -> bool {
    let squashed: String = declarations.to_lowercase().split_whitespace().collect();
    squashed.contains("outline:none") || squashed.contains("outline:0")
}

/// Selectors of `:focus` rules in a stylesheet that drop the outline.
fn suppressing_selectors(css: &str) -> Vec<String> {
    css.split('}')
        .filter_map(|rule| rule.rsplit_once('{'))
        .filter(|(selector, body)| selector.contains(":focus") && removes_outline(body))
        .map(|(selector, _)| {
            // Strip any enclosing at-rule prelude such as "@media (...) {".
            let selector = selector.rsplit('{').next().unwrap_or(selector);
            selector.split_whitespace().collect::<Vec<_>>().join(" ")
        })
        .collect()
}

impl Check for FocusIndicatorCheck {
    fn name(&self) -> &'static str {
        "focus_indicator"
    }

    fn evaluate(&self, document: &Document, _url: &str) -> Result<Vec<AccessibilityIssue>> {
        let mut issues = Vec::new();

        for style in document.find_by_tag(&["style"]) {
            let selectors = suppressing_selectors(&style.inner_source());
            if selectors.is_empty() {
                continue;
            }
            issues.push(
                style
                    .issue(IssueKind::KeyboardNavigation, Severity::Moderate)
                    .description("Stylesheet hides focus outlines on :focus selectors.")
                    .suggested_fix(
                        "Keep the focus outline, or replace it with another clearly visible focus style.",
                    )
                    .wcag(WCAG)
                    .meta("selectors", selectors)
                    .build()?,
            );
        }

        for el in document.find_by_tag(INTERACTIVE_TAGS) {
            let Some(style) = el.attr("style") else {
                continue;
            };
            if removes_outline(style) {
                issues.push(
                    el.issue(IssueKind::KeyboardNavigation, Severity::Low)
                        .description("Inline style removes focus outline on interactive element.")
                        .suggested_fix("Drop the inline outline suppression and provide a visible focus style.")
                        .wcag(WCAG)
                        .build()?,
                );
            }
        }

        Ok(issues)
    }
}
