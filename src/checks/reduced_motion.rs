use super::Check;
use crate::dom::{Document, Element};
use crate::error::Result;
use crate::models::{AccessibilityIssue, IssueKind, Severity};

const MOTION_PROPERTIES: &[&str] = &["animation:", "animation-name:", "transition:"];

const SNIPPET_MAX: usize = 160;

pub struct ReducedMotionCheck;

fn squash(css: &str) -> String {
    css.to_lowercase().split_whitespace().collect()
}

fn declares_motion(css: &str) -> bool {
    let css = squash(css);
    MOTION_PROPERTIES.iter().any(|p| css.contains(p))
}

fn motion_sources<'a>(document: &'a Document) -> Vec<Element<'a>> {
    document
        .elements()
        .into_iter()
        .filter(|el| match el.tag() {
            "style" => declares_motion(&el.inner_source()),
            _ => el.attr("style").map(declares_motion).unwrap_or(false),
        })
        .collect()
}

fn honours_preference(document: &Document) -> bool {
    document.elements().into_iter().any(|el| {
        let source = match el.tag() {
            "style" => el.inner_source(),
            "link" => el.attr("media").unwrap_or_default().to_string(),
            _ => return false,
        };
        source.to_lowercase().contains("prefers-reduced-motion")
    })
}

impl Check for ReducedMotionCheck {
    fn name(&self) -> &'static str {
        "reduced_motion"
    }

    fn evaluate(&self, document: &Document, _url: &str) -> Result<Vec<AccessibilityIssue>> {
        let sources = motion_sources(document);
        let Some(first) = sources.first() else {
            return Ok(Vec::new());
        };
        if honours_preference(document) {
            return Ok(Vec::new());
        }

        let snippet_source = match first.tag() {
            "style" => first.inner_source(),
            _ => first.attr("style").unwrap_or_default().to_string(),
        };
        let snippet: String = snippet_source.trim().chars().take(SNIPPET_MAX).collect();

        let issue = first
            .issue(IssueKind::Other, Severity::Low)
            .description("Animations/transitions detected without prefers-reduced-motion override.")
            .suggested_fix(
                "Add @media (prefers-reduced-motion: reduce) rules that disable or shorten the motion.",
            )
            .wcag(&["2.3.3", "2.2.2"])
            .meta("snippet", snippet)
            .meta("sources", sources.len())
            .build()?;
        Ok(vec![issue])
    }
}
