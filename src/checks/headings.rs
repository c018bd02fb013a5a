use std::collections::BTreeSet;

use super::Check;
use crate::config::HeadingConfig;
use crate::dom::{Document, Element};
use crate::error::Result;
use crate::models::{AccessibilityIssue, IssueKind, Severity};

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];
const WCAG: &[&str] = &["1.3.1", "2.4.6"];

pub struct HeadingCheck {
    config: HeadingConfig,
}

impl HeadingCheck {
    pub fn new(config: HeadingConfig) -> Self {
        Self { config }
    }

    fn level(heading: &Element<'_>) -> u8 {
        heading.tag()[1..].parse().unwrap_or(6)
    }

    fn page_issue(&self, document: &Document, description: String, fix: &str) -> Result<AccessibilityIssue> {
        let title = document.title().unwrap_or_else(|| "No title".to_string());
        AccessibilityIssue::draft(IssueKind::ImproperHeadingHierarchy, Severity::Moderate)
            .description(description)
            .element("<body>")
            .context("Entire page")
            .suggested_fix(fix)
            .wcag(WCAG)
            .meta("page_title", title)
            .build()
    }
}

impl Check for HeadingCheck {
    fn name(&self) -> &'static str {
        "headings"
    }

    fn evaluate(&self, document: &Document, _url: &str) -> Result<Vec<AccessibilityIssue>> {
        let mut issues = Vec::new();
        let headings = document.find_by_tag(HEADING_TAGS);

        if headings.is_empty() {
            if self.config.require_h1 {
                issues.push(self.page_issue(
                    document,
                    "Page has no heading elements".to_string(),
                    "Structure the content with headings, starting with an h1 for the main topic \
                     and h2, h3 and so on for subsections.",
                )?);
            }
            return Ok(issues);
        }

        let h1_count = headings.iter().filter(|h| h.tag() == "h1").count();
        if self.config.require_h1 && h1_count == 0 {
            issues.push(self.page_issue(
                document,
                "Page is missing an H1 heading".to_string(),
                "Add one h1 that states the main topic or purpose of the page.",
            )?);
        }
        if h1_count > 1 {
            issues.push(
                self.page_issue(
                    document,
                    format!("Page has {} H1 headings (should have only one)", h1_count),
                    "Keep a single h1 for the main topic and demote the others to h2 or h3.",
                )?,
            );
        }

        let mut previous: Option<u8> = None;
        for heading in &headings {
            let level = Self::level(heading);
            let text: String = heading.text().chars().take(50).collect();

            if text.is_empty() {
                issues.push(
                    heading
                        .issue(IssueKind::ImproperHeadingHierarchy, Severity::Moderate)
                        .description(format!("Empty <{}> heading", heading.tag()))
                        .suggested_fix("Give the heading text or remove it if it only adds spacing.")
                        .wcag(WCAG)
                        .build()?,
                );
            }

            if level > self.config.max_heading_level {
                issues.push(
                    heading
                        .issue(IssueKind::ImproperHeadingHierarchy, Severity::Low)
                        .description(format!(
                            "Heading level {} is too deep (max recommended: {})",
                            level, self.config.max_heading_level
                        ))
                        .suggested_fix(format!(
                            "Restructure the content to use heading levels 1-{}.",
                            self.config.max_heading_level
                        ))
                        .wcag(WCAG)
                        .meta("heading_text", text.clone())
                        .build()?,
                );
            }

            if self.config.check_skip_levels {
                if let Some(from) = previous {
                    if level > from + 1 {
                        issues.push(
                            heading
                                .issue(IssueKind::ImproperHeadingHierarchy, Severity::Moderate)
                                .description(format!(
                                    "Heading level jumps from {} to {} (skipping levels)",
                                    from, level
                                ))
                                .suggested_fix(format!(
                                    "Don't skip heading levels: after an h{} the next heading \
                                     should be at most h{}.",
                                    from,
                                    from + 1
                                ))
                                .wcag(WCAG)
                                .meta("from_level", from)
                                .meta("to_level", level)
                                .meta("heading_text", text)
                                .build()?,
                        );
                    }
                }
            }
            previous = Some(level);
        }

        if self.config.check_skip_levels {
            let present: BTreeSet<u8> = headings.iter().map(Self::level).collect();
            let deepest = present.iter().next_back().copied().unwrap_or(1);
            for missing in (2..deepest).filter(|l| !present.contains(l)) {
                issues.push(
                    AccessibilityIssue::draft(IssueKind::ImproperHeadingHierarchy, Severity::Low)
                        .description(format!("Heading level {} is missing from the page", missing))
                        .element("Page structure")
                        .context("Entire page")
                        .suggested_fix(format!(
                            "Add h{} headings so the outline has no gaps.",
                            missing
                        ))
                        .wcag(WCAG)
                        .meta("missing_level", missing)
                        .build()?,
                );
            }
        }

        Ok(issues)
    }
}
