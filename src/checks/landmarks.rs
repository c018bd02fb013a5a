use super::Check;
use crate::config::LandmarkConfig;
use crate::dom::{Document, Element};
use crate::error::Result;
use crate::models::{AccessibilityIssue, IssueKind, Severity};

const WCAG: &[&str] = &["1.3.1", "2.4.1"];

/// `header` and `footer` only map to banner/contentinfo at page level.
const SECTIONING: &[&str] = &["article", "aside", "main", "nav", "section"];

/// Class fragments that mark a list as a menu.
const NAV_LIST_HINTS: &[&str] = &["nav", "menu", "breadcrumb"];

struct Landmark {
    role: &'static str,
    tag: &'static str,
    label: &'static str,
    scoped: bool,
}

const DUPLICATE_CANDIDATES: &[Landmark] = &[
    Landmark { role: "navigation", tag: "nav", label: "navigation", scoped: false },
    Landmark { role: "banner", tag: "header", label: "banner", scoped: true },
    Landmark { role: "contentinfo", tag: "footer", label: "contentinfo", scoped: true },
];

pub struct LandmarkCheck {
    config: LandmarkConfig,
}

impl LandmarkCheck {
    pub fn new(config: LandmarkConfig) -> Self {
        Self { config }
    }

    fn count(document: &Document, landmark: &Landmark) -> usize {
        document
            .elements()
            .into_iter()
            .filter(|el| {
                let by_role = el.attr_lower("role").as_deref() == Some(landmark.role);
                let by_tag = el.tag() == landmark.tag
                    && !(landmark.scoped && el.has_ancestor(SECTIONING));
                by_role || by_tag
            })
            .count()
    }

    fn mains<'a>(document: &'a Document) -> Vec<Element<'a>> {
        document
            .elements()
            .into_iter()
            .filter(|el| el.tag() == "main" || el.attr_lower("role").as_deref() == Some("main"))
            .collect()
    }

    fn has_navigation_content(document: &Document) -> bool {
        document.find_by_tag(&["ul", "ol"]).iter().any(|list| {
            list.classes().iter().any(|class| {
                let class = class.to_lowercase();
                NAV_LIST_HINTS.iter().any(|hint| class.contains(hint))
            })
        })
    }

    fn page_issue(severity: Severity, description: String, fix: &str) -> Result<AccessibilityIssue> {
        AccessibilityIssue::draft(IssueKind::MissingLandmarks, severity)
            .description(description)
            .element("<body>")
            .context("Page structure")
            .suggested_fix(fix)
            .wcag(WCAG)
            .build()
    }
}

impl Check for LandmarkCheck {
    fn name(&self) -> &'static str {
        "landmarks"
    }

    fn evaluate(&self, document: &Document, _url: &str) -> Result<Vec<AccessibilityIssue>> {
        let mut issues = Vec::new();
        let mains = Self::mains(document);

        if self.config.require_main {
            if mains.is_empty() {
                issues.push(Self::page_issue(
                    Severity::Critical,
                    "Page missing main landmark".to_string(),
                    "Wrap the primary content in a <main> element or give its container role=\"main\".",
                )?);
            } else if mains.len() > 1 {
                issues.push(Self::page_issue(
                    Severity::Moderate,
                    format!("Page has {} main landmarks (should have only one)", mains.len()),
                    "Keep exactly one main landmark per page.",
                )?);
            }
        }

        let nav = &DUPLICATE_CANDIDATES[0];
        if self.config.require_navigation
            && Self::count(document, nav) == 0
            && Self::has_navigation_content(document)
        {
            issues.push(Self::page_issue(
                Severity::Moderate,
                "Page missing navigation landmark".to_string(),
                "Wrap menus and breadcrumb lists in a <nav> element.",
            )?);
        }

        if self.config.check_duplicate_landmarks {
            for landmark in DUPLICATE_CANDIDATES {
                let count = Self::count(document, landmark);
                if count > 1 {
                    let issue = AccessibilityIssue::draft(IssueKind::MissingLandmarks, Severity::Low)
                        .description(format!("Page has {} {} landmarks", count, landmark.label))
                        .element("<body>")
                        .context("Page structure")
                        .suggested_fix(format!(
                            "Give each {} landmark a distinct aria-label, or merge them.",
                            landmark.label
                        ))
                        .wcag(WCAG)
                        .meta("landmark_count", count)
                        .build()?;
                    issues.push(issue);
                }
            }
        }

        if self.config.check_nesting {
            for main in document.find_by_tag(&["main"]) {
                if main.find(&["main"]).next().is_some() {
                    issues.push(
                        main.issue(IssueKind::MissingLandmarks, Severity::Moderate)
                            .description("Main landmark contains nested main landmarks")
                            .suggested_fix("Remove the inner <main> elements; a page has one main region.")
                            .wcag(WCAG)
                            .build()?,
                    );
                }
                if main.find(&["nav"]).next().is_some() {
                    issues.push(
                        main.issue(IssueKind::MissingLandmarks, Severity::Low)
                            .description("Main landmark contains navigation elements")
                            .suggested_fix("Move site navigation outside the main landmark.")
                            .wcag(WCAG)
                            .build()?,
                    );
                }
            }
        }

        Ok(issues)
    }
}
