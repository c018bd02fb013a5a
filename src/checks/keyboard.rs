use super::skip_link::skip_link_candidates;
use super::Check;
use crate::config::KeyboardConfig;
use crate::dom::{Document, Element};
use crate::error::Result;
use crate::models::{AccessibilityIssue, IssueKind, Severity};

const WCAG_FOCUS: &[&str] = &["2.1.1"];
const WCAG_ORDER: &[&str] = &["2.4.3", "2.1.1"];
const WCAG_TRAP: &[&str] = &["2.1.2"];

/// Roles that promise keyboard interaction.
const INTERACTIVE_ROLES: &[&str] = &[
    "button", "link", "checkbox", "radio", "tab", "menuitem", "menuitemcheckbox",
    "menuitemradio", "option", "switch", "slider", "spinbutton", "combobox", "textbox",
    "searchbox", "treeitem", "gridcell",
];

const KEY_HANDLERS: &[&str] = &["onkeydown", "onkeypress", "onkeyup"];

const HIGH_TABINDEX: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TabIndex {
    Absent,
    Value(i64),
    Invalid,
}

fn tabindex(el: &Element<'_>) -> TabIndex {
    match el.attr("tabindex").map(str::trim) {
        None => TabIndex::Absent,
        Some(raw) => raw.parse().map(TabIndex::Value).unwrap_or(TabIndex::Invalid),
    }
}

fn natively_focusable(el: &Element<'_>) -> bool {
    match el.tag() {
        "a" | "area" => el.has_attr("href"),
        "input" => el.attr_lower("type").as_deref() != Some("hidden"),
        "button" | "select" | "textarea" | "summary" | "iframe" => true,
        _ => el
            .attr_lower("contenteditable")
            .map(|v| v != "false")
            .unwrap_or(false),
    }
}

/// Reachable with Tab, ignoring whether it is hidden.
fn focusable(el: &Element<'_>) -> bool {
    if el.has_attr("disabled") {
        return false;
    }
    match tabindex(el) {
        TabIndex::Value(v) if v < 0 => false,
        TabIndex::Value(_) => true,
        _ => natively_focusable(el),
    }
}

fn aria_hidden(el: &Element<'_>) -> bool {
    std::iter::once(*el)
        .chain(el.ancestors())
        .any(|e| e.attr_lower("aria-hidden").as_deref() == Some("true"))
}

fn removed_from_layout(el: &Element<'_>) -> bool {
    std::iter::once(*el).chain(el.ancestors()).any(|e| {
        e.has_attr("hidden")
            || e.attr("style")
                .map(|s| {
                    let s: String = s.to_lowercase().split_whitespace().collect();
                    s.contains("display:none") || s.contains("visibility:hidden")
                })
                .unwrap_or(false)
    })
}

pub struct KeyboardCheck {
    config: KeyboardConfig,
}

impl KeyboardCheck {
    pub fn new(config: KeyboardConfig) -> Self {
        Self { config }
    }

    fn unreachable_widgets(&self, document: &Document, issues: &mut Vec<AccessibilityIssue>) -> Result<()> {
        for el in document.elements() {
            if natively_focusable(&el) || el.is(&["label", "option"]) {
                continue;
            }
            let role = el.attr_lower("role").unwrap_or_default();
            let promises_interaction =
                el.has_attr("onclick") || INTERACTIVE_ROLES.contains(&role.as_str());
            if !promises_interaction || focusable(&el) || el.is_hidden() {
                continue;
            }
            issues.push(
                el.issue(IssueKind::KeyboardNavigation, Severity::Critical)
                    .description(format!("Interactive element is not keyboard focusable: {}", el.tag()))
                    .suggested_fix(
                        "Use a native control such as <button>, or add tabindex=\"0\" and handle \
                         Enter and Space key presses.",
                    )
                    .wcag(WCAG_FOCUS)
                    .meta("role", role)
                    .build()?,
            );
        }
        Ok(())
    }

    fn tab_order(&self, document: &Document, issues: &mut Vec<AccessibilityIssue>) -> Result<()> {
        for el in document.find_by_attribute("tabindex", None) {
            let raw = el.attr("tabindex").unwrap_or_default().trim().to_string();
            let issue = match tabindex(&el) {
                TabIndex::Invalid => el
                    .issue(IssueKind::KeyboardNavigation, Severity::Moderate)
                    .description(format!("Element has invalid tabindex value: {}", raw))
                    .suggested_fix(format!(
                        "Change tabindex='{}' to an integer: 0 to join the tab order, -1 to be \
                         focusable only from script.",
                        raw
                    )),
                TabIndex::Value(v) if v > HIGH_TABINDEX => el
                    .issue(IssueKind::KeyboardNavigation, Severity::Moderate)
                    .description(format!("Element has very high tabindex value: {}", v))
                    .suggested_fix("Remove the tabindex and order the markup so the natural focus order works."),
                TabIndex::Value(v) if v > 0 => el
                    .issue(IssueKind::KeyboardNavigation, Severity::Moderate)
                    .description(format!(
                        "Element uses tabindex={} (>0), which can create confusing focus order.",
                        v
                    ))
                    .suggested_fix("Use tabindex=0 for custom widgets and keep focus order in DOM order."),
                TabIndex::Value(0) if natively_focusable(&el) => el
                    .issue(IssueKind::KeyboardNavigation, Severity::Low)
                    .description(format!("Element has unnecessary tabindex='0': {}", el.tag()))
                    .suggested_fix("Remove tabindex='0'; the element is focusable without it."),
                _ => continue,
            };
            issues.push(issue.wcag(WCAG_ORDER).meta("tabindex", raw).build()?);
        }
        Ok(())
    }

    fn skip_link_position(&self, document: &Document, issues: &mut Vec<AccessibilityIssue>) -> Result<()> {
        let candidates = skip_link_candidates(document);
        let Some(first) = candidates.first() else {
            return Ok(());
        };
        let Some(location) = first.source_location() else {
            return Ok(());
        };
        if location.line > self.config.skip_link_max_line {
            issues.push(
                first
                    .issue(IssueKind::MissingSkipLinks, Severity::Low)
                    .description("Skip link is not properly positioned")
                    .suggested_fix("Move the skip link to the start of <body> so it is the first thing focused.")
                    .wcag(&["2.4.1"])
                    .meta("line", location.line)
                    .build()?,
            );
        }
        Ok(())
    }

    fn traps(&self, document: &Document, issues: &mut Vec<AccessibilityIssue>) -> Result<()> {
        for el in document.elements() {
            if el.has_attr("data-focus-trap") {
                issues.push(
                    el.issue(IssueKind::KeyboardNavigation, Severity::Moderate)
                        .description(format!("Element may trap keyboard focus: {}", el.tag()))
                        .suggested_fix("Make sure Escape or a visible close control releases focus from the trap.")
                        .wcag(WCAG_TRAP)
                        .build()?,
                );
            }

            if focusable(&el) && aria_hidden(&el) && !removed_from_layout(&el) {
                issues.push(
                    el.issue(IssueKind::KeyboardNavigation, Severity::Moderate)
                        .description(format!(
                            "Focusable element is hidden from assistive technology: {}",
                            el.tag()
                        ))
                        .suggested_fix("Add tabindex=\"-1\" or remove aria-hidden so focus never lands on silent content.")
                        .wcag(WCAG_TRAP)
                        .build()?,
                );
            }

            for handler in KEY_HANDLERS {
                let Some(code) = el.attr(handler) else {
                    continue;
                };
                let code = code.to_lowercase();
                let intercepts_tab = (code.contains("keycode") && code.contains('9'))
                    || code.contains("tabkey")
                    || code.contains("'tab'")
                    || code.contains("\"tab\"");
                if intercepts_tab {
                    issues.push(
                        el.issue(IssueKind::KeyboardNavigation, Severity::Low)
                            .description("Inline key handler may interfere with Tab navigation (keyCode 9).")
                            .suggested_fix("Avoid intercepting Tab unless focus is moved somewhere the user expects.")
                            .wcag(WCAG_TRAP)
                            .meta("handler", *handler)
                            .build()?,
                    );
                }
            }
        }
        Ok(())
    }
}

impl Check for KeyboardCheck {
    fn name(&self) -> &'static str {
        "keyboard"
    }

    fn evaluate(&self, document: &Document, _url: &str) -> Result<Vec<AccessibilityIssue>> {
        let mut issues = Vec::new();

        if self.config.check_focusable_elements {
            self.unreachable_widgets(document, &mut issues)?;
        }
        if self.config.check_tab_order {
            self.tab_order(document, &mut issues)?;
        }
        if self.config.check_skip_links {
            self.skip_link_position(document, &mut issues)?;
        }
        if self.config.check_keyboard_traps {
            self.traps(document, &mut issues)?;
        }

        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::{descriptions, run};
    use pretty_assertions::assert_eq;

    fn check() -> KeyboardCheck {
        KeyboardCheck::new(KeyboardConfig::default())
    }

    #[test]
    fn clickable_div_without_tabindex_is_critical() {
        let html = r#"<html><body><div onclick="go()">Open</div><div role="button" tabindex="0">Ok</div></body></html>"#;
        let issues = run(&check(), html);
        assert_eq!(
            descriptions(&issues),
            vec!["Interactive element is not keyboard focusable: div"]
        );
        assert_eq!(issues[0].severity(), Severity::Critical);
    }

    #[test]
    fn tabindex_values_are_graded() {
        let html = r#"<html><body>
            <span tabindex="5">a</span>
            <span tabindex="500">b</span>
            <span tabindex="first">c</span>
            <button tabindex="0">d</button>
            <span tabindex="-1">e</span>
        </body></html>"#;
        let issues = run(&check(), html);
        assert_eq!(
            descriptions(&issues),
            vec![
                "Element uses tabindex=5 (>0), which can create confusing focus order.",
                "Element has very high tabindex value: 500",
                "Element has invalid tabindex value: first",
                "Element has unnecessary tabindex='0': button",
            ]
        );
        assert_eq!(issues[3].severity(), Severity::Low);
    }

    #[test]
    fn late_skip_link_is_flagged() {
        let mut html = String::from("<html><body>\n");
        for _ in 0..60 {
            html.push_str("<p>filler</p>\n");
        }
        html.push_str(r##"<a href="#main">Skip to content</a><main id="main">x</main></body></html>"##);
        let issues = run(&check(), &html);
        assert_eq!(descriptions(&issues), vec!["Skip link is not properly positioned"]);
    }

    #[test]
    fn focusable_inside_aria_hidden_is_flagged() {
        let html = r#"<html><body><div aria-hidden="true"><a href="/x">x</a></div></body></html>"#;
        let issues = run(&check(), html);
        assert_eq!(
            descriptions(&issues),
            vec!["Focusable element is hidden from assistive technology: a"]
        );
    }

    #[test]
    fn tab_interception_and_explicit_traps() {
        let html = r#"<html><body>
            <div data-focus-trap="true"><button onkeydown="if (e.keyCode === 9) e.preventDefault()">x</button></div>
        </body></html>"#;
        let issues = run(&check(), html);
        assert_eq!(
            descriptions(&issues),
            vec![
                "Element may trap keyboard focus: div",
                "Inline key handler may interfere with Tab navigation (keyCode 9).",
            ]
        );
    }
}
