use super::{attr_filled, id_refs, labelledby_text, Check};
use crate::config::AriaConfig;
use crate::dom::{Document, Element};
use crate::error::Result;
use crate::models::{AccessibilityIssue, IssueKind, Severity};

const VALID_ATTRIBUTES: &[&str] = &[
    "aria-activedescendant", "aria-atomic", "aria-autocomplete", "aria-braillelabel",
    "aria-brailleroledescription", "aria-busy", "aria-checked", "aria-colcount", "aria-colindex",
    "aria-colindextext", "aria-colspan", "aria-controls", "aria-current", "aria-describedby",
    "aria-description", "aria-details", "aria-disabled", "aria-dropeffect", "aria-errormessage",
    "aria-expanded", "aria-flowto", "aria-grabbed", "aria-haspopup", "aria-hidden",
    "aria-invalid", "aria-keyshortcuts", "aria-label", "aria-labelledby", "aria-level",
    "aria-live", "aria-modal", "aria-multiline", "aria-multiselectable", "aria-orientation",
    "aria-owns", "aria-placeholder", "aria-posinset", "aria-pressed", "aria-readonly",
    "aria-relevant", "aria-required", "aria-roledescription", "aria-rowcount", "aria-rowindex",
    "aria-rowindextext", "aria-rowspan", "aria-selected", "aria-setsize", "aria-sort",
    "aria-valuemax", "aria-valuemin", "aria-valuenow", "aria-valuetext",
];

const VALID_ROLES: &[&str] = &[
    "alert", "alertdialog", "application", "article", "banner", "blockquote", "button",
    "caption", "cell", "checkbox", "code", "columnheader", "combobox", "complementary",
    "contentinfo", "definition", "deletion", "dialog", "directory", "document", "emphasis",
    "feed", "figure", "form", "generic", "grid", "gridcell", "group", "heading", "img",
    "insertion", "link", "list", "listbox", "listitem", "log", "main", "marquee", "math", "menu",
    "menubar", "menuitem", "menuitemcheckbox", "menuitemradio", "meter", "navigation", "none",
    "note", "option", "paragraph", "presentation", "progressbar", "radio", "radiogroup",
    "region", "row", "rowgroup", "rowheader", "scrollbar", "search", "searchbox", "separator",
    "slider", "spinbutton", "status", "strong", "subscript", "superscript", "switch", "tab",
    "table", "tablist", "tabpanel", "term", "textbox", "time", "timer", "toolbar", "tooltip",
    "tree", "treegrid", "treeitem",
];

enum ValueRule {
    Boolean,
    Tokens(&'static [&'static str]),
    TokenList(&'static [&'static str]),
    Integer,
    Number,
}

const VALUE_RULES: &[(&str, ValueRule)] = &[
    ("aria-atomic", ValueRule::Boolean),
    ("aria-busy", ValueRule::Boolean),
    ("aria-disabled", ValueRule::Boolean),
    ("aria-modal", ValueRule::Boolean),
    ("aria-multiline", ValueRule::Boolean),
    ("aria-multiselectable", ValueRule::Boolean),
    ("aria-readonly", ValueRule::Boolean),
    ("aria-required", ValueRule::Boolean),
    ("aria-hidden", ValueRule::Tokens(&["true", "false", "undefined"])),
    ("aria-expanded", ValueRule::Tokens(&["true", "false", "undefined"])),
    ("aria-selected", ValueRule::Tokens(&["true", "false", "undefined"])),
    ("aria-checked", ValueRule::Tokens(&["true", "false", "mixed", "undefined"])),
    ("aria-pressed", ValueRule::Tokens(&["true", "false", "mixed", "undefined"])),
    ("aria-invalid", ValueRule::Tokens(&["true", "false", "grammar", "spelling"])),
    ("aria-current", ValueRule::Tokens(&["page", "step", "location", "date", "time", "true", "false"])),
    ("aria-live", ValueRule::Tokens(&["off", "polite", "assertive"])),
    ("aria-orientation", ValueRule::Tokens(&["horizontal", "vertical", "undefined"])),
    ("aria-sort", ValueRule::Tokens(&["ascending", "descending", "none", "other"])),
    ("aria-autocomplete", ValueRule::Tokens(&["inline", "list", "both", "none"])),
    ("aria-haspopup", ValueRule::Tokens(&["true", "false", "menu", "listbox", "tree", "grid", "dialog"])),
    ("aria-relevant", ValueRule::TokenList(&["additions", "removals", "text", "all"])),
    ("aria-level", ValueRule::Integer),
    ("aria-posinset", ValueRule::Integer),
    ("aria-setsize", ValueRule::Integer),
    ("aria-colcount", ValueRule::Integer),
    ("aria-colindex", ValueRule::Integer),
    ("aria-colspan", ValueRule::Integer),
    ("aria-rowcount", ValueRule::Integer),
    ("aria-rowindex", ValueRule::Integer),
    ("aria-rowspan", ValueRule::Integer),
    ("aria-valuemin", ValueRule::Number),
    ("aria-valuemax", ValueRule::Number),
    ("aria-valuenow", ValueRule::Number),
];

impl ValueRule {
    fn accepts(&self, value: &str) -> bool {
        let value = value.trim().to_lowercase();
        match self {
            ValueRule::Boolean => value == "true" || value == "false",
            ValueRule::Tokens(allowed) => allowed.contains(&value.as_str()),
            ValueRule::TokenList(allowed) => {
                !value.is_empty() && value.split_whitespace().all(|t| allowed.contains(&t))
            }
            ValueRule::Integer => value.parse::<i64>().is_ok(),
            ValueRule::Number => value.parse::<f64>().map(|v| v.is_finite()).unwrap_or(false),
        }
    }
}

/// Each inner slice is a group of which at least one attribute must be set.
const ROLE_REQUIREMENTS: &[(&str, &[&[&str]])] = &[
    ("checkbox", &[&["aria-checked"]]),
    ("combobox", &[&["aria-expanded"]]),
    ("heading", &[&["aria-level"]]),
    ("menuitemcheckbox", &[&["aria-checked"]]),
    ("menuitemradio", &[&["aria-checked"]]),
    ("option", &[&["aria-selected"]]),
    ("radio", &[&["aria-checked"]]),
    ("scrollbar", &[&["aria-controls"], &["aria-valuenow"]]),
    ("slider", &[&["aria-valuemin"], &["aria-valuemax"], &["aria-valuenow"]]),
    ("spinbutton", &[&["aria-valuemin"], &["aria-valuemax"], &["aria-valuenow"]]),
    ("switch", &[&["aria-checked"]]),
    ("tab", &[&["aria-selected"]]),
    ("dialog", &[&["aria-label", "aria-labelledby"]]),
    ("alertdialog", &[&["aria-label", "aria-labelledby"]]),
];

const INTERACTIVE_ROLES: &[&str] = &[
    "button", "link", "menuitem", "menuitemcheckbox", "menuitemradio", "tab", "checkbox",
    "radio", "switch", "option", "treeitem",
];

const ID_REFERENCE_ATTRIBUTES: &[&str] = &[
    "aria-labelledby", "aria-describedby", "aria-controls", "aria-owns",
    "aria-activedescendant", "aria-errormessage", "aria-flowto", "aria-details",
];

pub struct AriaCheck {
    config: AriaConfig,
}

impl AriaCheck {
    pub fn new(config: AriaConfig) -> Self {
        Self { config }
    }

    fn roles(el: &Element<'_>) -> Vec<String> {
        el.attr("role")
            .map(|r| r.split_whitespace().map(str::to_lowercase).collect())
            .unwrap_or_default()
    }

    /// Native controls carry their own state, so the ARIA state is optional.
    fn natively_satisfied(el: &Element<'_>, role: &str) -> bool {
        let input_type = el.attr_lower("type");
        match (el.tag(), role, input_type.as_deref()) {
            ("input", "checkbox", Some("checkbox")) => true,
            ("input", "radio", Some("radio")) => true,
            ("input", "switch", Some("checkbox")) => true,
            ("input", "slider", Some("range")) => true,
            ("input", "spinbutton", Some("number")) => true,
            ("option", "option", _) => true,
            ("h1" | "h2" | "h3" | "h4" | "h5" | "h6", "heading", _) => true,
            _ => false,
        }
    }

    fn has_accessible_name(el: &Element<'_>) -> bool {
        !el.text().is_empty()
            || attr_filled(el, "aria-label").is_some()
            || labelledby_text(el).is_some()
            || attr_filled(el, "title").is_some()
            || el
                .find(&["img"])
                .any(|img| attr_filled(&img, "alt").is_some())
    }

    fn check_attributes(&self, el: &Element<'_>) -> Result<Vec<AccessibilityIssue>> {
        let mut issues = Vec::new();

        for (name, value) in el.attributes() {
            if !name.starts_with("aria-") {
                continue;
            }

            if !VALID_ATTRIBUTES.contains(&name) {
                if self.config.check_invalid_attributes {
                    issues.push(
                        el.issue(IssueKind::MissingAriaLabels, Severity::Moderate)
                            .description(format!("Invalid ARIA attribute: {}", name))
                            .suggested_fix(format!(
                                "Remove {} or replace it with a valid ARIA attribute.",
                                name
                            ))
                            .wcag(&["4.1.2"])
                            .meta("attribute", name)
                            .build()?,
                    );
                }
                continue;
            }

            if !self.config.check_attribute_values {
                continue;
            }
            let rule = VALUE_RULES.iter().find(|(attr, _)| *attr == name);
            if let Some((_, rule)) = rule {
                if !rule.accepts(value) {
                    issues.push(
                        el.issue(IssueKind::MissingAriaLabels, Severity::Low)
                            .description(format!("Invalid ARIA attribute value: {}='{}'", name, value))
                            .suggested_fix(format!("Use a value permitted for {}.", name))
                            .wcag(&["4.1.2"])
                            .meta("attribute", name)
                            .meta("value", value)
                            .build()?,
                    );
                }
            }
        }

        Ok(issues)
    }

    fn check_roles(&self, el: &Element<'_>) -> Result<Vec<AccessibilityIssue>> {
        let mut issues = Vec::new();
        let roles = Self::roles(el);
        if roles.is_empty() {
            return Ok(issues);
        }

        // The first recognised token is the effective role.
        let effective = roles.iter().find(|r| VALID_ROLES.contains(&r.as_str()));

        let Some(role) = effective else {
            if self.config.check_roles {
                let raw = el.attr("role").unwrap_or("");
                issues.push(
                    el.issue(IssueKind::MissingAriaLabels, Severity::Low)
                        .description(format!("Unknown ARIA role: '{}'", raw))
                        .suggested_fix("Use a role defined by WAI-ARIA or remove the attribute.")
                        .wcag(&["4.1.2"])
                        .meta("role", raw)
                        .build()?,
                );
            }
            return Ok(issues);
        };

        if !self.config.check_required_attributes || Self::natively_satisfied(el, role) {
            return Ok(issues);
        }

        let groups = ROLE_REQUIREMENTS
            .iter()
            .find(|(r, _)| *r == role.as_str())
            .map(|(_, groups)| *groups)
            .unwrap_or(&[]);

        for group in groups {
            if group.iter().any(|attr| el.has_attr(attr)) {
                continue;
            }
            let required = group.join(" or ");
            issues.push(
                el.issue(IssueKind::MissingAriaLabels, Severity::Moderate)
                    .description(format!(
                        "Missing required ARIA attribute '{}' for role '{}'",
                        required, role
                    ))
                    .suggested_fix(format!("Add {} to the element with role=\"{}\".", required, role))
                    .wcag(&["4.1.2"])
                    .meta("role", role.as_str())
                    .meta("required_attribute", required)
                    .build()?,
            );
        }

        Ok(issues)
    }

    fn check_interactive(&self, el: &Element<'_>) -> Result<Vec<AccessibilityIssue>> {
        let mut issues = Vec::new();
        // Links and form controls are covered by their own checks.
        if el.is(&["a", "input", "select", "textarea"]) {
            return Ok(issues);
        }

        let roles = Self::roles(el);
        let role_interactive = roles.iter().any(|r| INTERACTIVE_ROLES.contains(&r.as_str()));
        let clickable = el.has_attr("onclick");

        if clickable && roles.is_empty() && el.is(&["div", "span"]) {
            issues.push(
                el.issue(IssueKind::MissingAriaLabels, Severity::Moderate)
                    .description(format!("Interactive element missing ARIA role: {}", el.tag()))
                    .suggested_fix(
                        "Use a <button> or add role=\"button\", tabindex=\"0\" and key handlers.",
                    )
                    .wcag(&["4.1.2"])
                    .build()?,
            );
        }

        let interactive = el.tag() == "button" || role_interactive || clickable;
        if interactive && !Self::has_accessible_name(el) {
            issues.push(
                el.issue(IssueKind::MissingAriaLabels, Severity::Moderate)
                    .description(format!("Interactive element missing accessible name: {}", el.tag()))
                    .suggested_fix("Add visible text, aria-label, or aria-labelledby.")
                    .wcag(&["4.1.2"])
                    .build()?,
            );
        }

        Ok(issues)
    }

    fn check_id_references(&self, el: &Element<'_>) -> Result<Vec<AccessibilityIssue>> {
        let doc = el.document();
        let mut issues = Vec::new();
        for attr in ID_REFERENCE_ATTRIBUTES {
            let missing: Vec<&str> = id_refs(el, attr)
                .into_iter()
                .filter(|id| !doc.has_id(id))
                .collect();
            if missing.is_empty() {
                continue;
            }
            issues.push(
                el.issue(IssueKind::MissingAriaLabels, Severity::Low)
                    .description(format!("{} references missing element id", attr))
                    .suggested_fix(format!(
                        "Point {} at ids that exist in the page, or remove the reference.",
                        attr
                    ))
                    .wcag(&["1.3.1", "4.1.2"])
                    .meta("attribute", *attr)
                    .meta("missing_ids", missing)
                    .build()?,
            );
        }
        Ok(issues)
    }
}

impl Check for AriaCheck {
    fn name(&self) -> &'static str {
        "aria"
    }

    fn evaluate(&self, document: &Document, _url: &str) -> Result<Vec<AccessibilityIssue>> {
        let mut issues = Vec::new();

        for el in document.elements() {
            issues.extend(self.check_attributes(&el)?);
            issues.extend(self.check_roles(&el)?);
            if !el.is_hidden() {
                issues.extend(self.check_interactive(&el)?);
            }
            if self.config.check_id_references {
                issues.extend(self.check_id_references(&el)?);
            }
        }

        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::{descriptions, run};
    use pretty_assertions::assert_eq;

    fn check() -> AriaCheck {
        AriaCheck::new(AriaConfig::default())
    }

    #[test]
    fn invalid_names_and_values() {
        let issues = run(
            &check(),
            r#"<body><div aria-labell="x" aria-live="loud" aria-hidden="yes" aria-level="two">Panel</div></body>"#,
        );
        assert_eq!(
            descriptions(&issues),
            vec![
                "Invalid ARIA attribute: aria-labell".to_string(),
                "Invalid ARIA attribute value: aria-live='loud'".to_string(),
                "Invalid ARIA attribute value: aria-hidden='yes'".to_string(),
                "Invalid ARIA attribute value: aria-level='two'".to_string(),
            ]
        );
        assert_eq!(issues[0].severity(), Severity::Moderate);
        assert_eq!(issues[1].severity(), Severity::Low);
    }

    #[test]
    fn slider_requires_range_values() {
        let issues = run(
            &check(),
            r#"<body><div role="slider" aria-valuenow="5" aria-label="Volume" tabindex="0"></div></body>"#,
        );
        assert_eq!(
            descriptions(&issues),
            vec![
                "Missing required ARIA attribute 'aria-valuemin' for role 'slider'".to_string(),
                "Missing required ARIA attribute 'aria-valuemax' for role 'slider'".to_string(),
            ]
        );
    }

    #[test]
    fn native_controls_are_exempt() {
        let issues = run(
            &check(),
            r#"<body><input type="checkbox" role="switch" id="c"><label for="c">Dark mode</label></body>"#,
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn unknown_role_and_fallbacks() {
        let issues = run(
            &check(),
            r#"<body><div role="widgetish">a</div><div role="fancy region">b</div></body>"#,
        );
        assert_eq!(descriptions(&issues), vec!["Unknown ARIA role: 'widgetish'".to_string()]);
    }

    #[test]
    fn clickable_divs_and_unnamed_buttons() {
        let issues = run(
            &check(),
            r#"<body>
                <div onclick="go()">Open menu</div>
                <button><svg></svg></button>
                <button aria-label="Close"><svg></svg></button>
                <span role="button" aria-labelledby="t"></span><h2 id="t">Settings</h2>
            </body>"#,
        );
        assert_eq!(
            descriptions(&issues),
            vec![
                "Interactive element missing ARIA role: div".to_string(),
                "Interactive element missing accessible name: button".to_string(),
            ]
        );
    }

    #[test]
    fn dangling_id_references() {
        let issues = run(
            &check(),
            r#"<body><button aria-controls="menu panel">Menu</button><ul id="menu"></ul></body>"#,
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].metadata()["missing_ids"], serde_json::json!(["panel"]));
    }
}
