use std::collections::HashSet;

use super::{attr_filled, attr_is_true, id_refs, Check};
use crate::config::FormConfig;
use crate::dom::{Document, Element};
use crate::error::Result;
use crate::models::{AccessibilityIssue, IssueKind, Severity};

const CONTROL_TAGS: &[&str] = &["input", "select", "textarea"];

/// Input types whose label comes from their own attributes.
const SELF_LABELLED_INPUTS: &[&str] = &["submit", "reset", "button", "image", "hidden"];

pub struct FormCheck {
    config: FormConfig,
}

/// How a control got its accessible name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSource {
    ForAttribute,
    Wrapping,
    AriaLabel,
    AriaLabelledby,
    Title,
}

impl LabelSource {
    fn as_str(self) -> &'static str {
        match self {
            LabelSource::ForAttribute => "label_for",
            LabelSource::Wrapping => "wrapping_label",
            LabelSource::AriaLabel => "aria_label",
            LabelSource::AriaLabelledby => "aria_labelledby",
            LabelSource::Title => "title",
        }
    }
}

/// Ids named by a `<label for>` on the page.
pub fn label_targets(document: &Document) -> HashSet<&str> {
    document
        .find_by_tag(&["label"])
        .into_iter()
        .filter_map(|label| label.attr("for"))
        .collect()
}

/// First label source found, in precedence order. `labelled` comes from
/// [`label_targets`] on the same document.
pub fn label_source(control: &Element<'_>, labelled: &HashSet<&str>) -> Option<LabelSource> {
    let doc = control.document();

    if let Some(id) = control.id().filter(|id| !id.trim().is_empty()) {
        if labelled.contains(id) {
            return Some(LabelSource::ForAttribute);
        }
    }

    if control.has_ancestor(&["label"]) {
        return Some(LabelSource::Wrapping);
    }

    if attr_filled(control, "aria-label").is_some() {
        return Some(LabelSource::AriaLabel);
    }

    if id_refs(control, "aria-labelledby").iter().any(|id| doc.has_id(id)) {
        return Some(LabelSource::AriaLabelledby);
    }

    if attr_filled(control, "title").is_some() {
        return Some(LabelSource::Title);
    }

    None
}

impl FormCheck {
    pub fn new(config: FormConfig) -> Self {
        Self { config }
    }

    fn input_type(control: &Element<'_>) -> String {
        control.attr_lower("type").unwrap_or_else(|| "text".to_string())
    }

    fn check_label(
        &self,
        control: &Element<'_>,
        labelled: &HashSet<&str>,
    ) -> Result<Option<AccessibilityIssue>> {
        let input_type = Self::input_type(control);

        if control.tag() == "input" && SELF_LABELLED_INPUTS.contains(&input_type.as_str()) {
            let unnamed_button = input_type == "button"
                && attr_filled(control, "value").is_none()
                && attr_filled(control, "aria-label").is_none();
            if !unnamed_button {
                return Ok(None);
            }
            return control
                .issue(IssueKind::MissingFormLabels, Severity::Critical)
                .description("Form element missing label: button input has no value")
                .suggested_fix("Give the button a value attribute describing its action.")
                .wcag(&["1.3.1", "4.1.2"])
                .build()
                .map(Some);
        }

        if label_source(control, labelled).is_some() {
            return Ok(None);
        }

        let mut draft = control
            .issue(IssueKind::MissingFormLabels, Severity::Critical)
            .description(format!("Form element missing label: {}", control.tag()))
            .suggested_fix(
                "Associate a <label for=\"id\"> with the control, wrap it in a <label>, or \
                 provide aria-label or aria-labelledby.",
            )
            .wcag(&["1.3.1", "3.3.2", "4.1.2"]);

        if control.tag() == "input" {
            draft = draft.meta("input_type", input_type);
        }
        if let Some(placeholder) = attr_filled(control, "placeholder") {
            // Placeholder text disappears on input and is not a label.
            draft = draft.meta("placeholder", placeholder);
        }

        draft.build().map(Some)
    }

    fn check_required(&self, control: &Element<'_>) -> Result<Option<AccessibilityIssue>> {
        if !control.has_attr("required") || attr_is_true(control, "aria-required") {
            return Ok(None);
        }
        control
            .issue(IssueKind::InaccessibleForms, Severity::Moderate)
            .description(format!(
                "Required form element missing aria-required attribute: {}",
                control.tag()
            ))
            .suggested_fix(
                "Add aria-required=\"true\" and mark the field as required in its visible label.",
            )
            .wcag(&["3.3.2"])
            .build()
            .map(Some)
    }

    fn check_invalid_state(&self, control: &Element<'_>) -> Result<Option<AccessibilityIssue>> {
        if !attr_is_true(control, "aria-invalid") {
            return Ok(None);
        }
        let doc = control.document();
        let described = id_refs(control, "aria-describedby")
            .into_iter()
            .chain(id_refs(control, "aria-errormessage"))
            .any(|id| doc.has_id(id));
        if described {
            return Ok(None);
        }
        control
            .issue(IssueKind::InaccessibleForms, Severity::Moderate)
            .description(format!(
                "Form element with error missing aria-describedby: {}",
                control.tag()
            ))
            .suggested_fix(
                "Point aria-describedby at the element containing the error message so it is \
                 announced with the field.",
            )
            .wcag(&["3.3.1"])
            .build()
            .map(Some)
    }

    fn check_error_containers(&self, document: &Document) -> Result<Vec<AccessibilityIssue>> {
        let referenced: Vec<&str> = document
            .elements()
            .iter()
            .flat_map(|el| {
                id_refs(el, "aria-describedby")
                    .into_iter()
                    .chain(id_refs(el, "aria-errormessage"))
            })
            .collect();

        let mut issues = Vec::new();
        for el in document.elements() {
            let is_error_box = el
                .classes()
                .iter()
                .any(|c| c.to_lowercase().contains("error"));
            if !is_error_box || el.is(CONTROL_TAGS) || el.is_hidden() || el.text().is_empty() {
                continue;
            }
            // Nested error markup is reported once, at the outermost box.
            if el.ancestors().any(|a| a.classes().iter().any(|c| c.to_lowercase().contains("error"))) {
                continue;
            }

            let announced = el.has_attr("aria-live")
                || matches!(el.attr_lower("role").as_deref(), Some("alert") | Some("status"));
            let linked = el.id().map(|id| referenced.contains(&id)).unwrap_or(false);
            if announced || linked {
                continue;
            }

            issues.push(
                el.issue(IssueKind::InaccessibleForms, Severity::Low)
                    .description("Error message is not announced to assistive technology")
                    .suggested_fix(
                        "Add role=\"alert\" or aria-live=\"polite\" to the message, or reference \
                         it from the field with aria-describedby.",
                    )
                    .wcag(&["3.3.1", "4.1.3"])
                    .build()?,
            );
        }
        Ok(issues)
    }

    fn check_form_structure(&self, form: &Element<'_>) -> Result<Vec<AccessibilityIssue>> {
        let mut issues = Vec::new();
        let controls: Vec<Element<'_>> = form
            .find(CONTROL_TAGS)
            .filter(|c| Self::input_type(c) != "hidden")
            .collect();
        if controls.is_empty() {
            return Ok(issues);
        }

        let named = attr_filled(form, "aria-label").is_some()
            || attr_filled(form, "aria-labelledby").is_some()
            || attr_filled(form, "title").is_some()
            || form
                .find(&["legend", "h1", "h2", "h3", "h4", "h5", "h6"])
                .next()
                .is_some();
        if !named {
            issues.push(
                form.issue(IssueKind::InaccessibleForms, Severity::Moderate)
                    .description("Form missing overall label or description")
                    .suggested_fix(
                        "Give the form a heading, a legend, or an aria-label stating its purpose.",
                    )
                    .wcag(&["1.3.1", "2.4.6"])
                    .build()?,
            );
        }

        if controls.len() > self.config.require_fieldset_above
            && form.find(&["fieldset"]).next().is_none()
        {
            issues.push(
                form.issue(IssueKind::InaccessibleForms, Severity::Low)
                    .description("Complex form missing fieldset/legend grouping")
                    .suggested_fix("Group related controls in <fieldset> elements with a <legend>.")
                    .wcag(&["1.3.1"])
                    .meta("control_count", controls.len())
                    .build()?,
            );
        }

        let has_submit = form.find(&["button", "input"]).any(|el| match el.tag() {
            "button" => matches!(el.attr_lower("type").as_deref(), None | Some("submit") | Some("")),
            _ => matches!(el.attr_lower("type").as_deref(), Some("submit") | Some("image")),
        });
        if !has_submit {
            issues.push(
                form.issue(IssueKind::InaccessibleForms, Severity::Moderate)
                    .description("Form missing submit button")
                    .suggested_fix(
                        "Add a <button type=\"submit\"> so the form can be submitted from the keyboard.",
                    )
                    .wcag(&["2.1.1", "3.2.2"])
                    .build()?,
            );
        }

        Ok(issues)
    }
}

impl Check for FormCheck {
    fn name(&self) -> &'static str {
        "forms"
    }

    fn evaluate(&self, document: &Document, _url: &str) -> Result<Vec<AccessibilityIssue>> {
        let mut issues = Vec::new();
        let labelled = label_targets(document);

        for control in document.find_by_tag(CONTROL_TAGS) {
            if control.is_hidden() {
                continue;
            }
            if self.config.require_labels {
                issues.extend(self.check_label(&control, &labelled)?);
            }
            if self.config.check_required_fields {
                issues.extend(self.check_required(&control)?);
            }
            if self.config.check_error_handling {
                issues.extend(self.check_invalid_state(&control)?);
            }
        }

        if self.config.check_error_handling {
            issues.extend(self.check_error_containers(document)?);
        }

        if self.config.check_form_structure {
            for form in document.find_by_tag(&["form"]) {
                issues.extend(self.check_form_structure(&form)?);
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

    fn labels_only() -> FormCheck {
        FormCheck::new(FormConfig {
            check_form_structure: false,
            ..FormConfig::default()
        })
    }

    #[test]
    fn label_for_matching_id_passes() {
        let issues = run(
            &labels_only(),
            r#"<body><div><label for="x">Email</label></div><div><input id="x" type="email"></div></body>"#,
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn label_for_unknown_id_is_flagged() {
        let issues = run(
            &labels_only(),
            r#"<body><label for="y">Email</label><input id="x" type="email" placeholder="you@example.com"></body>"#,
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind(), IssueKind::MissingFormLabels);
        assert_eq!(issues[0].severity(), Severity::Critical);
        assert_eq!(issues[0].metadata()["placeholder"], "you@example.com");
    }

    #[test]
    fn label_precedence() {
        let doc = Document::parse(
            r#"<body>
                <label for="a">A</label><label>Wrapped <input id="a"></label>
                <label>Wrapped <input id="b"></label>
                <input aria-label="Search">
                <span id="lbl">Name</span><input aria-labelledby="lbl">
                <input aria-labelledby="ghost" title="Phone">
                <select></select>
            </body>"#,
        );
        let labelled = label_targets(&doc);
        let sources: Vec<Option<LabelSource>> = doc
            .find_by_tag(CONTROL_TAGS)
            .iter()
            .map(|control| label_source(control, &labelled))
            .collect();
        assert_eq!(
            sources,
            vec![
                Some(LabelSource::ForAttribute),
                Some(LabelSource::Wrapping),
                Some(LabelSource::AriaLabel),
                Some(LabelSource::AriaLabelledby),
                Some(LabelSource::Title),
                None,
            ]
        );
        assert_eq!(LabelSource::Title.as_str(), "title");
    }

    #[test]
    fn buttons_and_hidden_inputs() {
        let issues = run(
            &labels_only(),
            r#"<body><input type="hidden" name="csrf"><input type="submit"><input type="button"><input type="button" value="Go"></body>"#,
        );
        assert_eq!(
            descriptions(&issues),
            vec!["Form element missing label: button input has no value".to_string()]
        );
    }

    #[test]
    fn required_and_invalid_fields() {
        let issues = run(
            &labels_only(),
            r#"<body>
                <label>Name <input required></label>
                <label>Email <input required aria-required="true" aria-invalid="true" aria-describedby="email-err"></label>
                <span id="email-err" role="alert">Enter an email</span>
                <label>Zip <input aria-invalid="true"></label>
                <div class="form-error">Something went wrong</div>
            </body>"#,
        );
        assert_eq!(
            descriptions(&issues),
            vec![
                "Required form element missing aria-required attribute: input".to_string(),
                "Form element with error missing aria-describedby: input".to_string(),
                "Error message is not announced to assistive technology".to_string(),
            ]
        );
    }

    #[test]
    fn form_structure() {
        let check = FormCheck::new(FormConfig::default());
        let issues = run(
            &check,
            r#"<body><form>
                <label>A <input></label><label>B <input></label>
                <label>C <input></label><label>D <input></label>
                <button type="button">Check</button>
            </form></body>"#,
        );
        assert_eq!(
            descriptions(&issues),
            vec![
                "Form missing overall label or description".to_string(),
                "Complex form missing fieldset/legend grouping".to_string(),
                "Form missing submit button".to_string(),
            ]
        );

        let issues = run(
            &check,
            r#"<body><form aria-label="Search"><label>Q <input type="search"></label><button>Go</button></form></body>"#,
        );
        assert!(issues.is_empty());
    }
}
