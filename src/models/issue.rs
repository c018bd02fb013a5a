use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{AppError, Result};

/// Issue severity, ordered so that `Critical > Moderate > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Moderate,
    Critical,
}

impl Severity {
    /// Weight used by the accessibility score.
    pub fn weight(self) -> u32 {
        match self {
            Severity::Critical => 3,
            Severity::Moderate => 2,
            Severity::Low => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Moderate => "moderate",
            Severity::Low => "low",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "critical" => Some(Severity::Critical),
            "moderate" => Some(Severity::Moderate),
            "low" => Some(Severity::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingAltText,
    PoorColorContrast,
    ImproperHeadingHierarchy,
    MissingFormLabels,
    NonDescriptiveLinks,
    MissingAriaLabels,
    KeyboardNavigation,
    MissingLandmarks,
    InaccessibleForms,
    MissingSkipLinks,
    Other,
}

impl IssueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueKind::MissingAltText => "missing_alt_text",
            IssueKind::PoorColorContrast => "poor_color_contrast",
            IssueKind::ImproperHeadingHierarchy => "improper_heading_hierarchy",
            IssueKind::MissingFormLabels => "missing_form_labels",
            IssueKind::NonDescriptiveLinks => "non_descriptive_links",
            IssueKind::MissingAriaLabels => "missing_aria_labels",
            IssueKind::KeyboardNavigation => "keyboard_navigation",
            IssueKind::MissingLandmarks => "missing_landmarks",
            IssueKind::InaccessibleForms => "inaccessible_forms",
            IssueKind::MissingSkipLinks => "missing_skip_links",
            IssueKind::Other => "other",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Approximate 1-based position of an element in the page source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

/// A single reported defect. Values are immutable; the deduplication pass
/// builds new consolidated issues instead of editing existing ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IssueDraft")]
pub struct AccessibilityIssue {
    #[serde(rename = "type")]
    kind: IssueKind,
    severity: Severity,
    description: String,
    element: String,
    context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_location: Option<SourceLocation>,
    suggested_fix: String,
    wcag_refs: Vec<String>,
    metadata: Map<String, Value>,
}

impl AccessibilityIssue {
    pub fn draft(kind: IssueKind, severity: Severity) -> IssueDraft {
        IssueDraft::new(kind, severity)
    }

    pub fn kind(&self) -> IssueKind {
        self.kind
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn element(&self) -> &str {
        &self.element
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn source_location(&self) -> Option<SourceLocation> {
        self.source_location
    }

    pub fn suggested_fix(&self) -> &str {
        &self.suggested_fix
    }

    pub fn wcag_refs(&self) -> &[String] {
        &self.wcag_refs
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Number of occurrences this issue stands for (1 unless consolidated).
    pub fn occurrences(&self) -> usize {
        self.metadata
            .get("count")
            .and_then(Value::as_u64)
            .map(|c| c as usize)
            .unwrap_or(1)
    }

    /// Every element descriptor this issue stands for.
    pub fn affected_elements(&self) -> Vec<String> {
        match self.metadata.get("all_elements").and_then(Value::as_array) {
            Some(all) => all
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            None => vec![self.element.clone()],
        }
    }

    /// Representative of a group of similar issues. Only the deduplicator
    /// builds these.
    pub(crate) fn consolidated(
        &self,
        description: String,
        element: String,
        all_elements: Vec<String>,
        base_description: String,
    ) -> Self {
        let mut metadata = self.metadata.clone();
        metadata.insert("base_description".to_string(), Value::from(base_description));
        metadata.insert("count".to_string(), Value::from(all_elements.len()));
        metadata.insert(
            "all_elements".to_string(),
            Value::Array(all_elements.into_iter().map(Value::String).collect()),
        );

        Self {
            description,
            element,
            metadata,
            ..self.clone()
        }
    }
}

/// Unvalidated issue fields. `build` rejects blank text fields.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueDraft {
    #[serde(rename = "type")]
    kind: IssueKind,
    severity: Severity,
    #[serde(default)]
    description: String,
    #[serde(default)]
    element: String,
    #[serde(default)]
    context: String,
    #[serde(default)]
    source_location: Option<SourceLocation>,
    #[serde(default)]
    suggested_fix: String,
    #[serde(default)]
    wcag_refs: Vec<String>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl IssueDraft {
    pub fn new(kind: IssueKind, severity: Severity) -> Self {
        Self {
            kind,
            severity,
            description: String::new(),
            element: String::new(),
            context: String::new(),
            source_location: None,
            suggested_fix: String::new(),
            wcag_refs: Vec::new(),
            metadata: Map::new(),
        }
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    pub fn element(mut self, descriptor: impl Into<String>) -> Self {
        self.element = descriptor.into();
        self
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn location(mut self, location: Option<SourceLocation>) -> Self {
        self.source_location = location;
        self
    }

    pub fn suggested_fix(mut self, text: impl Into<String>) -> Self {
        self.suggested_fix = text.into();
        self
    }

    pub fn wcag(mut self, refs: &[&str]) -> Self {
        self.wcag_refs = refs.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn extend_meta(mut self, entries: Map<String, Value>) -> Self {
        self.metadata.extend(entries);
        self
    }

    pub fn build(self) -> Result<AccessibilityIssue> {
        if self.description.trim().is_empty() {
            return Err(AppError::InvalidIssue(format!(
                "{} issue has an empty description",
                self.kind
            )));
        }
        if self.suggested_fix.trim().is_empty() {
            return Err(AppError::InvalidIssue(format!(
                "{} issue has an empty suggested fix",
                self.kind
            )));
        }
        if self.element.trim().is_empty() {
            return Err(AppError::InvalidIssue(format!(
                "{} issue has an empty element descriptor",
                self.kind
            )));
        }

        let context = if self.context.trim().is_empty() {
            "unknown".to_string()
        } else {
            self.context
        };

        Ok(AccessibilityIssue {
            kind: self.kind,
            severity: self.severity,
            description: self.description,
            element: self.element,
            context,
            source_location: self.source_location,
            suggested_fix: self.suggested_fix,
            wcag_refs: self.wcag_refs,
            metadata: self.metadata,
        })
    }
}

impl TryFrom<IssueDraft> for AccessibilityIssue {
    type Error = AppError;

    fn try_from(draft: IssueDraft) -> Result<Self> {
        draft.build()
    }
}
