//! Consolidation of structurally similar issues.
//!
//! Issues sharing kind, severity, description and element shape fold into one
//! representative that carries the occurrence count and every affected
//! element. The fold is pure: inputs are never modified.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::models::{AccessibilityIssue, IssueKind, Severity};

lazy_static! {
    static ref TAG_NAME: Regex = Regex::new(r"^\s*<([A-Za-z][A-Za-z0-9-]*)").unwrap();
    static ref TYPE_ATTR: Regex = Regex::new(r#"\btype=["']([^"']*)["']"#).unwrap();
}

/// Elements spelled out before the rest are summarised as "and N more".
const SHOWN_ELEMENTS: usize = 3;

/// Metadata key holding the pre-consolidation description.
const BASE_DESCRIPTION: &str = "base_description";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Signature {
    kind: IssueKind,
    severity: Severity,
    description: String,
    shape: String,
}

/// `tag` or `tag:type` for a serialized element; anything that is not a tag
/// is its own shape.
fn element_shape(descriptor: &str) -> String {
    let Some(tag) = TAG_NAME.captures(descriptor).and_then(|c| c.get(1)) else {
        return descriptor.trim().to_string();
    };
    let tag = tag.as_str().to_lowercase();
    match TYPE_ATTR.captures(descriptor).and_then(|c| c.get(1)) {
        Some(kind) => format!("{}:{}", tag, kind.as_str().to_lowercase()),
        None => tag,
    }
}

fn signature(issue: &AccessibilityIssue) -> Signature {
    let first = issue
        .affected_elements()
        .into_iter()
        .next()
        .unwrap_or_else(|| issue.element().to_string());

    Signature {
        kind: issue.kind(),
        severity: issue.severity(),
        description: base_description(issue),
        shape: element_shape(&first),
    }
}

fn base_description(issue: &AccessibilityIssue) -> String {
    issue
        .metadata()
        .get(BASE_DESCRIPTION)
        .and_then(Value::as_str)
        .unwrap_or_else(|| issue.description())
        .to_string()
}

fn summary_description(base: &str, count: usize) -> String {
    let lowered = base.to_lowercase();
    if lowered.contains("missing label") {
        format!("{} form elements missing labels", count)
    } else if lowered.contains("missing alt") {
        format!("{} images missing alt text", count)
    } else if lowered.contains("missing heading") {
        format!("{} heading elements missing or improperly structured", count)
    } else {
        format!("{} instances: {}", count, base)
    }
}

fn summary_element(elements: &[String]) -> String {
    if elements.len() <= SHOWN_ELEMENTS {
        elements.join(", ")
    } else {
        format!("{}, {}, ... and {} more", elements[0], elements[1], elements.len() - 2)
    }
}

fn consolidate(group: &[&AccessibilityIssue]) -> AccessibilityIssue {
    let first = group[0];
    if group.len() == 1 {
        return first.clone();
    }

    let elements: Vec<String> = group
        .iter()
        .flat_map(|issue| issue.affected_elements())
        .filter(|e| !e.trim().is_empty())
        .collect();
    let base = base_description(first);

    first.consolidated(
        summary_description(&base, elements.len()),
        summary_element(&elements),
        elements,
        base,
    )
}

/// One pass: group by signature in first-seen order, fold each group.
fn fold(issues: &[AccessibilityIssue]) -> Vec<AccessibilityIssue> {
    let mut groups: Vec<(Signature, Vec<&AccessibilityIssue>)> = Vec::new();

    for issue in issues {
        let sig = signature(issue);
        match groups.iter_mut().find(|(existing, _)| *existing == sig) {
            Some((_, members)) => members.push(issue),
            None => groups.push((sig, vec![issue])),
        }
    }

    groups.iter().map(|(_, members)| consolidate(members)).collect()
}

/// Consolidates `issues`. Representatives keep their pre-consolidation text
/// as the grouping key, so deduplicating the output again returns it
/// unchanged.
pub fn deduplicate(issues: &[AccessibilityIssue]) -> Vec<AccessibilityIssue> {
    fold(issues)
}
