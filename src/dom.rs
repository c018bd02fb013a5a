//! Read-only element facade over a parsed page.
//!
//! Checks only ever see [`Document`] and [`Element`]; nothing outside this
//! module touches `scraper` types directly.

use ego_tree::NodeId;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::models::{AccessibilityIssue, IssueDraft, IssueKind, Severity, SourceLocation};

lazy_static! {
    static ref OPEN_TAG: Regex = Regex::new(r"<([a-zA-Z][a-zA-Z0-9-]*)[\s/>]").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Attributes kept when an element is serialized into an issue descriptor.
const DESCRIPTOR_ATTRS: &[&str] = &[
    "id", "class", "type", "name", "role", "href", "src", "alt", "for", "aria-label", "tabindex",
];

const DESCRIPTOR_VALUE_MAX: usize = 80;

/// Elements whose text never reaches the reader.
const NON_RENDERED: &[&str] = &["script", "style", "template", "noscript", "head"];

pub struct Document {
    html: Html,
    source: String,
    locations: HashMap<NodeId, SourceLocation>,
    /// First element carrying each id.
    ids: HashMap<String, NodeId>,
}

impl Document {
    pub fn parse(source: &str) -> Self {
        let html = Html::parse_document(source);
        let locations = index_locations(&html, source);
        let ids = index_ids(&html);

        Self {
            html,
            source: source.to_string(),
            locations,
            ids,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> Element<'_> {
        self.wrap(self.html.root_element())
    }

    /// Every element in document order.
    pub fn elements(&self) -> Vec<Element<'_>> {
        self.html
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .map(|node| self.wrap(node))
            .collect()
    }

    pub fn find_by_tag(&self, tags: &[&str]) -> Vec<Element<'_>> {
        self.elements()
            .into_iter()
            .filter(|el| tags.contains(&el.tag()))
            .collect()
    }

    /// Elements carrying `name`, optionally with an exact value.
    pub fn find_by_attribute(&self, name: &str, value: Option<&str>) -> Vec<Element<'_>> {
        self.elements()
            .into_iter()
            .filter(|el| match (el.attr(name), value) {
                (Some(actual), Some(expected)) => actual == expected,
                (Some(_), None) => true,
                (None, _) => false,
            })
            .collect()
    }

    pub fn find_by_id(&self, id: &str) -> Option<Element<'_>> {
        let node = self.html.tree.get(*self.ids.get(id)?)?;
        ElementRef::wrap(node).map(|node| self.wrap(node))
    }

    pub fn has_id(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    /// Every id present on the page.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.ids.keys().map(String::as_str)
    }

    pub fn title(&self) -> Option<String> {
        self.find_by_tag(&["title"])
            .first()
            .map(|el| el.raw_text())
            .filter(|t| !t.is_empty())
    }

    /// `content` of the first `<meta name=...>` matching case-insensitively.
    pub fn meta_content(&self, name: &str) -> Option<String> {
        self.find_by_tag(&["meta"])
            .into_iter()
            .find(|el| {
                el.attr("name")
                    .map(|n| n.eq_ignore_ascii_case(name))
                    .unwrap_or(false)
            })
            .and_then(|el| el.attr("content").map(|c| c.trim().to_string()))
    }

    pub fn body(&self) -> Option<Element<'_>> {
        self.find_by_tag(&["body"]).into_iter().next()
    }

    /// Rendered text of the body, whitespace-collapsed.
    pub fn visible_text(&self) -> String {
        self.body().unwrap_or_else(|| self.root()).text()
    }

    pub fn has_visible_content(&self) -> bool {
        if !self.visible_text().is_empty() {
            return true;
        }
        !self
            .find_by_tag(&["img", "svg", "video", "audio", "iframe", "canvas", "input", "button", "select", "textarea"])
            .is_empty()
    }

    fn wrap<'a>(&'a self, node: ElementRef<'a>) -> Element<'a> {
        Element { node, doc: self }
    }
}

/// A borrowed element of a [`Document`].
#[derive(Clone, Copy)]
pub struct Element<'a> {
    node: ElementRef<'a>,
    doc: &'a Document,
}

impl<'a> Element<'a> {
    pub fn tag(&self) -> &'a str {
        self.node.value().name()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.node.value().attr(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Attribute value trimmed and lowercased, if present.
    pub fn attr_lower(&self, name: &str) -> Option<String> {
        self.attr(name).map(|v| v.trim().to_lowercase())
    }

    pub fn attributes(&self) -> Vec<(&'a str, &'a str)> {
        self.node.value().attrs().collect()
    }

    pub fn id(&self) -> Option<&'a str> {
        self.node.value().id()
    }

    pub fn classes(&self) -> Vec<&'a str> {
        self.node.value().classes().collect()
    }

    pub fn is(&self, tags: &[&str]) -> bool {
        tags.contains(&self.tag())
    }

    /// Rendered text, whitespace-collapsed, skipping scripts and styles.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(*self.node, &mut out);
        collapse(&out)
    }

    /// All descendant text, scripts and styles included.
    pub fn raw_text(&self) -> String {
        collapse(&self.node.text().collect::<String>())
    }

    /// Untrimmed text content, for reading `<style>` and `<script>` bodies.
    pub fn inner_source(&self) -> String {
        self.node.text().collect()
    }

    pub fn parent(&self) -> Option<Element<'a>> {
        let doc = self.doc;
        self.node
            .parent()
            .and_then(ElementRef::wrap)
            .map(|node| Element { node, doc })
    }

    /// Enclosing elements, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = Element<'a>> + 'a {
        let doc = self.doc;
        self.node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .map(move |node| Element { node, doc })
    }

    pub fn has_ancestor(&self, tags: &[&str]) -> bool {
        self.ancestors().any(|a| a.is(tags))
    }

    pub fn children(&self) -> impl Iterator<Item = Element<'a>> + 'a {
        let doc = self.doc;
        self.node
            .children()
            .filter_map(ElementRef::wrap)
            .map(move |node| Element { node, doc })
    }

    /// Descendant elements in document order, excluding `self`.
    pub fn descendants(&self) -> impl Iterator<Item = Element<'a>> + 'a {
        let doc = self.doc;
        let own = self.node.id();
        self.node
            .descendants()
            .filter(move |n| n.id() != own)
            .filter_map(ElementRef::wrap)
            .map(move |node| Element { node, doc })
    }

    pub fn find(&self, tags: &'a [&'a str]) -> impl Iterator<Item = Element<'a>> + 'a {
        self.descendants().filter(move |el| el.is(tags))
    }

    pub fn following_siblings(&self) -> impl Iterator<Item = Element<'a>> + 'a {
        let doc = self.doc;
        self.node
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .map(move |node| Element { node, doc })
    }

    pub fn document(&self) -> &'a Document {
        self.doc
    }

    pub fn source_location(&self) -> Option<SourceLocation> {
        self.doc.locations.get(&self.node.id()).copied()
    }

    /// Two enclosing levels, outermost first, e.g. `<main> > <section>`.
    pub fn context(&self) -> String {
        let mut chain: Vec<String> = self
            .ancestors()
            .take(2)
            .map(|a| format!("<{}>", a.tag()))
            .collect();

        if chain.is_empty() {
            return "unknown".to_string();
        }
        chain.reverse();
        chain.join(" > ")
    }

    /// Opening tag with the attributes that identify the element.
    pub fn descriptor(&self) -> String {
        let mut out = format!("<{}", self.tag());
        for name in DESCRIPTOR_ATTRS {
            if let Some(value) = self.attr(name) {
                let value: String = value.chars().take(DESCRIPTOR_VALUE_MAX).collect();
                out.push_str(&format!(" {}=\"{}\"", name, value.replace('"', "'")));
            }
        }
        out.push('>');
        out
    }

    /// Metadata describing the element, attached to issues.
    pub fn info(&self) -> Map<String, Value> {
        let mut info = Map::new();
        info.insert("tag".to_string(), Value::from(self.tag()));
        if let Some(id) = self.id() {
            info.insert("id".to_string(), Value::from(id));
        }
        let classes = self.classes();
        if !classes.is_empty() {
            info.insert("classes".to_string(), Value::from(classes));
        }
        info
    }

    /// Hidden from everyone, or from assistive technology, by itself or an
    /// ancestor.
    pub fn is_hidden(&self) -> bool {
        std::iter::once(*self)
            .chain(self.ancestors())
            .any(|el| el.hides_itself())
    }

    fn hides_itself(&self) -> bool {
        if self.has_attr("hidden") {
            return true;
        }
        if self.attr_lower("aria-hidden").as_deref() == Some("true") {
            return true;
        }
        if self.tag() == "input" && self.attr_lower("type").as_deref() == Some("hidden") {
            return true;
        }
        match self.attr("style") {
            Some(style) => {
                let style: String = style.to_lowercase().split_whitespace().collect();
                style.contains("display:none") || style.contains("visibility:hidden")
            }
            None => false,
        }
    }

    /// Issue draft anchored at this element.
    pub fn issue(&self, kind: IssueKind, severity: Severity) -> IssueDraft {
        AccessibilityIssue::draft(kind, severity)
            .element(self.descriptor())
            .context(self.context())
            .location(self.source_location())
            .extend_meta(self.info())
    }
}

impl std::fmt::Debug for Element<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.descriptor())
    }
}

fn collect_text(node: ego_tree::NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if NON_RENDERED.contains(&el.name()) => {}
            Node::Element(_) => collect_text(child, out),
            _ => {}
        }
    }
}

pub fn collapse(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Pairs the n-th parsed element of each tag with the n-th `<tag` in the
/// source. Elements the parser invented get no location.
fn index_ids(html: &Html) -> HashMap<String, NodeId> {
    let mut ids = HashMap::new();
    for node in html.tree.root().descendants().filter_map(ElementRef::wrap) {
        if let Some(id) = node.value().id() {
            ids.entry(id.to_string()).or_insert(node.id());
        }
    }
    ids
}

fn index_locations(html: &Html, source: &str) -> HashMap<NodeId, SourceLocation> {
    let mut occurrences: HashMap<String, Vec<usize>> = HashMap::new();
    for caps in OPEN_TAG.captures_iter(source) {
        if let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) {
            occurrences
                .entry(name.as_str().to_lowercase())
                .or_default()
                .push(whole.start());
        }
    }

    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(source.match_indices('\n').map(|(i, _)| i + 1))
        .collect();

    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut locations = HashMap::new();

    for node in html.tree.root().descendants().filter_map(ElementRef::wrap) {
        let tag = node.value().name();
        let index = seen.entry(tag).or_insert(0);
        if let Some(offset) = occurrences.get(tag).and_then(|o| o.get(*index)) {
            let line = line_starts.partition_point(|start| *start <= *offset);
            let column = offset - line_starts[line - 1] + 1;
            locations.insert(node.id(), SourceLocation { line, column });
        }
        *index += 1;
    }

    locations
}
