use lazy_static::lazy_static;
use regex::Regex;

use super::{attr_filled, labelledby_text, Check};
use crate::config::LinkConfig;
use crate::dom::{Document, Element};
use crate::error::Result;
use crate::models::{AccessibilityIssue, IssueKind, Severity};

lazy_static! {
    static ref PUNCTUATION: Regex = Regex::new(r"[\s\-–—:;,.!?()\[\]{}«»>]+").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VagueCategory {
    Actions,
    Navigation,
    Content,
    Generic,
    Form,
    Social,
}

impl VagueCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            VagueCategory::Actions => "actions",
            VagueCategory::Navigation => "navigation",
            VagueCategory::Content => "content",
            VagueCategory::Generic => "generic",
            VagueCategory::Form => "form",
            VagueCategory::Social => "social",
        }
    }

    fn suggested_fix(self) -> &'static str {
        match self {
            VagueCategory::Actions => {
                "Name the result of the action instead of the gesture, e.g. \
                 \"Download the 2024 price list (PDF)\" rather than \"Click here\"."
            }
            VagueCategory::Navigation => {
                "Name the destination page, e.g. \"Next: Installation guide\" rather than \"Next\"."
            }
            VagueCategory::Content => {
                "Say what the reader will find, e.g. \"Read more about our pricing plans\"."
            }
            VagueCategory::Generic => {
                "Use link text that identifies the specific page or resource it points to."
            }
            VagueCategory::Form => "Describe what the form does, e.g. \"Search the product catalogue\".",
            VagueCategory::Social => {
                "Name the network and the content, e.g. \"Share this article on Mastodon\"."
            }
        }
    }
}

/// Link text that says nothing on its own, by category.
const VAGUE_PHRASES: &[(&str, VagueCategory)] = &[
    ("click here", VagueCategory::Actions),
    ("click this", VagueCategory::Actions),
    ("tap here", VagueCategory::Actions),
    ("press here", VagueCategory::Actions),
    ("click", VagueCategory::Actions),
    ("tap", VagueCategory::Actions),
    ("press", VagueCategory::Actions),
    ("select", VagueCategory::Actions),
    ("choose", VagueCategory::Actions),
    ("browse", VagueCategory::Actions),
    ("view", VagueCategory::Actions),
    ("see", VagueCategory::Actions),
    ("show", VagueCategory::Actions),
    ("display", VagueCategory::Actions),
    ("open", VagueCategory::Actions),
    ("download", VagueCategory::Actions),
    ("get", VagueCategory::Actions),
    ("find", VagueCategory::Actions),
    ("look", VagueCategory::Actions),
    ("check", VagueCategory::Actions),
    ("verify", VagueCategory::Actions),
    ("start", VagueCategory::Actions),
    ("try", VagueCategory::Actions),
    ("go", VagueCategory::Actions),
    ("here", VagueCategory::Navigation),
    ("there", VagueCategory::Navigation),
    ("this", VagueCategory::Navigation),
    ("that", VagueCategory::Navigation),
    ("this link", VagueCategory::Navigation),
    ("link", VagueCategory::Navigation),
    ("next", VagueCategory::Navigation),
    ("previous", VagueCategory::Navigation),
    ("back", VagueCategory::Navigation),
    ("forward", VagueCategory::Navigation),
    ("continue", VagueCategory::Navigation),
    ("home", VagueCategory::Navigation),
    ("page", VagueCategory::Navigation),
    ("url", VagueCategory::Navigation),
    ("read more", VagueCategory::Content),
    ("learn more", VagueCategory::Content),
    ("see more", VagueCategory::Content),
    ("view more", VagueCategory::Content),
    ("more info", VagueCategory::Content),
    ("more information", VagueCategory::Content),
    ("more details", VagueCategory::Content),
    ("details", VagueCategory::Content),
    ("info", VagueCategory::Content),
    ("information", VagueCategory::Content),
    ("more", VagueCategory::Content),
    ("about", VagueCategory::Generic),
    ("services", VagueCategory::Generic),
    ("products", VagueCategory::Generic),
    ("website", VagueCategory::Generic),
    ("article", VagueCategory::Generic),
    ("post", VagueCategory::Generic),
    ("search", VagueCategory::Form),
    ("submit", VagueCategory::Form),
    ("send", VagueCategory::Form),
    ("share", VagueCategory::Social),
    ("like", VagueCategory::Social),
    ("follow", VagueCategory::Social),
    ("tweet", VagueCategory::Social),
    ("pin it", VagueCategory::Social),
];

/// Words that make the rest of a link text specific enough.
const MEANINGFUL_WORDS: &[&str] = &[
    "report", "guide", "policy", "documentation", "manual", "pdf", "application", "form",
    "schedule", "pricing", "price", "contact", "account", "profile", "settings", "tutorial",
    "video", "course", "product", "service", "annual", "accessibility", "article", "blog",
    "news", "event", "events", "faq", "support", "team", "career", "careers", "terms",
    "privacy", "license", "release", "notes", "download", "brochure", "catalogue", "catalog",
];

const NEW_WINDOW_HINTS: &[&str] = &[
    "opens in new window", "opens in a new window", "new window", "opens in new tab",
    "opens in a new tab", "new tab", "external link", "external site",
];

/// Lowercased link text with punctuation folded into single spaces.
pub fn sanitize(text: &str) -> String {
    PUNCTUATION
        .replace_all(&text.to_lowercase(), " ")
        .trim()
        .to_string()
}

fn contains_phrase(text: &str, phrase: &str) -> bool {
    text == phrase
        || text.starts_with(&format!("{} ", phrase))
        || text.ends_with(&format!(" {}", phrase))
        || text.contains(&format!(" {} ", phrase))
}

fn strip_phrase(text: &str, phrase: &str) -> String {
    let padded = format!(" {} ", text);
    let stripped = padded.replacen(&format!(" {} ", phrase), " ", 1);
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub struct LinkCheck {
    config: LinkConfig,
}

impl LinkCheck {
    pub fn new(config: LinkConfig) -> Self {
        Self { config }
    }

    /// Category when `text` does not identify its destination.
    pub fn vague_category(&self, text: &str) -> Option<VagueCategory> {
        let sanitized = sanitize(text);
        if sanitized.is_empty() {
            return None;
        }

        if let Some((_, category)) = VAGUE_PHRASES.iter().find(|(p, _)| *p == sanitized) {
            return Some(*category);
        }

        if sanitized.chars().count() < 3 {
            return Some(VagueCategory::Generic);
        }

        // Longest vague phrase embedded in a longer text.
        let embedded = VAGUE_PHRASES
            .iter()
            .filter(|(p, _)| contains_phrase(&sanitized, p))
            .max_by_key(|(p, _)| p.len());

        let (phrase, category) = embedded?;
        let escapes = if self.config.check_context_awareness {
            let remaining = strip_phrase(&sanitized, phrase);
            remaining.chars().count() > 8
                || remaining
                    .split_whitespace()
                    .any(|w| MEANINGFUL_WORDS.contains(&w))
        } else {
            sanitized.chars().count() > phrase.chars().count() + 8
        };

        if escapes {
            None
        } else {
            Some(*category)
        }
    }

    fn accessible_name(link: &Element<'_>) -> String {
        attr_filled(link, "aria-label")
            .map(str::to_string)
            .or_else(|| labelledby_text(link))
            .unwrap_or_else(|| link.text())
    }

    fn images<'a>(link: &Element<'a>) -> Vec<Element<'a>> {
        link.find(&["img", "svg"]).collect()
    }

    fn image_alternative(image: &Element<'_>) -> bool {
        match image.tag() {
            "img" => attr_filled(image, "alt").is_some() || attr_filled(image, "aria-label").is_some(),
            _ => {
                attr_filled(image, "aria-label").is_some()
                    || image.find(&["title"]).any(|t| !t.raw_text().is_empty())
            }
        }
    }

    fn check_link(&self, link: &Element<'_>) -> Result<Vec<AccessibilityIssue>> {
        let mut issues = Vec::new();
        let name = Self::accessible_name(link);
        let title = attr_filled(link, "title");
        let images = Self::images(link);
        let href = link.attr("href").unwrap_or("");

        if name.is_empty() {
            if images.is_empty() {
                if self.config.check_empty_links && title.is_none() {
                    issues.push(
                        link.issue(IssueKind::NonDescriptiveLinks, Severity::Critical)
                            .description("Link has no text content")
                            .suggested_fix(
                                "Add link text describing the destination, or an aria-label \
                                 for icon links.",
                            )
                            .wcag(&["2.4.4", "4.1.2"])
                            .meta("href", href)
                            .build()?,
                    );
                }
            } else if self.config.check_image_links
                && !images.iter().any(Self::image_alternative)
            {
                issues.push(
                    link.issue(IssueKind::MissingAltText, Severity::Critical)
                        .description("Image link has no alternative text")
                        .suggested_fix(
                            "Give the image alt text describing the link destination, or add an \
                             aria-label to the link.",
                        )
                        .wcag(&["1.1.1", "2.4.4"])
                        .meta("href", href)
                        .meta("image_count", images.len())
                        .build()?,
                );
            }
        } else if self.config.check_descriptive_text {
            if let Some(category) = self.vague_category(&name) {
                issues.push(
                    link.issue(IssueKind::NonDescriptiveLinks, Severity::Moderate)
                        .description(format!("Non-descriptive link text: '{}'", name))
                        .suggested_fix(category.suggested_fix())
                        .wcag(&["2.4.4", "2.4.9"])
                        .meta("link_text", name.clone())
                        .meta("category", category.as_str())
                        .meta("href", href)
                        .build()?,
                );
            }
        }

        if self.config.check_new_window
            && link.attr_lower("target").as_deref() == Some("_blank")
        {
            let hint_source = format!(
                "{} {} {}",
                name.to_lowercase(),
                title.unwrap_or("").to_lowercase(),
                link.text().to_lowercase()
            );
            if !NEW_WINDOW_HINTS.iter().any(|h| hint_source.contains(h)) {
                issues.push(
                    link.issue(IssueKind::NonDescriptiveLinks, Severity::Low)
                        .description("Link opens in a new window without warning")
                        .suggested_fix(
                            "Tell users the link opens a new window, e.g. with visible text or \
                             \"(opens in new tab)\" in the accessible name.",
                        )
                        .wcag(&["3.2.5"])
                        .meta("href", href)
                        .build()?,
                );
            }
        }

        Ok(issues)
    }

    fn check_same_text(&self, links: &[Element<'_>]) -> Result<Vec<AccessibilityIssue>> {
        let mut groups: Vec<(String, Vec<&Element<'_>>)> = Vec::new();
        for link in links {
            let key = sanitize(&Self::accessible_name(link));
            if key.is_empty() {
                continue;
            }
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, members)) => members.push(link),
                None => groups.push((key, vec![link])),
            }
        }

        let mut issues = Vec::new();
        for (_, members) in groups {
            let mut hrefs: Vec<&str> = Vec::new();
            for member in &members {
                let href = member.attr("href").unwrap_or("").trim();
                if !hrefs.contains(&href) {
                    hrefs.push(href);
                }
            }
            if hrefs.len() < 2 {
                continue;
            }

            let first = members[0];
            let text = Self::accessible_name(first);
            issues.push(
                first
                    .issue(IssueKind::NonDescriptiveLinks, Severity::Moderate)
                    .description(format!(
                        "Multiple links with the same text '{}' point to different destinations",
                        text
                    ))
                    .suggested_fix(
                        "Make each link text unique to its destination, or point links with the \
                         same text at the same URL.",
                    )
                    .wcag(&["2.4.4", "2.4.9"])
                    .meta("link_count", members.len())
                    .meta("destinations", hrefs)
                    .build()?,
            );
        }
        Ok(issues)
    }
}

impl Check for LinkCheck {
    fn name(&self) -> &'static str {
        "links"
    }

    fn evaluate(&self, document: &Document, _url: &str) -> Result<Vec<AccessibilityIssue>> {
        let links: Vec<Element<'_>> = document
            .find_by_tag(&["a"])
            .into_iter()
            .filter(|a| a.has_attr("href") && !a.is_hidden())
            .collect();

        let mut issues = Vec::new();
        for link in &links {
            issues.extend(self.check_link(link)?);
        }

        if self.config.check_same_text_links {
            issues.extend(self.check_same_text(&links)?);
        }

        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::{descriptions, run};
    use pretty_assertions::assert_eq;

    fn check() -> LinkCheck {
        LinkCheck::new(LinkConfig::default())
    }

    #[test]
    fn click_here_is_vague_but_context_rescues_it() {
        let check = check();
        assert_eq!(check.vague_category("Click here"), Some(VagueCategory::Actions));
        assert_eq!(check.vague_category("Read more..."), Some(VagueCategory::Content));
        assert_eq!(
            check.vague_category("Click here to download the 2023 Annual Accessibility Report"),
            None
        );
        assert_eq!(check.vague_category("More pricing"), None);
        assert_eq!(check.vague_category("Our community garden project"), None);
        assert_eq!(check.vague_category("ok"), Some(VagueCategory::Generic));
    }

    #[test]
    fn legacy_length_rule_without_context_awareness() {
        let check = LinkCheck::new(LinkConfig {
            check_context_awareness: false,
            ..LinkConfig::default()
        });
        // "more pricing" is not more than 8 characters longer than "more"
        assert_eq!(check.vague_category("More pricing"), Some(VagueCategory::Content));
    }

    #[test]
    fn flags_vague_link_text() {
        let issues = run(
            &check(),
            r#"<body><p>Report is out. <a href="/r.pdf">Click here</a></p>
               <a href="/r.pdf">Click here to download the 2023 Annual Accessibility Report</a></body>"#,
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].description(), "Non-descriptive link text: 'Click here'");
        assert_eq!(issues[0].metadata()["category"], "actions");
    }

    #[test]
    fn empty_and_image_links() {
        let issues = run(
            &check(),
            r#"<body>
                <a href="/a"></a>
                <a href="/b"><img src="b.png"></a>
                <a href="/c"><img src="c.png" alt="Company home page"></a>
                <a href="/d" aria-label="Close dialog"><svg></svg></a>
                <a name="anchor"></a>
            </body>"#,
        );
        assert_eq!(
            descriptions(&issues),
            vec![
                "Link has no text content".to_string(),
                "Image link has no alternative text".to_string(),
            ]
        );
    }

    #[test]
    fn new_window_and_same_text() {
        let issues = run(
            &check(),
            r#"<body>
                <a href="https://a.example" target="_blank">Partner portal</a>
                <a href="https://b.example" target="_blank">Partner portal (opens in new tab)</a>
                <a href="/pricing">Pricing plans</a>
                <a href="/plans">Pricing plans</a>
                <a href="/pricing">Pricing plans</a>
            </body>"#,
        );
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].description(), "Link opens in a new window without warning");
        assert_eq!(issues[1].metadata()["link_count"], 3);
        assert_eq!(
            issues[1].metadata()["destinations"],
            serde_json::json!(["/pricing", "/plans"])
        );
    }
}
