use lazy_static::lazy_static;
use regex::Regex;

use super::Check;
use crate::config::AltTextConfig;
use crate::dom::{Document, Element};
use crate::error::Result;
use crate::models::{AccessibilityIssue, IssueKind, Severity};

lazy_static! {
    static ref FILENAME_ALT: Regex =
        Regex::new(r"(?i)^[\w\-. ]+\.(jpe?g|png|gif|svg|webp|bmp|ico|avif)$").unwrap();
}

/// Alt values that say nothing about the image.
const GENERIC_ALT_TERMS: &[&str] = &[
    "image", "images", "photo", "photos", "picture", "pic", "img", "graphic", "icon", "logo",
    "banner", "placeholder", "spacer", "untitled", "click here", "read more", "learn more",
    "more info",
];

const FILLER_WORDS: &[&str] = &["a", "an", "the", "of", "this", "my", "our", "here", "is"];

const DECORATIVE_CLASSES: &[&str] = &["decorative", "ornamental", "background", "bg", "decoration"];

pub struct AltTextCheck {
    config: AltTextConfig,
}

impl AltTextCheck {
    pub fn new(config: AltTextConfig) -> Self {
        Self { config }
    }

    fn is_decorative(img: &Element<'_>) -> bool {
        if img
            .classes()
            .iter()
            .any(|c| DECORATIVE_CLASSES.iter().any(|d| c.to_lowercase().contains(d)))
        {
            return true;
        }

        if matches!(img.attr_lower("role").as_deref(), Some("presentation") | Some("none")) {
            return true;
        }

        if img.attr_lower("aria-hidden").as_deref() == Some("true") {
            return true;
        }

        let dimension = |name: &str| {
            img.attr(name)
                .and_then(|v| v.trim().trim_end_matches("px").parse::<u32>().ok())
        };
        matches!((dimension("width"), dimension("height")), (Some(w), Some(h)) if w <= 32 && h <= 32)
    }

    fn inadequate_reason(alt: &str) -> Option<&'static str> {
        let trimmed = alt.trim();
        if trimmed.chars().count() < 3 {
            return Some("too short");
        }
        if FILENAME_ALT.is_match(trimmed) {
            return Some("file name");
        }

        let lower = trimmed.to_lowercase();
        if GENERIC_ALT_TERMS.contains(&lower.as_str()) {
            return Some("generic term");
        }

        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty() && !FILLER_WORDS.contains(w))
            .collect();
        if !words.is_empty() && words.iter().all(|w| GENERIC_ALT_TERMS.contains(w)) {
            return Some("generic term");
        }

        None
    }
}

impl Check for AltTextCheck {
    fn name(&self) -> &'static str {
        "alt_text"
    }

    fn evaluate(&self, document: &Document, _url: &str) -> Result<Vec<AccessibilityIssue>> {
        let mut issues = Vec::new();

        for img in document.find_by_tag(&["img"]) {
            let src = img.attr("src").unwrap_or("");
            let decorative = Self::is_decorative(&img);

            match img.attr("alt") {
                None => {
                    // Hidden images are decorative by definition.
                    if self.config.ignore_decorative && (decorative || img.is_hidden()) {
                        continue;
                    }
                    issues.push(
                        img.issue(IssueKind::MissingAltText, Severity::Critical)
                            .description(format!("Image missing alt attribute: {}", src))
                            .suggested_fix(
                                "Add an alt attribute. Describe what the image shows and why it \
                                 is there, or use alt=\"\" if the image is purely decorative.",
                            )
                            .wcag(&["1.1.1"])
                            .meta("src", src)
                            .build()?,
                    );
                }
                // Empty alt marks the image as decorative.
                Some(alt) if alt.trim().is_empty() => {}
                Some(alt) => {
                    let inadequate = if self.config.require_descriptive {
                        Self::inadequate_reason(alt)
                    } else {
                        None
                    };

                    if let Some(reason) = inadequate {
                        issues.push(
                            img.issue(IssueKind::MissingAltText, Severity::Moderate)
                                .description(format!("Inadequate alt text '{}' for image {}", alt, src))
                                .suggested_fix(
                                    "Describe what the image shows and its purpose. Avoid generic \
                                     words like 'image' or 'photo' and file names.",
                                )
                                .wcag(&["1.1.1"])
                                .meta("alt", alt)
                                .meta("reason", reason)
                                .meta("src", src)
                                .build()?,
                        );
                    } else if decorative && self.config.ignore_decorative {
                        issues.push(
                            img.issue(IssueKind::MissingAltText, Severity::Low)
                                .description(format!(
                                    "Decorative image should have empty alt text: {}",
                                    src
                                ))
                                .suggested_fix(format!(
                                    "Change alt=\"{}\" to alt=\"\" so screen readers skip this image.",
                                    alt
                                ))
                                .wcag(&["1.1.1"])
                                .meta("alt", alt)
                                .meta("src", src)
                                .build()?,
                        );
                    }
                }
            }
        }

        // Image buttons and image map areas need alternatives too.
        for el in document.find_by_tag(&["input", "area"]) {
            let is_image_input =
                el.tag() == "input" && el.attr_lower("type").as_deref() == Some("image");
            let is_area = el.tag() == "area" && el.has_attr("href");
            if !(is_image_input || is_area) || el.is_hidden() {
                continue;
            }
            let has_alt = el.attr("alt").map(|a| !a.trim().is_empty()).unwrap_or(false)
                || super::attr_filled(&el, "aria-label").is_some();
            if !has_alt {
                issues.push(
                    el.issue(IssueKind::MissingAltText, Severity::Critical)
                        .description(format!("<{}> missing alternative text", el.tag()))
                        .suggested_fix("Add alt text describing the action or destination.")
                        .wcag(&["1.1.1", "4.1.2"])
                        .build()?,
                );
            }
        }

        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::run;

    fn check() -> AltTextCheck {
        AltTextCheck::new(AltTextConfig::default())
    }

    #[test]
    fn missing_alt_is_critical() {
        let issues = run(&check(), r#"<body><img src="team.jpg"></body>"#);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity(), Severity::Critical);
        assert_eq!(issues[0].kind(), IssueKind::MissingAltText);
    }

    #[test]
    fn empty_alt_is_not_flagged() {
        let issues = run(&check(), r#"<body><img src="divider.png" alt=""></body>"#);
        assert!(issues.is_empty());
    }

    #[test]
    fn generic_alt_is_flagged() {
        let issues = run(
            &check(),
            r#"<body><img src="a.png" alt="image"><img src="b.png" alt="A photo"><img src="c.png" alt="IMG_2041.jpg"><img src="d.png" alt="Volunteers planting trees in the park"></body>"#,
        );
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(|i| i.severity() == Severity::Moderate));
        assert_eq!(issues[2].metadata()["reason"], "file name");
    }

    #[test]
    fn decorative_images_are_skipped_or_corrected() {
        let issues = run(
            &check(),
            r#"<body>
                <img src="swirl.png" class="decorative-swirl">
                <img src="dot.png" width="16" height="16">
                <img src="bg.png" role="presentation" alt="Blue swirl background">
            </body>"#,
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity(), Severity::Low);
    }

    #[test]
    fn inadequate_alt_wins_over_decorative_marking() {
        let issues = run(
            &check(),
            r#"<body><img src="bg.png" role="presentation" alt="img"></body>"#,
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity(), Severity::Moderate);
        assert_eq!(issues[0].metadata()["reason"], "generic term");
    }

    #[test]
    fn decorative_heuristic_can_be_disabled() {
        let check = AltTextCheck::new(AltTextConfig {
            ignore_decorative: false,
            require_descriptive: false,
        });
        let issues = run(&check, r#"<body><img src="dot.png" width="16" height="16"><img src="x.png" alt="photo"></body>"#);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity(), Severity::Critical);
    }

    #[test]
    fn image_inputs_need_alt() {
        let issues = run(&check(), r#"<body><form><input type="image" src="go.png"></form></body>"#);
        assert_eq!(issues.len(), 1);
    }
}
