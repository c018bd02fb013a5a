//! Accessibility rules. Each check is a pure function of the parsed page and
//! its URL; the scanner runs every registered check against one document.

pub mod alt_text;
pub mod aria;
pub mod autoplay;
pub mod contrast;
pub mod focus_indicator;
pub mod forms;
pub mod headings;
pub mod keyboard;
pub mod landmarks;
pub mod lang_title;
pub mod links;
pub mod media;
pub mod reduced_motion;
pub mod skip_link;
pub mod time_limits;
pub mod viewport;

use crate::config::ChecksConfig;
use crate::dom::{Document, Element};
use crate::error::Result;
use crate::models::AccessibilityIssue;

pub use alt_text::AltTextCheck;
pub use aria::AriaCheck;
pub use autoplay::AutoplayCheck;
pub use contrast::ContrastCheck;
pub use focus_indicator::FocusIndicatorCheck;
pub use forms::FormCheck;
pub use headings::HeadingCheck;
pub use keyboard::KeyboardCheck;
pub use landmarks::LandmarkCheck;
pub use lang_title::LangTitleCheck;
pub use links::LinkCheck;
pub use media::MediaCheck;
pub use reduced_motion::ReducedMotionCheck;
pub use skip_link::SkipLinkCheck;
pub use time_limits::TimeLimitCheck;
pub use viewport::ViewportCheck;

/// One accessibility rule.
///
/// Implementations must be deterministic and must not perform I/O. An `Err`
/// means the rule itself is broken (for example it tried to build an issue
/// with blank text); the scanner drops that check's output for the page and
/// keeps running the others.
pub trait Check: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, document: &Document, url: &str) -> Result<Vec<AccessibilityIssue>>;
}

/// Every built-in check, configured, minus the ones listed in
/// `config.disabled`.
pub fn default_checks(config: &ChecksConfig) -> Vec<Box<dyn Check>> {
    let all: Vec<Box<dyn Check>> = vec![
        Box::new(AltTextCheck::new(config.alt_text.clone())),
        Box::new(HeadingCheck::new(config.headings.clone())),
        Box::new(ContrastCheck::new(config.contrast.clone())),
        Box::new(FormCheck::new(config.forms.clone())),
        Box::new(LinkCheck::new(config.links.clone())),
        Box::new(AriaCheck::new(config.aria.clone())),
        Box::new(LandmarkCheck::new(config.landmarks.clone())),
        Box::new(KeyboardCheck::new(config.keyboard.clone())),
        Box::new(SkipLinkCheck),
        Box::new(MediaCheck),
        Box::new(AutoplayCheck),
        Box::new(ViewportCheck),
        Box::new(TimeLimitCheck),
        Box::new(ReducedMotionCheck),
        Box::new(LangTitleCheck),
        Box::new(FocusIndicatorCheck),
    ];

    all.into_iter()
        .filter(|check| !config.disabled.iter().any(|d| d == check.name()))
        .collect()
}

/// Attribute value equals `"true"`, ignoring case and padding.
pub(crate) fn attr_is_true(el: &Element<'_>, name: &str) -> bool {
    el.attr_lower(name).as_deref() == Some("true")
}

/// Attribute present with non-blank content.
pub(crate) fn attr_filled<'a>(el: &Element<'a>, name: &str) -> Option<&'a str> {
    el.attr(name).map(str::trim).filter(|v| !v.is_empty())
}

/// Whitespace-separated id list of an `aria-*` reference attribute.
pub(crate) fn id_refs<'a>(el: &Element<'a>, name: &str) -> Vec<&'a str> {
    el.attr(name)
        .map(|v| v.split_whitespace().collect())
        .unwrap_or_default()
}

/// Accessible name from `aria-labelledby` targets that exist in the page.
pub(crate) fn labelledby_text(el: &Element<'_>) -> Option<String> {
    let doc = el.document();
    let text: Vec<String> = id_refs(el, "aria-labelledby")
        .into_iter()
        .filter_map(|id| doc.find_by_id(id))
        .map(|target| target.text())
        .filter(|t| !t.is_empty())
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text.join(" "))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_honours_disabled_list() {
        let mut config = ChecksConfig::default();
        let all = default_checks(&config);
        assert_eq!(all.len(), 16);

        config.disabled = vec!["color_contrast".to_string(), "media".to_string()];
        let names: Vec<&str> = default_checks(&config).iter().map(|c| c.name()).collect();
        assert_eq!(names.len(), 14);
        assert!(!names.contains(&"color_contrast"));
        assert!(names.contains(&"alt_text"));
    }

    #[test]
    fn check_names_are_unique() {
        let checks = default_checks(&ChecksConfig::default());
        let mut names: Vec<&str> = checks.iter().map(|c| c.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), checks.len());
    }
}
