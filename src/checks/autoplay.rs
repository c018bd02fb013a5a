use super::Check;
use crate::dom::Document;
use crate::error::Result;
use crate::models::{AccessibilityIssue, IssueKind, Severity};

pub struct AutoplayCheck;

impl Check for AutoplayCheck {
    fn name(&self) -> &'static str {
        "autoplay"
    }

    fn evaluate(&self, document: &Document, _url: &str) -> Result<Vec<AccessibilityIssue>> {
        let mut issues = Vec::new();

        for media in document.find_by_tag(&["audio", "video"]) {
            let tag = media.tag();
            let has_controls = media.has_attr("controls");
            let autoplays =
                media.has_attr("autoplay") || media.attr_lower("data-autoplay").as_deref() == Some("true");
            let muted = media.has_attr("muted") || media.attr_lower("aria-muted").as_deref() == Some("true");

            if !has_controls {
                issues.push(
                    media
                        .issue(IssueKind::Other, Severity::Moderate)
                        .description(format!("<{}> element is missing user controls.", tag))
                        .suggested_fix(format!(
                            "Add the controls attribute to the <{}> element so it can be paused.",
                            tag
                        ))
                        .wcag(&["1.4.2", "2.1.1"])
                        .build()?,
                );
            }

            if autoplays {
                let severity = if (tag == "audio" && !muted) || !has_controls {
                    Severity::Critical
                } else {
                    Severity::Moderate
                };
                issues.push(
                    media
                        .issue(IssueKind::Other, severity)
                        .description(format!("Autoplaying <{}> detected without guaranteed user control.", tag))
                        .suggested_fix(format!(
                            "Avoid autoplay on <{}>. If it must autoplay, start muted and expose a \
                             pause control.",
                            tag
                        ))
                        .wcag(&["1.4.2", "2.2.2"])
                        .meta("muted", muted)
                        .meta("has_controls", has_controls)
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
    use crate::checks::test_support::{descriptions, run};
    use pretty_assertions::assert_eq;

    #[test]
    fn controlled_media_is_clean() {
        let html = r#"<html><body><video controls src="a.mp4"></video></body></html>"#;
        assert!(run(&AutoplayCheck, html).is_empty());
    }

    #[test]
    fn unmuted_autoplay_audio_is_critical_even_with_controls() {
        let html = r#"<html><body><audio autoplay controls src="a.mp3"></audio></body></html>"#;
        let issues = run(&AutoplayCheck, html);
        assert_eq!(
            descriptions(&issues),
            vec!["Autoplaying <audio> detected without guaranteed user control."]
        );
        assert_eq!(issues[0].severity(), Severity::Critical);
    }

    #[test]
    fn muted_video_with_controls_is_moderate() {
        let html = r#"<html><body><video autoplay muted controls src="a.mp4"></video></body></html>"#;
        let issues = run(&AutoplayCheck, html);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity(), Severity::Moderate);
    }

    #[test]
    fn autoplay_without_controls_reports_both() {
        let html = r#"<html><body><video autoplay muted src="a.mp4"></video></body></html>"#;
        let issues = run(&AutoplayCheck, html);
        assert_eq!(
            descriptions(&issues),
            vec![
                "<video> element is missing user controls.",
                "Autoplaying <video> detected without guaranteed user control.",
            ]
        );
        assert_eq!(issues[1].severity(), Severity::Critical);
    }
}
