use super::Check;
use crate::dom::{Document, Element};
use crate::error::Result;
use crate::models::{AccessibilityIssue, IssueKind, Severity};

const CAPTION_KINDS: &[&str] = &["captions", "subtitles"];

/// Caption tracks and audio transcripts.
pub struct MediaCheck;

impl MediaCheck {
    fn has_caption_track(video: &Element<'_>) -> bool {
        video.find(&["track"]).any(|track| {
            track
                .attr_lower("kind")
                .map(|kind| CAPTION_KINDS.contains(&kind.as_str()))
                .unwrap_or(false)
        })
    }

    fn mentions_transcript(el: &Element<'_>) -> bool {
        let link = el.tag() == "a"
            && (el.text().to_lowercase().contains("transcript")
                || el.attr_lower("href").unwrap_or_default().contains("transcript"));
        let named = el.id().map(|id| id.to_lowercase().contains("transcript")).unwrap_or(false)
            || el.classes().iter().any(|c| c.to_lowercase().contains("transcript"));
        link || named
    }

    /// Looks in the audio element's parent and in the siblings after it.
    fn has_transcript(audio: &Element<'_>) -> bool {
        let in_parent = audio
            .parent()
            .map(|parent| parent.descendants().any(|el| Self::mentions_transcript(&el)))
            .unwrap_or(false);

        in_parent
            || audio.following_siblings().any(|sibling| {
                Self::mentions_transcript(&sibling)
                    || sibling.descendants().any(|el| Self::mentions_transcript(&el))
            })
    }
}

impl Check for MediaCheck {
    fn name(&self) -> &'static str {
        "media"
    }

    fn evaluate(&self, document: &Document, _url: &str) -> Result<Vec<AccessibilityIssue>> {
        let mut issues = Vec::new();

        for video in document.find_by_tag(&["video"]) {
            if Self::has_caption_track(&video) {
                continue;
            }
            issues.push(
                video
                    .issue(IssueKind::Other, Severity::Critical)
                    .description("Video element is missing captions/subtitles track.")
                    .suggested_fix(
                        "Add <track kind=\"captions\" srclang=\"en\" src=\"captions.vtt\" \
                         label=\"English\"> inside the <video>.",
                    )
                    .wcag(&["1.2.2", "1.2.1"])
                    .build()?,
            );
        }

        for audio in document.find_by_tag(&["audio"]) {
            if Self::has_transcript(&audio) {
                continue;
            }
            issues.push(
                audio
                    .issue(IssueKind::Other, Severity::Moderate)
                    .description("Audio element appears to lack an accompanying transcript.")
                    .suggested_fix("Publish a text transcript next to the audio or link to one.")
                    .wcag(&["1.2.1"])
                    .build()?,
            );
        }

        Ok(issues)
    }
}
