use super::Check;
use crate::dom::Document;
use crate::error::Result;
use crate::models::{AccessibilityIssue, IssueKind, Severity};

/// Anything below this stops users zooming to 200%.
const MIN_MAXIMUM_SCALE: f64 = 2.0;

pub struct ViewportCheck;

/// `key=value` pairs of a viewport `content` attribute, lowercased.
fn directives(content: &str) -> Vec<(String, String)> {
    content
        .split([',', ';'])
        .filter_map(|part| {
            let (key, value) = part.split_once('=')?;
            Some((key.trim().to_lowercase(), value.trim().to_lowercase()))
        })
        .collect()
}

fn blocks_zoom(content: &str) -> bool {
    directives(content).iter().any(|(key, value)| match key.as_str() {
        "user-scalable" => value == "no" || value == "0",
        "maximum-scale" => value
            .parse::<f64>()
            .map(|scale| scale < MIN_MAXIMUM_SCALE)
            .unwrap_or(false),
        _ => false,
    })
}

impl Check for ViewportCheck {
    fn name(&self) -> &'static str {
        "viewport"
    }

    fn evaluate(&self, document: &Document, _url: &str) -> Result<Vec<AccessibilityIssue>> {
        let meta = document.find_by_tag(&["meta"]).into_iter().find(|m| {
            m.attr("name")
                .map(|n| n.trim().eq_ignore_ascii_case("viewport"))
                .unwrap_or(false)
        });

        let Some(meta) = meta else {
            let issue = AccessibilityIssue::draft(IssueKind::Other, Severity::Low)
                .description("Missing meta viewport for responsive layout.")
                .element("<meta name=\"viewport\">")
                .context("document head")
                .suggested_fix("Add <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">.")
                .wcag(&["1.4.4", "1.4.10"])
                .build()?;
            return Ok(vec![issue]);
        };

        let content = meta.attr("content").unwrap_or_default();
        if !blocks_zoom(content) {
            return Ok(Vec::new());
        }

        let issue = meta
            .issue(IssueKind::Other, Severity::Moderate)
            .description("Viewport disables zoom (user-scalable=no or maximum-scale below 2).")
            .suggested_fix("Allow pinch-zoom: drop user-scalable=no and any maximum-scale below 2.")
            .wcag(&["1.4.4"])
            .meta("content", content.trim())
            .build()?;
        Ok(vec![issue])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::{descriptions, run};

    fn page(meta: &str) -> String {
        format!("<html><head>{}<title>t</title></head><body><p>x</p></body></html>", meta)
    }

    #[test]
    fn responsive_viewport_passes() {
        let html = page(r#"<meta name="viewport" content="width=device-width, initial-scale=1, maximum-scale=5">"#);
        assert!(run(&ViewportCheck, &html).is_empty());
    }

    #[test]
    fn missing_viewport_is_low() {
        let issues = run(&ViewportCheck, &page(""));
        assert_eq!(descriptions(&issues), vec!["Missing meta viewport for responsive layout."]);
        assert_eq!(issues[0].severity(), Severity::Low);
    }

    #[test]
    fn zoom_blocking_is_moderate() {
        for content in ["width=device-width, user-scalable=no", "width=device-width; maximum-scale=1.0", "user-scalable=0"] {
            let html = page(&format!(r#"<meta name="viewport" content="{}">"#, content));
            let issues = run(&ViewportCheck, &html);
            assert_eq!(issues.len(), 1, "{}", content);
            assert_eq!(issues[0].severity(), Severity::Moderate);
        }
    }
}
