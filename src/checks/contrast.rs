//! Text contrast from inline declarations.
//!
//! Only `style` attributes (and the legacy `color`/`bgcolor` attributes) are
//! read; there is no cascade. A side the element does not declare is taken
//! from the nearest ancestor that does, falling back to black text on a
//! white canvas.

use lazy_static::lazy_static;
use regex::Regex;

use super::Check;
use crate::config::ContrastConfig;
use crate::dom::{Document, Element};
use crate::error::Result;
use crate::models::{AccessibilityIssue, IssueKind, Severity};

lazy_static! {
    static ref RGB_FN: Regex =
        Regex::new(r"(?i)^rgba?\(\s*(\d{1,3})\s*[, ]\s*(\d{1,3})\s*[, ]\s*(\d{1,3})").unwrap();
    static ref FONT_SIZE: Regex = Regex::new(r"(?i)font-size\s*:\s*([\d.]+)\s*(px|pt)").unwrap();
    static ref FONT_WEIGHT: Regex = Regex::new(r"(?i)font-weight\s*:\s*([a-z0-9]+)").unwrap();
}

const TEXT_TAGS: &[&str] = &[
    "p", "span", "div", "a", "h1", "h2", "h3", "h4", "h5", "h6", "li", "td", "th", "label",
    "button", "strong", "b", "em", "small",
];
const TEXT_CLASSES: &[&str] = &["text", "content", "description", "caption", "label"];

const NAMED_COLORS: &[(&str, (u8, u8, u8))] = &[
    ("black", (0, 0, 0)),
    ("white", (255, 255, 255)),
    ("red", (255, 0, 0)),
    ("green", (0, 128, 0)),
    ("lime", (0, 255, 0)),
    ("blue", (0, 0, 255)),
    ("yellow", (255, 255, 0)),
    ("cyan", (0, 255, 255)),
    ("aqua", (0, 255, 255)),
    ("magenta", (255, 0, 255)),
    ("fuchsia", (255, 0, 255)),
    ("gray", (128, 128, 128)),
    ("grey", (128, 128, 128)),
    ("darkgray", (169, 169, 169)),
    ("darkgrey", (169, 169, 169)),
    ("lightgray", (211, 211, 211)),
    ("lightgrey", (211, 211, 211)),
    ("silver", (192, 192, 192)),
    ("maroon", (128, 0, 0)),
    ("olive", (128, 128, 0)),
    ("navy", (0, 0, 128)),
    ("purple", (128, 0, 128)),
    ("teal", (0, 128, 128)),
    ("orange", (255, 165, 0)),
    ("pink", (255, 192, 203)),
    ("brown", (165, 42, 42)),
    ("gold", (255, 215, 0)),
    ("whitesmoke", (245, 245, 245)),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Parses `#rgb`, `#rrggbb` (alpha digits ignored), `rgb()`/`rgba()` and
/// common named colors.
pub fn parse_color(value: &str) -> Option<Rgb> {
    let value = value
        .trim()
        .trim_end_matches("!important")
        .trim()
        .to_lowercase();

    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex);
    }

    if let Some(caps) = RGB_FN.captures(&value) {
        let channel = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u16>().ok()).map(|v| v.min(255) as u8);
        return Some(Rgb(channel(1)?, channel(2)?, channel(3)?));
    }

    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == value)
        .map(|(_, (r, g, b))| Rgb(*r, *g, *b))
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let digit = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 | 4 => {
            let expand = |i: usize| digit(&hex[i..i + 1]).map(|v| v * 17);
            Some(Rgb(expand(0)?, expand(1)?, expand(2)?))
        }
        6 | 8 => Some(Rgb(digit(&hex[0..2])?, digit(&hex[2..4])?, digit(&hex[4..6])?)),
        _ => None,
    }
}

/// WCAG relative luminance of an sRGB color.
pub fn relative_luminance(color: Rgb) -> f64 {
    let linear = |c: u8| {
        let c = f64::from(c) / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * linear(color.0) + 0.7152 * linear(color.1) + 0.0722 * linear(color.2)
}

/// `(L1 + 0.05) / (L2 + 0.05)` with the lighter color on top.
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let (la, lb) = (relative_luminance(a), relative_luminance(b));
    let (lighter, darker) = if la >= lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

/// Value of a CSS property in an inline declaration list.
fn style_property<'s>(style: &'s str, property: &str) -> Option<&'s str> {
    style.split(';').find_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        if name.trim().eq_ignore_ascii_case(property) {
            Some(value.trim())
        } else {
            None
        }
    })
}

fn declared_foreground(el: &Element<'_>) -> Option<Rgb> {
    el.attr("style")
        .and_then(|s| style_property(s, "color"))
        .and_then(parse_color)
        .or_else(|| if el.tag() == "font" { el.attr("color").and_then(parse_color) } else { None })
}

fn declared_background(el: &Element<'_>) -> Option<Rgb> {
    let style = el.attr("style");
    style
        .and_then(|s| style_property(s, "background-color"))
        .and_then(parse_color)
        .or_else(|| {
            // `background` shorthand: take the first token that is a color.
            style
                .and_then(|s| style_property(s, "background"))
                .and_then(|v| v.split_whitespace().find_map(parse_color))
        })
        .or_else(|| el.attr("bgcolor").and_then(parse_color))
}

pub struct ContrastCheck {
    config: ContrastConfig,
}

impl ContrastCheck {
    pub fn new(config: ContrastConfig) -> Self {
        Self { config }
    }

    fn text_size_px(el: &Element<'_>) -> f64 {
        if let Some(caps) = el.attr("style").and_then(|s| FONT_SIZE.captures(s)) {
            let value: f64 = caps[1].parse().unwrap_or(16.0);
            return if caps[2].eq_ignore_ascii_case("pt") { value * 4.0 / 3.0 } else { value };
        }
        match el.tag() {
            "h1" => 32.0,
            "h2" => 24.0,
            "h3" => 20.0,
            "h4" => 18.0,
            "h5" => 16.0,
            "h6" => 14.0,
            _ => 16.0,
        }
    }

    fn is_bold(el: &Element<'_>) -> bool {
        if el.is(&["h1", "h2", "h3", "h4", "h5", "h6", "strong", "b"]) {
            return true;
        }
        match el.attr("style").and_then(|s| FONT_WEIGHT.captures(s)) {
            Some(caps) => {
                let weight = caps[1].to_lowercase();
                weight == "bold" || weight == "bolder" || weight.parse::<u16>().map(|w| w >= 700).unwrap_or(false)
            }
            None => false,
        }
    }

    fn required_ratio(&self, el: &Element<'_>) -> (f64, bool) {
        let size = Self::text_size_px(el);
        let large = if Self::is_bold(el) {
            size >= self.config.bold_large_text_size
        } else {
            size >= self.config.large_text_size
        };
        let ratio = if large { self.config.large_text_ratio } else { self.config.min_contrast_ratio };
        (ratio, large)
    }

    fn candidates<'a>(document: &'a Document) -> Vec<Element<'a>> {
        document
            .elements()
            .into_iter()
            .filter(|el| {
                el.is(TEXT_TAGS)
                    || el.classes().iter().any(|c| TEXT_CLASSES.contains(&c.to_lowercase().as_str()))
            })
            .filter(|el| declared_foreground(el).is_some() || declared_background(el).is_some())
            .collect()
    }
}

impl Check for ContrastCheck {
    fn name(&self) -> &'static str {
        "color_contrast"
    }

    fn evaluate(&self, document: &Document, _url: &str) -> Result<Vec<AccessibilityIssue>> {
        let mut issues = Vec::new();

        for el in Self::candidates(document) {
            let text = el.text();
            if text.is_empty() || el.is_hidden() {
                continue;
            }

            let foreground = declared_foreground(&el)
                .or_else(|| el.ancestors().find_map(|a| declared_foreground(&a)))
                .unwrap_or(Rgb(0, 0, 0));
            let background = declared_background(&el)
                .or_else(|| el.ancestors().find_map(|a| declared_background(&a)))
                .unwrap_or(Rgb(255, 255, 255));

            let ratio = (contrast_ratio(foreground, background) * 100.0).round() / 100.0;
            let (required, large) = self.required_ratio(&el);
            if ratio >= required {
                continue;
            }

            let shortfall = required - ratio;
            let severity = if shortfall > 2.0 {
                Severity::Critical
            } else if shortfall > 1.0 {
                Severity::Moderate
            } else {
                Severity::Low
            };

            issues.push(
                el.issue(IssueKind::PoorColorContrast, severity)
                    .description(format!(
                        "Insufficient color contrast: {}:1 (requires {}:1)",
                        ratio, required
                    ))
                    .suggested_fix(format!(
                        "Raise the contrast between {} text and its {} background to at least {}:1.",
                        foreground.hex(),
                        background.hex(),
                        required
                    ))
                    .wcag(&["1.4.3"])
                    .meta("foreground_color", foreground.hex())
                    .meta("background_color", background.hex())
                    .meta("actual_contrast", ratio)
                    .meta("required_contrast", required)
                    .meta("large_text", large)
                    .meta("text", text.chars().take(50).collect::<String>())
                    .build()?,
            );
        }

        Ok(issues)
    }
}
