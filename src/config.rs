use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    #[serde(default = "default_chrome_path")]
    pub chrome_path: String,

    #[serde(default = "default_use_browser")]
    pub use_browser: bool,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    #[serde(default)]
    pub log_json: bool,

    pub scan_config_path: Option<String>,
}

fn default_api_port() -> u16 { 14786 }
fn default_chrome_path() -> String { "/usr/bin/chromium".to_string() }
fn default_use_browser() -> bool { true }
fn default_max_body_bytes() -> usize { 5 * 1024 * 1024 }

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            api_port: std::env::var("API_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_api_port),
            chrome_path: std::env::var("CHROME_PATH")
                .unwrap_or_else(|_| default_chrome_path()),
            use_browser: std::env::var("USE_BROWSER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_use_browser),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_max_body_bytes),
            log_json: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            scan_config_path: std::env::var("SCAN_CONFIG").ok(),
        };

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_port: default_api_port(),
            chrome_path: default_chrome_path(),
            use_browser: default_use_browser(),
            max_body_bytes: default_max_body_bytes(),
            log_json: false,
            scan_config_path: None,
        }
    }
}

/// Options driving a scan: acquisition settings plus per-check options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Per-attempt acquisition timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default)]
    pub viewport: Viewport,

    /// Post-load settle delay in milliseconds.
    #[serde(default = "default_wait_for")]
    pub wait_for: u64,

    #[serde(default = "default_max_concurrent_scans")]
    pub max_concurrent_scans: usize,

    #[serde(default)]
    pub checks: ChecksConfig,
}

fn default_timeout() -> u64 { 30 }
fn default_max_retries() -> u32 { 3 }
fn default_retry_backoff_ms() -> u64 { 500 }
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}
fn default_wait_for() -> u64 { 2000 }
fn default_max_concurrent_scans() -> usize { 3 }

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            user_agent: default_user_agent(),
            viewport: Viewport::default(),
            wait_for: default_wait_for(),
            max_concurrent_scans: default_max_concurrent_scans(),
            checks: ChecksConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Loads scan options from an optional file, overridden by `A11Y__*`
    /// environment variables (e.g. `A11Y__CHECKS__CONTRAST__MIN_CONTRAST_RATIO=7`).
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        let settings = builder.add_source(env_source()).build()?;

        let scan_config: ScanConfig = settings.try_deserialize()?;
        Ok(scan_config)
    }
}

/// `A11Y__*` overrides. `A11Y__CHECKS__DISABLED` takes a comma-separated list.
fn env_source() -> config::Environment {
    config::Environment::with_prefix("A11Y")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("checks.disabled")
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport { width: 1920, height: 1080 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecksConfig {
    /// Check names to leave out of the registry.
    pub disabled: Vec<String>,
    pub alt_text: AltTextConfig,
    pub headings: HeadingConfig,
    pub contrast: ContrastConfig,
    pub forms: FormConfig,
    pub links: LinkConfig,
    pub aria: AriaConfig,
    pub landmarks: LandmarkConfig,
    pub keyboard: KeyboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AltTextConfig {
    pub ignore_decorative: bool,
    pub require_descriptive: bool,
}

impl Default for AltTextConfig {
    fn default() -> Self {
        Self { ignore_decorative: true, require_descriptive: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingConfig {
    pub require_h1: bool,
    pub max_heading_level: u8,
    pub check_skip_levels: bool,
}

impl Default for HeadingConfig {
    fn default() -> Self {
        Self { require_h1: true, max_heading_level: 6, check_skip_levels: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContrastConfig {
    pub min_contrast_ratio: f64,
    pub large_text_ratio: f64,
    /// Pixels at which normal-weight text counts as large.
    pub large_text_size: f64,
    /// Pixels at which bold text counts as large.
    pub bold_large_text_size: f64,
}

impl Default for ContrastConfig {
    fn default() -> Self {
        Self {
            min_contrast_ratio: 4.5,
            large_text_ratio: 3.0,
            large_text_size: 18.0,
            bold_large_text_size: 14.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub require_labels: bool,
    pub check_required_fields: bool,
    pub check_error_handling: bool,
    pub check_form_structure: bool,
    /// Forms with more controls than this and no fieldset are flagged.
    pub require_fieldset_above: usize,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            require_labels: true,
            check_required_fields: true,
            check_error_handling: true,
            check_form_structure: true,
            require_fieldset_above: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub check_descriptive_text: bool,
    pub check_empty_links: bool,
    pub check_image_links: bool,
    pub check_same_text_links: bool,
    pub check_context_awareness: bool,
    pub check_new_window: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            check_descriptive_text: true,
            check_empty_links: true,
            check_image_links: true,
            check_same_text_links: true,
            check_context_awareness: true,
            check_new_window: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AriaConfig {
    pub check_required_attributes: bool,
    pub check_invalid_attributes: bool,
    pub check_attribute_values: bool,
    pub check_roles: bool,
    pub check_id_references: bool,
}

impl Default for AriaConfig {
    fn default() -> Self {
        Self {
            check_required_attributes: true,
            check_invalid_attributes: true,
            check_attribute_values: true,
            check_roles: true,
            check_id_references: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkConfig {
    pub require_main: bool,
    pub require_navigation: bool,
    pub check_duplicate_landmarks: bool,
    pub check_nesting: bool,
}

impl Default for LandmarkConfig {
    fn default() -> Self {
        Self {
            require_main: true,
            require_navigation: true,
            check_duplicate_landmarks: true,
            check_nesting: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    pub check_focusable_elements: bool,
    pub check_tab_order: bool,
    pub check_skip_links: bool,
    pub check_keyboard_traps: bool,
    /// Skip links starting past this source line count as mispositioned.
    pub skip_link_max_line: usize,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            check_focusable_elements: true,
            check_tab_order: true,
            check_skip_links: true,
            check_keyboard_traps: true,
            skip_link_max_line: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.timeout, 30);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.max_concurrent_scans, 3);
        assert_eq!(config.viewport.width, 1920);
        assert_eq!(config.checks.contrast.min_contrast_ratio, 4.5);
        assert_eq!(config.checks.headings.max_heading_level, 6);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ScanConfig = serde_json::from_str(
            r#"{"timeout": 10, "checks": {"links": {"check_new_window": false}}}"#,
        )
        .unwrap();
        assert_eq!(config.timeout, 10);
        assert_eq!(config.wait_for, 2000);
        assert!(!config.checks.links.check_new_window);
        assert!(config.checks.links.check_empty_links);
        assert!(config.checks.alt_text.ignore_decorative);
    }

    #[test]
    fn env_overrides_parse_lists_and_numbers() {
        let vars: config::Map<String, String> = [
            ("A11Y__CHECKS__DISABLED", "color_contrast,media"),
            ("A11Y__TIMEOUT", "12"),
            ("A11Y__CHECKS__CONTRAST__MIN_CONTRAST_RATIO", "7"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config: ScanConfig = config::Config::builder()
            .add_source(env_source().source(Some(vars)))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.checks.disabled, vec!["color_contrast", "media"]);
        assert_eq!(config.timeout, 12);
        assert_eq!(config.checks.contrast.min_contrast_ratio, 7.0);
        assert!(config.checks.keyboard.check_tab_order);
    }
}
