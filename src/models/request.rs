use serde::{Deserialize, Serialize};

use super::issue::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    Json,
    Csv,
    Text,
}

impl Default for ResponseFormat {
    fn default() -> Self {
        Self::Json
    }
}

impl ResponseFormat {
    pub fn from_header(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "csv" => Self::Csv,
            "text" => Self::Text,
            _ => Self::Json,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    pub url: String,
    #[serde(default)]
    pub min_severity: Option<Severity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchScanRequest {
    pub urls: Vec<String>,
    #[serde(default)]
    pub min_severity: Option<Severity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlScanRequest {
    #[serde(default = "default_html_url")]
    pub url: String,
    pub html: String,
    #[serde(default)]
    pub min_severity: Option<Severity>,
}

fn default_html_url() -> String {
    "about:blank".to_string()
}
