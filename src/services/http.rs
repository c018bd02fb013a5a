use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use super::PageFetcher;
use crate::config::ScanConfig;
use crate::error::{AppError, Result};

/// Static fetch without script execution.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(options: &ScanConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&options.user_agent)
            .timeout(Duration::from_secs(options.timeout))
            .cookie_store(true)
            .build()
            .map_err(|e| AppError::FetchError(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_rendered(&self, url: &str, options: &ScanConfig) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &options.user_agent)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(options.timeout)
                } else {
                    AppError::FetchError(e.to_string())
                }
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AppError::HttpStatus(status.as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| AppError::FetchError(format!("Failed to read body: {}", e)))?;

        debug!("Fetched {} bytes from {}", html.len(), url);
        Ok(html)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
