use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::PageFetcher;
use crate::config::{Config, ScanConfig};
use crate::error::{AppError, Result};

/// Closes the tab when a fetch finishes, including when the caller's
/// timeout drops the fetch midway.
struct PageGuard(Option<Page>);

impl Drop for PageGuard {
    fn drop(&mut self) {
        if let Some(page) = self.0.take() {
            tokio::spawn(async move {
                if let Err(e) = page.close().await {
                    debug!("Failed to close page: {}", e);
                }
            });
        }
    }
}

/// One headless Chromium shared by every scan; each fetch gets its own page.
pub struct BrowserFetcher {
    browser: Mutex<Option<Browser>>,
    handler: Mutex<Option<JoinHandle<()>>>,
}

impl BrowserFetcher {
    pub async fn launch(config: &Config, scan: &ScanConfig) -> Result<Self> {
        let browser_config = BrowserConfig::builder()
            .chrome_executable(&config.chrome_path)
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .arg("--hide-scrollbars")
            .arg("--mute-audio")
            .arg("--no-first-run")
            .arg("--disable-blink-features=AutomationControlled")
            .window_size(scan.viewport.width, scan.viewport.height)
            .build()
            .map_err(AppError::BrowserError)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| AppError::BrowserError(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!("Browser event: {:?}", event);
            }
        });

        info!("Browser launched successfully");
        Ok(Self {
            browser: Mutex::new(Some(browser)),
            handler: Mutex::new(Some(handler)),
        })
    }

    async fn open_page(&self, options: &ScanConfig) -> Result<Page> {
        let browser_guard = self.browser.lock().await;
        let browser = browser_guard
            .as_ref()
            .ok_or_else(|| AppError::BrowserError("Browser already closed".to_string()))?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| AppError::BrowserError(e.to_string()))?;

        drop(browser_guard);

        page.set_user_agent(options.user_agent.as_str())
            .await
            .map_err(|e| AppError::BrowserError(e.to_string()))?;

        page.execute(SetDeviceMetricsOverrideParams::new(
            i64::from(options.viewport.width),
            i64::from(options.viewport.height),
            1.0,
            false,
        ))
        .await
        .map_err(|e| AppError::BrowserError(e.to_string()))?;

        Ok(page)
    }

    async fn navigate_and_wait(page: &Page, url: &str, options: &ScanConfig) -> Result<String> {
        page.goto(url)
            .await
            .map_err(|e| AppError::BrowserError(format!("Navigation failed: {}", e)))?;

        page.evaluate("document.readyState")
            .await
            .map_err(|e| AppError::BrowserError(format!("Ready state check failed: {}", e)))?;

        tokio::time::sleep(Duration::from_millis(options.wait_for)).await;

        page.content()
            .await
            .map_err(|e| AppError::BrowserError(format!("Failed to get content: {}", e)))
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    fn name(&self) -> &'static str {
        "browser"
    }

    async fn fetch_rendered(&self, url: &str, options: &ScanConfig) -> Result<String> {
        let page = PageGuard(Some(self.open_page(options).await?));
        match page.0.as_ref() {
            Some(tab) => Self::navigate_and_wait(tab, url, options).await,
            None => Err(AppError::Internal("page released early".to_string())),
        }
    }

    async fn close(&self) -> Result<()> {
        if let Some(mut browser) = self.browser.lock().await.take() {
            browser
                .close()
                .await
                .map_err(|e| AppError::BrowserError(e.to_string()))?;
            if let Err(e) = browser.wait().await {
                debug!("Browser process did not exit cleanly: {}", e);
            }
            info!("Browser closed");
        }
        if let Some(handler) = self.handler.lock().await.take() {
            handler.abort();
        }
        Ok(())
    }
}
