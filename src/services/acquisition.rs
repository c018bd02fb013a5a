use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use super::{BrowserFetcher, HttpFetcher};
use crate::config::{Config, ScanConfig};
use crate::error::Result;

/// Produces the HTML a scan runs against.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fully loaded markup of `url`. Timeouts and retries are the caller's.
    async fn fetch_rendered(&self, url: &str, options: &ScanConfig) -> Result<String>;

    /// Releases anything the fetcher holds open.
    async fn close(&self) -> Result<()>;
}

/// Picks the acquisition strategy once at startup. A browser that fails to
/// launch degrades to plain HTTP.
pub async fn select_fetcher(config: &Config, scan: &ScanConfig) -> Result<Arc<dyn PageFetcher>> {
    if config.use_browser {
        match BrowserFetcher::launch(config, scan).await {
            Ok(browser) => {
                info!("Using headless browser for page acquisition");
                return Ok(Arc::new(browser));
            }
            Err(e) => {
                warn!("Browser unavailable ({}), falling back to HTTP fetching", e);
            }
        }
    }

    let http = HttpFetcher::new(scan)?;
    info!("Using HTTP client for page acquisition");
    Ok(Arc::new(http))
}
