use serde::{Deserialize, Serialize};

use super::result::{ScanResult, ScanSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchScanResponse {
    pub results: Vec<ScanResult>,
    pub summary: ScanSummary,
    pub total_processing_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub fetcher: String,
    pub max_concurrent_scans: usize,
    pub checks: Vec<String>,
}
