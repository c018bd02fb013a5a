use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use std::time::Instant;
use tracing::info;

use crate::error::AppError;
use crate::models::{
    filter_by_severity, BatchScanRequest, BatchScanResponse, HtmlScanRequest, ResponseFormat,
    ScanRequest, ScanResult, ScanSummary,
};
use crate::services::{report, validate_url};
use crate::AppState;

const MAX_BATCH_URLS: usize = 100;

fn response_format(headers: &HeaderMap) -> ResponseFormat {
    headers
        .get("x-respond-with")
        .and_then(|v| v.to_str().ok())
        .map(ResponseFormat::from_header)
        .unwrap_or_default()
}

#[axum::debug_handler]
pub async fn scan_handler(
    State(state): State<AppState>,
    Json(request): Json<ScanRequest>,
) -> Result<Json<ScanResult>, AppError> {
    validate_url(&request.url)?;
    info!("Processing scan request for URL: {}", request.url);

    let result = state.scanner.scan_url(&request.url).await;
    let result = match request.min_severity {
        Some(min) => result.filter_by_severity(min),
        None => result,
    };

    Ok(Json(result))
}

#[axum::debug_handler]
pub async fn batch_scan_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<BatchScanRequest>,
) -> Result<Response, AppError> {
    let start = Instant::now();

    if request.urls.is_empty() {
        return Err(AppError::BadRequest("urls must not be empty".to_string()));
    }
    if request.urls.len() > MAX_BATCH_URLS {
        return Err(AppError::BadRequest(format!(
            "at most {} urls per batch, got {}",
            MAX_BATCH_URLS,
            request.urls.len()
        )));
    }
    info!("Processing batch scan request for {} URLs", request.urls.len());

    let results = state.scanner.scan_multiple(&request.urls).await;
    let results = match request.min_severity {
        Some(min) => filter_by_severity(&results, min),
        None => results,
    };

    let total_time = start.elapsed().as_millis() as u64;
    info!("Batch scanned {} URLs in {}ms", results.len(), total_time);

    let response = match response_format(&headers) {
        ResponseFormat::Csv => (
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            report::to_csv(&results)?,
        )
            .into_response(),
        ResponseFormat::Text => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            report::to_text(&results)?,
        )
            .into_response(),
        ResponseFormat::Json => Json(BatchScanResponse {
            summary: ScanSummary::from_results(&results),
            results,
            total_processing_time_ms: total_time,
        })
        .into_response(),
    };

    Ok(response)
}

#[axum::debug_handler]
pub async fn html_scan_handler(
    State(state): State<AppState>,
    Json(request): Json<HtmlScanRequest>,
) -> Result<Json<ScanResult>, AppError> {
    if request.html.trim().is_empty() {
        return Err(AppError::BadRequest("html must not be empty".to_string()));
    }
    info!("Processing inline HTML scan ({} bytes)", request.html.len());

    // Parsing and the checks are CPU-bound, keep them off the async workers.
    let scanner = state.scanner.clone();
    let HtmlScanRequest {
        url,
        html,
        min_severity,
    } = request;
    let result = tokio::task::spawn_blocking(move || scanner.scan_html(&url, &html))
        .await
        .map_err(|e| AppError::Internal(format!("inline scan task failed: {}", e)))?;
    let result = match min_severity {
        Some(min) => result.filter_by_severity(min),
        None => result,
    };

    Ok(Json(result))
}
