use axum::{extract::State, Json};

use crate::models::HealthResponse;
use crate::AppState;

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let scanner = &state.scanner;

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        fetcher: scanner.fetcher_name().to_string(),
        max_concurrent_scans: scanner.config().max_concurrent_scans,
        checks: scanner.check_names().into_iter().map(String::from).collect(),
    })
}
