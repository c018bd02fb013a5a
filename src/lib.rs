//! WCAG accessibility scanning: a registry of independent checks run over a
//! parsed page, a consolidation pass, weighted scoring and an HTTP surface.

pub mod checks;
pub mod config;
pub mod dedup;
pub mod dom;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use config::Config;
use services::Scanner;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub scanner: Arc<Scanner>,
}
