use crate::app::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use scraper_core::Measurement;
use serde::Serialize;

/// 健康检查报告
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub running: bool,
    pub available_sites: usize,
    pub configured_sites: usize,
    pub probe_interval_seconds: u64,
}

/// 至少有一个站点可用时返回200，否则返回503
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let available_sites = state.store.len();
    let report = HealthReport {
        status: if available_sites > 0 { "ok" } else { "no_available_site" },
        running: state.scraper.is_running().await,
        available_sites,
        configured_sites: state.scraper.sites().len(),
        probe_interval_seconds: state.scraper.settings().probe_interval_seconds,
    };

    let status = if available_sites > 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(report))
}

/// 当前存储中的所有站点
pub async fn list_sites(State(state): State<AppState>) -> Json<Vec<Measurement>> {
    Json(state.store.snapshot())
}
