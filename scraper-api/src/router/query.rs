use crate::app::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use scraper_core::{Measurement, StoreError};
use serde_json::json;
use tracing::debug;

/// 耗时最短的站点
pub async fn min_site(State(state): State<AppState>) -> Response {
    let result = state.store.min();
    respond(&state, "min", result)
}

/// 耗时最长的站点
pub async fn max_site(State(state): State<AppState>) -> Response {
    let result = state.store.max();
    respond(&state, "max", result)
}

/// 随机选择一个可用站点
pub async fn random_site(State(state): State<AppState>) -> Response {
    let result = state.store.random();
    respond(&state, "random", result)
}

fn respond(state: &AppState, query: &str, result: Result<Measurement, StoreError>) -> Response {
    match result {
        Ok(measurement) => {
            debug!("Query '{}' returned site {}", query, measurement.site);
            state.record_served(&measurement.site);
            (StatusCode::OK, Json(measurement)).into_response()
        }
        Err(e) => {
            debug!("Query '{}' failed: {}", query, e);
            store_error_response(e)
        }
    }
}

/// 存储查询错误映射为HTTP响应
pub fn store_error_response(error: StoreError) -> Response {
    let status = match error {
        StoreError::NoAvailableSite => StatusCode::SERVICE_UNAVAILABLE,
    };

    let body = json!({
        "error": {
            "message": error.to_string(),
            "status": status.as_u16(),
        }
    });

    (status, Json(body)).into_response()
}
