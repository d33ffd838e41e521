use crate::app::AppState;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::{
    health::{health_check, list_sites},
    query::{max_site, min_site, random_site},
};
use crate::observability::prometheus_metrics::prometheus_metrics_handler;

/// 创建应用路由
pub fn create_app_router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/min", get(min_site))
        .route("/max", get(max_site))
        .route("/random", get(random_site))
        .route("/sites", get(list_sites))
        .route("/health", get(health_check))
        .route("/metrics", get(prometheus_metrics_handler))
        .layer(TraceLayer::new_for_http())
}

/// 首页处理器
pub async fn index() -> &'static str {
    "best-scraper - site latency service"
}
