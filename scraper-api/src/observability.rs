//! Observability module for best-scraper
//!
//! This module provides Prometheus metrics for the query surface and the store.
//! It's only available when the 'observability' feature is enabled.

#[cfg(feature = "observability")]
pub mod prometheus_metrics {
    use crate::app::AppState;
    use ::prometheus::{CounterVec, IntGauge, Opts, Registry, TextEncoder};
    use axum::{extract::State, http::StatusCode, response::IntoResponse};
    use scraper_core::Measurement;
    use scraper_pipeline::IngestHook;
    use std::sync::Arc;

    const NAMESPACE: &str = "best_scraper";

    /// Prometheus metrics collector
    #[derive(Clone)]
    pub struct PrometheusMetrics {
        pub registry: Arc<Registry>,
        pub service_request_count: CounterVec,
        pub probe_success_total: CounterVec,
        pub store_sites: IntGauge,
    }

    impl PrometheusMetrics {
        pub fn new() -> Result<Self, ::prometheus::Error> {
            let registry = Arc::new(Registry::new());

            let service_request_count = CounterVec::new(
                Opts::new("service_request_count", "request count by site name")
                    .namespace(NAMESPACE),
                &["site"],
            )?;

            let probe_success_total = CounterVec::new(
                Opts::new("probe_success_total", "Successful probe measurements stored, by site")
                    .namespace(NAMESPACE),
                &["site"],
            )?;

            let store_sites = IntGauge::with_opts(
                Opts::new("store_sites", "Number of sites currently available in the store")
                    .namespace(NAMESPACE),
            )?;

            registry.register(Box::new(service_request_count.clone()))?;
            registry.register(Box::new(probe_success_total.clone()))?;
            registry.register(Box::new(store_sites.clone()))?;

            Ok(Self {
                registry,
                service_request_count,
                probe_success_total,
                store_sites,
            })
        }

        /// Record a site returned by one of the query endpoints
        pub fn record_service_request(&self, site: &str) {
            self.service_request_count.with_label_values(&[site]).inc();
        }

        pub fn update_store_size(&self, sites: usize) {
            self.store_sites.set(sites as i64);
        }

        pub fn render(&self) -> Result<String, ::prometheus::Error> {
            let encoder = TextEncoder::new();
            encoder.encode_to_string(&self.registry.gather())
        }
    }

    impl IngestHook for PrometheusMetrics {
        fn on_success(&self, measurement: &Measurement) {
            self.probe_success_total
                .with_label_values(&[measurement.site.as_str()])
                .inc();
        }
    }

    /// Prometheus metrics endpoint handler
    pub async fn prometheus_metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
        if let Some(ref metrics) = state.prometheus_metrics {
            metrics.update_store_size(state.store.len());

            match metrics.render() {
                Ok(output) => (
                    StatusCode::OK,
                    [("content-type", "text/plain; version=0.0.4")],
                    output,
                )
                    .into_response(),
                Err(e) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to encode metrics: {}", e),
                )
                    .into_response(),
            }
        } else {
            (StatusCode::NOT_FOUND, "Prometheus metrics not initialized").into_response()
        }
    }

    pub type MetricsHandle = PrometheusMetrics;
}

#[cfg(not(feature = "observability"))]
pub mod prometheus_metrics {
    use crate::app::AppState;
    use axum::{extract::State, http::StatusCode, response::IntoResponse};

    /// Placeholder for when observability is disabled
    pub async fn prometheus_metrics_handler(_state: State<AppState>) -> impl IntoResponse {
        (
            StatusCode::NOT_FOUND,
            "Observability feature not enabled. Compile with --features observability to enable Prometheus metrics.",
        )
    }

    pub type MetricsHandle = ();
}
