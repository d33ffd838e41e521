use crate::observability::prometheus_metrics::MetricsHandle;
use crate::router::router::create_app_router;
use scraper_core::config::loader::load_config_or_default;
use scraper_core::sites::load_sites_from_path;
use scraper_core::Config;
use scraper_pipeline::{ResponseTimeStore, ScraperService};

use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// 应用状态，包含探测服务和结果存储
#[derive(Clone)]
pub struct AppState {
    pub scraper: Arc<ScraperService>,
    pub store: Arc<ResponseTimeStore>,
    pub config: Arc<Config>,
    pub prometheus_metrics: Option<MetricsHandle>,
}

/// 启动参数，命令行或环境变量中的值覆盖配置文件
#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    pub config_path: String,
    pub listen_address: Option<String>,
    pub sites_path: Option<String>,
}

impl AppState {
    /// 创建应用状态并启动探测流水线
    pub async fn new(config: Config, sites: Vec<String>) -> Result<Self> {
        let prometheus_metrics = create_prometheus_metrics();
        let store = Arc::new(create_store(&prometheus_metrics));

        let scraper = Arc::new(ScraperService::new(config.settings.clone(), sites, store)?);
        scraper.start().await?;
        info!("Scraper service started");

        Ok(Self::from_service(config, scraper, prometheus_metrics))
    }

    /// 使用已创建的服务组装状态，不会启动服务
    pub fn from_service(
        config: Config,
        scraper: Arc<ScraperService>,
        prometheus_metrics: Option<MetricsHandle>,
    ) -> Self {
        Self {
            store: scraper.store(),
            scraper,
            config: Arc::new(config),
            prometheus_metrics,
        }
    }

    /// 记录一次查询返回的站点
    pub fn record_served(&self, site: &str) {
        #[cfg(feature = "observability")]
        {
            if let Some(ref metrics) = self.prometheus_metrics {
                metrics.record_service_request(site);
            }
        }
        #[cfg(not(feature = "observability"))]
        {
            let _ = site;
        }
    }

    /// 停止应用
    pub async fn shutdown(&self) {
        info!("Shutting down application...");
        self.scraper.stop().await;
        info!("Application shutdown complete");
    }
}

#[cfg(feature = "observability")]
pub(crate) fn create_prometheus_metrics() -> Option<MetricsHandle> {
    match crate::observability::prometheus_metrics::PrometheusMetrics::new() {
        Ok(metrics) => {
            info!("Prometheus metrics initialized");
            Some(metrics)
        }
        Err(e) => {
            error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "observability"))]
pub(crate) fn create_prometheus_metrics() -> Option<MetricsHandle> {
    None
}

/// 创建结果存储，启用指标时挂上成功写入计数
pub fn create_store(prometheus_metrics: &Option<MetricsHandle>) -> ResponseTimeStore {
    #[cfg(feature = "observability")]
    {
        if let Some(metrics) = prometheus_metrics {
            return ResponseTimeStore::with_hook(Arc::new(metrics.clone()));
        }
    }
    #[cfg(not(feature = "observability"))]
    {
        let _ = prometheus_metrics;
    }

    ResponseTimeStore::new()
}

/// 创建应用路由
pub fn create_app(state: AppState) -> Router {
    create_app_router().with_state(state)
}

/// 合并配置文件与启动参数
pub fn resolve_config(options: &ServerOptions) -> Result<Config> {
    let mut config = load_config_or_default(&options.config_path)?;

    if let Some(listen_address) = &options.listen_address {
        config.server.listen_address = listen_address.clone();
    }
    if let Some(sites_path) = &options.sites_path {
        config.server.sites_path = sites_path.clone();
    }

    config.validate()?;
    Ok(config)
}

/// 启动应用服务器
pub async fn start_server(options: ServerOptions) -> Result<()> {
    // 初始化日志 - 完全依赖RUST_LOG环境变量
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Starting best-scraper server v{}...", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", options.config_path);

    let config = resolve_config(&options)?;
    let sites = load_sites_from_path(&config.server.sites_path)?;
    info!(
        "Loaded {} sites from {}",
        sites.len(),
        config.server.sites_path
    );

    // 创建应用状态
    let app_state = match AppState::new(config.clone(), sites).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            return Err(e);
        }
    };

    let app = create_app(app_state.clone());

    let listener = tokio::net::TcpListener::bind(&config.server.listen_address).await?;
    let addr = listener.local_addr()?;

    info!("Server listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  GET  /              - Service banner");
    info!("  GET  /min           - Fastest site");
    info!("  GET  /max           - Slowest site");
    info!("  GET  /random        - Random available site");
    info!("  GET  /sites         - All available sites");
    info!("  GET  /health        - Health check");
    info!("  GET  /metrics       - Prometheus metrics");

    // 设置优雅关闭
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install CTRL+C signal handler: {}", e);
            return;
        }
        info!("Shutdown signal received");
    };

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal);

    if let Err(e) = server.await {
        error!("Server error: {}", e);
        app_state.shutdown().await;
        return Err(e.into());
    }

    app_state.shutdown().await;
    Ok(())
}
