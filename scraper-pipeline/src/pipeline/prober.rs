use super::traits::Prober;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use scraper_core::{ProbeError, ScraperSettings};
use std::error::Error;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// HTTP首字节延迟探测器
///
/// 每次调用只发起一次GET请求，`send` 在收到响应头时返回，
/// 因此计时覆盖的是请求发起到首字节到达的时间。响应体不读取直接释放
pub struct HttpProber {
    client: Client,
    scheme: String,
    timeout: Duration,
}

impl HttpProber {
    /// 根据配置创建探测器
    pub fn new(settings: &ScraperSettings) -> Result<Self> {
        let timeout = settings.probe_timeout();
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, &settings.scheme, timeout))
    }

    /// 使用外部构建的客户端，`timeout` 仅用于错误描述，应与客户端超时一致
    pub fn with_client(client: Client, scheme: &str, timeout: Duration) -> Self {
        Self {
            client,
            scheme: scheme.to_string(),
            timeout,
        }
    }

    fn site_url(&self, site: &str) -> String {
        format!("{}://{}", self.scheme, site)
    }

    fn classify(&self, site: &str, error: reqwest::Error) -> ProbeError {
        if error.is_timeout() {
            ProbeError::Timeout(self.timeout)
        } else if error.is_builder() {
            ProbeError::InvalidSite(site.to_string())
        } else if error.is_connect() {
            ProbeError::Connect(describe(&error))
        } else {
            ProbeError::Request(describe(&error))
        }
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, site: &str) -> Result<Duration, ProbeError> {
        let url = self.site_url(site);
        let request = self
            .client
            .get(&url)
            .build()
            .map_err(|e| self.classify(site, e))?;

        let start = Instant::now();
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| self.classify(site, e))?;
        let elapsed = start.elapsed();

        debug!(
            "Probed {} in {}ms (status {})",
            url,
            elapsed.as_millis(),
            response.status()
        );

        // 只关心耗时，响应体直接丢弃
        drop(response);
        Ok(elapsed)
    }
}

/// 带取消信号的探测，取消时立即放弃正在进行的请求
pub async fn probe_cancellable(
    prober: &dyn Prober,
    site: &str,
    token: &CancellationToken,
) -> Result<Duration, ProbeError> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ProbeError::Cancelled),
        outcome = prober.probe(site) => outcome,
    }
}

/// 拼接错误链，reqwest顶层错误信息通常不包含根因
fn describe(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};

    async fn spawn_target(delay: Duration) -> String {
        let app = Router::new().route(
            "/",
            get(move || async move {
                tokio::time::sleep(delay).await;
                "ok"
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr.to_string()
    }

    fn test_prober(timeout: Duration) -> HttpProber {
        let client = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .unwrap();
        HttpProber::with_client(client, "http", timeout)
    }

    #[tokio::test]
    async fn test_probe_measures_time_to_first_byte() {
        let site = spawn_target(Duration::from_millis(50)).await;
        let prober = test_prober(Duration::from_secs(5));

        let elapsed = prober.probe(&site).await.unwrap();
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_probe_connection_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let site = listener.local_addr().unwrap().to_string();
        drop(listener);

        let prober = test_prober(Duration::from_secs(5));
        let result = prober.probe(&site).await;
        assert!(matches!(result, Err(ProbeError::Connect(_))));
    }

    #[tokio::test]
    async fn test_probe_timeout() {
        let site = spawn_target(Duration::from_secs(10)).await;
        let prober = test_prober(Duration::from_millis(200));

        let result = prober.probe(&site).await;
        assert_eq!(result, Err(ProbeError::Timeout(Duration::from_millis(200))));
    }

    #[tokio::test]
    async fn test_probe_malformed_site() {
        let prober = test_prober(Duration::from_secs(5));

        let result = prober.probe("not a host").await;
        assert_eq!(result, Err(ProbeError::InvalidSite("not a host".to_string())));

        // 空行同样作为探测失败处理
        let result = prober.probe("").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_probe_cancellable_abandons_in_flight_request() {
        let site = spawn_target(Duration::from_secs(10)).await;
        let prober = test_prober(Duration::from_secs(30));
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        let result = probe_cancellable(&prober, &site, &token).await;
        assert_eq!(result, Err(ProbeError::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_site_url_uses_configured_scheme() {
        let prober = HttpProber::new(&ScraperSettings::default()).unwrap();
        assert_eq!(prober.site_url("google.ru"), "https://google.ru");
    }
}
