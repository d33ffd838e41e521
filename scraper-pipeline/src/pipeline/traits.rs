use async_trait::async_trait;
use scraper_core::{Measurement, ProbeError};
use std::time::Duration;

/// 探测器接口
///
/// 对一个站点发起一次测量，返回到首字节的耗时。
/// 抽象成trait以便worker池注入不同实现并进行单元测试
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, site: &str) -> Result<Duration, ProbeError>;
}

/// 成功写入结果存储时的回调，用于外部计数
pub trait IngestHook: Send + Sync {
    fn on_success(&self, measurement: &Measurement);
}
