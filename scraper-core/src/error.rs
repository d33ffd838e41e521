use std::time::Duration;
use thiserror::Error;

/// 单次探测失败的原因
///
/// 只影响对应站点的那一条测量结果，不会作为进程级错误向上传播
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("invalid site '{0}'")]
    InvalidSite(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("probe cancelled")]
    Cancelled,
}

/// 结果存储的查询错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    /// 存储为空（启动初期或所有站点都不可用）
    #[error("NO_AVAILABLE_SITE")]
    NoAvailableSite,
}
