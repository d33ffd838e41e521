use crate::error::ProbeError;
use serde::{Serialize, Serializer};
use std::time::Duration;

/// 一次探测的结果
///
/// 由探测器产生、被结果存储消费，创建后不再修改。
/// 序列化为 `{"site": ..., "duration": <纳秒>, "error": ...}`，无错误时省略 `error`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Measurement {
    pub site: String,
    #[serde(serialize_with = "serialize_nanos")]
    pub duration: Duration,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_error"
    )]
    pub error: Option<ProbeError>,
}

impl Measurement {
    pub fn success(site: impl Into<String>, duration: Duration) -> Self {
        Self {
            site: site.into(),
            duration,
            error: None,
        }
    }

    /// 失败结果的 duration 没有意义，固定为零
    pub fn failure(site: impl Into<String>, error: ProbeError) -> Self {
        Self {
            site: site.into(),
            duration: Duration::ZERO,
            error: Some(error),
        }
    }

    pub fn from_probe(site: impl Into<String>, outcome: Result<Duration, ProbeError>) -> Self {
        match outcome {
            Ok(duration) => Self::success(site, duration),
            Err(error) => Self::failure(site, error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

fn serialize_nanos<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    let nanos = i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX);
    serializer.serialize_i64(nanos)
}

fn serialize_error<S: Serializer>(
    error: &Option<ProbeError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.collect_str(e),
        None => serializer.serialize_none(),
    }
}
