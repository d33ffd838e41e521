use super::traits::IngestHook;
use parking_lot::RwLock;
use rand::Rng;
use scraper_core::{Measurement, StoreError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// 一次写入对存储产生的效果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// 新站点写入
    Inserted,
    /// 覆盖已有站点的结果
    Updated,
    /// 失败结果移除了已有站点
    Evicted,
    /// 失败结果且站点本就不存在
    Ignored,
}

/// 站点延迟结果存储
///
/// 每个站点只保留最近一次成功的测量。失败的测量不会写入，
/// 而是移除该站点已有的记录。整个map由一把读写锁保护，
/// 所有读写都必须经过这里的方法。
///
/// `min`/`max` 在多个站点耗时相同时返回哪一个取决于HashMap的遍历顺序，
/// 这是有意保留的不确定行为，不保证先插入者或字典序优先
pub struct ResponseTimeStore {
    entries: RwLock<HashMap<String, Measurement>>,
    hook: Option<Arc<dyn IngestHook>>,
}

impl Default for ResponseTimeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseTimeStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            hook: None,
        }
    }

    /// 创建带成功写入回调的存储
    pub fn with_hook(hook: Arc<dyn IngestHook>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            hook: Some(hook),
        }
    }

    /// 写入一条测量：成功则覆盖，失败则移除
    pub fn ingest(&self, measurement: Measurement) -> IngestOutcome {
        if measurement.is_success() {
            let previous = {
                let mut entries = self.entries.write();
                entries.insert(measurement.site.clone(), measurement.clone())
            };

            if let Some(hook) = &self.hook {
                hook.on_success(&measurement);
            }

            match previous {
                Some(_) => IngestOutcome::Updated,
                None => IngestOutcome::Inserted,
            }
        } else {
            let removed = self.entries.write().remove(&measurement.site);
            match removed {
                Some(_) => IngestOutcome::Evicted,
                None => IngestOutcome::Ignored,
            }
        }
    }

    /// 持续消费结果队列，直到队列关闭或收到取消信号
    pub async fn listen(
        &self,
        mut results: mpsc::Receiver<Measurement>,
        token: CancellationToken,
    ) -> usize {
        let mut ingested = 0;

        loop {
            let measurement = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                next = results.recv() => match next {
                    Some(measurement) => measurement,
                    None => break,
                },
            };

            let site = measurement.site.clone();
            let error = measurement.error.clone();
            let outcome = self.ingest(measurement);
            match error {
                Some(e) => debug!("Site {} probe failed ({:?}): {}", site, outcome, e),
                None => debug!("Site {} measurement stored ({:?})", site, outcome),
            }
            ingested += 1;
        }

        info!("Result listener stopped after ingesting {} measurements", ingested);
        ingested
    }

    /// 耗时最短的站点
    pub fn min(&self) -> Result<Measurement, StoreError> {
        self.filter_one(|best, candidate| candidate.duration < best.duration)
    }

    /// 耗时最长的站点
    pub fn max(&self) -> Result<Measurement, StoreError> {
        self.filter_one(|best, candidate| candidate.duration > best.duration)
    }

    /// 等概率随机选择一个站点
    ///
    /// 先在 `[0, count)` 内抽取一次下标，再按任意遍历顺序计数到该下标，
    /// 每个站点被选中的概率都是 1/count，与遍历顺序无关
    pub fn random(&self) -> Result<Measurement, StoreError> {
        let entries = self.entries.read();
        if entries.is_empty() {
            return Err(StoreError::NoAvailableSite);
        }

        let index = rand::rng().random_range(0..entries.len());
        entries
            .values()
            .nth(index)
            .cloned()
            .ok_or(StoreError::NoAvailableSite)
    }

    /// 遍历所有条目，第一个条目无条件成为当前最佳，
    /// 之后只有 `replace(best, candidate)` 为真时才替换
    fn filter_one<F>(&self, mut replace: F) -> Result<Measurement, StoreError>
    where
        F: FnMut(&Measurement, &Measurement) -> bool,
    {
        let entries = self.entries.read();
        let mut best: Option<&Measurement> = None;

        for candidate in entries.values() {
            best = match best {
                Some(current) if !replace(current, candidate) => Some(current),
                _ => Some(candidate),
            };
        }

        best.cloned().ok_or(StoreError::NoAvailableSite)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn get(&self, site: &str) -> Option<Measurement> {
        self.entries.read().get(site).cloned()
    }

    /// 当前所有条目，按站点名排序
    pub fn snapshot(&self) -> Vec<Measurement> {
        let mut all: Vec<Measurement> = self.entries.read().values().cloned().collect();
        all.sort_by(|a, b| a.site.cmp(&b.site));
        all
    }
}
