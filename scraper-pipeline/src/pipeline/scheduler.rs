use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// 调度器
/// 每个周期按列表顺序把所有站点投递到工作队列，然后等待周期结束
pub struct Scheduler {
    sites: Arc<[String]>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(sites: Vec<String>, interval: Duration) -> Self {
        Self {
            sites: sites.into(),
            interval,
        }
    }

    /// 启动调度循环，直到收到取消信号或工作队列关闭，返回完成的周期数
    ///
    /// 周期的计时从投递开始，投递阶段因背压阻塞的时间也计入间隔
    pub async fn run(self, work_tx: mpsc::Sender<String>, token: CancellationToken) -> u64 {
        info!(
            "Starting scheduler for {} sites with interval: {:?}",
            self.sites.len(),
            self.interval
        );

        // 没有站点时不需要周期，只等待取消
        if self.sites.is_empty() {
            token.cancelled().await;
            info!("Scheduler stopped, no sites configured");
            return 0;
        }

        let mut cycles = 0;
        loop {
            let next_tick = Instant::now() + self.interval;

            if !self.publish_cycle(&work_tx, &token).await {
                break;
            }
            cycles += 1;
            debug!("Scheduler completed cycle {}", cycles);

            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = sleep_until(next_tick) => {}
            }
        }

        info!("Scheduler stopped after {} cycles", cycles);
        cycles
    }

    /// 投递一轮站点，每个站点都等待队列接收（不丢弃）。
    /// 返回false表示已取消或队列已关闭
    pub async fn publish_cycle(
        &self,
        work_tx: &mpsc::Sender<String>,
        token: &CancellationToken,
    ) -> bool {
        for site in self.sites.iter() {
            tokio::select! {
                biased;
                _ = token.cancelled() => return false,
                sent = work_tx.send(site.clone()) => {
                    if sent.is_err() {
                        debug!("Work queue closed, scheduler stopping");
                        return false;
                    }
                }
            }
        }
        true
    }
}
