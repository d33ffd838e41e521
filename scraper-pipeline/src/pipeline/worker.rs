use super::prober::probe_cancellable;
use super::traits::Prober;
use scraper_core::{Measurement, ProbeError};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// 多个worker共享的工作队列接收端
pub type WorkQueue = Arc<Mutex<mpsc::Receiver<String>>>;

/// 固定大小的探测worker池
pub struct WorkerPool {
    size: usize,
    prober: Arc<dyn Prober>,
}

impl WorkerPool {
    pub fn new(size: usize, prober: Arc<dyn Prober>) -> Self {
        Self {
            size: size.max(1),
            prober,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// 启动所有worker，返回每个worker的句柄，句柄结果为该worker发布的测量数
    ///
    /// worker在工作队列关闭并耗尽、结果队列关闭或收到取消信号时退出
    pub fn spawn(
        &self,
        work_rx: mpsc::Receiver<String>,
        result_tx: mpsc::Sender<Measurement>,
        token: CancellationToken,
    ) -> Vec<JoinHandle<usize>> {
        let queue: WorkQueue = Arc::new(Mutex::new(work_rx));

        (0..self.size)
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    queue.clone(),
                    self.prober.clone(),
                    result_tx.clone(),
                    token.clone(),
                ))
            })
            .collect()
    }
}

async fn run_worker(
    worker_id: usize,
    queue: WorkQueue,
    prober: Arc<dyn Prober>,
    result_tx: mpsc::Sender<Measurement>,
    token: CancellationToken,
) -> usize {
    debug!("Probe worker {} started", worker_id);
    let mut published = 0;

    loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            site = async {
                let mut rx = queue.lock().await;
                rx.recv().await
            } => site,
        };

        let Some(site) = next else {
            break;
        };

        let outcome = probe_cancellable(prober.as_ref(), &site, &token).await;
        if outcome == Err(ProbeError::Cancelled) {
            debug!("Probe worker {} abandoned in-flight probe of {}", worker_id, site);
            break;
        }

        let measurement = Measurement::from_probe(site, outcome);
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            sent = result_tx.send(measurement) => {
                if sent.is_err() {
                    debug!("Result queue closed, probe worker {} stopping", worker_id);
                    break;
                }
            }
        }
        published += 1;
    }

    debug!(
        "Probe worker {} stopped after publishing {} measurements",
        worker_id, published
    );
    published
}
