use super::prober::HttpProber;
use super::scheduler::Scheduler;
use super::store::ResponseTimeStore;
use super::traits::Prober;
use super::worker::WorkerPool;
use anyhow::Result;
use futures::future::join_all;
use scraper_core::{Measurement, ScraperSettings};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::{AbortHandle, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// 探测服务
/// 把调度器、worker池和结果存储串成一条流水线，并统一管理它们的生命周期
pub struct ScraperService {
    settings: ScraperSettings,
    sites: Vec<String>,
    store: Arc<ResponseTimeStore>,
    prober: Arc<dyn Prober>,
    token: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    workers: Mutex<Vec<JoinHandle<usize>>>,
    is_running: Arc<RwLock<bool>>,
}

impl ScraperService {
    /// 使用HTTP探测器创建服务
    pub fn new(
        settings: ScraperSettings,
        sites: Vec<String>,
        store: Arc<ResponseTimeStore>,
    ) -> Result<Self> {
        let prober = Arc::new(HttpProber::new(&settings)?);
        Ok(Self::with_prober(settings, sites, store, prober))
    }

    pub fn with_prober(
        settings: ScraperSettings,
        sites: Vec<String>,
        store: Arc<ResponseTimeStore>,
        prober: Arc<dyn Prober>,
    ) -> Self {
        Self {
            settings,
            sites,
            store,
            prober,
            token: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
            workers: Mutex::new(Vec::new()),
            is_running: Arc::new(RwLock::new(false)),
        }
    }

    /// 启动探测流水线
    pub async fn start(&self) -> Result<()> {
        {
            let mut running = self.is_running.write().await;
            if *running {
                return Ok(());
            }
            if self.token.is_cancelled() {
                anyhow::bail!("Scraper service has been stopped and cannot be restarted");
            }
            *running = true;
        }

        let pool = WorkerPool::new(self.settings.worker_count(), self.prober.clone());
        let result_capacity = self.settings.result_queue_capacity_for(self.sites.len());
        info!(
            "Starting scraper service: {} sites, {} workers, interval {:?}",
            self.sites.len(),
            pool.size(),
            self.settings.probe_interval()
        );

        // 工作队列与worker池同尺寸，worker忙时调度器阻塞
        let (work_tx, work_rx) = mpsc::channel::<String>(pool.size());
        let (result_tx, result_rx) = mpsc::channel::<Measurement>(result_capacity);

        let mut tasks = self.tasks.lock().await;

        // 启动结果监听
        let store = self.store.clone();
        let token = self.token.clone();
        tasks.push(tokio::spawn(async move {
            store.listen(result_rx, token).await;
        }));

        // 启动worker池
        let worker_handles = pool.spawn(work_rx, result_tx, self.token.clone());
        self.workers.lock().await.extend(worker_handles);

        // 启动调度器
        let scheduler = Scheduler::new(self.sites.clone(), self.settings.probe_interval());
        let token = self.token.clone();
        tasks.push(tokio::spawn(async move {
            scheduler.run(work_tx, token).await;
        }));

        info!("Scraper service started successfully");
        Ok(())
    }

    /// 停止服务：发出取消信号并等待所有任务结束，超过宽限期的任务会被中止
    pub async fn stop(&self) {
        {
            let mut running = self.is_running.write().await;
            *running = false;
        }
        self.token.cancel();

        let background = std::mem::take(&mut *self.tasks.lock().await);
        let workers = std::mem::take(&mut *self.workers.lock().await);
        let abort_handles: Vec<AbortHandle> = background
            .iter()
            .map(|h| h.abort_handle())
            .chain(workers.iter().map(|h| h.abort_handle()))
            .collect();

        let shutdown = async {
            for (worker_id, result) in join_all(workers).await.into_iter().enumerate() {
                match result {
                    Ok(published) => {
                        debug!("Worker {} published {} measurements", worker_id, published)
                    }
                    Err(e) => error!("Worker {} failed: {}", worker_id, e),
                }
            }
            for result in join_all(background).await {
                if let Err(e) = result {
                    error!("Pipeline task failed during shutdown: {}", e);
                }
            }
        };

        let grace = self.settings.shutdown_grace();
        if tokio::time::timeout(grace, shutdown).await.is_err() {
            warn!(
                "Pipeline tasks did not stop within {:?}, aborting them",
                grace
            );
            for handle in abort_handles {
                handle.abort();
            }
        }

        info!("Scraper service stopped");
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    pub fn store(&self) -> Arc<ResponseTimeStore> {
        self.store.clone()
    }

    pub fn sites(&self) -> &[String] {
        &self.sites
    }

    pub fn settings(&self) -> &ScraperSettings {
        &self.settings
    }
}

/// 执行单轮探测：每个站点探测一次，结果写入给定存储后返回写入条数
pub async fn run_single_sweep(
    prober: Arc<dyn Prober>,
    sites: Vec<String>,
    workers: usize,
    store: &ResponseTimeStore,
) -> usize {
    let token = CancellationToken::new();
    let pool = WorkerPool::new(workers, prober);
    let (work_tx, work_rx) = mpsc::channel::<String>(pool.size());
    let (result_tx, result_rx) = mpsc::channel::<Measurement>(sites.len().max(1));

    let handles = pool.spawn(work_rx, result_tx, token.clone());

    let scheduler = Scheduler::new(sites, std::time::Duration::ZERO);
    let publisher = {
        let token = token.clone();
        tokio::spawn(async move {
            scheduler.publish_cycle(&work_tx, &token).await;
        })
    };

    // 所有worker结束后结果队列关闭，监听随之返回
    let ingested = store.listen(result_rx, token).await;

    if let Err(e) = publisher.await {
        error!("Sweep publisher failed: {}", e);
    }
    for handle in handles {
        if let Err(e) = handle.await {
            error!("Sweep worker failed: {}", e);
        }
    }

    ingested
}
