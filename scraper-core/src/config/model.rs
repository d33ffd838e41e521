use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub settings: ScraperSettings,
}

/// 服务监听与站点列表配置
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    #[serde(default = "default_sites_path")]
    pub sites_path: String,
}

/// 探测流水线配置
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScraperSettings {
    /// 每轮调度的间隔
    #[serde(default = "default_probe_interval")]
    pub probe_interval_seconds: u64,
    /// 单次探测的超时
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_seconds: u64,
    /// 并发worker数量，未设置时使用CPU并行度
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// 结果队列容量，未设置时等于站点数量
    #[serde(default)]
    pub result_queue_capacity: Option<usize>,
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            sites_path: default_sites_path(),
        }
    }
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            probe_interval_seconds: default_probe_interval(),
            probe_timeout_seconds: default_probe_timeout(),
            workers: None,
            scheme: default_scheme(),
            result_queue_capacity: None,
            shutdown_grace_seconds: default_shutdown_grace(),
        }
    }
}

impl ScraperSettings {
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_seconds)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }

    /// 实际使用的worker数量，至少为1
    pub fn worker_count(&self) -> usize {
        self.workers
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1)
    }

    /// 结果队列容量，至少为1
    pub fn result_queue_capacity_for(&self, site_count: usize) -> usize {
        self.result_queue_capacity.unwrap_or(site_count).max(1)
    }
}

// Default value functions
fn default_listen_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_sites_path() -> String {
    "./sites.txt".to_string()
}

fn default_probe_interval() -> u64 {
    60 // 每分钟一轮
}

fn default_probe_timeout() -> u64 {
    30
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_shutdown_grace() -> u64 {
    5
}

impl Config {
    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        self.validate_server_config()?;
        self.validate_scraper_config()?;
        Ok(())
    }

    fn validate_server_config(&self) -> Result<()> {
        if self.server.listen_address.trim().is_empty() {
            anyhow::bail!("Server has empty listen_address");
        }

        if self.server.sites_path.trim().is_empty() {
            anyhow::bail!("Server has empty sites_path");
        }

        Ok(())
    }

    fn validate_scraper_config(&self) -> Result<()> {
        let settings = &self.settings;

        if settings.probe_interval_seconds == 0 {
            anyhow::bail!("Invalid probe_interval_seconds: cannot be 0");
        }

        if settings.probe_timeout_seconds == 0 {
            anyhow::bail!("Invalid probe_timeout_seconds: cannot be 0");
        }

        if settings.probe_timeout_seconds > 300 {
            anyhow::bail!(
                "Invalid probe_timeout_seconds: {} (maximum 300 seconds)",
                settings.probe_timeout_seconds
            );
        }

        if settings.workers == Some(0) {
            anyhow::bail!("Invalid workers: cannot be 0");
        }

        if settings.result_queue_capacity == Some(0) {
            anyhow::bail!("Invalid result_queue_capacity: cannot be 0");
        }

        if settings.scheme != "https" && settings.scheme != "http" {
            anyhow::bail!(
                "Invalid scheme: '{}'. Must be http or https",
                settings.scheme
            );
        }

        Ok(())
    }
}
