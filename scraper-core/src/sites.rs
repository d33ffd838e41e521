//! 站点列表加载
//!
//! 每行一个主机名。空行和格式错误的行原样保留，交给探测阶段自然失败

use anyhow::{Context, Result};
use std::path::Path;

/// 按行拆分站点列表，不做任何校验或去重
pub fn parse_sites(raw: &str) -> Vec<String> {
    raw.split('\n').map(str::to_string).collect()
}

pub fn load_sites_from_path(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read site list from {}", path.display()))?;
    let sites = parse_sites(&raw);
    tracing::debug!("Loaded {} site entries from {}", sites.len(), path.display());
    Ok(sites)
}
