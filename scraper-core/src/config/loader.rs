use crate::config::model::Config;
use std::path::Path;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

pub fn load_config_from_path(config_path: &str) -> Result<Config, anyhow::Error> {
    let config_str = std::fs::read_to_string(config_path)?;
    let config: Config = toml::from_str(&config_str)?;
    Ok(config)
}

/// 配置文件不存在时回退到默认配置
pub fn load_config_or_default(config_path: &str) -> Result<Config, anyhow::Error> {
    if !Path::new(config_path).exists() {
        tracing::info!(
            "Configuration file {} not found, using defaults",
            config_path
        );
        return Ok(Config::default());
    }
    load_config_from_path(config_path)
}
