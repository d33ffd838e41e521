//! best-scraper CLI Tool
//!
//! Command line interface for checking configuration and probing sites by hand

use anyhow::Result;
use clap::{Parser, Subcommand};
use scraper_core::config::loader::{
    load_config_from_path, load_config_or_default, DEFAULT_CONFIG_PATH,
};
use scraper_core::sites::load_sites_from_path;
use scraper_core::{Config, Measurement};
use scraper_pipeline::{run_single_sweep, HttpProber, Prober, ResponseTimeStore};
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "scraper-cli")]
#[command(about = "A CLI tool for the best-scraper latency service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate configuration file
    ValidateConfig {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: String,
    },
    /// Probe a single site once and print its time to first byte
    Probe {
        /// Site host, e.g. google.com
        #[arg(short, long)]
        site: String,
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: String,
    },
    /// Probe every site of a list once and print the ranking
    Sweep {
        /// Path to the site list, defaults to the configured sites_path
        #[arg(short, long)]
        sites: Option<String>,
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: String,
        /// Number of concurrent workers
        #[arg(short, long)]
        workers: Option<usize>,
        /// Print the stored measurements as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate example configuration file
    GenerateConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "config_example.toml")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::ValidateConfig { config } => {
            println!("Validating configuration file: {}", config);
            match load_config_from_path(&config).and_then(|cfg| cfg.validate().map(|_| cfg)) {
                Ok(cfg) => {
                    println!("✅ Configuration is valid");
                    println!("  - listen address: {}", cfg.server.listen_address);
                    println!("  - site list: {}", cfg.server.sites_path);
                    println!(
                        "  - probe every {}s, timeout {}s, {} workers",
                        cfg.settings.probe_interval_seconds,
                        cfg.settings.probe_timeout_seconds,
                        cfg.settings.worker_count()
                    );
                }
                Err(e) => {
                    eprintln!("❌ Configuration validation failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Probe { site, config } => {
            let cfg = load_checked_config(&config)?;
            probe_site(&cfg, &site).await?;
        }
        Commands::Sweep {
            sites,
            config,
            workers,
            json,
        } => {
            let cfg = load_checked_config(&config)?;
            let sites_path = sites.unwrap_or_else(|| cfg.server.sites_path.clone());
            sweep_sites(&cfg, &sites_path, workers, json).await?;
        }
        Commands::GenerateConfig { output } => {
            println!("Generating configuration file: {}", output);
            generate_config_file(&output)?;
            println!("✅ Configuration file generated successfully");
        }
    }

    Ok(())
}

fn load_checked_config(config_path: &str) -> Result<Config> {
    let cfg = load_config_or_default(config_path)?;
    cfg.validate()?;
    Ok(cfg)
}

/// 探测单个站点
async fn probe_site(config: &Config, site: &str) -> Result<()> {
    let prober = HttpProber::new(&config.settings)?;

    println!("🔍 Probing {}://{}", config.settings.scheme, site);
    let started = Instant::now();
    match prober.probe(site).await {
        Ok(duration) => {
            println!("✅ First byte after {}ms", duration.as_millis());
        }
        Err(e) => {
            eprintln!(
                "❌ Probe failed after {}ms: {}",
                started.elapsed().as_millis(),
                e
            );
            std::process::exit(1);
        }
    }

    Ok(())
}

/// 对站点列表执行一轮探测并输出排名
async fn sweep_sites(
    config: &Config,
    sites_path: &str,
    workers: Option<usize>,
    json: bool,
) -> Result<()> {
    let sites = load_sites_from_path(sites_path)?;
    let workers = workers.unwrap_or_else(|| config.settings.worker_count());
    let total = sites.len();

    println!(
        "Sweeping {} sites from {} with {} workers...",
        total, sites_path, workers
    );

    let prober: Arc<dyn Prober> = Arc::new(HttpProber::new(&config.settings)?);
    let store = ResponseTimeStore::new();
    let started = Instant::now();
    let ingested = run_single_sweep(prober, sites, workers, &store).await;

    println!(
        "Sweep finished in {}ms: {} measurements, {} sites available, {} unavailable",
        started.elapsed().as_millis(),
        ingested,
        store.len(),
        total.saturating_sub(store.len())
    );
    println!();

    if json {
        println!("{}", serde_json::to_string_pretty(&store.snapshot())?);
        return Ok(());
    }

    if store.is_empty() {
        println!("❌ No site answered within the probe timeout");
        return Ok(());
    }

    for measurement in store.snapshot() {
        println!("  {}", format_measurement(&measurement));
    }
    println!();

    if let Ok(min) = store.min() {
        println!("Fastest: {}", format_measurement(&min));
    }
    if let Ok(max) = store.max() {
        println!("Slowest: {}", format_measurement(&max));
    }
    if let Ok(random) = store.random() {
        println!("Random:  {}", random.site);
    }

    Ok(())
}

fn format_measurement(measurement: &Measurement) -> String {
    format!(
        "{:<40} {:>6}ms",
        measurement.site,
        measurement.duration.as_millis()
    )
}

const EXAMPLE_CONFIG: &str = r#"# best-scraper Configuration File

[server]
# Address the query API listens on (overridden by --listen-address / BIND_ADDRESS)
listen_address = "0.0.0.0:8080"
# Newline separated list of sites to probe (overridden by --sites / SITES_PATH)
sites_path = "./sites.txt"

[settings]
# Delay between the start of two probe cycles
probe_interval_seconds = 60
# Per probe timeout, a site slower than this counts as unavailable
probe_timeout_seconds = 30
# Number of concurrent probe workers, defaults to the CPU count
# workers = 8
# URL scheme used to build probe requests
scheme = "https"
# Capacity of the result queue, defaults to the number of sites
# result_queue_capacity = 100
# How long shutdown waits for in-flight work before aborting it
shutdown_grace_seconds = 5
"#;

/// 生成配置文件
fn generate_config_file(output_path: &str) -> Result<()> {
    std::fs::write(output_path, EXAMPLE_CONFIG)?;
    Ok(())
}
