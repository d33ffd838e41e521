//! best-scraper Server
//!
//! Main entry point for the site latency service

use clap::Parser;
use scraper_api::{start_server, ServerOptions};
use scraper_core::config::loader::DEFAULT_CONFIG_PATH;

#[derive(Parser)]
#[command(name = "scraper-api")]
#[command(about = "Measures site latency and serves the fastest, slowest or a random site")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "CONFIG_PATH", default_value = DEFAULT_CONFIG_PATH)]
    config: String,
    /// The address to listen on for HTTP requests
    #[arg(long, env = "BIND_ADDRESS")]
    listen_address: Option<String>,
    /// Path to sites.txt
    #[arg(long, env = "SITES_PATH")]
    sites: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    start_server(ServerOptions {
        config_path: args.config,
        listen_address: args.listen_address,
        sites_path: args.sites,
    })
    .await
}
