pub mod config;
pub mod logging;
pub mod memory;
pub mod model;
pub mod model_gateway;
pub mod providers;
pub mod repl;
pub mod scraper;
pub mod workspace;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use reqwest::Client;
use std::io;
use tracing::info;

use config::Config;
use logging::OperationLog;
use memory::MemoryStore;
use model_gateway::HostModelGateway;
use repl::Repl;
use scraper::HttpScraper;

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = logging::init();

    ctrlc::set_handler(|| {
        println!("\nProcess interrupted. Exiting gracefully...");
        std::process::exit(0);
    })
    .context("Failed to install Ctrl-C handler")?;

    let config_path = config::config_path_from_env();
    let cfg = Config::load(&config_path)?;
    info!(
        config = %config_path.display(),
        backend = cfg.backend.as_str(),
        models = ?cfg.service.models,
        "loaded runtime configuration"
    );

    for created in workspace::ensure_directories(&cfg.directories)? {
        println!("Creating directory: {}", created.display());
    }
    let oplog = OperationLog::new(&cfg.log_file, &cfg.error_log_file);
    oplog.record("Directories created successfully.");

    let client = Client::builder()
        .build()
        .context("Failed to initialize HTTP client")?;
    let gateway = HostModelGateway::new(&client, &cfg, &oplog);
    let scraper = HttpScraper::new(&client);
    let store = MemoryStore::new(&cfg.memory_file);

    let mut repl = Repl::new(&cfg.service, &gateway, &scraper, &oplog, store);
    let mut input = io::stdin().lock();
    let mut out = io::stdout();
    repl.run(&mut input, &mut out).await
}
