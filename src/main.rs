use std::sync::Arc;

use anyhow::{Context, Result};
use config_parser::internal::ConfigFileInternal;
use config_parser::raw::ConfigFile;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

mod server;

const DEFAULT_CONFIG_PATH: &str = "./webhook_gate.yml";

fn setup_tracing(level: LevelFilter) -> Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(level);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .context("Could not set up tracing")
}

#[tokio::main]
async fn main() -> Result<()> {
    // a missing .env file is fine, the variables can come from the real environment
    dotenv::dotenv().ok();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = ConfigFile::parse(&path)?;
    setup_tracing(config.config.log_level)?;

    tracing::info!(path = %path, "Loaded the config file");

    let config = ConfigFileInternal::from_config(config)?;

    let server_handle = tokio::spawn(server::start(Arc::new(config)));

    server_handle.await??;

    Ok(())
}
