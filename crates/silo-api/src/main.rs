//! Binary entrypoint for the Silo API server.
use silo_api::{config::Settings, run};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    // Listen address and limits come from SILO_* variables
    let settings = Settings::from_env()?;
    run(settings).await
}
