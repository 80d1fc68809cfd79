use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use battlelens_api::{router, AppState, CacheTtls};
use battlelens_common::{Config, DatasetRegistry};
use battlelens_snapshot::HttpSnapshotSource;

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("battlelens=info".parse()?);
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let config = Config::from_env()?;

    let registry = match &config.datasets_file {
        Some(path) => DatasetRegistry::load(path)
            .with_context(|| format!("Failed to load datasets from {}", path.display()))?,
        None => DatasetRegistry::builtin(),
    };
    let registry = match &config.default_dataset {
        Some(key) => registry.with_default(key)?,
        None => registry,
    };
    info!(
        datasets = registry.datasets().len(),
        default = %registry.default_key(),
        "Dataset registry loaded"
    );

    let source = HttpSnapshotSource::new(
        config.data_base_url.clone(),
        Duration::from_secs(config.fetch_timeout_secs),
    )?;
    let state = Arc::new(AppState::new(
        Arc::new(source),
        registry,
        CacheTtls::from_config(&config),
    ));

    let app = router(state);

    let addr = format!("{}:{}", config.api_host, config.api_port);
    info!("BattleLens API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
