use std::sync::Arc;

use anyhow::Context;

use storekeep_api::app::{AppServices, build_app};
use storekeep_infra::StorekeepConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storekeep_observability::init();

    let config = StorekeepConfig::from_env().context("invalid configuration")?;
    let services = AppServices::from_config(&config).context("failed to open storage")?;
    let app = build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
