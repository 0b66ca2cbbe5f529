use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let boot = azoai_core::bootstrap::bootstrap_from_env()?;
    let app = azoai_router::proxy_router(boot.engine.clone());

    let listener = tokio::net::TcpListener::bind(&boot.config.listen_addr)
        .await
        .with_context(|| format!("bind {}", boot.config.listen_addr))?;
    info!(
        event = "listening",
        addr = %boot.config.listen_addr,
        upstream = %boot.config.upstream_base_url,
        region = %boot.config.region_tag
    );
    axum::serve(listener, app).await?;
    Ok(())
}
