use carbon_tracker_api::config::AppConfig;
use carbon_tracker_api::routes::{router, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Carbon tracker HTTP API.
/// Entries live in an append-only log; breakdowns and recommendations
/// are derived from it on every request.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = AppConfig::from_env();
    info!(
        http_addr = %config.http_addr,
        log_path = %config.log_path.display(),
        window_days = config.window_days,
        "starting carbon tracker API"
    );

    let addr = config.http_addr;
    let app = router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
