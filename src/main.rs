use bot_bootstrap::bootstrap;
use bot_bootstrap::config::{Config, TokenCheck};
use bot_bootstrap::telegram::TokenStatus;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    tracing::info!("Bot bootstrap v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Token check: {:?}", config.token_check);

    let mut services = bootstrap::bootstrap(&config);

    match services.database() {
        Ok(app) => tracing::info!("Database ready: {}", app.project_id()),
        Err(e) => tracing::warn!("{e}; database features disabled"),
    }

    if config.token_check == TokenCheck::Eager {
        if let TokenStatus::Rejected { reason } = services.bot_mut().verify().await {
            tracing::error!("Telegram rejected the bot token: {reason}");
        }
    }

    bootstrap::install(services);

    tracing::info!("Services ready, waiting for shutdown signal");
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    tracing::info!("Shutting down");
}
