use anyhow::{Context, Result};
use polyglot_relay::{config::Config, relay::ChatRelay, server};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("polyglot_relay=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    let addr = config.bind_address()?;

    let relay = server::relay_from_config(&config)?;
    let app = server::router(relay.clone(), &config.index_path);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Chat relay listening on http://{}", addr);
    info!("Translation provider: {}", config.translate_api_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(relay))
        .await
        .context("Server error")?;

    info!("Chat relay stopped");
    Ok(())
}

async fn shutdown_signal(relay: Arc<ChatRelay>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
    relay.close_all();
}
