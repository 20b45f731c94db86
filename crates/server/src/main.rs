mod bootstrap;
mod chat;
mod health;

use std::time::Duration;

use anyhow::Result;
use forno_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use forno_core::config::LogFormat;
    use tracing_subscriber::EnvFilter;

    // RUST_LOG wins over the configured level when both are set.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    let builder = tracing_subscriber::fmt().with_target(false).with_env_filter(filter);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    let chat_state = chat::ChatState {
        agent_runtime: app.agent_runtime.clone(),
        sessions: app.sessions.clone(),
        request_timeout: Duration::from_secs(app.config.server.request_timeout_secs),
    };
    let router = chat::router(chat_state, app.config.server.cors_allow_origin.as_deref())
        .merge(health::router(app.db_pool.clone()));

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        degraded = app.db_pool.is_none(),
        "forno-server started"
    );

    axum::serve(listener, router).with_graceful_shutdown(wait_for_shutdown()).await?;

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "forno-server stopping"
    );

    Ok(())
}

async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}
