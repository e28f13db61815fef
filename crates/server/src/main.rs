use anyhow::Result;

use fareflow_server::bootstrap;

use fareflow_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use fareflow_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    // Now bootstrap using the same config we already loaded
    let app = bootstrap::bootstrap_with_config(config).await?;

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        "fareflow-server listening"
    );

    let grace = std::time::Duration::from_secs(app.config.server.graceful_shutdown_secs);
    let server = axum::serve(listener, app.router).with_graceful_shutdown(wait_for_shutdown());
    tokio::select! {
        result = server => result?,
        () = shutdown_deadline(grace) => {
            tracing::warn!(
                event_name = "system.server.shutdown_timeout",
                grace_secs = grace.as_secs(),
                "graceful shutdown grace period elapsed, exiting"
            );
        }
    }

    tracing::info!(event_name = "system.server.stopping", "fareflow-server stopping");
    app.db_pool.close().await;

    Ok(())
}

async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}

/// Resolves once the shutdown signal has been seen and the grace period for
/// draining in-flight requests has passed.
async fn shutdown_deadline(grace: std::time::Duration) {
    let _ = tokio::signal::ctrl_c().await;
    tokio::time::sleep(grace).await;
}
