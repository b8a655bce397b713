//! # rxtrace-api — Binary Entry Point
//!
//! Starts the Axum HTTP server. Binds to `PORT` (default 8080).
//! Set `RXTRACE_LOG_FORMAT=json` for JSON log lines.

use rxtrace_api::state::AppConfig;
use rxtrace_summary::{SummaryClient, SummaryConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if std::env::var("RXTRACE_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = AppConfig::from_env();
    let port = config.port;

    // Absent DATABASE_URL means in-memory only.
    let db_pool = rxtrace_api::db::init_pool(config.database_url.as_deref())
        .await
        .map_err(|e| {
            tracing::error!("Database initialization failed: {e}");
            e
        })?;

    let summary = match SummaryConfig::from_env()? {
        Some(summary_config) => {
            tracing::info!(base_url = %summary_config.base_url, "summary client configured");
            Some(SummaryClient::new(summary_config)?)
        }
        None => {
            tracing::warn!("RXTRACE_SUMMARY_URL not set, alert summaries will return 503");
            None
        }
    };

    let state = rxtrace_api::bootstrap::bootstrap(config, db_pool, summary)
        .await
        .map_err(|e| {
            tracing::error!("Bootstrap failed: {e}");
            e
        })?;

    let app = rxtrace_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("rxtrace API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
