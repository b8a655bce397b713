//! # rxtrace-api — HTTP Service
//!
//! Axum service over the custody ledger. Assembles the route modules into
//! one application with shared middleware for authentication, request
//! tracing and metrics.
//!
//! ## Routes
//!
//! - `/v1/shipments/*` — custody-phase items, transitions, forwarding
//! - `/v1/batches/*` — production batches
//! - `/v1/actors/*` — actor directory
//! - `/v1/alerts`, `/v1/shipments/{id}/alerts/*` — alert correlation
//! - `/openapi.json` — generated OpenAPI document
//! - `/health/*`, `/metrics` — probes and scrape endpoint (unauthenticated)
//!
//! ## Middleware Stack (Tower)
//!
//! TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
//!
//! ## Crate Policy
//!
//! - No business logic in handlers. Every mutation goes through the
//!   transition applier in `rxtrace-ledger`.
//! - All errors map to structured HTTP responses via [`AppError`].

pub mod auth;
pub mod bootstrap;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use state::{AppConfig, AppState};

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::auth::AuthConfig;
use crate::db::ItemJournal;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) and `/metrics` are mounted outside the auth
/// middleware so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    middleware::metrics::prometheus_handle();
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    let api = Router::new()
        .merge(routes::shipments::router())
        .merge(routes::batches::router())
        .merge(routes::actors::router())
        .merge(routes::alerts::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(middleware::tracing_layer::layer())
        .layer(axum::Extension(auth_config))
        .with_state(state.clone());

    let unauthenticated = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(middleware::metrics::render))
        .with_state(state);

    Router::new().merge(unauthenticated).merge(api)
}

/// Liveness probe.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. Checks the database when one is configured.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let ItemJournal::Postgres(pool) = state.applier.journal() {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!(error = %e, "database health check failed");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }
    (StatusCode::OK, "ready").into_response()
}
