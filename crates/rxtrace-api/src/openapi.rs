//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI 3.1 spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some("Static bearer token. Set via AUTH_TOKEN."))
                        .build(),
                ),
            );
        }
    }
}

/// Assembled OpenAPI spec for the whole API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "rxtrace API",
        version = "0.1.0",
        description = "Chain-of-custody tracking for pharmaceutical shipments.\n\nAuthentication: `Authorization: Bearer <token>` when AUTH_TOKEN is set. Health probes and `/metrics` are unauthenticated.",
        license(name = "AGPL-3.0-or-later")
    ),
    servers((url = "http://localhost:8080", description = "Local development server")),
    security(("bearer_auth" = [])),
    paths(
        crate::routes::shipments::list_shipments,
        crate::routes::shipments::create_shipment,
        crate::routes::shipments::get_shipment,
        crate::routes::shipments::get_history,
        crate::routes::shipments::transition_shipment,
        crate::routes::shipments::get_available_transitions,
        crate::routes::shipments::forward_shipment,
        crate::routes::batches::list_batches,
        crate::routes::batches::register_batch,
        crate::routes::batches::advance_batch,
        crate::routes::batches::ship_batch,
        crate::routes::actors::list_actors,
        crate::routes::actors::get_actor,
        crate::routes::actors::list_receivers,
        crate::routes::alerts::list_alerts,
        crate::routes::alerts::list_item_alerts,
        crate::routes::alerts::item_alert_counts,
        crate::routes::alerts::summarize_item_alerts,
    ),
    components(
        schemas(
            crate::routes::ItemBody,
            crate::routes::shipments::ShipmentSummary,
            crate::routes::shipments::CreateShipmentRequest,
            crate::routes::shipments::TransitionRequest,
            crate::routes::shipments::TransitionResponse,
            crate::routes::shipments::ForwardRequest,
            crate::routes::shipments::HistoryEntryView,
            crate::routes::shipments::HistoryResponse,
            crate::routes::shipments::AvailableTransitionsResponse,
            crate::routes::batches::BatchSummary,
            crate::routes::batches::RegisterBatchRequest,
            crate::routes::batches::AdvanceBatchRequest,
            crate::routes::batches::ShipBatchRequest,
            crate::routes::actors::ActorView,
            crate::routes::alerts::AlertView,
            crate::routes::alerts::AlertCountsResponse,
            crate::routes::alerts::AlertSummaryResponse,
            crate::error::ErrorBody,
            crate::error::ErrorDetail,
        ),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "shipments", description = "Custody-phase items: ledger, transitions, forwarding"),
        (name = "batches", description = "Production batches before they enter custody"),
        (name = "actors", description = "Actor directory"),
        (name = "alerts", description = "Alert correlation and summaries"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
