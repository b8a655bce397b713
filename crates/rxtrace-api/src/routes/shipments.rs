//! # Shipment API
//!
//! Items in the custody phase: listing, creation, the custody ledger, and
//! status transitions. Every mutation goes through the transition applier;
//! handlers only translate requests and render results.
//!
//! `POST /v1/shipments/{id}/transition` answers with an envelope rather than
//! the common error body, so clients can branch on `ok`:
//!
//! ```text
//! 200 { "ok": true,  "shipment": { ... } }
//! 4xx { "ok": false, "errorKind": "UNAUTHORIZED", "message": "..." }
//! ```

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use rxtrace_core::same_name;
use rxtrace_ledger::{CreateShipment, ForwardShipment};
use rxtrace_state::{
    available_transitions, valid_transitions, ActorPosition, CustodyStatus, ItemKind,
    TrackableItem,
};

use super::{find_item, generate_id, ItemBody};
use crate::error::AppError;
use crate::extractors::{actor_id, batch_id, extract_validated_json, require, Validate};
use crate::state::AppState;

// ─── DTOs ────────────────────────────────────────────────────────────

/// One row of the shipment list.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentSummary {
    pub id: String,
    pub kind: String,
    pub product_name: String,
    pub status: String,
    pub current_holder_name: String,
    pub origin_location: String,
    pub destination_location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub version: u64,
    pub last_update_at: String,
    pub terminal: bool,
    pub alert_count: usize,
}

impl ShipmentSummary {
    fn of(item: &TrackableItem, alert_count: usize) -> Option<Self> {
        let custody = item.custody()?;
        Some(Self {
            id: item.id().to_string(),
            kind: item.kind().to_string(),
            product_name: item.product_name().to_string(),
            status: custody.status().to_string(),
            current_holder_name: custody.current_holder().to_string(),
            origin_location: custody.origin().to_string(),
            destination_location: custody.destination().to_string(),
            parent: custody.parent().map(ToString::to_string),
            version: item.version(),
            last_update_at: item.last_update_at().to_iso8601(),
            terminal: item.is_terminal(),
            alert_count,
        })
    }
}

/// Filters for the shipment list.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListShipmentsQuery {
    /// Only shipments in this status (wire or display name).
    pub status: Option<String>,
    /// Only shipments held by this actor name.
    pub holder: Option<String>,
}

/// Open a new shipment or regulatory submission.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipmentRequest {
    /// Item id. Generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    /// `physical_shipment` (default) or `regulatory_submission`.
    #[serde(default)]
    pub kind: Option<String>,
    /// Acting actor; becomes the first holder.
    pub actor_id: String,
    pub product_name: String,
    pub destination: String,
    /// Defaults to the actor's location.
    #[serde(default)]
    pub origin: Option<String>,
    /// Record `IN_TRANSIT` in the same write.
    #[serde(default)]
    pub ship_now: bool,
    /// Explicit next holder when shipping now.
    #[serde(default)]
    pub recipient: Option<String>,
}

impl Validate for CreateShipmentRequest {
    fn validate(&self) -> Result<(), String> {
        require("actorId", &self.actor_id)?;
        require("productName", &self.product_name)?;
        require("destination", &self.destination)
    }
}

/// Request a status change.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    /// Acting actor.
    pub actor_id: String,
    /// Target status (`IN_TRANSIT` or `In-Transit`).
    pub status: String,
    /// Explicit next holder for a hand-over.
    #[serde(default, alias = "nextHolderName")]
    pub recipient: Option<String>,
}

impl Validate for TransitionRequest {
    fn validate(&self) -> Result<(), String> {
        require("actorId", &self.actor_id)?;
        require("status", &self.status)
    }
}

/// Outcome of a transition request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub shipment: Option<TrackableItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TransitionResponse {
    fn rejected(err: AppError) -> (StatusCode, Json<Self>) {
        let (status, code) = err.status_and_code();
        if err.is_hidden() {
            tracing::error!(error = %err, "transition failed with a hidden error");
        }
        (
            status,
            Json(Self {
                ok: false,
                shipment: None,
                error_kind: Some(code.to_string()),
                message: Some(err.public_message()),
            }),
        )
    }
}

/// Open the next hop from a delivered shipment.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForwardRequest {
    /// Id for the new item. Generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    /// Holder of the delivered item.
    pub actor_id: String,
    pub destination: String,
    #[serde(default)]
    pub ship_now: bool,
    #[serde(default)]
    pub recipient: Option<String>,
}

impl Validate for ForwardRequest {
    fn validate(&self) -> Result<(), String> {
        require("actorId", &self.actor_id)?;
        require("destination", &self.destination)
    }
}

/// One ledger entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryEntryView {
    pub status: String,
    pub holder: String,
    pub timestamp: String,
}

/// The custody ledger of one item.
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryResponse {
    pub id: String,
    pub entries: Vec<HistoryEntryView>,
}

/// Query for the available-transitions view.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TransitionsQuery {
    /// Actor to evaluate for.
    pub actor_id: String,
}

/// What an actor may do to an item right now.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailableTransitionsResponse {
    pub id: String,
    pub actor_id: String,
    pub position: String,
    pub status: String,
    /// Targets this actor may request.
    pub available: Vec<String>,
    /// Every target reachable from the current status, by anyone.
    pub reachable: Vec<String>,
}

// ─── Router ──────────────────────────────────────────────────────────

/// Build the shipments router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/shipments", get(list_shipments).post(create_shipment))
        .route("/v1/shipments/{id}", get(get_shipment))
        .route("/v1/shipments/{id}/history", get(get_history))
        .route("/v1/shipments/{id}/transition", post(transition_shipment))
        .route("/v1/shipments/{id}/transitions", get(get_available_transitions))
        .route("/v1/shipments/{id}/forward", post(forward_shipment))
}

// ─── Handlers ────────────────────────────────────────────────────────

/// GET /v1/shipments — List shipments with their alert counts.
#[utoipa::path(
    get,
    path = "/v1/shipments",
    params(ListShipmentsQuery),
    responses(
        (status = 200, description = "Shipments ordered by id", body = Vec<ShipmentSummary>),
        (status = 422, description = "Unknown status filter", body = crate::error::ErrorBody),
    ),
    tag = "shipments"
)]
pub async fn list_shipments(
    State(state): State<AppState>,
    Query(query): Query<ListShipmentsQuery>,
) -> Result<Json<Vec<ShipmentSummary>>, AppError> {
    let status = query
        .status
        .as_deref()
        .map(CustodyStatus::parse)
        .transpose()?;
    let counts = state.alerts.counts_by_batch();
    let rows = state
        .applier
        .shipments()
        .iter()
        .filter(|item| {
            let Some(custody) = item.custody() else {
                return false;
            };
            status.map_or(true, |s| custody.status() == s)
                && query
                    .holder
                    .as_deref()
                    .map_or(true, |h| same_name(h, custody.current_holder()))
        })
        .filter_map(|item| {
            ShipmentSummary::of(item, counts.get(item.id()).copied().unwrap_or(0))
        })
        .collect();
    Ok(Json(rows))
}

/// POST /v1/shipments — Open a shipment held by the acting actor.
#[utoipa::path(
    post,
    path = "/v1/shipments",
    request_body = CreateShipmentRequest,
    responses(
        (status = 201, description = "Shipment created", body = ItemBody),
        (status = 403, description = "Actor cannot hold custody", body = crate::error::ErrorBody),
        (status = 404, description = "Unknown actor", body = crate::error::ErrorBody),
        (status = 409, description = "Id already taken", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "shipments"
)]
pub async fn create_shipment(
    State(state): State<AppState>,
    body: Result<Json<CreateShipmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ItemBody>), AppError> {
    let req = extract_validated_json(body)?;
    let kind = match req.kind.as_deref() {
        Some(k) => k.parse::<ItemKind>()?,
        None => ItemKind::PhysicalShipment,
    };
    let id = match req.id.as_deref() {
        Some(id) => batch_id(id)?,
        None => generate_id("SHP")?,
    };
    let item = state
        .applier
        .create_shipment(CreateShipment {
            id,
            kind,
            actor_id: actor_id(&req.actor_id)?,
            product_name: req.product_name,
            destination: req.destination,
            origin: req.origin,
            ship_now: req.ship_now,
            recipient: req.recipient,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ItemBody(item))))
}

/// GET /v1/shipments/{id} — Current record, phase included.
#[utoipa::path(
    get,
    path = "/v1/shipments/{id}",
    params(("id" = String, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item found", body = ItemBody),
        (status = 404, description = "Unknown item", body = crate::error::ErrorBody),
    ),
    tag = "shipments"
)]
pub async fn get_shipment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ItemBody>, AppError> {
    Ok(Json(ItemBody(find_item(&state, &id)?)))
}

/// GET /v1/shipments/{id}/history — The custody ledger, oldest first.
#[utoipa::path(
    get,
    path = "/v1/shipments/{id}/history",
    params(("id" = String, Path, description = "Item id")),
    responses(
        (status = 200, description = "Ledger entries; empty before shipping", body = HistoryResponse),
        (status = 404, description = "Unknown item", body = crate::error::ErrorBody),
    ),
    tag = "shipments"
)]
pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HistoryResponse>, AppError> {
    let item = find_item(&state, &id)?;
    let entries = item
        .custody()
        .map(|c| {
            c.history()
                .entries()
                .iter()
                .map(|e| HistoryEntryView {
                    status: e.status.to_string(),
                    holder: e.holder.clone(),
                    timestamp: e.timestamp.to_iso8601(),
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(Json(HistoryResponse {
        id: item.id().to_string(),
        entries,
    }))
}

/// POST /v1/shipments/{id}/transition — Request a status change.
#[utoipa::path(
    post,
    path = "/v1/shipments/{id}/transition",
    params(("id" = String, Path, description = "Item id")),
    request_body = TransitionRequest,
    responses(
        (status = 200, description = "Transition committed", body = TransitionResponse),
        (status = 403, description = "Actor lacks standing", body = TransitionResponse),
        (status = 404, description = "Unknown item, actor or recipient", body = TransitionResponse),
        (status = 409, description = "Invalid transition or concurrent modification", body = TransitionResponse),
        (status = 422, description = "Malformed request", body = TransitionResponse),
        (status = 500, description = "Durable write failed", body = TransitionResponse),
    ),
    tag = "shipments"
)]
pub async fn transition_shipment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<TransitionRequest>, JsonRejection>,
) -> (StatusCode, Json<TransitionResponse>) {
    match request_transition(&state, &id, body).await {
        Ok(item) => (
            StatusCode::OK,
            Json(TransitionResponse {
                ok: true,
                shipment: Some(item),
                error_kind: None,
                message: None,
            }),
        ),
        Err(err) => TransitionResponse::rejected(err),
    }
}

async fn request_transition(
    state: &AppState,
    id: &str,
    body: Result<Json<TransitionRequest>, JsonRejection>,
) -> Result<TrackableItem, AppError> {
    let req = extract_validated_json(body)?;
    let id = batch_id(id)?;
    let actor = actor_id(&req.actor_id)?;
    let status = CustodyStatus::parse(&req.status)?;
    Ok(state
        .applier
        .apply(&id, &actor, status, req.recipient.as_deref())
        .await?)
}

/// GET /v1/shipments/{id}/transitions — Targets open to one actor.
#[utoipa::path(
    get,
    path = "/v1/shipments/{id}/transitions",
    params(("id" = String, Path, description = "Item id"), TransitionsQuery),
    responses(
        (status = 200, description = "Available targets", body = AvailableTransitionsResponse),
        (status = 404, description = "Unknown item or actor", body = crate::error::ErrorBody),
        (status = 409, description = "Item has not shipped yet", body = crate::error::ErrorBody),
    ),
    tag = "shipments"
)]
pub async fn get_available_transitions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TransitionsQuery>,
) -> Result<Json<AvailableTransitionsResponse>, AppError> {
    let item = find_item(&state, &id)?;
    let actor = state.applier.directory().by_id(&actor_id(&query.actor_id)?)?;
    let custody = item.custody().ok_or_else(|| {
        AppError::rejected(
            rxtrace_core::ErrorKind::InvalidTransition,
            format!("item {} has not entered the custody chain", item.id()),
        )
    })?;
    let names = |v: Vec<CustodyStatus>| -> Vec<String> {
        v.iter().map(ToString::to_string).collect()
    };
    Ok(Json(AvailableTransitionsResponse {
        id: item.id().to_string(),
        actor_id: actor.id.to_string(),
        position: ActorPosition::of(actor, custody).to_string(),
        status: custody.status().to_string(),
        available: names(available_transitions(&item, actor)),
        reachable: names(valid_transitions(item.kind(), custody.status())),
    }))
}

/// POST /v1/shipments/{id}/forward — Open the next hop.
#[utoipa::path(
    post,
    path = "/v1/shipments/{id}/forward",
    params(("id" = String, Path, description = "Delivered item id")),
    request_body = ForwardRequest,
    responses(
        (status = 201, description = "Next hop created", body = ItemBody),
        (status = 403, description = "Actor does not hold the delivered item", body = crate::error::ErrorBody),
        (status = 404, description = "Unknown item or actor", body = crate::error::ErrorBody),
        (status = 409, description = "Item not delivered, or id taken", body = crate::error::ErrorBody),
    ),
    tag = "shipments"
)]
pub async fn forward_shipment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ForwardRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ItemBody>), AppError> {
    let req = extract_validated_json(body)?;
    let new_id = match req.id.as_deref() {
        Some(id) => batch_id(id)?,
        None => generate_id("SHP")?,
    };
    let item = state
        .applier
        .forward(ForwardShipment {
            parent_id: batch_id(&id)?,
            id: new_id,
            actor_id: actor_id(&req.actor_id)?,
            destination: req.destination,
            ship_now: req.ship_now,
            recipient: req.recipient,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ItemBody(item))))
}
