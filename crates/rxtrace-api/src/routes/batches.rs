//! # Production Batch API
//!
//! Lots still with their manufacturer: registration, the production
//! milestone, and the hand-off into the custody chain.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use rxtrace_ledger::{RegisterBatch, ShipBatch};
use rxtrace_state::{LotDetails, TrackableItem};

use super::{generate_id, ItemBody};
use crate::error::AppError;
use crate::extractors::{actor_id, batch_id, extract_validated_json, require, Validate};
use crate::state::AppState;

// ─── DTOs ────────────────────────────────────────────────────────────

/// One row of the batch list.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub id: String,
    pub drug_name: String,
    pub manufacturer: String,
    pub status: String,
    pub quantity: u32,
    pub manufacture_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub version: u64,
}

impl BatchSummary {
    fn of(item: &TrackableItem) -> Option<Self> {
        let batch = item.batch()?;
        Some(Self {
            id: item.id().to_string(),
            drug_name: item.product_name().to_string(),
            manufacturer: batch.manufacturer.clone(),
            status: batch.status.to_string(),
            quantity: batch.lot.quantity,
            manufacture_date: batch.lot.manufacture_date,
            expiry_date: batch.lot.expiry_date,
            version: item.version(),
        })
    }
}

/// Register a production batch.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBatchRequest {
    /// Lot id. Generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    /// Registering manufacturer.
    pub actor_id: String,
    pub drug_name: String,
    pub quantity: u32,
    pub manufacture_date: NaiveDate,
    pub expiry_date: NaiveDate,
}

impl Validate for RegisterBatchRequest {
    fn validate(&self) -> Result<(), String> {
        require("actorId", &self.actor_id)?;
        require("drugName", &self.drug_name)
    }
}

/// Advance a batch to `READY_FOR_SHIPMENT`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceBatchRequest {
    pub actor_id: String,
}

impl Validate for AdvanceBatchRequest {
    fn validate(&self) -> Result<(), String> {
        require("actorId", &self.actor_id)
    }
}

/// Move a ready batch into the custody chain.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShipBatchRequest {
    pub actor_id: String,
    pub destination: String,
    /// Record `IN_TRANSIT` in the same write.
    #[serde(default)]
    pub ship_now: bool,
    #[serde(default)]
    pub recipient: Option<String>,
}

impl Validate for ShipBatchRequest {
    fn validate(&self) -> Result<(), String> {
        require("actorId", &self.actor_id)?;
        require("destination", &self.destination)
    }
}

// ─── Router ──────────────────────────────────────────────────────────

/// Build the batches router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/batches", get(list_batches).post(register_batch))
        .route("/v1/batches/{id}/advance", post(advance_batch))
        .route("/v1/batches/{id}/ship", post(ship_batch))
}

// ─── Handlers ────────────────────────────────────────────────────────

/// GET /v1/batches — Batches still in production.
#[utoipa::path(
    get,
    path = "/v1/batches",
    responses((status = 200, description = "Batches ordered by id", body = Vec<BatchSummary>)),
    tag = "batches"
)]
pub async fn list_batches(State(state): State<AppState>) -> Json<Vec<BatchSummary>> {
    Json(
        state
            .applier
            .batches()
            .iter()
            .filter_map(BatchSummary::of)
            .collect(),
    )
}

/// POST /v1/batches — Register a lot as `IN_PRODUCTION`.
#[utoipa::path(
    post,
    path = "/v1/batches",
    request_body = RegisterBatchRequest,
    responses(
        (status = 201, description = "Batch registered", body = ItemBody),
        (status = 403, description = "Actor is not a manufacturer", body = crate::error::ErrorBody),
        (status = 409, description = "Id already taken", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid lot facts", body = crate::error::ErrorBody),
    ),
    tag = "batches"
)]
pub async fn register_batch(
    State(state): State<AppState>,
    body: Result<Json<RegisterBatchRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ItemBody>), AppError> {
    let req = extract_validated_json(body)?;
    let id = match req.id.as_deref() {
        Some(id) => batch_id(id)?,
        None => generate_id("LOT")?,
    };
    let item = state
        .applier
        .register_batch(RegisterBatch {
            id,
            actor_id: actor_id(&req.actor_id)?,
            drug_name: req.drug_name,
            lot: LotDetails {
                quantity: req.quantity,
                manufacture_date: req.manufacture_date,
                expiry_date: req.expiry_date,
            },
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ItemBody(item))))
}

/// POST /v1/batches/{id}/advance — Mark production complete.
#[utoipa::path(
    post,
    path = "/v1/batches/{id}/advance",
    params(("id" = String, Path, description = "Batch id")),
    request_body = AdvanceBatchRequest,
    responses(
        (status = 200, description = "Batch ready for shipment", body = ItemBody),
        (status = 403, description = "Actor is not the registering manufacturer", body = crate::error::ErrorBody),
        (status = 404, description = "Unknown batch or actor", body = crate::error::ErrorBody),
        (status = 409, description = "Batch already advanced or shipped", body = crate::error::ErrorBody),
    ),
    tag = "batches"
)]
pub async fn advance_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<AdvanceBatchRequest>, JsonRejection>,
) -> Result<Json<ItemBody>, AppError> {
    let req = extract_validated_json(body)?;
    let item = state
        .applier
        .advance_batch(&batch_id(&id)?, &actor_id(&req.actor_id)?)
        .await?;
    Ok(Json(ItemBody(item)))
}

/// POST /v1/batches/{id}/ship — Hand a ready batch to the custody chain.
#[utoipa::path(
    post,
    path = "/v1/batches/{id}/ship",
    params(("id" = String, Path, description = "Batch id")),
    request_body = ShipBatchRequest,
    responses(
        (status = 200, description = "Batch entered custody", body = ItemBody),
        (status = 403, description = "Actor is not the registering manufacturer", body = crate::error::ErrorBody),
        (status = 404, description = "Unknown batch, actor or recipient", body = crate::error::ErrorBody),
        (status = 409, description = "Batch not ready", body = crate::error::ErrorBody),
    ),
    tag = "batches"
)]
pub async fn ship_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ShipBatchRequest>, JsonRejection>,
) -> Result<Json<ItemBody>, AppError> {
    let req = extract_validated_json(body)?;
    let item = state
        .applier
        .ship_batch(ShipBatch {
            id: batch_id(&id)?,
            actor_id: actor_id(&req.actor_id)?,
            destination: req.destination,
            ship_now: req.ship_now,
            recipient: req.recipient,
        })
        .await?;
    Ok(Json(ItemBody(item)))
}
