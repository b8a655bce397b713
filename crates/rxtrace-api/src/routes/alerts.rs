//! # Alert API
//!
//! Alerts joined to items by batch id, severity counts, and the optional
//! summarization hand-off. Alerts are read-only here.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use rxtrace_alerts::{AlertCorrelator, SeverityCounts};
use rxtrace_core::Alert;

use super::find_item;
use crate::error::AppError;
use crate::state::AppState;

// ─── DTOs ────────────────────────────────────────────────────────────

/// Public view of an alert.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertView {
    pub alert_id: String,
    pub batch_id: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub alert_type: String,
    pub severity: String,
    pub details: String,
}

impl From<&Alert> for AlertView {
    fn from(alert: &Alert) -> Self {
        Self {
            alert_id: alert.alert_id.to_string(),
            batch_id: alert.batch_id.to_string(),
            timestamp: alert.timestamp.to_iso8601(),
            alert_type: alert.alert_type.clone(),
            severity: alert.severity.to_string(),
            details: alert.details.clone(),
        }
    }
}

/// Severity breakdown for one item.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertCountsResponse {
    pub batch_id: String,
    /// Count per severity, zero included.
    #[schema(value_type = Object)]
    pub counts: SeverityCounts,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest: Option<String>,
    /// Whether a summary can be requested.
    pub summary_offered: bool,
}

/// A free-text summary of an item's alerts.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertSummaryResponse {
    pub batch_id: String,
    pub alert_count: usize,
    pub summary: String,
}

/// Filter for the alert list.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListAlertsQuery {
    /// Only alerts whose batch id matches no known item.
    #[serde(default)]
    pub orphaned: bool,
}

// ─── Router ──────────────────────────────────────────────────────────

/// Build the alerts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/alerts", get(list_alerts))
        .route("/v1/shipments/{id}/alerts", get(list_item_alerts))
        .route("/v1/shipments/{id}/alerts/counts", get(item_alert_counts))
        .route("/v1/shipments/{id}/alerts/summary", post(summarize_item_alerts))
}

// ─── Handlers ────────────────────────────────────────────────────────

/// GET /v1/alerts — Every loaded alert, or only the orphaned ones.
#[utoipa::path(
    get,
    path = "/v1/alerts",
    params(ListAlertsQuery),
    responses((status = 200, description = "Alerts in load order", body = Vec<AlertView>)),
    tag = "alerts"
)]
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<ListAlertsQuery>,
) -> Json<Vec<AlertView>> {
    let views = if query.orphaned {
        state
            .alerts
            .orphans(|id| state.applier.contains(id))
            .into_iter()
            .map(AlertView::from)
            .collect()
    } else {
        state.alerts.all().iter().map(AlertView::from).collect()
    };
    Json(views)
}

/// GET /v1/shipments/{id}/alerts — Alerts for one item, oldest first.
#[utoipa::path(
    get,
    path = "/v1/shipments/{id}/alerts",
    params(("id" = String, Path, description = "Item id")),
    responses(
        (status = 200, description = "Alerts, possibly empty", body = Vec<AlertView>),
        (status = 404, description = "Unknown item", body = crate::error::ErrorBody),
    ),
    tag = "alerts"
)]
pub async fn list_item_alerts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AlertView>>, AppError> {
    let item = find_item(&state, &id)?;
    Ok(Json(
        state
            .alerts
            .for_batch(item.id())
            .into_iter()
            .map(AlertView::from)
            .collect(),
    ))
}

/// GET /v1/shipments/{id}/alerts/counts — Severity breakdown.
#[utoipa::path(
    get,
    path = "/v1/shipments/{id}/alerts/counts",
    params(("id" = String, Path, description = "Item id")),
    responses(
        (status = 200, description = "Counts per severity", body = AlertCountsResponse),
        (status = 404, description = "Unknown item", body = crate::error::ErrorBody),
    ),
    tag = "alerts"
)]
pub async fn item_alert_counts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AlertCountsResponse>, AppError> {
    let item = find_item(&state, &id)?;
    let counts = state.alerts.batch_severity_counts(item.id());
    Ok(Json(AlertCountsResponse {
        batch_id: item.id().to_string(),
        total: counts.total(),
        highest: counts.highest().map(|s| s.to_string()),
        summary_offered: state.alerts.summary_offered(item.id()),
        counts,
    }))
}

/// POST /v1/shipments/{id}/alerts/summary — Summarize an item's alerts.
#[utoipa::path(
    post,
    path = "/v1/shipments/{id}/alerts/summary",
    params(("id" = String, Path, description = "Item id")),
    responses(
        (status = 200, description = "Summary text", body = AlertSummaryResponse),
        (status = 404, description = "Unknown item", body = crate::error::ErrorBody),
        (status = 409, description = "Item has no alerts", body = crate::error::ErrorBody),
        (status = 502, description = "Summarizer failed", body = crate::error::ErrorBody),
        (status = 503, description = "Summarizer not configured", body = crate::error::ErrorBody),
    ),
    tag = "alerts"
)]
pub async fn summarize_item_alerts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AlertSummaryResponse>, AppError> {
    let item = find_item(&state, &id)?;
    let client = state.summary.as_ref().ok_or_else(|| {
        AppError::ServiceUnavailable("alert summarization is not configured".into())
    })?;
    let alerts = state.alerts.for_batch(item.id());
    let summary = client.summarize(&alerts).await?;
    tracing::info!(
        batch_id = %item.id(),
        alerts = alerts.len(),
        highest = ?AlertCorrelator::severity_counts(&alerts).highest(),
        "alert summary produced"
    );
    Ok(Json(AlertSummaryResponse {
        batch_id: item.id().to_string(),
        alert_count: alerts.len(),
        summary,
    }))
}
