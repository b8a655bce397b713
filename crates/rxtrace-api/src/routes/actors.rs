//! # Actor Directory API
//!
//! Read-only views over the actor directory.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use rxtrace_core::{Actor, Role};

use crate::error::AppError;
use crate::extractors::actor_id;
use crate::state::AppState;

/// Public view of an actor.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActorView {
    pub id: String,
    pub name: String,
    pub role: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl From<&Actor> for ActorView {
    fn from(actor: &Actor) -> Self {
        Self {
            id: actor.id.to_string(),
            name: actor.name.clone(),
            role: actor.role.to_string(),
            location: actor.location.clone(),
            latitude: actor.geo.map(|g| g.lat),
            longitude: actor.geo.map(|g| g.lon),
        }
    }
}

/// Filter for the actor list.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListActorsQuery {
    /// Only actors with this role, e.g. `distributor`.
    pub role: Option<String>,
}

/// Build the actors router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/actors", get(list_actors))
        .route("/v1/actors/{id}", get(get_actor))
        .route("/v1/actors/{id}/receivers", get(list_receivers))
}

/// GET /v1/actors — All actors, in directory order.
#[utoipa::path(
    get,
    path = "/v1/actors",
    params(ListActorsQuery),
    responses(
        (status = 200, description = "Actors", body = Vec<ActorView>),
        (status = 422, description = "Unknown role", body = crate::error::ErrorBody),
    ),
    tag = "actors"
)]
pub async fn list_actors(
    State(state): State<AppState>,
    Query(query): Query<ListActorsQuery>,
) -> Result<Json<Vec<ActorView>>, AppError> {
    let directory = state.applier.directory();
    let views = match query.role.as_deref() {
        Some(role) => directory
            .by_role(Role::from_name(role)?)
            .into_iter()
            .map(ActorView::from)
            .collect(),
        None => directory.all().iter().map(ActorView::from).collect(),
    };
    Ok(Json(views))
}

/// GET /v1/actors/{id} — One actor.
#[utoipa::path(
    get,
    path = "/v1/actors/{id}",
    params(("id" = String, Path, description = "Actor id")),
    responses(
        (status = 200, description = "Actor found", body = ActorView),
        (status = 404, description = "Unknown actor", body = crate::error::ErrorBody),
    ),
    tag = "actors"
)]
pub async fn get_actor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ActorView>, AppError> {
    let actor = state.applier.directory().by_id(&actor_id(&id)?)?;
    Ok(Json(ActorView::from(actor)))
}

/// GET /v1/actors/{id}/receivers — Actors this one may hand custody to.
#[utoipa::path(
    get,
    path = "/v1/actors/{id}/receivers",
    params(("id" = String, Path, description = "Actor id")),
    responses(
        (status = 200, description = "Eligible receivers; empty at the end of the chain", body = Vec<ActorView>),
        (status = 404, description = "Unknown actor", body = crate::error::ErrorBody),
    ),
    tag = "actors"
)]
pub async fn list_receivers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ActorView>>, AppError> {
    let directory = state.applier.directory();
    let actor = directory.by_id(&actor_id(&id)?)?;
    Ok(Json(
        directory
            .receivers_for(actor)
            .into_iter()
            .map(ActorView::from)
            .collect(),
    ))
}
