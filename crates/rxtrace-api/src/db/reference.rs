//! Actor and alert reference data.
//!
//! Actors keep their insertion order through the `position` column, since
//! next-holder resolution picks the first actor of a role.

use sqlx::{PgExecutor, PgPool};

use rxtrace_core::{Actor, Alert};

fn to_document<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, sqlx::Error> {
    serde_json::to_value(value).map_err(|e| {
        tracing::error!(error = %e, "failed to serialize reference document");
        sqlx::Error::Encode(Box::new(e))
    })
}

fn from_document<T: serde::de::DeserializeOwned>(
    table: &'static str,
    id: &str,
    doc: serde_json::Value,
) -> Result<T, sqlx::Error> {
    serde_json::from_value(doc).map_err(|e| {
        tracing::error!(table, id, error = %e, "invalid reference document");
        sqlx::Error::Decode(Box::new(e))
    })
}

/// Insert one actor at the end of the directory order.
pub async fn insert_actor<'e>(
    executor: impl PgExecutor<'e>,
    actor: &Actor,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO actors (id, document) VALUES ($1, $2)")
        .bind(actor.id.as_str())
        .bind(to_document(actor)?)
        .execute(executor)
        .await?;
    Ok(())
}

/// Insert one alert.
pub async fn insert_alert<'e>(
    executor: impl PgExecutor<'e>,
    alert: &Alert,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO alerts (id, batch_id, document) VALUES ($1, $2, $3)")
        .bind(alert.alert_id.as_str())
        .bind(alert.batch_id.as_str())
        .bind(to_document(alert)?)
        .execute(executor)
        .await?;
    Ok(())
}

/// Load actors in insertion order.
pub async fn load_actors(pool: &PgPool) -> Result<Vec<Actor>, sqlx::Error> {
    let rows: Vec<(String, serde_json::Value)> =
        sqlx::query_as("SELECT id, document FROM actors ORDER BY position")
            .fetch_all(pool)
            .await?;
    rows.into_iter()
        .map(|(id, doc)| from_document("actors", &id, doc))
        .collect()
}

/// Load alerts in insertion order.
pub async fn load_alerts(pool: &PgPool) -> Result<Vec<Alert>, sqlx::Error> {
    let rows: Vec<(String, serde_json::Value)> =
        sqlx::query_as("SELECT id, document FROM alerts ORDER BY position")
            .fetch_all(pool)
            .await?;
    rows.into_iter()
        .map(|(id, doc)| from_document("alerts", &id, doc))
        .collect()
}
