//! Item persistence operations on the `trackable_items` table.
//!
//! Each row holds the full item document. Records read back are run
//! through the same invariant checks as any other load; a row that fails
//! them aborts hydration instead of being silently repaired.

use sqlx::{PgExecutor, PgPool};

use rxtrace_state::TrackableItem;

fn encode_err(e: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::Encode(Box::new(e))
}

fn document(item: &TrackableItem) -> Result<serde_json::Value, sqlx::Error> {
    serde_json::to_value(item).map_err(|e| {
        tracing::error!(id = %item.id(), error = %e, "failed to serialize item document");
        encode_err(e)
    })
}

fn version(v: u64) -> Result<i64, sqlx::Error> {
    i64::try_from(v).map_err(encode_err)
}

/// Insert a new item. Returns `false` when the id is already taken.
pub async fn insert<'e>(
    executor: impl PgExecutor<'e>,
    item: &TrackableItem,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO trackable_items (id, version, document, updated_at)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(item.id().as_str())
    .bind(version(item.version())?)
    .bind(document(item)?)
    .bind(*item.last_update_at().as_datetime())
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Replace an item whose stored version is `previous_version`.
///
/// Returns `false` when the row is missing or its version moved on.
pub async fn compare_and_set(
    pool: &PgPool,
    previous_version: u64,
    item: &TrackableItem,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE trackable_items SET version = $1, document = $2, updated_at = $3
         WHERE id = $4 AND version = $5",
    )
    .bind(version(item.version())?)
    .bind(document(item)?)
    .bind(*item.last_update_at().as_datetime())
    .bind(item.id().as_str())
    .bind(version(previous_version)?)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Load every item, ordered by id.
pub async fn load_all(pool: &PgPool) -> Result<Vec<TrackableItem>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ItemRow>(
        "SELECT id, version, document FROM trackable_items ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(ItemRow::into_record).collect()
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct ItemRow {
    id: String,
    version: i64,
    document: serde_json::Value,
}

impl ItemRow {
    fn into_record(self) -> Result<TrackableItem, sqlx::Error> {
        let item: TrackableItem = serde_json::from_value(self.document).map_err(|e| {
            tracing::error!(id = %self.id, error = %e, "stored item violates its invariants");
            sqlx::Error::Decode(Box::new(e))
        })?;
        if item.id().as_str() != self.id || i64::try_from(item.version()).ok() != Some(self.version)
        {
            tracing::error!(
                id = %self.id,
                column_version = self.version,
                document_version = item.version(),
                "item row columns disagree with its document"
            );
            return Err(sqlx::Error::Decode(
                format!("item row {} disagrees with its document", self.id).into(),
            ));
        }
        Ok(item)
    }
}
