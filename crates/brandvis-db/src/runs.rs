//! Database operations for `visibility_runs`.

use brandvis_core::RunRecord;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `visibility_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VisibilityRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub email: String,
    pub seed_keyword: String,
    pub brand: String,
    pub market: String,
    pub visibility: f64,
    pub top_3_brands: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Append one completed analysis to the run history.
///
/// Generates the `public_id` in Rust and keeps the record's own timestamp.
/// Returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_visibility_run(
    pool: &PgPool,
    record: &RunRecord,
) -> Result<VisibilityRunRow, DbError> {
    let row = sqlx::query_as::<_, VisibilityRunRow>(
        "INSERT INTO visibility_runs \
             (public_id, email, seed_keyword, brand, market, visibility, top_3_brands, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING id, public_id, email, seed_keyword, brand, market, visibility, \
                   top_3_brands, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(&record.email)
    .bind(&record.seed_keyword)
    .bind(&record.brand)
    .bind(&record.market)
    .bind(record.visibility)
    .bind(&record.top_3_brands)
    .bind(record.created_at)
    .fetch_one(pool)
    .await?;

    Ok(row)
}
