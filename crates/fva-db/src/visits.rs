//! Operations on the `visit_rows` table.

use chrono::{DateTime, Utc};
use fva_core::NormalizedRow;
use serde::Serialize;
use sqlx::PgPool;

use crate::DbError;

/// Rows inserted per round-trip. A resource bound only: the final table
/// state is identical to one unbounded insert.
pub const BATCH_SIZE: usize = 500;

/// A stored visit row as read back from the database.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VisitRowRecord {
    pub user_id: i64,
    pub region_city: String,
    pub age_group: String,
    pub age: i32,
    pub visit_days: i32,
    pub total_duration_min: f64,
    pub avg_duration_min: f64,
    pub total_payment_may: f64,
    pub retained_june: i32,
    pub retained_july: i32,
    pub retained_august: i32,
    pub retained_90: i32,
    pub created_at: DateTime<Utc>,
}

impl From<VisitRowRecord> for NormalizedRow {
    fn from(record: VisitRowRecord) -> Self {
        NormalizedRow {
            user_id: record.user_id,
            region_city: record.region_city,
            age_group: record.age_group,
            age: record.age,
            visit_days: record.visit_days,
            total_duration_min: record.total_duration_min,
            avg_duration_min: record.avg_duration_min,
            total_payment_may: record.total_payment_may,
            retained_june: record.retained_june,
            retained_july: record.retained_july,
            retained_august: record.retained_august,
            retained_90: record.retained_90,
        }
    }
}

/// What happened to one persisted upload.
#[derive(Debug, Clone, Copy)]
pub struct PersistOutcome {
    /// Rows offered to persistence.
    pub total: usize,
    /// Rows actually inserted. Identity collisions (against stored rows or
    /// within the upload itself) are skipped and excluded from this count.
    pub saved: u64,
}

/// Whole-table aggregate used by the stats endpoint. All averages are
/// full-precision; rounding happens at the response boundary.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatsSummaryRow {
    pub avg_payment: f64,
    /// Mean of the 0/1 `retained_90` flags, in `[0, 1]`.
    pub avg_retention_rate: f64,
    pub avg_visit_days: f64,
    pub avg_usage_min: f64,
    pub total_samples: i64,
}

/// Persist normalized rows in [`BATCH_SIZE`] chunks.
///
/// Batches run sequentially: batch N+1 starts only after batch N commits,
/// and a failure at batch K leaves batches 1..K-1 in the table with K+1..
/// unattempted; there is no cross-batch rollback. Callers are expected to
/// filter out rows without a positive identity first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any batch insert fails.
pub async fn persist_rows(pool: &PgPool, rows: &[NormalizedRow]) -> Result<PersistOutcome, DbError> {
    let mut saved: u64 = 0;
    for batch in rows.chunks(BATCH_SIZE) {
        saved += insert_batch(pool, batch).await?;
    }
    Ok(PersistOutcome {
        total: rows.len(),
        saved,
    })
}

/// Insert one batch in a single `INSERT … SELECT FROM UNNEST(…)` statement.
///
/// `ON CONFLICT (user_id) DO NOTHING` makes re-uploads idempotent: the first
/// stored row for an identity wins, and `rows_affected` reports only the
/// rows that were new.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
async fn insert_batch(pool: &PgPool, rows: &[NormalizedRow]) -> Result<u64, sqlx::Error> {
    if rows.is_empty() {
        return Ok(0);
    }

    // Collect each column into a parallel Vec for UNNEST binding.
    let mut user_ids: Vec<i64> = Vec::with_capacity(rows.len());
    let mut region_cities: Vec<String> = Vec::with_capacity(rows.len());
    let mut age_groups: Vec<String> = Vec::with_capacity(rows.len());
    let mut ages: Vec<i32> = Vec::with_capacity(rows.len());
    let mut visit_days: Vec<i32> = Vec::with_capacity(rows.len());
    let mut total_durations: Vec<f64> = Vec::with_capacity(rows.len());
    let mut avg_durations: Vec<f64> = Vec::with_capacity(rows.len());
    let mut payments: Vec<f64> = Vec::with_capacity(rows.len());
    let mut retained_junes: Vec<i32> = Vec::with_capacity(rows.len());
    let mut retained_julys: Vec<i32> = Vec::with_capacity(rows.len());
    let mut retained_augusts: Vec<i32> = Vec::with_capacity(rows.len());
    let mut retained_90s: Vec<i32> = Vec::with_capacity(rows.len());

    for row in rows {
        user_ids.push(row.user_id);
        region_cities.push(row.region_city.clone());
        age_groups.push(row.age_group.clone());
        ages.push(row.age);
        visit_days.push(row.visit_days);
        total_durations.push(row.total_duration_min);
        avg_durations.push(row.avg_duration_min);
        payments.push(row.total_payment_may);
        retained_junes.push(row.retained_june);
        retained_julys.push(row.retained_july);
        retained_augusts.push(row.retained_august);
        retained_90s.push(row.retained_90);
    }

    let result = sqlx::query(
        "INSERT INTO visit_rows \
             (user_id, region_city, age_group, age, visit_days, total_duration_min, \
              avg_duration_min, total_payment_may, retained_june, retained_july, \
              retained_august, retained_90) \
         SELECT * FROM UNNEST(\
              $1::bigint[], $2::text[], $3::text[], $4::int4[], $5::int4[], $6::float8[], \
              $7::float8[], $8::float8[], $9::int4[], $10::int4[], $11::int4[], $12::int4[]) \
         ON CONFLICT (user_id) DO NOTHING",
    )
    .bind(&user_ids)
    .bind(&region_cities)
    .bind(&age_groups)
    .bind(&ages)
    .bind(&visit_days)
    .bind(&total_durations)
    .bind(&avg_durations)
    .bind(&payments)
    .bind(&retained_junes)
    .bind(&retained_julys)
    .bind(&retained_augusts)
    .bind(&retained_90s)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Fetch every stored row in the published stored order: payment descending,
/// identity ascending as the deterministic tiebreak.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_rows(pool: &PgPool) -> Result<Vec<VisitRowRecord>, sqlx::Error> {
    sqlx::query_as::<_, VisitRowRecord>(
        "SELECT user_id, region_city, age_group, age, visit_days, total_duration_min, \
                avg_duration_min, total_payment_may, retained_june, retained_july, \
                retained_august, retained_90, created_at \
         FROM visit_rows \
         ORDER BY total_payment_may DESC, user_id ASC",
    )
    .fetch_all(pool)
    .await
}

/// Count stored rows.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn count_rows(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM visit_rows")
        .fetch_one(pool)
        .await
}

/// Whole-table averages for the stats endpoint, computed in the database.
/// An empty table yields zeros, never NULL.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn stats_summary(pool: &PgPool) -> Result<StatsSummaryRow, sqlx::Error> {
    sqlx::query_as::<_, StatsSummaryRow>(
        "SELECT COALESCE(AVG(total_payment_may), 0)::float8   AS avg_payment, \
                COALESCE(AVG(retained_90), 0)::float8         AS avg_retention_rate, \
                COALESCE(AVG(visit_days), 0)::float8          AS avg_visit_days, \
                COALESCE(AVG(total_duration_min), 0)::float8  AS avg_usage_min, \
                COUNT(*)                                      AS total_samples \
         FROM visit_rows",
    )
    .fetch_one(pool)
    .await
}

/// Delete every stored row. Idempotent: clearing an empty table succeeds
/// with zero rows affected.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn clear_rows(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM visit_rows").execute(pool).await?;
    Ok(result.rows_affected())
}
