//! Live integration tests for fva-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/fva-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use fva_core::NormalizedRow;
use fva_db::{clear_rows, count_rows, list_rows, persist_rows, stats_summary, BATCH_SIZE};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_row(user_id: i64, region: &str, age_group: &str, payment: f64, retained_90: i32) -> NormalizedRow {
    NormalizedRow {
        user_id,
        region_city: region.to_string(),
        age_group: age_group.to_string(),
        age: 25,
        visit_days: 5,
        total_duration_min: 120.0,
        avg_duration_min: 24.0,
        total_payment_may: payment,
        retained_june: 1,
        retained_july: 0,
        retained_august: 0,
        retained_90,
    }
}

/// Three rows with hand-computed aggregate values.
fn sample_rows() -> Vec<NormalizedRow> {
    vec![
        make_row(1, "서울", "20대", 10000.0, 1),
        make_row(2, "서울", "20대", 20000.0, 0),
        make_row(3, "부산", "30대", 5000.0, 1),
    ]
}

// ---------------------------------------------------------------------------
// Section 1: Persistence and Dedup
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn persist_rows_inserts_new_rows(pool: sqlx::PgPool) {
    let outcome = persist_rows(&pool, &sample_rows())
        .await
        .expect("persist_rows failed");

    assert_eq!(outcome.total, 3);
    assert_eq!(outcome.saved, 3);

    let count = count_rows(&pool).await.expect("count_rows failed");
    assert_eq!(count, 3);
}

#[sqlx::test(migrations = "../../migrations")]
async fn persist_rows_reupload_saves_nothing(pool: sqlx::PgPool) {
    persist_rows(&pool, &sample_rows())
        .await
        .expect("first persist failed");

    let second = persist_rows(&pool, &sample_rows())
        .await
        .expect("second persist failed");

    assert_eq!(second.total, 3, "re-upload still offers every row");
    assert_eq!(second.saved, 0, "identity collisions must not be counted as saved");

    let count = count_rows(&pool).await.expect("count_rows failed");
    assert_eq!(count, 3, "table state must equal a single upload");
}

#[sqlx::test(migrations = "../../migrations")]
async fn persist_rows_first_write_wins_on_collision(pool: sqlx::PgPool) {
    persist_rows(&pool, &[make_row(1, "서울", "20대", 10000.0, 1)])
        .await
        .expect("first persist failed");

    // Same identity, different payload: the stored row must not change.
    persist_rows(&pool, &[make_row(1, "부산", "40대", 99999.0, 0)])
        .await
        .expect("second persist failed");

    let rows = list_rows(&pool).await.expect("list_rows failed");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].region_city, "서울");
    assert!((rows[0].total_payment_may - 10000.0).abs() < f64::EPSILON);
}

#[sqlx::test(migrations = "../../migrations")]
async fn persist_rows_skips_intra_batch_duplicates(pool: sqlx::PgPool) {
    let rows = vec![
        make_row(9, "서울", "20대", 100.0, 1),
        make_row(9, "서울", "20대", 100.0, 1),
    ];

    let outcome = persist_rows(&pool, &rows).await.expect("persist failed");
    assert_eq!(outcome.total, 2);
    assert_eq!(outcome.saved, 1, "the duplicate within the batch is skipped");
}

#[sqlx::test(migrations = "../../migrations")]
async fn persist_rows_chunks_uploads_larger_than_one_batch(pool: sqlx::PgPool) {
    let rows: Vec<NormalizedRow> = (1..=(BATCH_SIZE as i64 + 1))
        .map(|id| make_row(id, "서울", "20대", 1000.0, 0))
        .collect();

    let outcome = persist_rows(&pool, &rows).await.expect("persist failed");
    assert_eq!(outcome.total, BATCH_SIZE + 1);
    assert_eq!(outcome.saved, BATCH_SIZE as u64 + 1);

    let count = count_rows(&pool).await.expect("count failed");
    assert_eq!(count, BATCH_SIZE as i64 + 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn persist_rows_empty_slice_is_a_no_op(pool: sqlx::PgPool) {
    let outcome = persist_rows(&pool, &[]).await.expect("persist failed");
    assert_eq!(outcome.total, 0);
    assert_eq!(outcome.saved, 0);
}

// ---------------------------------------------------------------------------
// Section 2: Reads
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn list_rows_orders_by_payment_desc_then_user_id(pool: sqlx::PgPool) {
    let rows = vec![
        make_row(5, "서울", "20대", 100.0, 0),
        make_row(2, "부산", "30대", 500.0, 0),
        make_row(3, "대구", "40대", 100.0, 0),
    ];
    persist_rows(&pool, &rows).await.expect("persist failed");

    let stored = list_rows(&pool).await.expect("list failed");
    let ids: Vec<i64> = stored.iter().map(|r| r.user_id).collect();
    assert_eq!(
        ids,
        vec![2, 3, 5],
        "payment desc, then user_id asc for equal payments"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn stats_summary_matches_three_row_fixture(pool: sqlx::PgPool) {
    persist_rows(&pool, &sample_rows())
        .await
        .expect("persist failed");

    let summary = stats_summary(&pool).await.expect("stats failed");
    assert_eq!(summary.total_samples, 3);
    assert!((summary.avg_payment - 35000.0 / 3.0).abs() < 1e-9);
    assert!((summary.avg_retention_rate - 2.0 / 3.0).abs() < 1e-9);
    assert!((summary.avg_usage_min - 120.0).abs() < 1e-9);
    assert!((summary.avg_visit_days - 5.0).abs() < 1e-9);
}

#[sqlx::test(migrations = "../../migrations")]
async fn stats_summary_empty_table_is_all_zero(pool: sqlx::PgPool) {
    let summary = stats_summary(&pool).await.expect("stats failed");
    assert_eq!(summary.total_samples, 0);
    assert!((summary.avg_payment).abs() < f64::EPSILON);
    assert!((summary.avg_retention_rate).abs() < f64::EPSILON);
    assert!((summary.avg_visit_days).abs() < f64::EPSILON);
    assert!((summary.avg_usage_min).abs() < f64::EPSILON);
}

// ---------------------------------------------------------------------------
// Section 3: Reset
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn clear_rows_removes_everything_and_is_idempotent(pool: sqlx::PgPool) {
    persist_rows(&pool, &sample_rows())
        .await
        .expect("persist failed");

    let deleted = clear_rows(&pool).await.expect("first clear failed");
    assert_eq!(deleted, 3);

    let deleted_again = clear_rows(&pool).await.expect("second clear failed");
    assert_eq!(deleted_again, 0, "clearing an empty table succeeds");

    let count = count_rows(&pool).await.expect("count failed");
    assert_eq!(count, 0);
}
