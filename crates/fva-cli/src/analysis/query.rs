use fva_analytics::{estimated_group_revenue, region_age_rollup, RegionAgeAggregate};
use fva_core::NormalizedRow;

/// Print whole-table averages for the stored rows.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_stats(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let summary = fva_db::stats_summary(pool).await?;
    if summary.total_samples == 0 {
        println!("no visit rows stored; run `fva-cli ingest` first");
        return Ok(());
    }

    println!("{:<16}{}", "SAMPLES", summary.total_samples);
    println!("{:<16}{:.0}", "AVG PAYMENT", summary.avg_payment);
    println!(
        "{:<16}{:.0}%",
        "RETENTION",
        summary.avg_retention_rate * 100.0
    );
    println!("{:<16}{:.1}", "AVG VISIT DAYS", summary.avg_visit_days);
    println!("{:<16}{:.1}", "AVG USAGE MIN", summary.avg_usage_min);
    Ok(())
}

/// Rank region/age groups by estimated monthly revenue.
///
/// Groups with fewer than `min_samples` rows are hidden; the estimate
/// projects each surviving group's average payment across a floored
/// visitor count and a 30-day month.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_report(pool: &sqlx::PgPool, min_samples: usize) -> anyhow::Result<()> {
    let records = fva_db::list_rows(pool).await?;
    if records.is_empty() {
        println!("no visit rows stored; run `fva-cli ingest` first");
        return Ok(());
    }

    let rows: Vec<NormalizedRow> = records.into_iter().map(NormalizedRow::from).collect();
    let stored = rows.len();
    let mut ranked: Vec<(f64, RegionAgeAggregate)> = region_age_rollup(&rows)
        .into_iter()
        .filter(|group| group.sample_count >= min_samples)
        .map(|group| {
            (
                estimated_group_revenue(group.avg_payment(), group.sample_count),
                group,
            )
        })
        .collect();

    if ranked.is_empty() {
        println!("no groups with at least {min_samples} samples ({stored} rows stored)");
        return Ok(());
    }

    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

    let header = format!(
        "{:<12}{:<8}{:>8}{:>12}{:>9}{:>16}",
        "REGION", "AGE", "SAMPLES", "AVG PAY", "REVISIT", "EST REVENUE"
    );
    println!("{header}");
    for (estimate, group) in &ranked {
        println!(
            "{:<12}{:<8}{:>8}{:>12.0}{:>8.0}%{:>16.0}",
            group.region,
            group.age_group,
            group.sample_count,
            group.avg_payment(),
            group.revisit_rate(),
            estimate
        );
    }
    Ok(())
}

/// Delete every stored row after an explicit `--yes`.
///
/// # Errors
///
/// Returns an error if confirmation is missing or the deletion fails.
pub(crate) async fn run_reset(pool: &sqlx::PgPool, yes: bool) -> anyhow::Result<()> {
    if !yes {
        anyhow::bail!("refusing to delete stored rows without --yes");
    }
    let deleted = fva_db::clear_rows(pool).await?;
    println!("deleted {deleted} rows");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(user_id: i64, payment: f64) -> NormalizedRow {
        NormalizedRow {
            user_id,
            region_city: "서울".to_string(),
            age_group: "20대".to_string(),
            age: 25,
            visit_days: 5,
            total_duration_min: 120.0,
            avg_duration_min: 24.0,
            total_payment_may: payment,
            retained_june: 1,
            retained_july: 0,
            retained_august: 0,
            retained_90: 1,
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn reset_requires_confirmation(pool: sqlx::PgPool) {
        fva_db::persist_rows(&pool, &[row(1, 10000.0), row(2, 20000.0)])
            .await
            .expect("seed");

        let err = run_reset(&pool, false).await.expect_err("should refuse");
        assert!(err.to_string().contains("--yes"));
        assert_eq!(fva_db::count_rows(&pool).await.expect("count"), 2);

        run_reset(&pool, true).await.expect("reset");
        assert_eq!(fva_db::count_rows(&pool).await.expect("count"), 0);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn stats_and_report_handle_empty_store(pool: sqlx::PgPool) {
        run_stats(&pool).await.expect("stats");
        run_report(&pool, 5).await.expect("report");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn report_hides_groups_below_the_sample_floor(pool: sqlx::PgPool) {
        fva_db::persist_rows(&pool, &[row(1, 10000.0), row(2, 20000.0)])
            .await
            .expect("seed");

        // Floor above the group size: falls through to the empty branch.
        run_report(&pool, 5).await.expect("report");
        // Floor at the group size: prints the ranked table.
        run_report(&pool, 2).await.expect("report");
    }
}
