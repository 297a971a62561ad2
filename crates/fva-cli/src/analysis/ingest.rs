use std::path::Path;

use fva_ingest::parse_upload;

/// Seed the store from a CSV export on disk.
///
/// The file goes through the same pipeline as an HTTP upload: size cap,
/// required-column check against the alias table, per-row coercion with
/// defaults. No media type is declared for a disk read, so the file is
/// judged by content alone.
///
/// When `dry_run` is `true` the function reports what would be saved and
/// returns without touching the database.
///
/// # Errors
///
/// Returns an error if the file cannot be read, fails upload validation,
/// or the insert fails.
pub(crate) async fn run_ingest(
    pool: &sqlx::PgPool,
    file: &Path,
    dry_run: bool,
) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", file.display()))?;

    let parsed = parse_upload(&bytes)?;

    if dry_run {
        println!(
            "dry-run: would save {} of {} parsed records from {}",
            parsed.rows.len(),
            parsed.total_records,
            file.display()
        );
        return Ok(());
    }

    let outcome = fva_db::persist_rows(pool, &parsed.rows).await?;
    let skipped = u64::try_from(parsed.total_records)
        .unwrap_or(u64::MAX)
        .saturating_sub(outcome.saved);
    println!(
        "parsed {} records, saved {} new rows ({skipped} skipped as duplicates or without identity)",
        parsed.total_records, outcome.saved
    );
    Ok(())
}
