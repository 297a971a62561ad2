//! Analysis route handlers: upload, stats, dashboard, reset.

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use fva_analytics::{analyze, dashboard_data, AnalysisResult, AnalyzeOptions, DashboardData};
use fva_core::NormalizedRow;
use fva_ingest::{parse_upload, validate_media_type, IngestError};

use super::{map_db_error, ApiError, ApiSuccess, AppState};

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct UploadResponse {
    pub message: String,
    pub total_count: usize,
    pub saved_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct StatsData {
    pub avg_revenue: i64,
    pub avg_retention: i64,
    pub avg_usage: i64,
    pub total_samples: i64,
    pub raw_data: Vec<NormalizedRow>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct DashboardPayload {
    #[serde(flatten)]
    pub charts: DashboardData,
    pub analysis: AnalysisResult,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct ResetResponse {
    pub success: bool,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/analysis/upload: ingest one multipart CSV upload.
///
/// The first `file` part is taken; anything else in the form is ignored.
/// Whole-file validation failures come back as 400/413/415 with the
/// ingest error code and reason; row-level defects never fail the upload
/// and stay visible as the gap between `totalCount` and `savedCount`.
pub(in crate::api) async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file: Option<(Option<String>, Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(map_multipart_error)? {
        if field.name() == Some("file") {
            let declared = field.content_type().map(ToOwned::to_owned);
            let bytes = field.bytes().await.map_err(map_multipart_error)?;
            file = Some((declared, bytes));
            break;
        }
    }

    let Some((declared, bytes)) = file else {
        return Err(IngestError::EmptyFile.into());
    };

    validate_media_type(declared.as_deref())?;
    let parsed = parse_upload(&bytes)?;

    let outcome = fva_db::persist_rows(&state.pool, &parsed.rows)
        .await
        .map_err(|e| map_db_error(&e))?;

    tracing::info!(
        total = parsed.total_records,
        saved = outcome.saved,
        "upload processed"
    );

    Ok(Json(UploadResponse {
        message: "분석 및 저장이 완료되었습니다.".to_string(),
        total_count: parsed.total_records,
        saved_count: outcome.saved,
    }))
}

/// GET /api/v1/analysis/stats: whole-table averages plus every stored row.
pub(in crate::api) async fn stats(
    State(state): State<AppState>,
) -> Result<Json<ApiSuccess<StatsData>>, ApiError> {
    let summary = fva_db::stats_summary(&state.pool)
        .await
        .map_err(|e| stats_unavailable(&e))?;
    let records = fva_db::list_rows(&state.pool)
        .await
        .map_err(|e| stats_unavailable(&e))?;
    let raw_data = records.into_iter().map(NormalizedRow::from).collect();

    Ok(Json(ApiSuccess::new(StatsData {
        avg_revenue: round_i64(summary.avg_payment),
        avg_retention: round_i64(summary.avg_retention_rate * 100.0),
        avg_usage: round_i64(summary.avg_usage_min),
        total_samples: summary.total_samples,
        raw_data,
    })))
}

/// GET /api/v1/analysis/dashboard: chart-shaped aggregates over all rows.
pub(in crate::api) async fn dashboard(
    State(state): State<AppState>,
) -> Result<Json<ApiSuccess<DashboardPayload>>, ApiError> {
    let records = fva_db::list_rows(&state.pool)
        .await
        .map_err(|e| map_db_error(&e))?;
    let rows: Vec<NormalizedRow> = records.into_iter().map(NormalizedRow::from).collect();

    Ok(Json(ApiSuccess::new(DashboardPayload {
        charts: dashboard_data(&rows),
        analysis: analyze(&rows, &AnalyzeOptions::default()),
    })))
}

/// POST /api/v1/analysis/reset: delete every stored row.
pub(in crate::api) async fn reset(
    State(state): State<AppState>,
) -> Result<Json<ResetResponse>, ApiError> {
    let deleted = fva_db::clear_rows(&state.pool)
        .await
        .map_err(|e| map_db_error(&e))?;
    tracing::info!(deleted, "visit rows cleared");

    Ok(Json(ResetResponse {
        success: true,
        message: "모든 데이터가 삭제되었습니다.".to_string(),
    }))
}

// ---------------------------------------------------------------------------
// Error helpers
// ---------------------------------------------------------------------------

fn map_multipart_error(error: MultipartError) -> ApiError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::new("file_too_large", "uploaded body exceeds the size limit");
    }
    ApiError::new(
        "bad_request",
        format!("invalid multipart upload: {}", error.body_text()),
    )
}

fn stats_unavailable(error: &dyn std::fmt::Display) -> ApiError {
    tracing::error!(error = %error, "stats query failed");
    ApiError::new("internal_error", "could not load statistics")
}

// The stats averages sit far below i64 range; the cast saturates on overflow.
#[allow(clippy::cast_possible_truncation)]
fn round_i64(value: f64) -> i64 {
    value.round() as i64
}
