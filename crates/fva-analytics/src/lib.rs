//! Aggregation and dashboard shaping for visit analytics.
//!
//! [`engine`] computes deterministic aggregates over normalized visit
//! rows: global averages, region/age rollups, ranked performers, the
//! monthly and cohort series, the scatter sample, and the least-squares
//! trend line. [`adapter`] reshapes engine output into the chart series
//! the dashboard renders. Both are pure; storage stays in `fva-db` and
//! transport in `fva-server`.

pub mod adapter;
pub mod engine;
pub mod types;

pub use adapter::{dashboard_data, DashboardData};
pub use engine::{
    analyze, canonical_age_bucket, estimated_group_revenue, region_age_rollup,
    SCATTER_SAMPLE_MAX,
};
pub use types::{AnalysisResult, AnalyzeOptions, BestPerformer, RegionAgeAggregate};

// Sample counts are bounded by the stored row count and fit well within
// f64's 52-bit mantissa.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn count_f64(count: usize) -> f64 {
    count as f64
}

// Display values are rounded and far below i64 range; the cast saturates
// rather than wraps.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn round_i64(value: f64) -> i64 {
    value.round() as i64
}
