use serde::Serialize;

/// Arithmetic means across every stored row.
///
/// All values are full precision; rounding happens where a human-facing
/// number is emitted. `avg_retention_rate` is the mean of the 0/1
/// 90-day flag, in `[0.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalAverages {
    pub avg_payment: f64,
    pub avg_retention_rate: f64,
    pub avg_visit_days: f64,
    pub avg_usage_min: f64,
    pub total_samples: usize,
}

/// Full-precision sums for one `(region, age group)` cell.
///
/// Derived fresh from the stored rows on every request, never persisted.
/// `revisit_rate_sum` accumulates per-row retention percentage
/// (`retained_90 * 100`), so the group mean is
/// `revisit_rate_sum / sample_count`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionAgeAggregate {
    pub region: String,
    pub age_group: String,
    /// Summed May payment over the group's rows.
    pub total_payment: f64,
    /// Summed total duration minutes.
    pub total_usage: f64,
    /// Summed per-row retention percentage.
    pub revisit_rate_sum: f64,
    pub sample_count: usize,
}

impl RegionAgeAggregate {
    /// Mean May payment per user in this group.
    #[must_use]
    pub fn avg_payment(&self) -> f64 {
        self.total_payment / crate::count_f64(self.sample_count.max(1))
    }

    /// Mean duration minutes per user.
    #[must_use]
    pub fn avg_usage(&self) -> f64 {
        self.total_usage / crate::count_f64(self.sample_count.max(1))
    }

    /// Mean retention percentage for the group.
    #[must_use]
    pub fn revisit_rate(&self) -> f64 {
        self.revisit_rate_sum / crate::count_f64(self.sample_count.max(1))
    }
}

/// One entry in the ranked region table.
///
/// Values are display-rounded at emission. Ranking is by `total_payment`
/// (summed May payment for the region) descending, ties in first-seen
/// region order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BestPerformer {
    pub region: String,
    pub total_payment: i64,
    pub avg_usage: i64,
    pub revisit_rate: i64,
}

/// The published aggregate contract for one analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Rounded mean total duration minutes across all rows.
    pub global_avg_usage: i64,
    /// Ranked best-performing regions, capped.
    pub best_performers: Vec<BestPerformer>,
    /// Full per-group list in first-seen order, pre-rollup.
    pub region_age: Vec<RegionAgeAggregate>,
}

/// Knobs for [`crate::engine::analyze`].
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// Groups with fewer samples than this are excluded from rankings.
    /// Zero keeps every group; call sites reporting over an established
    /// table raise it to suppress statistically noisy tiny groups.
    pub min_group_samples: usize,
    /// Maximum number of `best_performers` entries.
    pub best_performer_cap: usize,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            min_group_samples: 0,
            best_performer_cap: 5,
        }
    }
}

/// One period of the four-period monthly series.
///
/// Only May payment is collected; June through August revenue is
/// estimated as "May payment if the period's retention flag is set".
/// The whole series is an estimate, not measured revenue.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTrendPoint {
    /// Period label, `5월` through `8월`.
    pub month: String,
    /// Full-precision estimated revenue for the period.
    pub revenue: f64,
    /// Rounded retention percentage; always 0 for the payment period.
    pub revisit_rate: i64,
    /// Row count for the payment period, retained-flag sum afterwards.
    pub customers: i64,
}

/// Retention cohort for one fixed period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortEntry {
    /// Period label: `6월`, `7월`, `8월`, or `90일`.
    pub period: String,
    /// Rounded retention percentage.
    pub rate: i64,
    /// Retained-flag sum.
    pub count: i64,
}

/// Region-level rollup row (age groups ignored), full precision.
///
/// Emitted in first-seen order; consumers sort and slice.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionStat {
    pub region: String,
    /// Summed May payment.
    pub revenue: f64,
    pub avg_usage: f64,
    /// Mean retention percentage.
    pub revisit_rate: f64,
    pub sample_count: usize,
}

/// Canonical age-bucket rollup row, full precision.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeStat {
    /// Canonical bucket label (`10대`, `20대`, `30대`, `40대+`), or an
    /// unrecognized label passed through.
    pub bucket: String,
    pub revenue: f64,
    pub avg_usage: f64,
    pub revisit_rate: f64,
    pub customers: usize,
}

/// One point of the bounded usage/payment scatter sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterPoint {
    /// Total duration minutes.
    pub x: f64,
    /// May payment.
    pub y: f64,
    /// Visit days, floored to 1 for bubble sizing.
    pub z: i32,
    pub region: String,
    pub age_group: String,
}

/// A point on the fitted trend line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    pub x: f64,
    pub y: f64,
}

/// Least-squares fit of payment against duration, as overlay endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendLine {
    /// Endpoint at the sample's minimum x.
    pub start: TrendPoint,
    /// Endpoint at the sample's maximum x.
    pub end: TrendPoint,
}
