//! Chart-shaped views over the aggregation engine.
//!
//! Pure reshaping: unit conversion, display rounding, relabeling, and
//! top-N slicing. Everything that computes a number from rows lives in
//! [`crate::engine`]; minutes-to-hours formatting and chart labels stay
//! in the UI.

use serde::Serialize;

use fva_core::NormalizedRow;

use crate::engine::{
    age_rollup, cohort_retention, fit_trend_line, global_averages, monthly_trend, region_rollup,
    scatter_sample,
};
use crate::types::{CohortEntry, RegionStat, ScatterPoint, TrendPoint};
use crate::{count_f64, round_i64};

/// Assumed monthly active visitors for a standard venue; scales the
/// per-user average payment into a monthly revenue estimate.
pub const ESTIMATED_VISITORS: f64 = 1500.0;

/// Regions shown in the region revenue chart.
const REGION_CHART_LIMIT: usize = 10;
/// Regions shown on the radar chart.
const RADAR_CHART_LIMIT: usize = 5;
/// Radar subject labels are clipped to this many characters.
const RADAR_SUBJECT_CHARS: usize = 4;

/// One bar of the per-region revenue chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionChartEntry {
    pub name: String,
    /// Summed revenue in ten-thousand display units.
    pub revenue: i64,
    pub revisit_rate: i64,
    /// Rounded mean duration minutes.
    pub usage: i64,
}

/// One bar of the per-age-bucket chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeChartEntry {
    pub name: String,
    /// Summed revenue in ten-thousand display units.
    pub revenue: i64,
    pub avg_usage: i64,
    pub revisit_rate: i64,
    pub customers: i64,
}

/// One spoke of the top-region radar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarChartEntry {
    /// Region label clipped to four characters.
    pub subject: String,
    /// Mean payment per user in hundred display units.
    pub per_user_spend: i64,
    pub avg_usage: i64,
    pub revisit_rate: i64,
}

/// One period of the monthly series, display-converted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrendEntry {
    pub month: String,
    /// Estimated revenue in thousand display units.
    pub revenue: i64,
    pub revisit_rate: i64,
    pub customers: i64,
}

/// Every chart series the dashboard renders, in wire shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    /// `avg payment × ESTIMATED_VISITORS`, rounded. An estimate.
    pub expected_monthly_revenue: i64,
    pub region_data: Vec<RegionChartEntry>,
    pub age_data: Vec<AgeChartEntry>,
    pub scatter_data: Vec<ScatterPoint>,
    /// Two endpoints of the fitted line; empty when the fit is degenerate.
    pub trend_line: Vec<TrendPoint>,
    pub radar_data: Vec<RadarChartEntry>,
    pub monthly_trend: Vec<MonthlyTrendEntry>,
    pub cohort_data: Vec<CohortEntry>,
}

/// Assemble every chart series for the dashboard from stored rows.
#[must_use]
pub fn dashboard_data(rows: &[NormalizedRow]) -> DashboardData {
    let global = global_averages(rows);
    let expected_monthly_revenue = round_i64(global.avg_payment * ESTIMATED_VISITORS);

    let regions = region_rollup(rows);

    let mut region_data: Vec<RegionChartEntry> = regions
        .iter()
        .map(|stat| RegionChartEntry {
            name: stat.region.clone(),
            revenue: round_i64(stat.revenue / 10_000.0),
            revisit_rate: round_i64(stat.revisit_rate),
            usage: round_i64(stat.avg_usage),
        })
        .collect();
    // Ranked by the converted display value; stable, so ties keep
    // first-seen region order.
    region_data.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    region_data.truncate(REGION_CHART_LIMIT);

    let mut ranked: Vec<&RegionStat> = regions.iter().collect();
    ranked.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    let radar_data = ranked
        .into_iter()
        .take(RADAR_CHART_LIMIT)
        .map(|stat| RadarChartEntry {
            subject: stat.region.chars().take(RADAR_SUBJECT_CHARS).collect(),
            per_user_spend: round_i64(
                stat.revenue / count_f64(stat.sample_count.max(1)) / 100.0,
            ),
            avg_usage: round_i64(stat.avg_usage),
            revisit_rate: round_i64(stat.revisit_rate),
        })
        .collect();

    let age_data = age_rollup(rows)
        .into_iter()
        .map(|stat| AgeChartEntry {
            name: stat.bucket,
            revenue: round_i64(stat.revenue / 10_000.0),
            avg_usage: round_i64(stat.avg_usage),
            revisit_rate: round_i64(stat.revisit_rate),
            customers: i64::try_from(stat.customers).unwrap_or(i64::MAX),
        })
        .collect();

    let scatter_data = scatter_sample(rows);
    let trend_line = match fit_trend_line(&scatter_data) {
        Some(line) => vec![line.start, line.end],
        None => Vec::new(),
    };

    let monthly = monthly_trend(rows)
        .into_iter()
        .map(|point| MonthlyTrendEntry {
            month: point.month,
            revenue: round_i64(point.revenue / 1_000.0),
            revisit_rate: point.revisit_rate,
            customers: point.customers,
        })
        .collect();

    DashboardData {
        expected_monthly_revenue,
        region_data,
        age_data,
        scatter_data,
        trend_line,
        radar_data,
        monthly_trend: monthly,
        cohort_data: cohort_retention(rows),
    }
}
