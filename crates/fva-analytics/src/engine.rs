//! Deterministic aggregation over stored visit rows.
//!
//! Every function is a pure view of its input slice: no mutation, no
//! storage access, and defined all-zero/empty defaults for an empty row
//! set. Sums and means stay full precision; rounding happens only where
//! a human-facing integer is emitted.

use std::collections::HashMap;

use fva_core::NormalizedRow;

use crate::types::{
    AgeStat, AnalysisResult, AnalyzeOptions, BestPerformer, CohortEntry, GlobalAverages,
    MonthlyTrendPoint, RegionAgeAggregate, RegionStat, ScatterPoint, TrendLine, TrendPoint,
};
use crate::{count_f64, round_i64};

/// Assumed visitor base when extrapolating revenue for small groups.
pub const VISITOR_FLOOR: usize = 50;

/// Scaling factor from a per-visitor figure to a monthly estimate.
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Upper bound on the scatter sample handed to visualization.
pub const SCATTER_SAMPLE_MAX: usize = 150;

const MONTH_LABELS: [&str; 4] = ["5월", "6월", "7월", "8월"];

/// Arithmetic means of payment, retention, visit days, and duration.
///
/// Zero rows yield an all-zero result, never a division error.
#[must_use]
pub fn global_averages(rows: &[NormalizedRow]) -> GlobalAverages {
    if rows.is_empty() {
        return GlobalAverages {
            avg_payment: 0.0,
            avg_retention_rate: 0.0,
            avg_visit_days: 0.0,
            avg_usage_min: 0.0,
            total_samples: 0,
        };
    }

    let mut payment = 0.0;
    let mut retained = 0.0;
    let mut visit_days = 0.0;
    let mut usage = 0.0;
    for row in rows {
        payment += row.total_payment_may;
        retained += f64::from(row.retained_90);
        visit_days += f64::from(row.visit_days);
        usage += row.total_duration_min;
    }

    let n = count_f64(rows.len());
    GlobalAverages {
        avg_payment: payment / n,
        avg_retention_rate: retained / n,
        avg_visit_days: visit_days / n,
        avg_usage_min: usage / n,
        total_samples: rows.len(),
    }
}

/// Group rows by `(region, age group)`, preserving first-seen order.
#[must_use]
pub fn region_age_rollup(rows: &[NormalizedRow]) -> Vec<RegionAgeAggregate> {
    let mut groups: Vec<RegionAgeAggregate> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for row in rows {
        let key = (row.region_city.clone(), row.age_group.clone());
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(RegionAgeAggregate {
                region: row.region_city.clone(),
                age_group: row.age_group.clone(),
                total_payment: 0.0,
                total_usage: 0.0,
                revisit_rate_sum: 0.0,
                sample_count: 0,
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.total_payment += row.total_payment_may;
        group.total_usage += row.total_duration_min;
        group.revisit_rate_sum += f64::from(row.retained_90) * 100.0;
        group.sample_count += 1;
    }

    groups
}

// Shared insertion-ordered accumulator for the region and age folds.
struct GroupFold {
    label: String,
    revenue: f64,
    usage: f64,
    revisit_rate_sum: f64,
    samples: usize,
}

impl GroupFold {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            revenue: 0.0,
            usage: 0.0,
            revisit_rate_sum: 0.0,
            samples: 0,
        }
    }
}

/// Rank regions by summed May payment, descending.
///
/// `groups` is a region/age rollup; groups with fewer than `min_samples`
/// rows are dropped before folding into regions, so a handful of stray
/// rows cannot fabricate a top region (pass 0 when aggregating freshly
/// uploaded raw rows). The sort is stable: ties keep first-seen region
/// order. Output values are display-rounded.
#[must_use]
pub fn rank_best_performers(
    groups: &[RegionAgeAggregate],
    min_samples: usize,
    cap: usize,
) -> Vec<BestPerformer> {
    let mut folds: Vec<GroupFold> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for group in groups {
        if group.sample_count < min_samples {
            continue;
        }
        let slot = *index.entry(group.region.clone()).or_insert_with(|| {
            folds.push(GroupFold::new(&group.region));
            folds.len() - 1
        });
        let fold = &mut folds[slot];
        fold.revenue += group.total_payment;
        fold.usage += group.total_usage;
        fold.revisit_rate_sum += group.revisit_rate_sum;
        fold.samples += group.sample_count;
    }

    folds.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    folds.truncate(cap);

    folds
        .into_iter()
        .map(|fold| {
            let n = count_f64(fold.samples.max(1));
            BestPerformer {
                region: fold.label,
                total_payment: round_i64(fold.revenue),
                avg_usage: round_i64(fold.usage / n),
                revisit_rate: round_i64(fold.revisit_rate_sum / n),
            }
        })
        .collect()
}

/// Extrapolated monthly revenue for one group.
///
/// `avg_payment_per_user × max(sample_count, VISITOR_FLOOR) ×
/// DAYS_PER_MONTH`. An estimate for sizing opportunities, not a measured
/// value: tiny groups are floored to a standard visitor base so a
/// two-row group does not collapse the projection.
#[must_use]
pub fn estimated_group_revenue(avg_payment_per_user: f64, sample_count: usize) -> f64 {
    avg_payment_per_user * count_f64(sample_count.max(VISITOR_FLOOR)) * DAYS_PER_MONTH
}

/// Build the fixed four-period monthly series.
///
/// Period 0 is the literal summed May payment. Periods 1 to 3 use the
/// June/July/August retention flags as a proxy: a row contributes its
/// May payment when the period flag is set, nothing otherwise. Only May
/// payment is collected, so the later periods are estimates by
/// construction.
#[must_use]
pub fn monthly_trend(rows: &[NormalizedRow]) -> Vec<MonthlyTrendPoint> {
    let total = rows.len();

    MONTH_LABELS
        .iter()
        .enumerate()
        .map(|(period, label)| {
            if period == 0 {
                let revenue: f64 = rows.iter().map(|row| row.total_payment_may).sum();
                return MonthlyTrendPoint {
                    month: (*label).to_string(),
                    revenue,
                    revisit_rate: 0,
                    customers: i64::try_from(total).unwrap_or(i64::MAX),
                };
            }

            let mut revenue = 0.0;
            let mut retained: i64 = 0;
            for row in rows {
                let flag = match period {
                    1 => row.retained_june,
                    2 => row.retained_july,
                    _ => row.retained_august,
                };
                retained += i64::from(flag);
                if flag > 0 {
                    revenue += row.total_payment_may;
                }
            }

            let revisit_rate = if total == 0 {
                0
            } else {
                // Flag sums are bounded by the row count and fit well
                // within f64's 52-bit mantissa.
                #[allow(clippy::cast_precision_loss)]
                let retained_f = retained as f64;
                round_i64(retained_f / count_f64(total) * 100.0)
            };

            MonthlyTrendPoint {
                month: (*label).to_string(),
                revenue,
                revisit_rate,
                customers: retained,
            }
        })
        .collect()
}

/// Retention rate and retained count for the four fixed periods.
///
/// Empty input yields zero rates and counts.
#[must_use]
pub fn cohort_retention(rows: &[NormalizedRow]) -> Vec<CohortEntry> {
    let total = rows.len();
    let periods: [(&str, fn(&NormalizedRow) -> i32); 4] = [
        ("6월", |row| row.retained_june),
        ("7월", |row| row.retained_july),
        ("8월", |row| row.retained_august),
        ("90일", |row| row.retained_90),
    ];

    periods
        .iter()
        .map(|(label, flag)| {
            let mut retained: i64 = 0;
            for row in rows {
                retained += i64::from(flag(row));
            }

            let rate = if total == 0 {
                0
            } else {
                // Bounded by the row count, exact in f64.
                #[allow(clippy::cast_precision_loss)]
                let retained_f = retained as f64;
                round_i64(retained_f / count_f64(total) * 100.0)
            };

            CohortEntry {
                period: (*label).to_string(),
                rate,
                count: retained,
            }
        })
        .collect()
}

/// Region-level rollup ignoring age groups, full precision.
///
/// Emitted in first-seen order; consumers sort and slice.
#[must_use]
pub fn region_rollup(rows: &[NormalizedRow]) -> Vec<RegionStat> {
    let mut folds: Vec<GroupFold> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let slot = *index.entry(row.region_city.clone()).or_insert_with(|| {
            folds.push(GroupFold::new(&row.region_city));
            folds.len() - 1
        });
        let fold = &mut folds[slot];
        fold.revenue += row.total_payment_may;
        fold.usage += row.total_duration_min;
        fold.revisit_rate_sum += f64::from(row.retained_90) * 100.0;
        fold.samples += 1;
    }

    folds
        .into_iter()
        .map(|fold| {
            let n = count_f64(fold.samples.max(1));
            RegionStat {
                region: fold.label,
                revenue: fold.revenue,
                avg_usage: fold.usage / n,
                revisit_rate: fold.revisit_rate_sum / n,
                sample_count: fold.samples,
            }
        })
        .collect()
}

/// Fold an age-group label into the canonical display buckets.
///
/// English cohort names and the finer-grained Korean labels collapse
/// into `{10대, 20대, 30대, 40대+}`; anything else passes through
/// untouched and sorts after the canonical buckets.
#[must_use]
pub fn canonical_age_bucket(label: &str) -> &str {
    match label {
        "Teens" => "10대",
        "Twenties" => "20대",
        "Thirties" => "30대",
        "Forties" | "Forties+" | "Fifties" | "Sixties" | "Seventies" | "40대" | "50대" | "60대"
        | "70대" => "40대+",
        other => other,
    }
}

fn bucket_rank(bucket: &str) -> u8 {
    match bucket {
        "10대" => 1,
        "20대" => 2,
        "30대" => 3,
        "40대+" => 4,
        _ => u8::MAX,
    }
}

/// Canonical age-bucket rollup in fixed display order.
#[must_use]
pub fn age_rollup(rows: &[NormalizedRow]) -> Vec<AgeStat> {
    let mut folds: Vec<GroupFold> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let bucket = canonical_age_bucket(&row.age_group);
        let slot = *index.entry(bucket.to_string()).or_insert_with(|| {
            folds.push(GroupFold::new(bucket));
            folds.len() - 1
        });
        let fold = &mut folds[slot];
        fold.revenue += row.total_payment_may;
        fold.usage += row.total_duration_min;
        fold.revisit_rate_sum += f64::from(row.retained_90) * 100.0;
        fold.samples += 1;
    }

    // Stable sort: unknown labels all rank last and keep first-seen order.
    folds.sort_by_key(|fold| bucket_rank(&fold.label));

    folds
        .into_iter()
        .map(|fold| {
            let n = count_f64(fold.samples.max(1));
            AgeStat {
                bucket: fold.label,
                revenue: fold.revenue,
                avg_usage: fold.usage / n,
                revisit_rate: fold.revisit_rate_sum / n,
                customers: fold.samples,
            }
        })
        .collect()
}

/// First `SCATTER_SAMPLE_MAX` rows in stored order.
///
/// Deterministic for a fixed stored order. Visit days of zero become 1
/// so bubble sizing never vanishes.
#[must_use]
pub fn scatter_sample(rows: &[NormalizedRow]) -> Vec<ScatterPoint> {
    rows.iter()
        .take(SCATTER_SAMPLE_MAX)
        .map(|row| ScatterPoint {
            x: row.total_duration_min,
            y: row.total_payment_may,
            z: row.visit_days.max(1),
            region: row.region_city.clone(),
            age_group: row.age_group.clone(),
        })
        .collect()
}

/// Ordinary least-squares fit of payment (`y`) against duration (`x`).
///
/// Needs at least two points and non-zero x variance; degenerate input
/// yields `None`, never a division error.
#[must_use]
pub fn fit_trend_line(points: &[ScatterPoint]) -> Option<TrendLine> {
    if points.len() < 2 {
        return None;
    }

    let n = count_f64(points.len());
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    for point in points {
        sum_x += point.x;
        sum_y += point.y;
        sum_xy += point.x * point.y;
        sum_xx += point.x * point.x;
        min_x = min_x.min(point.x);
        max_x = max_x.max(point.x);
    }

    let denom = n * sum_xx - sum_x * sum_x;
    if denom.abs() < f64::EPSILON {
        return None;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n;

    Some(TrendLine {
        start: TrendPoint {
            x: min_x,
            y: slope * min_x + intercept,
        },
        end: TrendPoint {
            x: max_x,
            y: slope * max_x + intercept,
        },
    })
}

/// Run the full aggregation pass over stored rows.
#[must_use]
pub fn analyze(rows: &[NormalizedRow], options: &AnalyzeOptions) -> AnalysisResult {
    let region_age = region_age_rollup(rows);
    let best_performers = rank_best_performers(
        &region_age,
        options.min_group_samples,
        options.best_performer_cap,
    );
    let global_avg_usage = round_i64(global_averages(rows).avg_usage_min);

    AnalysisResult {
        global_avg_usage,
        best_performers,
        region_age,
    }
}
