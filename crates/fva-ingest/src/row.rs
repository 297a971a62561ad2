//! Per-record coercion into [`NormalizedRow`].

use fva_core::NormalizedRow;

use crate::alias::{ColumnIndex, Field};

/// Build a [`NormalizedRow`] from one CSV record.
///
/// Returns `None` when no identity column resolves at all; such records are
/// dropped, not treated as errors. Every other field coerces with a safe
/// default: strings fall back to `"Unknown"`, numbers to 0. An identity that
/// resolves but cannot be parsed coerces to 0; callers exclude those rows
/// with a `user_id > 0` filter.
#[must_use]
pub fn normalize_row(columns: &ColumnIndex, record: &csv::StringRecord) -> Option<NormalizedRow> {
    let raw_uid = columns.resolve(Field::Uid, record)?;

    let string_field = |field: Field| -> String {
        columns
            .resolve(field, record)
            .map_or_else(|| "Unknown".to_string(), ToString::to_string)
    };
    let float_field = |field: Field| -> f64 {
        columns.resolve(field, record).map_or(0.0, parse_number)
    };
    let int_field = |field: Field| -> i32 {
        columns.resolve(field, record).map_or(0, parse_count)
    };

    Some(NormalizedRow {
        user_id: parse_identity(raw_uid),
        region_city: string_field(Field::RegionCity),
        age_group: string_field(Field::AgeGroup),
        age: int_field(Field::Age),
        visit_days: int_field(Field::VisitDays),
        total_duration_min: float_field(Field::TotalDurationMin),
        avg_duration_min: float_field(Field::AvgDurationMin),
        total_payment_may: float_field(Field::TotalPaymentMay),
        retained_june: int_field(Field::RetainedJune),
        retained_july: int_field(Field::RetainedJuly),
        retained_august: int_field(Field::RetainedAugust),
        retained_90: int_field(Field::Retained90),
    })
}

/// Parse an identity cell into an integer key, falling back to 0.
///
/// Accepts plain integers and float-formatted exports ("101.0"), which are
/// truncated toward zero.
// Out-of-range floats saturate at the i64 bounds.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_identity(raw: &str) -> i64 {
    let trimmed = raw.trim();
    if let Ok(id) = trimmed.parse::<i64>() {
        return id;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => value.trunc() as i64,
        _ => 0,
    }
}

/// Parse a numeric cell, falling back to 0.0 on anything unparseable.
#[must_use]
pub fn parse_number(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(0.0)
}

/// Parse an integer count/flag cell, clamped non-negative, falling back to 0.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_count(raw: &str) -> i32 {
    let trimmed = raw.trim();
    let value = if let Ok(count) = trimmed.parse::<i64>() {
        count
    } else {
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => value.trunc() as i64,
            _ => 0,
        }
    };
    i32::try_from(value.max(0)).unwrap_or(i32::MAX)
}
