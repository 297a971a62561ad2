//! Ordered alias resolution for the twelve canonical visit-record fields.

use std::collections::HashMap;

use crate::header::normalize_header;

/// The canonical fields a visit record can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Uid,
    RegionCity,
    AgeGroup,
    Age,
    VisitDays,
    TotalDurationMin,
    AvgDurationMin,
    TotalPaymentMay,
    RetainedJune,
    RetainedJuly,
    RetainedAugust,
    Retained90,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::Uid,
        Field::RegionCity,
        Field::AgeGroup,
        Field::Age,
        Field::VisitDays,
        Field::TotalDurationMin,
        Field::AvgDurationMin,
        Field::TotalPaymentMay,
        Field::RetainedJune,
        Field::RetainedJuly,
        Field::RetainedAugust,
        Field::Retained90,
    ];

    /// Accepted normalized header spellings, in precedence order.
    ///
    /// Analyst exports have shipped English snake_case, lowered camelCase,
    /// and Korean headers for the same field; the first spelling present in
    /// a file wins. Adding a spelling here is backward compatible.
    #[must_use]
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::Uid => &["uid", "user_id", "id", "사용자_id"],
            Field::RegionCity => &[
                "region_city",
                "regioncity",
                "region_city_group",
                "region_city_group_no",
                "region",
                "지역_도시",
            ],
            Field::AgeGroup => &["age_group", "agegroup", "연령대"],
            Field::Age => &["age", "나이"],
            Field::VisitDays => &["visit_days", "visitdays", "방문일수"],
            Field::TotalDurationMin => {
                &["total_duration_min", "totaldurationmin", "총_이용시간(분)"]
            }
            Field::AvgDurationMin => &["avg_duration_min", "avgdurationmin", "평균_이용시간(분)"],
            Field::TotalPaymentMay => {
                &["total_payment_may", "totalpaymentmay", "5월_총결제금액"]
            }
            Field::RetainedJune => &["retained_june", "retainedjune", "6월_재방문여부"],
            Field::RetainedJuly => &["retained_july", "retainedjuly", "7월_재방문여부"],
            Field::RetainedAugust => &["retained_august", "retainedaugust", "8월_재방문여부"],
            Field::Retained90 => &[
                "retained_90",
                "retained90",
                "retained_90d",
                "retained90d",
                "90일_재방문여부",
            ],
        }
    }

    /// The canonical spelling used in error messages and reports.
    #[must_use]
    pub fn canonical_name(self) -> &'static str {
        self.aliases()[0]
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Fields a file must carry (under any accepted alias) to be ingested at all.
/// Everything else defaults per row.
pub const REQUIRED_FIELDS: [Field; 5] = [
    Field::Uid,
    Field::RegionCity,
    Field::AgeGroup,
    Field::TotalPaymentMay,
    Field::Retained90,
];

/// Header-position lookup built once per file from the normalized header row.
#[derive(Debug)]
pub struct ColumnIndex {
    by_name: HashMap<String, usize>,
}

impl ColumnIndex {
    /// Build the index from a raw header record. Each header is normalized;
    /// when a normalized spelling appears twice, the first column wins.
    #[must_use]
    pub fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut by_name = HashMap::with_capacity(headers.len());
        for (position, raw) in headers.iter().enumerate() {
            let name = normalize_header(raw);
            if name.is_empty() {
                continue;
            }
            by_name.entry(name).or_insert(position);
        }
        Self { by_name }
    }

    /// Whether any accepted alias of `field` exists as a column.
    #[must_use]
    pub fn has_column(&self, field: Field) -> bool {
        field
            .aliases()
            .iter()
            .any(|alias| self.by_name.contains_key(*alias))
    }

    /// Required fields with no accepted alias anywhere in the header set,
    /// in declaration order.
    #[must_use]
    pub fn missing_required(&self) -> Vec<Field> {
        REQUIRED_FIELDS
            .into_iter()
            .filter(|field| !self.has_column(*field))
            .collect()
    }

    /// Resolve `field` for one record: the first alias (in precedence order)
    /// whose column exists and whose cell is non-empty wins. An empty cell is
    /// treated the same as an absent column, so resolution falls through to
    /// the next alias.
    #[must_use]
    pub fn resolve<'r>(&self, field: Field, record: &'r csv::StringRecord) -> Option<&'r str> {
        for alias in field.aliases() {
            let Some(&position) = self.by_name.get(*alias) else {
                continue;
            };
            match record.get(position) {
                Some(value) if !value.is_empty() => return Some(value),
                _ => {}
            }
        }
        None
    }
}
