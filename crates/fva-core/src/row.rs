//! The normalized customer-visit record shared by every stage of the pipeline.

use serde::{Deserialize, Serialize};

/// One customer-visit record after header/alias resolution and coercion.
///
/// Serialized field names follow the published wire contract (`userId`,
/// `regionCity`, …), which dashboard clients consume directly. Rows are
/// immutable once built: they are persisted at most once, never updated,
/// and deleted only by a bulk reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRow {
    /// Positive identity key. Rows without one never reach storage.
    pub user_id: i64,
    pub region_city: String,
    pub age_group: String,
    pub age: i32,
    pub visit_days: i32,
    pub total_duration_min: f64,
    pub avg_duration_min: f64,
    pub total_payment_may: f64,
    pub retained_june: i32,
    pub retained_july: i32,
    pub retained_august: i32,
    pub retained_90: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> NormalizedRow {
        NormalizedRow {
            user_id: 101,
            region_city: "서울".to_string(),
            age_group: "20대".to_string(),
            age: 27,
            visit_days: 12,
            total_duration_min: 340.0,
            avg_duration_min: 28.3,
            total_payment_may: 58000.0,
            retained_june: 1,
            retained_july: 0,
            retained_august: 1,
            retained_90: 1,
        }
    }

    #[test]
    fn serializes_with_camel_case_wire_names() {
        let json = serde_json::to_value(sample_row()).expect("serialize");
        assert_eq!(json["userId"].as_i64(), Some(101));
        assert_eq!(json["regionCity"].as_str(), Some("서울"));
        assert_eq!(json["ageGroup"].as_str(), Some("20대"));
        assert_eq!(json["totalPaymentMay"].as_f64(), Some(58000.0));
        assert_eq!(json["retained90"].as_i64(), Some(1));
        assert!(
            json.get("user_id").is_none(),
            "snake_case names must not appear on the wire"
        );
    }

    #[test]
    fn deserializes_from_wire_names() {
        let json = r#"{
            "userId": 7,
            "regionCity": "부산",
            "ageGroup": "30대",
            "age": 33,
            "visitDays": 4,
            "totalDurationMin": 90.0,
            "avgDurationMin": 22.5,
            "totalPaymentMay": 15000.0,
            "retainedJune": 0,
            "retainedJuly": 1,
            "retainedAugust": 0,
            "retained90": 0
        }"#;
        let row: NormalizedRow = serde_json::from_str(json).expect("deserialize");
        assert_eq!(row.user_id, 7);
        assert_eq!(row.region_city, "부산");
        assert_eq!(row.retained_july, 1);
    }
}
