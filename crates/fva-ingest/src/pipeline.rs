//! End-to-end parse of an uploaded CSV into normalized rows.

use fva_core::NormalizedRow;

use crate::alias::ColumnIndex;
use crate::error::IngestError;
use crate::row::normalize_row;
use crate::validate::validate_size;

/// Result of parsing one upload.
#[derive(Debug)]
pub struct ParsedUpload {
    /// Rows that carry a positive identity, in file order.
    pub rows: Vec<NormalizedRow>,
    /// Every data record seen, including ones dropped for lacking an
    /// identity. Published as `totalCount`; the gap between this and the
    /// persisted count is how absorbed row defects stay observable.
    pub total_records: usize,
}

/// Parse a complete upload held in memory.
///
/// The whole-file gates run first (size cap, then the required-column check
/// against the normalized header row) so a defective file is rejected before
/// any row work. Records are then decoded one at a time; rows without a
/// usable identity are dropped and counted, never fatal. Media-type
/// validation is the transport layer's concern and happens before this call.
///
/// # Errors
///
/// Returns [`IngestError`] when the file is empty, oversized, unparseable,
/// lacks a required column under every accepted alias, or contains no data
/// rows at all.
pub fn parse_upload(bytes: &[u8]) -> Result<ParsedUpload, IngestError> {
    validate_size(bytes.len())?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let columns = ColumnIndex::from_headers(reader.headers()?);
    let missing = columns.missing_required();
    if !missing.is_empty() {
        return Err(IngestError::MissingColumns(missing));
    }

    let mut rows = Vec::new();
    let mut total_records = 0usize;
    let mut dropped = 0usize;

    for record in reader.records() {
        let record = record?;
        total_records += 1;

        match normalize_row(&columns, &record) {
            Some(row) if row.user_id > 0 => rows.push(row),
            _ => dropped += 1,
        }
    }

    if total_records == 0 {
        return Err(IngestError::NoDataRows);
    }

    if dropped > 0 {
        tracing::warn!(
            dropped,
            total = total_records,
            "dropped records without a positive identity"
        );
    }

    Ok(ParsedUpload {
        rows,
        total_records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::Field;
    use crate::validate::MAX_UPLOAD_BYTES;

    const MINIMAL_HEADER: &str = "uid,region_city,age_group,total_payment_may,retained_90";

    #[test]
    fn parses_minimal_three_row_file() {
        let csv = format!(
            "{MINIMAL_HEADER}\n1,서울,20대,10000,1\n2,서울,20대,20000,0\n3,부산,30대,5000,1\n"
        );
        let parsed = parse_upload(csv.as_bytes()).expect("parse");
        assert_eq!(parsed.total_records, 3);
        assert_eq!(parsed.rows.len(), 3);
        assert_eq!(parsed.rows[0].user_id, 1);
        assert_eq!(parsed.rows[2].region_city, "부산");
        assert!((parsed.rows[1].total_payment_may - 20000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn korean_headers_resolve_through_aliases() {
        let csv = "\u{feff}사용자 ID,지역 도시,연령대,5월 총결제금액,90일 재방문여부\n\
                   7,대구,30대,12000,1\n";
        let parsed = parse_upload(csv.as_bytes()).expect("parse");
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].user_id, 7);
        assert_eq!(parsed.rows[0].region_city, "대구");
        assert_eq!(parsed.rows[0].retained_90, 1);
    }

    #[test]
    fn records_without_identity_count_but_do_not_survive() {
        let csv = format!(
            "{MINIMAL_HEADER}\n1,서울,20대,10000,1\n,서울,20대,999,1\nabc,부산,30대,5000,0\n"
        );
        let parsed = parse_upload(csv.as_bytes()).expect("parse");
        assert_eq!(parsed.total_records, 3, "dropped records still count");
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].user_id, 1);
    }

    #[test]
    fn preserves_file_order() {
        let csv = format!(
            "{MINIMAL_HEADER}\n30,서울,20대,1,0\n10,서울,20대,2,0\n20,부산,30대,3,0\n"
        );
        let parsed = parse_upload(csv.as_bytes()).expect("parse");
        let ids: Vec<i64> = parsed.rows.iter().map(|r| r.user_id).collect();
        assert_eq!(ids, vec![30, 10, 20]);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(parse_upload(b""), Err(IngestError::EmptyFile)));
    }

    #[test]
    fn header_only_file_has_no_data_rows() {
        let csv = format!("{MINIMAL_HEADER}\n");
        assert!(matches!(
            parse_upload(csv.as_bytes()),
            Err(IngestError::NoDataRows)
        ));
    }

    #[test]
    fn missing_required_columns_fail_before_row_processing() {
        let csv = "uid,age_group\n1,20대\n2,30대\n";
        let err = parse_upload(csv.as_bytes()).expect_err("should reject");
        match err {
            IngestError::MissingColumns(missing) => {
                assert_eq!(
                    missing,
                    vec![Field::RegionCity, Field::TotalPaymentMay, Field::Retained90]
                );
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn oversized_input_is_rejected_without_parsing() {
        let bytes = vec![b'a'; MAX_UPLOAD_BYTES + 1];
        assert!(matches!(
            parse_upload(&bytes),
            Err(IngestError::TooLarge { .. })
        ));
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let mut bytes = format!("{MINIMAL_HEADER}\n").into_bytes();
        bytes.extend_from_slice(&[0xff, 0xfe, b',', b'x', b'\n']);
        assert!(matches!(
            parse_upload(&bytes),
            Err(IngestError::Parse(_))
        ));
    }

    #[test]
    fn short_records_default_missing_trailing_fields() {
        let csv = format!("{MINIMAL_HEADER}\n5,서울\n");
        let parsed = parse_upload(csv.as_bytes()).expect("parse");
        assert_eq!(parsed.rows.len(), 1);
        let row = &parsed.rows[0];
        assert_eq!(row.age_group, "Unknown");
        assert!((row.total_payment_may - 0.0).abs() < f64::EPSILON);
        assert_eq!(row.retained_90, 0);
    }

    #[test]
    fn extra_unknown_columns_are_ignored() {
        let csv = format!(
            "{MINIMAL_HEADER},채널,memo\n1,서울,20대,10000,1,organic,첫 방문\n"
        );
        let parsed = parse_upload(csv.as_bytes()).expect("parse");
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].region_city, "서울");
    }
}
