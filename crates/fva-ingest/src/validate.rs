//! Whole-file gates applied before any row is processed.

use crate::error::IngestError;

/// Upload size cap: 10 MiB.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Media types accepted for CSV uploads. Spreadsheet tooling declares CSVs
/// under several labels; anything else is rejected up front.
pub const ACCEPTED_MEDIA_TYPES: [&str; 4] = [
    "text/csv",
    "application/csv",
    "application/vnd.ms-excel",
    "text/plain",
];

/// Reject an explicitly-declared media type outside the accepted set.
///
/// `None` passes: clients that omit the declaration (CLI reads from disk,
/// bare multipart parts) are judged by content alone. Parameters such as
/// `; charset=utf-8` are ignored.
///
/// # Errors
///
/// Returns [`IngestError::UnsupportedMediaType`] naming the declared type.
pub fn validate_media_type(declared: Option<&str>) -> Result<(), IngestError> {
    let Some(declared) = declared else {
        return Ok(());
    };
    let essence = declared
        .split(';')
        .next()
        .unwrap_or(declared)
        .trim()
        .to_ascii_lowercase();
    if ACCEPTED_MEDIA_TYPES.contains(&essence.as_str()) {
        Ok(())
    } else {
        Err(IngestError::UnsupportedMediaType(declared.to_string()))
    }
}

/// Reject empty and oversized uploads.
///
/// # Errors
///
/// Returns [`IngestError::EmptyFile`] for zero bytes and
/// [`IngestError::TooLarge`] above [`MAX_UPLOAD_BYTES`].
pub fn validate_size(size: usize) -> Result<(), IngestError> {
    if size == 0 {
        return Err(IngestError::EmptyFile);
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(IngestError::TooLarge {
            size,
            max: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_each_declared_csv_type() {
        for media_type in ACCEPTED_MEDIA_TYPES {
            assert!(
                validate_media_type(Some(media_type)).is_ok(),
                "{media_type} should be accepted"
            );
        }
    }

    #[test]
    fn accepts_media_type_with_parameters_and_mixed_case() {
        assert!(validate_media_type(Some("text/csv; charset=utf-8")).is_ok());
        assert!(validate_media_type(Some("Text/CSV")).is_ok());
    }

    #[test]
    fn accepts_undeclared_media_type() {
        assert!(validate_media_type(None).is_ok());
    }

    #[test]
    fn rejects_non_csv_media_type() {
        let err = validate_media_type(Some("application/pdf")).expect_err("should reject");
        assert!(matches!(err, IngestError::UnsupportedMediaType(ref t) if t == "application/pdf"));
    }

    #[test]
    fn rejects_empty_file() {
        assert!(matches!(validate_size(0), Err(IngestError::EmptyFile)));
    }

    #[test]
    fn accepts_file_at_exact_cap() {
        assert!(validate_size(MAX_UPLOAD_BYTES).is_ok());
    }

    #[test]
    fn rejects_file_one_byte_over_cap() {
        let err = validate_size(MAX_UPLOAD_BYTES + 1).expect_err("should reject");
        assert!(matches!(
            err,
            IngestError::TooLarge { size, max }
                if size == MAX_UPLOAD_BYTES + 1 && max == MAX_UPLOAD_BYTES
        ));
    }
}
