use thiserror::Error;

use crate::alias::Field;

/// Errors that reject an entire upload before or during parsing.
///
/// Row-level defects never surface here; they are absorbed by the
/// coercion defaults in [`crate::row::normalize_row`] and observable only
/// through the parsed-vs-saved counts.
#[derive(Debug, Error)]
pub enum IngestError {
    /// No file was provided, or the provided file has zero bytes.
    #[error("uploaded file is empty")]
    EmptyFile,

    /// The declared media type is not an accepted CSV type.
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// The file exceeds the upload size cap.
    #[error("file is too large: {size} bytes (limit {max} bytes)")]
    TooLarge { size: usize, max: usize },

    /// The content could not be parsed as UTF-8 comma-separated text.
    #[error("failed to parse CSV: {0}")]
    Parse(#[from] csv::Error),

    /// The file parsed but contains no data rows.
    #[error("no data rows found in file")]
    NoDataRows,

    /// One or more required columns are absent under every accepted alias.
    #[error("missing required columns: {}", join_fields(.0))]
    MissingColumns(Vec<Field>),
}

impl IngestError {
    /// Stable machine-readable code for API error bodies.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            IngestError::EmptyFile => "empty_file",
            IngestError::UnsupportedMediaType(_) => "unsupported_media_type",
            IngestError::TooLarge { .. } => "file_too_large",
            IngestError::Parse(_) => "csv_parse_error",
            IngestError::NoDataRows => "no_data_rows",
            IngestError::MissingColumns(_) => "missing_columns",
        }
    }
}

fn join_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| f.canonical_name().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
