//! CSV ingestion for customer-visit uploads.
//!
//! Turns heterogeneous tabular exports (inconsistent English/Korean headers,
//! missing fields, mixed types) into [`fva_core::NormalizedRow`]s: headers are
//! normalized, canonical fields resolved through an ordered alias table, values
//! coerced with safe defaults, and the whole file gated by size/media-type/
//! required-column validation before any row is processed.

pub mod alias;
pub mod error;
pub mod header;
pub mod pipeline;
pub mod row;
pub mod validate;

pub use alias::{ColumnIndex, Field, REQUIRED_FIELDS};
pub use error::IngestError;
pub use header::normalize_header;
pub use pipeline::{parse_upload, ParsedUpload};
pub use row::normalize_row;
pub use validate::{
    validate_media_type, validate_size, ACCEPTED_MEDIA_TYPES, MAX_UPLOAD_BYTES,
};
