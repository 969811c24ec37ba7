use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

use crate::field::BoxError;

/// Error type for multipart form decoding.
#[derive(Error, Debug)]
pub enum FormDataError {
    #[error("field {field}: too many tags")]
    TooManyTags { field: &'static str },
    #[error("field {field} ({wire_name}): {source}")]
    Coercion {
        field: &'static str,
        wire_name: &'static str,
        #[source]
        source: CoercionError,
    },
    #[error("Error while reading multipart body: {0}")]
    Multipart(actix_multipart::MultipartError),
    #[error("Text for field ({field}) is not valid UTF-8")]
    InvalidText { field: String },
    #[error("File for field ({field}) was too large (max size: {limit} bytes)")]
    FileSizeError { field: String, limit: usize },
    #[error("Form body exceeded the memory limit of {limit} bytes")]
    MemoryLimit { limit: usize },
}

/// Why a single wire value could not be converted into its field type.
#[derive(Error, Debug)]
pub enum CoercionError {
    #[error("invalid integer: {0}")]
    Int(#[from] ParseIntError),
    #[error("invalid float: {0}")]
    Float(#[from] ParseFloatError),
    #[error("invalid boolean: {0:?}")]
    Bool(String),
    #[error("invalid RFC 3339 timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),
    #[error("custom decoding failed: {0}")]
    Custom(#[source] BoxError),
}
