//! Custom error types for the cleaning and EDA workflow.
//!
//! This module provides the error hierarchy using `thiserror` so every
//! failure carries enough context to be shown to the user as-is.
//!
//! Errors are serializable (`{code, message}`) so the CLI can emit them
//! as JSON next to a report.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for dataset loading, cleaning and reporting.
#[derive(Error, Debug)]
pub enum CleaningError {
    /// File extension is not one of the accepted tabular formats.
    #[error("Unsupported file type: '{0}' (expected .csv, .xlsx or .xls)")]
    UnsupportedFileType(String),

    /// File content could not be parsed into a dataset.
    #[error("Failed to parse '{path}': {reason}")]
    ParseFailed { path: String, reason: String },

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Mode imputation on a column without any non-missing value.
    #[error("Cannot impute column '{0}' with its mode: every value is missing")]
    NoModalValue(String),

    /// Imputation failed.
    #[error("Failed to impute missing values in column '{column}': {reason}")]
    ImputationFailed { column: String, reason: String },

    /// A transformation changed the column set of a dataset.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Report generation failed.
    #[error("Failed to generate report: {0}")]
    ReportGenerationFailed(String),

    /// No data loaded in the session.
    #[error("No data loaded")]
    NoDataLoaded,

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Spreadsheet reader error (only with "excel" feature).
    #[cfg(feature = "excel")]
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<CleaningError>,
    },
}

impl CleaningError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        CleaningError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code, independent of the message wording.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedFileType(_) => "UNSUPPORTED_FILE_TYPE",
            Self::ParseFailed { .. } => "PARSE_FAILED",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::NoModalValue(_) => "NO_MODAL_VALUE",
            Self::ImputationFailed { .. } => "IMPUTATION_FAILED",
            Self::SchemaMismatch(_) => "SCHEMA_MISMATCH",
            Self::ReportGenerationFailed(_) => "REPORT_GENERATION_FAILED",
            Self::NoDataLoaded => "NO_DATA_LOADED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            #[cfg(feature = "excel")]
            Self::Spreadsheet(_) => "SPREADSHEET_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if the user can fix this by picking another file or option
    /// (the session state is untouched in all of these cases).
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::UnsupportedFileType(_)
            | Self::ParseFailed { .. }
            | Self::NoDataLoaded
            | Self::InvalidConfig(_)
            | Self::NoModalValue(_) => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for CleaningError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("CleaningError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for cleaning operations.
pub type Result<T> = std::result::Result<T, CleaningError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| CleaningError::Polars(e).with_context(context))
    }
}
