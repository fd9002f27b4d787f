use crate::review::AnnotationStatus;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for hazardwatch
#[derive(Error, Debug)]
pub enum HazardError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// Two reports in one dataset share an identifier
    #[error("Duplicate report id in dataset: {id}")]
    DuplicateReportId { id: String },

    /// No annotation exists for the given report
    #[error("No annotation for report: {id}")]
    AnnotationNotFound { id: String },

    /// "Not duplicate" verdicts must carry a note
    #[error("Report {id} cannot be marked not-duplicate without a justification note")]
    MissingJustification { id: String },

    /// Annotation was already resolved
    #[error("Annotation for report {id} is already resolved as {status}")]
    AlreadyResolved { id: String, status: AnnotationStatus },

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for hazardwatch operations
pub type Result<T> = std::result::Result<T, HazardError>;
