//! Error types for the ticket dashboard.

use thiserror::Error;

/// Result type alias for dashboard operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the ticket dashboard.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid settings file {path}: {message}")]
    InvalidSettings { path: String, message: String },

    // Load errors (20-29)
    #[error("no columns to parse from file")]
    NoColumns,

    #[error("could not detect CSV format after {attempts} delimiter/encoding attempts")]
    FormatUndetected { attempts: usize },

    #[error("data file not found: {path}")]
    DataFileMissing { path: String },

    // Serve errors (40-49)
    #[error("failed to bind {addr}: {message}")]
    Bind { addr: String, message: String },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    /// Used for detailed error reporting in JSON output.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidSettings { .. } => 11,
            Error::NoColumns => 20,
            Error::FormatUndetected { .. } => 21,
            Error::DataFileMissing { .. } => 22,
            Error::Bind { .. } => 40,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Whether this error came from reading or parsing the ticket export.
    pub fn is_load_failure(&self) -> bool {
        (20..30).contains(&self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_grouped() {
        assert_eq!(Error::Config("x".into()).code(), 10);
        assert_eq!(Error::NoColumns.code(), 20);
        assert_eq!(Error::FormatUndetected { attempts: 12 }.code(), 21);
        assert!(Error::NoColumns.is_load_failure());
        assert!(!Error::Config("x".into()).is_load_failure());
    }

    #[test]
    fn test_no_columns_message() {
        assert_eq!(
            Error::NoColumns.to_string(),
            "no columns to parse from file"
        );
    }
}
