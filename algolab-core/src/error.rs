//! Error types for the platform core.
//!
//! Uses `thiserror` for public API error types covering content lookup,
//! persistence, and configuration.

use thiserror::Error;

/// Top-level error type for content and persistence operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Algorithm not found: {0}")]
    NotFound(String),

    #[error("Section '{section}' not found in algorithm '{algorithm}'")]
    SectionNotFound { algorithm: String, section: String },

    #[error("Invalid persistence key: {0}")]
    InvalidKey(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A type alias for results using the top-level `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = CoreError::NotFound("linear_regression".into());
        assert_eq!(err.to_string(), "Algorithm not found: linear_regression");
    }

    #[test]
    fn test_section_not_found_display() {
        let err = CoreError::SectionNotFound {
            algorithm: "kmeans".into(),
            section: "proof".into(),
        };
        assert_eq!(
            err.to_string(),
            "Section 'proof' not found in algorithm 'kmeans'"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CoreError = io_err.into();
        assert!(matches!(err, CoreError::Io(_)));
    }

    #[test]
    fn test_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
        let err: CoreError = serde_err.into();
        assert!(matches!(err, CoreError::Serialization(_)));
    }
}
