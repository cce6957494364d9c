//! Error types for the Coast or Coast engine.
//!
//! The round engine itself never fails: ignored guesses and empty sequences
//! are ordinary states. The errors below cover the collaborators around it,
//! namely configuration loading and manifest I/O.

use std::path::PathBuf;

/// A specialized `Result` type for engine operations.
pub type Result<T> = std::result::Result<T, CoastError>;

/// Errors that can occur while preparing or serving a game.
///
/// Variants carry an actionable suggestion where one exists.
#[derive(Debug, thiserror::Error)]
pub enum CoastError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your coast.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Manifest Errors
    // ========================================================================
    /// The image manifest was not found.
    #[error("Image manifest not found: '{path}'\n\nSuggestion: Run 'coast seed' or create the manifest by hand")]
    ManifestNotFound {
        /// Path where the manifest was expected.
        path: PathBuf,
    },

    /// The image manifest could not be parsed.
    #[error("Invalid image manifest '{path}': {message}\n\nSuggestion: The manifest must be a JSON object with an \"images\" array")]
    ManifestParseError {
        /// Path to the manifest file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// A manifest record is missing a required value.
    #[error("Invalid image record '{id}': {message}\n\nSuggestion: Every image needs a non-empty 'file' and 'city'")]
    InvalidImageRecord {
        /// Identifier of the offending record.
        id: String,
        /// What is wrong with it.
        message: String,
    },

    /// Failed to write the manifest to disk.
    #[error("Failed to write manifest to '{path}': {message}\n\nSuggestion: Check write permissions and available disk space")]
    ManifestWriteError {
        /// Path where the manifest was to be written.
        path: PathBuf,
        /// Description of the write failure.
        message: String,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoastError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `ManifestNotFound` error.
    #[must_use]
    pub fn manifest_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ManifestNotFound { path: path.into() }
    }

    /// Creates a new `ManifestParseError`.
    #[must_use]
    pub fn manifest_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ManifestParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `InvalidImageRecord` error.
    #[must_use]
    pub fn invalid_record(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidImageRecord {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ManifestWriteError`.
    #[must_use]
    pub fn manifest_write(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ManifestWriteError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if the error means there is nothing to play yet.
    ///
    /// [`Manifest::load_or_empty`](crate::Manifest::load_or_empty) turns these
    /// into an empty image set.
    #[must_use]
    pub const fn is_missing_data(&self) -> bool {
        matches!(self, Self::ManifestNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = CoastError::manifest_not_found("/srv/public/images.json");
        let msg = err.to_string();
        assert!(msg.contains("Image manifest not found"));
        assert!(msg.contains("/srv/public/images.json"));
        assert!(msg.contains("Suggestion"));
    }

    #[test]
    fn test_config_validation_display() {
        let err = CoastError::config_validation("port must not be 0", "Pick a port");
        let msg = err.to_string();
        assert!(msg.contains("port must not be 0"));
        assert!(msg.contains("Suggestion: Pick a port"));
    }

    #[test]
    fn test_invalid_record_display() {
        let err = CoastError::invalid_record("west-seattle-01", "city is empty");
        let msg = err.to_string();
        assert!(msg.contains("west-seattle-01"));
        assert!(msg.contains("city is empty"));
    }

    #[test]
    fn test_is_missing_data() {
        assert!(CoastError::manifest_not_found("images.json").is_missing_data());
        assert!(!CoastError::manifest_parse("images.json", "bad").is_missing_data());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CoastError = io_err.into();
        assert!(matches!(err, CoastError::Io(_)));
    }
}
