//! Error types for flashdeck.
//!
//! Two families live here. [`Error`] covers storage, configuration and input
//! failures that may stop a request. [`GenerationError`] covers everything
//! that can go wrong while asking the provider for cards; those are always
//! folded into an error flashcard and never reach the presentation layer.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for flashdeck operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// The flashcard document exists but does not hold a valid collection.
    #[error("flashcard data at {path} is corrupt: {source}")]
    PersistedDataCorrupt {
        /// Path to the flashcard document.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Input Errors ===
    /// A user-supplied value was rejected.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of what was wrong with the input.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for flashdeck operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new invalid input error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error was caused by bad user input.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }

    /// Check if this error indicates the stored collection is unreadable.
    #[must_use]
    pub fn is_corrupt_data(&self) -> bool {
        matches!(self, Self::PersistedDataCorrupt { .. })
    }
}

/// Failures on the generation path.
///
/// The `Display` text of each variant is what the user sees as the
/// definition of the resulting error card.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The provider credential is not present in the environment.
    #[error("Missing {var}")]
    MissingCredential {
        /// Name of the environment variable that was checked.
        var: String,
    },

    /// The provider could not be reached or the exchange broke off.
    #[error("Failed to generate flashcards: {0}")]
    Transport(String),

    /// The provider answered with an explicit error.
    #[error("{provider} API Error: {message}")]
    Provider {
        /// Human-readable provider label.
        provider: &'static str,
        /// Message reported by the provider.
        message: String,
    },

    /// The reply did not match any envelope the adapter understands.
    #[error("Unexpected response from provider: {0}")]
    UnexpectedShape(String),

    /// No JSON array could be located in the generated text.
    #[error("Could not find JSON in AI output")]
    MalformedOutput,

    /// The located array was not valid JSON.
    #[error("Failed to parse flashcards: {0}")]
    Parse(#[source] serde_json::Error),

    /// An element of the array is not a usable flashcard.
    #[error("Invalid flashcard at position {index}: {reason}")]
    InvalidRecord {
        /// Zero-based position of the offending element.
        index: usize,
        /// What was wrong with it.
        reason: String,
    },
}

impl GenerationError {
    /// Create a transport error from anything displayable.
    #[must_use]
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    /// Create an unexpected shape error.
    #[must_use]
    pub fn unexpected_shape(detail: impl Into<String>) -> Self {
        Self::UnexpectedShape(detail.into())
    }

    /// Create an invalid record error.
    #[must_use]
    pub fn invalid_record(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            index,
            reason: reason.into(),
        }
    }

    /// Check if this error was raised before any network traffic.
    #[must_use]
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, Self::MissingCredential { .. })
    }

    /// Check if this error comes from the text extraction stage.
    #[must_use]
    pub fn is_extraction_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedOutput | Self::Parse(_) | Self::InvalidRecord { .. }
        )
    }
}
