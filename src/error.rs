//! Error handling for Trimline
//!
//! Every engine operation either succeeds, no-ops, or returns one of these.
//! Nothing here is fatal: rejected edits leave prior state untouched.

use thiserror::Error;

/// Result type alias for Trimline operations
pub type Result<T> = std::result::Result<T, TrimlineError>;

/// Main error type for Trimline operations
#[derive(Error, Debug)]
pub enum TrimlineError {
    // Trim Errors
    #[error("Invalid trim range: in {in_point:.3}s must precede out {out_point:.3}s by at least one frame")]
    InvalidRange { in_point: f64, out_point: f64 },

    #[error("Invalid timeline: {reason}")]
    InvalidTimeline { reason: String },

    #[error("Trim selection is busy: {reason}")]
    SelectionBusy { reason: String },

    // Marker Errors
    #[error("Marker is locked: {id}")]
    LockedMarker { id: String },

    #[error("Marker not found: {id}")]
    MarkerNotFound { id: String },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // Audio Errors
    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TrimlineError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            TrimlineError::InvalidRange { .. } => "INVALID_RANGE",
            TrimlineError::InvalidTimeline { .. } => "INVALID_TIMELINE",
            TrimlineError::SelectionBusy { .. } => "SELECTION_BUSY",
            TrimlineError::LockedMarker { .. } => "LOCKED_MARKER",
            TrimlineError::MarkerNotFound { .. } => "NOT_FOUND",
            TrimlineError::InvalidConfig { .. } => "INVALID_CONFIG",
            TrimlineError::InvalidAudio { .. } => "INVALID_AUDIO",
            TrimlineError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            TrimlineError::Io(_) => "IO_ERROR",
            TrimlineError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors are local rejections; the caller's state is intact
    /// and the same session can carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TrimlineError::InvalidRange { .. }
                | TrimlineError::SelectionBusy { .. }
                | TrimlineError::LockedMarker { .. }
                | TrimlineError::MarkerNotFound { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TrimlineError::InvalidRange { .. } => vec![
                "Keep the in point at least one frame before the out point",
                "The previous trim selection has been kept",
            ],
            TrimlineError::SelectionBusy { .. } => vec![
                "Unlock the selection or finish the current drag first",
                "The previous trim selection has been kept",
            ],
            TrimlineError::LockedMarker { .. } => vec![
                "Unlock the marker before deleting it",
                "Locked markers are also protected from remote deletes",
            ],
            TrimlineError::MarkerNotFound { .. } => vec![
                "The marker may have been deleted by another session",
                "Refresh the marker list and try again",
            ],
            TrimlineError::InvalidConfig { .. } => vec![
                "Check the configuration file for non-positive values",
                "Remove the field to fall back to its default",
            ],
            TrimlineError::InvalidAudio { .. } => vec![
                "Try converting the file to WAV format first",
                "The file may be corrupted - try re-exporting from source",
            ],
            TrimlineError::UnsupportedFormat { .. } => {
                vec!["Convert to 16, 24 or 32-bit PCM or 32-bit float WAV"]
            }
            _ => vec![],
        }
    }
}
