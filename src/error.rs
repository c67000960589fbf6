//! Error handling for Skipjacker
//!
//! Only structural problems are errors. Range overruns are padded or
//! truncated by the segment operations, and history/selection edits report
//! boundary cases through `bool`/`Option` returns instead.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for Skipjacker operations
pub type Result<T> = std::result::Result<T, SkipjackError>;

/// Main error type for Skipjacker operations
#[derive(Error, Debug)]
pub enum SkipjackError {
    // Container Errors
    #[error("Header too short: {len} bytes (expected at least 44)")]
    HeaderTooShort { len: usize },

    #[error("Unsupported container layout: {reason}")]
    UnsupportedLayout { reason: String },

    // Segment Errors
    #[error("Channel count mismatch: expected {expected}, found {found}")]
    ChannelMismatch { expected: usize, found: usize },

    // Configuration Errors
    #[error("Invalid export settings: {reason}")]
    InvalidSettings { reason: String },

    // Rule Errors
    #[error("Invalid rule selection [{from}, {to}] of {count} rules")]
    InvalidSelection { from: i64, to: i64, count: usize },

    // File Errors
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read file: {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}: {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Playback Errors
    #[error("Playback failed: {reason}")]
    PlaybackError { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SkipjackError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            SkipjackError::HeaderTooShort { .. } => "HEADER_TOO_SHORT",
            SkipjackError::UnsupportedLayout { .. } => "UNSUPPORTED_LAYOUT",
            SkipjackError::ChannelMismatch { .. } => "CHANNEL_MISMATCH",
            SkipjackError::InvalidSettings { .. } => "INVALID_SETTINGS",
            SkipjackError::InvalidSelection { .. } => "INVALID_SELECTION",
            SkipjackError::FileNotFound { .. } => "FILE_NOT_FOUND",
            SkipjackError::FileReadError { .. } => "FILE_READ_ERROR",
            SkipjackError::FileWriteError { .. } => "FILE_WRITE_ERROR",
            SkipjackError::PlaybackError { .. } => "PLAYBACK_ERROR",
            SkipjackError::Io(_) => "IO_ERROR",
            SkipjackError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable by retrying with different input
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SkipjackError::FileNotFound { .. }
                | SkipjackError::InvalidSettings { .. }
                | SkipjackError::InvalidSelection { .. }
                | SkipjackError::PlaybackError { .. }
        )
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            SkipjackError::HeaderTooShort { .. } => {
                Some("The file is truncated or not a WAV container.")
            }
            SkipjackError::UnsupportedLayout { .. } => {
                Some("Convert the source to uncompressed 8/16/24/32-bit PCM WAV.")
            }
            SkipjackError::ChannelMismatch { .. } => {
                Some("All segments in one render must share the source's channel count.")
            }
            SkipjackError::InvalidSettings { .. } => {
                Some("Speed factors must be positive; blur and smoothing lengths are sample counts.")
            }
            SkipjackError::InvalidSelection { .. } => {
                Some("Rule indices start at 0; list them with the `rules` command.")
            }
            SkipjackError::FileNotFound { .. } => Some("Check the file path and try again."),
            SkipjackError::PlaybackError { .. } => {
                Some("Check that the player command exists and accepts a WAV path.")
            }
            _ => None,
        }
    }
}
