//! Error types for the `shotsplit` crate.
//!
//! This module defines [`ShotsplitError`], the unified error type returned by
//! all fallible operations in the crate. Fetch failures carry the index of the
//! frame that could not be produced so the caller can decide whether to abort
//! or to keep pulling past it.

use std::io::Error as IoError;

use serde_json::Error as JsonError;
use thiserror::Error;

/// The unified error type for all `shotsplit` operations.
///
/// Every public method that can fail returns `Result<T, ShotsplitError>`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ShotsplitError {
    /// A single frame fetch failed.
    ///
    /// Surfaces from the `next()` call that would have returned the frame.
    /// Frames before `index` were delivered and are unaffected.
    #[error("Failed to fetch frame {index}: {reason}")]
    Fetch {
        /// Index of the frame that could not be produced.
        index: u64,
        /// Reason reported by the frame source.
        reason: String,
    },

    /// A scene cursor was used outside of its contract, e.g. queried again
    /// after it was exhausted.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// A pipeline or cursor setting is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Boundary-flag input could not be parsed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// An I/O error occurred while reading input.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// Malformed JSON boundary-flag input.
    #[error("JSON error: {0}")]
    Json(#[from] JsonError),
}

impl ShotsplitError {
    /// Returns the frame index for [`Fetch`](ShotsplitError::Fetch) errors.
    pub fn frame_index(&self) -> Option<u64> {
        match self {
            ShotsplitError::Fetch { index, .. } => Some(*index),
            _ => None,
        }
    }
}
