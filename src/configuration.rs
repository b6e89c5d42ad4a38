//! Pipeline configuration.
//!
//! [`PipelineOptions`] is a builder that carries the prefetch and
//! segmentation settings together with progress callbacks and cancellation
//! tokens, so constructors do not need a parameter per knob.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use shotsplit::{CancellationToken, PipelineOptions, ProgressCallback, ProgressInfo};
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{:?}: {} done", info.operation, info.current);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = PipelineOptions::new()
//!     .with_prefetch_depth(16)
//!     .with_min_run(4)
//!     .with_max_scene_length(Some(500))
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(token.clone());
//! assert!(options.validate().is_ok());
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::error::ShotsplitError;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};
use crate::validation::ValidationReport;

/// Default number of frame fetches kept in flight.
pub const DEFAULT_PREFETCH_DEPTH: usize = 48;

/// Default number of frames after an accepted boundary during which further
/// boundaries are ignored.
pub const DEFAULT_MIN_RUN: usize = 11;

/// Settings for a prefetch + segmentation pipeline.
///
/// All fields have defaults; a default-constructed value is valid.
#[derive(Clone)]
pub struct PipelineOptions {
    /// Maximum number of outstanding frame fetches.
    pub(crate) prefetch_depth: usize,
    /// Debounce window after an accepted boundary.
    pub(crate) min_run: usize,
    /// Hard cap on frames per scene cursor. `None` is unbounded.
    pub(crate) max_scene_length: Option<usize>,
    /// Frames emitted unconditionally at the start of each scene cursor.
    pub(crate) min_scene_length: usize,
    /// Frames the segmenter pulls ahead of the active cursor.
    pub(crate) lookahead: usize,
    /// Worker count for pooled decoding. `None` means one per prefetch slot.
    pub(crate) decoder_threads: Option<usize>,
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Cancellation token. `None` means never cancelled.
    pub(crate) cancellation: Option<CancellationToken>,
    /// How often to fire the progress callback (every N items).
    pub(crate) batch_size: u64,
}

impl Debug for PipelineOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PipelineOptions")
            .field("prefetch_depth", &self.prefetch_depth)
            .field("min_run", &self.min_run)
            .field("max_scene_length", &self.max_scene_length)
            .field("min_scene_length", &self.min_scene_length)
            .field("lookahead", &self.lookahead)
            .field("decoder_threads", &self.decoder_threads)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineOptions {
    /// Create options with default settings.
    ///
    /// Defaults: prefetch depth 48, `min_run` 11, unbounded scenes, minimum
    /// scene length 1, lookahead 1, no progress callback, no cancellation.
    pub fn new() -> Self {
        Self {
            prefetch_depth: DEFAULT_PREFETCH_DEPTH,
            min_run: DEFAULT_MIN_RUN,
            max_scene_length: None,
            min_scene_length: 1,
            lookahead: 1,
            decoder_threads: None,
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
        }
    }

    /// Set how many frame fetches may be outstanding at once.
    #[must_use]
    pub fn with_prefetch_depth(mut self, depth: usize) -> Self {
        self.prefetch_depth = depth;
        self
    }

    /// Set the debounce window.
    ///
    /// A boundary at frame `i` is ignored when the previously accepted
    /// boundary `j` satisfies `i - j <= min_run`.
    #[must_use]
    pub fn with_min_run(mut self, min_run: usize) -> Self {
        self.min_run = min_run;
        self
    }

    /// Cap the number of frames any scene cursor may emit.
    #[must_use]
    pub fn with_max_scene_length(mut self, max_length: Option<usize>) -> Self {
        self.max_scene_length = max_length;
        self
    }

    /// Set how many frames each scene cursor emits before honoring a
    /// boundary. Zero is treated as one.
    #[must_use]
    pub fn with_min_scene_length(mut self, min_length: usize) -> Self {
        self.min_scene_length = min_length;
        self
    }

    /// Set how many frames the segmenter buffers ahead of the active cursor.
    #[must_use]
    pub fn with_lookahead(mut self, lookahead: usize) -> Self {
        self.lookahead = lookahead;
        self
    }

    /// Set the worker count used by pooled sources.
    #[must_use]
    pub fn with_decoder_threads(mut self, threads: usize) -> Self {
        self.decoder_threads = Some(threads);
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled, the prefetcher stops at its next pull
    /// and returns [`ShotsplitError::Cancelled`].
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires.
    ///
    /// Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Prefetch depth.
    pub fn prefetch_depth(&self) -> usize {
        self.prefetch_depth
    }

    /// Debounce window.
    pub fn min_run(&self) -> usize {
        self.min_run
    }

    /// Scene length cap.
    pub fn max_scene_length(&self) -> Option<usize> {
        self.max_scene_length
    }

    /// Effective start guard, never below one.
    pub fn min_scene_length(&self) -> usize {
        self.min_scene_length.max(1)
    }

    /// Segmenter lookahead.
    pub fn lookahead(&self) -> usize {
        self.lookahead
    }

    /// Worker count for pooled decoding.
    pub fn decoder_thread_count(&self) -> usize {
        self.decoder_threads.unwrap_or(self.prefetch_depth)
    }

    /// Check every setting, returning the first violation.
    pub fn validate(&self) -> Result<(), ShotsplitError> {
        match self.constraint_violations().into_iter().next() {
            Some(message) => Err(ShotsplitError::InvalidConfiguration(message)),
            None => Ok(()),
        }
    }

    /// Inspect the options against a stream of `frame_count` frames.
    pub fn report(&self, frame_count: u64) -> ValidationReport {
        crate::validation::validate_options(self, frame_count)
    }

    /// The configured token, or one that is never cancelled.
    pub(crate) fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone().unwrap_or_default()
    }

    /// Slots a prefetch ring needs for a stream of `frame_count` frames.
    pub(crate) fn ring_capacity(&self, frame_count: u64) -> usize {
        usize::try_from(frame_count)
            .map_or(self.prefetch_depth, |count| self.prefetch_depth.min(count))
    }

    pub(crate) fn constraint_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        if self.prefetch_depth == 0 {
            violations.push("prefetch depth must be at least 1".to_string());
        }
        if self.lookahead == 0 {
            violations.push("lookahead must be at least 1".to_string());
        }
        if self.decoder_threads == Some(0) {
            violations.push("decoder thread count must be at least 1".to_string());
        }
        match self.max_scene_length {
            Some(0) => violations.push("max scene length must be at least 1".to_string()),
            Some(max_length) if max_length < self.min_scene_length() => {
                violations.push(format!(
                    "max scene length ({max_length}) is below min scene length ({})",
                    self.min_scene_length()
                ));
            }
            _ => {}
        }

        violations
    }
}
