//! Progress reporting and cooperative cancellation.
//!
//! Both the [`Prefetcher`](crate::Prefetcher) and the
//! [`Segmenter`](crate::Segmenter) report to a [`ProgressCallback`] taken
//! from [`PipelineOptions`](crate::PipelineOptions). Frames delivered are
//! reported as [`OperationType::FrameFetch`], scenes opened as
//! [`OperationType::SceneSegmentation`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use shotsplit::{
//!     FlagSource, InlineSource, OperationType, PipelineOptions, ProgressCallback,
//!     ProgressInfo, Segmenter,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if info.operation == OperationType::FrameFetch {
//!             if let Some(pct) = info.percentage {
//!                 println!("{pct:.1}% fetched");
//!             }
//!         }
//!     }
//! }
//!
//! let source = InlineSource::new(FlagSource::new(vec![false; 100]));
//! let options = PipelineOptions::new()
//!     .with_progress(Arc::new(PrintProgress))
//!     .with_batch_size(25);
//!
//! let spans = Segmenter::from_source(source, &options)?.collect_spans()?;
//! assert_eq!(spans.len(), 1);
//! # Ok::<(), shotsplit::ShotsplitError>(())
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// What a [`ProgressInfo`] is counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Frames returned by a prefetcher.
    FrameFetch,
    /// Scene cursors opened by a segmenter.
    SceneSegmentation,
}

/// Snapshot handed to [`ProgressCallback::on_progress`].
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Which counter this is.
    pub operation: OperationType,
    /// Frames or scenes completed so far.
    pub current: u64,
    /// Expected total. Known for frame fetches, unknown for scenes.
    pub total: Option<u64>,
    /// `current / total` as a percentage, when the total is known and
    /// non-zero.
    pub percentage: Option<f32>,
    /// Time since the counter started (or was last restarted).
    pub elapsed: Duration,
    /// Linear extrapolation of the time left.
    pub estimated_remaining: Option<Duration>,
    /// Index of the most recent frame: the frame delivered, or the first
    /// frame of the scene opened.
    pub current_frame: Option<u64>,
}

/// Receives progress snapshots.
///
/// Callbacks run on the consumer thread, inside `next()`. Keep them cheap;
/// to stop a pipeline, cancel a [`CancellationToken`] instead.
pub trait ProgressCallback: Send + Sync {
    /// Observe one snapshot.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Default callback; ignores everything.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Shared stop flag.
///
/// Clones observe the same flag. A cancelled prefetcher drops its
/// outstanding requests and returns
/// [`ShotsplitError::Cancelled`](crate::ShotsplitError::Cancelled) once.
///
/// ```
/// use shotsplit::CancellationToken;
///
/// let token = CancellationToken::new();
/// let watcher = token.clone();
/// token.cancel();
/// assert!(watcher.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag for every clone.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether [`cancel`](Self::cancel) has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Counts completed items and calls the callback every `every` items.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    every: u64,
    done: u64,
    unreported: u64,
    started: Instant,
    last_frame: Option<u64>,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
        every: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            total,
            every: every.max(1),
            done: 0,
            unreported: 0,
            started: Instant::now(),
            last_frame: None,
        }
    }

    /// Count one item.
    pub(crate) fn advance(&mut self, frame: Option<u64>) {
        self.done += 1;
        self.unreported += 1;
        if frame.is_some() {
            self.last_frame = frame;
        }

        if self.unreported >= self.every {
            self.emit();
        }
    }

    /// Emit a final snapshot regardless of batching.
    pub(crate) fn finish(&mut self) {
        self.emit();
    }

    /// Start counting from zero again.
    pub(crate) fn reset(&mut self) {
        self.done = 0;
        self.unreported = 0;
        self.last_frame = None;
        self.started = Instant::now();
    }

    fn emit(&mut self) {
        self.unreported = 0;
        let info = self.snapshot();
        self.callback.on_progress(&info);
    }

    fn snapshot(&self) -> ProgressInfo {
        let elapsed = self.started.elapsed();
        let known_total = self.total.filter(|&total| total > 0);

        let percentage = known_total.map(|total| self.done as f32 * 100.0 / total as f32);
        let estimated_remaining = match (self.total, self.done) {
            (Some(total), done) if done > 0 => {
                let left = total.saturating_sub(done) as f64;
                Some(elapsed.mul_f64(left / done as f64))
            }
            _ => None,
        };

        ProgressInfo {
            operation: self.operation,
            current: self.done,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_frame: self.last_frame,
        }
    }
}
