//! Bounded-concurrency frame prefetching.
//!
//! [`Prefetcher`] wraps a [`FrameSource`] with a ring of at most `B`
//! outstanding requests. Each call to [`next()`](Iterator::next) waits only
//! on the oldest request and immediately issues the next one, so up to `B`
//! fetches overlap while frames are still delivered strictly in index order.
//!
//! # Example
//!
//! ```
//! use shotsplit::{FlagSource, InlineSource, Prefetcher};
//!
//! let source = InlineSource::new(FlagSource::new(vec![false, true, false]));
//! let indices = Prefetcher::new(source, 2)?
//!     .map(|frame| frame.map(|frame| frame.index))
//!     .collect::<Result<Vec<_>, _>>()?;
//! assert_eq!(indices, vec![0, 1, 2]);
//! # Ok::<(), shotsplit::ShotsplitError>(())
//! ```

use std::collections::VecDeque;
use std::iter::FusedIterator;

use crate::configuration::PipelineOptions;
use crate::error::ShotsplitError;
use crate::frame::{FrameSource, PendingFrame};
use crate::progress::{CancellationToken, OperationType, ProgressTracker};

/// One outstanding or completed request in the ring.
struct Slot<F> {
    index: u64,
    pending: PendingFrame<F>,
}

/// An in-order frame iterator that keeps up to `depth` fetches in flight.
///
/// The set of indices with outstanding or buffered requests is always the
/// window `[position(), position() + depth)` clipped to the stream length.
///
/// A failed fetch is reported once, as
/// [`ShotsplitError::Fetch`](crate::ShotsplitError::Fetch), from the call that
/// would have returned that frame. The next call continues with the
/// following index; nothing is retried.
pub struct Prefetcher<S: FrameSource> {
    source: S,
    depth: usize,
    frame_count: u64,
    ring: VecDeque<Slot<S::Frame>>,
    next_to_emit: u64,
    next_to_request: u64,
    finished: bool,
    cancellation: CancellationToken,
    tracker: ProgressTracker,
}

impl<S: FrameSource> Prefetcher<S> {
    /// Create a prefetcher with `depth` slots and default options.
    ///
    /// Requests for the first `min(depth, frame_count)` frames are issued
    /// before this returns.
    pub fn new(source: S, depth: usize) -> Result<Self, ShotsplitError> {
        Self::with_options(source, &PipelineOptions::new().with_prefetch_depth(depth))
    }

    /// Create a prefetcher configured by `options`.
    pub fn with_options(source: S, options: &PipelineOptions) -> Result<Self, ShotsplitError> {
        options.validate()?;

        let depth = options.prefetch_depth();
        let frame_count = source.frame_count();

        log::debug!("Creating Prefetcher (depth={depth}, frames={frame_count})");

        let mut prefetcher = Self {
            source,
            depth,
            frame_count,
            ring: VecDeque::with_capacity(options.ring_capacity(frame_count)),
            next_to_emit: 0,
            next_to_request: 0,
            finished: false,
            cancellation: options.cancellation_token(),
            tracker: ProgressTracker::new(
                options.progress.clone(),
                OperationType::FrameFetch,
                Some(frame_count),
                options.batch_size,
            ),
        };
        prefetcher.fill();

        Ok(prefetcher)
    }

    /// Release every outstanding request and start over from frame 0.
    pub fn restart(&mut self) {
        log::debug!(
            "Restarting Prefetcher at frame {} (releasing {} requests)",
            self.next_to_emit,
            self.ring.len()
        );

        self.ring.clear();
        self.next_to_emit = 0;
        self.next_to_request = 0;
        self.finished = false;
        self.tracker.reset();
        self.fill();
    }

    /// Index of the next frame to be returned.
    pub fn position(&self) -> u64 {
        self.next_to_emit
    }

    /// Number of frames in the underlying source.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Number of requests currently outstanding or buffered.
    pub fn in_flight(&self) -> usize {
        self.ring.len()
    }

    /// Configured ring capacity.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Borrow the wrapped source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Issue requests until the ring is full or the stream is exhausted.
    fn fill(&mut self) {
        while self.ring.len() < self.depth && self.next_to_request < self.frame_count {
            let index = self.next_to_request;
            log::trace!("Requesting frame {index}");

            let pending = self.source.request(index);
            self.ring.push_back(Slot { index, pending });
            self.next_to_request += 1;
        }

        debug_assert!(self.window_is_contiguous());
    }

    fn window_is_contiguous(&self) -> bool {
        self.ring
            .iter()
            .zip(self.next_to_emit..)
            .all(|(slot, expected)| slot.index == expected)
            && self.next_to_request == self.next_to_emit + self.ring.len() as u64
    }
}

impl<S: FrameSource> Iterator for Prefetcher<S> {
    type Item = Result<S::Frame, ShotsplitError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if self.cancellation.is_cancelled() {
            log::warn!(
                "Prefetcher cancelled at frame {} (releasing {} requests)",
                self.next_to_emit,
                self.ring.len()
            );
            self.ring.clear();
            self.finished = true;
            return Some(Err(ShotsplitError::Cancelled));
        }

        let Some(slot) = self.ring.pop_front() else {
            self.finished = true;
            self.tracker.finish();
            return None;
        };

        let result = slot.pending.wait();
        self.next_to_emit = slot.index + 1;
        self.fill();

        // Failed frames still count as processed.
        self.tracker.advance(Some(slot.index));

        match result {
            Ok(frame) => Some(Ok(frame)),
            Err(reason) => {
                log::warn!("Fetch of frame {} failed: {reason}", slot.index);
                Some(Err(ShotsplitError::Fetch {
                    index: slot.index,
                    reason,
                }))
            }
        }
    }
}

impl<S: FrameSource> FusedIterator for Prefetcher<S> {}

impl<S: FrameSource> Drop for Prefetcher<S> {
    fn drop(&mut self) {
        if !self.ring.is_empty() {
            log::trace!("Dropping Prefetcher with {} requests outstanding", self.ring.len());
        }
    }
}
