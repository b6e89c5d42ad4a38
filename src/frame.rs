//! Frames, frame sources, and pending frame requests.
//!
//! A [`FrameSource`] hands out [`PendingFrame`] handles: requesting a frame
//! never blocks on decode, only [`PendingFrame::wait`] does. This is the seam
//! the [`Prefetcher`](crate::Prefetcher) uses to keep several fetches in
//! flight at once.
//!
//! # Example
//!
//! ```
//! use std::thread;
//!
//! use shotsplit::{Frame, FrameSource, MarkedFrame, PendingFrame};
//!
//! struct Threaded;
//!
//! impl FrameSource for Threaded {
//!     type Frame = MarkedFrame<()>;
//!
//!     fn frame_count(&self) -> u64 {
//!         4
//!     }
//!
//!     fn request(&self, index: u64) -> PendingFrame<Self::Frame> {
//!         let (completer, pending) = PendingFrame::channel();
//!         thread::spawn(move || completer.complete(MarkedFrame::new(index, index == 2, ())));
//!         pending
//!     }
//! }
//!
//! let frame = Threaded.request(2).wait().unwrap();
//! assert!(frame.is_boundary());
//! ```

use std::sync::mpsc::{Receiver, SyncSender, sync_channel};

/// A decoded frame as seen by the segmentation pipeline.
///
/// The only thing the pipeline needs to know about a frame is whether the
/// external boundary detector flagged it as the start of a new shot.
pub trait Frame {
    /// Returns `true` if this frame begins a new shot.
    fn is_boundary(&self) -> bool;
}

impl<F: Frame + ?Sized> Frame for Box<F> {
    fn is_boundary(&self) -> bool {
        (**self).is_boundary()
    }
}

/// A frame carrying its index, its boundary flag, and an arbitrary payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedFrame<T> {
    /// Position of the frame in the source.
    pub index: u64,
    /// Raw boundary flag from the detector.
    pub boundary: bool,
    /// Decoded data.
    pub payload: T,
}

impl<T> MarkedFrame<T> {
    /// Create a frame.
    pub fn new(index: u64, boundary: bool, payload: T) -> Self {
        Self {
            index,
            boundary,
            payload,
        }
    }
}

impl<T> Frame for MarkedFrame<T> {
    fn is_boundary(&self) -> bool {
        self.boundary
    }
}

/// A sequentially indexed source of expensive-to-produce frames.
///
/// Implementations decide how requests execute (inline, on a thread pool, on
/// a hardware decoder queue...). The only requirement is that
/// [`request`](FrameSource::request) returns without waiting for the frame.
pub trait FrameSource {
    /// The frame type produced by this source.
    type Frame: Frame;

    /// Total number of frames the source can produce.
    fn frame_count(&self) -> u64;

    /// Start producing frame `index` and return a handle to the result.
    ///
    /// Indices are always in `0..frame_count()`.
    fn request(&self, index: u64) -> PendingFrame<Self::Frame>;
}

type FetchResult<F> = Result<F, String>;

enum PendingState<F> {
    Resolved(FetchResult<F>),
    Waiting(Receiver<FetchResult<F>>),
}

/// A one-shot handle to a frame that is being produced.
///
/// Dropping the handle releases the request without waiting for it; the
/// producer's eventual result is discarded.
pub struct PendingFrame<F> {
    state: PendingState<F>,
}

impl<F> PendingFrame<F> {
    /// A request that has already completed successfully.
    pub fn ready(frame: F) -> Self {
        Self {
            state: PendingState::Resolved(Ok(frame)),
        }
    }

    /// A request that has already failed.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            state: PendingState::Resolved(Err(reason.into())),
        }
    }

    /// Create a pending request together with the completer that resolves it.
    ///
    /// The completer is `Send` when `F` is and may be moved to whichever
    /// thread performs the decode.
    pub fn channel() -> (FrameCompleter<F>, Self) {
        let (sender, receiver) = sync_channel(1);
        (
            FrameCompleter { sender },
            Self {
                state: PendingState::Waiting(receiver),
            },
        )
    }

    /// Block until the frame is available.
    ///
    /// Returns the producer's failure reason if the fetch failed or if the
    /// completer was dropped without resolving the request.
    pub fn wait(self) -> Result<F, String> {
        match self.state {
            PendingState::Resolved(result) => result,
            PendingState::Waiting(receiver) => receiver
                .recv()
                .unwrap_or_else(|_| Err("request abandoned by source".to_string())),
        }
    }
}

impl<F> std::fmt::Debug for PendingFrame<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            PendingState::Resolved(Ok(_)) => "ready",
            PendingState::Resolved(Err(_)) => "failed",
            PendingState::Waiting(_) => "waiting",
        };
        f.debug_struct("PendingFrame").field("state", &state).finish()
    }
}

/// The producing side of a [`PendingFrame`].
pub struct FrameCompleter<F> {
    sender: SyncSender<FetchResult<F>>,
}

impl<F> FrameCompleter<F> {
    /// Resolve the request with a frame.
    ///
    /// Returns `false` if the request was already released by the consumer.
    pub fn complete(self, frame: F) -> bool {
        self.resolve(Ok(frame))
    }

    /// Resolve the request with a failure.
    ///
    /// Returns `false` if the request was already released by the consumer.
    pub fn fail(self, reason: impl Into<String>) -> bool {
        self.resolve(Err(reason.into()))
    }

    /// Resolve the request with a decode result.
    pub fn resolve(self, result: Result<F, String>) -> bool {
        // Capacity 1 and a single send: this never blocks.
        self.sender.send(result).is_ok()
    }
}
