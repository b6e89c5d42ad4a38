//! Async frame prefetching.
//!
//! This module provides [`FrameStream`], the async counterpart of
//! [`Prefetcher`](crate::Prefetcher). Each outstanding fetch is a
//! `tokio::task::spawn_blocking` decode; the stream awaits only the oldest
//! one and refills the ring as frames are taken, so at most `depth` decodes
//! run at once while frames are yielded strictly in index order.
//!
//! # Example
//!
//! ```no_run
//! use tokio_stream::StreamExt;
//!
//! use shotsplit::{FlagSource, FrameStream, ShotsplitError};
//!
//! # async fn example() -> Result<(), ShotsplitError> {
//! let mut stream = FrameStream::new(FlagSource::new(vec![false; 100]), 8)?;
//!
//! while let Some(result) = stream.next().await {
//!     let frame = result?;
//!     println!("Got frame {}", frame.index);
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_stream::Stream;

use crate::configuration::PipelineOptions;
use crate::error::ShotsplitError;
use crate::progress::CancellationToken;
use crate::source::FrameDecoder;

type DecodeTask<F> = JoinHandle<Result<F, String>>;

/// An in-order stream of frames decoded on Tokio's blocking pool.
///
/// Implements [`tokio_stream::Stream`] so it can be used with
/// [`StreamExt`](tokio_stream::StreamExt) combinators such as `next()`,
/// `map()`, and `take()`.
///
/// Dropping the stream aborts every outstanding decode task without waiting
/// for it. Blocking tasks that already started run to completion and their
/// results are discarded.
pub struct FrameStream<D: FrameDecoder> {
    decoder: Arc<D>,
    runtime: Handle,
    depth: usize,
    frame_count: u64,
    ring: VecDeque<(u64, DecodeTask<D::Frame>)>,
    next_to_request: u64,
    finished: bool,
    cancellation: CancellationToken,
}

impl<D: FrameDecoder> FrameStream<D> {
    /// Create a stream with `depth` outstanding decodes.
    ///
    /// Must be called from within a Tokio runtime; the first `depth` decodes
    /// are spawned before this returns.
    pub fn new(decoder: D, depth: usize) -> Result<Self, ShotsplitError> {
        Self::with_options(decoder, &PipelineOptions::new().with_prefetch_depth(depth))
    }

    /// Create a stream configured by `options`.
    pub fn with_options(decoder: D, options: &PipelineOptions) -> Result<Self, ShotsplitError> {
        options.validate()?;

        let runtime = Handle::try_current().map_err(|error| {
            ShotsplitError::InvalidConfiguration(format!(
                "FrameStream requires a Tokio runtime: {error}"
            ))
        })?;

        let depth = options.prefetch_depth();
        let frame_count = decoder.frame_count();
        log::debug!("Creating FrameStream (depth={depth}, frames={frame_count})");

        let mut stream = Self {
            decoder: Arc::new(decoder),
            runtime,
            depth,
            frame_count,
            ring: VecDeque::with_capacity(options.ring_capacity(frame_count)),
            next_to_request: 0,
            finished: false,
            cancellation: options.cancellation_token(),
        };
        stream.fill();

        Ok(stream)
    }

    /// Number of decode tasks currently outstanding or completed but not
    /// yet yielded.
    pub fn in_flight(&self) -> usize {
        self.ring.len()
    }

    /// Number of frames in the underlying decoder.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn fill(&mut self) {
        while self.ring.len() < self.depth && self.next_to_request < self.frame_count {
            let index = self.next_to_request;
            let decoder = Arc::clone(&self.decoder);

            log::trace!("Spawning decode of frame {index}");
            let task = self.runtime.spawn_blocking(move || decoder.decode(index));
            self.ring.push_back((index, task));
            self.next_to_request += 1;
        }
    }

    fn release(&mut self) {
        for (_, task) in self.ring.drain(..) {
            task.abort();
        }
    }
}

impl<D: FrameDecoder> Stream for FrameStream<D> {
    type Item = Result<D::Frame, ShotsplitError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        if this.cancellation.is_cancelled() {
            log::warn!("FrameStream cancelled ({} decodes released)", this.ring.len());
            this.release();
            this.finished = true;
            return Poll::Ready(Some(Err(ShotsplitError::Cancelled)));
        }

        let Some((index, task)) = this.ring.front_mut() else {
            this.finished = true;
            return Poll::Ready(None);
        };
        let index = *index;
        let outcome = ready!(Pin::new(task).poll(cx));

        this.ring.pop_front();
        this.fill();

        let item = match outcome {
            Ok(Ok(frame)) => Ok(frame),
            Ok(Err(reason)) => {
                log::warn!("Decode of frame {index} failed: {reason}");
                Err(ShotsplitError::Fetch { index, reason })
            }
            Err(join_error) => Err(ShotsplitError::Fetch {
                index,
                reason: format!("decode task did not complete: {join_error}"),
            }),
        };
        Poll::Ready(Some(item))
    }
}

impl<D: FrameDecoder> Drop for FrameStream<D> {
    fn drop(&mut self) {
        self.release();
    }
}
