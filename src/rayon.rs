//! Pooled frame decoding.
//!
//! This module provides [`PooledSource`] which runs a [`FrameDecoder`] on a
//! dedicated [`rayon`] thread pool. Each request becomes one pool job that
//! resolves its [`PendingFrame`] on completion, so a
//! [`Prefetcher`](crate::Prefetcher) with depth `B` keeps up to `B` decodes
//! running side by side.

use std::sync::Arc;

use ::rayon::{ThreadPool, ThreadPoolBuilder};

use crate::configuration::PipelineOptions;
use crate::error::ShotsplitError;
use crate::frame::{FrameSource, PendingFrame};
use crate::source::FrameDecoder;

/// A [`FrameSource`] that decodes on a rayon thread pool.
///
/// Released requests (for example when the prefetcher is dropped mid-stream)
/// still finish decoding on the pool; their results are discarded.
pub struct PooledSource<D> {
    decoder: Arc<D>,
    pool: ThreadPool,
}

impl<D: FrameDecoder> PooledSource<D> {
    /// Create a source with `threads` decode workers.
    pub fn new(decoder: D, threads: usize) -> Result<Self, ShotsplitError> {
        if threads == 0 {
            return Err(ShotsplitError::InvalidConfiguration(
                "decoder thread count must be at least 1".to_string(),
            ));
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|worker| format!("shotsplit-decode-{worker}"))
            .panic_handler(|_| log::error!("Frame decoder panicked; request abandoned"))
            .build()
            .map_err(|error| {
                ShotsplitError::InvalidConfiguration(format!(
                    "failed to build decode pool: {error}"
                ))
            })?;

        log::debug!("Created pooled frame source (threads={threads})");

        Ok(Self {
            decoder: Arc::new(decoder),
            pool,
        })
    }

    /// Create a source sized from pipeline options.
    ///
    /// Uses [`decoder_threads`](PipelineOptions::with_decoder_threads) when
    /// set, otherwise one worker per prefetch slot the stream can fill.
    pub fn with_options(decoder: D, options: &PipelineOptions) -> Result<Self, ShotsplitError> {
        options.validate()?;
        let threads = match options.decoder_threads {
            Some(threads) => threads,
            None => options.ring_capacity(decoder.frame_count()).max(1),
        };
        Self::new(decoder, threads)
    }

    /// Number of decode workers.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Borrow the wrapped decoder.
    pub fn decoder(&self) -> &D {
        &self.decoder
    }
}

impl<D: FrameDecoder> FrameSource for PooledSource<D> {
    type Frame = D::Frame;

    fn frame_count(&self) -> u64 {
        self.decoder.frame_count()
    }

    fn request(&self, index: u64) -> PendingFrame<Self::Frame> {
        let (completer, pending) = PendingFrame::channel();
        let decoder = Arc::clone(&self.decoder);

        self.pool.spawn(move || {
            if !completer.resolve(decoder.decode(index)) {
                log::trace!("Frame {index} decoded after its request was released");
            }
        });

        pending
    }
}
