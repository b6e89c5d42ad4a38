//! # shotsplit
//!
//! Prefetch expensive video frames concurrently and split the frame stream
//! into scenes.
//!
//! `shotsplit` sits between a frame producer (a decoder, a filter graph, a
//! remote render service...) and whatever consumes frames scene by scene. It
//! does two things:
//!
//! - **Prefetching**: [`Prefetcher`] keeps up to `B` frame requests in
//!   flight, waiting only on the oldest, so `N` fetches take roughly `N / B`
//!   single-fetch latencies while frames still arrive strictly in order.
//! - **Segmentation**: [`Segmenter`] turns a per-frame boundary flag into
//!   scenes, merging the clusters of flags that dissolves and fades produce,
//!   ignoring cuts too close to the previous one, and honoring minimum and
//!   maximum scene lengths. Each scene is a lazy [`SceneCursor`] that can
//!   peek at already-fetched frames without consuming them.
//!
//! The crate never decodes media and never computes the boundary signal
//! itself: frames come from a [`FrameSource`] and expose
//! [`Frame::is_boundary`].
//!
//! ## Quick Start
//!
//! ```
//! use shotsplit::{FlagSource, InlineSource, PipelineOptions, Segmenter};
//!
//! let source = InlineSource::new(FlagSource::parse("0 0 0 1 0 0 0 0 1 0 0")?);
//! let options = PipelineOptions::new()
//!     .with_prefetch_depth(4)
//!     .with_min_run(2);
//!
//! let mut segmenter = Segmenter::from_source(source, &options)?;
//! while let Some(scene) = segmenter.next_scene()? {
//!     let start = scene.start_index();
//!     let frames = scene.collect::<Result<Vec<_>, _>>()?;
//!     println!("scene at {start}: {} frames", frames.len());
//! }
//! # Ok::<(), shotsplit::ShotsplitError>(())
//! ```
//!
//! ## Features
//!
//! - **Bounded prefetch**: ring of outstanding requests, in-order delivery,
//!   fetch failures reported with the frame index, restart from the start
//! - **Dissolve contraction and debounce**: composable iterator stages in
//!   [`boundary`], fused into a streaming filter for the segmenter
//! - **Scene cursors**: lookahead, start guard, length cap, strict
//!   exhaustion checks
//! - **Progress & cancellation**: [`ProgressCallback`] and
//!   [`CancellationToken`] threaded through [`PipelineOptions`]
//! - **Validation**: [`ValidationReport`] for option sets
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `rayon` | `PooledSource` decodes on a dedicated rayon thread pool (enabled by default) |
//! | `async` | `FrameStream`, a Tokio-based prefetching stream |
//! | `full` | Enables all of the above |

pub mod boundary;
pub mod configuration;
pub mod error;
pub mod frame;
pub mod prefetch;
pub mod progress;
#[cfg(feature = "rayon")]
mod rayon;
pub mod segment;
pub mod source;
#[cfg(feature = "async")]
pub mod stream;
pub mod validation;

pub use boundary::{BoundaryFilter, BoundaryRun};
pub use configuration::{DEFAULT_MIN_RUN, DEFAULT_PREFETCH_DEPTH, PipelineOptions};
pub use error::ShotsplitError;
pub use frame::{Frame, FrameCompleter, FrameSource, MarkedFrame, PendingFrame};
pub use prefetch::Prefetcher;
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
#[cfg(feature = "rayon")]
pub use self::rayon::PooledSource;
pub use segment::{CursorPhase, SceneCursor, SceneSpan, Segmenter};
pub use source::{FlagSource, FrameDecoder, InlineSource};
#[cfg(feature = "async")]
pub use stream::FrameStream;
pub use validation::ValidationReport;
