//! Streaming scene segmentation.
//!
//! [`Segmenter`] consumes an ordered frame stream (typically a
//! [`Prefetcher`]) and hands out one [`SceneCursor`] per scene. Boundary
//! flags pass through dissolve contraction and debounce (see
//! [`boundary`](crate::boundary)) as frames are pulled; nothing is
//! materialized beyond the configured lookahead.
//!
//! A cursor mutably borrows its segmenter, so only one scene can be live at a
//! time and a cursor can never outlive the scene it was created for.
//!
//! # Example
//!
//! ```
//! use shotsplit::{FlagSource, InlineSource, PipelineOptions, Segmenter};
//!
//! // Raw cuts at frames 2 and 5 surface one frame late, at 3 and 6.
//! let flags = vec![false, false, true, false, false, true, false, false];
//! let source = InlineSource::new(FlagSource::new(flags));
//! let options = PipelineOptions::new().with_min_run(0);
//!
//! let mut segmenter = Segmenter::from_source(source, &options)?;
//! let mut lengths = Vec::new();
//! while let Some(scene) = segmenter.next_scene()? {
//!     lengths.push(scene.count());
//! }
//! assert_eq!(lengths, vec![3, 3, 2]);
//! # Ok::<(), shotsplit::ShotsplitError>(())
//! ```

use std::collections::VecDeque;
use std::iter::FusedIterator;

use crate::boundary::BoundaryFilter;
use crate::configuration::PipelineOptions;
use crate::error::ShotsplitError;
use crate::frame::{Frame, FrameSource};
use crate::prefetch::Prefetcher;
use crate::progress::{OperationType, ProgressTracker};

/// Lifecycle of a [`SceneCursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPhase {
    /// Created, nothing pulled yet.
    Fresh,
    /// At least one frame emitted; the scene continues.
    Emitting,
    /// Boundary, length cap, or end of stream reached. Terminal.
    Exhausted,
}

/// Position and length of one scene, as produced by
/// [`Segmenter::collect_spans`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneSpan {
    /// Zero-based number of the cursor that produced this span.
    pub ordinal: u64,
    /// Scene id of the first frame (running count of accepted boundaries).
    pub scene_id: u64,
    /// Index of the first frame.
    pub start: u64,
    /// Number of frames.
    pub len: u64,
}

impl SceneSpan {
    /// Index one past the last frame.
    pub fn end(&self) -> u64 {
        self.start + self.len
    }
}

/// A frame pulled from the stream but not yet handed to a cursor.
struct Buffered<F> {
    index: u64,
    scene_id: u64,
    cut: bool,
    frame: Result<F, ShotsplitError>,
}

#[derive(Debug, Clone, Copy)]
struct CursorState {
    ordinal: u64,
    scene_id: u64,
    start_index: u64,
    phase: CursorPhase,
    emitted: usize,
    min_guard: usize,
    max_length: Option<usize>,
}

impl CursorState {
    fn closed() -> Self {
        Self {
            ordinal: 0,
            scene_id: 0,
            start_index: 0,
            phase: CursorPhase::Exhausted,
            emitted: 0,
            min_guard: 1,
            max_length: None,
        }
    }
}

/// Groups an ordered frame stream into scenes.
///
/// `I` is any iterator of fetch results, such as a [`Prefetcher`].
pub struct Segmenter<I, F> {
    stream: I,
    stream_done: bool,
    interrupted: Option<ShotsplitError>,
    filter: BoundaryFilter,
    buffer: VecDeque<Buffered<F>>,
    lookahead: usize,
    pulled: u64,
    min_scene_length: usize,
    max_scene_length: Option<usize>,
    cursor: CursorState,
    scenes_opened: u64,
    finished: bool,
    tracker: ProgressTracker,
}

impl<S: FrameSource> Segmenter<Prefetcher<S>, S::Frame> {
    /// Build a [`Prefetcher`] over `source` and segment its output.
    pub fn from_source(source: S, options: &PipelineOptions) -> Result<Self, ShotsplitError> {
        let prefetcher = Prefetcher::with_options(source, options)?;
        Self::new(prefetcher, options)
    }
}

impl<I, F> Segmenter<I, F>
where
    I: Iterator<Item = Result<F, ShotsplitError>>,
    F: Frame,
{
    /// Segment `stream` using the debounce, lookahead and scene length
    /// settings from `options`.
    pub fn new(stream: I, options: &PipelineOptions) -> Result<Self, ShotsplitError> {
        options.validate()?;

        log::debug!(
            "Creating Segmenter (min_run={}, min_scene_length={}, max_scene_length={:?}, lookahead={})",
            options.min_run(),
            options.min_scene_length(),
            options.max_scene_length(),
            options.lookahead()
        );

        Ok(Self {
            stream,
            stream_done: false,
            interrupted: None,
            filter: BoundaryFilter::new(options.min_run()),
            buffer: VecDeque::new(),
            lookahead: options.lookahead(),
            pulled: 0,
            min_scene_length: options.min_scene_length(),
            max_scene_length: options.max_scene_length(),
            cursor: CursorState::closed(),
            scenes_opened: 0,
            finished: false,
            tracker: ProgressTracker::new(
                options.progress.clone(),
                OperationType::SceneSegmentation,
                None,
                options.batch_size,
            ),
        })
    }

    /// Open a cursor on the next scene.
    ///
    /// Returns `Ok(None)` once the stream is exhausted. If the previous
    /// cursor was dropped before reaching its end, the rest of that scene is
    /// pulled and discarded first; an error while doing so is returned and
    /// the skip resumes on the next call.
    pub fn next_scene(&mut self) -> Result<Option<SceneCursor<'_, I, F>>, ShotsplitError> {
        if self.cursor.phase != CursorPhase::Exhausted {
            let skipped = self.drain_scene()?;
            log::debug!(
                "Skipped {skipped} unread frame(s) of scene #{}",
                self.cursor.ordinal
            );
        }

        self.refill();
        let Some(front) = self.buffer.front() else {
            if let Some(error) = self.interrupted.take() {
                return Err(error);
            }
            if !self.finished {
                self.finished = true;
                self.tracker.finish();
                log::debug!("Segmentation finished after {} scene(s)", self.scenes_opened);
            }
            return Ok(None);
        };

        self.cursor = CursorState {
            ordinal: self.scenes_opened,
            scene_id: front.scene_id,
            start_index: front.index,
            phase: CursorPhase::Fresh,
            emitted: 0,
            min_guard: self.min_scene_length,
            max_length: self.max_scene_length,
        };
        self.scenes_opened += 1;
        self.tracker.advance(Some(front.index));

        log::debug!(
            "Opened scene #{} (id={}, start={})",
            self.cursor.ordinal,
            self.cursor.scene_id,
            self.cursor.start_index
        );

        Ok(Some(SceneCursor { segmenter: self }))
    }

    /// Run `callback` on every scene in order.
    ///
    /// Frames the callback leaves unread are skipped.
    pub fn for_each_scene<C>(&mut self, mut callback: C) -> Result<(), ShotsplitError>
    where
        C: FnMut(&mut SceneCursor<'_, I, F>) -> Result<(), ShotsplitError>,
    {
        while let Some(mut cursor) = self.next_scene()? {
            callback(&mut cursor)?;
        }
        Ok(())
    }

    /// Consume the whole stream and return the position of every scene.
    ///
    /// Stops at the first failed fetch.
    pub fn collect_spans(mut self) -> Result<Vec<SceneSpan>, ShotsplitError> {
        let mut spans = Vec::new();

        while let Some(mut cursor) = self.next_scene()? {
            let mut span = SceneSpan {
                ordinal: cursor.ordinal(),
                scene_id: cursor.scene_id(),
                start: cursor.start_index(),
                len: 0,
            };
            for frame in cursor.by_ref() {
                frame?;
                span.len += 1;
            }
            spans.push(span);
        }

        Ok(spans)
    }

    /// Number of cursors handed out so far.
    pub fn scenes_opened(&self) -> u64 {
        self.scenes_opened
    }

    /// Number of items pulled from the underlying stream.
    pub fn pulled(&self) -> u64 {
        self.pulled
    }

    /// Number of pulled frames not yet handed to a cursor.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Borrow the underlying stream.
    pub fn stream(&self) -> &I {
        &self.stream
    }

    /// Pull one item from the stream into the lookahead buffer.
    fn pull(&mut self) -> bool {
        if self.stream_done {
            return false;
        }

        let item = match self.stream.next() {
            None => {
                self.stream_done = true;
                return false;
            }
            // Cancellation ends the stream; it is not a frame.
            Some(Err(ShotsplitError::Cancelled)) => {
                self.stream_done = true;
                self.interrupted = Some(ShotsplitError::Cancelled);
                return false;
            }
            Some(item) => item,
        };

        // A failed fetch has no flag; it never starts a scene.
        let raw = item.as_ref().is_ok_and(|frame| frame.is_boundary());
        let cut = self.filter.push(raw);

        self.buffer.push_back(Buffered {
            index: self.pulled,
            scene_id: self.filter.scene_id(),
            cut,
            frame: item,
        });
        self.pulled += 1;
        true
    }

    fn refill(&mut self) {
        while self.buffer.len() < self.lookahead && self.pull() {}
    }

    /// Advance the active cursor by one frame.
    fn step(&mut self) -> Option<Result<F, ShotsplitError>> {
        let mut state = self.cursor;
        if state.phase == CursorPhase::Exhausted {
            return None;
        }

        if state.max_length.is_some_and(|max_length| state.emitted >= max_length) {
            return self.exhaust("length cap");
        }

        self.refill();
        if self.buffer.is_empty()
            && let Some(error) = self.interrupted.take()
        {
            self.exhaust("interrupted");
            return Some(Err(error));
        }
        let stop = match self.buffer.front() {
            None => Some("end of stream"),
            Some(front) if front.cut && state.emitted >= state.min_guard => Some("boundary"),
            Some(_) => None,
        };
        if let Some(reason) = stop {
            return self.exhaust(reason);
        }

        let entry = self.buffer.pop_front()?;
        self.refill();

        state.emitted += 1;
        state.phase = CursorPhase::Emitting;
        self.cursor = state;

        Some(entry.frame)
    }

    fn exhaust(&mut self, reason: &str) -> Option<Result<F, ShotsplitError>> {
        self.cursor.phase = CursorPhase::Exhausted;
        log::debug!(
            "Closed scene #{} after {} frame(s) ({reason})",
            self.cursor.ordinal,
            self.cursor.emitted
        );
        None
    }

    fn drain_scene(&mut self) -> Result<usize, ShotsplitError> {
        let mut skipped = 0;
        while let Some(frame) = self.step() {
            frame?;
            skipped += 1;
        }
        Ok(skipped)
    }
}

/// A lazy, single-pass view of one scene.
///
/// Yields the scene's frames in order and stops, without consuming it, at
/// the first frame of the next scene. Created by [`Segmenter::next_scene`].
pub struct SceneCursor<'a, I, F> {
    segmenter: &'a mut Segmenter<I, F>,
}

impl<I, F> SceneCursor<'_, I, F>
where
    I: Iterator<Item = Result<F, ShotsplitError>>,
    F: Frame,
{
    /// Like [`next`](Iterator::next), but querying an exhausted cursor is a
    /// [`ProtocolViolation`](ShotsplitError::ProtocolViolation).
    pub fn try_next(&mut self) -> Result<Option<F>, ShotsplitError> {
        if self.is_exhausted() {
            return Err(ShotsplitError::ProtocolViolation(format!(
                "scene cursor #{} queried after exhaustion",
                self.ordinal()
            )));
        }
        self.segmenter.step().transpose()
    }

    /// Buffered frames that belong to this scene, without consuming them.
    ///
    /// Only reflects frames already pulled into the segmenter's lookahead;
    /// it says nothing about how long the scene really is.
    pub fn lookahead_list(&self) -> Vec<&F> {
        let state = &self.segmenter.cursor;
        if state.phase == CursorPhase::Exhausted {
            return Vec::new();
        }

        let allowance = state
            .max_length
            .map_or(usize::MAX, |max_length| max_length.saturating_sub(state.emitted));
        let guarded = state.min_guard.saturating_sub(state.emitted);

        let mut frames = Vec::new();
        for (offset, entry) in self.segmenter.buffer.iter().enumerate() {
            if frames.len() >= allowance || (offset >= guarded && entry.cut) {
                break;
            }
            match &entry.frame {
                Ok(frame) => frames.push(frame),
                Err(_) => break,
            }
        }
        frames
    }

    /// Emit the first `min_length` frames even if a boundary occurs among
    /// them. Zero is treated as one.
    ///
    /// Only allowed before the first frame is pulled.
    pub fn assert_min_length(&mut self, min_length: usize) -> Result<&mut Self, ShotsplitError> {
        let state = &mut self.segmenter.cursor;
        if state.phase != CursorPhase::Fresh {
            return Err(ShotsplitError::ProtocolViolation(format!(
                "min length set on scene cursor #{} after it started emitting",
                state.ordinal
            )));
        }

        let min_guard = min_length.max(1);
        if let Some(max_length) = state.max_length
            && min_guard > max_length
        {
            return Err(ShotsplitError::InvalidConfiguration(format!(
                "min scene length ({min_guard}) exceeds max scene length ({max_length})"
            )));
        }

        state.min_guard = min_guard;
        Ok(self)
    }

    /// Never emit more than `max_length` frames from this cursor.
    pub fn assert_max_length(&mut self, max_length: usize) -> Result<&mut Self, ShotsplitError> {
        let state = &mut self.segmenter.cursor;
        if max_length == 0 {
            return Err(ShotsplitError::InvalidConfiguration(
                "max scene length must be at least 1".to_string(),
            ));
        }
        if max_length < state.min_guard {
            return Err(ShotsplitError::InvalidConfiguration(format!(
                "max scene length ({max_length}) is below min scene length ({})",
                state.min_guard
            )));
        }

        state.max_length = Some(max_length);
        Ok(self)
    }

    /// Zero-based number of this cursor among all cursors handed out.
    pub fn ordinal(&self) -> u64 {
        self.segmenter.cursor.ordinal
    }

    /// Scene id of this cursor's first frame.
    ///
    /// A cursor cut short by a length cap is followed by one with the same
    /// id.
    pub fn scene_id(&self) -> u64 {
        self.segmenter.cursor.scene_id
    }

    /// Index of this cursor's first frame.
    pub fn start_index(&self) -> u64 {
        self.segmenter.cursor.start_index
    }

    /// Frames emitted so far.
    pub fn emitted(&self) -> usize {
        self.segmenter.cursor.emitted
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> CursorPhase {
        self.segmenter.cursor.phase
    }

    /// Returns `true` once the cursor has reached its end.
    pub fn is_exhausted(&self) -> bool {
        self.phase() == CursorPhase::Exhausted
    }

    /// Pull and discard the rest of this scene, returning how many frames
    /// were skipped.
    pub fn skip_remaining(&mut self) -> Result<usize, ShotsplitError> {
        self.segmenter.drain_scene()
    }
}

impl<I, F> Iterator for SceneCursor<'_, I, F>
where
    I: Iterator<Item = Result<F, ShotsplitError>>,
    F: Frame,
{
    type Item = Result<F, ShotsplitError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.segmenter.step()
    }
}

impl<I, F> FusedIterator for SceneCursor<'_, I, F>
where
    I: Iterator<Item = Result<F, ShotsplitError>>,
    F: Frame,
{
}
