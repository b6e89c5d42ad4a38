//! Boundary-flag filtering.
//!
//! Raw per-frame cut flags are noisy: a dissolve or fade typically fires
//! several adjacent flags for one real transition. Three lazy stages turn raw
//! flags into scene ids:
//!
//! 1. [`contract_dissolves`] emits each flag one frame late and suppresses a
//!    flag that directly follows an emitted one.
//! 2. [`debounce`] drops any flag within `min_run` frames of the last
//!    accepted one.
//! 3. [`scene_ids`] numbers scenes by the running count of surviving flags.
//!
//! The adapters compose over any `Iterator<Item = bool>`:
//!
//! ```
//! use shotsplit::boundary::{contract_dissolves, debounce, scene_ids};
//!
//! let raw = [false, true, true, false, false, false, true, false];
//! let ids: Vec<u64> = scene_ids(debounce(contract_dissolves(raw), 2)).collect();
//! assert_eq!(ids, vec![0, 0, 1, 1, 1, 1, 1, 2]);
//! ```
//!
//! [`BoundaryFilter`] fuses stages 1 and 2 into a push-style state machine
//! for callers that see one frame at a time, such as the
//! [`Segmenter`](crate::Segmenter).

use std::iter::FusedIterator;

/// Lazy dissolve contraction. Created by [`contract_dissolves`].
#[derive(Debug, Clone)]
pub struct ContractDissolves<I> {
    inner: I,
    previous: bool,
}

/// Delay boundary flags by one frame and collapse back-to-back flags.
///
/// For each input flag `v` the previous decision `pv` is emitted, then `pv`
/// becomes `false` if it was `true`, else `v`. The output has the same
/// length as the input and always starts with `false`.
///
/// ```
/// use shotsplit::boundary::contract_dissolves;
///
/// let contracted: Vec<bool> = contract_dissolves([false, true, true, false, false]).collect();
/// assert_eq!(contracted, vec![false, false, true, false, false]);
/// ```
pub fn contract_dissolves<I>(flags: I) -> ContractDissolves<I::IntoIter>
where
    I: IntoIterator<Item = bool>,
{
    ContractDissolves {
        inner: flags.into_iter(),
        previous: false,
    }
}

impl<I: Iterator<Item = bool>> Iterator for ContractDissolves<I> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        let flag = self.inner.next()?;
        let emitted = self.previous;
        self.previous = !emitted && flag;
        Some(emitted)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<I: FusedIterator<Item = bool>> FusedIterator for ContractDissolves<I> {}

/// Lazy minimum-run debounce. Created by [`debounce`].
#[derive(Debug, Clone)]
pub struct Debounce<I> {
    inner: I,
    min_run: usize,
    position: u64,
    last_accepted: Option<u64>,
}

/// Suppress flags that arrive within `min_run` frames of the last accepted
/// flag.
///
/// A flag at position `i` is accepted when no flag has been accepted yet or
/// when `i - j > min_run` for the last accepted position `j`.
///
/// ```
/// use shotsplit::boundary::debounce;
///
/// let accepted: Vec<bool> = debounce([true, true, true, false, true], 3).collect();
/// assert_eq!(accepted, vec![true, false, false, false, true]);
/// ```
pub fn debounce<I>(flags: I, min_run: usize) -> Debounce<I::IntoIter>
where
    I: IntoIterator<Item = bool>,
{
    Debounce {
        inner: flags.into_iter(),
        min_run,
        position: 0,
        last_accepted: None,
    }
}

impl<I: Iterator<Item = bool>> Iterator for Debounce<I> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        let flag = self.inner.next()?;
        let position = self.position;
        self.position += 1;

        let accepted = flag && clears_run(position, self.last_accepted, self.min_run);
        if accepted {
            self.last_accepted = Some(position);
        }
        Some(accepted)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<I: FusedIterator<Item = bool>> FusedIterator for Debounce<I> {}

/// Lazy scene numbering. Created by [`scene_ids`].
#[derive(Debug, Clone)]
pub struct SceneIds<I> {
    inner: I,
    current: u64,
    started: bool,
}

/// Number each frame with its scene id.
///
/// The first frame always opens scene 0, whatever its flag; every later
/// flagged frame opens the next scene.
///
/// ```
/// use shotsplit::boundary::scene_ids;
///
/// let ids: Vec<u64> = scene_ids([true, false, false, true, false, true, false]).collect();
/// assert_eq!(ids, vec![0, 0, 0, 1, 1, 2, 2]);
/// ```
pub fn scene_ids<I>(flags: I) -> SceneIds<I::IntoIter>
where
    I: IntoIterator<Item = bool>,
{
    SceneIds {
        inner: flags.into_iter(),
        current: 0,
        started: false,
    }
}

impl<I: Iterator<Item = bool>> Iterator for SceneIds<I> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let flag = self.inner.next()?;
        if self.started && flag {
            self.current += 1;
        }
        self.started = true;
        Some(self.current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<I: FusedIterator<Item = bool>> FusedIterator for SceneIds<I> {}

/// Accepted-boundary bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundaryRun {
    /// Number of accepted boundaries so far; equals the id of the scene the
    /// most recent frame belongs to.
    pub accepted: u64,
    /// Frame position of the last accepted boundary.
    pub last_accepted: Option<u64>,
}

/// Streaming dissolve contraction plus debounce.
///
/// Feed raw flags in frame order with [`push`](BoundaryFilter::push); each
/// call returns whether that frame starts a new scene.
///
/// ```
/// use shotsplit::boundary::BoundaryFilter;
///
/// let mut filter = BoundaryFilter::new(0);
/// let cuts: Vec<bool> = [false, true, true, false, false]
///     .into_iter()
///     .map(|raw| filter.push(raw))
///     .collect();
/// assert_eq!(cuts, vec![false, false, true, false, false]);
/// assert_eq!(filter.run().accepted, 1);
/// ```
#[derive(Debug, Clone)]
pub struct BoundaryFilter {
    min_run: usize,
    previous: bool,
    position: u64,
    run: BoundaryRun,
}

impl BoundaryFilter {
    /// Create a filter with the given debounce window.
    pub fn new(min_run: usize) -> Self {
        Self {
            min_run,
            previous: false,
            position: 0,
            run: BoundaryRun::default(),
        }
    }

    /// Feed the next raw flag; returns the filtered flag for that frame.
    pub fn push(&mut self, raw: bool) -> bool {
        let contracted = self.previous;
        self.previous = !contracted && raw;

        let position = self.position;
        self.position += 1;

        let accepted = contracted && clears_run(position, self.run.last_accepted, self.min_run);
        if accepted {
            self.run.accepted += 1;
            self.run.last_accepted = Some(position);
        }
        accepted
    }

    /// Current boundary bookkeeping.
    pub fn run(&self) -> BoundaryRun {
        self.run
    }

    /// Id of the scene the most recently pushed frame belongs to.
    pub fn scene_id(&self) -> u64 {
        self.run.accepted
    }

    /// Number of flags pushed so far.
    pub fn position(&self) -> u64 {
        self.position
    }
}

fn clears_run(position: u64, last_accepted: Option<u64>, min_run: usize) -> bool {
    last_accepted.is_none_or(|last| position - last > min_run as u64)
}
