//! PooledSource tests (feature = "rayon").

#![cfg(feature = "rayon")]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use shotsplit::{
    FlagSource, FrameDecoder, FrameSource, MarkedFrame, PipelineOptions, PooledSource,
    Prefetcher, Segmenter, ShotsplitError,
};

/// Tracks the peak number of concurrent decodes.
#[derive(Default)]
struct ConcurrencyGauge {
    frames: u64,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl FrameDecoder for ConcurrencyGauge {
    type Frame = MarkedFrame<()>;

    fn frame_count(&self) -> u64 {
        self.frames
    }

    fn decode(&self, index: u64) -> Result<Self::Frame, String> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(10));
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(MarkedFrame::new(index, false, ()))
    }
}

#[test]
fn zero_threads_rejected() {
    let result = PooledSource::new(FlagSource::new(vec![false]), 0);
    assert!(matches!(result, Err(ShotsplitError::InvalidConfiguration(_))));
}

#[test]
fn thread_count_from_options() {
    let options = PipelineOptions::new()
        .with_prefetch_depth(6)
        .with_decoder_threads(3);
    let source = PooledSource::with_options(FlagSource::new(vec![false; 4]), &options).unwrap();
    assert_eq!(source.threads(), 3);
    assert_eq!(source.frame_count(), 4);
}

#[test]
fn huge_depth_sizes_pool_by_stream() {
    let options = PipelineOptions::new().with_prefetch_depth(usize::MAX / 2);
    let source = PooledSource::with_options(FlagSource::new(vec![false; 3]), &options).unwrap();
    assert_eq!(source.threads(), 3);

    let frames: Vec<_> = Prefetcher::with_options(source, &options)
        .unwrap()
        .map(|frame| frame.unwrap().index)
        .collect();
    assert_eq!(frames, vec![0, 1, 2]);
}

#[test]
fn request_resolves_on_pool() {
    let source = PooledSource::new(FlagSource::new(vec![false, true]), 2).unwrap();
    let frame = source.request(1).wait().unwrap();
    assert_eq!(frame.index, 1);
    assert!(frame.boundary);
}

#[test]
fn decode_failure_passes_through() {
    let source = PooledSource::new(FlagSource::new(vec![false]), 1).unwrap();
    let reason = source.request(7).wait().unwrap_err();
    assert!(reason.contains("out of range"));
}

#[test]
fn prefetch_depth_bounds_pool_concurrency() {
    let gauge = ConcurrencyGauge {
        frames: 24,
        ..ConcurrencyGauge::default()
    };
    let source = PooledSource::new(gauge, 8).unwrap();
    let mut prefetcher = Prefetcher::new(source, 3).unwrap();

    let order: Vec<u64> = prefetcher
        .by_ref()
        .map(|frame| frame.unwrap().index)
        .collect();
    assert_eq!(order, (0..24).collect::<Vec<_>>());

    // Eight workers, but never more than three requests outstanding.
    let peak = prefetcher.source().decoder().peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak concurrency was {peak}");
}

#[test]
fn pooled_decodes_overlap() {
    let gauge = ConcurrencyGauge {
        frames: 16,
        ..ConcurrencyGauge::default()
    };
    let source = PooledSource::new(gauge, 4).unwrap();
    let mut prefetcher = Prefetcher::new(source, 4).unwrap();
    prefetcher.by_ref().for_each(|frame| {
        frame.unwrap();
    });

    let peak = prefetcher.source().decoder().peak.load(Ordering::SeqCst);
    assert!(peak >= 2, "expected overlapping decodes, peak was {peak}");
    assert!(peak <= 4);
}

#[test]
fn segment_pooled_source() {
    let flags = FlagSource::parse("0 0 1 0 0 0 1 0 0").unwrap();
    let options = PipelineOptions::new().with_prefetch_depth(4).with_min_run(0);
    let source = PooledSource::with_options(flags, &options).unwrap();

    let spans = Segmenter::from_source(source, &options)
        .unwrap()
        .collect_spans()
        .unwrap();
    let starts: Vec<u64> = spans.iter().map(|span| span.start).collect();
    assert_eq!(starts, vec![0, 3, 7]);
}
