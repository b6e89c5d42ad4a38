//! Benchmarks for prefetching and segmentation.
//!
//! Run with: cargo bench
//! Run with all features: cargo bench --all-features

use std::thread;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion};
use shotsplit::{
    FlagSource, FrameDecoder, InlineSource, MarkedFrame, PipelineOptions, Prefetcher, Segmenter,
    boundary::{contract_dissolves, debounce, scene_ids},
};

#[cfg(feature = "rayon")]
use shotsplit::PooledSource;

#[cfg(feature = "async")]
use tokio::runtime::Runtime;

const FRAME_COUNT: usize = 10_000;

fn synthetic_flags(count: usize) -> Vec<bool> {
    (0..count).map(|index| index % 97 == 0 || index % 97 == 1).collect()
}

/// A decoder with a fixed per-frame latency.
struct SleepyDecoder {
    frames: u64,
    latency: Duration,
}

impl FrameDecoder for SleepyDecoder {
    type Frame = MarkedFrame<()>;

    fn frame_count(&self) -> u64 {
        self.frames
    }

    fn decode(&self, index: u64) -> Result<Self::Frame, String> {
        thread::sleep(self.latency);
        Ok(MarkedFrame::new(index, index % 25 == 0, ()))
    }
}

fn benchmark_boundary_stages(criterion: &mut Criterion) {
    let flags = synthetic_flags(FRAME_COUNT);

    criterion.bench_function("boundary stages (10k flags)", |bencher| {
        bencher.iter(|| {
            let ids = scene_ids(debounce(contract_dissolves(flags.iter().copied()), 11));
            ids.last()
        });
    });
}

fn benchmark_inline_segmentation(criterion: &mut Criterion) {
    let flags = FlagSource::new(synthetic_flags(FRAME_COUNT));
    let options = PipelineOptions::new();

    criterion.bench_function("segment inline source (10k frames)", |bencher| {
        bencher.iter(|| {
            let source = InlineSource::new(flags.clone());
            Segmenter::from_source(source, &options)
                .unwrap()
                .collect_spans()
                .unwrap()
        });
    });

    criterion.bench_function("prefetch inline source (10k frames)", |bencher| {
        bencher.iter(|| {
            let source = InlineSource::new(flags.clone());
            Prefetcher::new(source, 48).unwrap().count()
        });
    });
}

#[cfg(feature = "rayon")]
fn benchmark_pooled_depth(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("pooled prefetch depth");
    group.sample_size(10);

    for depth in [1usize, 4, 8, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |bencher, &depth| {
            bencher.iter(|| {
                let decoder = SleepyDecoder {
                    frames: 64,
                    latency: Duration::from_millis(1),
                };
                let source = PooledSource::new(decoder, depth).unwrap();
                Prefetcher::new(source, depth).unwrap().count()
            });
        });
    }

    group.finish();
}

#[cfg(not(feature = "rayon"))]
fn benchmark_pooled_depth(_criterion: &mut Criterion) {}

#[cfg(feature = "async")]
fn benchmark_async(criterion: &mut Criterion) {
    use shotsplit::FrameStream;
    use tokio_stream::StreamExt;

    let runtime = Runtime::new().unwrap();
    let mut group = criterion.benchmark_group("async prefetch depth");
    group.sample_size(10);

    for depth in [1usize, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |bencher, &depth| {
            bencher.iter(|| {
                runtime.block_on(async {
                    let decoder = SleepyDecoder {
                        frames: 64,
                        latency: Duration::from_millis(1),
                    };
                    let mut stream = FrameStream::new(decoder, depth).unwrap();
                    let mut count = 0;
                    while let Some(frame) = stream.next().await {
                        frame.unwrap();
                        count += 1;
                    }
                    count
                })
            });
        });
    }

    group.finish();
}

#[cfg(not(feature = "async"))]
fn benchmark_async(_criterion: &mut Criterion) {}

criterion::criterion_group!(
    benches,
    benchmark_boundary_stages,
    benchmark_inline_segmentation,
    benchmark_pooled_depth,
    benchmark_async,
);
criterion::criterion_main!(benches);
