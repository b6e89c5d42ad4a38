//! Pooled decoding example (feature = "rayon").
//!
//! Runs the same slow decoder with and without prefetching to show the
//! overlap a deeper ring buys.
//!
//! Usage:
//!   cargo run --example pooled_decode -- [depth]

use std::error::Error;
use std::thread;
use std::time::{Duration, Instant};

use shotsplit::{FrameDecoder, MarkedFrame, PipelineOptions, PooledSource, Segmenter};

/// Pretends every frame takes a few milliseconds to render.
struct SlowRender {
    frames: u64,
    cost: Duration,
}

impl FrameDecoder for SlowRender {
    type Frame = MarkedFrame<Vec<u8>>;

    fn frame_count(&self) -> u64 {
        self.frames
    }

    fn decode(&self, index: u64) -> Result<Self::Frame, String> {
        thread::sleep(self.cost);
        Ok(MarkedFrame::new(index, index % 40 == 0, vec![0; 64]))
    }
}

fn run(depth: usize) -> Result<(usize, Duration), Box<dyn Error>> {
    let options = PipelineOptions::new()
        .with_prefetch_depth(depth)
        .with_min_run(0);
    let decoder = SlowRender {
        frames: 200,
        cost: Duration::from_millis(5),
    };

    let start = Instant::now();
    let source = PooledSource::with_options(decoder, &options)?;
    let spans = Segmenter::from_source(source, &options)?.collect_spans()?;
    Ok((spans.len(), start.elapsed()))
}

fn main() -> Result<(), Box<dyn Error>> {
    let depth: usize = std::env::args()
        .nth(1)
        .map(|value| value.parse())
        .transpose()?
        .unwrap_or(16);

    let (scenes, sequential) = run(1)?;
    println!("depth  1: {scenes} scene(s) in {sequential:.2?}");

    let (scenes, pooled) = run(depth)?;
    println!("depth {depth:>2}: {scenes} scene(s) in {pooled:.2?}");

    println!(
        "Speedup: {:.1}x",
        sequential.as_secs_f64() / pooled.as_secs_f64()
    );
    Ok(())
}
