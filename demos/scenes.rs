//! Scene segmentation example.
//!
//! Usage:
//!   cargo run --example scenes -- <flags_file> [min_run]

use std::error::Error;

use shotsplit::{FlagSource, FrameDecoder, InlineSource, PipelineOptions, Segmenter};

fn main() -> Result<(), Box<dyn Error>> {
    let flags = match std::env::args().nth(1) {
        Some(path) => {
            println!("Loading {path}...");
            FlagSource::from_path(&path)?
        }
        None => {
            println!("No flags file given, using a built-in pattern.");
            FlagSource::parse("0 0 0 0 1 1 0 0 0 0 0 0 0 0 1 0 0 0 0 0 0 0 0 0 0 0 1 0")?
        }
    };
    let min_run: usize = std::env::args()
        .nth(2)
        .map(|value| value.parse())
        .transpose()?
        .unwrap_or(4);

    let frame_count = flags.frame_count();
    let options = PipelineOptions::new()
        .with_prefetch_depth(8)
        .with_min_run(min_run)
        .with_lookahead(4);

    let mut segmenter = Segmenter::from_source(InlineSource::new(flags), &options)?;

    println!("Segmenting {frame_count} frame(s) (min_run={min_run})...");
    while let Some(mut scene) = segmenter.next_scene()? {
        let peeked = scene.lookahead_list().len();
        let ordinal = scene.ordinal();
        let start = scene.start_index();

        let mut boundaries = 0;
        let mut frames = 0;
        for frame in scene.by_ref() {
            let frame = frame?;
            frames += 1;
            if frame.boundary {
                boundaries += 1;
            }
        }

        println!(
            "  {:>3}. start {start:>5}  |  {frames:>4} frame(s)  |  {boundaries} raw flag(s)  |  {peeked} visible up front",
            ordinal + 1,
        );
    }

    println!("Done!");
    Ok(())
}
