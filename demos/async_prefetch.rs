//! Async prefetching example (feature = "async").
//!
//! Usage:
//!   cargo run --features=async --example async_prefetch -- [flags_file]

use std::error::Error;

use shotsplit::{FlagSource, FrameStream, PipelineOptions};
use tokio_stream::StreamExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let flags = match std::env::args().nth(1) {
        Some(path) => FlagSource::from_path(path)?,
        None => FlagSource::new((0..120).map(|index| index % 30 == 29).collect()),
    };

    let options = PipelineOptions::new().with_prefetch_depth(12);
    let mut stream = FrameStream::with_options(flags, &options)?;
    println!("Streaming {} frame(s)...", stream.frame_count());

    let mut boundaries = Vec::new();
    while let Some(result) = stream.next().await {
        let frame = result?;
        if frame.boundary {
            boundaries.push(frame.index);
        }
    }

    println!("Raw boundary flags at {boundaries:?}");
    println!("Done!");
    Ok(())
}
