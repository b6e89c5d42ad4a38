//! FrameStream tests (feature = "async").

#![cfg(feature = "async")]

use std::thread;
use std::time::Duration;

use shotsplit::{
    CancellationToken, FlagSource, FrameDecoder, FrameStream, MarkedFrame, PipelineOptions,
    ShotsplitError,
};
use tokio_stream::StreamExt;

/// Earlier frames take longer to decode.
struct ReversedLatency {
    frames: u64,
}

impl FrameDecoder for ReversedLatency {
    type Frame = MarkedFrame<()>;

    fn frame_count(&self) -> u64 {
        self.frames
    }

    fn decode(&self, index: u64) -> Result<Self::Frame, String> {
        thread::sleep(Duration::from_millis(2 * (self.frames - index)));
        if index == 3 {
            return Err("bad frame".to_string());
        }
        Ok(MarkedFrame::new(index, false, ()))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stream_yields_in_order() {
    let mut stream = FrameStream::new(FlagSource::new(vec![false; 20]), 4).unwrap();
    assert_eq!(stream.frame_count(), 20);
    assert!(stream.in_flight() <= 4);

    let mut indices = Vec::new();
    while let Some(frame) = stream.next().await {
        indices.push(frame.unwrap().index);
        assert!(stream.in_flight() <= 4);
    }
    assert_eq!(indices, (0..20).collect::<Vec<_>>());
}

#[tokio::test]
async fn stream_reorders_and_reports_failures() {
    let mut stream = FrameStream::new(ReversedLatency { frames: 6 }, 6).unwrap();

    let mut results = Vec::new();
    while let Some(result) = stream.next().await {
        results.push(result);
    }

    assert_eq!(results.len(), 6);
    for (position, result) in results.iter().enumerate() {
        match result {
            Ok(frame) => assert_eq!(frame.index, position as u64),
            Err(error) => assert_eq!(error.frame_index(), Some(3)),
        }
    }
    assert!(results[3].is_err());
}

#[tokio::test]
async fn huge_depth_is_sized_by_stream() {
    let mut stream = FrameStream::new(FlagSource::new(vec![false; 3]), usize::MAX / 2).unwrap();
    assert_eq!(stream.in_flight(), 3);

    let mut indices = Vec::new();
    while let Some(frame) = stream.next().await {
        indices.push(frame.unwrap().index);
    }
    assert_eq!(indices, vec![0, 1, 2]);
}

#[tokio::test]
async fn empty_stream_finishes() {
    let mut stream = FrameStream::new(FlagSource::new(Vec::new()), 4).unwrap();
    assert!(stream.next().await.is_none());
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn cancelled_stream_stops() {
    let token = CancellationToken::new();
    let options = PipelineOptions::new()
        .with_prefetch_depth(2)
        .with_cancellation(token.clone());
    let mut stream = FrameStream::with_options(FlagSource::new(vec![false; 10]), &options).unwrap();

    stream.next().await.unwrap().unwrap();
    token.cancel();

    assert!(matches!(
        stream.next().await,
        Some(Err(ShotsplitError::Cancelled))
    ));
    assert!(stream.next().await.is_none());
}

#[test]
fn stream_requires_runtime() {
    let result = FrameStream::new(FlagSource::new(vec![false]), 1);
    assert!(matches!(
        result,
        Err(ShotsplitError::InvalidConfiguration(_))
    ));
}
