//! Blocking frame decoders and the sources built from them.
//!
//! Most frame producers are naturally written as a blocking "decode frame
//! `i`" function. [`FrameDecoder`] captures that shape, and adapters turn a
//! decoder into a [`FrameSource`]:
//!
//! - [`InlineSource`] decodes inside [`FrameSource::request`]. Nothing
//!   overlaps, which makes it the reference behavior for tests.
//! - [`PooledSource`](crate::PooledSource) (feature `rayon`) decodes on a
//!   dedicated thread pool so that prefetched requests genuinely overlap.
//!
//! [`FlagSource`] is a decoder whose frames are nothing but boundary flags,
//! loaded from a list, a text file, or a JSON array.

use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::error::ShotsplitError;
use crate::frame::{Frame, FrameSource, MarkedFrame, PendingFrame};

/// Blocking, per-index frame production.
///
/// `decode` may be called concurrently from several threads for different
/// indices.
pub trait FrameDecoder: Send + Sync + 'static {
    /// The frame type produced by this decoder.
    type Frame: Frame + Send + 'static;

    /// Total number of frames.
    fn frame_count(&self) -> u64;

    /// Produce frame `index`, or a human-readable failure reason.
    fn decode(&self, index: u64) -> Result<Self::Frame, String>;
}

impl<D: FrameDecoder> FrameDecoder for Arc<D> {
    type Frame = D::Frame;

    fn frame_count(&self) -> u64 {
        (**self).frame_count()
    }

    fn decode(&self, index: u64) -> Result<Self::Frame, String> {
        (**self).decode(index)
    }
}

/// A [`FrameSource`] that decodes synchronously at request time.
#[derive(Debug, Clone)]
pub struct InlineSource<D> {
    decoder: D,
}

impl<D: FrameDecoder> InlineSource<D> {
    /// Wrap a decoder.
    pub fn new(decoder: D) -> Self {
        Self { decoder }
    }

    /// Borrow the wrapped decoder.
    pub fn decoder(&self) -> &D {
        &self.decoder
    }
}

impl<D: FrameDecoder> FrameSource for InlineSource<D> {
    type Frame = D::Frame;

    fn frame_count(&self) -> u64 {
        self.decoder.frame_count()
    }

    fn request(&self, index: u64) -> PendingFrame<Self::Frame> {
        match self.decoder.decode(index) {
            Ok(frame) => PendingFrame::ready(frame),
            Err(reason) => PendingFrame::failed(reason),
        }
    }
}

/// Frames synthesized from a list of raw boundary flags.
///
/// Frame `i` is a [`MarkedFrame`] with `index = i`, `boundary = flags[i]` and
/// an empty payload. Useful for running the segmentation pipeline over
/// boundary signals computed elsewhere.
///
/// # Example
///
/// ```
/// use shotsplit::{FlagSource, FrameDecoder};
///
/// let source = FlagSource::parse("0 1 1\n# fade\n0 0")?;
/// assert_eq!(source.frame_count(), 5);
/// assert_eq!(source.flags(), &[false, true, true, false, false]);
/// # Ok::<(), shotsplit::ShotsplitError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSource {
    flags: Vec<bool>,
}

impl FlagSource {
    /// Build a source from flags.
    pub fn new(flags: Vec<bool>) -> Self {
        Self { flags }
    }

    /// Parse flags from text.
    ///
    /// Accepts either a JSON array of booleans or `0`/`1` integers, or a
    /// list of `0`, `1`, `true`, `false` tokens separated by whitespace or
    /// commas. Lines starting with `#` are ignored in the token form.
    pub fn parse(text: &str) -> Result<Self, ShotsplitError> {
        let trimmed = text.trim_start();
        if trimmed.starts_with('[') {
            return Self::parse_json(trimmed);
        }

        let mut flags = Vec::new();
        for (line_number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            for token in line
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|token| !token.is_empty())
            {
                let flag = parse_flag_token(token).ok_or_else(|| {
                    ShotsplitError::InvalidInput(format!(
                        "unrecognized boundary flag '{token}' on line {}",
                        line_number + 1
                    ))
                })?;
                flags.push(flag);
            }
        }

        Ok(Self { flags })
    }

    /// Read and parse flags from any reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, ShotsplitError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::parse(&text)
    }

    /// Read and parse flags from a file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ShotsplitError> {
        let path = path.as_ref();
        log::debug!("Loading boundary flags from {}", path.display());
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// The raw flags.
    pub fn flags(&self) -> &[bool] {
        &self.flags
    }

    fn parse_json(text: &str) -> Result<Self, ShotsplitError> {
        let values: Vec<Value> = serde_json::from_str(text)?;
        let flags = values
            .iter()
            .enumerate()
            .map(|(position, value)| match value {
                Value::Bool(flag) => Ok(*flag),
                Value::Number(number) => match number.as_u64() {
                    Some(0) => Ok(false),
                    Some(1) => Ok(true),
                    _ => Err(ShotsplitError::InvalidInput(format!(
                        "boundary flag at position {position} must be 0 or 1, got {number}"
                    ))),
                },
                other => Err(ShotsplitError::InvalidInput(format!(
                    "boundary flag at position {position} must be a boolean or 0/1, got {other}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { flags })
    }
}

impl From<Vec<bool>> for FlagSource {
    fn from(flags: Vec<bool>) -> Self {
        Self::new(flags)
    }
}

impl FrameDecoder for FlagSource {
    type Frame = MarkedFrame<()>;

    fn frame_count(&self) -> u64 {
        self.flags.len() as u64
    }

    fn decode(&self, index: u64) -> Result<Self::Frame, String> {
        usize::try_from(index)
            .ok()
            .and_then(|position| self.flags.get(position))
            .map(|&flag| MarkedFrame::new(index, flag, ()))
            .ok_or_else(|| {
                format!(
                    "frame {index} is out of range (source has {} frames)",
                    self.flags.len()
                )
            })
    }
}

fn parse_flag_token(token: &str) -> Option<bool> {
    match token.to_ascii_lowercase().as_str() {
        "0" | "false" => Some(false),
        "1" | "true" => Some(true),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::parse_flag_token;

    #[test]
    fn flag_tokens() {
        assert_eq!(parse_flag_token("0"), Some(false));
        assert_eq!(parse_flag_token("1"), Some(true));
        assert_eq!(parse_flag_token("TRUE"), Some(true));
        assert_eq!(parse_flag_token("False"), Some(false));
        assert_eq!(parse_flag_token("2"), None);
        assert_eq!(parse_flag_token("yes"), None);
    }
}
