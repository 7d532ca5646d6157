//! Frame input.
//!
//! The upstream vision pipeline (camera, board detection, warping, the
//! classifier CNN) lives outside this program; all that crosses the boundary
//! is a stream of 8x8x13 probability tensors in raw camera orientation.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};
use kingsight_engine::observation::TENSOR_LEN;

/// Pull-based source of raw probability frames.
pub trait FrameSource {
    /// The next frame, or `None` once the stream ends.
    fn next_frame(&mut self) -> Result<Option<Vec<f32>>>;
}

/// Reads whitespace-separated floats, 832 per frame, from any buffered
/// reader. Frames may span lines arbitrarily.
pub struct StreamFrameSource<R> {
    reader: R,
    pending: Vec<f32>,
}

impl<R: BufRead> StreamFrameSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: Vec::with_capacity(TENSOR_LEN),
        }
    }
}

impl<R: BufRead> FrameSource for StreamFrameSource<R> {
    fn next_frame(&mut self) -> Result<Option<Vec<f32>>> {
        let mut line = String::new();

        while self.pending.len() < TENSOR_LEN {
            line.clear();
            let read = self
                .reader
                .read_line(&mut line)
                .context("reading frame stream")?;

            if read == 0 {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                bail!(
                    "frame stream ended mid-frame ({} of {TENSOR_LEN} values)",
                    self.pending.len()
                );
            }

            for token in line.split_whitespace() {
                let value: f32 = token
                    .parse()
                    .with_context(|| format!("invalid frame value {token:?}"))?;
                self.pending.push(value);
            }
        }

        Ok(Some(self.pending.drain(..TENSOR_LEN).collect()))
    }
}

/// Opens the frame stream named on the command line, falling back to stdin.
pub fn open(path: Option<&Path>) -> Result<Box<dyn FrameSource>> {
    Ok(match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening frame file {}", path.display()))?;
            Box::new(StreamFrameSource::new(BufReader::new(file)))
        }
        None => Box::new(StreamFrameSource::new(BufReader::new(io::stdin()))),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    fn frame_text(value: f32, count: usize) -> String {
        vec![value.to_string(); count].join(" ")
    }

    #[test]
    fn reads_consecutive_frames() {
        let text = format!(
            "{}\n{}\n",
            frame_text(0.25, TENSOR_LEN),
            frame_text(0.5, TENSOR_LEN)
        );
        let mut source = StreamFrameSource::new(Cursor::new(text));

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.len(), TENSOR_LEN);
        assert_eq!(first[0], 0.25);

        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(second[0], 0.5);

        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn frames_may_span_lines() {
        let tokens = frame_text(1.0, TENSOR_LEN);
        let tokens: Vec<&str> = tokens.split(' ').collect();

        let mut text = String::new();
        for chunk in tokens.chunks(100) {
            text.push_str(&chunk.join(" "));
            text.push('\n');
        }

        let mut source = StreamFrameSource::new(Cursor::new(text));
        assert_eq!(source.next_frame().unwrap().unwrap().len(), TENSOR_LEN);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn truncated_frames_are_errors() {
        let text = frame_text(0.1, 100);
        let mut source = StreamFrameSource::new(Cursor::new(text));
        assert!(source.next_frame().is_err());
    }

    #[test]
    fn garbage_tokens_are_errors() {
        let mut source = StreamFrameSource::new(Cursor::new("0.5 banana 0.25"));
        assert!(source.next_frame().is_err());
    }
}
