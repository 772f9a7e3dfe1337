//! Pull-based sources of decoded PCM frames.

use std::path::Path;

use crate::error::Result;

/// Outcome of one [`SampleStream::pull`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pull {
    /// Frames written to the output buffer.
    pub frames: usize,
    /// The stream has no frames left. Set on any pull that returned fewer
    /// frames than requested.
    pub exhausted: bool,
}

/// A sequential source of interleaved PCM frames with channel values in [-1, 1].
pub trait SampleStream: Send {
    fn sample_rate(&self) -> u32;

    fn channels(&self) -> usize;

    /// Total number of frames the stream will yield.
    fn total_frames(&self) -> u64;

    /// Replace `out` with up to `max_frames` interleaved frames.
    fn pull(&mut self, max_frames: usize, out: &mut Vec<f32>) -> Result<Pull>;
}

/// An in-memory stream over interleaved samples.
pub struct MemoryStream {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
    cursor: usize,
}

impl MemoryStream {
    pub fn new(samples: Vec<f32>, channels: usize, sample_rate: u32) -> Self {
        let channels = channels.max(1);
        // Drop a trailing partial frame.
        let whole = samples.len() / channels * channels;
        let mut samples = samples;
        samples.truncate(whole);
        Self {
            samples,
            channels,
            sample_rate,
            cursor: 0,
        }
    }

    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(samples, 1, sample_rate)
    }
}

impl SampleStream for MemoryStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn total_frames(&self) -> u64 {
        (self.samples.len() / self.channels) as u64
    }

    fn pull(&mut self, max_frames: usize, out: &mut Vec<f32>) -> Result<Pull> {
        out.clear();
        let remaining = (self.samples.len() - self.cursor) / self.channels;
        let frames = remaining.min(max_frames);
        let end = self.cursor + frames * self.channels;
        out.extend_from_slice(&self.samples[self.cursor..end]);
        self.cursor = end;
        Ok(Pull {
            frames,
            exhausted: frames < max_frames,
        })
    }
}

const SUPPORTED_EXTENSIONS: &[&str] = &["wav", "mp3", "ogg", "flac"];

/// Whether the file extension names a container the decoder handles.
pub fn is_supported_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}
