//! On-demand mono sample buffer fed from a [`SampleStream`].
//!
//! Lock order: `stream` is only ever taken by writers, and a writer may take
//! the `samples` write lock while holding it. Readers take `samples` alone.

use parking_lot::{MappedRwLockReadGuard, Mutex, RwLock, RwLockReadGuard};

use super::stream::SampleStream;
use crate::error::Result;

/// Frames requested from the stream per pull.
pub const DEFAULT_BATCH_FRAMES: usize = 1024;

/// Result of [`SampleAccumulator::ensure_available`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Availability {
    /// The buffer holds at least the requested number of samples.
    Reached,
    /// The stream ended first; only `available` samples exist.
    Exhausted { available: usize },
}

pub struct SampleAccumulator {
    samples: RwLock<Vec<f64>>,
    stream: Mutex<Option<Box<dyn SampleStream>>>,
    sample_rate: u32,
    channels: usize,
    total_frames: u64,
    batch_frames: usize,
}

impl SampleAccumulator {
    pub fn new(stream: Box<dyn SampleStream>) -> Self {
        Self::with_batch_frames(stream, DEFAULT_BATCH_FRAMES)
    }

    pub fn with_batch_frames(stream: Box<dyn SampleStream>, batch_frames: usize) -> Self {
        let sample_rate = stream.sample_rate();
        let channels = stream.channels().max(1);
        let total_frames = stream.total_frames();
        Self {
            samples: RwLock::new(Vec::new()),
            stream: Mutex::new(Some(stream)),
            sample_rate,
            channels,
            total_frames,
            batch_frames: batch_frames.max(1),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frame count reported by the stream when it was opened.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Number of mono samples decoded so far.
    pub fn len(&self) -> usize {
        self.samples.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the stream has been drained and released.
    pub fn is_exhausted(&self) -> bool {
        self.stream.lock().is_none()
    }

    /// Pull batches until at least `upto` samples are buffered or the stream ends.
    pub fn ensure_available(&self, upto: usize) -> Result<Availability> {
        let mut stream_slot = self.stream.lock();

        let mut interleaved = Vec::with_capacity(self.batch_frames * self.channels);
        let mut mono = Vec::with_capacity(self.batch_frames);

        loop {
            let available = self.len();
            if available >= upto {
                return Ok(Availability::Reached);
            }

            let Some(stream) = stream_slot.as_mut() else {
                return Ok(Availability::Exhausted { available });
            };

            let pull = stream.pull(self.batch_frames, &mut interleaved)?;

            mono.clear();
            mono.extend(
                interleaved
                    .chunks_exact(self.channels)
                    .take(pull.frames)
                    .map(|frame| frame.iter().map(|&s| s as f64).sum::<f64>()),
            );
            self.samples.write().extend_from_slice(&mono);

            if pull.exhausted {
                let available = self.len();
                log::debug!(
                    "Sample stream exhausted after {} samples ({} announced)",
                    available,
                    self.total_frames
                );
                *stream_slot = None;
                if available < upto {
                    return Ok(Availability::Exhausted { available });
                }
                return Ok(Availability::Reached);
            }
        }
    }

    /// Read-only view of `[start, end)`. Callers must have made `end` available first.
    ///
    /// # Panics
    ///
    /// Panics if `start > end` or `end` is beyond the buffered samples.
    pub fn slice(&self, start: usize, end: usize) -> MappedRwLockReadGuard<'_, [f64]> {
        RwLockReadGuard::map(self.samples.read(), |samples| &samples[start..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::stream::{MemoryStream, Pull};
    use crate::error::Error;

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| (i % 100) as f32 / 100.0).collect()
    }

    #[test]
    fn grows_only_to_batch_granularity() {
        let acc = SampleAccumulator::with_batch_frames(Box::new(MemoryStream::mono(ramp(5000), 8000)), 256);
        assert!(acc.is_empty());

        assert_eq!(acc.ensure_available(10).unwrap(), Availability::Reached);
        assert_eq!(acc.len(), 256);

        assert_eq!(acc.ensure_available(600).unwrap(), Availability::Reached);
        assert_eq!(acc.len(), 768);
        assert!(!acc.is_exhausted());
    }

    #[test]
    fn reports_exhaustion_and_releases_stream() {
        let acc = SampleAccumulator::with_batch_frames(Box::new(MemoryStream::mono(ramp(1000), 8000)), 256);

        let status = acc.ensure_available(4000).unwrap();
        assert_eq!(status, Availability::Exhausted { available: 1000 });
        assert!(acc.is_exhausted());

        // Answers from the buffer once the stream is gone.
        assert_eq!(acc.ensure_available(900).unwrap(), Availability::Reached);
        assert_eq!(
            acc.ensure_available(1001).unwrap(),
            Availability::Exhausted { available: 1000 }
        );
    }

    #[test]
    fn length_never_decreases() {
        let acc = SampleAccumulator::with_batch_frames(Box::new(MemoryStream::mono(ramp(3000), 8000)), 100);
        let mut last = 0;
        for target in [50, 10, 700, 300, 0, 2999, 5000, 1] {
            acc.ensure_available(target).unwrap();
            let len = acc.len();
            assert!(len >= last, "length shrank from {last} to {len}");
            last = len;
        }
        assert_eq!(last, 3000);
    }

    #[test]
    fn downmixes_by_summing_channels() {
        let interleaved = vec![0.25, 0.5, -0.5, 0.25, 1.0, 1.0];
        let acc = SampleAccumulator::new(Box::new(MemoryStream::new(interleaved, 2, 8000)));
        acc.ensure_available(3).unwrap();
        let view = acc.slice(0, 3);
        assert_eq!(&*view, &[0.75, -0.25, 2.0]);
    }

    #[test]
    fn exact_multiple_of_batch_reaches_target() {
        let acc = SampleAccumulator::with_batch_frames(Box::new(MemoryStream::mono(ramp(512), 8000)), 256);
        assert_eq!(acc.ensure_available(512).unwrap(), Availability::Reached);
        assert_eq!(acc.slice(500, 512).len(), 12);
    }

    struct FailingStream {
        good_frames: usize,
    }

    impl SampleStream for FailingStream {
        fn sample_rate(&self) -> u32 {
            8000
        }

        fn channels(&self) -> usize {
            1
        }

        fn total_frames(&self) -> u64 {
            10_000
        }

        fn pull(&mut self, max_frames: usize, out: &mut Vec<f32>) -> Result<Pull> {
            if self.good_frames == 0 {
                return Err(Error::Decode(symphonia::core::errors::Error::DecodeError("corrupt frame")));
            }
            let frames = max_frames.min(self.good_frames);
            self.good_frames -= frames;
            out.clear();
            out.resize(frames, 0.1);
            Ok(Pull { frames, exhausted: false })
        }
    }

    #[test]
    fn decode_error_keeps_buffered_samples() {
        let acc = SampleAccumulator::with_batch_frames(Box::new(FailingStream { good_frames: 300 }), 100);
        let err = acc.ensure_available(1000).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert_eq!(acc.len(), 300);
    }
}
