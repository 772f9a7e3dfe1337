//! Per-pitch targeted DFT.
//!
//! Each pitch is measured by correlating the window against a single complex
//! exponential spanning a fixed number of that pitch's periods, so low pitches
//! see a longer slice of audio than high ones.

use rayon::prelude::*;
use rustfft::num_complex::Complex;
use serde::Serialize;

use super::pitch::PitchTable;

/// Periods of the target frequency each correlation spans.
pub const DEFAULT_CYCLES: f64 = 25.0;

/// Magnitudes of every pitch at one instant.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Spectrum {
    /// Elapsed time of the instant in seconds.
    pub time: f64,
    /// One magnitude per pitch, in table order.
    pub magnitudes: Vec<f64>,
}

impl Spectrum {
    pub fn magnitude(&self, index: usize) -> Option<f64> {
        self.magnitudes.get(index).copied()
    }

    pub fn magnitude_of(&self, pitches: &PitchTable, name: &str) -> Option<f64> {
        pitches.index_of(name).and_then(|i| self.magnitude(i))
    }

    /// Largest magnitude, 0 for an empty spectrum.
    pub fn max(&self) -> f64 {
        self.magnitudes.iter().copied().fold(0.0, f64::max)
    }

    /// Index of the loudest pitch. The first wins on ties.
    pub fn peak(&self) -> Option<usize> {
        self.magnitudes
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, &m)| match best {
                Some((_, b)) if b >= m => best,
                _ => Some((i, m)),
            })
            .map(|(i, _)| i)
    }
}

/// Magnitude of `frequency` in `samples`, measured over `cycles` of its periods.
///
/// The window is N = floor(sample_rate * cycles / frequency) samples. When
/// fewer samples are available N is clamped and the cycle count becomes the
/// (possibly fractional) number of periods that still fit.
pub fn target_dft(samples: &[f64], frequency: f64, sample_rate: f64, cycles: f64) -> f64 {
    let period = sample_rate / frequency;
    let mut n = (sample_rate * cycles / frequency).floor() as usize;
    let mut k = cycles;

    if n > samples.len() {
        n = samples.len();
        k = n as f64 / period;
    }
    if n == 0 {
        return 0.0;
    }

    let step = -2.0 * std::f64::consts::PI * k / n as f64;
    let sum: Complex<f64> = samples[..n]
        .iter()
        .enumerate()
        .map(|(i, &x)| Complex::from_polar(x, step * i as f64))
        .sum();

    sum.norm() / n as f64
}

/// Run [`target_dft`] for every pitch of the table.
pub fn compute_spectrum(
    pitches: &PitchTable,
    samples: &[f64],
    sample_rate: u32,
    cycles: f64,
    time: f64,
) -> Spectrum {
    let sample_rate = sample_rate as f64;
    let magnitudes = pitches
        .as_slice()
        .par_iter()
        .map(|pitch| target_dft(samples, pitch.frequency, sample_rate, cycles))
        .collect();

    Spectrum { time, magnitudes }
}
