//! The analysis sweep: one spectrum and one piano-roll strip per instant.
//!
//! Batch and progressively-reported runs share [`AnalysisDriver::run`]; they
//! differ only in the sink they report to and whether the canvas is
//! checkpointed to disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use super::accumulator::{Availability, SampleAccumulator};
use super::pitch::PitchTable;
use super::progress::{NoProgress, Outcome, ProgressSink};
use super::spectrum::{compute_spectrum, Spectrum, DEFAULT_CYCLES};
use super::stream::SampleStream;
use super::timeline::{Progress, RunState, Timeline};
use crate::error::{Error, Result};
use crate::render::canvas::PianoRoll;
use crate::render::keyboard::KeyboardLayout;
use crate::render::strip::{render_strip, StripStyle};

const NANOS_PER_SEC: u128 = 1_000_000_000;

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_CHECKPOINT_EVERY: usize = 10;

#[derive(Clone, Debug)]
pub struct AnalysisSettings {
    /// Time between analysed instants.
    pub spacing: Duration,
    /// Length of audio each instant looks at.
    pub window: Duration,
    /// Periods of each pitch spanned by its correlation.
    pub cycles: f64,
    /// Canvas width in pixels.
    pub width: u32,
    pub strip: StripStyle,
    /// Asynchronous runs save the canvas after this many instants. 0 disables.
    pub checkpoint_every: usize,
    /// Destination of checkpoints and the final image in asynchronous runs.
    pub output: Option<PathBuf>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            spacing: Duration::from_secs(1),
            window: Duration::from_millis(100),
            cycles: DEFAULT_CYCLES,
            width: DEFAULT_WIDTH,
            strip: StripStyle::default(),
            checkpoint_every: DEFAULT_CHECKPOINT_EVERY,
            output: None,
        }
    }
}

impl AnalysisSettings {
    pub fn validate(&self) -> Result<()> {
        if self.spacing.is_zero() {
            return Err(Error::InvalidSettings("spacing must be positive".into()));
        }
        if self.window.is_zero() {
            return Err(Error::InvalidSettings("window must be positive".into()));
        }
        if !(self.cycles.is_finite() && self.cycles > 0.0) {
            return Err(Error::InvalidSettings(format!("cycles must be positive, got {}", self.cycles)));
        }
        if self.width == 0 || self.strip.height == 0 {
            return Err(Error::InvalidSettings("canvas width and strip height must be positive".into()));
        }
        if self.strip.magnitude_floor < 0.0 {
            return Err(Error::InvalidSettings("magnitude floor must not be negative".into()));
        }
        Ok(())
    }
}

/// Number of samples covering `duration` at `sample_rate`, rounded down.
fn samples_in(duration: Duration, sample_rate: u32) -> u128 {
    duration.as_nanos() * sample_rate as u128 / NANOS_PER_SEC
}

/// Drives one analysis run over a single stream.
pub struct AnalysisDriver {
    settings: AnalysisSettings,
    pitches: Arc<PitchTable>,
    layout: Arc<KeyboardLayout>,
    accumulator: SampleAccumulator,
    timeline: Arc<Timeline>,
    canvas: Arc<PianoRoll>,
    window_samples: usize,
    duration: Duration,
}

impl AnalysisDriver {
    pub fn new(stream: Box<dyn SampleStream>, settings: AnalysisSettings) -> Result<Self> {
        Self::with_pitches(stream, settings, Arc::new(PitchTable::new()))
    }

    pub fn with_pitches(
        stream: Box<dyn SampleStream>,
        settings: AnalysisSettings,
        pitches: Arc<PitchTable>,
    ) -> Result<Self> {
        settings.validate()?;
        let sample_rate = stream.sample_rate();
        if sample_rate == 0 {
            return Err(Error::Unsupported("stream reports a sample rate of 0".into()));
        }

        let accumulator = SampleAccumulator::new(stream);
        let duration_ns = accumulator.total_frames() as u128 * NANOS_PER_SEC / sample_rate as u128;
        let duration = Duration::from_nanos(duration_ns.min(u64::MAX as u128) as u64);
        let expected = usize::try_from(duration_ns / settings.spacing.as_nanos())
            .ok()
            .and_then(|n| n.checked_add(1))
            .ok_or_else(|| Error::InvalidSettings(format!("spacing {:?} is too small", settings.spacing)))?;
        // A window longer than the audio sees the whole file anyway.
        let longest = accumulator.total_frames().max(1) as u128;
        let window_samples = samples_in(settings.window, sample_rate).clamp(1, longest);
        let window_samples = usize::try_from(window_samples)
            .map_err(|_| Error::InvalidSettings(format!("window {:?} is too long", settings.window)))?;

        let layout = Arc::new(KeyboardLayout::new(&pitches, settings.width));
        let canvas = Arc::new(PianoRoll::new(settings.width, settings.strip.height, expected)?);

        log::info!(
            "Analysis plan: {:.1}s of audio, {} instants every {:?}, window {} samples, canvas {}x{}",
            duration.as_secs_f64(),
            expected,
            settings.spacing,
            window_samples,
            canvas.width(),
            canvas.height()
        );

        Ok(Self {
            settings,
            pitches,
            layout,
            accumulator,
            timeline: Arc::new(Timeline::new(expected)),
            canvas,
            window_samples,
            duration,
        })
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    pub fn pitches(&self) -> Arc<PitchTable> {
        Arc::clone(&self.pitches)
    }

    pub fn layout(&self) -> Arc<KeyboardLayout> {
        Arc::clone(&self.layout)
    }

    pub fn timeline(&self) -> Arc<Timeline> {
        Arc::clone(&self.timeline)
    }

    pub fn canvas(&self) -> Arc<PianoRoll> {
        Arc::clone(&self.canvas)
    }

    pub fn sample_rate(&self) -> u32 {
        self.accumulator.sample_rate()
    }

    /// Length of the audio as announced by the stream.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn expected_instants(&self) -> usize {
        self.timeline.expected()
    }

    /// Analyse the whole file on the calling thread and return every spectrum.
    pub fn run_sync(&self) -> Result<Vec<Arc<Spectrum>>> {
        self.run(&mut NoProgress, None)?;
        Ok(self.timeline.snapshot())
    }

    /// Analyse on a dedicated worker thread, reporting to `sink`.
    ///
    /// With an output path configured, the canvas is checkpointed every
    /// `checkpoint_every` instants and saved once more on completion.
    pub fn run_async<S>(self, sink: S) -> Result<AnalysisHandle>
    where
        S: ProgressSink + Send + 'static,
    {
        let timeline = self.timeline();
        let canvas = self.canvas();
        let thread = std::thread::Builder::new()
            .name("musicroll-analysis".into())
            .spawn(move || {
                let mut sink = sink;
                let output = self.settings.output.clone();
                self.run(&mut sink, output.as_deref())
            })?;

        Ok(AnalysisHandle {
            timeline,
            canvas,
            thread,
        })
    }

    /// Run the sweep once. `checkpoint` enables periodic and final PNG saves.
    pub fn run(&self, sink: &mut dyn ProgressSink, checkpoint: Option<&Path>) -> Result<()> {
        self.timeline.begin()?;

        if let Err(err) = self.sweep(sink, checkpoint) {
            self.timeline.finish(RunState::Failed);
            log::error!(
                "Analysis failed after {} of {} instants: {}",
                self.timeline.len(),
                self.timeline.expected(),
                err
            );
            if let Some(path) = checkpoint {
                self.write_checkpoint(path, &self.timeline.progress());
            }
            sink.finished(&Outcome::Failed(err.to_string()));
            return Err(err);
        }
        self.timeline.finish(RunState::Completed);

        if let Some(path) = checkpoint {
            if let Err(err) = self.canvas.save_png(path) {
                log::error!("Failed to write piano roll to {}: {}", path.display(), err);
                sink.finished(&Outcome::Failed(err.to_string()));
                return Err(err);
            }
            log::info!("Saved piano roll to {}", path.display());
        }

        sink.finished(&Outcome::Completed);
        Ok(())
    }

    fn sweep(&self, sink: &mut dyn ProgressSink, checkpoint: Option<&Path>) -> Result<()> {
        let expected = self.timeline.expected();
        let spacing_ns = self.settings.spacing.as_nanos();
        let sample_rate = self.sample_rate() as u128;

        for index in 0..expected {
            let offset_ns = spacing_ns * index as u128;
            let start = (offset_ns * sample_rate / NANOS_PER_SEC) as usize;
            let time = offset_ns as f64 / NANOS_PER_SEC as f64;

            let spectrum = self.analyse_window(start, time)?;
            let strip = render_strip(&spectrum, &self.pitches, &self.layout, &self.settings.strip);
            self.canvas.composite(&strip, index);
            let progress = self.timeline.push(spectrum);
            sink.progress(&progress);

            let done = index + 1;
            let every = self.settings.checkpoint_every;
            if let Some(path) = checkpoint {
                if every > 0 && done % every == 0 && done < expected {
                    self.write_checkpoint(path, &progress);
                }
            }
        }
        Ok(())
    }

    /// Spectrum of the window starting at `start`, clamped to the decoded audio.
    fn analyse_window(&self, start: usize, time: f64) -> Result<Spectrum> {
        let wanted_end = start.saturating_add(self.window_samples);
        let end = match self.accumulator.ensure_available(wanted_end)? {
            Availability::Reached => wanted_end,
            Availability::Exhausted { available } => {
                log::debug!(
                    "Window at {:.3}s wants samples up to {} but only {} exist",
                    time,
                    wanted_end,
                    available
                );
                available
            }
        };
        // Slide a truncated window back so it still covers a full window where possible.
        let start = start.min(end.saturating_sub(self.window_samples));

        let samples = self.accumulator.slice(start, end);
        Ok(compute_spectrum(
            &self.pitches,
            &samples,
            self.sample_rate(),
            self.settings.cycles,
            time,
        ))
    }

    fn write_checkpoint(&self, path: &Path, progress: &Progress) {
        match self.canvas.save_png(path) {
            Ok(()) => log::debug!("Checkpoint at {} written to {}", progress, path.display()),
            Err(err) => log::warn!("Checkpoint to {} failed: {}", path.display(), err),
        }
    }
}

/// A run executing on its worker thread.
pub struct AnalysisHandle {
    timeline: Arc<Timeline>,
    canvas: Arc<PianoRoll>,
    thread: JoinHandle<Result<()>>,
}

impl AnalysisHandle {
    pub fn timeline(&self) -> Arc<Timeline> {
        Arc::clone(&self.timeline)
    }

    pub fn canvas(&self) -> Arc<PianoRoll> {
        Arc::clone(&self.canvas)
    }

    pub fn progress(&self) -> Progress {
        self.timeline.progress()
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the worker and return the run's result.
    pub fn join(self) -> Result<()> {
        self.thread.join().map_err(|_| Error::WorkerPanicked)?
    }
}
