//! Piano-roll analysis of audio files.
//!
//! A decoded stream is swept at fixed instants. Each instant yields a
//! [`Spectrum`] over the 88 piano pitches and one horizontal strip of a
//! growing PNG canvas, with the first instant at the bottom.
//!
//! ```no_run
//! use musicroll::{AnalysisDriver, AnalysisSettings, DecodedStream};
//!
//! # fn main() -> musicroll::Result<()> {
//! let stream = DecodedStream::open("song.mp3".as_ref())?;
//! let driver = AnalysisDriver::new(Box::new(stream), AnalysisSettings::default())?;
//! let spectra = driver.run_sync()?;
//! driver.canvas().save_png("song.png".as_ref())?;
//! println!("{} instants", spectra.len());
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod encode;
pub mod error;
pub mod render;

pub use audio::accumulator::{Availability, SampleAccumulator};
pub use audio::analysis::{AnalysisDriver, AnalysisHandle, AnalysisSettings};
pub use audio::decode::DecodedStream;
pub use audio::pitch::{Pitch, PitchTable};
pub use audio::progress::{progress_channel, ChannelSink, NoProgress, Outcome, ProgressEvent, ProgressSink};
pub use audio::spectrum::{compute_spectrum, target_dft, Spectrum};
pub use audio::stream::{is_supported_audio, MemoryStream, Pull, SampleStream};
pub use audio::timeline::{Progress, RunState, Timeline};
pub use error::{Error, Result};
pub use render::canvas::{PianoRoll, RgbaImage};
pub use render::keyboard::KeyboardLayout;
pub use render::strip::StripStyle;
