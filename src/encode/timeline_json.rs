use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::audio::pitch::{Pitch, PitchTable};
use crate::audio::spectrum::Spectrum;
use crate::error::Result;

#[derive(Serialize)]
struct TimelineDocument<'a> {
    sample_rate: u32,
    spacing_ms: f64,
    window_ms: f64,
    cycles: f64,
    pitches: &'a [Pitch],
    spectra: Vec<&'a Spectrum>,
}

/// Parameters recorded alongside exported spectra.
#[derive(Clone, Copy, Debug)]
pub struct ExportInfo {
    pub sample_rate: u32,
    pub spacing_ms: f64,
    pub window_ms: f64,
    pub cycles: f64,
}

pub fn to_json(pitches: &PitchTable, info: &ExportInfo, spectra: &[Arc<Spectrum>]) -> Result<String> {
    let doc = TimelineDocument {
        sample_rate: info.sample_rate,
        spacing_ms: info.spacing_ms,
        window_ms: info.window_ms,
        cycles: info.cycles,
        pitches: pitches.as_slice(),
        spectra: spectra.iter().map(|s| s.as_ref()).collect(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

pub fn write_timeline(
    path: &Path,
    pitches: &PitchTable,
    info: &ExportInfo,
    spectra: &[Arc<Spectrum>],
) -> Result<()> {
    let json = to_json(pitches, info, spectra)?;
    super::png::write_atomic(path, json.as_bytes())?;
    log::info!("Wrote {} spectra to {}", spectra.len(), path.display());
    Ok(())
}
