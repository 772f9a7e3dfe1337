//! The 88 equal-tempered piano pitches, A0 through C8.

use serde::Serialize;

pub const PITCH_COUNT: usize = 88;

/// 1-based position of A4 in the table.
pub const A4_POSITION: usize = 49;
pub const A4_FREQUENCY: f64 = 440.0;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// MIDI note number of the first piano key (A0).
const FIRST_MIDI_NOTE: usize = 21;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Pitch {
    /// 1-based key position, A0 = 1.
    pub position: usize,
    pub name: String,
    pub frequency: f64,
    /// Sharps sit on black keys.
    pub black: bool,
}

/// Equal-temperament frequency of a 1-based key position.
pub fn frequency_at(position: usize) -> f64 {
    A4_FREQUENCY * 2f64.powf((position as f64 - A4_POSITION as f64) / 12.0)
}

/// Immutable lookup of all piano pitches, built once and shared by reference.
#[derive(Clone, Debug, Serialize)]
pub struct PitchTable {
    pitches: Vec<Pitch>,
}

impl PitchTable {
    pub fn new() -> Self {
        let pitches = (1..=PITCH_COUNT)
            .map(|position| {
                let midi = position + FIRST_MIDI_NOTE - 1;
                let note = NOTE_NAMES[midi % 12];
                let octave = midi / 12 - 1;
                Pitch {
                    position,
                    name: format!("{}{}", note, octave),
                    frequency: frequency_at(position),
                    black: note.ends_with('#'),
                }
            })
            .collect();
        Self { pitches }
    }

    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }

    /// Pitch by 0-based index.
    pub fn get(&self, index: usize) -> Option<&Pitch> {
        self.pitches.get(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.pitches.iter().position(|p| p.name == name)
    }

    pub fn by_name(&self, name: &str) -> Option<&Pitch> {
        self.index_of(name).map(|i| &self.pitches[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pitch> {
        self.pitches.iter()
    }

    pub fn as_slice(&self) -> &[Pitch] {
        &self.pitches
    }
}

impl Default for PitchTable {
    fn default() -> Self {
        Self::new()
    }
}
