use crate::audio::pitch::{PitchTable, PITCH_COUNT};

/// Left edge of each key as a fraction of the keyboard width, A0 first.
/// Black keys are offset within their neighbours the way a real keyboard is.
const KEY_LEFT: [f64; PITCH_COUNT] = [
    0.0, 0.0170731707317073, 0.0192307692307692, 0.0384615384615385,
    0.0518605378361476, 0.0576923076923077, 0.074624765478424, 0.0769230769230769,
    0.0961538461538462, 0.109412132582864, 0.115384615384615, 0.130550343964978,
    0.134615384615385, 0.151688555347092, 0.153846153846154, 0.173076923076923,
    0.186475922451532, 0.192307692307692, 0.209240150093809, 0.211538461538462,
    0.230769230769231, 0.244027517198249, 0.25, 0.265165728580363,
    0.269230769230769, 0.286303939962477, 0.288461538461538, 0.307692307692308,
    0.321091307066917, 0.326923076923077, 0.343855534709193, 0.346153846153846,
    0.365384615384615, 0.378642901813634, 0.384615384615385, 0.399781113195747,
    0.403846153846154, 0.420919324577861, 0.423076923076923, 0.442307692307692,
    0.455706691682302, 0.461538461538462, 0.478470919324578, 0.480769230769231,
    0.5, 0.513258286429018, 0.519230769230769, 0.534396497811132,
    0.538461538461538, 0.555534709193246, 0.557692307692308, 0.576923076923077,
    0.590322076297686, 0.596153846153846, 0.613086303939962, 0.615384615384615,
    0.634615384615385, 0.647873671044403, 0.653846153846154, 0.669011882426517,
    0.673076923076923, 0.69015009380863, 0.692307692307692, 0.711538461538462,
    0.724937460913071, 0.730769230769231, 0.747701688555347, 0.75,
    0.769230769230769, 0.782489055659787, 0.788461538461538, 0.803627267041901,
    0.807692307692308, 0.824765478424015, 0.826923076923077, 0.846153846153846,
    0.859552845528455, 0.865384615384615, 0.882317073170732, 0.884615384615385,
    0.903846153846154, 0.917104440275172, 0.923076923076923, 0.938242651657286,
    0.942307692307692, 0.9593808630394, 0.961538461538462, 0.980769230769231,
];

/// A black key is 1/123 of the keyboard wide.
const BLACK_KEY_HALF: f64 = 0.5 / 123.0;
const WHITE_KEYS: f64 = 52.0;

/// Horizontal pixel position of each pitch on a piano keyboard of `width` pixels.
///
/// Columns are the key centres from [`KEY_LEFT`], truncated to whole pixels.
#[derive(Clone, Debug)]
pub struct KeyboardLayout {
    width: u32,
    columns: Vec<u32>,
}

impl KeyboardLayout {
    pub fn new(pitches: &PitchTable, width: u32) -> Self {
        let last_column = width.saturating_sub(1);
        let columns = pitches
            .iter()
            .zip(KEY_LEFT)
            .map(|(pitch, left)| {
                let half = if pitch.black { BLACK_KEY_HALF } else { 0.5 / WHITE_KEYS };
                (((left + half) * width as f64) as u32).min(last_column)
            })
            .collect();

        Self { width, columns }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn white_key_width(&self) -> f64 {
        self.width as f64 / WHITE_KEYS
    }

    /// Pixel column of the pitch at `index` in the table.
    pub fn column(&self, index: usize) -> Option<u32> {
        self.columns.get(index).copied()
    }

    pub fn columns(&self) -> &[u32] {
        &self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_increase_left_to_right() {
        let table = PitchTable::new();
        let layout = KeyboardLayout::new(&table, 800);
        assert_eq!(layout.columns().len(), 88);
        for pair in layout.columns().windows(2) {
            assert!(pair[1] > pair[0], "{:?}", pair);
        }
        assert!(*layout.columns().last().unwrap() < 800);
    }

    #[test]
    fn columns_follow_key_positions() {
        let table = PitchTable::new();
        let layout = KeyboardLayout::new(&table, 800);
        let column = |name: &str| layout.column(table.index_of(name).unwrap());

        assert_eq!(column("A0"), Some(7));
        assert_eq!(column("A#0"), Some(16));
        assert_eq!(column("B0"), Some(23));
        assert_eq!(column("C1"), Some(38));
        assert_eq!(column("C#1"), Some(44));
        assert_eq!(column("G#4"), Some(430));
        assert_eq!(column("A4"), Some(438));
        assert_eq!(column("A#4"), Some(447));
        assert_eq!(column("C8"), Some(792));
    }

    #[test]
    fn black_keys_sit_between_white_neighbours() {
        let table = PitchTable::new();
        let layout = KeyboardLayout::new(&table, 1230);
        for (i, pitch) in table.iter().enumerate().filter(|(_, p)| p.black) {
            let left = layout.column(i - 1).unwrap();
            let right = layout.column(i + 1).unwrap();
            let col = layout.column(i).unwrap();
            assert!(left < col && col < right, "{}", pitch.name);
        }
    }

    #[test]
    fn narrow_canvas_clamps_to_last_column() {
        let table = PitchTable::new();
        let layout = KeyboardLayout::new(&table, 1);
        assert!(layout.columns().iter().all(|&c| c == 0));
        assert_eq!(layout.white_key_width(), 1.0 / 52.0);
    }
}
