use super::canvas::RgbaImage;
use super::keyboard::KeyboardLayout;
use crate::audio::pitch::PitchTable;
use crate::audio::spectrum::Spectrum;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StripStyle {
    pub height: u32,
    /// Width of each pitch mark in pixels.
    pub mark_width: u32,
    /// Lower bound of the normalizer, so near-silent instants stay dark.
    pub magnitude_floor: f64,
}

impl Default for StripStyle {
    fn default() -> Self {
        Self {
            height: 10,
            mark_width: 10,
            magnitude_floor: 0.001,
        }
    }
}

/// Cubic response: quiet partials fade out, strong ones saturate.
pub fn intensity(value: f64, normalizer: f64) -> u8 {
    if normalizer <= 0.0 || !value.is_finite() {
        return 0;
    }
    let ratio = (value / normalizer).clamp(0.0, 1.0);
    (255.0 * ratio.powi(3)).round() as u8
}

/// Draw one spectrum as a horizontal strip. Black keys use the blue channel,
/// white keys the red one, with alpha equal to the intensity.
pub fn render_strip(
    spectrum: &Spectrum,
    pitches: &PitchTable,
    layout: &KeyboardLayout,
    style: &StripStyle,
) -> RgbaImage {
    let mut strip = RgbaImage::new(layout.width(), style.height);
    let normalizer = spectrum.max().max(style.magnitude_floor);
    let half = style.mark_width / 2;

    for (index, pitch) in pitches.iter().enumerate() {
        let (Some(value), Some(column)) = (spectrum.magnitude(index), layout.column(index)) else {
            continue;
        };
        let v = intensity(value, normalizer);
        if v == 0 {
            continue;
        }
        let color = if pitch.black { [0, 0, v, v] } else { [v, 0, 0, v] };
        let left = column.saturating_sub(half);
        strip.fill_over(left, left + style.mark_width, 0, style.height, color);
    }

    strip
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spectrum_with(table: &PitchTable, values: &[(&str, f64)]) -> Spectrum {
        let mut magnitudes = vec![0.0; table.len()];
        for (name, value) in values {
            magnitudes[table.index_of(name).unwrap()] = *value;
        }
        Spectrum { time: 0.0, magnitudes }
    }

    #[test]
    fn intensity_is_cubic() {
        assert_eq!(intensity(1.0, 1.0), 255);
        assert_eq!(intensity(0.5, 1.0), 32);
        assert_eq!(intensity(0.0, 1.0), 0);
        assert_eq!(intensity(2.0, 1.0), 255);
        assert_eq!(intensity(1.0, 0.0), 0);
    }

    #[test]
    fn loudest_white_key_is_opaque_red() {
        let table = PitchTable::new();
        let layout = KeyboardLayout::new(&table, 800);
        let spectrum = spectrum_with(&table, &[("A4", 0.5), ("C4", 0.25)]);
        let strip = render_strip(&spectrum, &table, &layout, &StripStyle::default());

        assert_eq!(strip.width, 800);
        assert_eq!(strip.height, 10);
        let a4 = layout.column(table.index_of("A4").unwrap()).unwrap();
        assert_eq!(strip.pixel(a4, 0), Some([255, 0, 0, 255]));
        assert_eq!(strip.pixel(a4, 9), Some([255, 0, 0, 255]));
        let c4 = layout.column(table.index_of("C4").unwrap()).unwrap();
        assert_eq!(strip.pixel(c4, 5), Some([32, 0, 0, 32]));
    }

    #[test]
    fn black_keys_use_blue() {
        let table = PitchTable::new();
        let layout = KeyboardLayout::new(&table, 800);
        let spectrum = spectrum_with(&table, &[("F#2", 1.0)]);
        let strip = render_strip(&spectrum, &table, &layout, &StripStyle::default());
        let col = layout.column(table.index_of("F#2").unwrap()).unwrap();
        assert_eq!(strip.pixel(col, 0), Some([0, 0, 255, 255]));
    }

    #[test]
    fn floor_keeps_quiet_instants_dark() {
        let table = PitchTable::new();
        let layout = KeyboardLayout::new(&table, 800);
        let spectrum = spectrum_with(&table, &[("A4", 0.0001)]);
        let strip = render_strip(&spectrum, &table, &layout, &StripStyle::default());
        assert!(strip.pixels.iter().all(|&b| b == 0));
    }
}
