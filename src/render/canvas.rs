//! RGBA rasters and the shared piano-roll canvas.
//!
//! Pixels are stored premultiplied so "source over" blending is a single
//! multiply-add per channel; they are converted to straight alpha on encode.

use std::path::Path;

use parking_lot::Mutex;

use crate::encode;
use crate::error::{Error, Result};

/// Largest pixel buffer a [`PianoRoll`] will allocate up front (2 GiB).
pub const MAX_CANVAS_BYTES: u64 = 1 << 31;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaImage {
    pub width: u32,
    pub height: u32,
    /// Row-major premultiplied RGBA8.
    pub pixels: Vec<u8>,
}

impl RgbaImage {
    /// Fully transparent image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.pixels[idx..idx + 4]);
        Some(px)
    }

    /// Blend a premultiplied colour over the rectangle `[x0, x1) x [y0, y1)`, clipped.
    pub fn fill_over(&mut self, x0: u32, x1: u32, y0: u32, y1: u32, color: [u8; 4]) {
        let x1 = x1.min(self.width);
        let y1 = y1.min(self.height);
        for y in y0..y1 {
            let row = y as usize * self.width as usize;
            for x in x0..x1 {
                let idx = (row + x as usize) * 4;
                blend_over(&mut self.pixels[idx..idx + 4], color);
            }
        }
    }

    /// Blend `src` over this image with its top row at `top`. Columns beyond
    /// either width and rows beyond this height are clipped.
    pub fn draw_over(&mut self, src: &RgbaImage, top: u32) {
        let cols = self.width.min(src.width) as usize;
        for sy in 0..src.height {
            let dy = top + sy;
            if dy >= self.height {
                break;
            }
            let src_row = sy as usize * src.width as usize * 4;
            let dst_row = dy as usize * self.width as usize * 4;
            for x in 0..cols {
                let s = src_row + x * 4;
                let d = dst_row + x * 4;
                let color = [
                    src.pixels[s],
                    src.pixels[s + 1],
                    src.pixels[s + 2],
                    src.pixels[s + 3],
                ];
                blend_over(&mut self.pixels[d..d + 4], color);
            }
        }
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        encode::png::encode_rgba(self.width, self.height, &self.pixels)
    }
}

/// Premultiplied "source over": out = src + dst * (1 - src_alpha).
pub(crate) fn blend_over(dst: &mut [u8], src: [u8; 4]) {
    let inv = 255 - src[3] as u32;
    if inv == 255 {
        return;
    }
    for c in 0..4 {
        let under = (dst[c] as u32 * inv + 127) / 255;
        dst[c] = (src[c] as u32 + under).min(255) as u8;
    }
}

/// The growing piano-roll image. Instant 0 occupies the bottom band and each
/// later instant the band above it.
pub struct PianoRoll {
    strip_height: u32,
    capacity: usize,
    image: Mutex<RgbaImage>,
}

impl PianoRoll {
    /// Allocate a transparent canvas with room for `capacity` strips.
    ///
    /// Fails with [`Error::InvalidSettings`] when the height does not fit in a
    /// `u32` or the pixel buffer would exceed [`MAX_CANVAS_BYTES`].
    pub fn new(width: u32, strip_height: u32, capacity: usize) -> Result<Self> {
        let height = u32::try_from(capacity)
            .ok()
            .and_then(|strips| strips.checked_mul(strip_height))
            .ok_or_else(|| {
                Error::InvalidSettings(format!(
                    "{} strips of {} rows do not fit in one image",
                    capacity, strip_height
                ))
            })?;
        let bytes = width as u64 * height as u64 * 4;
        if bytes > MAX_CANVAS_BYTES {
            return Err(Error::InvalidSettings(format!(
                "a {}x{} canvas needs {} MiB, more than the {} MiB limit; use a wider spacing or narrower image",
                width,
                height,
                bytes >> 20,
                MAX_CANVAS_BYTES >> 20
            )));
        }

        Ok(Self {
            strip_height,
            capacity,
            image: Mutex::new(RgbaImage::new(width, height)),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.lock().width
    }

    pub fn height(&self) -> u32 {
        self.strip_height * self.capacity as u32
    }

    pub fn strip_height(&self) -> u32 {
        self.strip_height
    }

    /// Number of strips the canvas has room for.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Top row of the band for `index`, or `None` past capacity.
    pub fn band_top(&self, index: usize) -> Option<u32> {
        if index >= self.capacity {
            return None;
        }
        Some(self.height() - (index as u32 + 1) * self.strip_height)
    }

    /// Blend `strip` into the band for `index`. Returns false if it does not fit.
    pub fn composite(&self, strip: &RgbaImage, index: usize) -> bool {
        let Some(top) = self.band_top(index) else {
            log::warn!(
                "Strip {} is outside the canvas ({} strips); skipped",
                index,
                self.capacity
            );
            return false;
        };
        self.image.lock().draw_over(strip, top);
        true
    }

    pub fn snapshot(&self) -> RgbaImage {
        self.image.lock().clone()
    }

    /// PNG bytes of the current canvas. Encoding runs outside the lock.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.snapshot().encode_png()
    }

    /// Write the current canvas as a PNG, replacing `path` atomically.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        let bytes = self.encode_png()?;
        encode::png::write_atomic(path, &bytes)
    }
}
