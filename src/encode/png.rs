use std::io::Write;
use std::path::Path;

use crate::error::Result;

/// Encode premultiplied RGBA8 pixels as a straight-alpha RGBA PNG.
pub fn encode_rgba(width: u32, height: u32, premultiplied: &[u8]) -> Result<Vec<u8>> {
    let straight = unpremultiply(premultiplied);

    let mut bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut bytes, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&straight)?;
        writer.finish()?;
    }
    Ok(bytes)
}

fn unpremultiply(pixels: &[u8]) -> Vec<u8> {
    let mut out = pixels.to_vec();
    for px in out.chunks_exact_mut(4) {
        let a = px[3] as u32;
        match a {
            0 => px[..3].fill(0),
            255 => {}
            _ => {
                for c in &mut px[..3] {
                    *c = ((*c as u32 * 255 + a / 2) / a).min(255) as u8;
                }
            }
        }
    }
    out
}

/// Write `bytes` to a temp file next to `path`, then rename it into place.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

    #[test]
    fn encodes_readable_png() {
        let pixels = vec![
            255, 0, 0, 255, //
            0, 0, 64, 64, //
            0, 0, 0, 0, //
            10, 0, 0, 20, //
        ];
        let bytes = encode_rgba(2, 2, &pixels).unwrap();
        assert_eq!(&bytes[..8], &SIGNATURE);

        let decoder = png::Decoder::new(&bytes[..]);
        let mut reader = decoder.read_info().unwrap();
        assert_eq!(reader.info().width, 2);
        assert_eq!(reader.info().height, 2);

        let mut buf = vec![0; reader.output_buffer_size()];
        let frame = reader.next_frame(&mut buf).unwrap();
        let data = &buf[..frame.buffer_size()];
        assert_eq!(&data[0..4], &[255, 0, 0, 255]);
        assert_eq!(&data[4..8], &[0, 0, 255, 64]);
        assert_eq!(&data[8..12], &[0, 0, 0, 0]);
        assert_eq!(&data[12..16], &[128, 0, 0, 20]);
    }

    #[test]
    fn atomic_write_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roll.png");
        std::fs::write(&path, b"stale").unwrap();
        write_atomic(&path, b"fresh").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"fresh");
        // Only the target remains; the temp file was renamed away.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
