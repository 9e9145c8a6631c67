//! PNG capture of rendered frames.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::RgbaImage;

/// Saves `0xAARRGGBB` pixels, `width` per row, as an RGBA png.
pub fn save_argb(path: &Path, width: u32, height: u32, pixels: &[u32]) -> Result<()> {
    let bytes: Vec<u8> = pixels
        .iter()
        .flat_map(|&p| {
            let [b, g, r, a] = p.to_le_bytes();
            [r, g, b, a]
        })
        .collect();

    let img = RgbaImage::from_raw(width, height, bytes)
        .with_context(|| format!("{} pixels do not fill {width}x{height}", pixels.len()))?;
    img.save(path)
        .with_context(|| format!("failed to write {}", path.display()))
}

/// `out.png` + `"managed"` → `out-managed.png`.
pub fn path_for(base: &Path, suffix: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    let ext = base
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    base.with_file_name(format!("{stem}-{suffix}.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_goes_before_extension() {
        assert_eq!(
            path_for(Path::new("shots/out.png"), "legacy"),
            PathBuf::from("shots/out-legacy.png")
        );
        assert_eq!(path_for(Path::new("out"), "standard"), PathBuf::from("out-standard.png"));
    }

    #[test]
    fn argb_is_written_as_rgba() {
        let path = std::env::temp_dir().join(format!("tilewind-argb-{}.png", std::process::id()));
        save_argb(&path, 2, 1, &[0xFF10_2030, 0x80FF_0000]).unwrap();

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.get_pixel(0, 0).0, [0x10, 0x20, 0x30, 0xFF]);
        assert_eq!(img.get_pixel(1, 0).0, [0xFF, 0x00, 0x00, 0x80]);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn short_buffer_is_rejected() {
        let path = std::env::temp_dir().join("tilewind-never-written.png");
        assert!(save_argb(&path, 4, 4, &[0; 3]).is_err());
    }
}
