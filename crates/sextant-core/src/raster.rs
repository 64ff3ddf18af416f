// File: crates/sextant-core/src/raster.rs
// Summary: CPU raster surface allocation and pixel export (RGBA8 buffers, PNG bytes).

use std::io::Cursor;
use std::path::Path;

use skia_safe as skia;
use thiserror::Error;

use crate::geometry::Size;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create {width}x{height} raster surface")]
    Surface { width: u32, height: u32 },
    #[error("failed to read back surface pixels")]
    ReadPixels,
    #[error("encode PNG failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Allocate an N32 premultiplied CPU surface.
pub fn allocate(size: Size) -> Result<skia::Surface, RenderError> {
    let err = RenderError::Surface { width: size.width, height: size.height };
    if size.is_empty() {
        return Err(err);
    }
    skia::surfaces::raster_n32_premul((size.width as i32, size.height as i32)).ok_or(err)
}

/// Read the surface back as unpremultiplied RGBA8.
/// Returns (pixels, width, height, row_bytes).
pub fn to_rgba8(surface: &mut skia::Surface) -> Result<(Vec<u8>, u32, u32, usize), RenderError> {
    let (w, h) = (surface.width(), surface.height());
    let info = skia::ImageInfo::new((w, h), skia::ColorType::RGBA8888, skia::AlphaType::Unpremul, None);
    let row_bytes = w as usize * 4;
    let mut pixels = vec![0u8; row_bytes * h as usize];
    if !surface.read_pixels(&info, &mut pixels, row_bytes, (0, 0)) {
        return Err(RenderError::ReadPixels);
    }
    Ok((pixels, w as u32, h as u32, row_bytes))
}

/// Snapshot the surface and encode it as PNG.
pub fn to_png_bytes(surface: &mut skia::Surface) -> Result<Vec<u8>, RenderError> {
    let (pixels, w, h, _) = to_rgba8(surface)?;
    let img = image::RgbaImage::from_raw(w, h, pixels).ok_or(RenderError::ReadPixels)?;
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)?;
    Ok(out)
}

/// Encode the surface as PNG and write it to `path`, creating parent directories.
pub fn write_png(surface: &mut skia::Surface, path: impl AsRef<Path>) -> Result<(), RenderError> {
    let data = to_png_bytes(surface)?;
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_surfaces_are_rejected() {
        assert!(matches!(allocate(Size::new(0, 10)), Err(RenderError::Surface { width: 0, height: 10 })));
    }

    #[test]
    fn png_export_has_magic_bytes() {
        let mut s = allocate(Size::new(8, 4)).unwrap();
        s.canvas().clear(skia::Color::from_argb(255, 1, 2, 3));
        let (px, w, h, stride) = to_rgba8(&mut s).unwrap();
        assert_eq!((w, h, stride), (8, 4, 32));
        assert_eq!(&px[..4], &[1, 2, 3, 255]);
        let png = to_png_bytes(&mut s).unwrap();
        assert!(png.starts_with(&[137, 80, 78, 71]));
    }
}
