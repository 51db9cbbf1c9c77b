use std::path::Path;

use tiny_skia::{IntSize, Pixmap};

use crate::error::{CanvasError, Result};
use crate::helpers::{demultiply, premultiply};
use crate::Color;

/// A standalone bitmap: either a snapshot of a buffer or a decoded file.
///
/// Pixels are kept premultiplied, ready to be blitted.
#[derive(Clone, PartialEq)]
pub struct Image {
    pixmap: Pixmap,
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

impl Image {
    /// Build from straight RGBA bytes, row-major.
    pub fn from_rgba(width: u32, height: u32, mut rgba: Vec<u8>) -> Result<Self> {
        premultiply(&mut rgba);
        let size = IntSize::from_wh(width, height).ok_or(CanvasError::InvalidSize { width, height })?;
        let pixmap =
            Pixmap::from_vec(rgba, size).ok_or(CanvasError::InvalidImageData { width, height })?;
        Ok(Image { pixmap })
    }

    /// Decode an image file (format guessed from its contents).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let decoded = image::open(path)?.to_rgba8();
        let (w, h) = decoded.dimensions();
        Self::from_rgba(w, h, decoded.into_raw())
    }

    pub(crate) fn from_pixmap(pixmap: Pixmap) -> Self {
        Image { pixmap }
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Straight RGBA color at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let off = ((y * self.width() + x) * 4) as usize;
        let (r, g, b, a) = demultiply(&self.pixmap.data()[off..off + 4]);
        Some(Color::rgba(r, g, b, a))
    }

    /// Straight-alpha copy in the `image` crate's representation.
    pub fn to_rgba8(&self) -> image::RgbaImage {
        let data = self.pixmap.data();
        let width = self.width();
        image::RgbaImage::from_fn(width, self.height(), |x, y| {
            let off = ((y * width + x) * 4) as usize;
            let (r, g, b, a) = demultiply(&data[off..off + 4]);
            image::Rgba([r, g, b, a])
        })
    }

    /// Encode to a file; the format follows the extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.to_rgba8().save(path)?;
        Ok(())
    }

    /// True when every pixel has the same value.
    pub fn is_uniform(&self) -> bool {
        let mut pixels = self.pixmap.data().chunks_exact(4);
        match pixels.next() {
            Some(first) => pixels.all(|px| px == first),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba_and_pixel() {
        let img = Image::from_rgba(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 255]).unwrap();
        assert_eq!(img.pixel(0, 0), Some(Color::RED));
        assert_eq!(img.pixel(1, 0), Some(Color::BLUE));
        assert_eq!(img.pixel(2, 0), None);
        assert!(!img.is_uniform());
    }

    #[test]
    fn test_from_rgba_rejects_short_data() {
        let err = Image::from_rgba(2, 2, vec![0; 4]).unwrap_err();
        assert!(matches!(err, CanvasError::InvalidImageData { .. }));
    }

    #[test]
    fn test_to_rgba8_keeps_straight_alpha() {
        let img = Image::from_rgba(1, 1, vec![200, 100, 0, 255]).unwrap();
        assert_eq!(img.to_rgba8().get_pixel(0, 0).0, [200, 100, 0, 255]);
    }
}
