// --- Text rendering ---

use std::path::Path;
use std::sync::Arc;

use fontdue::FontSettings;
use once_cell::sync::Lazy;
use tiny_skia::{FilterQuality, IntSize, Pixmap, PixmapMut, PixmapPaint, Transform};
use tracing::debug;

use crate::error::{CanvasError, Result};
use crate::Color;

/// System sans-serif face, looked up once per process.
static SYSTEM_SANS: Lazy<Option<Arc<fontdue::Font>>> = Lazy::new(load_system_sans);

fn load_system_sans() -> Option<Arc<fontdue::Font>> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    let query = fontdb::Query {
        families: &[fontdb::Family::SansSerif],
        ..fontdb::Query::default()
    };
    let id = db.query(&query)?;
    let font = db.with_face_data(id, |data, index| {
        let settings = FontSettings {
            collection_index: index,
            ..FontSettings::default()
        };
        fontdue::Font::from_bytes(data, settings)
    })?;
    match font {
        Ok(font) => {
            debug!(faces = db.len(), "loaded system sans-serif font");
            Some(Arc::new(font))
        }
        Err(e) => {
            debug!(error = e, "system sans-serif font could not be parsed");
            None
        }
    }
}

/// A font face at a pixel size.
#[derive(Clone)]
pub struct Font {
    face: Arc<fontdue::Font>,
    size: f32,
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font")
            .field("name", &self.face.name())
            .field("size", &self.size)
            .finish()
    }
}

impl Font {
    pub fn from_bytes(data: &[u8], size: f32) -> Result<Self> {
        let face = fontdue::Font::from_bytes(data, FontSettings::default())
            .map_err(|e| CanvasError::Font(e.to_string()))?;
        Ok(Font {
            face: Arc::new(face),
            size,
        })
    }

    pub fn load(path: impl AsRef<Path>, size: f32) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data, size)
    }

    /// The platform's default sans-serif face.
    pub fn system_sans(size: f32) -> Result<Self> {
        let face = SYSTEM_SANS.as_ref().ok_or(CanvasError::NoFont)?;
        Ok(Font {
            face: Arc::clone(face),
            size,
        })
    }

    pub fn with_size(&self, size: f32) -> Self {
        Font {
            face: Arc::clone(&self.face),
            size,
        }
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    /// Distance between consecutive baselines.
    pub fn line_height(&self) -> f32 {
        self.face
            .horizontal_line_metrics(self.size)
            .map(|m| m.new_line_size)
            .unwrap_or(self.size * 1.2)
    }

    fn ascent(&self) -> f32 {
        self.face
            .horizontal_line_metrics(self.size)
            .map(|m| m.ascent)
            .unwrap_or(self.size)
    }

    fn line_width(&self, line: &str) -> f32 {
        line.chars()
            .filter(|c| !c.is_control())
            .map(|c| self.face.metrics(c, self.size).advance_width)
            .sum()
    }

    /// Width of the widest line and total height of the text block.
    pub fn measure(&self, text: &str) -> (f32, f32) {
        let mut width: f32 = 0.0;
        let mut lines = 0;
        for line in text.split('\n') {
            width = width.max(self.line_width(line));
            lines += 1;
        }
        (width, lines as f32 * self.line_height())
    }
}

/// Placement of text relative to its anchor on one axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    /// Anchor is the left (or top) edge.
    #[default]
    Near,
    Center,
    /// Anchor is the right (or bottom) edge.
    Far,
}

impl Alignment {
    fn offset(self, extent: f32) -> f32 {
        match self {
            Alignment::Near => 0.0,
            Alignment::Center => -extent / 2.0,
            Alignment::Far => -extent,
        }
    }
}

/// Layout options for text drawing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextFormat {
    /// Horizontal alignment of each line.
    pub alignment: Alignment,
    /// Vertical alignment of the whole block.
    pub line_alignment: Alignment,
}

impl TextFormat {
    pub fn centered() -> Self {
        TextFormat {
            alignment: Alignment::Center,
            line_alignment: Alignment::Center,
        }
    }
}

/// Top-left corner of each line once the block is aligned around `(x, y)`.
pub(crate) fn layout_lines<'t>(
    font: &Font,
    text: &'t str,
    x: f32,
    y: f32,
    format: TextFormat,
) -> Vec<(&'t str, f32, f32)> {
    let line_height = font.line_height();
    let (_, block_height) = font.measure(text);
    let top = y + format.line_alignment.offset(block_height);

    text.split('\n')
        .enumerate()
        .map(|(i, line)| {
            let left = x + format.alignment.offset(font.line_width(line));
            (line, left, top + i as f32 * line_height)
        })
        .collect()
}

/// Rasterize one line with its top-left corner at `(x, y)`.
pub(crate) fn draw_line_text(
    pm: &mut PixmapMut<'_>,
    font: &Font,
    line: &str,
    x: f32,
    y: f32,
    color: Color,
    aa: bool,
    ctm: Transform,
) {
    let baseline = y + font.ascent();
    let mut curr_x = x;

    for c in line.chars() {
        if c.is_control() {
            continue;
        }
        let (metrics, bitmap) = font.face.rasterize(c, font.size);
        if metrics.width > 0 && metrics.height > 0 {
            if let Some(glyph) = glyph_pixmap(&bitmap, metrics.width, metrics.height, color, aa) {
                let draw_x = curr_x + metrics.xmin as f32;
                let draw_y = baseline - (metrics.height as f32 + metrics.ymin as f32);
                pm.draw_pixmap(
                    0,
                    0,
                    glyph.as_ref(),
                    &PixmapPaint {
                        quality: FilterQuality::Nearest,
                        ..PixmapPaint::default()
                    },
                    ctm.pre_translate(draw_x.round(), draw_y.round()),
                    None,
                );
            }
        }
        curr_x += metrics.advance_width;
    }
}

/// Turn a coverage bitmap into a premultiplied glyph pixmap of `color`.
fn glyph_pixmap(coverage: &[u8], w: usize, h: usize, color: Color, aa: bool) -> Option<Pixmap> {
    let mut data = vec![0u8; w * h * 4];
    for (i, &cov) in coverage.iter().enumerate() {
        let cov = if aa {
            cov
        } else if cov >= 128 {
            255
        } else {
            0
        };
        if cov == 0 {
            continue;
        }
        let a = ((color.a as u16 * cov as u16) / 255) as u8;
        let off = i * 4;
        data[off] = ((color.r as u16 * a as u16) / 255) as u8;
        data[off + 1] = ((color.g as u16 * a as u16) / 255) as u8;
        data[off + 2] = ((color.b as u16 * a as u16) / 255) as u8;
        data[off + 3] = a;
    }
    Pixmap::from_vec(data, IntSize::from_wh(w as u32, h as u32)?)
}
