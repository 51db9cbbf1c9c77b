use tiny_skia::{
    FillRule, FilterQuality, Pixmap, PixmapMut, PixmapPaint, Stroke, Transform,
};
use tracing::trace;

use crate::error::{CanvasError, Result};
use crate::helpers::{make_paint, rect_from_xywh};
use crate::path::{arc_path, bezier_path, line_path, pie_path, polygon_path};
use crate::text::{draw_line_text, layout_lines};
use crate::{Color, Font, Image, Pen, TextFormat};

/// Outlines sit on pixel centres: a one pixel pen at integer `y` covers row `y`.
const STROKE_OFFSET: f32 = 0.5;

/// Off-screen pixel buffer all drawing goes through.
///
/// Pixels are premultiplied RGBA. The buffer keeps the current transform and
/// antialias flag; [`Buffer::surface`] hands out a drawing handle that uses them.
pub struct Buffer {
    pixmap: Pixmap,
    ctm: Transform,
    antialias: bool,
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("ctm", &self.ctm)
            .field("antialias", &self.antialias)
            .finish()
    }
}

impl Buffer {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height).ok_or(CanvasError::InvalidSize { width, height })?;
        Ok(Buffer {
            pixmap,
            ctm: Transform::identity(),
            antialias: true,
        })
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

    pub fn antialias(&self) -> bool {
        self.antialias
    }

    pub fn set_antialias(&mut self, enabled: bool) {
        self.antialias = enabled;
    }

    pub fn transform(&self) -> Transform {
        self.ctm
    }

    pub fn set_transform(&mut self, ts: Transform) {
        self.ctm = ts;
    }

    /// Prepend `ts`: points go through `ts` first, then the current transform.
    pub fn concat_transform(&mut self, ts: Transform) {
        self.ctm = self.ctm.pre_concat(ts);
    }

    pub fn reset_transform(&mut self) {
        self.ctm = Transform::identity();
    }

    /// Acquire a drawing handle over the buffer's pixels.
    pub fn surface(&mut self) -> Surface<'_> {
        Surface {
            pm: self.pixmap.as_mut(),
            ctm: self.ctm,
            antialias: self.antialias,
        }
    }

    /// Blit the whole buffer onto `target`. Only the overlapping region is
    /// copied when sizes differ.
    pub fn copy_to(&self, target: &mut Pixmap) {
        if target.width() == self.width() && target.height() == self.height() {
            target.data_mut().copy_from_slice(self.pixmap.data());
            return;
        }
        let w = self.width().min(target.width()) as usize;
        let h = self.height().min(target.height()) as usize;
        let src_stride = self.width() as usize * 4;
        let dst_stride = target.width() as usize * 4;
        let src = self.pixmap.data();
        let dst = target.data_mut();
        for y in 0..h {
            dst[y * dst_stride..y * dst_stride + w * 4]
                .copy_from_slice(&src[y * src_stride..y * src_stride + w * 4]);
        }
    }

    /// Independent copy of the current pixels.
    pub fn snapshot(&self) -> Image {
        Image::from_pixmap(self.pixmap.clone())
    }
}

/// Immediate-mode drawing handle borrowed from a [`Buffer`].
pub struct Surface<'a> {
    pm: PixmapMut<'a>,
    ctm: Transform,
    antialias: bool,
}

impl Surface<'_> {
    fn stroke(pen: Pen) -> Stroke {
        Stroke {
            width: pen.width.max(0.0),
            ..Stroke::default()
        }
    }

    fn stroke_path(&mut self, path: Option<tiny_skia::Path>, pen: Pen) {
        match path {
            Some(path) => {
                let paint = make_paint(pen.color, self.antialias);
                self.pm
                    .stroke_path(&path, &paint, &Self::stroke(pen), self.ctm, None);
            }
            None => trace!("skipped degenerate stroke"),
        }
    }

    fn fill_path(&mut self, path: Option<tiny_skia::Path>, color: Color, rule: FillRule) {
        match path {
            Some(path) => {
                let paint = make_paint(color, self.antialias);
                self.pm.fill_path(&path, &paint, rule, self.ctm, None);
            }
            None => trace!("skipped degenerate fill"),
        }
    }

    /// Fill every pixel with `color`, ignoring the transform.
    pub fn clear(&mut self, color: Color) {
        self.pm.fill(color.into());
    }

    pub fn stroke_line(&mut self, pen: Pen, from: (i32, i32), to: (i32, i32)) {
        let path = line_path(
            from.0 as f32 + STROKE_OFFSET,
            from.1 as f32 + STROKE_OFFSET,
            to.0 as f32 + STROKE_OFFSET,
            to.1 as f32 + STROKE_OFFSET,
        );
        self.stroke_path(path, pen);
    }

    pub fn stroke_bezier(&mut self, pen: Pen, points: [(f32, f32); 4]) {
        self.stroke_path(bezier_path(points, STROKE_OFFSET), pen);
    }

    pub fn stroke_rect(&mut self, pen: Pen, x: i32, y: i32, w: i32, h: i32) {
        let path = rect_from_xywh(x, y, w, h, STROKE_OFFSET).map(tiny_skia::PathBuilder::from_rect);
        self.stroke_path(path, pen);
    }

    pub fn fill_rect(&mut self, color: Color, x: i32, y: i32, w: i32, h: i32) {
        if let Some(rect) = rect_from_xywh(x, y, w, h, 0.0) {
            let paint = make_paint(color, self.antialias);
            self.pm.fill_rect(rect, &paint, self.ctm, None);
        }
    }

    /// Outline of the ellipse inscribed in `(x, y, w, h)`.
    pub fn stroke_ellipse(&mut self, pen: Pen, x: i32, y: i32, w: i32, h: i32) {
        let path = rect_from_xywh(x, y, w, h, STROKE_OFFSET).and_then(tiny_skia::PathBuilder::from_oval);
        self.stroke_path(path, pen);
    }

    pub fn fill_ellipse(&mut self, color: Color, x: i32, y: i32, w: i32, h: i32) {
        let path = rect_from_xywh(x, y, w, h, 0.0).and_then(tiny_skia::PathBuilder::from_oval);
        self.fill_path(path, color, FillRule::Winding);
    }

    /// Arc of the ellipse inscribed in `(x, y, w, h)`; degrees clockwise from 3 o'clock.
    pub fn stroke_arc(&mut self, pen: Pen, x: i32, y: i32, w: i32, h: i32, start: f32, sweep: f32) {
        let path = rect_from_xywh(x, y, w, h, STROKE_OFFSET).and_then(|r| arc_path(r, start, sweep));
        self.stroke_path(path, pen);
    }

    pub fn fill_pie(&mut self, color: Color, x: i32, y: i32, w: i32, h: i32, start: f32, sweep: f32) {
        let path = rect_from_xywh(x, y, w, h, 0.0).and_then(|r| pie_path(r, start, sweep));
        self.fill_path(path, color, FillRule::Winding);
    }

    pub fn stroke_polygon(&mut self, pen: Pen, points: &[(i32, i32)]) {
        self.stroke_path(polygon_path(points, STROKE_OFFSET), pen);
    }

    pub fn fill_polygon(&mut self, color: Color, points: &[(i32, i32)]) {
        self.fill_path(polygon_path(points, 0.0), color, FillRule::EvenOdd);
    }

    /// Blit `image` at its native size with its top-left corner at `(x, y)`.
    pub fn draw_image(&mut self, x: i32, y: i32, image: &Image) {
        self.pm.draw_pixmap(
            x,
            y,
            image.pixmap().as_ref(),
            &PixmapPaint::default(),
            self.ctm,
            None,
        );
    }

    /// Blit `image` scaled into `(x, y, w, h)`.
    pub fn draw_image_scaled(&mut self, x: i32, y: i32, w: i32, h: i32, image: &Image) {
        if w <= 0 || h <= 0 {
            trace!(w, h, "skipped empty image target");
            return;
        }
        let sx = w as f32 / image.width() as f32;
        let sy = h as f32 / image.height() as f32;
        let ts = self
            .ctm
            .pre_translate(x as f32, y as f32)
            .pre_scale(sx, sy);
        self.pm.draw_pixmap(
            0,
            0,
            image.pixmap().as_ref(),
            &PixmapPaint {
                quality: FilterQuality::Bilinear,
                ..PixmapPaint::default()
            },
            ts,
            None,
        );
    }

    /// Draw `text` anchored at `(x, y)` according to `format`.
    pub fn draw_text(&mut self, font: &Font, color: Color, x: i32, y: i32, text: &str, format: TextFormat) {
        for (line, left, top) in layout_lines(font, text, x as f32, y as f32, format) {
            draw_line_text(&mut self.pm, font, line, left, top, color, self.antialias, self.ctm);
        }
    }
}
