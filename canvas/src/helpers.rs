// --- Helpers ---
use tiny_skia::{Paint, Rect};

use crate::Color;

/// Split a `0xRRGGBBAA` value into its channels.
#[inline]
pub fn hex_to_rgba(c: u32) -> (u8, u8, u8, u8) {
    (
        ((c >> 24) & 0xFF) as u8,
        ((c >> 16) & 0xFF) as u8,
        ((c >> 8) & 0xFF) as u8,
        (c & 0xFF) as u8,
    )
}

/// Create a tiny-skia Paint with the given color.
#[inline]
pub fn make_paint(color: Color, aa: bool) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = aa;
    paint
}

/// Convert radians to degrees.
#[inline]
pub fn to_degrees(radians: f64) -> f64 {
    radians * (180.0 / std::f64::consts::PI)
}

/// Bounding rectangle of an ellipse given by its centre and radii.
/// Saturates at the `i32` range.
#[inline]
pub fn centered_rect(cx: i32, cy: i32, rx: i32, ry: i32) -> (i32, i32, i32, i32) {
    (
        cx.saturating_sub(rx),
        cy.saturating_sub(ry),
        rx.saturating_mul(2),
        ry.saturating_mul(2),
    )
}

/// Ordered float bounds of `start..start + extent`.
fn span(start: i32, extent: i32) -> (f32, f32) {
    let (a, b) = (start as f64, start as f64 + extent as f64);
    (a.min(b) as f32, a.max(b) as f32)
}

/// Integer rectangle to a tiny-skia rect, shifted by `offset` on both axes.
/// Negative extents are normalised.
pub fn rect_from_xywh(x: i32, y: i32, w: i32, h: i32, offset: f32) -> Option<Rect> {
    let (left, right) = span(x, w);
    let (top, bottom) = span(y, h);
    Rect::from_ltrb(left + offset, top + offset, right + offset, bottom + offset)
}

/// Premultiply straight RGBA in place.
pub fn premultiply(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        let a = px[3] as u16;
        px[0] = ((px[0] as u16 * a) / 255) as u8;
        px[1] = ((px[1] as u16 * a) / 255) as u8;
        px[2] = ((px[2] as u16 * a) / 255) as u8;
    }
}

/// Un-premultiply one pixel back to straight RGBA.
#[inline]
pub fn demultiply(px: &[u8]) -> (u8, u8, u8, u8) {
    let a = px[3] as u32;
    if a == 0 {
        return (0, 0, 0, 0);
    }
    let r = ((px[0] as u32 * 255) / a).min(255);
    let g = ((px[1] as u32 * 255) / a).min(255);
    let b = ((px[2] as u32 * 255) / a).min(255);
    (r as u8, g as u8, b as u8, a as u8)
}
