//! Path construction for the shapes the surface draws.

use tiny_skia::{Path, PathBuilder, Rect};

/// Angular step used when sampling an arc, in radians.
const ARC_STEP: f64 = 0.05;

/// Point on the ellipse inscribed in `rect` at `angle` radians, measured
/// clockwise from 3 o'clock (y grows down). Uses the true angle, so the point
/// lies on the ray leaving the centre at `angle`.
fn ellipse_point(rect: &Rect, angle: f64) -> (f32, f32) {
    let rx = rect.width() as f64 / 2.0;
    let ry = rect.height() as f64 / 2.0;
    let cx = rect.left() as f64 + rx;
    let cy = rect.top() as f64 + ry;
    let (sin, cos) = angle.sin_cos();
    let denom = ((ry * cos).powi(2) + (rx * sin).powi(2)).sqrt();
    let r = if denom > 0.0 { rx * ry / denom } else { 0.0 };
    ((cx + r * cos) as f32, (cy + r * sin) as f32)
}

/// Sample an elliptical arc into `pb`. The first point is connected with
/// `line_to` when `connect` is set, otherwise it starts a new contour.
fn push_arc(pb: &mut PathBuilder, rect: &Rect, start_deg: f32, sweep_deg: f32, connect: bool) {
    let deg2rad = std::f64::consts::PI / 180.0;
    let sweep = (sweep_deg as f64).clamp(-360.0, 360.0) * deg2rad;
    let start = start_deg as f64 * deg2rad;
    let steps = ((sweep.abs() / ARC_STEP) as usize).max(8);

    for i in 0..=steps {
        let t = start + sweep * (i as f64 / steps as f64);
        let (px, py) = ellipse_point(rect, t);
        if i == 0 && !connect {
            pb.move_to(px, py);
        } else {
            pb.line_to(px, py);
        }
    }
}

/// Open arc along the ellipse inscribed in `rect`.
pub fn arc_path(rect: Rect, start_deg: f32, sweep_deg: f32) -> Option<Path> {
    if sweep_deg == 0.0 || !sweep_deg.is_finite() || !start_deg.is_finite() {
        return None;
    }
    let mut pb = PathBuilder::new();
    push_arc(&mut pb, &rect, start_deg, sweep_deg, false);
    pb.finish()
}

/// Closed pie wedge: centre, arc, back to centre.
pub fn pie_path(rect: Rect, start_deg: f32, sweep_deg: f32) -> Option<Path> {
    if sweep_deg == 0.0 || !sweep_deg.is_finite() || !start_deg.is_finite() {
        return None;
    }
    let mut pb = PathBuilder::new();
    if sweep_deg.abs() >= 360.0 {
        pb.push_oval(rect);
        return pb.finish();
    }
    let cx = rect.left() + rect.width() / 2.0;
    let cy = rect.top() + rect.height() / 2.0;
    pb.move_to(cx, cy);
    push_arc(&mut pb, &rect, start_deg, sweep_deg, true);
    pb.close();
    pb.finish()
}

pub fn line_path(x0: f32, y0: f32, x1: f32, y1: f32) -> Option<Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(x0, y0);
    pb.line_to(x1, y1);
    pb.finish()
}

/// Cubic Bezier from `p0` to `p3` with control points `p1`, `p2`.
pub fn bezier_path(points: [(f32, f32); 4], offset: f32) -> Option<Path> {
    let [p0, p1, p2, p3] = points;
    let mut pb = PathBuilder::new();
    pb.move_to(p0.0 + offset, p0.1 + offset);
    pb.cubic_to(
        p1.0 + offset,
        p1.1 + offset,
        p2.0 + offset,
        p2.1 + offset,
        p3.0 + offset,
        p3.1 + offset,
    );
    pb.finish()
}

/// Closed polygon through `points`; needs at least two vertices.
pub fn polygon_path(points: &[(i32, i32)], offset: f32) -> Option<Path> {
    if points.len() < 2 {
        return None;
    }
    let mut pb = PathBuilder::new();
    let (fx, fy) = points[0];
    pb.move_to(fx as f32 + offset, fy as f32 + offset);
    for &(x, y) in &points[1..] {
        pb.line_to(x as f32 + offset, y as f32 + offset);
    }
    pb.close();
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Rect {
        Rect::from_xywh(0.0, 0.0, 100.0, 100.0).unwrap()
    }

    #[test]
    fn test_ellipse_point_clockwise_from_three_oclock() {
        let r = square();
        let (x, y) = ellipse_point(&r, 0.0);
        assert!((x - 100.0).abs() < 1e-4 && (y - 50.0).abs() < 1e-4);

        // 90 degrees clockwise lands at 6 o'clock because y grows down.
        let (x, y) = ellipse_point(&r, std::f64::consts::FRAC_PI_2);
        assert!((x - 50.0).abs() < 1e-4 && (y - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_true_angle_on_wide_ellipse() {
        let r = Rect::from_xywh(0.0, 0.0, 200.0, 100.0).unwrap();
        let (x, y) = ellipse_point(&r, std::f64::consts::FRAC_PI_4);
        // On the 45 degree ray the offsets from the centre are equal.
        assert!(((x - 100.0) - (y - 50.0)).abs() < 1e-3);
    }

    #[test]
    fn test_degenerate_shapes() {
        assert!(arc_path(square(), 0.0, 0.0).is_none());
        assert!(pie_path(square(), 10.0, 0.0).is_none());
        assert!(polygon_path(&[(1, 1)], 0.0).is_none());
    }

    #[test]
    fn test_full_sweep_pie_is_oval() {
        let path = pie_path(square(), 0.0, 720.0).unwrap();
        let b = path.bounds();
        assert_eq!((b.width(), b.height()), (100.0, 100.0));
    }

    #[test]
    fn test_quarter_arc_bounds() {
        let path = arc_path(square(), 0.0, 90.0).unwrap();
        let b = path.bounds();
        assert!(b.left() >= 49.9 && b.top() >= 49.9);
        assert!(b.right() <= 100.01 && b.bottom() <= 100.01);
    }
}
