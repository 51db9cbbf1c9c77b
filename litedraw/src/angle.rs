use litedraw_canvas::to_degrees;

/// An arc angle, measured clockwise from 3 o'clock.
///
/// Integers are degrees, floats are radians:
///
/// ```
/// use litedraw::Angle;
/// assert_eq!(Angle::from(90), Angle::from(std::f64::consts::FRAC_PI_2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Angle(f32);

impl Angle {
    pub fn degrees(self) -> f32 {
        self.0
    }
}

impl From<i32> for Angle {
    fn from(degrees: i32) -> Self {
        Angle(degrees as f32)
    }
}

impl From<f64> for Angle {
    fn from(radians: f64) -> Self {
        Angle(to_degrees(radians) as f32)
    }
}
