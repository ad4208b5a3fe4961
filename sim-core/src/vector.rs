//! 2-D vector helpers for the growth engine.
//!
//! Positions and directions are [`glam::DVec2`]; glam already covers the
//! arithmetic (vector and scalar add/sub, mul/div, dot, distance). This module
//! adds the few operations the growth rules need on top of that.

use glam::DVec2;

/// Point or direction in simulation space.
pub type Vector2 = DVec2;

/// Reference unit vector every growth rotation starts from.
pub const UNIT_RIGHT: Vector2 = DVec2::X;

/// Lengths at or below this are treated as "no direction".
pub const DIRECTION_EPSILON: f64 = 1e-9;

pub trait Vector2Ext: Sized {
    /// Rotates counter-clockwise by `radians` using the standard 2-D rotation matrix.
    fn rotated(self, radians: f64) -> Self;

    /// Angle of the vector measured from the positive x axis, in `(-pi, pi]`.
    fn polar_angle(self) -> f64;

    /// Normalizes the vector, or returns `None` when its length is too close
    /// to zero (or not finite) to define a direction.
    fn unit_or_none(self) -> Option<Self>;
}

impl Vector2Ext for DVec2 {
    #[inline]
    fn rotated(self, radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        DVec2::new(cos * self.x - sin * self.y, sin * self.x + cos * self.y)
    }

    #[inline]
    fn polar_angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    #[inline]
    fn unit_or_none(self) -> Option<Self> {
        let len = self.length();
        if len.is_finite() && len > DIRECTION_EPSILON {
            Some(self / len)
        } else {
            None
        }
    }
}

/// Unit vector pointing at `radians` from the positive x axis.
#[inline]
pub fn unit_at(radians: f64) -> Vector2 {
    UNIT_RIGHT.rotated(radians)
}
