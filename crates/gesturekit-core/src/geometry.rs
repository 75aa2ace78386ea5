#![forbid(unsafe_code)]

//! Geometric primitives.

use std::f32::consts::{PI, TAU};
use std::ops::{Add, Sub};

/// A location on the host surface, in pixels.
///
/// Origin is the top-left corner; `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// The origin.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Create a new point.
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[inline]
    #[must_use]
    pub fn distance(self, other: Point) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Length of the vector from the origin to this point.
    #[inline]
    #[must_use]
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Angle of the line from `self` to `other`, in radians.
    #[inline]
    #[must_use]
    pub fn angle_to(self, other: Point) -> f32 {
        (other.y - self.y).atan2(other.x - self.x)
    }
}

impl Add for Point {
    type Output = Point;

    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Shortest signed angle that rotates `from` onto `to`, in `(-PI, PI]`.
#[must_use]
pub fn shortest_angle(from: f32, to: f32) -> f32 {
    let delta = (to - from).rem_euclid(TAU);
    if delta > PI { delta - TAU } else { delta }
}

/// Normalize an angle in degrees into `[-180, 180]`.
#[must_use]
pub fn normalize_degrees(degrees: f32) -> f32 {
    let mut angle = degrees % 360.0;
    if angle < -180.0 {
        angle += 360.0;
    }
    if angle > 180.0 {
        angle -= 360.0;
    }
    angle
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn distance_is_euclidean() {
        let a = Point::new(100.0, 100.0);
        let b = Point::new(103.0, 104.0);
        assert!((a.distance(b) - 5.0).abs() < EPS);
        assert!((b.distance(a) - 5.0).abs() < EPS);
    }

    #[test]
    fn sub_and_add_roundtrip() {
        let a = Point::new(3.0, -2.0);
        let b = Point::new(1.5, 4.0);
        assert_eq!((a - b) + b, a);
    }

    #[test]
    fn angle_to_follows_screen_axes() {
        let o = Point::ZERO;
        assert!((o.angle_to(Point::new(1.0, 0.0))).abs() < EPS);
        assert!((o.angle_to(Point::new(0.0, 1.0)) - PI / 2.0).abs() < EPS);
    }

    #[test]
    fn shortest_angle_wraps_across_pi() {
        // 170° to -170° is a +20° turn, not -340°.
        let from = 170f32.to_radians();
        let to = (-170f32).to_radians();
        assert!((shortest_angle(from, to) - 20f32.to_radians()).abs() < 1e-4);
        assert!((shortest_angle(to, from) + 20f32.to_radians()).abs() < 1e-4);
    }

    #[test]
    fn shortest_angle_of_equal_angles_is_zero() {
        assert!(shortest_angle(1.25, 1.25).abs() < EPS);
    }

    #[test]
    fn normalize_degrees_range() {
        assert!((normalize_degrees(190.0) + 170.0).abs() < EPS);
        assert!((normalize_degrees(-190.0) - 170.0).abs() < EPS);
        assert!((normalize_degrees(725.0) - 5.0).abs() < EPS);
        assert!((normalize_degrees(45.0) - 45.0).abs() < EPS);
    }
}
