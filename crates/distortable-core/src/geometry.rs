//! Geometry kernel for overlay editing.
//!
//! Every function here works on projected (screen/layer) points, never on
//! geographic coordinates. Keeping the math in projected space keeps scaling
//! and rotation linear regardless of where the overlay sits on the map.
//!
//! # Angle Convention
//!
//! Bearings are measured with `atan2(center.y - p.y, center.x - p.x)`.
//! [`angle_delta`] returns the raw difference of two bearings and is not
//! wrapped into `(-π, π]`; use [`normalize_angle`] when a wrapped value is
//! needed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the geometry kernel.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    /// The reference point coincides with the center, so there is no radius
    /// to scale from.
    #[error("Reference point lies on the center; scale factor is undefined")]
    DegenerateRadius,
}

/// A point in projected (screen) space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    /// Vector from `other` to `self`.
    fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

/// Shift `point` by `(dx, dy)`.
#[inline]
pub fn translate(point: Point, dx: f64, dy: f64) -> Point {
    Point::new(point.x + dx, point.y + dy)
}

/// Squared euclidean distance between two points.
///
/// Never negative, and zero only when `a == b`.
#[inline]
pub fn squared_distance(a: Point, b: Point) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

/// Ratio between the distance `center → new_point` and `center → former_point`.
///
/// # Errors
///
/// Returns [`GeometryError::DegenerateRadius`] when `former_point` lies on
/// `center`, since the ratio has a zero denominator.
pub fn scale_factor(center: Point, former_point: Point, new_point: Point) -> Result<f64, GeometryError> {
    let former_radius_sq = squared_distance(center, former_point);
    if former_radius_sq == 0.0 {
        return Err(GeometryError::DegenerateRadius);
    }

    let new_radius_sq = squared_distance(center, new_point);
    Ok((new_radius_sq / former_radius_sq).sqrt())
}

#[inline]
fn bearing(center: Point, point: Point) -> f64 {
    (center.y - point.y).atan2(center.x - point.x)
}

/// Signed angle (radians) swept from `former_point` to `new_point` around `center`.
///
/// The result is the plain difference of two `atan2` bearings, so it ranges
/// over `(-2π, 2π)`.
pub fn angle_delta(center: Point, former_point: Point, new_point: Point) -> f64 {
    bearing(center, new_point) - bearing(center, former_point)
}

/// Wrap an angle into `(-π, π]`.
pub fn normalize_angle(angle: f64) -> f64 {
    use std::f64::consts::{PI, TAU};

    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Axis-aligned affine transform: `(a·x + b, c·y + d)`.
///
/// Group drags only ever build translations, but the general form is kept so
/// the same type can describe a uniform scale along both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transformation {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Transformation {
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self { a, b, c, d }
    }

    /// Pure translation by `(dx, dy)`.
    pub fn translation(dx: f64, dy: f64) -> Self {
        Self::new(1.0, dx, 1.0, dy)
    }

    pub fn transform(&self, point: Point) -> Point {
        Point::new(self.a * point.x + self.b, self.c * point.y + self.d)
    }

    pub fn transform_all<const N: usize>(&self, points: &[Point; N]) -> [Point; N] {
        points.map(|p| self.transform(p))
    }
}

/// Scale `point` by `scale` and rotate it by `angle` radians, both about `center`.
///
/// The rotation turns in the same sense that [`angle_delta`] measures, so
/// rotating a point by `angle_delta(center, p, q)` aligns it with `q`.
pub fn scale_rotate_about(center: Point, point: Point, scale: f64, angle: f64) -> Point {
    let (sin, cos) = angle.sin_cos();
    let dx = (point.x - center.x) * scale;
    let dy = (point.y - center.y) * scale;

    Point::new(
        center.x + dx * cos - dy * sin,
        center.y + dx * sin + dy * cos,
    )
}

/// Mean of a set of points. Returns the origin for an empty slice.
pub fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::default();
    }

    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point::new(sx / n, sy / n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const EPS: f64 = 1e-9;

    #[test]
    fn test_translate() {
        let p = translate(Point::new(1.0, 2.0), 5.0, -3.0);
        assert_eq!(p, Point::new(6.0, -1.0));
    }

    #[test]
    fn test_squared_distance() {
        assert_eq!(squared_distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)), 25.0);
        assert_eq!(squared_distance(Point::new(2.0, 2.0), Point::new(2.0, 2.0)), 0.0);
    }

    #[test]
    fn test_scale_factor_doubles() {
        let s = scale_factor(Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(20.0, 0.0));
        assert_eq!(s, Ok(2.0));
    }

    #[test]
    fn test_scale_factor_degenerate() {
        let c = Point::new(4.0, 4.0);
        assert_eq!(
            scale_factor(c, c, Point::new(1.0, 1.0)),
            Err(GeometryError::DegenerateRadius)
        );
    }

    #[test]
    fn test_scale_factor_to_center_is_zero() {
        let c = Point::new(0.0, 0.0);
        assert_eq!(scale_factor(c, Point::new(3.0, 0.0), c), Ok(0.0));
    }

    #[test]
    fn test_angle_delta_quarter_turn() {
        let delta = angle_delta(Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 1.0));
        // Raw bearings are π and -π/2, so the unwrapped delta is -3π/2.
        assert!((delta + 3.0 * FRAC_PI_2).abs() < EPS);
        assert!((normalize_angle(delta) - FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn test_angle_delta_same_point_is_zero() {
        let c = Point::new(3.0, -2.0);
        let p = Point::new(7.5, 11.0);
        assert_eq!(angle_delta(c, p, p), 0.0);
    }

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(2.5 * PI) - FRAC_PI_2).abs() < EPS);
        assert!((normalize_angle(PI) - PI).abs() < EPS);
        assert!((normalize_angle(-FRAC_PI_2) + FRAC_PI_2).abs() < EPS);
        assert!(normalize_angle(0.0).abs() < EPS);
    }

    #[test]
    fn test_translation_transform() {
        let t = Transformation::translation(5.0, -3.0);
        let pts = t.transform_all(&[Point::new(0.0, 0.0), Point::new(10.0, 10.0)]);
        assert_eq!(pts, [Point::new(5.0, -3.0), Point::new(15.0, 7.0)]);
    }

    #[test]
    fn test_scale_rotate_aligns_with_angle_delta() {
        let c = Point::new(10.0, 10.0);
        let former = Point::new(20.0, 10.0);
        let target = Point::new(10.0, 30.0);

        let scale = scale_factor(c, former, target).unwrap();
        let angle = angle_delta(c, former, target);
        let moved = scale_rotate_about(c, former, scale, angle);

        assert!((moved.x - target.x).abs() < EPS);
        assert!((moved.y - target.y).abs() < EPS);
    }

    #[test]
    fn test_centroid() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(0.0, 2.0),
            Point::new(4.0, 2.0),
        ];
        assert_eq!(centroid(&pts), Point::new(2.0, 1.0));
        assert_eq!(centroid(&[]), Point::default());
    }
}
