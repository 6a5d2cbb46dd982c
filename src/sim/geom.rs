//! Geometry kernel
//!
//! Point stepping and proximity tests used by the ray marcher. Hit tests on
//! placed elements use an axis-aligned square box (`near`); lens and prism
//! footprints use a circle (`inside_circle`).

use glam::DVec2;

use crate::{angle_of, angle_wrap, vector_from_angle};

/// Move a point by `step` along `angle` (degrees)
#[inline]
pub fn advance(pos: DVec2, angle: f64, step: f64) -> DVec2 {
    pos + vector_from_angle(angle, step)
}

/// True iff both axis deltas are within `radius` (square box, not a circle)
#[inline]
pub fn near(a: DVec2, b: DVec2, radius: f64) -> bool {
    (a.x - b.x).abs() <= radius && (a.y - b.y).abs() <= radius
}

/// True iff `p` lies within the closed disc of `radius` around `center`
#[inline]
pub fn inside_circle(p: DVec2, center: DVec2, radius: f64) -> bool {
    p.distance_squared(center) <= radius * radius
}

/// Outward normal (degrees) of a circular footprint at point `p`
///
/// Approximates the boundary normal by the direction from the centre to the
/// ray position.
#[inline]
pub fn outward_normal(center: DVec2, p: DVec2) -> f64 {
    angle_of(p - center)
}

/// Reflect a heading off a mirror line oriented at `mirror_angle`
#[inline]
pub fn reflect_heading(heading: f64, mirror_angle: f64) -> f64 {
    angle_wrap(2.0 * mirror_angle - heading)
}

/// Axis-aligned scene rectangle `[0, width) x [0, height)`
#[inline]
pub fn in_bounds(p: DVec2, width: f64, height: f64) -> bool {
    p.x >= 0.0 && p.x < width && p.y >= 0.0 && p.y < height
}
