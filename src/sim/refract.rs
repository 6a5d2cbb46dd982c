//! Snell's-law refraction at a point boundary
//!
//! Light may approach from either side of the boundary: when the ray travels
//! against the supplied normal, the normal is flipped before solving.

use crate::{angle_wrap, signed_angle};

/// Result of a refraction solve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Refraction {
    /// New absolute heading (degrees, [0, 360))
    pub angle: f64,
    /// Snell's law had no real solution; `angle` is a reflection instead
    pub total_internal_reflection: bool,
}

/// Refract a ray heading `incoming` (degrees) across a boundary with outward
/// normal `normal`, passing from index `n1` into index `n2`.
pub fn refract(incoming: f64, normal: f64, n1: f64, n2: f64) -> Refraction {
    // Angle of incidence relative to the normal, in (-180, 180]
    let relative = signed_angle(incoming - normal);
    let theta1 = relative.to_radians();
    let mut sin_theta1 = theta1.sin();
    let mut normal = normal;

    if theta1.cos() < 0.0 {
        normal = angle_wrap(normal + 180.0);
        sin_theta1 = -sin_theta1;
    }

    let sin_theta2 = (n1 / n2) * sin_theta1.abs();

    if sin_theta2.abs() > 1.0 {
        return Refraction {
            angle: angle_wrap(2.0 * normal - incoming),
            total_internal_reflection: true,
        };
    }

    let mut theta2 = sin_theta2.asin();
    if sin_theta1 < 0.0 {
        theta2 = -theta2;
    }

    Refraction {
        angle: angle_wrap(normal + theta2.to_degrees()),
        total_internal_reflection: false,
    }
}
