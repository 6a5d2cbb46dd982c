//! Lumen Puzzle - grid-based optical puzzle engine
//!
//! Core modules:
//! - `sim`: Deterministic light propagation (rays, optics, target hits)
//! - `settings`: Engine tunables and presets
//! - `level`: Level file schema and loading
//! - `editor`: Player placement, erasing and rotation
//! - `generate`: Seeded random scenes

pub mod editor;
pub mod generate;
pub mod level;
pub mod settings;
pub mod sim;

pub use editor::{Editor, Grid, PlacementError, PlacementLimits};
pub use level::{LevelFile, load_level, save_level};
pub use settings::{EngineProfile, EngineSettings, LensModel, Spectrum};

use glam::DVec2;

/// Engine configuration constants
pub mod consts {
    /// Scene bounds (pixels)
    pub const SCENE_WIDTH: f64 = 1280.0;
    pub const SCENE_HEIGHT: f64 = 720.0;

    /// Distance a ray travels per step
    pub const STEP: f64 = 1.0;
    /// Forced forward step after an interaction
    pub const NUDGE: f64 = 2.0;

    /// Step cap per ray (level play)
    pub const MAX_STEPS: u32 = 20_000;
    /// Step cap per ray (workshop)
    pub const WORKSHOP_MAX_STEPS: u32 = 3_000;
    /// Bounce cap per ray
    pub const MAX_BOUNCES: u32 = 64;

    /// Half-width of the square hit box around every element
    pub const HIT_RADIUS: f64 = 18.0;
    /// Radius of the circular lens and prism footprints
    pub const FOOTPRINT_RADIUS: f64 = 18.0;

    /// Refractive index of air
    pub const N_AIR: f64 = 1.0;
    /// Scene-wide lens index when neither lens nor level specify one
    pub const DEFAULT_LENS_INDEX: f64 = 1.5;

    /// Fixed-bend lens: bend applied on capture (degrees)
    pub const FIXED_BEND_DEGREES: f64 = 45.0;
    /// Fixed-bend lens: distance from the centre that captures a ray
    pub const FIXED_BEND_CAPTURE: f64 = 3.0;
    /// Fixed-bend lens: distance from the centre that releases a ray
    pub const FIXED_BEND_RELEASE: f64 = 2.0 * FOOTPRINT_RADIUS;

    /// Angular offset of dispersed prism rays (degrees)
    pub const PRISM_SPREAD: f64 = 10.0;
}

/// Wrap an angle in degrees to [0, 360)
#[inline]
pub fn angle_wrap(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Wrap an angle in degrees to (-180, 180]
#[inline]
pub fn signed_angle(deg: f64) -> f64 {
    let wrapped = angle_wrap(deg);
    if wrapped > 180.0 { wrapped - 360.0 } else { wrapped }
}

/// Vector of the given length pointing along `deg` (0° = +x, clockwise on screen)
#[inline]
pub fn vector_from_angle(deg: f64, length: f64) -> DVec2 {
    let rad = deg.to_radians();
    DVec2::new(rad.cos() * length, rad.sin() * length)
}

/// Heading in degrees of a vector, wrapped to [0, 360)
#[inline]
pub fn angle_of(v: DVec2) -> f64 {
    angle_wrap(v.y.atan2(v.x).to_degrees())
}
