//! Engine settings and presets
//!
//! Every tunable of the light engine lives here. Presets mirror the two ways
//! the game runs a pass: level play and the level workshop.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::Color;

/// How lenses act on rays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LensModel {
    /// Snell's law at footprint entry and exit
    #[default]
    Snell,
    /// Fixed bend once per traversal
    FixedBend,
}

impl LensModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LensModel::Snell => "snell",
            LensModel::FixedBend => "fixed_bend",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "snell" => Some(LensModel::Snell),
            "fixed_bend" | "fixed" | "bend" => Some(LensModel::FixedBend),
            _ => None,
        }
    }
}

/// Colors a prism splits white light into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Spectrum {
    /// Green at +spread, blue at −spread
    #[default]
    TwoBand,
    /// Red at −spread, green straight on, blue at +spread
    ThreeBand,
}

impl Spectrum {
    /// (angular offset, color) per child ray, in enqueue order
    pub fn bands(&self, spread: f64) -> Vec<(f64, Color)> {
        match self {
            Spectrum::TwoBand => vec![(spread, Color::Green), (-spread, Color::Blue)],
            Spectrum::ThreeBand => vec![
                (-spread, Color::Red),
                (0.0, Color::Green),
                (spread, Color::Blue),
            ],
        }
    }
}

/// Engine configuration for one pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    // === Models ===
    pub lens_model: LensModel,
    pub prism_enabled: bool,
    pub spectrum: Spectrum,
    /// Angular offset of dispersed rays (degrees)
    pub prism_spread: f64,

    // === Caps ===
    /// Steps per ray
    pub max_steps: u32,
    /// Bounces per ray
    pub max_bounces: u32,

    // === Distances ===
    /// Distance advanced per step
    pub step: f64,
    /// Forced step after an interaction
    pub nudge: f64,
    /// Half-width of the square hit box (mirrors, portals, black holes, targets)
    pub hit_radius: f64,
    /// Radius of lens and prism footprints
    pub lens_radius: f64,

    // === Fixed-bend lens ===
    pub fixed_bend_degrees: f64,
    pub fixed_bend_capture: f64,
    pub fixed_bend_release: f64,

    // === Media ===
    pub air_index: f64,

    // === Output ===
    /// Emit a `Step` event for every advance
    pub record_path: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            lens_model: LensModel::Snell,
            prism_enabled: true,
            spectrum: Spectrum::TwoBand,
            prism_spread: PRISM_SPREAD,

            max_steps: MAX_STEPS,
            max_bounces: MAX_BOUNCES,

            step: STEP,
            nudge: NUDGE,
            hit_radius: HIT_RADIUS,
            lens_radius: FOOTPRINT_RADIUS,

            fixed_bend_degrees: FIXED_BEND_DEGREES,
            fixed_bend_capture: FIXED_BEND_CAPTURE,
            fixed_bend_release: FIXED_BEND_RELEASE,

            air_index: N_AIR,

            record_path: false,
        }
    }
}

impl EngineSettings {
    /// Parse settings from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Builder-style toggle for path recording
    pub fn with_path(mut self, record_path: bool) -> Self {
        self.record_path = record_path;
        self
    }
}

/// Preset engine configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EngineProfile {
    /// Level play: fixed-bend lenses, portals, no prisms
    #[default]
    Play,
    /// Level workshop: Snell lenses and prisms, shorter step cap
    Workshop,
}

impl EngineProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineProfile::Play => "play",
            EngineProfile::Workshop => "workshop",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "play" | "level" => Some(EngineProfile::Play),
            "workshop" | "tool" | "editor" => Some(EngineProfile::Workshop),
            _ => None,
        }
    }

    pub fn settings(&self) -> EngineSettings {
        match self {
            EngineProfile::Play => EngineSettings {
                lens_model: LensModel::FixedBend,
                prism_enabled: false,
                max_steps: MAX_STEPS,
                ..EngineSettings::default()
            },
            EngineProfile::Workshop => EngineSettings {
                lens_model: LensModel::Snell,
                prism_enabled: true,
                spectrum: Spectrum::TwoBand,
                max_steps: WORKSHOP_MAX_STEPS,
                ..EngineSettings::default()
            },
        }
    }
}
