//! Level files
//!
//! Levels are JSON objects with one optional array per element kind. Every
//! item carries `x` and `y`; the rest of its fields have defaults, and
//! unknown fields are ignored.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_LENS_INDEX;
use crate::editor::{Grid, PlacementLimits};
use crate::sim::{Blackhole, Bounds, Color, Emitter, Lens, Mirror, Portal, Prism, Scene, Target};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmitterItem {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub angle: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetItem {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorItem {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub angle: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LensItem {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refract_index: Option<f64>,
}

/// Item with nothing but a position (prisms, portals, black holes)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointItem {
    pub x: f64,
    pub y: f64,
}

impl PointItem {
    fn pos(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    fn from_pos(pos: DVec2) -> Self {
        Self { x: pos.x, y: pos.y }
    }
}

/// On-disk level layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelFile {
    pub emitters: Vec<EmitterItem>,
    pub targets: Vec<TargetItem>,
    pub mirrors: Vec<MirrorItem>,
    pub lenses: Vec<LensItem>,
    pub prisms: Vec<PointItem>,
    pub portals_a: Vec<PointItem>,
    pub portals_b: Vec<PointItem>,
    pub blackholes: Vec<PointItem>,
    /// Scene-wide lens index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refract_index: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Player quotas; all 99 when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<PlacementLimits>,
}

impl LevelFile {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Build a scene, snapping positions to `grid` when given
    ///
    /// Emitter headings snap to the cardinal directions and mirror surfaces
    /// to the diagonals.
    pub fn into_scene(self, grid: Option<&Grid>) -> Scene {
        let place = |x: f64, y: f64| {
            let pos = DVec2::new(x, y);
            grid.map_or(pos, |g| g.snap(pos))
        };
        let points = |items: Vec<PointItem>| -> Vec<DVec2> {
            items
                .iter()
                .map(|p| grid.map_or(p.pos(), |g| g.snap(p.pos())))
                .collect()
        };

        let defaults = Bounds::default();
        Scene {
            bounds: Bounds {
                width: self.width.unwrap_or(defaults.width),
                height: self.height.unwrap_or(defaults.height),
            },
            default_index: self.refract_index.unwrap_or(DEFAULT_LENS_INDEX),
            emitters: self
                .emitters
                .iter()
                .map(|e| Emitter::new(place(e.x, e.y), e.color, e.angle))
                .collect(),
            targets: self
                .targets
                .iter()
                .map(|t| Target::new(place(t.x, t.y), t.color))
                .collect(),
            mirrors: self
                .mirrors
                .iter()
                .map(|m| Mirror::new(place(m.x, m.y), m.angle))
                .collect(),
            lenses: self
                .lenses
                .iter()
                .map(|l| Lens {
                    pos: place(l.x, l.y),
                    refract_index: l.refract_index,
                })
                .collect(),
            prisms: points(self.prisms).into_iter().map(|pos| Prism { pos }).collect(),
            portals_a: points(self.portals_a)
                .into_iter()
                .map(|pos| Portal { pos })
                .collect(),
            portals_b: points(self.portals_b)
                .into_iter()
                .map(|pos| Portal { pos })
                .collect(),
            blackholes: points(self.blackholes)
                .into_iter()
                .map(|pos| Blackhole { pos })
                .collect(),
        }
    }

    /// Capture a scene (hit flags are not stored)
    pub fn from_scene(scene: &Scene) -> Self {
        let defaults = Bounds::default();
        Self {
            emitters: scene
                .emitters
                .iter()
                .map(|e| EmitterItem {
                    x: e.pos.x,
                    y: e.pos.y,
                    color: e.color,
                    angle: e.angle,
                })
                .collect(),
            targets: scene
                .targets
                .iter()
                .map(|t| TargetItem {
                    x: t.pos.x,
                    y: t.pos.y,
                    color: t.color,
                })
                .collect(),
            mirrors: scene
                .mirrors
                .iter()
                .map(|m| MirrorItem {
                    x: m.pos.x,
                    y: m.pos.y,
                    angle: m.angle,
                })
                .collect(),
            lenses: scene
                .lenses
                .iter()
                .map(|l| LensItem {
                    x: l.pos.x,
                    y: l.pos.y,
                    refract_index: l.refract_index,
                })
                .collect(),
            prisms: scene.prisms.iter().map(|p| PointItem::from_pos(p.pos)).collect(),
            portals_a: scene.portals_a.iter().map(|p| PointItem::from_pos(p.pos)).collect(),
            portals_b: scene.portals_b.iter().map(|p| PointItem::from_pos(p.pos)).collect(),
            blackholes: scene
                .blackholes
                .iter()
                .map(|b| PointItem::from_pos(b.pos))
                .collect(),
            refract_index: (scene.default_index != DEFAULT_LENS_INDEX)
                .then_some(scene.default_index),
            width: (scene.bounds.width != defaults.width).then_some(scene.bounds.width),
            height: (scene.bounds.height != defaults.height).then_some(scene.bounds.height),
            limits: None,
        }
    }

    /// Player quotas, defaulting every kind to 99
    pub fn limits(&self) -> PlacementLimits {
        self.limits.unwrap_or_default()
    }
}

/// Read a level file into a scene and its placement limits
pub fn load_level(path: impl AsRef<Path>, grid: Option<&Grid>) -> Result<(Scene, PlacementLimits)> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read level {}", path.display()))?;
    let level = LevelFile::from_json(&json)
        .with_context(|| format!("Failed to parse level {}", path.display()))?;

    let limits = level.limits();
    let scene = level.into_scene(grid);
    log::info!(
        "Loaded level {}: {} emitters, {} targets, {} mirrors, {} lenses, {} prisms, {} blackholes",
        path.display(),
        scene.emitters.len(),
        scene.targets.len(),
        scene.mirrors.len(),
        scene.lenses.len(),
        scene.prisms.len(),
        scene.blackholes.len(),
    );
    Ok((scene, limits))
}

/// Write a scene (and optional limits) as a pretty-printed level file
pub fn save_level(
    path: impl AsRef<Path>,
    scene: &Scene,
    limits: Option<PlacementLimits>,
) -> Result<()> {
    let path = path.as_ref();
    let mut level = LevelFile::from_scene(scene);
    level.limits = limits;
    let json = level.to_json_pretty().context("Failed to serialize level")?;
    fs::write(path, json).with_context(|| format!("Failed to write level {}", path.display()))?;
    log::info!("Level saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVEL: &str = r#"{
        "emitters": [{"x": 50, "y": 300, "angle": 10}],
        "targets": [{"x": 500, "y": 300, "color": "green"}, {"x": 700, "y": 500}],
        "mirrors": [{"x": 300, "y": 300}],
        "lenses": [{"x": 400, "y": 400, "refract_index": 1.8}, {"x": 420, "y": 400}],
        "prisms": [{"x": 600, "y": 300, "angle": 30}],
        "blackholes": [{"x": 800, "y": 600}],
        "refract_index": 1.3,
        "limits": {"mirrors": 2, "lenses": 1}
    }"#;

    #[test]
    fn test_parse_applies_item_defaults() {
        let level = LevelFile::from_json(LEVEL).unwrap();
        assert_eq!(level.emitters[0].color, Color::White);
        assert_eq!(level.targets[1].color, Color::White);
        assert_eq!(level.mirrors[0].angle, 0.0);
        assert_eq!(level.lenses[1].refract_index, None);
        assert!(level.portals_a.is_empty());

        let limits = level.limits();
        assert_eq!(limits.mirrors, 2);
        assert_eq!(limits.lenses, 1);
        assert_eq!(limits.portals, 99);
    }

    #[test]
    fn test_empty_object_is_an_empty_level() {
        let level = LevelFile::from_json("{}").unwrap();
        let scene = level.into_scene(None);
        assert!(scene.emitters.is_empty());
        assert_eq!(scene.default_index, DEFAULT_LENS_INDEX);
        assert_eq!(scene.bounds, Bounds::default());
    }

    #[test]
    fn test_into_scene_quantises_angles() {
        let scene = LevelFile::from_json(LEVEL).unwrap().into_scene(None);
        assert_eq!(scene.emitters[0].angle, 0.0);
        assert_eq!(scene.mirrors[0].angle, 45.0);
        assert_eq!(scene.default_index, 1.3);
        assert_eq!(scene.lens_index(0), 1.8);
        assert_eq!(scene.lens_index(1), 1.3);
        assert_eq!(scene.prisms.len(), 1);
    }

    #[test]
    fn test_into_scene_snaps_to_grid() {
        let grid = Grid::default();
        let scene = LevelFile::from_json(LEVEL).unwrap().into_scene(Some(&grid));
        assert_eq!(scene.targets[0].pos, DVec2::new(501.0, 300.0));
        assert_eq!(scene.lenses[0].pos, DVec2::new(419.0, 382.0));
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(LevelFile::from_json(r#"{"emitters": [{"y": 3}]}"#).is_err());
        assert!(LevelFile::from_json(r#"{"targets": [{"x": 1, "y": 2, "color": "pink"}]}"#).is_err());
    }

    #[test]
    fn test_save_and_load_level() {
        let dir = std::env::temp_dir().join("lumen_puzzle_test_level");
        let _ = fs::create_dir_all(&dir);
        let path = dir.join("level.json");

        let scene = LevelFile::from_json(LEVEL).unwrap().into_scene(None);
        let limits = PlacementLimits {
            mirrors: 1,
            lenses: 2,
            portals: 0,
        };
        save_level(&path, &scene, Some(limits)).unwrap();

        let (loaded, loaded_limits) = load_level(&path, None).unwrap();
        assert_eq!(loaded_limits, limits);
        assert_eq!(loaded.emitters, scene.emitters);
        assert_eq!(loaded.targets, scene.targets);
        assert_eq!(loaded.lenses, scene.lenses);
        assert_eq!(loaded.default_index, scene.default_index);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let err = load_level("/nonexistent/lumen/level.json", None).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/lumen/level.json"));
    }
}
