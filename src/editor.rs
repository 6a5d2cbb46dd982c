//! Player placement, erasing and rotation
//!
//! The level scene is fixed; the player adds a limited number of mirrors,
//! lenses and portals on a square grid. The engine never sees quotas, only
//! the combined scene returned by [`Editor::scene`].

use std::error::Error;
use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::{HIT_RADIUS, SCENE_HEIGHT, SCENE_WIDTH};
use crate::sim::geom::near;
use crate::sim::{Element, ElementKind, Scene};

/// Placement grid (cell size and the top-left cell centre)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub size: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    /// Exclusive right edge of the placeable area
    pub width: f64,
    /// Exclusive bottom edge of the placeable area
    pub height: f64,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            size: 41.0,
            offset_x: 50.0,
            offset_y: 300.0,
            width: SCENE_WIDTH,
            height: SCENE_HEIGHT,
        }
    }
}

impl Grid {
    /// Round a point to the nearest cell centre
    pub fn snap(&self, pos: DVec2) -> DVec2 {
        let offset = DVec2::new(self.offset_x, self.offset_y);
        ((pos - offset) / self.size).round() * self.size + offset
    }

    /// True iff a snapped point lies in the placeable area
    pub fn contains(&self, pos: DVec2) -> bool {
        pos.x >= self.offset_x && pos.x < self.width && pos.y >= self.offset_y && pos.y < self.height
    }
}

/// Per-level quotas for player-placed elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementLimits {
    pub mirrors: u32,
    pub lenses: u32,
    /// Applies to entrances and exits separately
    pub portals: u32,
}

impl Default for PlacementLimits {
    fn default() -> Self {
        Self {
            mirrors: 99,
            lenses: 99,
            portals: 99,
        }
    }
}

impl PlacementLimits {
    /// Quota for `kind`, or `None` if the player can't place it
    pub fn limit(&self, kind: ElementKind) -> Option<u32> {
        match kind {
            ElementKind::Mirror => Some(self.mirrors),
            ElementKind::Lens => Some(self.lenses),
            ElementKind::PortalA | ElementKind::PortalB => Some(self.portals),
            _ => None,
        }
    }

    /// How many more of `kind` fit given `placed` already down
    pub fn remaining(&self, kind: ElementKind, placed: usize) -> u32 {
        let placed = u32::try_from(placed).unwrap_or(u32::MAX);
        self.limit(kind).map_or(0, |limit| limit.saturating_sub(placed))
    }
}

/// Why an editor action was refused
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementError {
    /// Quota for this kind is used up
    LimitReached(ElementKind),
    /// Snapped position is off the grid
    OutsideGrid(DVec2),
    /// Only mirrors, lenses and portals can be placed
    NotPlaceable(ElementKind),
    /// No player element near the position
    NothingToErase(DVec2),
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LimitReached(kind) => write!(f, "no {} left to place", kind.as_str()),
            Self::OutsideGrid(pos) => {
                write!(f, "({:.0}, {:.0}) is outside the grid", pos.x, pos.y)
            }
            Self::NotPlaceable(kind) => write!(f, "{} can't be placed", kind.as_str()),
            Self::NothingToErase(pos) => {
                write!(f, "nothing to erase at ({:.0}, {:.0})", pos.x, pos.y)
            }
        }
    }
}

impl Error for PlacementError {}

/// Level scene plus the player's placements
#[derive(Debug, Clone)]
pub struct Editor {
    level: Scene,
    placed: Vec<Element>,
    limits: PlacementLimits,
    grid: Grid,
    /// Index into `placed` of the element the wheel rotates
    last: Option<usize>,
}

impl Editor {
    pub fn new(level: Scene, limits: PlacementLimits, grid: Grid) -> Self {
        Self {
            level,
            placed: Vec::new(),
            limits,
            grid,
            last: None,
        }
    }

    pub fn level(&self) -> &Scene {
        &self.level
    }

    /// Player-placed elements, oldest first
    pub fn placed(&self) -> &[Element] {
        &self.placed
    }

    pub fn limits(&self) -> PlacementLimits {
        self.limits
    }

    fn placed_count(&self, kind: ElementKind) -> usize {
        self.placed.iter().filter(|e| e.kind() == kind).count()
    }

    /// How many more of `kind` the player may place
    pub fn remaining(&self, kind: ElementKind) -> u32 {
        self.limits.remaining(kind, self.placed_count(kind))
    }

    /// Place a default element of `kind` at the cell nearest `pos`
    pub fn place(&mut self, kind: ElementKind, pos: DVec2) -> Result<&Element, PlacementError> {
        if self.limits.limit(kind).is_none() {
            return Err(PlacementError::NotPlaceable(kind));
        }
        let snapped = self.grid.snap(pos);
        if !self.grid.contains(snapped) {
            return Err(PlacementError::OutsideGrid(snapped));
        }
        if self.remaining(kind) == 0 {
            log::info!("Placement refused: {} limit reached", kind.as_str());
            return Err(PlacementError::LimitReached(kind));
        }

        self.placed.push(Element::new(kind, snapped));
        let index = self.placed.len() - 1;
        self.last = Some(index);
        log::info!(
            "Placed {} at ({:.0}, {:.0}), {} left",
            kind.as_str(),
            snapped.x,
            snapped.y,
            self.remaining(kind)
        );
        Ok(&self.placed[index])
    }

    /// Remove the first player element whose box contains `pos`
    ///
    /// Level elements are never erased.
    pub fn erase_at(&mut self, pos: DVec2) -> Result<Element, PlacementError> {
        let index = self
            .placed
            .iter()
            .position(|e| near(pos, e.pos(), HIT_RADIUS))
            .ok_or(PlacementError::NothingToErase(pos))?;

        let removed = self.placed.remove(index);
        self.last = match self.last {
            Some(last) if last == index => None,
            Some(last) if last > index => Some(last - 1),
            other => other,
        };
        log::info!("Erased {}", removed.kind().as_str());
        Ok(removed)
    }

    /// Rotate the most recently placed element; false if it can't turn
    pub fn rotate_last(&mut self) -> bool {
        self.last
            .and_then(|index| self.placed.get_mut(index))
            .is_some_and(Element::rotate)
    }

    /// Remove every player placement
    pub fn clear(&mut self) {
        self.placed.clear();
        self.last = None;
    }

    /// Level plus placements, ready for a pass
    pub fn scene(&self) -> Scene {
        let mut scene = self.level.clone();
        for element in &self.placed {
            scene.add(element.clone());
        }
        scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Mirror;

    fn editor(limits: PlacementLimits) -> Editor {
        Editor::new(Scene::new(), limits, Grid::default())
    }

    #[test]
    fn test_grid_snap() {
        let grid = Grid::default();
        assert_eq!(grid.snap(DVec2::new(50.0, 300.0)), DVec2::new(50.0, 300.0));
        assert_eq!(grid.snap(DVec2::new(75.0, 310.0)), DVec2::new(91.0, 300.0));
        assert_eq!(grid.snap(DVec2::new(60.0, 330.0)), DVec2::new(50.0, 341.0));
    }

    #[test]
    fn test_grid_contains() {
        let grid = Grid::default();
        assert!(grid.contains(DVec2::new(50.0, 300.0)));
        assert!(!grid.contains(DVec2::new(9.0, 300.0)));
        assert!(!grid.contains(DVec2::new(50.0, 259.0)));
        assert!(!grid.contains(DVec2::new(50.0, 720.0)));
    }

    #[test]
    fn test_place_snaps_and_counts() {
        let mut ed = editor(PlacementLimits {
            mirrors: 2,
            lenses: 0,
            portals: 1,
        });
        let placed = ed.place(ElementKind::Mirror, DVec2::new(95.0, 345.0)).unwrap();
        assert_eq!(placed.pos(), DVec2::new(91.0, 341.0));
        assert_eq!(ed.remaining(ElementKind::Mirror), 1);

        ed.place(ElementKind::Mirror, DVec2::new(200.0, 400.0)).unwrap();
        assert_eq!(
            ed.place(ElementKind::Mirror, DVec2::new(300.0, 400.0)).unwrap_err(),
            PlacementError::LimitReached(ElementKind::Mirror)
        );
        assert_eq!(
            ed.place(ElementKind::Lens, DVec2::new(300.0, 400.0)).unwrap_err(),
            PlacementError::LimitReached(ElementKind::Lens)
        );
    }

    #[test]
    fn test_portal_limit_per_end() {
        let mut ed = editor(PlacementLimits {
            mirrors: 0,
            lenses: 0,
            portals: 1,
        });
        ed.place(ElementKind::PortalA, DVec2::new(100.0, 400.0)).unwrap();
        ed.place(ElementKind::PortalB, DVec2::new(400.0, 400.0)).unwrap();
        assert_eq!(ed.remaining(ElementKind::PortalA), 0);
        assert_eq!(ed.remaining(ElementKind::PortalB), 0);
    }

    #[test]
    fn test_refuses_outside_grid_and_fixed_kinds() {
        let mut ed = editor(PlacementLimits::default());
        assert!(matches!(
            ed.place(ElementKind::Mirror, DVec2::new(100.0, 100.0)),
            Err(PlacementError::OutsideGrid(_))
        ));
        assert_eq!(
            ed.place(ElementKind::Blackhole, DVec2::new(100.0, 400.0)).unwrap_err(),
            PlacementError::NotPlaceable(ElementKind::Blackhole)
        );
        assert!(ed.placed().is_empty());
    }

    #[test]
    fn test_erase_only_touches_player_elements() {
        let mut level = Scene::new();
        level.mirrors.push(Mirror::new(DVec2::new(91.0, 341.0), 45.0));
        let mut ed = Editor::new(level, PlacementLimits::default(), Grid::default());

        assert!(matches!(
            ed.erase_at(DVec2::new(91.0, 341.0)),
            Err(PlacementError::NothingToErase(_))
        ));

        ed.place(ElementKind::Lens, DVec2::new(91.0, 341.0)).unwrap();
        let removed = ed.erase_at(DVec2::new(100.0, 350.0)).unwrap();
        assert_eq!(removed.kind(), ElementKind::Lens);
        assert_eq!(ed.scene().mirrors.len(), 1);
        assert!(ed.scene().lenses.is_empty());
    }

    #[test]
    fn test_rotate_last() {
        let mut ed = editor(PlacementLimits::default());
        assert!(!ed.rotate_last());

        ed.place(ElementKind::Mirror, DVec2::new(91.0, 341.0)).unwrap();
        assert!(ed.rotate_last());
        assert_eq!(ed.scene().mirrors[0].angle, 135.0);

        ed.place(ElementKind::Lens, DVec2::new(300.0, 341.0)).unwrap();
        assert!(!ed.rotate_last());

        ed.erase_at(DVec2::new(300.0, 341.0)).unwrap();
        assert!(!ed.rotate_last());
    }

    #[test]
    fn test_scene_merges_level_and_placements() {
        let mut level = Scene::new();
        level.mirrors.push(Mirror::new(DVec2::new(600.0, 600.0), 45.0));
        let mut ed = Editor::new(level, PlacementLimits::default(), Grid::default());
        ed.place(ElementKind::Mirror, DVec2::new(91.0, 341.0)).unwrap();
        ed.place(ElementKind::PortalB, DVec2::new(500.0, 341.0)).unwrap();

        let scene = ed.scene();
        assert_eq!(scene.mirrors.len(), 2);
        assert_eq!(scene.portals_b.len(), 1);
        // The level scene itself is untouched
        assert_eq!(ed.level().mirrors.len(), 1);

        ed.clear();
        assert_eq!(ed.scene().mirrors.len(), 1);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            PlacementError::LimitReached(ElementKind::Lens).to_string(),
            "no lens left to place"
        );
        assert_eq!(
            PlacementError::OutsideGrid(DVec2::new(10.0, 20.0)).to_string(),
            "(10, 20) is outside the grid"
        );
    }
}
