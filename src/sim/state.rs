//! Scene model and per-ray state
//!
//! The scene owns every placed element in typed collections, one per kind.
//! Between passes the editor mutates those collections; during a pass the
//! engine only writes `Target::hit`.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::angle_wrap;
use crate::consts::*;

/// Light color. `White` is the undispersed identity color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    #[default]
    White,
    Red,
    Green,
    Blue,
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "white" => Some(Color::White),
            "red" => Some(Color::Red),
            "green" => Some(Color::Green),
            "blue" => Some(Color::Blue),
            _ => None,
        }
    }
}

/// Allowed orientations for a rotatable element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnglePolicy {
    /// Any angle
    #[default]
    Free,
    /// 0°, 90°, 180°, 270°
    Cardinal,
    /// 45°, 135°, 225°, 315°
    Diagonal,
}

impl AnglePolicy {
    fn allowed(&self) -> Option<[f64; 4]> {
        match self {
            AnglePolicy::Free => None,
            AnglePolicy::Cardinal => Some([0.0, 90.0, 180.0, 270.0]),
            AnglePolicy::Diagonal => Some([45.0, 135.0, 225.0, 315.0]),
        }
    }

    /// Closest allowed angle (wrap-aware, earliest on ties)
    pub fn snap(&self, angle: f64) -> f64 {
        let angle = angle_wrap(angle);
        let Some(allowed) = self.allowed() else {
            return angle;
        };
        let distance = |d: f64| {
            let diff = (angle - d).abs();
            diff.min(360.0 - diff)
        };
        let mut best = allowed[0];
        for &candidate in &allowed[1..] {
            if distance(candidate) < distance(best) {
                best = candidate;
            }
        }
        best
    }

    /// Next orientation clockwise (90° steps; free angles also turn 90°)
    pub fn next(&self, angle: f64) -> f64 {
        self.snap(angle_wrap(self.snap(angle) + 90.0))
    }
}

/// Light source; each emitter seeds one root ray per pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emitter {
    pub pos: DVec2,
    pub color: Color,
    /// Heading (degrees)
    pub angle: f64,
}

impl Emitter {
    pub const POLICY: AnglePolicy = AnglePolicy::Cardinal;

    /// Emitter with its heading snapped to the cardinal directions
    pub fn new(pos: DVec2, color: Color, angle: f64) -> Self {
        Self {
            pos,
            color,
            angle: Self::POLICY.snap(angle),
        }
    }

    pub fn rotate(&mut self) {
        self.angle = Self::POLICY.next(self.angle);
    }
}

/// Goal that must be reached by a ray of its color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub pos: DVec2,
    pub color: Color,
    /// Set during a pass when a matching ray arrives; reset every pass
    #[serde(skip)]
    pub hit: bool,
}

impl Target {
    pub fn new(pos: DVec2, color: Color) -> Self {
        Self {
            pos,
            color,
            hit: false,
        }
    }
}

/// Flat mirror; reflects `θ` to `2·angle − θ` from either side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mirror {
    pub pos: DVec2,
    /// Surface orientation (degrees)
    pub angle: f64,
}

impl Mirror {
    pub const POLICY: AnglePolicy = AnglePolicy::Diagonal;

    /// Mirror with its surface snapped to the diagonals
    pub fn new(pos: DVec2, angle: f64) -> Self {
        Self {
            pos,
            angle: Self::POLICY.snap(angle),
        }
    }

    pub fn rotate(&mut self) {
        self.angle = Self::POLICY.next(self.angle);
    }
}

/// Circular lens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lens {
    pub pos: DVec2,
    /// Overrides the scene default when set
    #[serde(default)]
    pub refract_index: Option<f64>,
}

impl Lens {
    pub fn new(pos: DVec2) -> Self {
        Self {
            pos,
            refract_index: None,
        }
    }

    pub fn with_index(pos: DVec2, refract_index: f64) -> Self {
        Self {
            pos,
            refract_index: Some(refract_index),
        }
    }
}

/// Disperses white light into colored rays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prism {
    pub pos: DVec2,
}

/// Absorbs every ray that enters its box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blackhole {
    pub pos: DVec2,
}

/// Portal end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortalKind {
    /// Entrance
    A,
    /// Exit
    B,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portal {
    pub pos: DVec2,
}

/// Element kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Emitter,
    Target,
    Mirror,
    Lens,
    Prism,
    PortalA,
    PortalB,
    Blackhole,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Emitter => "emitter",
            ElementKind::Target => "target",
            ElementKind::Mirror => "mirror",
            ElementKind::Lens => "lens",
            ElementKind::Prism => "prism",
            ElementKind::PortalA => "portal_a",
            ElementKind::PortalB => "portal_b",
            ElementKind::Blackhole => "blackhole",
        }
    }
}

/// Any placeable element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Element {
    Emitter(Emitter),
    Target(Target),
    Mirror(Mirror),
    Lens(Lens),
    Prism(Prism),
    Portal(Portal, PortalKind),
    Blackhole(Blackhole),
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Emitter(_) => ElementKind::Emitter,
            Element::Target(_) => ElementKind::Target,
            Element::Mirror(_) => ElementKind::Mirror,
            Element::Lens(_) => ElementKind::Lens,
            Element::Prism(_) => ElementKind::Prism,
            Element::Portal(_, PortalKind::A) => ElementKind::PortalA,
            Element::Portal(_, PortalKind::B) => ElementKind::PortalB,
            Element::Blackhole(_) => ElementKind::Blackhole,
        }
    }

    pub fn pos(&self) -> DVec2 {
        match self {
            Element::Emitter(e) => e.pos,
            Element::Target(t) => t.pos,
            Element::Mirror(m) => m.pos,
            Element::Lens(l) => l.pos,
            Element::Prism(p) => p.pos,
            Element::Portal(p, _) => p.pos,
            Element::Blackhole(b) => b.pos,
        }
    }

    /// Default element of `kind` at `pos`
    pub fn new(kind: ElementKind, pos: DVec2) -> Self {
        match kind {
            ElementKind::Emitter => Element::Emitter(Emitter::new(pos, Color::White, 0.0)),
            ElementKind::Target => Element::Target(Target::new(pos, Color::White)),
            ElementKind::Mirror => Element::Mirror(Mirror::new(pos, 45.0)),
            ElementKind::Lens => Element::Lens(Lens::new(pos)),
            ElementKind::Prism => Element::Prism(Prism { pos }),
            ElementKind::PortalA => Element::Portal(Portal { pos }, PortalKind::A),
            ElementKind::PortalB => Element::Portal(Portal { pos }, PortalKind::B),
            ElementKind::Blackhole => Element::Blackhole(Blackhole { pos }),
        }
    }

    /// Rotate one step if the element is rotatable; returns whether it turned
    pub fn rotate(&mut self) -> bool {
        match self {
            Element::Emitter(e) => {
                e.rotate();
                true
            }
            Element::Mirror(m) => {
                m.rotate();
                true
            }
            _ => false,
        }
    }
}

/// Scene rectangle `[0, width) x [0, height)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            width: SCENE_WIDTH,
            height: SCENE_HEIGHT,
        }
    }
}

impl Bounds {
    #[inline]
    pub fn contains(&self, p: DVec2) -> bool {
        super::geom::in_bounds(p, self.width, self.height)
    }
}

/// Complete puzzle scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub bounds: Bounds,
    /// Lens index used when a lens carries none
    pub default_index: f64,
    pub emitters: Vec<Emitter>,
    pub targets: Vec<Target>,
    pub mirrors: Vec<Mirror>,
    pub lenses: Vec<Lens>,
    pub prisms: Vec<Prism>,
    /// Entrances, in insertion order
    pub portals_a: Vec<Portal>,
    /// Exits, in insertion order; the first one receives every teleport
    pub portals_b: Vec<Portal>,
    pub blackholes: Vec<Blackhole>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            bounds: Bounds::default(),
            default_index: DEFAULT_LENS_INDEX,
            emitters: Vec::new(),
            targets: Vec::new(),
            mirrors: Vec::new(),
            lenses: Vec::new(),
            prisms: Vec::new(),
            portals_a: Vec::new(),
            portals_b: Vec::new(),
            blackholes: Vec::new(),
        }
    }
}

impl Scene {
    /// Empty scene with default bounds and lens index
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bounds(width: f64, height: f64) -> Self {
        Self {
            bounds: Bounds { width, height },
            ..Self::new()
        }
    }

    /// Add an element to the collection of its kind
    pub fn add(&mut self, element: Element) {
        match element {
            Element::Emitter(e) => self.emitters.push(e),
            Element::Target(t) => self.targets.push(t),
            Element::Mirror(m) => self.mirrors.push(m),
            Element::Lens(l) => self.lenses.push(l),
            Element::Prism(p) => self.prisms.push(p),
            Element::Portal(p, PortalKind::A) => self.portals_a.push(p),
            Element::Portal(p, PortalKind::B) => self.portals_b.push(p),
            Element::Blackhole(b) => self.blackholes.push(b),
        }
    }

    /// Remove and return element `index` of `kind`
    pub fn remove(&mut self, kind: ElementKind, index: usize) -> Option<Element> {
        fn take<T>(items: &mut Vec<T>, index: usize) -> Option<T> {
            (index < items.len()).then(|| items.remove(index))
        }
        match kind {
            ElementKind::Emitter => take(&mut self.emitters, index).map(Element::Emitter),
            ElementKind::Target => take(&mut self.targets, index).map(Element::Target),
            ElementKind::Mirror => take(&mut self.mirrors, index).map(Element::Mirror),
            ElementKind::Lens => take(&mut self.lenses, index).map(Element::Lens),
            ElementKind::Prism => take(&mut self.prisms, index).map(Element::Prism),
            ElementKind::PortalA => {
                take(&mut self.portals_a, index).map(|p| Element::Portal(p, PortalKind::A))
            }
            ElementKind::PortalB => {
                take(&mut self.portals_b, index).map(|p| Element::Portal(p, PortalKind::B))
            }
            ElementKind::Blackhole => take(&mut self.blackholes, index).map(Element::Blackhole),
        }
    }

    /// Number of elements of `kind`
    pub fn count(&self, kind: ElementKind) -> usize {
        match kind {
            ElementKind::Emitter => self.emitters.len(),
            ElementKind::Target => self.targets.len(),
            ElementKind::Mirror => self.mirrors.len(),
            ElementKind::Lens => self.lenses.len(),
            ElementKind::Prism => self.prisms.len(),
            ElementKind::PortalA => self.portals_a.len(),
            ElementKind::PortalB => self.portals_b.len(),
            ElementKind::Blackhole => self.blackholes.len(),
        }
    }

    /// Effective refractive index of lens `index`
    pub fn lens_index(&self, index: usize) -> f64 {
        self.lenses
            .get(index)
            .and_then(|l| l.refract_index)
            .unwrap_or(self.default_index)
    }

    pub fn reset_hits(&mut self) {
        for target in &mut self.targets {
            target.hit = false;
        }
    }
}

/// A ray being traced (never persisted)
#[derive(Debug, Clone, PartialEq)]
pub struct Ray {
    /// Sequential id within one pass
    pub id: u32,
    /// Id of the ray that spawned this one
    pub parent: Option<u32>,
    pub pos: DVec2,
    /// Heading (degrees)
    pub heading: f64,
    pub color: Color,
    /// Lens indices the ray currently considers itself inside
    pub inside_lenses: Vec<usize>,
    /// Prism indices the ray has already passed through
    pub passed_prisms: Vec<usize>,
    pub bounces: u32,
}

impl Ray {
    /// Root ray leaving an emitter
    pub fn from_emitter(id: u32, emitter: &Emitter) -> Self {
        Self {
            id,
            parent: None,
            pos: emitter.pos,
            heading: angle_wrap(emitter.angle),
            color: emitter.color,
            inside_lenses: Vec::new(),
            passed_prisms: Vec::new(),
            bounces: 0,
        }
    }

    pub fn is_inside_lens(&self, lens: usize) -> bool {
        self.inside_lenses.contains(&lens)
    }

    pub fn enter_lens(&mut self, lens: usize) {
        if !self.is_inside_lens(lens) {
            self.inside_lenses.push(lens);
        }
    }

    pub fn leave_lens(&mut self, lens: usize) {
        self.inside_lenses.retain(|&l| l != lens);
    }

    pub fn has_passed_prism(&self, prism: usize) -> bool {
        self.passed_prisms.contains(&prism)
    }

    /// Child ray inheriting position and lens/prism membership
    pub fn spawn_child(&self, id: u32, heading: f64, color: Color, prism: usize) -> Self {
        let mut passed_prisms = self.passed_prisms.clone();
        if !passed_prisms.contains(&prism) {
            passed_prisms.push(prism);
        }
        Self {
            id,
            parent: Some(self.id),
            pos: self.pos,
            heading: angle_wrap(heading),
            color,
            inside_lenses: self.inside_lenses.clone(),
            passed_prisms,
            bounces: self.bounces + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinal_snap() {
        let p = AnglePolicy::Cardinal;
        assert_eq!(p.snap(10.0), 0.0);
        assert_eq!(p.snap(350.0), 0.0);
        assert_eq!(p.snap(100.0), 90.0);
        assert_eq!(p.snap(-80.0), 270.0);
        // Ties resolve to the earliest allowed angle
        assert_eq!(p.snap(45.0), 0.0);
    }

    #[test]
    fn test_diagonal_snap_and_rotate() {
        let p = AnglePolicy::Diagonal;
        assert_eq!(p.snap(0.0), 45.0);
        assert_eq!(p.snap(300.0), 315.0);
        assert_eq!(p.next(45.0), 135.0);
        assert_eq!(p.next(315.0), 45.0);
    }

    #[test]
    fn test_free_policy_keeps_angle() {
        assert_eq!(AnglePolicy::Free.snap(33.0), 33.0);
        assert_eq!(AnglePolicy::Free.snap(-30.0), 330.0);
    }

    #[test]
    fn test_element_constructors_snap() {
        let m = Mirror::new(DVec2::ZERO, 0.0);
        assert_eq!(m.angle, 45.0);
        let mut e = Emitter::new(DVec2::ZERO, Color::Red, 95.0);
        assert_eq!(e.angle, 90.0);
        e.rotate();
        assert_eq!(e.angle, 180.0);
    }

    #[test]
    fn test_scene_add_remove_by_kind() {
        let mut scene = Scene::new();
        scene.add(Element::new(ElementKind::PortalA, DVec2::new(1.0, 1.0)));
        scene.add(Element::new(ElementKind::PortalB, DVec2::new(2.0, 2.0)));
        scene.add(Element::new(ElementKind::Mirror, DVec2::new(3.0, 3.0)));
        assert_eq!(scene.count(ElementKind::PortalA), 1);
        assert_eq!(scene.count(ElementKind::PortalB), 1);

        let removed = scene.remove(ElementKind::PortalB, 0);
        assert!(matches!(removed, Some(Element::Portal(_, PortalKind::B))));
        assert!(scene.remove(ElementKind::PortalB, 0).is_none());
        assert_eq!(scene.count(ElementKind::Mirror), 1);
    }

    #[test]
    fn test_lens_index_falls_back_to_scene_default() {
        let mut scene = Scene::new();
        scene.lenses.push(Lens::new(DVec2::ZERO));
        scene.lenses.push(Lens::with_index(DVec2::ZERO, 2.0));
        assert_eq!(scene.lens_index(0), DEFAULT_LENS_INDEX);
        assert_eq!(scene.lens_index(1), 2.0);
    }

    #[test]
    fn test_child_ray_inherits_membership() {
        let emitter = Emitter::new(DVec2::new(5.0, 5.0), Color::White, 0.0);
        let mut ray = Ray::from_emitter(0, &emitter);
        ray.enter_lens(3);
        ray.bounces = 4;
        let child = ray.spawn_child(7, 370.0, Color::Green, 1);
        assert_eq!(child.parent, Some(0));
        assert_eq!(child.heading, 10.0);
        assert!(child.is_inside_lens(3));
        assert!(child.has_passed_prism(1));
        assert_eq!(child.bounces, 5);
    }

    #[test]
    fn test_color_round_trip_names() {
        for c in [Color::White, Color::Red, Color::Green, Color::Blue] {
            assert_eq!(Color::from_str(c.as_str()), Some(c));
        }
        assert_eq!(Color::from_str("purple"), None);
    }
}
