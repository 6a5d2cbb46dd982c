//! Seeded random scenes
//!
//! Used for stress runs and property tests. The same seed and config always
//! produce the same scene.

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::sim::{Blackhole, Bounds, Color, Emitter, Lens, Mirror, Portal, Prism, Scene, Target};

const COLORS: [Color; 4] = [Color::White, Color::Red, Color::Green, Color::Blue];
const CARDINALS: [f64; 4] = [0.0, 90.0, 180.0, 270.0];
const DIAGONALS: [f64; 4] = [45.0, 135.0, 225.0, 315.0];

/// Element counts and placement area for [`random_scene`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub emitters: usize,
    pub targets: usize,
    pub mirrors: usize,
    pub lenses: usize,
    pub prisms: usize,
    /// Entrance/exit pairs
    pub portals: usize,
    pub blackholes: usize,
    pub bounds: Bounds,
    /// Keep elements this far from the scene edges
    pub margin: f64,
    /// Chance that an emitter is white rather than a random color
    pub white_bias: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            emitters: 2,
            targets: 3,
            mirrors: 6,
            lenses: 3,
            prisms: 1,
            portals: 1,
            blackholes: 1,
            bounds: Bounds::default(),
            margin: 40.0,
            white_bias: 0.75,
        }
    }
}

fn random_pos(rng: &mut impl Rng, config: &GeneratorConfig) -> DVec2 {
    let b = config.bounds;
    let m = config.margin.min(b.width / 2.0).min(b.height / 2.0);
    if b.width - 2.0 * m <= 0.0 || b.height - 2.0 * m <= 0.0 {
        return DVec2::new(b.width / 2.0, b.height / 2.0);
    }
    DVec2::new(
        rng.random_range(m..b.width - m),
        rng.random_range(m..b.height - m),
    )
}

fn pick<T: Copy>(rng: &mut impl Rng, items: &[T]) -> T {
    items[rng.random_range(0..items.len())]
}

/// Build a scene from `seed`
pub fn random_scene(seed: u64, config: &GeneratorConfig) -> Scene {
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut scene = Scene::with_bounds(config.bounds.width, config.bounds.height);

    for _ in 0..config.emitters {
        let pos = random_pos(&mut rng, config);
        let color = if rng.random_bool(config.white_bias.clamp(0.0, 1.0)) {
            Color::White
        } else {
            pick(&mut rng, &COLORS)
        };
        let angle = pick(&mut rng, &CARDINALS);
        scene.emitters.push(Emitter::new(pos, color, angle));
    }
    for _ in 0..config.targets {
        let pos = random_pos(&mut rng, config);
        let color = pick(&mut rng, &COLORS);
        scene.targets.push(Target::new(pos, color));
    }
    for _ in 0..config.mirrors {
        let pos = random_pos(&mut rng, config);
        let angle = pick(&mut rng, &DIAGONALS);
        scene.mirrors.push(Mirror::new(pos, angle));
    }
    for _ in 0..config.lenses {
        let pos = random_pos(&mut rng, config);
        // Half the lenses carry their own index
        let lens = if rng.random_bool(0.5) {
            Lens::with_index(pos, rng.random_range(1.2..2.0))
        } else {
            Lens::new(pos)
        };
        scene.lenses.push(lens);
    }
    for _ in 0..config.prisms {
        let pos = random_pos(&mut rng, config);
        scene.prisms.push(Prism { pos });
    }
    for _ in 0..config.portals {
        let a = random_pos(&mut rng, config);
        let b = random_pos(&mut rng, config);
        scene.portals_a.push(Portal { pos: a });
        scene.portals_b.push(Portal { pos: b });
    }
    for _ in 0..config.blackholes {
        let pos = random_pos(&mut rng, config);
        scene.blackholes.push(Blackhole { pos });
    }

    log::debug!(
        "Generated scene {}: {} emitters, {} targets, {} mirrors, {} lenses",
        seed,
        scene.emitters.len(),
        scene.targets.len(),
        scene.mirrors.len(),
        scene.lenses.len()
    );
    scene
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{EngineProfile, EngineSettings};
    use crate::sim::{RayEvent, simulate};
    use proptest::prelude::*;

    #[test]
    fn test_same_seed_same_scene() {
        let config = GeneratorConfig::default();
        assert_eq!(random_scene(42, &config), random_scene(42, &config));
        assert_ne!(random_scene(42, &config), random_scene(43, &config));
    }

    #[test]
    fn test_counts_and_placement() {
        let config = GeneratorConfig {
            mirrors: 10,
            portals: 2,
            ..GeneratorConfig::default()
        };
        let scene = random_scene(7, &config);
        assert_eq!(scene.emitters.len(), 2);
        assert_eq!(scene.mirrors.len(), 10);
        assert_eq!(scene.portals_a.len(), 2);
        assert_eq!(scene.portals_b.len(), 2);
        for m in &scene.mirrors {
            assert!(DIAGONALS.contains(&m.angle));
            assert!(m.pos.x >= 40.0 && m.pos.x < 1240.0);
            assert!(m.pos.y >= 40.0 && m.pos.y < 680.0);
        }
        for e in &scene.emitters {
            assert!(CARDINALS.contains(&e.angle));
        }
    }

    #[test]
    fn test_tiny_bounds_centre_everything() {
        let config = GeneratorConfig {
            bounds: Bounds {
                width: 50.0,
                height: 50.0,
            },
            ..GeneratorConfig::default()
        };
        let scene = random_scene(1, &config);
        assert!(scene.mirrors.iter().all(|m| m.pos == DVec2::new(25.0, 25.0)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_every_pass_terminates(seed in any::<u64>(), workshop in any::<bool>()) {
            let mut scene = random_scene(seed, &GeneratorConfig::default());
            let settings: EngineSettings = if workshop {
                EngineProfile::Workshop.settings()
            } else {
                EngineProfile::Play.settings()
            };

            let outcome = simulate(&mut scene, &settings);
            let stats = &outcome.stats;

            prop_assert_eq!(stats.terminated(), stats.rays);
            prop_assert!(stats.steps <= u64::from(stats.rays) * u64::from(settings.max_steps));
            // Colored children never disperse again
            prop_assert!(stats.rays as usize <= scene.emitters.len() * 3);

            let hit_targets = scene.targets.iter().filter(|t| t.hit).count();
            let mut distinct: Vec<usize> = outcome.hits.iter().map(|h| h.target).collect();
            distinct.sort_unstable();
            distinct.dedup();
            prop_assert_eq!(hit_targets, distinct.len());

            for event in &outcome.events {
                if let RayEvent::Hit(hit) = event {
                    prop_assert_eq!(scene.targets[hit.target].color, hit.color);
                }
            }
        }
    }
}
