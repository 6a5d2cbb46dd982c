//! Events emitted while tracing, for renderers and tests

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::state::Color;

/// Why a ray stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Termination {
    /// Left the scene bounds
    OutOfBounds,
    /// Entered a black hole
    Absorbed,
    /// Reached a target of its color
    TargetHit,
    /// Ran out of steps
    StepLimit,
    /// Exceeded the bounce budget
    BounceLimit,
    /// White ray replaced by its spectrum at a prism
    Dispersed,
}

/// A target reached by a ray during a pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetHit {
    /// Index into `Scene::targets`
    pub target: usize,
    pub ray: u32,
    pub color: Color,
    /// Ray position when the hit registered
    pub pos: DVec2,
}

/// Visualisation stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RayEvent {
    /// Ray launched from an emitter or a prism
    Spawn {
        ray: u32,
        parent: Option<u32>,
        pos: DVec2,
        heading: f64,
        color: Color,
    },
    /// Ray advanced to `pos` (only when path recording is on)
    Step { ray: u32, pos: DVec2, color: Color },
    Reflect {
        ray: u32,
        pos: DVec2,
        heading: f64,
        mirror: usize,
    },
    Refract {
        ray: u32,
        pos: DVec2,
        heading: f64,
        lens: usize,
        entering: bool,
        total_internal_reflection: bool,
    },
    /// Fixed-angle lens bend
    Bend {
        ray: u32,
        pos: DVec2,
        heading: f64,
        lens: usize,
    },
    Disperse {
        ray: u32,
        pos: DVec2,
        prism: usize,
        children: Vec<u32>,
    },
    Teleport {
        ray: u32,
        from: DVec2,
        to: DVec2,
        entrance: usize,
    },
    Hit(TargetHit),
    Terminate {
        ray: u32,
        pos: DVec2,
        reason: Termination,
    },
}

impl RayEvent {
    /// Id of the ray this event belongs to
    pub fn ray(&self) -> u32 {
        match self {
            RayEvent::Spawn { ray, .. }
            | RayEvent::Step { ray, .. }
            | RayEvent::Reflect { ray, .. }
            | RayEvent::Refract { ray, .. }
            | RayEvent::Bend { ray, .. }
            | RayEvent::Disperse { ray, .. }
            | RayEvent::Teleport { ray, .. }
            | RayEvent::Terminate { ray, .. } => *ray,
            RayEvent::Hit(hit) => hit.ray,
        }
    }
}

/// Receiver of trace events
pub trait EventSink {
    fn event(&mut self, event: RayEvent);
}

/// Discards everything (headless runs)
impl EventSink for () {
    #[inline]
    fn event(&mut self, _event: RayEvent) {}
}

impl EventSink for Vec<RayEvent> {
    #[inline]
    fn event(&mut self, event: RayEvent) {
        self.push(event);
    }
}

/// Per-pass counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceStats {
    /// Rays traced, roots and children
    pub rays: u32,
    /// Rays spawned by prisms
    pub spawned: u32,
    /// Steps advanced across all rays
    pub steps: u64,
    pub out_of_bounds: u32,
    pub absorbed: u32,
    pub target_hits: u32,
    pub step_limited: u32,
    pub bounce_limited: u32,
    pub dispersed: u32,
}

impl TraceStats {
    pub fn record(&mut self, reason: Termination) {
        match reason {
            Termination::OutOfBounds => self.out_of_bounds += 1,
            Termination::Absorbed => self.absorbed += 1,
            Termination::TargetHit => self.target_hits += 1,
            Termination::StepLimit => self.step_limited += 1,
            Termination::BounceLimit => self.bounce_limited += 1,
            Termination::Dispersed => self.dispersed += 1,
        }
    }

    /// Rays that have terminated, by any reason
    pub fn terminated(&self) -> u32 {
        self.out_of_bounds
            + self.absorbed
            + self.target_hits
            + self.step_limited
            + self.bounce_limited
            + self.dispersed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_count_every_reason() {
        let mut stats = TraceStats::default();
        for reason in [
            Termination::OutOfBounds,
            Termination::Absorbed,
            Termination::TargetHit,
            Termination::StepLimit,
            Termination::BounceLimit,
            Termination::Dispersed,
            Termination::OutOfBounds,
        ] {
            stats.record(reason);
        }
        assert_eq!(stats.out_of_bounds, 2);
        assert_eq!(stats.dispersed, 1);
        assert_eq!(stats.terminated(), 7);
    }

    #[test]
    fn test_vec_sink_collects_in_order() {
        let mut sink: Vec<RayEvent> = Vec::new();
        sink.event(RayEvent::Step {
            ray: 3,
            pos: DVec2::ZERO,
            color: Color::Red,
        });
        sink.event(RayEvent::Hit(TargetHit {
            target: 0,
            ray: 4,
            color: Color::Red,
            pos: DVec2::ONE,
        }));
        assert_eq!(sink.iter().map(RayEvent::ray).collect::<Vec<_>>(), vec![3, 4]);

        let mut null = ();
        null.event(RayEvent::Step {
            ray: 0,
            pos: DVec2::ZERO,
            color: Color::White,
        });
    }
}
