//! Ray propagation
//!
//! One pass traces every emitter's ray tree to exhaustion. Rays wait in a
//! FIFO queue (breadth-first over prism branches) and advance one fixed step
//! at a time. Within a step, interactions are checked in a fixed order:
//! mirror, lens, prism, portal, black hole, target.

use std::collections::VecDeque;

use super::event::{EventSink, RayEvent, TargetHit, Termination, TraceStats};
use super::geom::{advance, inside_circle, near, outward_normal, reflect_heading};
use super::refract::refract;
use super::state::{Color, Ray, Scene};
use crate::angle_wrap;
use crate::settings::{EngineSettings, LensModel};

/// Hits and counters from one pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassReport {
    /// Every target hit, in the order rays reached them
    pub hits: Vec<TargetHit>,
    pub stats: TraceStats,
}

/// Everything a pass produced, with the event stream collected
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimOutcome {
    pub events: Vec<RayEvent>,
    pub hits: Vec<TargetHit>,
    pub stats: TraceStats,
}

/// Run one pass and collect the event stream
pub fn simulate(scene: &mut Scene, settings: &EngineSettings) -> SimOutcome {
    let mut events = Vec::new();
    let report = simulate_with(scene, settings, &mut events);
    SimOutcome {
        events,
        hits: report.hits,
        stats: report.stats,
    }
}

/// Run one pass, streaming events into `sink`
///
/// Target hit flags are reset first and only written once every queued ray
/// has finished.
pub fn simulate_with<S: EventSink + ?Sized>(
    scene: &mut Scene,
    settings: &EngineSettings,
    sink: &mut S,
) -> PassReport {
    scene.reset_hits();

    let report = Tracer::new(scene, settings, sink).run();

    for hit in &report.hits {
        if let Some(target) = scene.targets.get_mut(hit.target) {
            target.hit = true;
        }
    }

    log::debug!(
        "Pass: {} rays, {} steps, {} hits ({} absorbed, {} out of bounds, {} capped)",
        report.stats.rays,
        report.stats.steps,
        report.hits.len(),
        report.stats.absorbed,
        report.stats.out_of_bounds,
        report.stats.step_limited + report.stats.bounce_limited,
    );

    report
}

/// What a single interaction check decided
enum Interaction {
    /// Nothing (or nothing that ends the step)
    None,
    /// Heading or position changed; skip the remaining checks this step
    Redirected,
    /// Ray is finished
    Stop(Termination),
}

struct Tracer<'a, S: EventSink + ?Sized> {
    scene: &'a Scene,
    settings: &'a EngineSettings,
    sink: &'a mut S,
    queue: VecDeque<Ray>,
    next_id: u32,
    report: PassReport,
}

impl<'a, S: EventSink + ?Sized> Tracer<'a, S> {
    fn new(scene: &'a Scene, settings: &'a EngineSettings, sink: &'a mut S) -> Self {
        Self {
            scene,
            settings,
            sink,
            queue: VecDeque::new(),
            next_id: 0,
            report: PassReport::default(),
        }
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn enqueue(&mut self, ray: Ray) {
        self.sink.event(RayEvent::Spawn {
            ray: ray.id,
            parent: ray.parent,
            pos: ray.pos,
            heading: ray.heading,
            color: ray.color,
        });
        self.queue.push_back(ray);
    }

    fn run(mut self) -> PassReport {
        let scene = self.scene;
        for emitter in &scene.emitters {
            let id = self.allocate_id();
            self.enqueue(Ray::from_emitter(id, emitter));
        }

        while let Some(mut ray) = self.queue.pop_front() {
            self.report.stats.rays += 1;
            let reason = self.trace(&mut ray);
            self.report.stats.record(reason);
            log::debug!(
                "Ray {} ({}) ended at ({:.1}, {:.1}): {:?}",
                ray.id,
                ray.color.as_str(),
                ray.pos.x,
                ray.pos.y,
                reason
            );
            self.sink.event(RayEvent::Terminate {
                ray: ray.id,
                pos: ray.pos,
                reason,
            });
        }

        self.report
    }

    /// March one ray until it terminates
    fn trace(&mut self, ray: &mut Ray) -> Termination {
        let settings = self.settings;
        let bounds = self.scene.bounds;
        let mut steps = 0u32;

        loop {
            if steps >= settings.max_steps {
                return Termination::StepLimit;
            }
            steps += 1;
            self.report.stats.steps += 1;

            ray.pos = advance(ray.pos, ray.heading, settings.step);
            if !bounds.contains(ray.pos) {
                return Termination::OutOfBounds;
            }
            if settings.record_path {
                self.sink.event(RayEvent::Step {
                    ray: ray.id,
                    pos: ray.pos,
                    color: ray.color,
                });
            }

            match self.mirror(ray) {
                Interaction::Stop(reason) => return reason,
                Interaction::Redirected => continue,
                Interaction::None => {}
            }

            let lens = match settings.lens_model {
                LensModel::Snell => self.snell_lens(ray),
                LensModel::FixedBend => self.fixed_bend_lens(ray),
            };
            if let Interaction::Stop(reason) = lens {
                return reason;
            }

            if settings.prism_enabled {
                if let Interaction::Stop(reason) = self.prism(ray) {
                    return reason;
                }
            }

            match self.portal(ray) {
                Interaction::Stop(reason) => return reason,
                Interaction::Redirected => continue,
                Interaction::None => {}
            }

            if self
                .scene
                .blackholes
                .iter()
                .any(|bh| near(ray.pos, bh.pos, settings.hit_radius))
            {
                return Termination::Absorbed;
            }

            if let Some(reason) = self.target(ray) {
                return reason;
            }
        }
    }

    /// Count a bounce and check the budget and bounds after a nudge
    fn after_bounce(&self, ray: &mut Ray) -> Option<Termination> {
        ray.bounces += 1;
        if ray.bounces > self.settings.max_bounces {
            return Some(Termination::BounceLimit);
        }
        if !self.scene.bounds.contains(ray.pos) {
            return Some(Termination::OutOfBounds);
        }
        None
    }

    fn mirror(&mut self, ray: &mut Ray) -> Interaction {
        let radius = self.settings.hit_radius;
        let Some((index, mirror)) = self
            .scene
            .mirrors
            .iter()
            .enumerate()
            .find(|(_, m)| near(ray.pos, m.pos, radius))
        else {
            return Interaction::None;
        };

        ray.heading = reflect_heading(ray.heading, mirror.angle);
        ray.pos = advance(ray.pos, ray.heading, self.settings.nudge);
        self.sink.event(RayEvent::Reflect {
            ray: ray.id,
            pos: ray.pos,
            heading: ray.heading,
            mirror: index,
        });

        match self.after_bounce(ray) {
            Some(reason) => Interaction::Stop(reason),
            None => Interaction::Redirected,
        }
    }

    /// Refract on entering or leaving each circular lens footprint
    fn snell_lens(&mut self, ray: &mut Ray) -> Interaction {
        let settings = self.settings;
        let scene = self.scene;
        let air = settings.air_index;

        for (index, lens) in scene.lenses.iter().enumerate() {
            let inside_now = inside_circle(ray.pos, lens.pos, settings.lens_radius);
            let marked = ray.is_inside_lens(index);
            if inside_now == marked {
                continue;
            }

            let entering = inside_now;
            let n_lens = scene.lens_index(index);
            let normal = outward_normal(lens.pos, ray.pos);
            let refraction = if entering {
                refract(ray.heading, normal, air, n_lens)
            } else {
                refract(ray.heading, normal, n_lens, air)
            };

            ray.heading = refraction.angle;
            if entering {
                ray.enter_lens(index);
            } else if !refraction.total_internal_reflection {
                ray.leave_lens(index);
            }
            ray.pos = advance(ray.pos, ray.heading, settings.nudge);

            self.sink.event(RayEvent::Refract {
                ray: ray.id,
                pos: ray.pos,
                heading: ray.heading,
                lens: index,
                entering,
                total_internal_reflection: refraction.total_internal_reflection,
            });

            if let Some(reason) = self.after_bounce(ray) {
                return Interaction::Stop(reason);
            }
        }

        Interaction::None
    }

    /// Bend by a fixed angle once per pass through a lens
    fn fixed_bend_lens(&mut self, ray: &mut Ray) -> Interaction {
        let settings = self.settings;
        let scene = self.scene;

        let captured = scene.lenses.iter().enumerate().find(|(index, lens)| {
            !ray.is_inside_lens(*index)
                && ray.pos.distance(lens.pos) < settings.fixed_bend_capture
        });
        if let Some((index, _)) = captured {
            ray.heading = angle_wrap(ray.heading + settings.fixed_bend_degrees);
            ray.enter_lens(index);
            ray.pos = advance(ray.pos, ray.heading, settings.nudge);
            self.sink.event(RayEvent::Bend {
                ray: ray.id,
                pos: ray.pos,
                heading: ray.heading,
                lens: index,
            });
            if let Some(reason) = self.after_bounce(ray) {
                return Interaction::Stop(reason);
            }
        }

        let lenses = &scene.lenses;
        let pos = ray.pos;
        ray.inside_lenses.retain(|&index| {
            lenses
                .get(index)
                .is_some_and(|lens| pos.distance(lens.pos) <= settings.fixed_bend_release)
        });

        Interaction::None
    }

    /// Split white light at the first prism it enters; the parent is consumed
    ///
    /// A white ray too close to the bounce cap for its children to bounce
    /// again crosses the prism like colored light.
    fn prism(&mut self, ray: &mut Ray) -> Interaction {
        let settings = self.settings;
        let scene = self.scene;

        for (index, prism) in scene.prisms.iter().enumerate() {
            if ray.has_passed_prism(index)
                || !inside_circle(ray.pos, prism.pos, settings.lens_radius)
            {
                continue;
            }

            if ray.color != Color::White {
                // Colored light crosses prisms unchanged
                ray.passed_prisms.push(index);
                continue;
            }

            if ray.bounces + 2 > settings.max_bounces {
                // No budget for children: white light goes on undispersed
                ray.passed_prisms.push(index);
                continue;
            }

            let bands = settings.spectrum.bands(settings.prism_spread);
            let mut children = Vec::with_capacity(bands.len());
            for (offset, color) in bands {
                let id = self.allocate_id();
                children.push(ray.spawn_child(id, ray.heading + offset, color, index));
            }

            self.sink.event(RayEvent::Disperse {
                ray: ray.id,
                pos: ray.pos,
                prism: index,
                children: children.iter().map(|c| c.id).collect(),
            });
            log::trace!(
                "Ray {} dispersed at prism {} into {} rays",
                ray.id,
                index,
                children.len()
            );
            self.report.stats.spawned += children.len() as u32;
            for child in children {
                self.enqueue(child);
            }

            return Interaction::Stop(Termination::Dispersed);
        }

        Interaction::None
    }

    /// Relocate to the first exit portal; a lone entrance does nothing
    fn portal(&mut self, ray: &mut Ray) -> Interaction {
        let radius = self.settings.hit_radius;
        let Some(exit) = self.scene.portals_b.first() else {
            return Interaction::None;
        };
        let Some(entrance) = self
            .scene
            .portals_a
            .iter()
            .position(|a| near(ray.pos, a.pos, radius))
        else {
            return Interaction::None;
        };

        let from = ray.pos;
        ray.pos = advance(exit.pos, ray.heading, 2.0 * self.settings.nudge);
        log::trace!("Ray {} teleported through portal {}", ray.id, entrance);
        self.sink.event(RayEvent::Teleport {
            ray: ray.id,
            from,
            to: ray.pos,
            entrance,
        });

        if !self.scene.bounds.contains(ray.pos) {
            return Interaction::Stop(Termination::OutOfBounds);
        }
        Interaction::Redirected
    }

    /// Consume the ray at the first target of its color within reach
    fn target(&mut self, ray: &Ray) -> Option<Termination> {
        let radius = self.settings.hit_radius;
        let index = self
            .scene
            .targets
            .iter()
            .position(|t| t.color == ray.color && near(ray.pos, t.pos, radius))?;

        let hit = TargetHit {
            target: index,
            ray: ray.id,
            color: ray.color,
            pos: ray.pos,
        };
        self.sink.event(RayEvent::Hit(hit));
        self.report.hits.push(hit);
        Some(Termination::TargetHit)
    }
}
