//! Deterministic light propagation
//!
//! Everything a pass needs lives here. This module must stay pure:
//! - Fixed step length only
//! - Stable iteration order (collection index, FIFO ray queue)
//! - No rendering or platform dependencies

pub mod evaluate;
pub mod event;
pub mod geom;
pub mod refract;
pub mod state;
pub mod trace;

pub use evaluate::{hit_summary, is_complete};
pub use event::{EventSink, RayEvent, TargetHit, Termination, TraceStats};
pub use geom::{advance, in_bounds, inside_circle, near, outward_normal, reflect_heading};
pub use refract::{Refraction, refract};
pub use state::{
    AnglePolicy, Blackhole, Bounds, Color, Element, ElementKind, Emitter, Lens, Mirror, Portal,
    PortalKind, Prism, Ray, Scene, Target,
};
pub use trace::{PassReport, SimOutcome, simulate, simulate_with};
