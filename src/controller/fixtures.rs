//! Behaviour of powered and self-propelled fixtures.
//!
//! Each behaviour tag maps to a fixed capability record. Tags without a
//! capability get no-op entries, so callers never branch on the tag.

use glam::Vec3;
use tracing::{debug, trace};

use crate::controller::physics::{BodyHandle, PhysicsWorld};
use crate::model::entity::{BehaviorTag, EntityKind};

#[derive(Debug, Clone)]
pub struct FixtureConfig {
    /// Light intensity while a powered fixture is on.
    pub lamp_on_intensity: f32,
    /// Orbit angle advanced per motion tick.
    pub vacuum_angle_step: f32,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            lamp_on_intensity: 3.0,
            vacuum_angle_step: 0.003,
        }
    }
}

pub type ToggleFn = fn(&mut EntityKind);
pub type AdvanceFn = fn(&mut EntityKind, Option<BodyHandle>, &mut PhysicsWorld);

pub struct Capabilities {
    pub toggle: ToggleFn,
    pub advance: AdvanceFn,
}

static CAPABILITIES: [Capabilities; 4] = [
    // Static
    Capabilities {
        toggle: no_toggle,
        advance: no_advance,
    },
    // Powered
    Capabilities {
        toggle: toggle_light,
        advance: no_advance,
    },
    // Mobile
    Capabilities {
        toggle: toggle_motor,
        advance: advance_orbit,
    },
    // Player
    Capabilities {
        toggle: no_toggle,
        advance: no_advance,
    },
];

pub fn capabilities(tag: BehaviorTag) -> &'static Capabilities {
    &CAPABILITIES[tag as usize]
}

fn no_toggle(_: &mut EntityKind) {}

fn no_advance(_: &mut EntityKind, _: Option<BodyHandle>, _: &mut PhysicsWorld) {}

/// Flip the light and set its intensity to match.
pub fn toggle_light(kind: &mut EntityKind) {
    if let EntityKind::Powered(state) = kind {
        state.powered = !state.powered;
        state.intensity = if state.powered { state.on_intensity } else { 0.0 };
        debug!(powered = state.powered, intensity = state.intensity, "light toggled");
    }
}

/// Flip the motor. Motion happens in `advance_orbit`.
pub fn toggle_motor(kind: &mut EntityKind) {
    if let EntityKind::Mobile(state) = kind {
        state.powered = !state.powered;
        debug!(powered = state.powered, "motor toggled");
    }
}

/// Place the body on its parametric path, then advance the path.
///
/// The body's height is left alone; only x and z follow the path.
pub fn advance_orbit(kind: &mut EntityKind, body: Option<BodyHandle>, physics: &mut PhysicsWorld) {
    let EntityKind::Mobile(state) = kind else {
        return;
    };
    let Some(body) = body else {
        return;
    };
    if !state.powered {
        return;
    }
    let Some(current) = physics.translation(body) else {
        return;
    };

    let target = Vec3::new(
        state.origin.x + state.angle.cos() * state.radius,
        current.y,
        state.origin.y + state.angle.sin() * state.radius,
    );
    physics.set_translation(body, target);

    state.angle += state.angle_step;
    state.radius = (2.0 * state.angle).sin();
    trace!(angle = state.angle, radius = state.radius, "orbit advanced");
}
