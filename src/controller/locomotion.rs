use glam::Vec3;

use crate::controller::input::{InputProcessor, InputState};
use crate::controller::physics::{BodyHandle, PhysicsWorld};

#[derive(Debug, Clone)]
pub struct LocomotionConfig {
    /// Distance per frame per held key.
    pub key_step: f32,
    /// Touch walking speed, units per second.
    pub touch_speed: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            key_step: 0.05,
            touch_speed: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkAxis {
    /// Along the facing direction. Negative steps move the way the camera looks.
    Forward,
    Right,
}

/// Walk direction for `facing_yaw`, scaled by `step`.
pub fn walk_vector(facing_yaw: f32, step: f32, axis: WalkAxis) -> Vec3 {
    let (sin, cos) = facing_yaw.sin_cos();
    match axis {
        WalkAxis::Forward => Vec3::new(sin, 0.0, cos) * step,
        WalkAxis::Right => Vec3::new(cos, 0.0, -sin) * step,
    }
}

/// Touch walk direction: the gesture angle relative to the facing yaw.
pub fn touch_vector(facing_yaw: f32, gesture_angle: f32, distance: f32) -> Vec3 {
    let (sin, cos) = (gesture_angle - facing_yaw).sin_cos();
    Vec3::new(cos, 0.0, sin) * distance
}

/// Moves the player body by kinematic displacement.
///
/// Displacement bypasses the solver, so a body pushed into a fixed obstacle
/// overlaps it until contacts push it back out. With the default key step
/// the overlap stays under the capsule radius.
pub struct Locomotion {
    config: LocomotionConfig,
}

impl Locomotion {
    pub fn new(config: LocomotionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    /// Displace the body. Without a body this does nothing.
    pub fn walk(
        &self,
        body: Option<BodyHandle>,
        facing_yaw: f32,
        physics: &mut PhysicsWorld,
        step: f32,
        axis: WalkAxis,
    ) {
        if let Some(body) = body {
            physics.translate(body, walk_vector(facing_yaw, step, axis));
        }
    }

    pub fn walk_mobile(
        &self,
        body: Option<BodyHandle>,
        facing_yaw: f32,
        physics: &mut PhysicsWorld,
        delta: f32,
        gesture_angle: f32,
    ) {
        if let Some(body) = body {
            let distance = self.config.touch_speed * delta;
            physics.translate(body, touch_vector(facing_yaw, gesture_angle, distance));
        }
    }

    /// One displacement per held direction. Diagonals add up unnormalized.
    pub fn apply_keys(
        &self,
        body: Option<BodyHandle>,
        facing_yaw: f32,
        physics: &mut PhysicsWorld,
        input: &InputState,
        processor: &InputProcessor,
    ) {
        let step = self.config.key_step;
        if processor.is_moving_forward(input) {
            self.walk(body, facing_yaw, physics, -step, WalkAxis::Forward);
        }
        if processor.is_moving_backward(input) {
            self.walk(body, facing_yaw, physics, step, WalkAxis::Forward);
        }
        if processor.is_moving_left(input) {
            self.walk(body, facing_yaw, physics, -step, WalkAxis::Right);
        }
        if processor.is_moving_right(input) {
            self.walk(body, facing_yaw, physics, step, WalkAxis::Right);
        }
    }
}
