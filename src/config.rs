use crate::controller::camera_controller::CameraConfig;
use crate::controller::fixtures::FixtureConfig;
use crate::controller::input::KeyBindings;
use crate::controller::locomotion::LocomotionConfig;
use crate::controller::physics::PhysicsConfig;

/// Every tunable of the room, gathered in one place.
#[derive(Debug, Clone, Default)]
pub struct RoomConfig {
    pub physics: PhysicsConfig,
    pub camera: CameraConfig,
    pub locomotion: LocomotionConfig,
    pub fixtures: FixtureConfig,
    pub bindings: KeyBindings,
}
