// CONTROLLER: Input, simulation and the per-frame loop
pub mod camera_controller;
pub mod fixtures;
pub mod frame_loop;
pub mod input;
pub mod interaction;
pub mod locomotion;
pub mod physics;
pub mod registry;
pub mod world_step;

pub use camera_controller::{CameraConfig, CameraController, CameraMode};
pub use fixtures::FixtureConfig;
pub use frame_loop::{FrameLoopContext, FrameReport};
pub use input::{DeviceProfile, InputEvent, InputProcessor, InputState, KeyBindings};
pub use interaction::{Interaction, InteractionHandler, InteractionResolver};
pub use locomotion::{Locomotion, LocomotionConfig};
pub use physics::{PhysicsConfig, PhysicsWorld};
pub use registry::EntityRegistry;
pub use world_step::{StepReport, WorldStepCoordinator};
