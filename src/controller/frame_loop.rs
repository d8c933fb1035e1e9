use glam::{Vec2, Vec3};
use tracing::{debug, info};

use crate::config::RoomConfig;
use crate::controller::camera_controller::{CameraController, CameraMode};
use crate::controller::fixtures::capabilities;
use crate::controller::input::{DeviceProfile, InputEffect, InputEvent, InputProcessor, InputState};
use crate::controller::interaction::{screen_to_ndc, Interaction, InteractionResolver};
use crate::controller::locomotion::Locomotion;
use crate::controller::physics::{BodyHandle, PhysicsWorld};
use crate::controller::registry::EntityRegistry;
use crate::controller::world_step::{StepReport, WorldStepCoordinator};
use crate::error::RoomError;
use crate::model::asset::AssetLoader;
use crate::model::entity::EntityKind;
use crate::model::room::RoomLayout;
use crate::model::scene_graph::SceneGraph;
use crate::model::Camera;
use crate::view::FrameSnapshot;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub delta: f32,
    pub step: StepReport,
    /// Entities bound by asset completions this frame.
    pub bound: usize,
    pub mode: CameraMode,
}

/// The whole simulation for one session, owned in one place and driven
/// one tick at a time.
pub struct FrameLoopContext {
    pub registry: EntityRegistry,
    pub physics: PhysicsWorld,
    pub scene: SceneGraph,
    pub camera: Camera,
    pub camera_controller: CameraController,
    pub input_state: InputState,
    pub input_processor: InputProcessor,
    pub locomotion: Locomotion,
    pub stepper: WorldStepCoordinator,
    viewport: (u32, u32),
    last_time: Option<f64>,
    frame: u64,
}

impl FrameLoopContext {
    pub fn from_layout(
        config: RoomConfig,
        layout: &RoomLayout,
        loader: &mut dyn AssetLoader,
        profile: DeviceProfile,
        width: u32,
        height: u32,
    ) -> Result<Self, RoomError> {
        let mut physics = PhysicsWorld::new(&config.physics);
        let mut scene = SceneGraph::new();
        let mut registry = EntityRegistry::new();
        for desc in &layout.entities {
            registry.spawn(desc.clone(), loader, &mut scene, &mut physics)?;
        }

        let mut camera = Camera::new(width, height);
        camera.fov_y = config.camera.fov_y_degrees.to_radians();
        camera.z_near = config.camera.z_near;
        camera.z_far = config.camera.z_far;

        info!(
            entities = registry.len(),
            bound = registry.bound_count(),
            ?profile,
            "room constructed"
        );

        let mut ctx = Self {
            registry,
            physics,
            scene,
            camera,
            camera_controller: CameraController::new(config.camera, profile),
            input_state: InputState::new(),
            input_processor: InputProcessor::new(config.bindings),
            locomotion: Locomotion::new(config.locomotion),
            stepper: WorldStepCoordinator::new(config.physics),
            viewport: (width, height),
            last_time: None,
            frame: 0,
        };
        ctx.pin_camera();
        Ok(ctx)
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn mode(&self) -> CameraMode {
        self.camera_controller.mode()
    }

    pub fn enter_game_mode(&mut self) {
        self.camera_controller.enter_game_mode();
    }

    pub fn exit_game_mode(&mut self) {
        self.camera_controller.exit_game_mode();
    }

    /// Apply one input event right away. Clicks and taps resolve their
    /// interaction immediately and return it.
    pub fn handle_event(&mut self, event: &InputEvent) -> Option<Interaction> {
        let effect = self.input_state.process_event(event);
        match event {
            InputEvent::PointerLockChanged { locked } => self.camera_controller.set_pointer_locked(*locked),
            InputEvent::Resize { width, height } => {
                self.viewport = (*width, *height);
                self.camera.set_aspect(*width, *height);
            }
            InputEvent::Click { x, y } => return self.interact_at(Vec2::new(*x, *y)),
            _ => {}
        }

        match effect {
            InputEffect::Look(delta) => {
                self.camera_controller.add_look(delta);
                None
            }
            InputEffect::Tap(at) => self.interact_at(at),
            InputEffect::None => None,
        }
    }

    /// Pick through a screen point, or through the crosshair while the pointer is captured.
    pub fn interact_at(&mut self, screen: Vec2) -> Option<Interaction> {
        let ndc = if self.input_state.pointer_locked {
            Vec2::ZERO
        } else {
            let (width, height) = self.viewport;
            screen_to_ndc(screen.x, screen.y, width as f32, height as f32)
        };
        InteractionResolver::resolve(&self.camera, &self.scene, &mut self.registry, ndc)
    }

    /// Advance by wall-clock time in milliseconds. The first call only
    /// establishes the clock.
    pub fn tick(&mut self, now_ms: f64) -> FrameReport {
        let delta = match self.last_time {
            Some(last) => ((now_ms - last) / 1000.0).max(0.0) as f32,
            None => 0.0,
        };
        self.last_time = Some(now_ms);
        self.advance(delta)
    }

    pub fn advance(&mut self, delta: f32) -> FrameReport {
        self.camera_controller.set_frame_delta(delta);

        let bound = self.registry.poll_loads(&mut self.scene, &mut self.physics);

        let (facing_yaw, _) = self.camera.yaw_pitch();
        let player_body = self.update_player(facing_yaw);
        self.locomotion.apply_keys(
            player_body,
            facing_yaw,
            &mut self.physics,
            &self.input_state,
            &self.input_processor,
        );
        if let Some(angle) = self.input_state.move_touch.and_then(|touch| touch.angle()) {
            self.locomotion
                .walk_mobile(player_body, facing_yaw, &mut self.physics, delta, angle);
        }

        for entity in self.registry.iter_mut() {
            let advance = capabilities(entity.tag()).advance;
            advance(&mut entity.kind, entity.body, &mut self.physics);
        }

        let step = self
            .stepper
            .step(delta, &mut self.physics, &self.registry, &mut self.scene);

        self.camera_controller.update(&mut self.camera);
        self.pin_camera();

        self.frame += 1;
        if bound > 0 {
            debug!(frame = self.frame, bound, "late-bound entities joined the scene");
        }
        FrameReport {
            frame: self.frame,
            delta,
            step,
            bound,
            mode: self.camera_controller.mode(),
        }
    }

    /// Record the facing yaw on the player and return its body, if any.
    fn update_player(&mut self, facing_yaw: f32) -> Option<BodyHandle> {
        let id = self.registry.player_id()?;
        let player = self.registry.get_mut(id)?;
        if let EntityKind::Player(state) = &mut player.kind {
            state.facing_yaw = facing_yaw;
        }
        player.body
    }

    fn pin_camera(&mut self) {
        if let Some(position) = self.player_position() {
            self.camera_controller.pin_to(&mut self.camera, position);
        }
    }

    pub fn player_position(&self) -> Option<Vec3> {
        let id = self.registry.player_id()?;
        let body = self.registry.get(id)?.body?;
        self.physics.translation(body)
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot::capture(self.frame, self.mode(), &self.camera, &self.scene, &self.registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::asset::ManualLoader;

    fn context(loader: &mut ManualLoader) -> FrameLoopContext {
        context_for(loader, DeviceProfile::Pointer)
    }

    fn context_for(loader: &mut ManualLoader, profile: DeviceProfile) -> FrameLoopContext {
        let config = RoomConfig::default();
        let layout = RoomLayout::default_room(&config.fixtures);
        FrameLoopContext::from_layout(config, &layout, loader, profile, 800, 600).expect("room")
    }

    fn lamp_powered(ctx: &FrameLoopContext) -> bool {
        ctx.registry.by_name("lamp").is_some_and(|e| e.kind.is_powered())
    }

    #[test]
    fn modeled_entities_bind_on_a_later_tick() {
        let mut loader = ManualLoader::with_latency(2);
        let mut ctx = context(&mut loader);
        assert!(ctx.registry.by_name("desk").is_some_and(|e| e.body.is_none()));

        let first = ctx.advance(1.0 / 60.0);
        assert_eq!(first.bound, 0);
        loader.advance_frame();
        loader.advance_frame();
        let later = ctx.advance(1.0 / 60.0);
        assert_eq!(later.bound, 4);
        assert_eq!(ctx.registry.bound_count(), ctx.registry.len());
    }

    #[test]
    fn camera_rides_the_player() {
        let mut loader = ManualLoader::new();
        let mut ctx = context(&mut loader);
        ctx.advance(1.0 / 60.0);
        let player = ctx.player_position().expect("player");
        assert!(ctx.camera.eye.abs_diff_eq(player + Vec3::Y * 0.6, 1e-6));
    }

    #[test]
    fn held_forward_key_walks_toward_the_back_wall() {
        let mut loader = ManualLoader::new();
        let mut ctx = context(&mut loader);
        let start = ctx.player_position().expect("player");
        ctx.handle_event(&InputEvent::KeyDown("KeyW".into()));
        for _ in 0..10 {
            ctx.advance(1.0 / 60.0);
        }
        ctx.handle_event(&InputEvent::KeyUp("KeyW".into()));
        let end = ctx.player_position().expect("player");
        assert!(end.z < start.z - 0.4, "player did not move forward: {start} -> {end}");
        assert!((end.x - start.x).abs() < 1e-3);
    }

    #[test]
    fn pointer_deltas_turn_the_camera_only_in_game_mode() {
        let mut loader = ManualLoader::new();
        let mut ctx = context(&mut loader);
        ctx.advance(1.0 / 60.0);
        ctx.handle_event(&InputEvent::PointerMove { dx: 100.0, dy: 0.0 });
        ctx.advance(1.0 / 60.0);
        assert_eq!(ctx.camera.yaw_pitch().0, 0.0);

        ctx.handle_event(&InputEvent::PointerLockChanged { locked: true });
        assert_eq!(ctx.mode(), CameraMode::Game);
        ctx.handle_event(&InputEvent::PointerMove { dx: 100.0, dy: 0.0 });
        ctx.advance(1.0 / 60.0);
        assert!(ctx.camera.yaw_pitch().0 < 0.0);
    }

    #[test]
    fn crosshair_click_toggles_the_lamp() {
        let mut loader = ManualLoader::new();
        let mut ctx = context(&mut loader);
        loader.resolve_all();
        ctx.advance(1.0 / 60.0);

        // From the start point the lamp is straight ahead at eye height.
        ctx.handle_event(&InputEvent::PointerLockChanged { locked: true });
        let hit = ctx.handle_event(&InputEvent::Click { x: 0.0, y: 0.0 }).expect("hit");
        assert_eq!(hit.name, "lamp");
        assert!(lamp_powered(&ctx));
    }

    #[test]
    fn tap_toggles_the_lamp_and_drag_walks() {
        let mut loader = ManualLoader::new();
        let mut ctx = context_for(&mut loader, DeviceProfile::Touch);
        loader.resolve_all();
        ctx.advance(1.0 / 60.0);

        // A tap in the middle of the screen picks the lamp ahead.
        assert!(ctx
            .handle_event(&InputEvent::TouchStart { id: 0, x: 400.0, y: 300.0 })
            .is_none());
        let hit = ctx.handle_event(&InputEvent::TouchEnd { id: 0 }).expect("tap hit");
        assert_eq!(hit.name, "lamp");
        assert!(lamp_powered(&ctx));

        let start = ctx.player_position().expect("player");
        ctx.handle_event(&InputEvent::TouchStart { id: 1, x: 100.0, y: 300.0 });
        ctx.handle_event(&InputEvent::TouchMove { id: 1, x: 100.0, y: 250.0 });
        ctx.advance(0.1);
        let moved = ctx.player_position().expect("player") - start;
        assert!((moved.z + 0.3).abs() < 1e-3, "drag moved {moved}");
        assert!(moved.x.abs() < 1e-3);

        // Lifting after a long drag is not a tap.
        assert!(ctx.handle_event(&InputEvent::TouchEnd { id: 1 }).is_none());
        assert!(lamp_powered(&ctx));
    }

    #[test]
    fn walking_into_the_lamp_stops_short_of_its_far_side() {
        let mut loader = ManualLoader::new();
        let mut ctx = context(&mut loader);
        loader.resolve_all();
        ctx.handle_event(&InputEvent::KeyDown("KeyW".into()));
        for _ in 0..200 {
            ctx.advance(1.0 / 60.0);
        }
        // Lamp at z -1.7 with half depth 0.25, player radius 0.25.
        let end = ctx.player_position().expect("player");
        assert!(end.z < -1.1, "player never reached the lamp: {end}");
        assert!(end.z > -1.45, "player walked into the lamp: {end}");
    }

    #[test]
    fn powered_vacuum_leaves_its_origin() {
        let mut loader = ManualLoader::new();
        let mut ctx = context(&mut loader);
        loader.resolve_all();
        ctx.advance(1.0 / 60.0);
        ctx.registry.toggle_power("roboticVaccum").expect("vacuum");
        for _ in 0..200 {
            ctx.advance(1.0 / 60.0);
        }
        let vacuum = ctx.registry.by_name("roboticVaccum").expect("vacuum");
        let (position, _) = vacuum
            .body
            .and_then(|b| ctx.physics.transform(b))
            .expect("body");
        assert!((position.x + 1.0).abs() > 1e-4 || position.z.abs() > 1e-4);

        let node = vacuum.visual.and_then(|n| ctx.scene.get(n)).expect("node");
        assert_eq!(node.position, position);
    }

    #[test]
    fn first_tick_only_starts_the_clock() {
        let mut loader = ManualLoader::new();
        let mut ctx = context(&mut loader);
        assert_eq!(ctx.tick(1000.0).delta, 0.0);
        let report = ctx.tick(1016.0);
        assert!((report.delta - 0.016).abs() < 1e-6);
        assert_eq!(report.frame, 2);
    }
}
