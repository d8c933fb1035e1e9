use std::collections::HashMap;

use glam::{Quat, Vec3};
use rapier3d::na::{Isometry3, Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::*;
use tracing::warn;

/// Named friction/restitution pair attached to colliders.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMaterial {
    pub name: String,
    pub friction: f32,
    pub restitution: f32,
}

impl SurfaceMaterial {
    pub fn new(name: impl Into<String>, friction: f32, restitution: f32) -> Self {
        Self {
            name: name.into(),
            friction,
            restitution,
        }
    }
}

/// Contact response between two surface materials, order-independent.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactMaterial {
    pub first: String,
    pub second: String,
    pub friction: f32,
    pub restitution: f32,
}

#[derive(Debug, Clone)]
pub struct PhysicsConfig {
    pub gravity: Vec3,
    /// Frame deltas below this indicate a high refresh-rate display.
    pub high_refresh_threshold: f32,
    pub fast_substep: f32,
    pub substep: f32,
    pub max_substeps: u32,
    /// The first entry is the fallback for unknown names.
    pub materials: Vec<SurfaceMaterial>,
    pub contacts: Vec<ContactMaterial>,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -10.0, 0.0),
            high_refresh_threshold: 0.01,
            fast_substep: 1.0 / 120.0,
            substep: 1.0 / 60.0,
            max_substeps: 3,
            materials: vec![
                SurfaceMaterial::new("default", 0.5, 0.3),
                SurfaceMaterial::new("player", 0.0, 0.0),
            ],
            contacts: vec![
                ContactMaterial {
                    first: "default".into(),
                    second: "default".into(),
                    friction: 0.5,
                    restitution: 0.3,
                },
                ContactMaterial {
                    first: "default".into(),
                    second: "player".into(),
                    friction: 0.0,
                    restitution: 0.0,
                },
            ],
        }
    }
}

impl PhysicsConfig {
    /// 1/120 on high refresh-rate frames, 1/60 otherwise.
    pub fn substep_for(&self, delta: f32) -> f32 {
        if delta < self.high_refresh_threshold {
            self.fast_substep
        } else {
            self.substep
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyShape {
    Cuboid(Vec3),
    Ball(f32),
    Capsule { half_height: f32, radius: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodySpec {
    pub position: Vec3,
    pub rotation: Quat,
    pub shape: BodyShape,
    /// 0 makes the body immovable.
    pub mass: f32,
    pub material: String,
    pub lock_rotations: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(RigidBodyHandle);

fn pair_key(a: u128, b: u128) -> (u128, u128) {
    (a.min(b), a.max(b))
}

/// Overrides solver friction/restitution per material pair. Colliders carry
/// their material index in `user_data`.
struct ContactMaterialHooks {
    pairs: HashMap<(u128, u128), (f32, f32)>,
}

impl PhysicsHooks for ContactMaterialHooks {
    fn modify_solver_contacts(&self, context: &mut ContactModificationContext) {
        let first = context.colliders[context.collider1].user_data;
        let second = context.colliders[context.collider2].user_data;
        if let Some(&(friction, restitution)) = self.pairs.get(&pair_key(first, second)) {
            for contact in context.solver_contacts.iter_mut() {
                contact.friction = friction;
                contact.restitution = restitution;
            }
        }
    }
}

/// Rigid-body world backed by rapier, stepped with a fixed-substep accumulator.
pub struct PhysicsWorld {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    ccd_solver: CCDSolver,
    gravity: Vector<Real>,
    materials: Vec<SurfaceMaterial>,
    hooks: ContactMaterialHooks,
    accumulator: f32,
}

impl PhysicsWorld {
    pub fn new(config: &PhysicsConfig) -> Self {
        let mut materials = config.materials.clone();
        if materials.is_empty() {
            materials.push(SurfaceMaterial::new("default", 0.5, 0.0));
        }

        let index_of = |name: &str| materials.iter().position(|m| m.name == name);
        let mut pairs = HashMap::new();
        for contact in &config.contacts {
            match (index_of(&contact.first), index_of(&contact.second)) {
                (Some(a), Some(b)) => {
                    pairs.insert(pair_key(a as u128, b as u128), (contact.friction, contact.restitution));
                }
                _ => warn!(
                    first = %contact.first,
                    second = %contact.second,
                    "contact material references an unknown surface material"
                ),
            }
        }

        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            ccd_solver: CCDSolver::new(),
            gravity: vector![config.gravity.x, config.gravity.y, config.gravity.z],
            materials,
            hooks: ContactMaterialHooks { pairs },
            accumulator: 0.0,
        }
    }

    fn material_index(&self, name: &str) -> usize {
        self.materials.iter().position(|m| m.name == name).unwrap_or_else(|| {
            warn!(material = %name, "unknown surface material, using default");
            0
        })
    }

    pub fn add_body(&mut self, spec: &BodySpec) -> BodyHandle {
        let builder = if spec.mass > 0.0 {
            RigidBodyBuilder::dynamic()
        } else {
            RigidBodyBuilder::fixed()
        };
        let isometry = Isometry3::from_parts(
            Translation3::new(spec.position.x, spec.position.y, spec.position.z),
            to_rotation(spec.rotation),
        );
        let mut builder = builder.position(isometry);
        if spec.lock_rotations {
            builder = builder.lock_rotations();
        }
        let handle = self.bodies.insert(builder.build());

        let material_idx = self.material_index(&spec.material);
        let material = &self.materials[material_idx];
        let collider = match spec.shape {
            BodyShape::Cuboid(half) => ColliderBuilder::cuboid(half.x, half.y, half.z),
            BodyShape::Ball(radius) => ColliderBuilder::ball(radius),
            BodyShape::Capsule { half_height, radius } => ColliderBuilder::capsule_y(half_height, radius),
        }
        .friction(material.friction)
        .restitution(material.restitution)
        .user_data(material_idx as u128)
        .active_hooks(ActiveHooks::MODIFY_SOLVER_CONTACTS);
        let collider = if spec.mass > 0.0 { collider.mass(spec.mass) } else { collider };

        self.colliders
            .insert_with_parent(collider.build(), handle, &mut self.bodies);
        BodyHandle(handle)
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle.0)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_dynamic(&self, handle: BodyHandle) -> bool {
        self.bodies.get(handle.0).is_some_and(|b| b.is_dynamic())
    }

    pub fn transform(&self, handle: BodyHandle) -> Option<(Vec3, Quat)> {
        self.bodies.get(handle.0).map(|body| {
            let t = body.translation();
            let r = body.rotation();
            (Vec3::new(t.x, t.y, t.z), Quat::from_xyzw(r.i, r.j, r.k, r.w))
        })
    }

    pub fn translation(&self, handle: BodyHandle) -> Option<Vec3> {
        self.transform(handle).map(|(t, _)| t)
    }

    /// Kinematic override: places the body directly, outside the integrator.
    pub fn set_translation(&mut self, handle: BodyHandle, position: Vec3) {
        if let Some(body) = self.bodies.get_mut(handle.0) {
            body.set_translation(vector![position.x, position.y, position.z], true);
        }
    }

    pub fn translate(&mut self, handle: BodyHandle, delta: Vec3) {
        if let Some(current) = self.translation(handle) {
            self.set_translation(handle, current + delta);
        }
    }

    pub fn set_rotation(&mut self, handle: BodyHandle, rotation: Quat) {
        if let Some(body) = self.bodies.get_mut(handle.0) {
            body.set_rotation(to_rotation(rotation), true);
        }
    }

    pub fn gravity(&self) -> Vec3 {
        Vec3::new(self.gravity.x, self.gravity.y, self.gravity.z)
    }

    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Advance by whole `fixed_substep`s covering `real_elapsed`, at most
    /// `max_substeps` of them. Time left over after the cap is dropped, the
    /// sub-step remainder carries to the next call. Returns substeps run.
    pub fn step(&mut self, fixed_substep: f32, real_elapsed: f32, max_substeps: u32) -> u32 {
        if fixed_substep <= 0.0 {
            return 0;
        }
        self.accumulator += real_elapsed.max(0.0);

        let mut substeps = 0;
        while self.accumulator >= fixed_substep && substeps < max_substeps {
            self.step_once(fixed_substep);
            self.accumulator -= fixed_substep;
            substeps += 1;
        }
        self.accumulator %= fixed_substep;
        substeps
    }

    fn step_once(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &self.hooks,
            &(),
        );
    }
}

fn to_rotation(q: Quat) -> UnitQuaternion<f32> {
    UnitQuaternion::new_normalize(Quaternion::new(q.w, q.x, q.y, q.z))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn box_spec(position: Vec3, mass: f32) -> BodySpec {
        BodySpec {
            position,
            rotation: Quat::IDENTITY,
            shape: BodyShape::Cuboid(Vec3::splat(0.5)),
            mass,
            material: "default".into(),
            lock_rotations: false,
        }
    }

    #[test]
    fn substep_depends_on_frame_delta() {
        let config = PhysicsConfig::default();
        for delta in [0.0, 0.004, 0.0083, 0.0099] {
            assert_eq!(config.substep_for(delta), 1.0 / 120.0);
        }
        for delta in [0.01, 0.0167, 0.033, 0.5] {
            assert_eq!(config.substep_for(delta), 1.0 / 60.0);
        }
    }

    #[test]
    fn static_bodies_never_move() {
        let mut world = PhysicsWorld::new(&PhysicsConfig::default());
        let wall = world.add_body(&box_spec(Vec3::new(0.0, 5.0, 0.0), 0.0));
        for _ in 0..30 {
            world.step(1.0 / 60.0, 1.0 / 60.0, 3);
        }
        assert_eq!(world.translation(wall), Some(Vec3::new(0.0, 5.0, 0.0)));
        assert!(!world.is_dynamic(wall));
    }

    #[test]
    fn dynamic_bodies_fall() {
        let mut world = PhysicsWorld::new(&PhysicsConfig::default());
        let crate_body = world.add_body(&box_spec(Vec3::new(0.0, 5.0, 0.0), 2.0));
        for _ in 0..30 {
            world.step(1.0 / 60.0, 1.0 / 60.0, 3);
        }
        let y = world.translation(crate_body).map(|t| t.y).unwrap_or(f32::MAX);
        assert!(y < 5.0);
    }

    #[test]
    fn resting_body_stays_above_floor() {
        let mut world = PhysicsWorld::new(&PhysicsConfig::default());
        let floor = BodySpec {
            shape: BodyShape::Cuboid(Vec3::new(5.0, 0.1, 5.0)),
            ..box_spec(Vec3::ZERO, 0.0)
        };
        world.add_body(&floor);
        let body = world.add_body(&box_spec(Vec3::new(0.0, 1.0, 0.0), 1.0));
        for _ in 0..240 {
            world.step(1.0 / 60.0, 1.0 / 60.0, 3);
        }
        let y = world.translation(body).map(|t| t.y).unwrap_or(f32::MIN);
        assert!(y > 0.5, "body sank through the floor: y = {y}");
    }

    #[test]
    fn accumulator_caps_substeps_and_drops_stalls() {
        let dt = 1.0 / 60.0;
        let mut stalled = PhysicsWorld::new(&PhysicsConfig::default());
        assert_eq!(stalled.step(dt, 1.0, 3), 3);
        assert!(stalled.accumulator() < dt);

        let mut world = PhysicsWorld::new(&PhysicsConfig::default());
        assert_eq!(world.step(dt, dt * 0.5, 3), 0);
        assert!((world.accumulator() - dt * 0.5).abs() < 1e-6);
        assert_eq!(world.step(dt, dt * 0.6, 3), 1);
    }

    #[test]
    fn kinematic_override_places_body() {
        let mut world = PhysicsWorld::new(&PhysicsConfig::default());
        let body = world.add_body(&box_spec(Vec3::ZERO, 0.0));
        world.set_translation(body, Vec3::new(1.0, 2.0, 3.0));
        world.translate(body, Vec3::new(0.5, 0.0, -1.0));
        assert_eq!(world.translation(body), Some(Vec3::new(1.5, 2.0, 2.0)));
    }

    #[test]
    fn rotation_survives_the_rapier_round_trip() {
        let mut world = PhysicsWorld::new(&PhysicsConfig::default());
        let rotation = Quat::from_rotation_x(52f32.to_radians());
        let spec = BodySpec {
            rotation,
            ..box_spec(Vec3::ZERO, 0.0)
        };
        let body = world.add_body(&spec);
        let (_, stored) = world.transform(body).unwrap_or((Vec3::ZERO, Quat::IDENTITY));
        assert!(stored.abs_diff_eq(rotation, 1e-5));
    }

    /// How far a block launched at 2 m/s slides across a default floor in one second.
    fn slide_distance(material: &str) -> f32 {
        let mut world = PhysicsWorld::new(&PhysicsConfig::default());
        world.add_body(&BodySpec {
            shape: BodyShape::Cuboid(Vec3::new(20.0, 0.1, 20.0)),
            ..box_spec(Vec3::ZERO, 0.0)
        });
        let block = world.add_body(&BodySpec {
            material: material.into(),
            lock_rotations: true,
            ..box_spec(Vec3::new(0.0, 0.6, 0.0), 1.0)
        });
        if let Some(body) = world.bodies.get_mut(block.0) {
            body.set_linvel(vector![2.0, 0.0, 0.0], true);
        }
        for _ in 0..60 {
            world.step(1.0 / 60.0, 1.0 / 60.0, 3);
        }
        world.translation(block).map(|t| t.x).unwrap_or(0.0)
    }

    #[test]
    fn contact_materials_set_friction_per_pair() {
        // default/player is frictionless, default/default brakes at 0.5.
        // Without the pair override rapier would average the two to 0.25.
        let player = slide_distance("player");
        let default = slide_distance("default");
        assert!(player > 1.8, "player block was braked: {player}");
        assert!(default < 1.0, "default block kept sliding: {default}");
        assert!(player > default);
    }

    #[test]
    fn unknown_material_falls_back_to_default() {
        let mut world = PhysicsWorld::new(&PhysicsConfig::default());
        let spec = BodySpec {
            material: "velvet".into(),
            ..box_spec(Vec3::ZERO, 0.0)
        };
        let body = world.add_body(&spec);
        assert!(world.contains(body));
        assert_eq!(world.body_count(), 1);
    }
}
