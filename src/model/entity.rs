use glam::{EulerRot, Quat, Vec2, Vec3};

use crate::controller::physics::{BodyHandle, BodyShape, BodySpec};
use crate::model::asset::AssetHandle;
use crate::model::scene_graph::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub(crate) usize);

/// Where an entity's visual representation comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum VisualSource {
    Primitive { color: [f32; 3] },
    Model { uri: String },
    Textured { uri: String },
    /// Physics only; nothing is drawn (the first-person player).
    Hidden,
}

impl VisualSource {
    pub fn is_deferred(&self) -> bool {
        matches!(self, VisualSource::Model { .. } | VisualSource::Textured { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerState {
    pub powered: bool,
    pub intensity: f32,
    pub on_intensity: f32,
}

/// Parametric path state for a self-propelled fixture. `origin` is (x, z).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitState {
    pub powered: bool,
    pub origin: Vec2,
    pub radius: f32,
    pub angle: f32,
    pub angle_step: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerState {
    pub facing_yaw: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityKind {
    Static,
    Powered(PowerState),
    Mobile(OrbitState),
    Player(PlayerState),
}

impl EntityKind {
    pub fn lamp(on_intensity: f32) -> Self {
        EntityKind::Powered(PowerState {
            powered: false,
            intensity: 0.0,
            on_intensity,
        })
    }

    /// Origin is filled in from the spawn position.
    pub fn vacuum(angle_step: f32) -> Self {
        EntityKind::Mobile(OrbitState {
            powered: false,
            origin: Vec2::ZERO,
            radius: 0.0,
            angle: 0.0,
            angle_step,
        })
    }

    pub fn player() -> Self {
        EntityKind::Player(PlayerState { facing_yaw: 0.0 })
    }

    pub fn tag(&self) -> BehaviorTag {
        match self {
            EntityKind::Static => BehaviorTag::Static,
            EntityKind::Powered(_) => BehaviorTag::Powered,
            EntityKind::Mobile(_) => BehaviorTag::Mobile,
            EntityKind::Player(_) => BehaviorTag::Player,
        }
    }

    pub fn is_powered(&self) -> bool {
        match self {
            EntityKind::Powered(state) => state.powered,
            EntityKind::Mobile(state) => state.powered,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviorTag {
    Static = 0,
    Powered = 1,
    Mobile = 2,
    Player = 3,
}

/// Everything needed to construct an entity, whatever its visual source.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDesc {
    pub name: String,
    pub kind: EntityKind,
    /// Full width, height, depth.
    pub size: Vec3,
    pub x: f32,
    pub z: f32,
    /// Explicit centre height; otherwise resting at `elevation`.
    pub y: Option<f32>,
    pub elevation: f32,
    /// Euler angles in radians, applied X then Y then Z.
    pub rotation: Vec3,
    pub mass: f32,
    pub material: String,
    pub shape: Option<BodyShape>,
    pub visual: VisualSource,
}

impl EntityDesc {
    pub fn new(name: impl Into<String>, size: Vec3) -> Self {
        Self {
            name: name.into(),
            kind: EntityKind::Static,
            size,
            x: 0.0,
            z: 0.0,
            y: None,
            elevation: 0.4,
            rotation: Vec3::ZERO,
            mass: 0.0,
            material: "default".into(),
            shape: None,
            visual: VisualSource::Primitive { color: [1.0, 1.0, 1.0] },
        }
    }

    pub fn kind(mut self, kind: EntityKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn at(mut self, x: f32, z: f32) -> Self {
        self.x = x;
        self.z = z;
        self
    }

    pub fn height_at(mut self, y: f32) -> Self {
        self.y = Some(y);
        self
    }

    pub fn elevation(mut self, elevation: f32) -> Self {
        self.elevation = elevation;
        self
    }

    pub fn rotation(mut self, euler: Vec3) -> Self {
        self.rotation = euler;
        self
    }

    pub fn mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn material(mut self, material: impl Into<String>) -> Self {
        self.material = material.into();
        self
    }

    pub fn shape(mut self, shape: BodyShape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn visual(mut self, visual: VisualSource) -> Self {
        self.visual = visual;
        self
    }

    pub fn position(&self) -> Vec3 {
        let y = self.y.unwrap_or(self.size.y / 2.0 + self.elevation);
        Vec3::new(self.x, y, self.z)
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    pub fn half_extents(&self) -> Vec3 {
        self.size / 2.0
    }

    pub fn body_spec(&self) -> BodySpec {
        BodySpec {
            position: self.position(),
            rotation: self.orientation(),
            shape: self.shape.unwrap_or(BodyShape::Cuboid(self.half_extents())),
            mass: self.mass,
            material: self.material.clone(),
            lock_rotations: matches!(self.kind, EntityKind::Player(_)),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Binding {
    Bound,
    Loading(AssetHandle),
    /// The load failed; the entity never joins the scene or the world.
    Failed,
}

/// A named scene participant: behaviour, visual node(s) and physics body.
/// The body is authoritative; node transforms are derived from it.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,
    pub desc: EntityDesc,
    pub visual: Option<NodeId>,
    pub hit_proxy: Option<NodeId>,
    pub body: Option<BodyHandle>,
    pub binding: Binding,
}

impl Entity {
    pub fn is_bound(&self) -> bool {
        matches!(self.binding, Binding::Bound)
    }

    pub fn tag(&self) -> BehaviorTag {
        self.kind.tag()
    }
}
