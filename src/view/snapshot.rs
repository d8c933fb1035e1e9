//! Serializable view of one frame, handed to whatever draws it.

use serde::Serialize;

use crate::controller::camera_controller::CameraMode;
use crate::controller::registry::EntityRegistry;
use crate::model::entity::EntityKind;
use crate::model::scene_graph::{NodeStyle, SceneGraph};
use crate::model::Camera;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraView {
    pub eye: [f32; 3],
    pub target: [f32; 3],
    pub up: [f32; 3],
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeLook {
    Solid { color: [f32; 3] },
    Model { uri: String },
    Textured { uri: String },
    HitProxy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub name: String,
    pub look: NodeLook,
    pub visible: bool,
    pub position: [f32; 3],
    /// Quaternion as x, y, z, w.
    pub rotation: [f32; 4],
    pub half_extents: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightView {
    pub name: String,
    pub position: [f32; 3],
    pub powered: bool,
    pub intensity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub mode: CameraMode,
    pub camera: CameraView,
    pub nodes: Vec<NodeView>,
    pub lights: Vec<LightView>,
}

impl FrameSnapshot {
    pub fn capture(
        frame: u64,
        mode: CameraMode,
        camera: &Camera,
        scene: &SceneGraph,
        registry: &EntityRegistry,
    ) -> Self {
        let camera = CameraView {
            eye: camera.eye.to_array(),
            target: camera.target().to_array(),
            up: camera.up.to_array(),
            fov_y: camera.fov_y,
            aspect: camera.aspect,
            near: camera.z_near,
            far: camera.z_far,
        };

        let nodes = scene
            .iter()
            .map(|(_, node)| NodeView {
                name: node.name.clone(),
                look: match &node.style {
                    NodeStyle::Solid { color } => NodeLook::Solid { color: *color },
                    NodeStyle::Model { uri } => NodeLook::Model { uri: uri.clone() },
                    NodeStyle::Textured { uri } => NodeLook::Textured { uri: uri.clone() },
                    NodeStyle::HitProxy => NodeLook::HitProxy,
                },
                visible: node.is_visible(),
                position: node.position.to_array(),
                rotation: node.rotation.to_array(),
                half_extents: node.half_extents.to_array(),
            })
            .collect();

        // Lights sit wherever their fixture's node is.
        let lights = registry
            .iter()
            .filter_map(|entity| match entity.kind {
                EntityKind::Powered(state) => {
                    let node = entity.visual.and_then(|id| scene.get(id))?;
                    Some(LightView {
                        name: entity.name.clone(),
                        position: node.position.to_array(),
                        powered: state.powered,
                        intensity: state.intensity,
                    })
                }
                _ => None,
            })
            .collect();

        Self {
            frame,
            mode,
            camera,
            nodes,
            lights,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::physics::{PhysicsConfig, PhysicsWorld};
    use crate::model::asset::ManualLoader;
    use crate::model::entity::{EntityDesc, VisualSource};
    use glam::Vec3;

    #[test]
    fn lights_appear_once_their_fixture_is_bound() {
        let mut registry = EntityRegistry::new();
        let mut loader = ManualLoader::new();
        let mut scene = SceneGraph::new();
        let mut physics = PhysicsWorld::new(&PhysicsConfig::default());
        registry
            .spawn(
                EntityDesc::new("lamp", Vec3::new(0.5, 1.8, 0.5))
                    .at(0.0, -1.7)
                    .kind(EntityKind::lamp(3.0))
                    .visual(VisualSource::Model { uri: "/models/lamp.glb".into() }),
                &mut loader,
                &mut scene,
                &mut physics,
            )
            .expect("spawn");
        let camera = Camera::new(800, 600);

        let before = FrameSnapshot::capture(0, CameraMode::Website, &camera, &scene, &registry);
        assert!(before.nodes.is_empty());
        assert!(before.lights.is_empty());

        loader.resolve_all();
        registry.poll_loads(&mut scene, &mut physics);
        registry.toggle_power("lamp").expect("lamp");

        let after = FrameSnapshot::capture(1, CameraMode::Game, &camera, &scene, &registry);
        assert_eq!(after.nodes.len(), 2);
        assert_eq!(after.nodes.iter().filter(|n| n.visible).count(), 1);
        assert_eq!(after.lights.len(), 1);
        assert_eq!(after.lights[0].intensity, 3.0);
        let [x, y, z] = after.lights[0].position;
        assert!(Vec3::new(x, y, z).abs_diff_eq(Vec3::new(0.0, 1.3, -1.7), 1e-6));
    }
}
