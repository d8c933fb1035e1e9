use glam::Vec2;
use tracing::{debug, trace};

use crate::controller::fixtures::capabilities;
use crate::controller::registry::EntityRegistry;
use crate::model::entity::{BehaviorTag, EntityId};
use crate::model::scene_graph::{RayHit, SceneGraph};
use crate::model::Camera;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionHandler {
    /// Structural props: walls, floor, furniture.
    Ignore,
    TogglePower,
}

pub fn handler_for(tag: BehaviorTag) -> InteractionHandler {
    match tag {
        BehaviorTag::Powered | BehaviorTag::Mobile => InteractionHandler::TogglePower,
        BehaviorTag::Static | BehaviorTag::Player => InteractionHandler::Ignore,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub entity: EntityId,
    pub name: String,
    pub handler: InteractionHandler,
    pub distance: f32,
    /// Power state after the handler ran.
    pub powered: bool,
}

/// Client pixel coordinates to normalized device coordinates, y up.
pub fn screen_to_ndc(x: f32, y: f32, width: f32, height: f32) -> Vec2 {
    Vec2::new(
        x / width.max(1.0) * 2.0 - 1.0,
        -(y / height.max(1.0) * 2.0 - 1.0),
    )
}

pub struct InteractionResolver;

impl InteractionResolver {
    pub fn cast(camera: &Camera, scene: &SceneGraph, ndc: Vec2) -> Vec<RayHit> {
        scene.intersect_ray(&camera.ray_from_ndc(ndc))
    }

    /// Only the nearest hit is considered. A hit that names no entity is
    /// absorbed.
    pub fn dispatch(hits: &[RayHit], registry: &mut EntityRegistry) -> Option<Interaction> {
        let hit = hits.first()?;
        let Some(id) = registry.id_of(&hit.name) else {
            trace!(node = %hit.name, "hit has no owning entity");
            return None;
        };
        let entity = registry.get_mut(id)?;
        let handler = handler_for(entity.tag());
        if handler == InteractionHandler::TogglePower {
            (capabilities(entity.tag()).toggle)(&mut entity.kind);
        }
        debug!(entity = %entity.name, ?handler, distance = hit.distance, "interaction");
        Some(Interaction {
            entity: id,
            name: entity.name.clone(),
            handler,
            distance: hit.distance,
            powered: entity.kind.is_powered(),
        })
    }

    pub fn resolve(
        camera: &Camera,
        scene: &SceneGraph,
        registry: &mut EntityRegistry,
        ndc: Vec2,
    ) -> Option<Interaction> {
        let hits = Self::cast(camera, scene, ndc);
        Self::dispatch(&hits, registry)
    }
}
