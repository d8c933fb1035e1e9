use std::collections::HashMap;

use glam::Vec2;
use tracing::{debug, error, info};

use crate::controller::fixtures::capabilities;
use crate::controller::physics::PhysicsWorld;
use crate::error::RoomError;
use crate::model::asset::{AssetKind, AssetLoader, LoadState};
use crate::model::entity::{Binding, Entity, EntityDesc, EntityId, EntityKind, VisualSource};
use crate::model::scene_graph::{NodeStyle, SceneGraph, SceneNode};

/// Owns every entity for the session. Entities are never removed.
#[derive(Default)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
    by_name: HashMap<String, EntityId>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The one construction path for every kind of entity.
    ///
    /// Primitive and hidden entities are bound at once. Modeled and
    /// textured ones request their asset and bind when it arrives.
    pub fn spawn(
        &mut self,
        desc: EntityDesc,
        loader: &mut dyn AssetLoader,
        scene: &mut SceneGraph,
        physics: &mut PhysicsWorld,
    ) -> Result<EntityId, RoomError> {
        if self.by_name.contains_key(&desc.name) {
            return Err(RoomError::DuplicateEntity(desc.name));
        }

        let mut kind = desc.kind;
        if let EntityKind::Mobile(state) = &mut kind {
            let position = desc.position();
            state.origin = Vec2::new(position.x, position.z);
        }

        let binding = match &desc.visual {
            VisualSource::Model { uri } => Binding::Loading(loader.load(uri, AssetKind::Model)),
            VisualSource::Textured { uri } => Binding::Loading(loader.load(uri, AssetKind::Texture)),
            VisualSource::Primitive { .. } | VisualSource::Hidden => Binding::Bound,
        };

        let id = EntityId(self.entities.len());
        let mut entity = Entity {
            id,
            name: desc.name.clone(),
            kind,
            desc,
            visual: None,
            hit_proxy: None,
            body: None,
            binding,
        };
        if entity.is_bound() {
            bind(&mut entity, scene, physics);
        } else {
            debug!(entity = %entity.name, "waiting for asset");
        }

        self.by_name.insert(entity.name.clone(), id);
        self.entities.push(entity);
        Ok(id)
    }

    /// Bind every entity whose asset finished since the last poll.
    /// Returns how many were bound.
    pub fn poll_loads(&mut self, scene: &mut SceneGraph, physics: &mut PhysicsWorld) -> usize {
        let mut bound = 0;
        for entity in &mut self.entities {
            let state = match &entity.binding {
                Binding::Loading(handle) => handle.poll(),
                Binding::Bound | Binding::Failed => continue,
            };
            match state {
                LoadState::Pending => {}
                LoadState::Ready(payload) => {
                    bind(entity, scene, physics);
                    info!(entity = %entity.name, uri = %payload.uri, bytes = payload.byte_len, "asset ready, entity bound");
                    bound += 1;
                }
                LoadState::Failed(err) => {
                    error!(entity = %entity.name, error = %err, "asset load failed, entity stays absent");
                    entity.binding = Binding::Failed;
                }
            }
        }
        bound
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id.0)
    }

    pub fn id_of(&self, name: &str) -> Option<EntityId> {
        self.by_name.get(name).copied()
    }

    pub fn by_name(&self, name: &str) -> Option<&Entity> {
        self.id_of(name).and_then(|id| self.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn bound_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_bound()).count()
    }

    pub fn player_id(&self) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|e| matches!(e.kind, EntityKind::Player(_)))
            .map(|e| e.id)
    }

    /// Run the named entity's toggle capability. Returns its power state afterwards.
    pub fn toggle_power(&mut self, name: &str) -> Result<bool, RoomError> {
        let id = self
            .id_of(name)
            .ok_or_else(|| RoomError::UnknownEntity(name.to_string()))?;
        let entity = &mut self.entities[id.0];
        (capabilities(entity.tag()).toggle)(&mut entity.kind);
        Ok(entity.kind.is_powered())
    }
}

/// Create the visual node, the pick proxy (models only) and the body,
/// all at the declared transform.
fn bind(entity: &mut Entity, scene: &mut SceneGraph, physics: &mut PhysicsWorld) {
    let desc = &entity.desc;
    let position = desc.position();
    let rotation = desc.orientation();
    let half = desc.half_extents();

    let style = match &desc.visual {
        VisualSource::Primitive { color } => Some(NodeStyle::Solid { color: *color }),
        VisualSource::Model { uri } => Some(NodeStyle::Model { uri: uri.clone() }),
        VisualSource::Textured { uri } => Some(NodeStyle::Textured { uri: uri.clone() }),
        VisualSource::Hidden => None,
    };
    entity.visual = style.map(|style| scene.add(SceneNode::new(&desc.name, half, style).at(position, rotation)));

    if matches!(desc.visual, VisualSource::Model { .. }) {
        let proxy = SceneNode::new(&desc.name, half, NodeStyle::HitProxy).at(position, rotation);
        entity.hit_proxy = Some(scene.add(proxy));
    }

    entity.body = Some(physics.add_body(&desc.body_spec()));
    entity.binding = Binding::Bound;
}
