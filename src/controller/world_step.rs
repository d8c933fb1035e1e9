use tracing::trace;

use crate::controller::physics::{PhysicsConfig, PhysicsWorld};
use crate::controller::registry::EntityRegistry;
use crate::model::scene_graph::SceneGraph;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub substep: f32,
    pub substeps: u32,
    /// Entities whose nodes were written this step.
    pub synced: usize,
}

/// Advances physics by a frame's elapsed time and copies the results onto
/// the scene graph. Physics is authoritative; nodes only ever follow.
pub struct WorldStepCoordinator {
    config: PhysicsConfig,
}

impl WorldStepCoordinator {
    pub fn new(config: PhysicsConfig) -> Self {
        Self { config }
    }

    pub fn step(
        &self,
        delta: f32,
        physics: &mut PhysicsWorld,
        registry: &EntityRegistry,
        scene: &mut SceneGraph,
    ) -> StepReport {
        let substep = self.config.substep_for(delta);
        let substeps = physics.step(substep, delta, self.config.max_substeps);
        let synced = sync_visuals(registry, physics, scene);
        trace!(delta, substep, substeps, synced, "world stepped");
        StepReport {
            substep,
            substeps,
            synced,
        }
    }
}

/// Copy every body transform onto its entity's visual node and hit proxy.
/// Entities still waiting on an asset have no body and are skipped.
pub fn sync_visuals(registry: &EntityRegistry, physics: &PhysicsWorld, scene: &mut SceneGraph) -> usize {
    let mut synced = 0;
    for entity in registry.iter().filter(|e| e.is_bound()) {
        let Some((position, rotation)) = entity.body.and_then(|body| physics.transform(body)) else {
            continue;
        };
        for node in [entity.visual, entity.hit_proxy].into_iter().flatten() {
            if let Some(node) = scene.get_mut(node) {
                node.position = position;
                node.rotation = rotation;
            }
        }
        synced += 1;
    }
    synced
}
