// MODEL: Scene state and data
pub mod asset;
pub mod camera;
pub mod entity;
pub mod room;
pub mod scene_graph;

pub use asset::{AssetHandle, AssetKind, AssetLoader, LoadState, ManualLoader};
pub use camera::Camera;
pub use entity::{BehaviorTag, Entity, EntityDesc, EntityId, EntityKind, VisualSource};
pub use room::RoomLayout;
pub use scene_graph::{NodeId, NodeStyle, Ray, RayHit, SceneGraph, SceneNode};
