//! In-process scene graph: the visual side of every entity.
//!
//! Nodes carry a name, a transform and oriented box bounds. A renderer
//! draws them; the interaction resolver casts rays against them. Once an
//! entity has a physics body, its node transforms are written only by the
//! world step sync.

use glam::{Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeStyle {
    Solid { color: [f32; 3] },
    Model { uri: String },
    Textured { uri: String },
    /// Invisible pick box standing in for a loaded model's bounds.
    HitProxy,
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub half_extents: Vec3,
    pub style: NodeStyle,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, half_extents: Vec3, style: NodeStyle) -> Self {
        Self {
            name: name.into(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            half_extents,
            style,
        }
    }

    pub fn at(mut self, position: Vec3, rotation: Quat) -> Self {
        self.position = position;
        self.rotation = rotation;
        self
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self.style, NodeStyle::HitProxy)
    }

    /// Slab test in node-local space. Returns the entry distance along the
    /// ray, or 0 when the origin is inside the box.
    fn intersect(&self, ray: &Ray) -> Option<f32> {
        let inverse = self.rotation.inverse();
        let origin = inverse * (ray.origin - self.position);
        let direction = inverse * ray.direction;

        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;
        for axis in 0..3 {
            let h = self.half_extents[axis];
            let o = origin[axis];
            let d = direction[axis];
            if d.abs() < 1e-8 {
                if o.abs() > h {
                    return None;
                }
                continue;
            }
            let t1 = (-h - o) / d;
            let t2 = (h - o) / d;
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
            if t_min > t_max {
                return None;
            }
        }
        if t_max < 0.0 {
            return None;
        }
        Some(t_min.max(0.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RayHit {
    pub node: NodeId,
    pub name: String,
    pub distance: f32,
}

#[derive(Default)]
pub struct SceneGraph {
    slots: Vec<Option<SceneNode>>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: SceneNode) -> NodeId {
        self.slots.push(Some(node));
        NodeId(self.slots.len() - 1)
    }

    pub fn remove(&mut self, id: NodeId) -> Option<SceneNode> {
        self.slots.get_mut(id.0).and_then(Option::take)
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|node| (NodeId(idx), node)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every node the ray passes through, nearest first.
    pub fn intersect_ray(&self, ray: &Ray) -> Vec<RayHit> {
        let mut hits: Vec<RayHit> = self
            .iter()
            .filter_map(|(id, node)| {
                node.intersect(ray).map(|distance| RayHit {
                    node: id,
                    name: node.name.clone(),
                    distance,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}
