//! Scene graph for the model viewport
//!
//! Top-level objects are owned by the graph and addressed by handle. Lights,
//! background and the grid helper live alongside them.

mod bounds;
mod material;
mod node;
mod render;

pub use bounds::Box3;
pub use material::{BasicMaterial, Material, StandardMaterial};
pub use node::{Geometry, Mesh, Node, Transform};
pub use render::render_scene;

use crate::rasterizer::{Color, GridHelper, Light, Vec3};

/// Handle to a top-level scene object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle(u64);

pub struct SceneGraph {
    pub background: Color,
    objects: Vec<(ObjectHandle, Node)>,
    next_id: u64,
    pub lights: Vec<Light>,
    pub grid: GridHelper,
    pub show_grid: bool,
}

impl SceneGraph {
    /// Empty scene with no lights
    pub fn new(background: Color) -> Self {
        Self {
            background,
            objects: Vec::new(),
            next_id: 1,
            lights: Vec::new(),
            grid: GridHelper::default(),
            show_grid: true,
        }
    }

    /// Viewer scene: ambient, shadow-casting key light and hemisphere fill
    pub fn with_default_lights(background: Color) -> Self {
        let mut scene = Self::new(background);
        scene.lights.push(Light::ambient(Color::WHITE, 0.6));
        let mut key = Light::directional(Color::WHITE, 0.8, Vec3::new(5.0, 10.0, 5.0));
        key.cast_shadow = true;
        scene.lights.push(key);
        scene
            .lights
            .push(Light::hemisphere(Color::WHITE, Color::from_hex(0x444444), 0.4));
        scene
    }

    pub fn add(&mut self, node: Node) -> ObjectHandle {
        let handle = ObjectHandle(self.next_id);
        self.next_id += 1;
        self.objects.push((handle, node));
        handle
    }

    /// Detach an object. Unknown handles return `None`.
    pub fn remove(&mut self, handle: ObjectHandle) -> Option<Node> {
        let pos = self.objects.iter().position(|(h, _)| *h == handle)?;
        Some(self.objects.remove(pos).1)
    }

    pub fn contains(&self, handle: ObjectHandle) -> bool {
        self.objects.iter().any(|(h, _)| *h == handle)
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<&Node> {
        self.objects.iter().find(|(h, _)| *h == handle).map(|(_, n)| n)
    }

    pub fn get_mut(&mut self, handle: ObjectHandle) -> Option<&mut Node> {
        self.objects.iter_mut().find(|(h, _)| *h == handle).map(|(_, n)| n)
    }

    pub fn objects(&self) -> impl Iterator<Item = &Node> {
        self.objects.iter().map(|(_, n)| n)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// The first enabled shadow-casting directional light's position
    pub fn shadow_light_position(&self) -> Option<Vec3> {
        self.lights.iter().find_map(|l| match l.light_type {
            crate::rasterizer::LightType::Directional { position } if l.enabled && l.cast_shadow => Some(position),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_remove_by_handle() {
        let mut scene = SceneGraph::new(Color::BLACK);
        let a = scene.add(Node::new("a"));
        let b = scene.add(Node::new("b"));
        assert_ne!(a, b);
        assert_eq!(scene.len(), 2);

        assert_eq!(scene.remove(a).map(|n| n.name), Some("a".to_string()));
        assert!(!scene.contains(a));
        assert!(scene.remove(a).is_none());
        assert!(scene.contains(b));
    }

    #[test]
    fn test_default_lights() {
        let scene = SceneGraph::with_default_lights(Color::BLACK);
        assert_eq!(scene.lights.len(), 3);
        assert_eq!(scene.shadow_light_position(), Some(Vec3::new(5.0, 10.0, 5.0)));
    }
}
