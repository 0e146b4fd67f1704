//! Scene nodes, meshes and geometry

use crate::rasterizer::{
    mat4_compose, mat4_identity, mat4_mul, mat4_transform_point, Mat4, Quat, Vec2, Vec3,
};

use super::bounds::Box3;
use super::material::Material;

/// Indexed triangle geometry in local space
///
/// `normals`, `uvs` and `colors` are empty or one entry per position.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub colors: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
}

impl Geometry {
    /// Area-weighted smooth normals from the triangle list
    pub fn compute_vertex_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            if a >= normals.len() || b >= normals.len() || c >= normals.len() {
                continue;
            }
            let n = (self.positions[b] - self.positions[a]).cross(self.positions[c] - self.positions[a]);
            normals[a] += n;
            normals[b] += n;
            normals[c] += n;
        }
        self.normals = normals.into_iter().map(Vec3::normalize).collect();
    }
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub geometry: Geometry,
    pub material: Material,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Mesh {
    pub fn new(geometry: Geometry, material: Material) -> Self {
        Self {
            name: String::new(),
            geometry,
            material,
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

/// Local transform (translation, rotation, scale)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        mat4_compose(self.position, self.rotation, self.scale)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// A node in the scene tree
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub children: Vec<Node>,
    pub meshes: Vec<Mesh>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    #[cfg(test)]
    pub fn with_mesh(mut self, mesh: Mesh) -> Self {
        self.meshes.push(mesh);
        self
    }

    /// Visit every mesh in this subtree
    pub fn traverse_meshes_mut(&mut self, f: &mut impl FnMut(&mut Mesh)) {
        for mesh in &mut self.meshes {
            f(mesh);
        }
        for child in &mut self.children {
            child.traverse_meshes_mut(f);
        }
    }

    /// Visit every mesh with its world matrix
    pub fn traverse_meshes<'a>(&'a self, parent: &Mat4, f: &mut impl FnMut(&'a Mesh, &Mat4)) {
        let world = mat4_mul(parent, &self.transform.matrix());
        for mesh in &self.meshes {
            f(mesh, &world);
        }
        for child in &self.children {
            child.traverse_meshes(&world, f);
        }
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len() + self.children.iter().map(Node::mesh_count).sum::<usize>()
    }

    /// Bounds of every vertex under world transforms, with this node's
    /// own transform applied on top of `parent`
    pub fn world_bounds(&self, parent: &Mat4) -> Box3 {
        let mut bounds = Box3::EMPTY;
        self.traverse_meshes(parent, &mut |mesh, world| {
            for &p in &mesh.geometry.positions {
                bounds.expand_by_point(mat4_transform_point(world, p));
            }
        });
        bounds
    }

    /// `world_bounds` with this node at the scene root
    pub fn bounds(&self) -> Box3 {
        self.world_bounds(&mat4_identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> Geometry {
        Geometry {
            positions: vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            indices: vec![0, 1, 2],
            ..Geometry::default()
        }
    }

    #[test]
    fn test_compute_vertex_normals() {
        let mut g = unit_triangle();
        g.compute_vertex_normals();
        assert_eq!(g.normals.len(), 3);
        assert!((g.normals[0].z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_bounds_follow_nested_transforms() {
        let mut child = Node::new("child").with_mesh(Mesh::new(unit_triangle(), Material::default()));
        child.transform.position = Vec3::new(10.0, 0.0, 0.0);
        let mut root = Node::new("root").with_child(child);
        root.transform.scale = Vec3::splat(2.0);

        let b = root.bounds();
        assert_eq!(b.min, Vec3::new(20.0, 0.0, 0.0));
        assert_eq!(b.max, Vec3::new(22.0, 2.0, 0.0));
        assert_eq!(root.mesh_count(), 1);
    }

    #[test]
    fn test_traverse_meshes_mut_reaches_children() {
        let mut root = Node::new("root")
            .with_mesh(Mesh::new(unit_triangle(), Material::default()))
            .with_child(Node::new("c").with_mesh(Mesh::new(unit_triangle(), Material::default())));
        let mut count = 0;
        root.traverse_meshes_mut(&mut |m| {
            m.cast_shadow = true;
            count += 1;
        });
        assert_eq!(count, 2);
    }
}
