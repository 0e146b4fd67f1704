//! Scene rendering
//!
//! Flattens the scene to world-space draws, fills the shadow map, then draws
//! opaque meshes, the grid, and transparent meshes back to front.

use std::borrow::Cow;

use crate::rasterizer::{
    mat3_transform, mat4_flips_winding, mat4_identity, mat4_normal_matrix, mat4_transform_point,
    render_mesh, Camera, Framebuffer, MeshData, RasterSettings, ShadowMap, Vec3,
};

use super::{Box3, Mesh, SceneGraph};

/// One mesh transformed to world space
struct DrawItem<'a> {
    mesh: &'a Mesh,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    indices: Cow<'a, [u32]>,
    /// Camera distance of the bounds center (for transparency sorting)
    depth: f32,
}

impl DrawItem<'_> {
    fn data(&self) -> MeshData<'_> {
        MeshData {
            positions: &self.positions,
            normals: &self.normals,
            uvs: &self.mesh.geometry.uvs,
            colors: &self.mesh.geometry.colors,
            indices: &self.indices,
        }
    }
}

fn flatten<'a>(scene: &'a SceneGraph, camera: &Camera) -> Vec<DrawItem<'a>> {
    let mut items = Vec::new();
    let identity = mat4_identity();
    for node in scene.objects() {
        node.traverse_meshes(&identity, &mut |mesh, world| {
            let g = &mesh.geometry;
            let positions: Vec<Vec3> = g.positions.iter().map(|&p| mat4_transform_point(world, p)).collect();
            let normal_matrix = mat4_normal_matrix(world);
            let normals: Vec<Vec3> = g
                .normals
                .iter()
                .map(|&n| mat3_transform(&normal_matrix, n).normalize())
                .collect();

            // Mirrored transforms reverse winding; flip it back so culling holds
            let indices = if mat4_flips_winding(world) {
                Cow::Owned(
                    g.indices
                        .chunks_exact(3)
                        .flat_map(|t| [t[0], t[2], t[1]])
                        .collect(),
                )
            } else {
                Cow::Borrowed(g.indices.as_slice())
            };

            let center = Box3::from_points(positions.iter().copied()).center();
            let depth = camera.to_view(center).z;
            items.push(DrawItem {
                mesh,
                positions,
                normals,
                indices,
                depth,
            });
        });
    }
    items
}

/// Render the scene into `fb`
///
/// `shadow` is filled from shadow-casting meshes when shadows are enabled.
pub fn render_scene(
    fb: &mut Framebuffer,
    scene: &SceneGraph,
    camera: &Camera,
    shadow: Option<&mut ShadowMap>,
    shadows_enabled: bool,
) {
    let items = flatten(scene, camera);
    let settings = RasterSettings {
        lights: scene.lights.clone(),
        shadows: shadows_enabled,
    };

    let shadow_map = match (shadow, scene.shadow_light_position()) {
        (Some(map), Some(light_pos)) if shadows_enabled => {
            map.begin(light_pos, Vec3::ZERO);
            for item in items.iter().filter(|i| i.mesh.cast_shadow) {
                map.render_triangles(&item.positions, &item.indices);
            }
            Some(&*map)
        }
        _ => None,
    };

    fb.clear(scene.background);

    for item in items.iter().filter(|i| !i.mesh.material.is_transparent()) {
        let surface = item.mesh.material.surface(item.mesh.receive_shadow);
        render_mesh(fb, camera, &item.data(), &surface, &settings, shadow_map);
    }

    if scene.show_grid {
        scene.grid.draw(fb, camera);
    }

    let mut transparent: Vec<&DrawItem> = items.iter().filter(|i| i.mesh.material.is_transparent()).collect();
    transparent.sort_by(|a, b| b.depth.total_cmp(&a.depth));
    for item in transparent {
        let surface = item.mesh.material.surface(item.mesh.receive_shadow);
        render_mesh(fb, camera, &item.data(), &surface, &settings, shadow_map);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::{Color, Rgb};
    use crate::scene::{BasicMaterial, Geometry, Material, Node};

    fn quad_geometry(z: f32) -> Geometry {
        Geometry {
            positions: vec![
                Vec3::new(-1.0, -1.0, z),
                Vec3::new(1.0, -1.0, z),
                Vec3::new(1.0, 1.0, z),
                Vec3::new(-1.0, 1.0, z),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
            ..Geometry::default()
        }
    }

    fn basic(color: Rgb, opacity: f32) -> Material {
        Material::Basic(BasicMaterial {
            color,
            opacity,
            transparent: opacity < 1.0,
            ..BasicMaterial::default()
        })
    }

    fn camera() -> Camera {
        let mut cam = Camera::default();
        cam.position = Vec3::new(0.0, 0.0, 5.0);
        cam.look_at(Vec3::ZERO);
        cam
    }

    #[test]
    fn test_background_and_opaque_mesh() {
        let mut scene = SceneGraph::new(Color::from_hex(0x1a1a2e));
        scene.show_grid = false;
        scene.add(Node::new("quad").with_mesh(Mesh::new(quad_geometry(0.0), basic(Rgb::WHITE, 1.0))));

        let mut fb = Framebuffer::new(64, 64);
        render_scene(&mut fb, &scene, &camera(), None, false);
        assert_eq!(fb.get_pixel(32, 32), Some(Color::WHITE));
        assert_eq!(fb.get_pixel(0, 0), Some(Color::from_hex(0x1a1a2e)));
    }

    #[test]
    fn test_transparent_drawn_over_opaque() {
        let mut scene = SceneGraph::new(Color::BLACK);
        scene.show_grid = false;
        // Transparent quad in front, opaque red behind it
        scene.add(Node::new("glass").with_mesh(Mesh::new(quad_geometry(1.0), basic(Rgb::WHITE, 0.5))));
        scene.add(Node::new("wall").with_mesh(Mesh::new(quad_geometry(-1.0), basic(Rgb::new(1.0, 0.0, 0.0), 1.0))));

        let mut fb = Framebuffer::new(64, 64);
        render_scene(&mut fb, &scene, &camera(), None, false);
        let px = fb.get_pixel(32, 32).unwrap();
        assert_eq!(px.r, 255);
        assert!(px.g > 100 && px.g < 160);
    }

    #[test]
    fn test_mirrored_node_still_front_facing() {
        let mut scene = SceneGraph::new(Color::BLACK);
        scene.show_grid = false;
        let mut node = Node::new("mirror").with_mesh(Mesh::new(quad_geometry(0.0), basic(Rgb::WHITE, 1.0)));
        node.transform.scale = Vec3::new(-1.0, 1.0, 1.0);
        scene.add(node);

        let mut fb = Framebuffer::new(64, 64);
        render_scene(&mut fb, &scene, &camera(), None, false);
        assert_eq!(fb.get_pixel(32, 32), Some(Color::WHITE));
    }
}
