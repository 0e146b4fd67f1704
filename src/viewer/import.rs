//! glTF document → scene nodes

use std::sync::Arc;

use gltf::mesh::Mode;

use crate::rasterizer::{Quat, Rgb, Texture, Vec2, Vec3};
use crate::scene::{BasicMaterial, Geometry, Material, Mesh, Node, StandardMaterial, Transform};

/// Build the default scene (or the first one) as a single subtree
///
/// Primitives whose buffers are missing are skipped.
pub fn build_scene(
    document: &gltf::Document,
    buffers: &[Option<Vec<u8>>],
    images: &[Option<Arc<Texture>>],
    name: &str,
) -> Node {
    let mut root = Node::new(name);
    let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) else {
        tracing::warn!(file = name, "glTF has no scenes");
        return root;
    };
    for node in scene.nodes() {
        root.children.push(build_node(&node, buffers, images));
    }
    root
}

fn build_node(node: &gltf::Node, buffers: &[Option<Vec<u8>>], images: &[Option<Arc<Texture>>]) -> Node {
    let (t, r, s) = node.transform().decomposed();
    let mut out = Node::new(node.name().unwrap_or_default());
    out.transform = Transform {
        position: Vec3::new(t[0], t[1], t[2]),
        rotation: Quat::new(r[0], r[1], r[2], r[3]).normalize(),
        scale: Vec3::new(s[0], s[1], s[2]),
    };

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if let Some(m) = build_primitive(&mesh, &primitive, buffers, images) {
                out.meshes.push(m);
            }
        }
    }
    for child in node.children() {
        out.children.push(build_node(&child, buffers, images));
    }
    out
}

fn build_primitive(
    mesh: &gltf::Mesh,
    primitive: &gltf::Primitive,
    buffers: &[Option<Vec<u8>>],
    images: &[Option<Arc<Texture>>],
) -> Option<Mesh> {
    let mode = primitive.mode();
    if !matches!(mode, Mode::Triangles | Mode::TriangleStrip | Mode::TriangleFan) {
        tracing::debug!(mesh = mesh.index(), ?mode, "skipping non-triangle primitive");
        return None;
    }

    let reader = primitive.reader(|b| buffers.get(b.index()).and_then(|o| o.as_deref()));
    let Some(positions) = reader.read_positions() else {
        tracing::warn!(mesh = mesh.index(), primitive = primitive.index(), "primitive data unavailable");
        return None;
    };
    let positions: Vec<Vec3> = positions.map(|p| Vec3::new(p[0], p[1], p[2])).collect();

    let mut geometry = Geometry {
        normals: reader
            .read_normals()
            .map(|n| n.map(|n| Vec3::new(n[0], n[1], n[2])).collect())
            .unwrap_or_default(),
        uvs: reader
            .read_tex_coords(0)
            .map(|t| t.into_f32().map(|t| Vec2::new(t[0], t[1])).collect())
            .unwrap_or_default(),
        colors: reader
            .read_colors(0)
            .map(|c| c.into_rgba_f32().collect())
            .unwrap_or_default(),
        indices: Vec::new(),
        positions,
    };

    let raw: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..geometry.positions.len() as u32).collect(),
    };
    geometry.indices = triangulate(mode, &raw);

    for attr in [geometry.normals.len(), geometry.uvs.len(), geometry.colors.len()] {
        if attr != 0 && attr != geometry.positions.len() {
            tracing::warn!(mesh = mesh.index(), "attribute count mismatch, dropping attributes");
            geometry.normals.clear();
            geometry.uvs.clear();
            geometry.colors.clear();
            break;
        }
    }
    if geometry.normals.is_empty() {
        geometry.compute_vertex_normals();
    }

    let mut out = Mesh::new(geometry, build_material(&primitive.material(), images));
    out.name = mesh.name().unwrap_or_default().to_string();
    Some(out)
}

/// Strips and fans to a plain triangle list
fn triangulate(mode: Mode, raw: &[u32]) -> Vec<u32> {
    match mode {
        Mode::TriangleStrip => (2..raw.len())
            .flat_map(|i| {
                if i % 2 == 0 {
                    [raw[i - 2], raw[i - 1], raw[i]]
                } else {
                    [raw[i - 1], raw[i - 2], raw[i]]
                }
            })
            .collect(),
        Mode::TriangleFan => (2..raw.len()).flat_map(|i| [raw[0], raw[i - 1], raw[i]]).collect(),
        _ => raw[..raw.len() - raw.len() % 3].to_vec(),
    }
}

fn build_material(material: &gltf::Material, images: &[Option<Arc<Texture>>]) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, a] = pbr.base_color_factor();
    let map = pbr
        .base_color_texture()
        .and_then(|info| images.get(info.texture().source().index()).cloned().flatten());
    let (transparent, alpha_cutoff) = match material.alpha_mode() {
        gltf::material::AlphaMode::Blend => (true, None),
        gltf::material::AlphaMode::Mask => (false, Some(material.alpha_cutoff().unwrap_or(0.5))),
        gltf::material::AlphaMode::Opaque => (false, None),
    };
    let name = material.name().unwrap_or_default().to_string();

    if material.unlit() {
        return Material::Basic(BasicMaterial {
            name,
            color: Rgb::new(r, g, b),
            opacity: a,
            transparent,
            wireframe: false,
            double_sided: material.double_sided(),
            alpha_cutoff,
            map,
        });
    }

    Material::Standard(StandardMaterial {
        name,
        color: Rgb::new(r, g, b),
        metalness: pbr.metallic_factor(),
        roughness: pbr.roughness_factor(),
        opacity: a,
        transparent,
        wireframe: false,
        double_sided: material.double_sided(),
        alpha_cutoff,
        map,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangulate_strip_and_fan() {
        assert_eq!(triangulate(Mode::TriangleStrip, &[0, 1, 2, 3]), vec![0, 1, 2, 2, 1, 3]);
        assert_eq!(triangulate(Mode::TriangleFan, &[0, 1, 2, 3]), vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(triangulate(Mode::Triangles, &[0, 1, 2, 3]), vec![0, 1, 2]);
    }

    #[test]
    fn test_build_scene_from_glb() {
        let bytes = crate::viewer::loader::fixtures::glb_triangle();
        let gltf = gltf::Gltf::from_slice(&bytes).unwrap();
        let buffers = vec![gltf.blob.clone()];
        let root = build_scene(&gltf.document, &buffers, &[], "tri.glb");

        assert_eq!(root.name, "tri.glb");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].name, "tri");
        let mesh = &root.children[0].meshes[0];
        assert_eq!(mesh.geometry.indices, vec![0, 1, 2]);
        assert_eq!(mesh.geometry.normals.len(), 3);
        let mat = mesh.material.as_standard().unwrap();
        assert_eq!(mat.metalness, 1.0);
        assert!(!mat.transparent);
    }
}
