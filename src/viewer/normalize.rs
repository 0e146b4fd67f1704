//! Fit a loaded model to a canonical size at the origin
//!
//! The result is a three-level chain: pivot (live rotation and scale) → fit
//! (uniform load-time scale, recentering offset) → asset root. The live
//! controls never touch the fit node, so the two scales compose.

use crate::rasterizer::{Quat, Vec3};
use crate::scene::{Box3, Node, Transform};

const MIN_DIMENSION: f32 = 1e-6;

/// Load-time fit for `bounds`: uniform scale so the largest side is `target`,
/// translated so the box center lands on the origin
pub fn fit_transform(bounds: &Box3, target: f32) -> Transform {
    let size = bounds.size();
    let max_dim = size.max_element();
    let scale = if max_dim.is_finite() && max_dim > MIN_DIMENSION {
        target / max_dim
    } else {
        tracing::warn!(max_dim, "model has no extent, keeping its scale");
        1.0
    };
    Transform {
        position: -bounds.center().scale(scale),
        rotation: Quat::IDENTITY,
        scale: Vec3::splat(scale),
    }
}

/// Wrap `asset` in fit and pivot nodes
pub fn normalize(asset: Node, target: f32) -> Node {
    let bounds = asset.bounds();
    let mut fit = Node::new("fit").with_child(asset);
    fit.transform = fit_transform(&bounds, target);
    Node::new("pivot").with_child(fit)
}

/// Apply live rotation (degrees, XYZ order) and uniform scale to a pivot
pub fn apply_live_transform(pivot: &mut Node, rotation_degrees: Vec3, scale: f32) {
    pivot.transform.rotation = Quat::from_euler_degrees(rotation_degrees);
    pivot.transform.scale = Vec3::splat(scale);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Geometry, Material, Mesh};

    fn box_node(min: Vec3, max: Vec3) -> Node {
        let geometry = Geometry {
            positions: vec![min, Vec3::new(max.x, min.y, min.z), max],
            indices: vec![0, 1, 2],
            ..Geometry::default()
        };
        Node::new("asset").with_mesh(Mesh::new(geometry, Material::default()))
    }

    #[test]
    fn test_largest_dimension_becomes_target() {
        let pivot = normalize(box_node(Vec3::new(10.0, 0.0, 0.0), Vec3::new(18.0, 4.0, 2.0)), 2.0);
        let b = pivot.bounds();
        let size = b.size();
        assert!((size.max_element() - 2.0).abs() < 1e-5);
        assert!(b.center().len() < 1e-5);
    }

    #[test]
    fn test_live_scale_composes_with_fit() {
        let mut pivot = normalize(box_node(Vec3::ZERO, Vec3::new(4.0, 1.0, 1.0)), 2.0);
        apply_live_transform(&mut pivot, Vec3::ZERO, 1.5);
        assert!((pivot.bounds().size().max_element() - 3.0).abs() < 1e-5);

        // Rotating 90° about Z swaps the long axis onto Y
        apply_live_transform(&mut pivot, Vec3::new(0.0, 0.0, 90.0), 1.0);
        let size = pivot.bounds().size();
        assert!((size.y - 2.0).abs() < 1e-4);
        assert!(pivot.bounds().center().len() < 1e-4);
    }

    #[test]
    fn test_degenerate_bounds_keep_scale() {
        let t = fit_transform(&Box3::EMPTY, 2.0);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.position, Vec3::ZERO);
    }
}
