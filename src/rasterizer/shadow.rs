//! Directional shadow map
//!
//! Orthographic depth render from the light, sampled with a 3x3 PCF kernel.

use super::math::{barycentric, Vec3};

/// Half-width of the light's orthographic frustum in world units
pub const SHADOW_HALF_EXTENT: f32 = 5.0;

const DEPTH_BIAS: f32 = 0.01;

pub struct ShadowMap {
    pub size: usize,
    pub depth: Vec<f32>,
    origin: Vec3,
    basis_x: Vec3,
    basis_y: Vec3,
    basis_z: Vec3,
    half_extent: f32,
}

impl ShadowMap {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            depth: vec![f32::MAX; size * size],
            origin: Vec3::ZERO,
            basis_x: Vec3::new(1.0, 0.0, 0.0),
            basis_y: Vec3::new(0.0, 0.0, 1.0),
            basis_z: Vec3::new(0.0, -1.0, 0.0),
            half_extent: SHADOW_HALF_EXTENT,
        }
    }

    /// Clear and aim the light camera from `light_position` at `target`
    pub fn begin(&mut self, light_position: Vec3, target: Vec3) {
        self.depth.fill(f32::MAX);
        self.origin = light_position;
        self.basis_z = (target - light_position).normalize();
        let mut right = self.basis_z.cross(Vec3::UP);
        if right.len() < 1e-6 {
            right = Vec3::new(1.0, 0.0, 0.0);
        }
        self.basis_x = right.normalize();
        self.basis_y = self.basis_z.cross(self.basis_x).normalize();
    }

    /// World position to (texel x, texel y, depth along the light)
    fn to_light(&self, world: Vec3) -> Vec3 {
        let rel = world - self.origin;
        let texels_per_unit = self.size as f32 / (self.half_extent * 2.0);
        Vec3::new(
            (rel.dot(self.basis_x) + self.half_extent) * texels_per_unit,
            (rel.dot(self.basis_y) + self.half_extent) * texels_per_unit,
            rel.dot(self.basis_z),
        )
    }

    /// Write occluder depth for an indexed triangle list (world space)
    pub fn render_triangles(&mut self, positions: &[Vec3], indices: &[u32]) {
        let projected: Vec<Vec3> = positions.iter().map(|&p| self.to_light(p)).collect();

        for tri in indices.chunks_exact(3) {
            let (Some(&a), Some(&b), Some(&c)) = (
                projected.get(tri[0] as usize),
                projected.get(tri[1] as usize),
                projected.get(tri[2] as usize),
            ) else {
                continue;
            };
            self.rasterize_depth(a, b, c);
        }
    }

    fn rasterize_depth(&mut self, a: Vec3, b: Vec3, c: Vec3) {
        let size = self.size as f32;
        let min_x = a.x.min(b.x).min(c.x).max(0.0) as usize;
        let max_x = (a.x.max(b.x).max(c.x) + 1.0).min(size) as usize;
        let min_y = a.y.min(b.y).min(c.y).max(0.0) as usize;
        let max_y = (a.y.max(b.y).max(c.y) + 1.0).min(size) as usize;

        for y in min_y..max_y {
            for x in min_x..max_x {
                let p = Vec3::new(x as f32 + 0.5, y as f32 + 0.5, 0.0);
                let bc = barycentric(p, a, b, c);
                if bc.x < 0.0 || bc.y < 0.0 || bc.z < 0.0 {
                    continue;
                }
                let z = bc.x * a.z + bc.y * b.z + bc.z * c.z;
                let idx = y * self.size + x;
                if z < self.depth[idx] {
                    self.depth[idx] = z;
                }
            }
        }
    }

    /// Fraction of light reaching `world` (1 = fully lit)
    ///
    /// `normal` offsets the lookup to keep lit faces from self-shadowing.
    pub fn visibility(&self, world: Vec3, normal: Vec3) -> f32 {
        let texel_world = self.half_extent * 2.0 / self.size as f32;
        let p = self.to_light(world + normal * (texel_world * 1.5));

        // Outside the light frustum counts as lit
        if p.x < 0.0 || p.y < 0.0 || p.x >= self.size as f32 || p.y >= self.size as f32 {
            return 1.0;
        }

        let cx = p.x as i32;
        let cy = p.y as i32;
        let mut lit = 0;
        let mut taps = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                let x = cx + dx;
                let y = cy + dy;
                if x < 0 || y < 0 || x >= self.size as i32 || y >= self.size as i32 {
                    continue;
                }
                taps += 1;
                if p.z - DEPTH_BIAS <= self.depth[y as usize * self.size + x as usize] {
                    lit += 1;
                }
            }
        }
        if taps == 0 {
            1.0
        } else {
            lit as f32 / taps as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Horizontal quad at height `y`, half-size `h`
    fn quad(y: f32, h: f32) -> (Vec<Vec3>, Vec<u32>) {
        (
            vec![
                Vec3::new(-h, y, -h),
                Vec3::new(h, y, -h),
                Vec3::new(h, y, h),
                Vec3::new(-h, y, h),
            ],
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    #[test]
    fn test_occluder_shadows_floor() {
        let mut map = ShadowMap::new(128);
        map.begin(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO);

        let (pos, idx) = quad(1.0, 1.0);
        map.render_triangles(&pos, &idx);

        // Under the occluder
        assert_eq!(map.visibility(Vec3::ZERO, Vec3::UP), 0.0);
        // Well outside it
        assert_eq!(map.visibility(Vec3::new(3.0, 0.0, 3.0), Vec3::UP), 1.0);
        // The occluder itself is lit
        assert_eq!(map.visibility(Vec3::new(0.0, 1.0, 0.0), Vec3::UP), 1.0);
    }

    #[test]
    fn test_outside_frustum_is_lit() {
        let mut map = ShadowMap::new(64);
        map.begin(Vec3::new(5.0, 10.0, 5.0), Vec3::ZERO);
        assert_eq!(map.visibility(Vec3::new(100.0, 0.0, 0.0), Vec3::UP), 1.0);
    }
}
