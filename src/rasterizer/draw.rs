//! Drawing utilities for 3D rendering
//!
//! Depth-tested world-space lines and the floor grid helper.

use super::camera::Camera;
use super::math::{project, Vec3};
use super::render::Framebuffer;
use super::types::Color;

/// Draw a world-space line with near-plane clipping and depth testing
pub fn draw_3d_line_clipped(fb: &mut Framebuffer, camera: &Camera, p0: Vec3, p1: Vec3, color: Color) {
    let v0 = camera.to_view(p0);
    let v1 = camera.to_view(p1);
    let near = camera.near;

    // Both behind camera - skip entirely
    if v0.z <= near && v1.z <= near {
        return;
    }

    let (c0, c1) = if v0.z <= near {
        let t = (near - v0.z) / (v1.z - v0.z);
        (v0.lerp(v1, t), v1)
    } else if v1.z <= near {
        let t = (near - v0.z) / (v1.z - v0.z);
        (v0, v0.lerp(v1, t))
    } else {
        (v0, v1)
    };

    let focal = camera.focal_length(fb.height);
    let s0 = project(c0, focal, fb.width, fb.height);
    let s1 = project(c1, focal, fb.width, fb.height);
    fb.draw_line_3d(s0, s1, color, 1.0, false);
}

/// Grid on the XZ plane at y = 0
#[derive(Debug, Clone)]
pub struct GridHelper {
    /// Full width of the grid
    pub size: f32,
    pub divisions: usize,
    /// Color of the two lines through the origin
    pub center_color: Color,
    pub color: Color,
}

impl Default for GridHelper {
    fn default() -> Self {
        Self {
            size: 10.0,
            divisions: 10,
            center_color: Color::from_hex(0x6366f1),
            color: Color::from_hex(0xe5e7eb),
        }
    }
}

impl GridHelper {
    /// Grid lines as (start, end, color)
    pub fn lines(&self) -> Vec<(Vec3, Vec3, Color)> {
        let half = self.size * 0.5;
        let divisions = self.divisions.max(1);
        let step = self.size / divisions as f32;
        let center = divisions / 2;
        let mut lines = Vec::with_capacity((divisions + 1) * 2);

        for i in 0..=divisions {
            let k = -half + i as f32 * step;
            let color = if i == center && divisions % 2 == 0 { self.center_color } else { self.color };
            lines.push((Vec3::new(-half, 0.0, k), Vec3::new(half, 0.0, k), color));
            lines.push((Vec3::new(k, 0.0, -half), Vec3::new(k, 0.0, half), color));
        }
        lines
    }

    /// Draw the grid, split into per-cell segments for better clipping
    pub fn draw(&self, fb: &mut Framebuffer, camera: &Camera) {
        let divisions = self.divisions.max(1);
        for (start, end, color) in self.lines() {
            for s in 0..divisions {
                let a = start.lerp(end, s as f32 / divisions as f32);
                let b = start.lerp(end, (s + 1) as f32 / divisions as f32);
                draw_3d_line_clipped(fb, camera, a, b, color);
            }
        }
    }
}
