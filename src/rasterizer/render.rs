//! Core rendering functions
//! Triangle rasterization with per-pixel standard-material shading

use std::collections::HashSet;

use super::camera::Camera;
use super::math::{Vec2, Vec3};
use super::shadow::ShadowMap;
use super::types::{Color, LightType, RasterSettings, Rgb, Texture};

/// Framebuffer for software rendering
pub struct Framebuffer {
    pub pixels: Vec<u8>,   // RGBA, 4 bytes per pixel
    pub zbuffer: Vec<f32>, // Depth buffer (camera-space z)
    pub width: usize,
    pub height: usize,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0; width * height * 4],
            zbuffer: vec![f32::MAX; width * height],
            width,
            height,
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.pixels = vec![0; width * height * 4];
            self.zbuffer = vec![f32::MAX; width * height];
        }
    }

    pub fn clear(&mut self, color: Color) {
        let bytes = color.to_bytes();
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&bytes);
        }
        self.zbuffer.fill(f32::MAX);
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color) {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) * 4;
            self.pixels[idx..idx + 4].copy_from_slice(&color.to_bytes());
        }
    }

    #[cfg(test)]
    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) * 4;
            let p = &self.pixels[idx..idx + 4];
            Some(Color::with_alpha(p[0], p[1], p[2], p[3]))
        } else {
            None
        }
    }

    /// Source-over blend of `color` using `alpha` (0-1)
    pub fn blend_pixel(&mut self, x: usize, y: usize, color: Color, alpha: f32) {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) * 4;
            let a = alpha.clamp(0.0, 1.0);
            let mix = |back: u8, front: u8| (back as f32 + (front as f32 - back as f32) * a).round() as u8;
            self.pixels[idx] = mix(self.pixels[idx], color.r);
            self.pixels[idx + 1] = mix(self.pixels[idx + 1], color.g);
            self.pixels[idx + 2] = mix(self.pixels[idx + 2], color.b);
            self.pixels[idx + 3] = 255;
        }
    }

    /// Draw a 2D line (Bresenham)
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let mut x = x0;
        let mut y = y0;

        loop {
            if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
                self.set_pixel(x as usize, y as usize, color);
            }

            if x == x1 && y == y1 {
                break;
            }

            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Draw a line with depth testing
    ///
    /// Depth is interpolated in 1/z so lines match the perspective of filled
    /// triangles. `write_depth` controls whether the line occludes later draws.
    pub fn draw_line_3d(
        &mut self,
        p0: Vec3,
        p1: Vec3,
        color: Color,
        alpha: f32,
        write_depth: bool,
    ) {
        let (x0, y0, x1, y1) = (p0.x as i32, p0.y as i32, p1.x as i32, p1.y as i32);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let mut x = x0;
        let mut y = y0;

        let total_steps = dx.max(-dy).max(1) as f32;
        let (iz0, iz1) = (1.0 / p0.z, 1.0 / p1.z);
        let mut step = 0.0f32;

        loop {
            if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
                let t = (step / total_steps).min(1.0);
                let z = 1.0 / (iz0 + (iz1 - iz0) * t);
                let idx = y as usize * self.width + x as usize;
                // Slight bias so edges win against their own faces
                if z - 1e-4 <= self.zbuffer[idx] {
                    if write_depth {
                        self.zbuffer[idx] = z;
                    }
                    if alpha >= 1.0 {
                        self.set_pixel(x as usize, y as usize, color);
                    } else {
                        self.blend_pixel(x as usize, y as usize, color, alpha);
                    }
                }
            }

            if x == x1 && y == y1 {
                break;
            }

            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
            step += 1.0;
        }
    }
}

/// World-space mesh ready for drawing
///
/// `normals`, `uvs` and `colors` are either empty or per-vertex.
#[derive(Debug, Clone, Copy)]
pub struct MeshData<'a> {
    pub positions: &'a [Vec3],
    pub normals: &'a [Vec3],
    pub uvs: &'a [Vec2],
    pub colors: &'a [[f32; 4]],
    pub indices: &'a [u32],
}

/// Material parameters resolved for one draw
#[derive(Debug, Clone, Copy)]
pub struct SurfaceParams<'a> {
    /// Linear base color
    pub color: Rgb,
    pub opacity: f32,
    pub metalness: f32,
    pub roughness: f32,
    /// False for unlit (basic) materials
    pub lit: bool,
    pub wireframe: bool,
    pub double_sided: bool,
    pub receive_shadow: bool,
    /// Blend instead of writing depth
    pub transparent: bool,
    /// Discard fragments below this alpha (glTF MASK mode)
    pub alpha_cutoff: Option<f32>,
    pub texture: Option<&'a Texture>,
}

impl Default for SurfaceParams<'_> {
    fn default() -> Self {
        Self {
            color: Rgb::WHITE,
            opacity: 1.0,
            metalness: 0.0,
            roughness: 1.0,
            lit: true,
            wireframe: false,
            double_sided: false,
            receive_shadow: false,
            transparent: false,
            alpha_cutoff: None,
            texture: None,
        }
    }
}

/// Vertex carried through near-plane clipping
#[derive(Debug, Clone, Copy, Default)]
struct ClipVertex {
    view: Vec3,
    world: Vec3,
    normal: Vec3,
    uv: Vec2,
    color: [f32; 4],
}

impl ClipVertex {
    fn lerp(&self, other: &ClipVertex, t: f32) -> ClipVertex {
        let mut color = [0.0; 4];
        for (i, c) in color.iter_mut().enumerate() {
            *c = self.color[i] + (other.color[i] - self.color[i]) * t;
        }
        ClipVertex {
            view: self.view.lerp(other.view, t),
            world: self.world.lerp(other.world, t),
            normal: self.normal.lerp(other.normal, t),
            uv: Vec2::new(
                self.uv.x + (other.uv.x - self.uv.x) * t,
                self.uv.y + (other.uv.y - self.uv.y) * t,
            ),
            color,
        }
    }
}

/// Clip a triangle against z = near. Returns up to four vertices (a fan).
fn clip_near(tri: [ClipVertex; 3], near: f32) -> ([ClipVertex; 4], usize) {
    let mut out = [ClipVertex::default(); 4];
    let mut n = 0;
    for i in 0..3 {
        let a = &tri[i];
        let b = &tri[(i + 1) % 3];
        let a_in = a.view.z >= near;
        let b_in = b.view.z >= near;
        if a_in {
            out[n] = *a;
            n += 1;
        }
        if a_in != b_in && n < 4 {
            let t = (near - a.view.z) / (b.view.z - a.view.z);
            out[n] = a.lerp(b, t);
            n += 1;
        }
    }
    (out, n)
}

/// Screen-space vertex with attributes pre-divided by z
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    inv_z: f32,
    world: Vec3,
    normal: Vec3,
    uv: Vec2,
    color: [f32; 4],
}

impl ScreenVertex {
    fn from_clip(v: &ClipVertex, focal: f32, width: usize, height: usize) -> Self {
        let inv_z = 1.0 / v.view.z;
        Self {
            x: v.view.x * focal * inv_z + width as f32 * 0.5,
            y: v.view.y * focal * inv_z + height as f32 * 0.5,
            inv_z,
            world: v.world * inv_z,
            normal: v.normal * inv_z,
            uv: Vec2::new(v.uv.x * inv_z, v.uv.y * inv_z),
            color: [
                v.color[0] * inv_z,
                v.color[1] * inv_z,
                v.color[2] * inv_z,
                v.color[3] * inv_z,
            ],
        }
    }
}

/// Interpolated fragment inputs
struct Fragment {
    world: Vec3,
    normal: Vec3,
    uv: Vec2,
    color: [f32; 4],
}

/// Shade one fragment. Returns linear color and alpha, or `None` to discard.
fn shade_fragment(
    frag: &Fragment,
    surface: &SurfaceParams,
    camera_pos: Vec3,
    settings: &RasterSettings,
    shadow: Option<&ShadowMap>,
) -> Option<(Rgb, f32)> {
    let texel = surface.texture.map(|t| t.sample(frag.uv.x, frag.uv.y)).unwrap_or([1.0; 4]);
    let albedo = surface
        .color
        .mul(Rgb::new(texel[0], texel[1], texel[2]))
        .mul(Rgb::new(frag.color[0], frag.color[1], frag.color[2]));
    let alpha = surface.opacity * texel[3] * frag.color[3];

    if let Some(cutoff) = surface.alpha_cutoff {
        if alpha < cutoff {
            return None;
        }
    }
    if !surface.lit {
        return Some((albedo, alpha));
    }

    let n = frag.normal.normalize();
    let v = (camera_pos - frag.world).normalize();
    let diffuse_color = albedo.scale(1.0 - surface.metalness);
    let f0 = Rgb::splat(0.04).lerp(albedo, surface.metalness);

    // Blinn-Phong lobe matched to GGX roughness
    let a = (surface.roughness * surface.roughness).max(0.02);
    let shininess = (2.0 / (a * a) - 2.0).clamp(1.0, 2048.0);
    let spec_norm = (shininess + 2.0) / 8.0;

    let mut diffuse = Rgb::BLACK;
    let mut specular = Rgb::BLACK;

    for light in settings.lights.iter().filter(|l| l.enabled) {
        let radiance = light.color.scale(light.intensity);
        match light.light_type {
            LightType::Ambient => diffuse = diffuse.add(radiance),
            LightType::Hemisphere { ground } => {
                let t = 0.5 * n.y + 0.5;
                diffuse = diffuse.add(ground.lerp(light.color, t).scale(light.intensity));
            }
            LightType::Directional { position } => {
                let l = position.normalize();
                let n_dot_l = n.dot(l);
                if n_dot_l <= 0.0 {
                    continue;
                }
                let visibility = match shadow {
                    Some(map) if light.cast_shadow && surface.receive_shadow && settings.shadows => {
                        map.visibility(frag.world, n)
                    }
                    _ => 1.0,
                };
                if visibility <= 0.0 {
                    continue;
                }
                let irradiance = radiance.scale(n_dot_l * visibility);
                diffuse = diffuse.add(irradiance);

                let h = (l + v).normalize();
                let n_dot_h = n.dot(h).max(0.0);
                let v_dot_h = v.dot(h).max(0.0);
                // Schlick fresnel
                let fresnel = (1.0 - v_dot_h).powi(5);
                let f = f0.lerp(Rgb::WHITE, fresnel);
                let lobe = spec_norm * n_dot_h.powf(shininess);
                specular = specular.add(f.mul(irradiance).scale(lobe));
            }
        }
    }

    Some((diffuse_color.mul(diffuse).add(specular), alpha))
}

/// Rasterize one screen-space triangle (edge functions, perspective-correct)
fn rasterize_triangle(
    fb: &mut Framebuffer,
    v: [ScreenVertex; 3],
    surface: &SurfaceParams,
    camera_pos: Vec3,
    settings: &RasterSettings,
    shadow: Option<&ShadowMap>,
) {
    let [v1, v2, v3] = v;

    let min_x = v1.x.min(v2.x).min(v3.x).max(0.0) as usize;
    let max_x = (v1.x.max(v2.x).max(v3.x) + 1.0).min(fb.width as f32) as usize;
    let min_y = v1.y.min(v2.y).min(v3.y).max(0.0) as usize;
    let max_y = (v1.y.max(v2.y).max(v3.y) + 1.0).min(fb.height as f32) as usize;

    if min_x >= max_x || min_y >= max_y {
        return;
    }

    // Edge function: bc.x = E23/area, bc.y = E31/area, bc.z = 1 - bc.x - bc.y
    let area = (v2.y - v3.y) * (v1.x - v3.x) + (v3.x - v2.x) * (v1.y - v3.y);
    if area.abs() < 0.00001 {
        return;
    }
    let inv_area = 1.0 / area;

    let a0 = v2.y - v3.y;
    let b0 = v3.x - v2.x;
    let a1 = v3.y - v1.y;
    let b1 = v1.x - v3.x;

    // Sample at pixel centers
    let start_x = min_x as f32 + 0.5;
    let start_y = min_y as f32 + 0.5;

    let mut w0_row = a0 * (start_x - v3.x) + b0 * (start_y - v3.y);
    let mut w1_row = a1 * (start_x - v3.x) + b1 * (start_y - v3.y);

    for y in min_y..max_y {
        let mut w0 = w0_row;
        let mut w1 = w1_row;

        for x in min_x..max_x {
            let bc_x = w0 * inv_area;
            let bc_y = w1 * inv_area;
            let bc_z = 1.0 - bc_x - bc_y;

            const ERR: f32 = -0.0001;
            if bc_x >= ERR && bc_y >= ERR && bc_z >= ERR {
                let inv_z = bc_x * v1.inv_z + bc_y * v2.inv_z + bc_z * v3.inv_z;
                let z = 1.0 / inv_z;
                let idx = y * fb.width + x;

                if z < fb.zbuffer[idx] {
                    let lerp3 = |a: Vec3, b: Vec3, c: Vec3| (a * bc_x + b * bc_y + c * bc_z) * z;
                    let mut color = [0.0; 4];
                    for (i, ch) in color.iter_mut().enumerate() {
                        *ch = (v1.color[i] * bc_x + v2.color[i] * bc_y + v3.color[i] * bc_z) * z;
                    }
                    let frag = Fragment {
                        world: lerp3(v1.world, v2.world, v3.world),
                        normal: lerp3(v1.normal, v2.normal, v3.normal),
                        uv: Vec2::new(
                            (v1.uv.x * bc_x + v2.uv.x * bc_y + v3.uv.x * bc_z) * z,
                            (v1.uv.y * bc_x + v2.uv.y * bc_y + v3.uv.y * bc_z) * z,
                        ),
                        color,
                    };

                    if let Some((rgb, alpha)) = shade_fragment(&frag, surface, camera_pos, settings, shadow) {
                        if surface.transparent {
                            fb.blend_pixel(x, y, rgb.to_srgb(255), alpha);
                        } else {
                            fb.zbuffer[idx] = z;
                            fb.set_pixel(x, y, rgb.to_srgb(255));
                        }
                    }
                }
            }

            w0 += a0;
            w1 += a1;
        }

        w0_row += b0;
        w1_row += b1;
    }
}

/// Gather clip vertices for one triangle
fn triangle_vertices(mesh: &MeshData, camera: &Camera, tri: [usize; 3], face_normal: Vec3) -> [ClipVertex; 3] {
    tri.map(|i| {
        let world = mesh.positions[i];
        ClipVertex {
            view: camera.to_view(world),
            world,
            normal: mesh.normals.get(i).copied().unwrap_or(face_normal),
            uv: mesh.uvs.get(i).copied().unwrap_or_default(),
            color: mesh.colors.get(i).copied().unwrap_or([1.0; 4]),
        }
    })
}

/// Render an indexed triangle mesh
///
/// Opaque surfaces write depth. Transparent surfaces are depth tested and
/// blended; the caller orders them back to front. Wireframe surfaces draw
/// each unique edge once.
pub fn render_mesh(
    fb: &mut Framebuffer,
    camera: &Camera,
    mesh: &MeshData,
    surface: &SurfaceParams,
    settings: &RasterSettings,
    shadow: Option<&ShadowMap>,
) {
    let focal = camera.focal_length(fb.height);
    let (width, height) = (fb.width, fb.height);
    let vertex_count = mesh.positions.len();
    let mut drawn_edges: HashSet<(u32, u32)> = HashSet::new();

    for tri in mesh.indices.chunks_exact(3) {
        let idx = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if idx.iter().any(|&i| i >= vertex_count) {
            continue;
        }

        let p = idx.map(|i| mesh.positions[i]);
        let face_normal = (p[1] - p[0]).cross(p[2] - p[0]).normalize();

        if surface.wireframe {
            let verts = triangle_vertices(mesh, camera, idx, face_normal);
            for (a, b) in [(0, 1), (1, 2), (2, 0)] {
                let key = (tri[a].min(tri[b]), tri[a].max(tri[b]));
                if !drawn_edges.insert(key) {
                    continue;
                }
                draw_shaded_edge(fb, camera, &verts[a], &verts[b], surface, settings, shadow);
            }
            continue;
        }

        // Back-face test in world space: front faces wind counter-clockwise
        let facing = face_normal.dot(camera.position - p[0]);
        let back_facing = facing < 0.0;
        if back_facing && !surface.double_sided {
            continue;
        }

        let mut verts = triangle_vertices(mesh, camera, idx, face_normal);
        if back_facing {
            for v in verts.iter_mut() {
                v.normal = -v.normal;
            }
        }

        let (clipped, n) = clip_near(verts, camera.near);
        if n < 3 {
            continue;
        }
        let screen: Vec<ScreenVertex> = clipped[..n]
            .iter()
            .map(|v| ScreenVertex::from_clip(v, focal, width, height))
            .collect();
        for i in 1..n - 1 {
            rasterize_triangle(
                fb,
                [screen[0], screen[i], screen[i + 1]],
                surface,
                camera.position,
                settings,
                shadow,
            );
        }
    }
}

fn draw_shaded_edge(
    fb: &mut Framebuffer,
    camera: &Camera,
    a: &ClipVertex,
    b: &ClipVertex,
    surface: &SurfaceParams,
    settings: &RasterSettings,
    shadow: Option<&ShadowMap>,
) {
    let near = camera.near;
    if a.view.z < near && b.view.z < near {
        return;
    }
    let (a, b) = if a.view.z < near {
        let t = (near - a.view.z) / (b.view.z - a.view.z);
        (a.lerp(b, t), *b)
    } else if b.view.z < near {
        let t = (near - a.view.z) / (b.view.z - a.view.z);
        (*a, a.lerp(b, t))
    } else {
        (*a, *b)
    };

    let mid = a.lerp(&b, 0.5);
    let frag = Fragment {
        world: mid.world,
        normal: mid.normal,
        uv: mid.uv,
        color: mid.color,
    };
    let Some((rgb, alpha)) = shade_fragment(&frag, surface, camera.position, settings, shadow) else {
        return;
    };

    let focal = camera.focal_length(fb.height);
    let s0 = super::math::project(a.view, focal, fb.width, fb.height);
    let s1 = super::math::project(b.view, focal, fb.width, fb.height);
    let line_alpha = if surface.transparent { alpha } else { 1.0 };
    fb.draw_line_3d(s0, s1, rgb.to_srgb(255), line_alpha, !surface.transparent);
}
