//! Software rasterizer for the model viewport
//!
//! Features:
//! - Perspective-correct interpolation with near-plane clipping
//! - Per-pixel standard-material shading (ambient, hemisphere, directional)
//! - Directional shadow map with PCF
//! - Back-to-front blended transparency and wireframe edges
//!
//! # Module Organization
//!
//! - `types` - Color, Rgb, Texture, Light, RasterSettings
//! - `math` - Vec3, Vec2, Quat, Mat4 helpers
//! - `camera` - Perspective camera
//! - `render` - Framebuffer and mesh rendering
//! - `shadow` - Shadow map
//! - `draw` - Lines and the grid helper

pub mod camera;
pub mod draw;
pub mod math;
pub mod render;
pub mod shadow;
pub mod types;

pub use camera::Camera;
pub use draw::{draw_3d_line_clipped, GridHelper};
pub use math::{
    mat3_transform, mat4_compose, mat4_flips_winding, mat4_identity, mat4_mul, mat4_normal_matrix,
    mat4_transform_point, Mat3, Mat4, Quat, Vec2, Vec3,
};
pub use render::{render_mesh, Framebuffer, MeshData, SurfaceParams};
pub use shadow::ShadowMap;
pub use types::{Color, Light, LightType, RasterSettings, Rgb, Texture};
