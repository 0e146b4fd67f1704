//! Surface materials

use std::sync::Arc;

use crate::rasterizer::{Rgb, SurfaceParams, Texture};

/// Physically-inspired material (the one user controls act on)
#[derive(Debug, Clone)]
pub struct StandardMaterial {
    pub name: String,
    /// Linear base color factor
    pub color: Rgb,
    pub metalness: f32,
    pub roughness: f32,
    pub opacity: f32,
    /// Blend instead of writing depth
    pub transparent: bool,
    pub wireframe: bool,
    pub double_sided: bool,
    pub alpha_cutoff: Option<f32>,
    pub map: Option<Arc<Texture>>,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: Rgb::WHITE,
            metalness: 1.0,
            roughness: 1.0,
            opacity: 1.0,
            transparent: false,
            wireframe: false,
            double_sided: false,
            alpha_cutoff: None,
            map: None,
        }
    }
}

/// Unlit material (`KHR_materials_unlit`)
#[derive(Debug, Clone)]
pub struct BasicMaterial {
    pub name: String,
    pub color: Rgb,
    pub opacity: f32,
    pub transparent: bool,
    pub wireframe: bool,
    pub double_sided: bool,
    pub alpha_cutoff: Option<f32>,
    pub map: Option<Arc<Texture>>,
}

impl Default for BasicMaterial {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: Rgb::WHITE,
            opacity: 1.0,
            transparent: false,
            wireframe: false,
            double_sided: false,
            alpha_cutoff: None,
            map: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Material {
    Standard(StandardMaterial),
    Basic(BasicMaterial),
}

impl Material {
    #[cfg(test)]
    pub fn as_standard(&self) -> Option<&StandardMaterial> {
        match self {
            Material::Standard(m) => Some(m),
            Material::Basic(_) => None,
        }
    }

    pub fn as_standard_mut(&mut self) -> Option<&mut StandardMaterial> {
        match self {
            Material::Standard(m) => Some(m),
            Material::Basic(_) => None,
        }
    }

    pub fn is_transparent(&self) -> bool {
        match self {
            Material::Standard(m) => m.transparent,
            Material::Basic(m) => m.transparent,
        }
    }

    /// Rasterizer parameters for this material
    pub fn surface(&self, receive_shadow: bool) -> SurfaceParams<'_> {
        match self {
            Material::Standard(m) => SurfaceParams {
                color: m.color,
                opacity: m.opacity,
                metalness: m.metalness.clamp(0.0, 1.0),
                roughness: m.roughness.clamp(0.0, 1.0),
                lit: true,
                wireframe: m.wireframe,
                double_sided: m.double_sided,
                receive_shadow,
                transparent: m.transparent,
                alpha_cutoff: m.alpha_cutoff,
                texture: m.map.as_deref(),
            },
            Material::Basic(m) => SurfaceParams {
                color: m.color,
                opacity: m.opacity,
                metalness: 0.0,
                roughness: 1.0,
                lit: false,
                wireframe: m.wireframe,
                double_sided: m.double_sided,
                receive_shadow: false,
                transparent: m.transparent,
                alpha_cutoff: m.alpha_cutoff,
                texture: m.map.as_deref(),
            },
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::Standard(StandardMaterial::default())
    }
}
