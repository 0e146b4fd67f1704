//! Core rasterizer types
//!
//! Colors come in two flavours: `Color` is an 8-bit sRGB pixel as it lands in
//! the framebuffer, `Rgb` is linear floating point used for lighting.

use super::math::Vec3;

/// 8-bit sRGB color with alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// From a packed `0xRRGGBB` value
    pub const fn from_hex(hex: u32) -> Self {
        Self::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Interpolate between two colors
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color::with_alpha(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }

    pub fn to_linear(self) -> Rgb {
        Rgb::new(
            srgb_to_linear(self.r as f32 / 255.0),
            srgb_to_linear(self.g as f32 / 255.0),
            srgb_to_linear(self.b as f32 / 255.0),
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// Linear RGB, unbounded during lighting
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    pub fn scale(self, s: f32) -> Rgb {
        Rgb::new(self.r * s, self.g * s, self.b * s)
    }

    pub fn mul(self, o: Rgb) -> Rgb {
        Rgb::new(self.r * o.r, self.g * o.g, self.b * o.b)
    }

    pub fn add(self, o: Rgb) -> Rgb {
        Rgb::new(self.r + o.r, self.g + o.g, self.b + o.b)
    }

    pub fn lerp(self, o: Rgb, t: f32) -> Rgb {
        Rgb::new(
            self.r + (o.r - self.r) * t,
            self.g + (o.g - self.g) * t,
            self.b + (o.b - self.b) * t,
        )
    }

    /// Encode for display (clamped)
    pub fn to_srgb(self, alpha: u8) -> Color {
        let enc = |c: f32| (linear_to_srgb(c.clamp(0.0, 1.0)) * 255.0 + 0.5) as u8;
        Color::with_alpha(enc(self.r), enc(self.g), enc(self.b), alpha)
    }
}

pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

pub fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// RGBA texture, texels stored linear for sampling
#[derive(Debug, Clone)]
pub struct Texture {
    pub width: usize,
    pub height: usize,
    /// Linear RGB + straight alpha (0-1)
    pub pixels: Vec<[f32; 4]>,
    pub name: String,
}

impl Texture {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![[1.0; 4]; width * height],
            name: String::new(),
        }
    }

    /// Build from sRGB-encoded RGBA8 bytes
    pub fn from_srgba8(width: usize, height: usize, bytes: &[u8], name: impl Into<String>) -> Self {
        let pixels = bytes
            .chunks_exact(4)
            .map(|p| {
                [
                    srgb_to_linear(p[0] as f32 / 255.0),
                    srgb_to_linear(p[1] as f32 / 255.0),
                    srgb_to_linear(p[2] as f32 / 255.0),
                    p[3] as f32 / 255.0,
                ]
            })
            .collect();
        Self {
            width,
            height,
            pixels,
            name: name.into(),
        }
    }

    /// Decode an encoded image (PNG, JPEG, BMP)
    pub fn decode(bytes: &[u8], name: impl Into<String>) -> Result<Self, image::ImageError> {
        let img = image::load_from_memory(bytes)?;
        let rgba = img.to_rgba8();
        let (w, h) = rgba.dimensions();
        Ok(Self::from_srgba8(w as usize, h as usize, rgba.as_raw(), name))
    }

    /// Nearest-neighbour sample with repeat wrapping (glTF UV origin top-left)
    pub fn sample(&self, u: f32, v: f32) -> [f32; 4] {
        if self.width == 0 || self.height == 0 {
            return [1.0; 4];
        }
        let fu = u - u.floor();
        let fv = v - v.floor();
        let x = ((fu * self.width as f32) as usize).min(self.width - 1);
        let y = ((fv * self.height as f32) as usize).min(self.height - 1);
        self.pixels[y * self.width + x]
    }
}

/// Light type
#[derive(Debug, Clone, Copy)]
pub enum LightType {
    /// Uniform light from all directions
    Ambient,
    /// Infinite light arriving from `position` toward the origin
    Directional { position: Vec3 },
    /// Sky/ground gradient by normal.y
    Hemisphere { ground: Rgb },
}

/// A light source in the scene
#[derive(Debug, Clone)]
pub struct Light {
    pub light_type: LightType,
    /// Sky color for hemisphere lights
    pub color: Rgb,
    pub intensity: f32,
    pub enabled: bool,
    pub cast_shadow: bool,
    pub name: String,
}

impl Light {
    pub fn ambient(color: Color, intensity: f32) -> Self {
        Self {
            light_type: LightType::Ambient,
            color: color.to_linear(),
            intensity,
            enabled: true,
            cast_shadow: false,
            name: String::from("Ambient"),
        }
    }

    pub fn directional(color: Color, intensity: f32, position: Vec3) -> Self {
        Self {
            light_type: LightType::Directional { position },
            color: color.to_linear(),
            intensity,
            enabled: true,
            cast_shadow: false,
            name: String::from("Directional"),
        }
    }

    pub fn hemisphere(sky: Color, ground: Color, intensity: f32) -> Self {
        Self {
            light_type: LightType::Hemisphere { ground: ground.to_linear() },
            color: sky.to_linear(),
            intensity,
            enabled: true,
            cast_shadow: false,
            name: String::from("Hemisphere"),
        }
    }
}

/// Per-frame rasterizer settings
#[derive(Debug, Clone)]
pub struct RasterSettings {
    pub lights: Vec<Light>,
    /// Sample the shadow map for receiving surfaces
    pub shadows: bool,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            lights: Vec::new(),
            shadows: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srgb_round_trip() {
        let c = Color::from_hex(0x8b5cf6);
        assert_eq!(c, Color::new(0x8b, 0x5c, 0xf6));
        assert_eq!(c.to_linear().to_srgb(255), c);
    }

    #[test]
    fn test_sample_wraps() {
        let mut tex = Texture::new(2, 1);
        tex.pixels[1] = [0.0, 0.0, 0.0, 1.0];
        assert_eq!(tex.sample(0.75, 0.0)[0], 0.0);
        assert_eq!(tex.sample(1.25, 0.0)[0], 1.0);
        assert_eq!(tex.sample(-0.25, 0.0)[0], 0.0);
    }

    #[test]
    fn test_decode_png() {
        let mut png = Vec::new();
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]));
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png).unwrap();

        let tex = Texture::decode(&png, "red").unwrap();
        assert_eq!((tex.width, tex.height), (2, 2));
        assert!((tex.pixels[0][0] - 1.0).abs() < 1e-6);
        assert!(tex.pixels[0][1].abs() < 1e-6);
    }
}
