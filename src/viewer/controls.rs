//! User-adjustable model and material controls

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::rasterizer::Color;

#[derive(Debug, Error, PartialEq)]
#[error("invalid hex color {0:?}, expected #rrggbb")]
pub struct ParseHexColorError(pub String);

/// A `#rrggbb` color as edited by the color controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor(pub u32);

impl HexColor {
    pub fn to_color(self) -> Color {
        Color::from_hex(self.0)
    }

    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        ((self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8)
    }
}

impl FromStr for HexColor {
    type Err = ParseHexColorError;

    /// Accepts `#rrggbb` and the short `#rgb` form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseHexColorError(s.to_string());
        let digits = s.trim().strip_prefix('#').ok_or_else(err)?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        match digits.len() {
            6 => u32::from_str_radix(digits, 16).map(HexColor).map_err(|_| err()),
            3 => {
                let expanded: String = digits.chars().flat_map(|c| [c, c]).collect();
                u32::from_str_radix(&expanded, 16).map(HexColor).map_err(|_| err())
            }
            _ => Err(err()),
        }
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0 & 0xFF_FFFF)
    }
}

/// Live transform controls, reset on every successful load
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelControls {
    /// Degrees
    pub rotation_x: f32,
    pub rotation_y: f32,
    pub rotation_z: f32,
    pub scale: f32,
}

impl Default for ModelControls {
    fn default() -> Self {
        Self {
            rotation_x: 0.0,
            rotation_y: 0.0,
            rotation_z: 0.0,
            scale: 1.0,
        }
    }
}

/// Material and background controls, kept across loads until reset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialControls {
    pub color: HexColor,
    pub metalness: f32,
    pub roughness: f32,
    pub opacity: f32,
    pub wireframe: bool,
    pub background: HexColor,
}

impl Default for MaterialControls {
    fn default() -> Self {
        Self {
            color: HexColor(0x8b5cf6),
            metalness: 0.5,
            roughness: 0.5,
            opacity: 1.0,
            wireframe: false,
            background: HexColor(0x1a1a2e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_color_parse_and_display() {
        let c: HexColor = "#8B5CF6".parse().unwrap();
        assert_eq!(c, HexColor(0x8b5cf6));
        assert_eq!(c.to_string(), "#8b5cf6");
        assert_eq!("#fff".parse::<HexColor>(), Ok(HexColor(0xffffff)));
        assert_eq!(c.rgb(), (0x8b, 0x5c, 0xf6));
        assert_eq!(HexColor::from_rgb(0x8b, 0x5c, 0xf6), c);
    }

    #[test]
    fn test_hex_color_rejects_garbage() {
        assert!("8b5cf6".parse::<HexColor>().is_err());
        assert!("#8b5cf".parse::<HexColor>().is_err());
        assert!("#zzzzzz".parse::<HexColor>().is_err());
        assert!("#+12345".parse::<HexColor>().is_err());
    }

    #[test]
    fn test_defaults() {
        let m = ModelControls::default();
        assert_eq!((m.rotation_x, m.rotation_y, m.rotation_z, m.scale), (0.0, 0.0, 0.0, 1.0));
        let mat = MaterialControls::default();
        assert_eq!(mat.color.to_string(), "#8b5cf6");
        assert_eq!(mat.background.to_string(), "#1a1a2e");
        assert!(!mat.wireframe);
    }
}
