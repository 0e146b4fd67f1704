//! UI palette - shared colors and font sizes
//!
//! Two palettes, picked by whether the style root carries the dark theme class.

use macroquad::prelude::Color;

use crate::theme::{StyleRoot, DARK_THEME_CLASS};

/// Header/title text size
pub const FONT_SIZE_TITLE: f32 = 28.0;

/// Section header text size
pub const FONT_SIZE_HEADER: f32 = 18.0;

/// Standard content text size
pub const FONT_SIZE_CONTENT: f32 = 16.0;

/// Small/detail text size
pub const FONT_SIZE_SMALL: f32 = 13.0;

/// Indigo accent (buttons, focus rings, grid centre lines)
pub const ACCENT_COLOR: Color = Color::new(0.388, 0.4, 0.945, 1.0); // #6366f1

/// Error banner and field error text
pub const ERROR_COLOR: Color = Color::new(0.937, 0.267, 0.267, 1.0); // #ef4444

/// Success notices
pub const SUCCESS_COLOR: Color = Color::new(0.133, 0.773, 0.369, 1.0); // #22c55e

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub background: Color,
    pub surface: Color,
    pub surface_hover: Color,
    pub border: Color,
    pub text: Color,
    pub text_dim: Color,
    pub input_bg: Color,
    pub accent: Color,
    pub accent_text: Color,
    pub error: Color,
    pub success: Color,
}

impl Palette {
    pub const LIGHT: Palette = Palette {
        background: Color::new(0.953, 0.957, 0.965, 1.0),
        surface: Color::new(1.0, 1.0, 1.0, 1.0),
        surface_hover: Color::new(0.925, 0.93, 0.96, 1.0),
        border: Color::new(0.898, 0.906, 0.922, 1.0),
        text: Color::new(0.067, 0.094, 0.153, 1.0),
        text_dim: Color::new(0.42, 0.447, 0.502, 1.0),
        input_bg: Color::new(0.976, 0.98, 0.984, 1.0),
        accent: ACCENT_COLOR,
        accent_text: Color::new(1.0, 1.0, 1.0, 1.0),
        error: ERROR_COLOR,
        success: SUCCESS_COLOR,
    };

    pub const DARK: Palette = Palette {
        background: Color::new(0.067, 0.075, 0.098, 1.0),
        surface: Color::new(0.118, 0.129, 0.169, 1.0),
        surface_hover: Color::new(0.165, 0.176, 0.224, 1.0),
        border: Color::new(0.22, 0.235, 0.29, 1.0),
        text: Color::new(0.89, 0.902, 0.929, 1.0),
        text_dim: Color::new(0.58, 0.6, 0.65, 1.0),
        input_bg: Color::new(0.09, 0.1, 0.13, 1.0),
        accent: Color::new(0.545, 0.361, 0.965, 1.0), // #8b5cf6
        accent_text: Color::new(1.0, 1.0, 1.0, 1.0),
        error: ERROR_COLOR,
        success: SUCCESS_COLOR,
    };

    pub fn for_root(root: &StyleRoot) -> Palette {
        if root.contains(DARK_THEME_CLASS) {
            Palette::DARK
        } else {
            Palette::LIGHT
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_follows_root_class() {
        let mut root = StyleRoot::default();
        assert_eq!(Palette::for_root(&root), Palette::LIGHT);
        root.add(DARK_THEME_CLASS);
        assert_eq!(Palette::for_root(&root), Palette::DARK);
    }
}
