//! Immediate-mode UI on macroquad
//!
//! Design principles:
//! - Immediate mode (no retained state, rebuilt each frame)
//! - Simple rectangle-based layout
//! - Colors come from a `Palette` chosen by the active theme

mod input;
mod palette;
mod rect;
mod text_input;
mod widgets;

pub use input::*;
pub use palette::*;
pub use rect::*;
pub use text_input::*;
pub use widgets::*;
