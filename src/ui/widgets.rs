//! Basic UI widgets

use macroquad::prelude::*;

use super::{Palette, Rect, UiContext, FONT_SIZE_CONTENT, FONT_SIZE_SMALL};

/// Draw text with its top-left corner at (x, y)
pub fn label(text: &str, x: f32, y: f32, font_size: f32, color: Color) {
    let dims = measure_text(text, None, font_size as u16, 1.0);
    draw_text(text, x.round(), (y + dims.offset_y).round(), font_size, color);
}

/// Text centered in a rect
pub fn label_centered(text: &str, rect: Rect, font_size: f32, color: Color) {
    let dims = measure_text(text, None, font_size as u16, 1.0);
    let x = rect.center_x() - dims.width * 0.5;
    let y = rect.center_y() - dims.height * 0.5 + dims.offset_y;
    draw_text(text, x.round(), y.round(), font_size, color);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    /// Filled with the accent color
    Primary,
    /// Surface color with a border
    Secondary,
    /// Text only, background on hover
    Flat,
    /// Filled with the error color
    Danger,
}

/// Draw a button, returns true if clicked
pub fn button(ctx: &mut UiContext, rect: Rect, text: &str, style: ButtonStyle, palette: &Palette) -> bool {
    button_enabled(ctx, rect, text, style, palette, true)
}

/// A button that ignores clicks and draws dimmed when disabled
pub fn button_enabled(
    ctx: &mut UiContext,
    rect: Rect,
    text: &str,
    style: ButtonStyle,
    palette: &Palette,
    enabled: bool,
) -> bool {
    let id = ctx.next_id();
    let hovered = enabled && ctx.mouse.inside(&rect);
    let pressed = hovered && ctx.mouse.left_down;
    let clicked = enabled && ctx.mouse.clicked(&rect);
    if hovered {
        ctx.set_hot(id);
    }

    let corner_radius = 6.0;
    let (mut fill, text_color) = match style {
        ButtonStyle::Primary => (Some(palette.accent), palette.accent_text),
        ButtonStyle::Danger => (Some(palette.error), palette.accent_text),
        ButtonStyle::Secondary => (Some(palette.surface), palette.text),
        ButtonStyle::Flat => (hovered.then_some(palette.surface_hover), palette.text),
    };
    if let Some(c) = fill.as_mut() {
        if pressed {
            *c = shade(*c, 0.85);
        } else if hovered && style != ButtonStyle::Flat {
            *c = shade(*c, 0.93);
        }
        if !enabled {
            c.a *= 0.5;
        }
    }

    if let Some(c) = fill {
        draw_rounded_rect(rect.x, rect.y, rect.w, rect.h, corner_radius, c);
    }
    if style == ButtonStyle::Secondary {
        draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 1.0, palette.border);
    }
    let mut text_color = text_color;
    if !enabled {
        text_color.a *= 0.6;
    }
    label_centered(text, rect, FONT_SIZE_CONTENT, text_color);

    clicked
}

/// Toggle with a label to its right. Returns true if toggled.
pub fn checkbox(ctx: &mut UiContext, rect: Rect, text: &str, value: &mut bool, palette: &Palette) -> bool {
    let id = ctx.next_id();
    let hovered = ctx.mouse.inside(&rect);
    if hovered {
        ctx.set_hot(id);
    }
    let clicked = ctx.mouse.clicked(&rect);
    if clicked {
        *value = !*value;
    }

    let size = (rect.h - 6.0).clamp(10.0, 18.0);
    let bx = rect.x;
    let by = rect.center_y() - size * 0.5;
    if *value {
        draw_rounded_rect(bx, by, size, size, 3.0, palette.accent);
        let inset = size * 0.25;
        draw_line(bx + inset, by + size * 0.5, bx + size * 0.45, by + size - inset, 2.0, palette.accent_text);
        draw_line(bx + size * 0.45, by + size - inset, bx + size - inset, by + inset, 2.0, palette.accent_text);
    } else {
        draw_rectangle(bx, by, size, size, palette.input_bg);
        let border = if hovered { palette.accent } else { palette.border };
        draw_rectangle_lines(bx, by, size, size, 1.5, border);
    }
    label(
        text,
        bx + size + 8.0,
        rect.center_y() - FONT_SIZE_CONTENT * 0.5,
        FONT_SIZE_CONTENT,
        palette.text,
    );

    clicked
}

/// Map a pointer x inside `track` to a value in `min..=max`, snapped to `step`
pub fn slider_value_at(track: &Rect, x: f32, min: f32, max: f32, step: f32) -> f32 {
    let t = if track.w > 0.0 { ((x - track.x) / track.w).clamp(0.0, 1.0) } else { 0.0 };
    let raw = min + (max - min) * t;
    let snapped = if step > 0.0 { min + ((raw - min) / step).round() * step } else { raw };
    snapped.clamp(min.min(max), max.max(min))
}

/// Horizontal slider with a caption and value readout above the track.
/// Returns true if the value changed.
pub fn slider(
    ctx: &mut UiContext,
    rect: Rect,
    caption: &str,
    value: &mut f32,
    range: (f32, f32),
    step: f32,
    palette: &Palette,
) -> bool {
    let id = ctx.next_id();
    let (min, max) = range;
    let caption_h = FONT_SIZE_SMALL + 6.0;
    let track = Rect::new(rect.x + 6.0, rect.y + caption_h + 4.0, (rect.w - 12.0).max(1.0), 4.0);
    let hit = Rect::new(rect.x, rect.y + caption_h - 4.0, rect.w, rect.h - caption_h + 4.0);

    if ctx.mouse.inside(&hit) {
        ctx.set_hot(id);
        if ctx.mouse.left_pressed {
            ctx.start_drag(id);
        }
    }

    let mut changed = false;
    if ctx.is_dragging(id) {
        let v = slider_value_at(&track, ctx.mouse.x, min, max, step);
        if (v - *value).abs() > f32::EPSILON {
            *value = v;
            changed = true;
        }
    }

    let readout = if step >= 1.0 { format!("{:.0}", value) } else { format!("{:.2}", value) };
    label(caption, rect.x, rect.y, FONT_SIZE_SMALL, palette.text_dim);
    let dims = measure_text(&readout, None, FONT_SIZE_SMALL as u16, 1.0);
    label(&readout, rect.right() - dims.width, rect.y, FONT_SIZE_SMALL, palette.text);

    let t = if max > min { ((*value - min) / (max - min)).clamp(0.0, 1.0) } else { 0.0 };
    draw_rectangle(track.x, track.y, track.w, track.h, palette.border);
    draw_rectangle(track.x, track.y, track.w * t, track.h, palette.accent);
    let knob_r = if ctx.is_dragging(id) || ctx.is_hot(id) { 7.0 } else { 6.0 };
    draw_circle(track.x + track.w * t, track.center_y(), knob_r, palette.accent);

    changed
}

/// Filled swatch with a border
pub fn color_swatch(rect: Rect, color: Color, palette: &Palette) {
    draw_rounded_rect(rect.x, rect.y, rect.w, rect.h, 4.0, color);
    draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 1.0, palette.border);
}

/// Draw a rounded rectangle (simple approximation using overlapping rects)
pub fn draw_rounded_rect(x: f32, y: f32, w: f32, h: f32, r: f32, color: Color) {
    let r = r.min(w * 0.5).min(h * 0.5);
    draw_rectangle(x + r, y, w - r * 2.0, h, color);
    draw_rectangle(x, y + r, w, h - r * 2.0, color);
    draw_circle(x + r, y + r, r, color);
    draw_circle(x + w - r, y + r, r, color);
    draw_circle(x + r, y + h - r, r, color);
    draw_circle(x + w - r, y + h - r, r, color);
}

fn shade(c: Color, f: f32) -> Color {
    Color::new(c.r * f, c.g * f, c.b * f, c.a)
}
