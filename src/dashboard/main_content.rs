//! Main content: upload zone, 3D viewport and the model control panel

use macroquad::prelude::*;

use super::settings::DashboardSettings;
use crate::ui::{
    button, checkbox, color_swatch, draw_rounded_rect, label, label_centered, slider, ButtonStyle, Column, Palette,
    Rect, UiContext, FONT_SIZE_CONTENT, FONT_SIZE_HEADER, FONT_SIZE_SMALL,
};
use crate::viewer::{BatchFile, FileBatch, HexColor, Viewer, ViewerState};

const PANEL_WIDTH: f32 = 300.0;
const SLIDER_HEIGHT: f32 = 34.0;
const ROW_HEIGHT: f32 = 26.0;

const FILE_FILTER_NAME: &str = "3D models";
const FILE_FILTER_EXTENSIONS: &[&str] = &["glb", "gltf", "bin", "png", "jpg", "jpeg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrbitDrag {
    Rotate,
    Pan,
}

#[derive(Default)]
pub struct MainContent {
    orbit_drag: Option<OrbitDrag>,
}

/// One dropped file. Bytes are used when the platform hands them over, the path otherwise.
fn dropped_batch_file(file: DroppedFile) -> Option<BatchFile> {
    let name = file
        .path
        .as_ref()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned());
    match (file.bytes, file.path) {
        (Some(bytes), _) => Some(BatchFile::from_bytes(name.unwrap_or_else(|| "dropped".to_string()), bytes)),
        (None, Some(path)) => Some(BatchFile::from_path(path)),
        (None, None) => None,
    }
}

/// The batch for one drop event
fn dropped_batch(files: Vec<DroppedFile>) -> Option<FileBatch> {
    let batch = FileBatch::new(files.into_iter().filter_map(dropped_batch_file).collect());
    (!batch.is_empty()).then_some(batch)
}

impl MainContent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files dropped onto the window since the last frame
    pub fn poll_dropped_files(&mut self) -> Option<FileBatch> {
        let batch = dropped_batch(get_dropped_files())?;
        tracing::debug!(files = batch.files.len(), "files dropped");
        Some(batch)
    }
}

/// Multi-select file picker
#[cfg(not(target_arch = "wasm32"))]
fn pick_files() -> Option<FileBatch> {
    let paths = rfd::FileDialog::new()
        .add_filter(FILE_FILTER_NAME, FILE_FILTER_EXTENSIONS)
        .pick_files()?;
    Some(FileBatch::from_paths(paths))
}

#[cfg(target_arch = "wasm32")]
fn pick_files() -> Option<FileBatch> {
    None
}

fn submit(viewer: &mut Viewer, batch: FileBatch) {
    if let Err(e) = viewer.submit_batch(batch) {
        tracing::warn!(error = %e, "file batch rejected");
    }
}

pub fn draw_main_content(
    ctx: &mut UiContext,
    rect: Rect,
    content: &mut MainContent,
    viewer: &mut Viewer,
    settings: &DashboardSettings,
    render_scale: f32,
    palette: &Palette,
) {
    if let Some(batch) = content.poll_dropped_files() {
        submit(viewer, batch);
    }

    let state = viewer.state();
    let show_panel = state == ViewerState::Ready || (state == ViewerState::Loading && viewer.has_model());
    let (viewport, panel) = if show_panel {
        let (left, right) = rect.split_h_px(rect.w - PANEL_WIDTH);
        (left, Some(right))
    } else {
        (rect, None)
    };

    draw_viewport(viewport, viewer, settings, render_scale);

    if let Some(panel) = panel {
        draw_control_panel(ctx, panel, viewer, palette);
    }

    let inner = viewport.pad(16.0);
    match state {
        ViewerState::Empty | ViewerState::Error => draw_drop_zone(ctx, inner, viewer, palette),
        ViewerState::Loading => draw_loading(inner, viewer.file_name().unwrap_or(""), palette),
        ViewerState::Ready => {}
    }

    if let Some(message) = viewer.error_message().map(str::to_string) {
        let banner = Rect::new(inner.x, inner.y, inner.w, 40.0);
        draw_rounded_rect(banner.x, banner.y, banner.w, banner.h, 6.0, palette.error);
        label(&message, banner.x + 14.0, banner.center_y() - FONT_SIZE_CONTENT * 0.5, FONT_SIZE_CONTENT, palette.accent_text);
        let dismiss = Rect::new(banner.right() - 36.0, banner.y + 4.0, 32.0, 32.0);
        if button(ctx, dismiss, "x", ButtonStyle::Danger, palette) {
            viewer.clear_error();
        }
    }

    handle_orbit_input(ctx, viewport, content, viewer);
}

fn draw_viewport(rect: Rect, viewer: &mut Viewer, settings: &DashboardSettings, render_scale: f32) {
    let scale = (render_scale * settings.supersample()).max(0.05);
    let w = (rect.w * scale).round().max(1.0) as usize;
    let h = (rect.h * scale).round().max(1.0) as usize;
    viewer.resize(w, h);
    viewer.frame(settings.frame_options());

    let fb = viewer.framebuffer();
    let texture = Texture2D::from_rgba8(fb.width as u16, fb.height as u16, &fb.pixels);
    texture.set_filter(if settings.anti_aliasing {
        FilterMode::Linear
    } else {
        FilterMode::Nearest
    });
    draw_texture_ex(
        &texture,
        rect.x,
        rect.y,
        WHITE,
        DrawTextureParams {
            dest_size: Some(vec2(rect.w, rect.h)),
            ..Default::default()
        },
    );
}

fn draw_drop_zone(ctx: &mut UiContext, area: Rect, viewer: &mut Viewer, palette: &Palette) {
    let zone = area.centered(420.0, 200.0);
    let mut fill = palette.surface;
    fill.a = 0.92;
    draw_rounded_rect(zone.x, zone.y, zone.w, zone.h, 10.0, fill);
    draw_rectangle_lines(zone.x, zone.y, zone.w, zone.h, 2.0, palette.accent);

    let mut col = Column::new(zone.pad(24.0), 10.0);
    label_centered("Drop a 3D model here", col.row(FONT_SIZE_HEADER + 4.0), FONT_SIZE_HEADER, palette.text);
    label_centered(
        "A .glb file, or a .gltf with its .bin and textures",
        col.row(FONT_SIZE_SMALL + 4.0),
        FONT_SIZE_SMALL,
        palette.text_dim,
    );
    col.skip(12.0);
    let row = col.row(40.0);
    if button(ctx, row.centered(160.0, 40.0), "Choose files", ButtonStyle::Primary, palette) {
        if let Some(batch) = pick_files() {
            submit(viewer, batch);
        }
    }
}

fn draw_loading(area: Rect, file_name: &str, palette: &Palette) {
    let card = area.centered(320.0, 90.0);
    draw_rounded_rect(card.x, card.y, card.w, card.h, 10.0, palette.surface);

    let t = get_time() as f32;
    let cx = card.center_x();
    let cy = card.y + 30.0;
    for i in 0..8 {
        let a = t * 4.0 + i as f32 * std::f32::consts::TAU / 8.0;
        let mut c = palette.accent;
        c.a = 0.2 + 0.8 * (i as f32 / 8.0);
        draw_circle(cx + a.cos() * 12.0, cy + a.sin() * 12.0, 3.0, c);
    }
    let caption = format!("Loading {}...", file_name);
    label_centered(&caption, Rect::new(card.x, card.y + 50.0, card.w, 30.0), FONT_SIZE_CONTENT, palette.text);
}

/// Three 0-255 sliders editing `color`. Returns true if it changed.
fn rgb_sliders(ctx: &mut UiContext, col: &mut Column, caption: &str, color: &mut HexColor, palette: &Palette) -> bool {
    let header = col.row(ROW_HEIGHT);
    label(caption, header.x, header.center_y() - FONT_SIZE_CONTENT * 0.5, FONT_SIZE_CONTENT, palette.text);
    let hex = color.to_string();
    let dims = measure_text(&hex, None, FONT_SIZE_SMALL as u16, 1.0);
    let swatch = Rect::new(header.right() - 40.0, header.y + 3.0, 40.0, header.h - 6.0);
    label(&hex, swatch.x - dims.width - 8.0, header.center_y() - FONT_SIZE_SMALL * 0.5, FONT_SIZE_SMALL, palette.text_dim);
    let (r, g, b) = color.rgb();
    color_swatch(swatch, Color::from_rgba(r, g, b, 255), palette);

    let mut channels = [r as f32, g as f32, b as f32];
    let mut changed = false;
    for (value, name) in channels.iter_mut().zip(["R", "G", "B"]) {
        changed |= slider(ctx, col.row(SLIDER_HEIGHT), name, value, (0.0, 255.0), 1.0, palette);
    }
    if changed {
        let [r, g, b] = channels.map(|c| c.round().clamp(0.0, 255.0) as u8);
        *color = HexColor::from_rgb(r, g, b);
    }
    changed
}

fn section(col: &mut Column, title: &str, palette: &Palette) {
    col.skip(6.0);
    let row = col.row(ROW_HEIGHT);
    label(title, row.x, row.center_y() - FONT_SIZE_SMALL * 0.5, FONT_SIZE_SMALL, palette.accent);
}

fn draw_control_panel(ctx: &mut UiContext, rect: Rect, viewer: &mut Viewer, palette: &Palette) {
    draw_rectangle(rect.x, rect.y, rect.w, rect.h, palette.surface);
    draw_line(rect.x, rect.y, rect.x, rect.bottom(), 1.0, palette.border);

    let mut col = Column::new(rect.pad(16.0), 4.0);
    let title = col.row(ROW_HEIGHT);
    label("Model", title.x, title.y, FONT_SIZE_HEADER, palette.text);
    if let Some(name) = viewer.file_name() {
        let row = col.row(ROW_HEIGHT - 6.0);
        label(name, row.x, row.y, FONT_SIZE_SMALL, palette.text_dim);
    }

    section(&mut col, "TRANSFORM", palette);
    let mc = &mut viewer.model_controls;
    slider(ctx, col.row(SLIDER_HEIGHT), "Rotation X", &mut mc.rotation_x, (-180.0, 180.0), 1.0, palette);
    slider(ctx, col.row(SLIDER_HEIGHT), "Rotation Y", &mut mc.rotation_y, (-180.0, 180.0), 1.0, palette);
    slider(ctx, col.row(SLIDER_HEIGHT), "Rotation Z", &mut mc.rotation_z, (-180.0, 180.0), 1.0, palette);
    slider(ctx, col.row(SLIDER_HEIGHT), "Scale", &mut mc.scale, (0.1, 3.0), 0.1, palette);

    section(&mut col, "MATERIAL", palette);
    if rgb_sliders(ctx, &mut col, "Color", &mut viewer.material_controls.color, palette) {
        viewer.update_model_color();
    }
    let mat = &mut viewer.material_controls;
    let mut material_changed = false;
    material_changed |= slider(ctx, col.row(SLIDER_HEIGHT), "Metalness", &mut mat.metalness, (0.0, 1.0), 0.01, palette);
    material_changed |= slider(ctx, col.row(SLIDER_HEIGHT), "Roughness", &mut mat.roughness, (0.0, 1.0), 0.01, palette);
    material_changed |= slider(ctx, col.row(SLIDER_HEIGHT), "Opacity", &mut mat.opacity, (0.0, 1.0), 0.01, palette);
    material_changed |= checkbox(ctx, col.row(ROW_HEIGHT), "Wireframe", &mut mat.wireframe, palette);
    if material_changed {
        viewer.update_material();
    }

    section(&mut col, "SCENE", palette);
    if rgb_sliders(ctx, &mut col, "Background", &mut viewer.material_controls.background, palette) {
        viewer.update_background_color();
    }

    col.skip(10.0);
    let row = col.row(36.0);
    let (left, right) = row.split_h_px(row.w * 0.5);
    if button(ctx, Rect::new(left.x, left.y, left.w - 4.0, left.h), "Reset", ButtonStyle::Secondary, palette) {
        viewer.reset_model();
    }
    if button(ctx, Rect::new(right.x + 4.0, right.y, right.w - 4.0, right.h), "Remove", ButtonStyle::Danger, palette) {
        viewer.remove_model();
    }
    let row = col.row(36.0);
    if button(ctx, row, "Open another model", ButtonStyle::Flat, palette) {
        if let Some(batch) = pick_files() {
            submit(viewer, batch);
        }
    }
}

/// Left drag rotates, right drag pans, wheel zooms
fn handle_orbit_input(ctx: &UiContext, viewport: Rect, content: &mut MainContent, viewer: &mut Viewer) {
    let mouse = ctx.mouse;
    let over = mouse.inside(&viewport) && !ctx.pointer_captured();

    if content.orbit_drag.is_none() && over {
        if mouse.left_pressed {
            content.orbit_drag = Some(OrbitDrag::Rotate);
        } else if mouse.right_pressed {
            content.orbit_drag = Some(OrbitDrag::Pan);
        }
    }

    let fov = viewer.camera().fov_y;
    let orbit = viewer.orbit_mut();
    match content.orbit_drag {
        Some(OrbitDrag::Rotate) if mouse.left_down => orbit.rotate(mouse.dx, mouse.dy, viewport.h),
        Some(OrbitDrag::Pan) if mouse.right_down => orbit.pan(mouse.dx, mouse.dy, viewport.h, fov),
        Some(_) => content.orbit_drag = None,
        None => {}
    }

    if over && mouse.scroll != 0.0 {
        orbit.zoom(mouse.scroll.signum());
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::viewer::loader::FileSource;

    fn drop_event(names: &[&str]) -> Vec<DroppedFile> {
        names
            .iter()
            .map(|n| DroppedFile {
                path: Some(PathBuf::from(format!("/tmp/{}", n))),
                bytes: None,
            })
            .collect()
    }

    #[test]
    fn test_repeated_drop_is_submitted_again() {
        let mut viewer = Viewer::new(&crate::config::ViewerConfig::default());
        for _ in 0..2 {
            let batch = dropped_batch(drop_event(&["notes.txt"])).expect("batch per drop event");
            assert_eq!(batch.files[0].name, "notes.txt");
            submit(&mut viewer, batch);
            assert_eq!(viewer.error_message(), Some(crate::viewer::loader::MSG_REJECTED));
            viewer.clear_error();
            assert_eq!(viewer.error_message(), None);
        }
    }

    #[test]
    fn test_dropped_bytes_keep_file_name() {
        let batch = dropped_batch(vec![DroppedFile {
            path: Some(PathBuf::from("/tmp/model.glb")),
            bytes: Some(vec![1, 2, 3]),
        }])
        .expect("batch");
        assert_eq!(batch.files[0].name, "model.glb");
        assert!(matches!(batch.files[0].source, FileSource::Memory(_)));

        assert!(dropped_batch(Vec::new()).is_none());
        assert!(dropped_batch(vec![DroppedFile { path: None, bytes: None }]).is_none());
    }
}
