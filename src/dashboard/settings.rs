//! Settings panel state, persisted under the `settings` storage key

use macroquad::prelude::*;
use serde::{Deserialize, Serialize};

use crate::storage::{SharedStore, SETTINGS_KEY};
use crate::theme::ThemeService;
use crate::ui::{
    button, checkbox, draw_rounded_rect, label, ButtonStyle, Column, Palette, Rect, UiContext, FONT_SIZE_HEADER,
    FONT_SIZE_SMALL,
};
use crate::viewer::FrameOptions;

const PANEL_WIDTH: f32 = 280.0;
const PANEL_HEIGHT: f32 = 330.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardSettings {
    pub auto_save: bool,
    pub show_grid: bool,
    pub enable_shadows: bool,
    pub anti_aliasing: bool,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            auto_save: true,
            show_grid: true,
            enable_shadows: true,
            anti_aliasing: true,
        }
    }
}

impl DashboardSettings {
    /// Renderer switches derived from the settings
    pub fn frame_options(&self) -> FrameOptions {
        FrameOptions {
            show_grid: self.show_grid,
            shadows: self.enable_shadows,
        }
    }

    /// Internal render resolution multiplier
    pub fn supersample(&self) -> f32 {
        if self.anti_aliasing {
            2.0
        } else {
            1.0
        }
    }
}

pub struct SettingsPanel {
    store: SharedStore,
    pub open: bool,
    pub settings: DashboardSettings,
}

impl SettingsPanel {
    /// Load saved settings, falling back to defaults on a missing or corrupt entry
    pub fn new(store: SharedStore) -> Self {
        let settings = match store.borrow().get_item(SETTINGS_KEY) {
            Some(raw) => serde_json::from_str(raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "ignoring unreadable saved settings");
                DashboardSettings::default()
            }),
            None => DashboardSettings::default(),
        };
        Self {
            store,
            open: false,
            settings,
        }
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    /// Persist the current settings and close the panel
    pub fn save_settings(&mut self) {
        match serde_json::to_string(&self.settings) {
            Ok(json) => {
                self.store.borrow_mut().set_item(SETTINGS_KEY, json);
                tracing::info!(settings = ?self.settings, "Settings saved");
            }
            Err(e) => tracing::error!(error = %e, "failed to serialize settings"),
        }
        self.open = false;
    }
}

/// Where the panel floats: top-right of `area`
pub fn settings_panel_rect(area: Rect) -> Rect {
    Rect::new(area.right() - PANEL_WIDTH - 16.0, area.y + 8.0, PANEL_WIDTH, PANEL_HEIGHT)
}

pub fn draw_settings_panel(
    ctx: &mut UiContext,
    area: Rect,
    panel: &mut SettingsPanel,
    theme: &mut ThemeService,
    username: &str,
    palette: &Palette,
) {
    let rect = settings_panel_rect(area);
    draw_rounded_rect(rect.x, rect.y, rect.w, rect.h, 8.0, palette.surface);
    draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 1.0, palette.border);

    let mut col = Column::new(rect.pad(16.0), 6.0);
    let row = col.row(FONT_SIZE_HEADER + 6.0);
    label("Settings", row.x, row.y, FONT_SIZE_HEADER, palette.text);
    let row = col.row(FONT_SIZE_SMALL + 6.0);
    label(&format!("Signed in as {}", username), row.x, row.y, FONT_SIZE_SMALL, palette.text_dim);
    col.skip(6.0);

    let mut dark = theme.is_dark_mode();
    if checkbox(ctx, col.row(28.0), "Dark mode", &mut dark, palette) {
        theme.set_dark_mode(dark);
    }
    let s = &mut panel.settings;
    checkbox(ctx, col.row(28.0), "Auto-save", &mut s.auto_save, palette);
    checkbox(ctx, col.row(28.0), "Show grid", &mut s.show_grid, palette);
    checkbox(ctx, col.row(28.0), "Enable shadows", &mut s.enable_shadows, palette);
    checkbox(ctx, col.row(28.0), "Anti-aliasing", &mut s.anti_aliasing, palette);

    col.skip(10.0);
    let row = col.row(36.0);
    let (left, right) = row.split_h_px(row.w * 0.5);
    if button(ctx, Rect::new(left.x, left.y, left.w - 4.0, left.h), "Cancel", ButtonStyle::Secondary, palette) {
        panel.open = false;
    }
    if button(ctx, Rect::new(right.x + 4.0, right.y, right.w - 4.0, right.h), "Save", ButtonStyle::Primary, palette) {
        panel.save_settings();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{shared, LocalStore};

    #[test]
    fn test_save_persists_and_closes() {
        let store = shared(LocalStore::in_memory());
        let mut panel = SettingsPanel::new(store.clone());
        assert_eq!(panel.settings, DashboardSettings::default());

        panel.toggle();
        panel.settings.show_grid = false;
        panel.settings.anti_aliasing = false;
        panel.save_settings();
        assert!(!panel.open);

        let raw = store.borrow().get_item(SETTINGS_KEY).map(str::to_string);
        let raw = raw.expect("settings saved");
        assert!(raw.contains("\"showGrid\":false"));

        let reloaded = SettingsPanel::new(store);
        assert!(!reloaded.settings.show_grid);
        assert!(!reloaded.settings.anti_aliasing);
        assert!(reloaded.settings.enable_shadows);
        assert_eq!(reloaded.settings.supersample(), 1.0);
    }

    #[test]
    fn test_corrupt_or_partial_settings() {
        let store = shared(LocalStore::in_memory());
        store.borrow_mut().set_item(SETTINGS_KEY, "{not json");
        assert_eq!(SettingsPanel::new(store.clone()).settings, DashboardSettings::default());

        store.borrow_mut().set_item(SETTINGS_KEY, r#"{"enableShadows":false}"#);
        let settings = SettingsPanel::new(store).settings;
        assert!(!settings.enable_shadows);
        assert!(settings.auto_save);
        assert!(!settings.frame_options().shadows);
    }
}
