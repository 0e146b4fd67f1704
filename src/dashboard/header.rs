//! Dashboard header: title, theme toggle, settings toggle and user menu

use macroquad::prelude::*;

use super::settings::SettingsPanel;
use crate::theme::{ThemeService, ThemeSubscription};
use crate::ui::{button, draw_rounded_rect, label, ButtonStyle, Palette, Rect, UiContext, FONT_SIZE_CONTENT, FONT_SIZE_HEADER};

pub const HEADER_HEIGHT: f32 = 56.0;
const BUTTON_HEIGHT: f32 = 34.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderAction {
    Logout,
}

pub struct Header {
    theme: ThemeSubscription,
    is_dark: bool,
    pub user_menu_open: bool,
}

impl Header {
    pub fn new(theme: &mut ThemeService) -> Self {
        let mut theme = theme.subscribe();
        let is_dark = theme.latest();
        Self {
            theme,
            is_dark,
            user_menu_open: false,
        }
    }

    /// Current theme as last notified
    pub fn is_dark(&mut self) -> bool {
        self.is_dark = self.theme.latest();
        self.is_dark
    }

    /// Opening the user menu closes the settings panel
    pub fn toggle_user_menu(&mut self, settings: &mut SettingsPanel) {
        self.user_menu_open = !self.user_menu_open;
        if self.user_menu_open {
            settings.open = false;
        }
    }

    pub fn toggle_settings(&mut self, settings: &mut SettingsPanel) {
        settings.toggle();
        if settings.open {
            self.user_menu_open = false;
        }
    }
}

fn user_button_rect(rect: Rect, username: &str) -> Rect {
    let w = (measure_text(username, None, FONT_SIZE_CONTENT as u16, 1.0).width + 40.0).max(90.0);
    Rect::new(rect.right() - 16.0 - w, rect.center_y() - BUTTON_HEIGHT * 0.5, w, BUTTON_HEIGHT)
}

/// The dropdown under the user button
pub fn user_menu_rect(rect: Rect, username: &str) -> Rect {
    let user = user_button_rect(rect, username);
    Rect::new(user.right() - 160.0, rect.bottom() + 4.0, 160.0, 44.0)
}

/// Title bar with the theme, settings and user buttons
pub fn draw_header(
    ctx: &mut UiContext,
    rect: Rect,
    header: &mut Header,
    theme: &mut ThemeService,
    settings: &mut SettingsPanel,
    username: &str,
    palette: &Palette,
) {
    draw_rectangle(rect.x, rect.y, rect.w, rect.h, palette.surface);
    draw_line(rect.x, rect.bottom(), rect.right(), rect.bottom(), 1.0, palette.border);

    draw_rounded_rect(rect.x + 20.0, rect.center_y() - 12.0, 24.0, 24.0, 6.0, palette.accent);
    label("PixelPulse", rect.x + 54.0, rect.center_y() - FONT_SIZE_HEADER * 0.5, FONT_SIZE_HEADER, palette.text);

    let user_rect = user_button_rect(rect, username);
    let caret = if header.user_menu_open { "^" } else { "v" };
    if button(ctx, user_rect, &format!("{} {}", username, caret), ButtonStyle::Secondary, palette) {
        header.toggle_user_menu(settings);
    }

    let mut x = user_rect.x - 100.0;
    if button(ctx, Rect::new(x, user_rect.y, 92.0, BUTTON_HEIGHT), "Settings", ButtonStyle::Flat, palette) {
        header.toggle_settings(settings);
    }

    x -= 92.0;
    let theme_caption = if header.is_dark() { "Light" } else { "Dark" };
    if button(ctx, Rect::new(x, user_rect.y, 84.0, BUTTON_HEIGHT), theme_caption, ButtonStyle::Flat, palette) {
        theme.toggle_theme();
        tracing::debug!(dark = theme.is_dark_mode(), "theme toggled");
    }
}

/// The open user menu, drawn above the page content
pub fn draw_user_menu(
    ctx: &mut UiContext,
    rect: Rect,
    header: &mut Header,
    username: &str,
    palette: &Palette,
) -> Option<HeaderAction> {
    if !header.user_menu_open {
        return None;
    }
    let menu = user_menu_rect(rect, username);
    draw_rounded_rect(menu.x, menu.y, menu.w, menu.h, 6.0, palette.surface);
    draw_rectangle_lines(menu.x, menu.y, menu.w, menu.h, 1.0, palette.border);
    if button(ctx, menu.pad(4.0), "Logout", ButtonStyle::Flat, palette) {
        header.user_menu_open = false;
        return Some(HeaderAction::Logout);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{shared, LocalStore};
    use crate::theme::ColorSchemeQuery;

    #[test]
    fn test_menus_are_exclusive() {
        let store = shared(LocalStore::in_memory());
        let mut theme = ThemeService::new(store.clone(), ColorSchemeQuery::new(Some(false)));
        let mut settings = SettingsPanel::new(store);
        let mut header = Header::new(&mut theme);

        header.toggle_settings(&mut settings);
        assert!(settings.open);
        header.toggle_user_menu(&mut settings);
        assert!(header.user_menu_open);
        assert!(!settings.open);
        header.toggle_settings(&mut settings);
        assert!(!header.user_menu_open);
    }

    #[test]
    fn test_header_follows_theme() {
        let store = shared(LocalStore::in_memory());
        let mut theme = ThemeService::new(store, ColorSchemeQuery::new(Some(false)));
        let mut header = Header::new(&mut theme);
        assert!(!header.is_dark());
        theme.toggle_theme();
        assert!(header.is_dark());
    }
}
