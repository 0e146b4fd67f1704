//! Dashboard page: header, settings panel and the model viewer

mod header;
mod main_content;
mod settings;

pub use header::{draw_header, draw_user_menu, user_menu_rect, Header, HeaderAction, HEADER_HEIGHT};
pub use main_content::{draw_main_content, MainContent};
pub use settings::{draw_settings_panel, settings_panel_rect, DashboardSettings, SettingsPanel};

use crate::config::AppConfig;
use crate::storage::SharedStore;
use crate::theme::ThemeService;
use crate::ui::{MouseState, Palette, Rect, UiContext};
use crate::viewer::{FileBatch, Viewer};

pub struct Dashboard {
    pub header: Header,
    pub settings: SettingsPanel,
    pub content: MainContent,
    pub viewer: Viewer,
    render_scale: f32,
}

impl Dashboard {
    pub fn new(config: &AppConfig, store: SharedStore, theme: &mut ThemeService) -> Self {
        Self {
            header: Header::new(theme),
            settings: SettingsPanel::new(store),
            content: MainContent::new(),
            viewer: Viewer::new(&config.viewer),
            render_scale: config.viewer.render_scale,
        }
    }

    /// Queue files handed over outside the UI (command line)
    pub fn open_batch(&mut self, batch: FileBatch) {
        if let Err(e) = self.viewer.submit_batch(batch) {
            tracing::warn!(error = %e, "initial files rejected");
        }
    }

    /// Apply finished background loads
    pub fn poll(&mut self) {
        self.viewer.poll();
    }

    /// Draw the page. Returns a header action for the caller to handle.
    pub fn draw(
        &mut self,
        ctx: &mut UiContext,
        screen: Rect,
        theme: &mut ThemeService,
        username: &str,
        palette: &Palette,
    ) -> Option<HeaderAction> {
        let header_rect = screen.slice_top(HEADER_HEIGHT);
        let body = screen.remaining_after_top(HEADER_HEIGHT);

        draw_header(ctx, header_rect, &mut self.header, theme, &mut self.settings, username, palette);

        // Overlays are drawn last, so hide the pointer from the content beneath them
        let mut overlays = Vec::new();
        if self.settings.open {
            overlays.push(settings_panel_rect(body));
        }
        if self.header.user_menu_open {
            overlays.push(user_menu_rect(header_rect, username));
        }
        let pointer = ctx.mouse;
        if ctx.dragging.is_none() && overlays.iter().any(|r| pointer.inside(r)) {
            ctx.mouse = MouseState {
                x: -1.0,
                y: -1.0,
                ..MouseState::default()
            };
        }
        draw_main_content(
            ctx,
            body,
            &mut self.content,
            &mut self.viewer,
            &self.settings.settings,
            self.render_scale,
            palette,
        );
        ctx.mouse = pointer;

        if self.settings.open {
            draw_settings_panel(ctx, body, &mut self.settings, theme, username, palette);
        }
        draw_user_menu(ctx, header_rect, &mut self.header, username, palette)
    }

    pub fn teardown(&mut self) {
        self.viewer.teardown();
    }
}
