//! PixelPulse: a 3D asset dashboard
//!
//! Sign in against the REST backend, then drop a GLB/GLTF model into the
//! viewport and tweak its transform and material live. Rendering is done by
//! a small software rasterizer blitted into a macroquad window.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod app;
mod auth;
mod config;
mod dashboard;
mod rasterizer;
mod scene;
mod storage;
mod task;
mod theme;
mod ui;
mod viewer;

use std::sync::Arc;

use clap::Parser;
use macroquad::prelude::*;

use app::AppState;
use auth::HttpAuthBackend;
use config::{AppConfig, Cli, API_URL_ENV};
use storage::LocalStore;
use ui::{MouseState, Rect, UiContext};
use viewer::FileBatch;

fn window_conf() -> Conf {
    Conf {
        window_title: format!("PixelPulse v{}", VERSION),
        window_width: 1280,
        window_height: 800,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    // Initialize crash logging FIRST (before any other code)
    #[cfg(not(target_arch = "wasm32"))]
    crashlog::setup!(crashlog::cargo_metadata!().capitalized(), false);

    let cli = Cli::parse();
    let (config, config_error) = AppConfig::resolve(&cli, std::env::var(API_URL_ENV).ok());

    tracing_subscriber::fmt().with_max_level(config.tracing_level()).init();
    if let Some(e) = config_error {
        tracing::warn!(error = %e, "using default configuration");
    }
    tracing::info!(version = VERSION, api = %config.api_base_url, "starting PixelPulse");

    let store = match config.storage_dir() {
        Some(dir) => LocalStore::open_in_dir_or_memory(&dir),
        None => {
            tracing::warn!("no config directory, settings will not persist");
            LocalStore::in_memory()
        }
    };
    let backend = Arc::new(HttpAuthBackend::new(&config));
    let mut app = AppState::new(config, storage::shared(store), backend);
    app.queue_files(FileBatch::from_paths(&cli.files));

    let mut ui_ctx = UiContext::new();
    prevent_quit();

    loop {
        let mouse = MouseState::capture(&ui_ctx.mouse);
        let shift = is_key_down(KeyCode::LeftShift) || is_key_down(KeyCode::RightShift);
        ui_ctx.begin_frame(mouse, is_key_pressed(KeyCode::Tab), shift);

        app.update();

        clear_background(app.palette().background);
        app.draw(&mut ui_ctx, Rect::screen(screen_width(), screen_height()));

        ui_ctx.end_frame();

        if is_quit_requested() {
            app.shutdown();
            tracing::info!("exiting");
            break;
        }

        next_frame().await;
    }
}
