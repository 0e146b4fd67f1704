//! Application state and routing
//!
//! Three pages: login, signup and the dashboard. The dashboard (and its
//! viewer) is created when it is navigated to and torn down when left.

use std::sync::Arc;

use crate::auth::screen::{draw_login, draw_signup, LoginScreen, SignupScreen};
use crate::auth::{AuthBackend, AuthController};
use crate::config::AppConfig;
use crate::dashboard::{Dashboard, HeaderAction};
use crate::storage::SharedStore;
use crate::theme::{ColorSchemeQuery, ThemeService};
use crate::ui::{Palette, Rect, UiContext};
use crate::viewer::FileBatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Login,
    Signup,
    Dashboard,
}

pub struct AppState {
    pub config: AppConfig,
    pub store: SharedStore,
    pub theme: ThemeService,
    pub auth: AuthController,
    route: Route,
    login_screen: LoginScreen,
    signup_screen: SignupScreen,
    dashboard: Option<Dashboard>,
    /// Files from the command line, opened once the dashboard is shown
    pending_files: Option<FileBatch>,
}

impl AppState {
    pub fn new(config: AppConfig, store: SharedStore, backend: Arc<dyn AuthBackend>) -> Self {
        let theme = ThemeService::new(store.clone(), ColorSchemeQuery::new(config.prefers_dark));
        let auth = AuthController::new(backend, store.clone());
        Self {
            config,
            store,
            theme,
            auth,
            route: Route::default(),
            login_screen: LoginScreen::default(),
            signup_screen: SignupScreen::default(),
            dashboard: None,
            pending_files: None,
        }
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn dashboard(&self) -> Option<&Dashboard> {
        self.dashboard.as_ref()
    }

    /// Hold `batch` until the dashboard opens
    pub fn queue_files(&mut self, batch: FileBatch) {
        if !batch.is_empty() {
            self.pending_files = Some(batch);
        }
    }

    pub fn navigate(&mut self, route: Route) {
        if route == self.route {
            return;
        }
        tracing::debug!(from = ?self.route, to = ?route, "navigate");

        if self.route == Route::Dashboard {
            if let Some(mut dashboard) = self.dashboard.take() {
                dashboard.teardown();
            }
        }
        if route == Route::Dashboard {
            let mut dashboard = Dashboard::new(&self.config, self.store.clone(), &mut self.theme);
            if let Some(batch) = self.pending_files.take() {
                dashboard.open_batch(batch);
            }
            self.dashboard = Some(dashboard);
        }
        self.route = route;
    }

    /// Apply finished background work
    pub fn update(&mut self) {
        if let Some(route) = self.auth.poll() {
            self.navigate(route);
        }
        if let Some(dashboard) = self.dashboard.as_mut() {
            dashboard.poll();
        }
    }

    pub fn palette(&self) -> Palette {
        Palette::for_root(self.theme.root())
    }

    /// Draw the current page and act on its navigation
    pub fn draw(&mut self, ctx: &mut UiContext, screen: Rect) {
        let palette = self.palette();
        let next = match self.route {
            Route::Login => draw_login(ctx, screen, &mut self.login_screen, &mut self.auth, &palette),
            Route::Signup => draw_signup(ctx, screen, &mut self.signup_screen, &mut self.auth, &palette),
            Route::Dashboard => {
                let username = self.auth.username().unwrap_or("User");
                match self.dashboard.as_mut() {
                    Some(dashboard) => match dashboard.draw(ctx, screen, &mut self.theme, username, &palette) {
                        Some(HeaderAction::Logout) => Some(self.auth.logout()),
                        None => None,
                    },
                    None => None,
                }
            }
        };
        if let Some(route) = next {
            self.navigate(route);
        }
    }

    /// Stop the viewer's frame loop before exit
    pub fn shutdown(&mut self) {
        if let Some(dashboard) = self.dashboard.as_mut() {
            dashboard.teardown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthError, LoginRequest, LoginResponse, SignupRequest};
    use crate::storage::{shared, LocalStore};
    use crate::viewer::{BatchFile, ViewerState};

    struct NoBackend;

    impl AuthBackend for NoBackend {
        fn login(&self, _: &LoginRequest) -> Result<LoginResponse, AuthError> {
            Err(AuthError::Transport("offline".into()))
        }

        fn signup(&self, _: &SignupRequest) -> Result<(), AuthError> {
            Err(AuthError::Transport("offline".into()))
        }
    }

    fn app() -> AppState {
        let config = AppConfig {
            prefers_dark: Some(false),
            ..AppConfig::default()
        };
        AppState::new(config, shared(LocalStore::in_memory()), Arc::new(NoBackend))
    }

    #[test]
    fn test_dashboard_lifecycle() {
        let mut app = app();
        assert_eq!(app.route(), Route::Login);
        assert!(app.dashboard().is_none());

        app.navigate(Route::Dashboard);
        assert!(app.dashboard().is_some_and(|d| d.viewer.is_running()));
        assert_eq!(app.theme.subscriber_count(), 1);

        app.navigate(Route::Login);
        assert!(app.dashboard().is_none());
        assert_eq!(app.theme.subscriber_count(), 0);
    }

    #[test]
    fn test_cli_files_open_with_dashboard() {
        let mut app = app();
        app.queue_files(FileBatch::new(vec![BatchFile::from_bytes("notes.txt", vec![1u8, 2, 3])]));
        app.navigate(Route::Signup);
        app.navigate(Route::Dashboard);

        let viewer = &app.dashboard().expect("dashboard open").viewer;
        assert_eq!(viewer.state(), ViewerState::Empty);
        assert_eq!(viewer.error_message(), Some(crate::viewer::loader::MSG_REJECTED));
    }
}
