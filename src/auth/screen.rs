//! Login and signup screens
//!
//! Widget state lives here; the authoritative values live in the forms owned by
//! `AuthController`. Each frame the widgets are re-synced from the forms so a
//! reset after a successful submit clears the inputs too.

use macroquad::prelude::*;

use super::{AuthController, Field, FieldError, LoginField, SignupField};
use crate::app::Route;
use crate::ui::{
    button, button_enabled, draw_rounded_rect, label, label_centered, text_field, ButtonStyle, Column, Palette, Rect,
    TextInputState, UiContext, FONT_SIZE_CONTENT, FONT_SIZE_SMALL, FONT_SIZE_TITLE,
};

const CARD_WIDTH: f32 = 380.0;
const FIELD_HEIGHT: f32 = 38.0;
const BUTTON_HEIGHT: f32 = 40.0;
const ERROR_ROW: f32 = 16.0;

pub struct LoginScreen {
    username: TextInputState,
    password: TextInputState,
}

impl Default for LoginScreen {
    fn default() -> Self {
        Self {
            username: TextInputState::default(),
            password: TextInputState::password(),
        }
    }
}

pub struct SignupScreen {
    username: TextInputState,
    email: TextInputState,
    password: TextInputState,
    full_name: TextInputState,
}

impl Default for SignupScreen {
    fn default() -> Self {
        Self {
            username: TextInputState::default(),
            email: TextInputState::default(),
            password: TextInputState::password(),
            full_name: TextInputState::default(),
        }
    }
}

/// Pull the form value into the widget when they diverge
fn sync_from_form(state: &mut TextInputState, field: &Field) {
    if state.text != field.value {
        state.set_text(field.value.clone());
    }
}

/// Card background of `height`, centered in `area`
fn card(area: Rect, height: f32, palette: &Palette) -> Rect {
    let card = area.centered(CARD_WIDTH, height);
    draw_rounded_rect(card.x, card.y, card.w, card.h, 10.0, palette.surface);
    draw_rectangle_lines(card.x, card.y, card.w, card.h, 1.0, palette.border);
    card
}

fn heading(col: &mut Column, title: &str, subtitle: &str, palette: &Palette) {
    label_centered(title, col.row(FONT_SIZE_TITLE + 4.0), FONT_SIZE_TITLE, palette.text);
    label_centered(subtitle, col.row(FONT_SIZE_CONTENT + 4.0), FONT_SIZE_CONTENT, palette.text_dim);
    col.skip(8.0);
}

/// Caption, input and (when visible) the field's error. Returns true on Enter.
#[allow(clippy::too_many_arguments)]
fn form_field(
    ctx: &mut UiContext,
    col: &mut Column,
    caption: &str,
    placeholder: &str,
    state: &mut TextInputState,
    field: &mut Field,
    error: Option<FieldError>,
    palette: &Palette,
) -> bool {
    let caption_row = col.row(FONT_SIZE_SMALL + 2.0);
    label(caption, caption_row.x, caption_row.y, FONT_SIZE_SMALL, palette.text_dim);

    let rect = col.row(FIELD_HEIGHT);
    let response = text_field(ctx, rect, state, placeholder, palette, FONT_SIZE_CONTENT);
    if response.changed {
        field.value = state.text.clone();
    }
    if response.blurred {
        field.touched = true;
    }

    if let Some(err) = error {
        let row = col.row(ERROR_ROW);
        label(&err.message(caption), row.x, row.y, FONT_SIZE_SMALL, palette.error);
    }
    response.submitted
}

/// A centered message line in `color`
fn message(col: &mut Column, text: &str, color: Color) {
    label_centered(text, col.row(FONT_SIZE_CONTENT + 6.0), FONT_SIZE_CONTENT, color);
}

/// Draw the login screen. Returns a route when the user follows the signup link.
pub fn draw_login(
    ctx: &mut UiContext,
    area: Rect,
    screen: &mut LoginScreen,
    auth: &mut AuthController,
    palette: &Palette,
) -> Option<Route> {
    sync_from_form(&mut screen.username, &auth.login.username);
    sync_from_form(&mut screen.password, &auth.login.password);

    let errors = [LoginField::Username, LoginField::Password]
        .iter()
        .filter(|f| auth.login.visible_error(**f).is_some())
        .count() as f32;
    let extra = [auth.notice.is_some(), auth.login_error.is_some()].iter().filter(|b| **b).count() as f32;
    let height = 300.0 + errors * (ERROR_ROW + 10.0) + extra * 30.0;
    let card = card(area, height, palette);
    let mut col = Column::new(card.pad(28.0), 10.0);

    heading(&mut col, "PixelPulse", "Sign in to your account", palette);

    if let Some(notice) = auth.notice.as_deref() {
        message(&mut col, notice, palette.success);
    }

    let username_error = auth.login.visible_error(LoginField::Username);
    let password_error = auth.login.visible_error(LoginField::Password);
    let mut submit = form_field(
        ctx,
        &mut col,
        "Username",
        "Enter your username",
        &mut screen.username,
        &mut auth.login.username,
        username_error,
        palette,
    );
    submit |= form_field(
        ctx,
        &mut col,
        "Password",
        "Enter your password",
        &mut screen.password,
        &mut auth.login.password,
        password_error,
        palette,
    );

    if let Some(err) = auth.login_error.as_deref() {
        message(&mut col, err, palette.error);
    }

    col.skip(6.0);
    let pending = auth.is_pending();
    let caption = if pending { "Signing in..." } else { "Login" };
    submit |= button_enabled(ctx, col.row(BUTTON_HEIGHT), caption, ButtonStyle::Primary, palette, !pending);
    if submit && !pending {
        auth.submit_login();
    }

    if button(ctx, col.row(28.0), "Don't have an account? Sign up", ButtonStyle::Flat, palette) {
        auth.notice = None;
        return Some(Route::Signup);
    }
    None
}

/// Draw the signup screen. Returns a route when the user follows the login link.
pub fn draw_signup(
    ctx: &mut UiContext,
    area: Rect,
    screen: &mut SignupScreen,
    auth: &mut AuthController,
    palette: &Palette,
) -> Option<Route> {
    sync_from_form(&mut screen.username, &auth.signup.username);
    sync_from_form(&mut screen.email, &auth.signup.email);
    sync_from_form(&mut screen.password, &auth.signup.password);
    sync_from_form(&mut screen.full_name, &auth.signup.full_name);

    let errors = super::SignupForm::FIELDS
        .iter()
        .filter(|f| auth.signup.visible_error(**f).is_some())
        .count() as f32;
    let extra = if auth.signup_error.is_some() { 30.0 } else { 0.0 };
    let height = 440.0 + errors * (ERROR_ROW + 10.0) + extra;
    let card = card(area, height, palette);
    let mut col = Column::new(card.pad(28.0), 10.0);

    heading(&mut col, "PixelPulse", "Create your account", palette);

    let form = &mut auth.signup;
    let username_error = form.visible_error(SignupField::Username);
    let email_error = form.visible_error(SignupField::Email);
    let password_error = form.visible_error(SignupField::Password);
    let full_name_error = form.visible_error(SignupField::FullName);

    let mut submit = form_field(
        ctx,
        &mut col,
        "Username",
        "Choose a username",
        &mut screen.username,
        &mut form.username,
        username_error,
        palette,
    );
    submit |= form_field(
        ctx,
        &mut col,
        "Email",
        "you@example.com",
        &mut screen.email,
        &mut form.email,
        email_error,
        palette,
    );
    submit |= form_field(
        ctx,
        &mut col,
        "Password",
        "At least 6 characters",
        &mut screen.password,
        &mut form.password,
        password_error,
        palette,
    );
    submit |= form_field(
        ctx,
        &mut col,
        "Full name",
        "Optional",
        &mut screen.full_name,
        &mut form.full_name,
        full_name_error,
        palette,
    );

    if let Some(err) = auth.signup_error.as_deref() {
        message(&mut col, err, palette.error);
    }

    col.skip(6.0);
    let pending = auth.is_pending();
    let caption = if pending { "Creating account..." } else { "Sign up" };
    submit |= button_enabled(ctx, col.row(BUTTON_HEIGHT), caption, ButtonStyle::Primary, palette, !pending);
    if submit && !pending {
        auth.submit_signup();
    }

    if button(ctx, col.row(28.0), "Already have an account? Log in", ButtonStyle::Flat, palette) {
        return Some(Route::Login);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_resyncs_after_form_reset() {
        let mut state = TextInputState::new("ada");
        let field = Field::default();
        sync_from_form(&mut state, &field);
        assert_eq!(state.text, "");
        assert_eq!(state.cursor, 0);

        let field = Field {
            value: "grace".into(),
            touched: true,
        };
        sync_from_form(&mut state, &field);
        assert_eq!(state.text, "grace");
        assert_eq!(state.cursor, 5);
    }
}
