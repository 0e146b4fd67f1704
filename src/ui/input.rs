//! Input state for UI interaction

use macroquad::prelude::*;

use super::Rect;

/// Mouse button state
#[derive(Debug, Clone, Copy, Default)]
pub struct MouseState {
    pub x: f32,
    pub y: f32,
    /// Movement since last frame
    pub dx: f32,
    pub dy: f32,
    pub left_down: bool,
    pub right_down: bool,
    pub left_pressed: bool,  // Just pressed this frame
    pub right_pressed: bool,
    pub scroll: f32, // Scroll wheel delta
}

impl MouseState {
    /// Read this frame's mouse from macroquad
    pub fn capture(previous: &MouseState) -> Self {
        let (x, y) = mouse_position();
        let (_, wheel) = mouse_wheel();
        Self {
            x,
            y,
            dx: x - previous.x,
            dy: y - previous.y,
            left_down: is_mouse_button_down(MouseButton::Left),
            right_down: is_mouse_button_down(MouseButton::Right),
            left_pressed: is_mouse_button_pressed(MouseButton::Left),
            right_pressed: is_mouse_button_pressed(MouseButton::Right),
            scroll: wheel,
        }
    }

    /// Check if mouse is inside a rect
    pub fn inside(&self, rect: &Rect) -> bool {
        rect.contains(self.x, self.y)
    }

    /// Check if mouse just clicked inside a rect
    pub fn clicked(&self, rect: &Rect) -> bool {
        self.left_pressed && rect.contains(self.x, self.y)
    }
}

/// UI context passed through the frame
///
/// Widget IDs come from a per-frame counter, so they are stable as long as
/// widgets are drawn in the same order every frame.
pub struct UiContext {
    pub mouse: MouseState,
    /// ID of the widget currently being dragged (if any)
    pub dragging: Option<u64>,
    /// ID of the widget that is "hot" (mouse hovering)
    pub hot: Option<u64>,
    /// Text field receiving keyboard input
    pub focused: Option<u64>,
    /// Focusable widgets in draw order, for Tab cycling
    focus_chain: Vec<u64>,
    focus_claimed: bool,
    tab_pressed: bool,
    shift_down: bool,
    /// Counter for generating unique IDs
    id_counter: u64,
}

impl UiContext {
    pub fn new() -> Self {
        Self {
            mouse: MouseState::default(),
            dragging: None,
            hot: None,
            focused: None,
            focus_chain: Vec::new(),
            focus_claimed: false,
            tab_pressed: false,
            shift_down: false,
            id_counter: 0,
        }
    }

    /// Generate a unique ID for a widget
    pub fn next_id(&mut self) -> u64 {
        self.id_counter += 1;
        self.id_counter
    }

    /// Reset at start of frame (call before UI code)
    pub fn begin_frame(&mut self, mouse: MouseState, tab_pressed: bool, shift_down: bool) {
        self.mouse = mouse;
        self.hot = None;
        self.id_counter = 0;
        self.focus_chain.clear();
        self.focus_claimed = false;
        self.tab_pressed = tab_pressed;
        self.shift_down = shift_down;

        // Clear dragging if mouse released
        if !self.mouse.left_down {
            self.dragging = None;
        }
    }

    /// Apply focus changes gathered during the frame
    pub fn end_frame(&mut self) {
        if self.mouse.left_pressed && !self.focus_claimed {
            self.focused = None;
        }
        if self.tab_pressed && !self.focus_chain.is_empty() {
            let n = self.focus_chain.len();
            let pos = self.focused.and_then(|f| self.focus_chain.iter().position(|&id| id == f));
            let next = match (pos, self.shift_down) {
                (Some(p), false) => (p + 1) % n,
                (Some(p), true) => (p + n - 1) % n,
                (None, false) => 0,
                (None, true) => n - 1,
            };
            self.focused = Some(self.focus_chain[next]);
        }
    }

    /// Register a focusable widget; returns whether it has focus
    pub fn focusable(&mut self, id: u64, rect: &Rect) -> bool {
        self.focus_chain.push(id);
        if self.mouse.clicked(rect) {
            self.focused = Some(id);
            self.focus_claimed = true;
        }
        self.focused == Some(id)
    }

    /// Keyboard-driven widgets should ignore typed characters this frame
    pub fn tab_pressed(&self) -> bool {
        self.tab_pressed
    }

    /// Check if this widget is being dragged
    pub fn is_dragging(&self, id: u64) -> bool {
        self.dragging == Some(id)
    }

    /// Start dragging a widget
    pub fn start_drag(&mut self, id: u64) {
        self.dragging = Some(id);
    }

    /// Set hot widget (hovering)
    pub fn set_hot(&mut self, id: u64) {
        // Only set hot if not dragging something else
        if self.dragging.is_none() || self.dragging == Some(id) {
            self.hot = Some(id);
        }
    }

    /// Check if widget is hot
    pub fn is_hot(&self, id: u64) -> bool {
        self.hot == Some(id)
    }

    /// True when the pointer is over any widget or a drag is in progress
    pub fn pointer_captured(&self) -> bool {
        self.hot.is_some() || self.dragging.is_some()
    }
}

impl Default for UiContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(ctx: &mut UiContext, mouse: MouseState, tab: bool, fields: usize) -> Vec<u64> {
        ctx.begin_frame(mouse, tab, false);
        let ids: Vec<u64> = (0..fields)
            .map(|i| {
                let id = ctx.next_id();
                ctx.focusable(id, &Rect::new(0.0, i as f32 * 40.0, 100.0, 30.0));
                id
            })
            .collect();
        ctx.end_frame();
        ids
    }

    #[test]
    fn test_click_focuses_and_tab_cycles() {
        let mut ctx = UiContext::new();
        let click_second = MouseState {
            x: 10.0,
            y: 45.0,
            left_pressed: true,
            left_down: true,
            ..MouseState::default()
        };
        let ids = frame(&mut ctx, click_second, false, 3);
        assert_eq!(ctx.focused, Some(ids[1]));

        frame(&mut ctx, MouseState::default(), true, 3);
        assert_eq!(ctx.focused, Some(ids[2]));
        frame(&mut ctx, MouseState::default(), true, 3);
        assert_eq!(ctx.focused, Some(ids[0]));
    }

    #[test]
    fn test_click_outside_clears_focus() {
        let mut ctx = UiContext::new();
        frame(&mut ctx, MouseState::default(), true, 2);
        assert!(ctx.focused.is_some());
        let click_away = MouseState {
            x: 500.0,
            y: 500.0,
            left_pressed: true,
            ..MouseState::default()
        };
        frame(&mut ctx, click_away, false, 2);
        assert_eq!(ctx.focused, None);
    }
}
