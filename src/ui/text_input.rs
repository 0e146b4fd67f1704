//! Single-line text field with cursor, selection and password masking

use macroquad::prelude::*;

use super::{Palette, Rect, UiContext};

const MASK_CHAR: char = '•';

/// Editing state for a text field
#[derive(Debug, Clone, Default)]
pub struct TextInputState {
    /// The text content
    pub text: String,
    /// Cursor position (byte index)
    pub cursor: usize,
    /// Selection start (byte index), if selecting
    pub selection_start: Option<usize>,
    /// Blink timer for cursor
    pub blink_timer: f32,
    /// Render as mask characters
    pub masked: bool,
}

impl TextInputState {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.len();
        Self {
            text,
            cursor,
            ..Self::default()
        }
    }

    pub fn password() -> Self {
        Self {
            masked: true,
            ..Self::default()
        }
    }

    /// Replace the content, cursor at end
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.len();
        self.selection_start = None;
    }

    /// Text as drawn: masked fields show one mask per character
    pub fn display_text(&self) -> String {
        if self.masked {
            self.text.chars().map(|_| MASK_CHAR).collect()
        } else {
            self.text.clone()
        }
    }

    /// Byte offset in `display_text` matching byte offset `i` in `text`
    fn display_offset(&self, i: usize) -> usize {
        if self.masked {
            self.text[..i].chars().count() * MASK_CHAR.len_utf8()
        } else {
            i
        }
    }

    /// Get selected text range (start, end) in sorted order
    pub fn selection_range(&self) -> Option<(usize, usize)> {
        self.selection_start.map(|start| {
            if start < self.cursor {
                (start, self.cursor)
            } else {
                (self.cursor, start)
            }
        })
    }

    pub fn has_selection(&self) -> bool {
        self.selection_start.is_some() && self.selection_start != Some(self.cursor)
    }

    fn delete_selection(&mut self) {
        if let Some((start, end)) = self.selection_range() {
            self.text.drain(start..end);
            self.cursor = start;
            self.selection_start = None;
        }
    }

    fn prev_boundary(&self) -> usize {
        self.text[..self.cursor].char_indices().next_back().map(|(i, _)| i).unwrap_or(0)
    }

    fn next_boundary(&self) -> usize {
        self.text[self.cursor..]
            .char_indices()
            .nth(1)
            .map(|(i, _)| self.cursor + i)
            .unwrap_or(self.text.len())
    }

    fn begin_move(&mut self, extend_selection: bool) {
        if extend_selection && self.selection_start.is_none() {
            self.selection_start = Some(self.cursor);
        }
    }

    fn end_move(&mut self, extend_selection: bool) {
        if !extend_selection {
            self.selection_start = None;
        }
    }

    pub fn move_left(&mut self, extend_selection: bool) {
        if !extend_selection {
            if let Some((start, _)) = self.selection_range() {
                self.cursor = start;
                self.selection_start = None;
                return;
            }
        }
        self.begin_move(extend_selection);
        self.cursor = self.prev_boundary();
        self.end_move(extend_selection);
    }

    pub fn move_right(&mut self, extend_selection: bool) {
        if !extend_selection {
            if let Some((_, end)) = self.selection_range() {
                self.cursor = end;
                self.selection_start = None;
                return;
            }
        }
        self.begin_move(extend_selection);
        self.cursor = self.next_boundary();
        self.end_move(extend_selection);
    }

    pub fn move_home(&mut self, extend_selection: bool) {
        self.begin_move(extend_selection);
        self.cursor = 0;
        self.end_move(extend_selection);
    }

    pub fn move_end(&mut self, extend_selection: bool) {
        self.begin_move(extend_selection);
        self.cursor = self.text.len();
        self.end_move(extend_selection);
    }

    pub fn select_all(&mut self) {
        self.selection_start = Some(0);
        self.cursor = self.text.len();
    }

    /// Insert a character at cursor, replacing selection if any
    pub fn insert_char(&mut self, ch: char) {
        if self.has_selection() {
            self.delete_selection();
        }
        self.selection_start = None;
        self.text.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    /// Delete character before cursor (backspace)
    pub fn backspace(&mut self) {
        if self.has_selection() {
            self.delete_selection();
            return;
        }
        let prev = self.prev_boundary();
        self.text.drain(prev..self.cursor);
        self.cursor = prev;
    }

    /// Delete character after cursor (delete key)
    pub fn delete(&mut self) {
        if self.has_selection() {
            self.delete_selection();
            return;
        }
        let next = self.next_boundary();
        self.text.drain(self.cursor..next);
    }

    /// Handle keyboard input, returns true if text changed
    fn handle_input(&mut self) -> bool {
        let old_len = self.text.len();
        let old_cursor = self.cursor;
        let mut edited = false;
        self.blink_timer += get_frame_time();

        let shift = is_key_down(KeyCode::LeftShift) || is_key_down(KeyCode::RightShift);
        let ctrl = is_key_down(KeyCode::LeftControl)
            || is_key_down(KeyCode::RightControl)
            || is_key_down(KeyCode::LeftSuper)
            || is_key_down(KeyCode::RightSuper);

        if is_key_pressed(KeyCode::Left) {
            self.move_left(shift);
        }
        if is_key_pressed(KeyCode::Right) {
            self.move_right(shift);
        }
        if is_key_pressed(KeyCode::Home) {
            self.move_home(shift);
        }
        if is_key_pressed(KeyCode::End) {
            self.move_end(shift);
        }
        if ctrl && is_key_pressed(KeyCode::A) {
            self.select_all();
        }
        if is_key_pressed(KeyCode::Backspace) {
            self.backspace();
            edited = true;
        }
        if is_key_pressed(KeyCode::Delete) {
            self.delete();
            edited = true;
        }

        while let Some(ch) = get_char_pressed() {
            // Filter control characters (Tab, Enter, Backspace arrive here too)
            if ch >= ' ' && ch != '\u{7f}' && !ctrl {
                self.insert_char(ch);
                edited = true;
            }
        }

        if edited || self.cursor != old_cursor {
            self.blink_timer = 0.0;
        }
        edited && (self.text.len() != old_len || self.cursor != old_cursor)
    }
}

/// What happened to a text field this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextFieldResponse {
    pub changed: bool,
    /// Enter pressed while focused
    pub submitted: bool,
    /// Lost focus this frame
    pub blurred: bool,
}

/// Draw a labelled text field and handle input when focused
pub fn text_field(
    ctx: &mut UiContext,
    rect: Rect,
    state: &mut TextInputState,
    placeholder: &str,
    palette: &Palette,
    font_size: f32,
) -> TextFieldResponse {
    let id = ctx.next_id();
    let was_focused = ctx.focused == Some(id);
    let focused = ctx.focusable(id, &rect);
    if ctx.mouse.inside(&rect) {
        ctx.set_hot(id);
    }

    let mut response = TextFieldResponse::default();
    if focused && !ctx.tab_pressed() {
        response.changed = state.handle_input();
        response.submitted = is_key_pressed(KeyCode::Enter) || is_key_pressed(KeyCode::KpEnter);
    }
    // Focus the click lands on is settled in end_frame, so report the blur
    // from the previous frame's owner
    response.blurred = was_focused && ctx.mouse.left_pressed && !ctx.mouse.inside(&rect);

    let border = if focused { palette.accent } else { palette.border };
    draw_rectangle(rect.x, rect.y, rect.w, rect.h, palette.input_bg);
    draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, if focused { 2.0 } else { 1.0 }, border);

    let padding = 10.0;
    let text_x = rect.x + padding;
    let text_y = rect.y + (rect.h + font_size * 0.7) / 2.0;
    let display = state.display_text();

    if display.is_empty() && !focused {
        draw_text(placeholder, text_x, text_y, font_size, palette.text_dim);
        return response;
    }

    if let Some((start, end)) = state.selection_range() {
        let (ds, de) = (state.display_offset(start), state.display_offset(end));
        let start_x = text_x + measure_text(&display[..ds], None, font_size as u16, 1.0).width;
        let sel_w = measure_text(&display[ds..de], None, font_size as u16, 1.0).width;
        let mut sel = palette.accent;
        sel.a = 0.35;
        draw_rectangle(start_x, rect.y + 4.0, sel_w, rect.h - 8.0, sel);
    }

    draw_text(&display, text_x, text_y, font_size, palette.text);

    if focused && (state.blink_timer % 1.0) < 0.5 {
        let offset = state.display_offset(state.cursor);
        let cursor_x = text_x + measure_text(&display[..offset], None, font_size as u16, 1.0).width;
        draw_line(cursor_x, rect.y + 6.0, cursor_x, rect.bottom() - 6.0, 1.5, palette.text);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_backspace_utf8() {
        let mut s = TextInputState::new("");
        for ch in "héllo".chars() {
            s.insert_char(ch);
        }
        assert_eq!(s.text, "héllo");
        s.move_left(false);
        s.move_left(false);
        s.move_left(false);
        s.backspace();
        assert_eq!(s.text, "hllo");
        assert_eq!(s.cursor, 1);
    }

    #[test]
    fn test_selection_replace() {
        let mut s = TextInputState::new("hello");
        s.move_home(true);
        assert!(s.has_selection());
        s.insert_char('x');
        assert_eq!(s.text, "x");
        assert_eq!(s.cursor, 1);
    }

    #[test]
    fn test_password_masking() {
        let mut s = TextInputState::password();
        s.set_text("pässword");
        assert_eq!(s.display_text().chars().count(), 8);
        assert!(s.display_text().chars().all(|c| c == MASK_CHAR));
        assert_eq!(s.display_offset(s.cursor), 8 * MASK_CHAR.len_utf8());
    }

    #[test]
    fn test_delete_at_end_is_noop() {
        let mut s = TextInputState::new("ab");
        s.delete();
        assert_eq!(s.text, "ab");
        s.move_home(false);
        s.delete();
        assert_eq!(s.text, "b");
    }
}
