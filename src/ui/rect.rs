//! Rectangle type for UI layout

/// A rectangle defined by position and size
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Create from screen dimensions
    pub fn screen(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.w * 0.5
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.h * 0.5
    }

    /// Check if point is inside
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Shrink by padding on all sides
    pub fn pad(&self, padding: f32) -> Self {
        Self::new(
            self.x + padding,
            self.y + padding,
            (self.w - padding * 2.0).max(0.0),
            (self.h - padding * 2.0).max(0.0),
        )
    }

    /// A `w` x `h` rect centered inside this one
    pub fn centered(&self, w: f32, h: f32) -> Self {
        let w = w.min(self.w);
        let h = h.min(self.h);
        Self::new(self.center_x() - w * 0.5, self.center_y() - h * 0.5, w, h)
    }

    /// Largest rect with the given aspect ratio that fits, centered
    #[cfg(test)]
    pub fn letterbox(&self, aspect: f32) -> Self {
        if aspect <= 0.0 || self.h <= 0.0 {
            return *self;
        }
        if self.w / self.h > aspect {
            self.centered(self.h * aspect, self.h)
        } else {
            self.centered(self.w, self.w / aspect)
        }
    }

    /// Split horizontally at fixed pixel position from left
    pub fn split_h_px(&self, pixels: f32) -> (Self, Self) {
        let split_x = pixels.clamp(0.0, self.w);
        (
            Self::new(self.x, self.y, split_x, self.h),
            Self::new(self.x + split_x, self.y, self.w - split_x, self.h),
        )
    }

    /// Get a horizontal slice (for the header bar)
    pub fn slice_top(&self, height: f32) -> Self {
        Self::new(self.x, self.y, self.w, height.min(self.h))
    }

    /// Get remaining area after slicing top
    pub fn remaining_after_top(&self, height: f32) -> Self {
        let h = height.min(self.h);
        Self::new(self.x, self.y + h, self.w, self.h - h)
    }
}

/// Top-to-bottom layout cursor for forms and panels
#[derive(Debug, Clone, Copy)]
pub struct Column {
    area: Rect,
    cursor_y: f32,
    pub spacing: f32,
}

impl Column {
    pub fn new(area: Rect, spacing: f32) -> Self {
        Self {
            area,
            cursor_y: area.y,
            spacing,
        }
    }

    /// Take the next full-width row of `height`
    pub fn row(&mut self, height: f32) -> Rect {
        let r = Rect::new(self.area.x, self.cursor_y, self.area.w, height);
        self.cursor_y += height + self.spacing;
        r
    }

    pub fn skip(&mut self, height: f32) {
        self.cursor_y += height;
    }

    #[cfg(test)]
    pub fn used_height(&self) -> f32 {
        (self.cursor_y - self.area.y - self.spacing).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert!(r.contains(50.0, 40.0));
        assert!(!r.contains(5.0, 40.0));
        assert!(!r.contains(50.0, 100.0));
    }

    #[test]
    fn test_letterbox() {
        let r = Rect::new(0.0, 0.0, 400.0, 100.0);
        let lb = r.letterbox(2.0);
        assert_eq!(lb, Rect::new(100.0, 0.0, 200.0, 100.0));

        let tall = Rect::new(0.0, 0.0, 100.0, 400.0).letterbox(1.0);
        assert_eq!(tall, Rect::new(0.0, 150.0, 100.0, 100.0));
    }

    #[test]
    fn test_column_rows() {
        let mut col = Column::new(Rect::new(0.0, 10.0, 200.0, 500.0), 8.0);
        let a = col.row(30.0);
        let b = col.row(20.0);
        assert_eq!(a.y, 10.0);
        assert_eq!(b.y, 48.0);
        assert_eq!(col.used_height(), 58.0);
    }
}
