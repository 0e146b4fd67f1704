//! Per-frame callback registration

/// Registration of the viewer's per-frame update
///
/// Active from construction until `teardown`, which cancels it exactly once.
#[derive(Debug)]
pub struct FrameLoop {
    active: bool,
    frames: u64,
}

impl FrameLoop {
    pub fn register() -> Self {
        tracing::debug!("frame loop registered");
        Self { active: true, frames: 0 }
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Count a frame. Returns false once torn down.
    pub fn tick(&mut self) -> bool {
        if self.active {
            self.frames += 1;
        }
        self.active
    }

    #[cfg(test)]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Cancel the loop. Returns true only for the call that cancelled it.
    pub fn teardown(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        tracing::debug!(frames = self.frames, "frame loop cancelled");
        true
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teardown_once() {
        let mut frame_loop = FrameLoop::register();
        assert!(frame_loop.tick());
        assert!(frame_loop.teardown());
        assert!(!frame_loop.teardown());
        assert!(!frame_loop.tick());
        assert_eq!(frame_loop.frames(), 1);
    }
}
