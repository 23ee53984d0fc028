//! Headless surface
//!
//! The shipped binary has no window system; this surface satisfies the
//! session's collaborator seam by keeping the last frame and an in-memory
//! clipboard. GUI backends replace it with a real implementation.

use tern_ui::{Frame, Metrics, Surface};

/// A surface with no output device
#[derive(Debug)]
pub struct HeadlessSurface {
    metrics: Metrics,
    /// Most recently drawn frame
    pub last_frame: Option<Frame>,
    /// In-memory stand-in for the system clipboard
    pub clipboard: Option<Vec<u8>>,
    /// Number of frames drawn
    pub frames_drawn: usize,
}

impl HeadlessSurface {
    pub fn new(metrics: Metrics) -> Self {
        Self {
            metrics,
            last_frame: None,
            clipboard: None,
            frames_drawn: 0,
        }
    }
}

impl Surface for HeadlessSurface {
    fn metrics(&self) -> Metrics {
        self.metrics
    }

    fn draw(&mut self, frame: &Frame) {
        log::trace!("frame {}x{}", frame.cols, frame.rows);
        self.last_frame = Some(frame.clone());
        self.frames_drawn += 1;
    }

    fn clipboard_set(&mut self, data: &[u8]) {
        self.clipboard = Some(data.to_vec());
    }

    fn clipboard_get(&mut self) {
        // No provider: the paste request goes unanswered, exactly as when a
        // real clipboard holds no selection.
    }
}
