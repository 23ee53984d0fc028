//! Window events
//!
//! Platform-agnostic events delivered by the window collaborator, plus the
//! font metrics needed to map pixel coordinates onto cells.

pub use tern_core::input::{Key, Modifiers};

/// Mouse button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// Scroll direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

/// Font cell dimensions and window border, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metrics {
    pub font_width: u32,
    pub font_height: u32,
    pub border: u32,
}

impl Metrics {
    /// Map a pixel position to a (row, col) cell position. Positions inside
    /// the border clamp to the first row/column.
    pub fn cell_at(&self, x: i32, y: i32) -> (usize, usize) {
        let col = (x.max(self.border as i32) as u32 - self.border) / self.font_width;
        let row = (y.max(self.border as i32) as u32 - self.border) / self.font_height;
        (row as usize, col as usize)
    }

    /// Grid dimensions that fit in a window of the given pixel size
    pub fn grid_size(&self, width: u32, height: u32) -> (usize, usize) {
        let cols = width.saturating_sub(2 * self.border) / self.font_width;
        let rows = height.saturating_sub(2 * self.border) / self.font_height;
        (cols.max(1) as usize, rows.max(1) as usize)
    }
}

/// Input event types delivered by the window collaborator
#[derive(Debug, Clone)]
pub enum WindowEvent {
    /// The window contents need redrawing
    Expose,
    /// The window was resized to a new pixel size
    Resize { width: u32, height: u32 },
    /// Key was pressed. `text` carries the collaborator's byte translation
    /// of the key, when it has one.
    KeyPress {
        key: Option<Key>,
        modifiers: Modifiers,
        text: Vec<u8>,
    },
    /// Mouse button pressed
    ButtonPress { button: MouseButton, x: i32, y: i32 },
    /// Mouse button released
    ButtonRelease { button: MouseButton, x: i32, y: i32 },
    /// Mouse moved
    PointerMotion { x: i32, y: i32 },
    /// Mouse wheel
    Scroll {
        direction: ScrollDirection,
        x: i32,
        y: i32,
    },
    /// The clipboard answered an earlier paste request
    SelectionProvide { data: Vec<u8> },
}

#[cfg(test)]
mod tests {
    use super::*;

    const METRICS: Metrics = Metrics {
        font_width: 10,
        font_height: 20,
        border: 20,
    };

    #[test]
    fn test_cell_at() {
        assert_eq!(METRICS.cell_at(20, 20), (0, 0));
        assert_eq!(METRICS.cell_at(35, 62), (2, 1));
    }

    #[test]
    fn test_cell_at_inside_border() {
        assert_eq!(METRICS.cell_at(0, 0), (0, 0));
        assert_eq!(METRICS.cell_at(-5, 3), (0, 0));
    }

    #[test]
    fn test_grid_size() {
        // 840x520 window, 20px border: 800x480 usable, 80x24 cells.
        assert_eq!(METRICS.grid_size(840, 520), (80, 24));
        // Degenerate sizes keep at least one cell.
        assert_eq!(METRICS.grid_size(10, 10), (1, 1));
    }
}
