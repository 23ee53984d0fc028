//! Frame - the renderer adapter
//!
//! A read-only snapshot of the visible viewport, flattened into the draw
//! planes a surface consumes: one byte, foreground index, background index,
//! and selection flag per cell. Rows come from scrollback when the viewport
//! is scrolled up, then from the active grid.

use tern_core::cell::{DEFAULT_BG, DEFAULT_FG};
use tern_core::screen::Screen;

/// Draw directives for one repaint, in row-major order
#[derive(Debug, Clone)]
pub struct Frame {
    pub cols: usize,
    pub rows: usize,
    /// Cell bytes; 0 means nothing to draw
    pub cells: Vec<u8>,
    /// Foreground palette indices, already wrapped into 0-15
    pub fg: Vec<u8>,
    /// Background palette indices, already wrapped into 0-15
    pub bg: Vec<u8>,
    /// Selection mask; selected cells draw with the selection colours
    pub selected: Vec<bool>,
}

impl Frame {
    /// Snapshot the visible viewport of a screen
    pub fn snapshot(screen: &Screen) -> Self {
        let cols = screen.width();
        let rows = screen.height();
        let cells_len = cols * rows;

        let mut frame = Frame {
            cols,
            rows,
            cells: vec![0; cells_len],
            fg: vec![DEFAULT_FG; cells_len],
            bg: vec![DEFAULT_BG; cells_len],
            selected: vec![false; cells_len],
        };

        let scrollback_len = screen.scrollback().len() as isize;
        // Offset 0 puts the grid bottom at the viewport bottom; negative
        // offsets slide the window up into scrollback.
        let first_line = (scrollback_len + screen.scroll_offset()).max(0) as usize;

        for r in 0..rows {
            let line = first_line + r;
            let Some(row) = screen.row_at_line(line) else {
                continue;
            };
            // Selection coordinates use the virtual-row transform of the
            // pointer path, which folds the scroll offset in the other
            // direction; both agree whenever the viewport is at the bottom.
            let sel_line = (r as isize + scrollback_len - screen.scroll_offset()) as usize;
            let span = screen.selection_span(sel_line);

            for c in 0..cols {
                let Some(cell) = row.get(c) else {
                    break;
                };
                let idx = r * cols + c;
                frame.cells[idx] = cell.ch;
                frame.fg[idx] = cell.fg % 16;
                frame.bg[idx] = cell.bg % 16;
                frame.selected[idx] = matches!(span, Some((first, last)) if c >= first && c <= last);
            }
        }

        frame
    }

    /// Cell byte at a viewport position
    pub fn cell(&self, row: usize, col: usize) -> u8 {
        self.cells[row * self.cols + col]
    }

    /// Text of a viewport row, empty cells as spaces, right-trimmed
    pub fn row_text(&self, row: usize) -> String {
        let mut s: String = self.cells[row * self.cols..(row + 1) * self.cols]
            .iter()
            .map(|&b| if b == 0 { ' ' } else { b as char })
            .collect();
        let trimmed = s.trim_end().len();
        s.truncate(trimmed);
        s
    }
}
