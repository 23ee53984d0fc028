//! Screen - the terminal buffer manager
//!
//! Owns the primary and alternate grids (each with its own cursor), the
//! scrollback ring, the scroll region, the live style, terminal modes, and
//! the text selection. All escape-driven mutation funnels through here.

use crate::cell::{Cell, Style};
use crate::grid::{Grid, Row, MAX_COLS, MAX_ROWS};
use crate::scrollback::ScrollbackRing;

/// Cursor position (0-indexed)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub row: usize,
    pub col: usize,
}

/// Scroll region bounds, both rows inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRegion {
    pub top: usize,
    pub bottom: usize,
}

/// Mouse reporting modes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MouseMode {
    #[default]
    None,
    /// Normal tracking (DECSET 1000): button presses and releases
    Normal,
    /// Button-event tracking (DECSET 1002): presses, releases, drag motion
    ButtonEvent,
    /// Any-event tracking (DECSET 1003): presses, releases, all motion
    AnyEvent,
}

impl MouseMode {
    /// Whether button presses and releases are reported
    pub fn reports_buttons(&self) -> bool {
        !matches!(self, MouseMode::None)
    }

    /// Whether pointer motion is reported. Mode 1002 reports motion only
    /// while a button is held; 1003 reports it unconditionally.
    pub fn reports_motion(&self, button_held: bool) -> bool {
        match self {
            MouseMode::AnyEvent => true,
            MouseMode::ButtonEvent => button_held,
            _ => false,
        }
    }
}

/// Terminal modes that affect behavior
#[derive(Debug, Clone)]
pub struct TerminalModes {
    /// Auto-wrap at the right margin (DECAWM)
    pub auto_wrap: bool,
    /// Mouse reporting mode
    pub mouse_mode: MouseMode,
}

impl Default for TerminalModes {
    fn default() -> Self {
        Self {
            auto_wrap: true,
            mouse_mode: MouseMode::None,
        }
    }
}

/// Which screen is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenId {
    Primary,
    Alternate,
}

/// One screen: a grid, its cursor, and the wrap-pending latch set when a
/// byte lands in the last column
#[derive(Debug)]
struct Page {
    grid: Grid,
    cursor: Cursor,
    wrap_pending: bool,
}

impl Page {
    fn new(cols: usize, rows: usize) -> Self {
        Self {
            grid: Grid::new(cols, rows),
            cursor: Cursor::default(),
            wrap_pending: false,
        }
    }

    fn home(&mut self) {
        self.cursor = Cursor::default();
        self.wrap_pending = false;
    }
}

/// A point in the virtual selection coordinate space: lines
/// `[0, scrollback_len)` are scrollback rows (oldest first), lines from
/// `scrollback_len` upward are rows of the active grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPoint {
    pub line: usize,
    pub col: usize,
}

impl SelectionPoint {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// Text selection state
#[derive(Debug, Clone, Copy)]
pub struct Selection {
    /// Where the pointer was pressed
    pub anchor: SelectionPoint,
    /// Where the pointer is (or was released)
    pub end: SelectionPoint,
}

impl Selection {
    /// The endpoints ordered by line, top first
    fn ordered(&self) -> (SelectionPoint, SelectionPoint) {
        if self.anchor.line <= self.end.line {
            (self.anchor, self.end)
        } else {
            (self.end, self.anchor)
        }
    }
}

/// Terminal screen state
#[derive(Debug)]
pub struct Screen {
    primary: Page,
    alternate: Page,
    active: ScreenId,
    /// Retired primary rows, oldest first
    scrollback: ScrollbackRing,
    /// One shared saved-cursor pair serving both screens
    saved_cursor: Cursor,
    scroll_region: ScrollRegion,
    /// Style applied to bytes as they are written
    pub style: Style,
    /// Terminal modes
    pub modes: TerminalModes,
    /// Current selection, if any
    pub selection: Option<Selection>,
    /// True between pointer press and release
    pub selecting: bool,
    /// Viewport offset: 0 shows the grid bottom, negative values scroll
    /// into scrollback, bounded by -scrollback_len
    scroll_offset: isize,
    /// Whether content has changed since last render
    pub dirty: bool,
}

impl Screen {
    /// Create a new screen with the given dimensions
    pub fn new(cols: usize, rows: usize) -> Self {
        let cols = cols.clamp(1, MAX_COLS);
        let rows = rows.clamp(1, MAX_ROWS);
        Self {
            primary: Page::new(cols, rows),
            alternate: Page::new(cols, rows),
            active: ScreenId::Primary,
            scrollback: ScrollbackRing::default(),
            saved_cursor: Cursor::default(),
            scroll_region: ScrollRegion {
                top: 0,
                bottom: rows - 1,
            },
            style: Style::default(),
            modes: TerminalModes::default(),
            selection: None,
            selecting: false,
            scroll_offset: 0,
            dirty: true,
        }
    }

    fn active(&self) -> &Page {
        match self.active {
            ScreenId::Primary => &self.primary,
            ScreenId::Alternate => &self.alternate,
        }
    }

    fn active_mut(&mut self) -> &mut Page {
        match self.active {
            ScreenId::Primary => &mut self.primary,
            ScreenId::Alternate => &mut self.alternate,
        }
    }

    /// Get screen width
    pub fn width(&self) -> usize {
        self.primary.grid.width()
    }

    /// Get screen height
    pub fn height(&self) -> usize {
        self.primary.grid.height()
    }

    /// The active grid
    pub fn grid(&self) -> &Grid {
        &self.active().grid
    }

    /// Cursor of the active screen
    pub fn cursor(&self) -> Cursor {
        self.active().cursor
    }

    /// Whether the alternate screen is active
    pub fn is_alternate(&self) -> bool {
        self.active == ScreenId::Alternate
    }

    /// Scroll region
    pub fn scroll_region(&self) -> ScrollRegion {
        self.scroll_region
    }

    /// Scrollback ring
    pub fn scrollback(&self) -> &ScrollbackRing {
        &self.scrollback
    }

    /// Total addressable lines: scrollback plus the active grid
    pub fn total_lines(&self) -> usize {
        self.scrollback.len() + self.height()
    }

    /// Current viewport offset (always in `[-scrollback_len, 0]`)
    pub fn scroll_offset(&self) -> isize {
        self.scroll_offset
    }

    /// Move the viewport by `delta` lines, clamped. Negative scrolls into
    /// scrollback, 0 is the live grid bottom.
    pub fn scroll_viewport(&mut self, delta: isize) {
        let floor = -(self.scrollback.len() as isize);
        self.scroll_offset = (self.scroll_offset + delta).clamp(floor, 0);
        self.dirty = true;
    }

    /// Write a cell directly into the active grid. Out-of-bounds positions
    /// are ignored; callers clamp to the logical bounds.
    pub fn put(&mut self, row: usize, col: usize, cell: Cell) {
        if let Some(c) = self.active_mut().grid.get_mut(row, col) {
            *c = cell;
        }
        self.dirty = true;
    }

    /// Write a printable byte at the cursor with the current style and
    /// advance. A byte landing in the last column latches the wrap: the
    /// line break happens when the next byte arrives, so a full line
    /// followed by LF advances one row, not two.
    pub fn put_char(&mut self, ch: u8) {
        let cols = self.width();
        let wrap = self.modes.auto_wrap;
        let cell = self.style.create_cell(ch);

        if wrap && self.active().wrap_pending {
            let page = self.active_mut();
            page.cursor.row += 1;
            page.cursor.col = 0;
            page.wrap_pending = false;
            self.scroll_if_below_region();
        }

        let cursor = self.active().cursor;
        if let Some(c) = self.active_mut().grid.get_mut(cursor.row, cursor.col) {
            *c = cell;
        }

        let page = self.active_mut();
        page.cursor.col += 1;
        if page.cursor.col >= cols {
            // With auto-wrap off the cursor pins to the last column and
            // further bytes overwrite it.
            page.cursor.col = cols - 1;
            page.wrap_pending = wrap;
        }
        self.dirty = true;
    }

    /// Move the cursor down one line, column to 0, scrolling the region up
    /// when the cursor passes its bottom
    pub fn line_feed(&mut self) {
        let page = self.active_mut();
        page.cursor.row += 1;
        page.cursor.col = 0;
        page.wrap_pending = false;
        self.scroll_if_below_region();
        self.dirty = true;
    }

    /// Move the cursor to column 0
    pub fn carriage_return(&mut self) {
        let page = self.active_mut();
        page.cursor.col = 0;
        page.wrap_pending = false;
        self.dirty = true;
    }

    /// Step the cursor back one column and blank the cell it lands on
    pub fn backspace(&mut self) {
        let page = self.active_mut();
        page.wrap_pending = false;
        if page.cursor.col > 0 {
            page.cursor.col -= 1;
            let cursor = page.cursor;
            self.put(cursor.row, cursor.col, Cell::new(b' '));
        }
    }

    /// Pull the cursor back inside the scroll region, scrolling up once if
    /// it has passed the region bottom
    fn scroll_if_below_region(&mut self) {
        let bottom = self.scroll_region.bottom;
        if self.active().cursor.row > bottom {
            self.scroll_up();
            self.active_mut().cursor.row = bottom;
        }
    }

    /// Scroll the region up one line. On the primary screen the retired top
    /// row is appended to scrollback; the alternate screen never feeds it.
    pub fn scroll_up(&mut self) {
        let ScrollRegion { top, bottom } = self.scroll_region;
        match self.active {
            ScreenId::Primary => {
                let retired = self.primary.grid.scroll_up(top, bottom);
                self.scrollback.push(retired);
            }
            ScreenId::Alternate => {
                self.alternate.grid.scroll_up(top, bottom);
            }
        }
        self.dirty = true;
    }

    /// Clear the whole visible grid and home the cursor
    pub fn clear_screen(&mut self) {
        let page = self.active_mut();
        page.grid.clear();
        page.home();
        self.dirty = true;
    }

    /// Clear from the cursor to the end of its line
    pub fn clear_to_eol(&mut self) {
        let cols = self.width();
        let cursor = self.active().cursor;
        if let Some(row) = self.active_mut().grid.row_mut(cursor.row) {
            for c in cursor.col..cols {
                row[c].reset();
            }
        }
        self.dirty = true;
    }

    /// Clear from the cursor to the end of the screen
    pub fn clear_below(&mut self) {
        self.clear_to_eol();
        let rows = self.height();
        let cursor_row = self.active().cursor.row;
        for r in cursor_row + 1..rows {
            self.active_mut().grid.clear_row(r);
        }
        self.dirty = true;
    }

    /// Clear from the start of the screen through the cursor
    pub fn clear_above(&mut self) {
        let cursor = self.active().cursor;
        if let Some(row) = self.active_mut().grid.row_mut(cursor.row) {
            for c in 0..=cursor.col {
                row[c].reset();
            }
        }
        for r in 0..cursor.row {
            self.active_mut().grid.clear_row(r);
        }
        self.dirty = true;
    }

    /// Insert `count` blanks at the cursor, shifting the row tail right
    pub fn insert_blanks(&mut self, count: usize) {
        let cursor = self.active().cursor;
        self.active_mut()
            .grid
            .insert_blanks(cursor.row, cursor.col, count.max(1));
        self.dirty = true;
    }

    /// Move the cursor to an absolute position, clamped to the grid
    pub fn move_cursor_to(&mut self, row: usize, col: usize) {
        let max_row = self.height() - 1;
        let max_col = self.width() - 1;
        let page = self.active_mut();
        page.cursor.row = row.min(max_row);
        page.cursor.col = col.min(max_col);
        page.wrap_pending = false;
        self.dirty = true;
    }

    /// Move the cursor relative to its position, clamped to the grid
    pub fn move_cursor_by(&mut self, row_delta: isize, col_delta: isize) {
        let max_row = self.height() as isize - 1;
        let max_col = self.width() as isize - 1;
        let page = self.active_mut();
        page.cursor.row = (page.cursor.row as isize + row_delta).clamp(0, max_row) as usize;
        page.cursor.col = (page.cursor.col as isize + col_delta).clamp(0, max_col) as usize;
        page.wrap_pending = false;
        self.dirty = true;
    }

    /// Save the active cursor position (DECSC). The saved pair is shared
    /// between the primary and alternate screens.
    pub fn save_cursor(&mut self) {
        self.saved_cursor = self.active().cursor;
    }

    /// Restore the saved cursor position, clamped to the grid (DECRC)
    pub fn restore_cursor(&mut self) {
        let saved = self.saved_cursor;
        self.move_cursor_to(saved.row, saved.col);
    }

    /// Set the scroll region, rows inclusive and 0-indexed. A region whose
    /// clamped top exceeds its clamped bottom is ignored.
    pub fn set_scroll_region(&mut self, top: usize, bottom: usize) {
        let max_row = self.height() - 1;
        let top = top.min(max_row);
        let bottom = bottom.min(max_row);
        if top <= bottom {
            self.scroll_region = ScrollRegion { top, bottom };
        }
    }

    /// Switch to the alternate screen, clearing it and homing its cursor.
    /// Entering again re-clears.
    pub fn enter_alternate(&mut self) {
        self.active = ScreenId::Alternate;
        self.alternate.grid.clear();
        self.alternate.home();
        self.dirty = true;
    }

    /// Switch back to the primary screen. The primary cursor is forced to
    /// the origin, not restored.
    pub fn exit_alternate(&mut self) {
        self.active = ScreenId::Primary;
        self.primary.home();
        self.dirty = true;
    }

    /// Resize both screens. No reflow happens; the scroll region bottom
    /// tracks the new height and both cursors are clamped back in bounds.
    pub fn resize(&mut self, cols: usize, rows: usize) {
        let cols = cols.clamp(1, MAX_COLS);
        let rows = rows.clamp(1, MAX_ROWS);

        self.primary.grid.resize(cols, rows);
        self.alternate.grid.resize(cols, rows);

        self.scroll_region.bottom = rows - 1;
        self.scroll_region.top = self.scroll_region.top.min(rows - 1);

        for page in [&mut self.primary, &mut self.alternate] {
            page.cursor.row = page.cursor.row.min(rows - 1);
            page.cursor.col = page.cursor.col.min(cols - 1);
            page.wrap_pending = false;
        }

        self.dirty = true;
    }

    // ========== Selection ==========

    /// Start a new selection at a virtual position, discarding any previous
    /// selection
    pub fn start_selection(&mut self, line: usize, col: usize) {
        let point = SelectionPoint::new(line, col);
        self.selection = Some(Selection {
            anchor: point,
            end: point,
        });
        self.selecting = true;
        self.dirty = true;
    }

    /// Track the pointer while selecting
    pub fn extend_selection(&mut self, line: usize, col: usize) {
        if !self.selecting {
            return;
        }
        if let Some(ref mut sel) = self.selection {
            sel.end = SelectionPoint::new(line, col);
            self.dirty = true;
        }
    }

    /// Finish the selection and return its text, if any
    pub fn finish_selection(&mut self) -> Option<String> {
        self.selecting = false;
        self.selected_text()
    }

    /// Drop the selection entirely
    pub fn clear_selection(&mut self) {
        if self.selection.take().is_some() {
            self.dirty = true;
        }
        self.selecting = false;
    }

    /// Resolve a virtual line to its backing row: scrollback first, then the
    /// active grid
    pub fn row_at_line(&self, line: usize) -> Option<&Row> {
        let scrollback_len = self.scrollback.len();
        if line < scrollback_len {
            self.scrollback.get(line)
        } else {
            self.active().grid.row(line - scrollback_len)
        }
    }

    /// Column span of the selection on a given virtual line, or None if the
    /// line is outside the selection
    pub fn selection_span(&self, line: usize) -> Option<(usize, usize)> {
        let sel = self.selection.as_ref()?;
        let (start, end) = sel.ordered();
        if line < start.line || line > end.line {
            return None;
        }
        let last_col = self.width() - 1;
        Some(if start.line == end.line {
            (start.col.min(end.col), start.col.max(end.col))
        } else if line == start.line {
            (start.col, last_col)
        } else if line == end.line {
            (0, end.col)
        } else {
            (0, last_col)
        })
    }

    /// Whether the cell at a virtual position is selected
    pub fn is_selected(&self, line: usize, col: usize) -> bool {
        match self.selection_span(line) {
            Some((first, last)) => col >= first && col <= last,
            None => false,
        }
    }

    /// Linearise the selection: non-empty bytes of each selected span,
    /// lines joined with newlines. Empty cells are skipped, which trims
    /// lines naturally.
    pub fn selected_text(&self) -> Option<String> {
        let sel = self.selection.as_ref()?;
        let (start, end) = sel.ordered();
        let last_col = self.width() - 1;

        let mut text = String::new();
        for line in start.line..=end.line {
            let Some(row) = self.row_at_line(line) else {
                break;
            };
            let (first, last) = self.selection_span(line).unwrap_or((0, last_col));
            for col in first..=last.min(last_col) {
                match row.get(col) {
                    Some(cell) if cell.ch != 0 => text.push(cell.ch as char),
                    _ => {}
                }
            }
            if line < end.line {
                text.push('\n');
            }
        }

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
