//! Built-in configuration defaults
//!
//! There is no configuration file; embedders construct a `Config` and
//! override fields directly.

use tern_ui::Metrics;

/// Session configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Value for the child's TERM variable
    pub term: String,
    /// Initial grid size
    pub cols: usize,
    pub rows: usize,
    /// Font cell size and window border used for pixel transforms
    pub metrics: Metrics,
    /// Lines moved per mouse-wheel tick
    pub scroll_lines: isize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            term: "xterm-256color".to_string(),
            cols: 80,
            rows: 24,
            metrics: Metrics {
                font_width: 10,
                font_height: 22,
                border: 20,
            },
            scroll_lines: 3,
        }
    }
}
