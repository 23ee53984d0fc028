//! Terminal - screen, parser, and PTY combined
//!
//! The high-level handle the I/O loop drives: bytes from the child go in
//! through `process`, encoded input goes out through `write`.

use std::fs::File;
use std::io;

use crate::parser::Parser;
use crate::pty::{Pty, PtyConfig, PtyError};
use crate::screen::Screen;

/// Terminal instance managing screen, parser, and PTY
pub struct Terminal {
    screen: Screen,
    parser: Parser,
    pty: Option<Pty>,
}

impl Terminal {
    /// Create a terminal with no child attached (useful for tests and
    /// embedders that manage their own transport)
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            screen: Screen::new(cols, rows),
            parser: Parser::new(),
            pty: None,
        }
    }

    /// Create a terminal and spawn the configured child on a fresh PTY
    pub fn with_child(cols: usize, rows: usize, config: &PtyConfig) -> Result<Self, PtyError> {
        let mut config = config.clone();
        config.cols = cols as u16;
        config.rows = rows as u16;
        let pty = Pty::spawn(&config)?;

        Ok(Self {
            screen: Screen::new(cols, rows),
            parser: Parser::new(),
            pty: Some(pty),
        })
    }

    /// Get a reference to the screen
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Get a mutable reference to the screen
    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    /// Feed child output through the parser into the screen
    pub fn process(&mut self, data: &[u8]) {
        self.parser.parse(&mut self.screen, data);
    }

    /// Write input bytes to the PTY
    pub fn write(&mut self, data: &[u8]) -> Result<(), PtyError> {
        match self.pty {
            Some(ref mut pty) => Ok(pty.write(data)?),
            None => Err(PtyError::NotRunning),
        }
    }

    /// Resize the screen and propagate the new size to the PTY. A failed
    /// window-size ioctl is logged and otherwise ignored.
    pub fn resize(&mut self, cols: usize, rows: usize) {
        self.screen.resize(cols, rows);
        let cols = self.screen.width();
        let rows = self.screen.height();
        if let Some(ref pty) = self.pty {
            if let Err(e) = pty.resize(rows as u16, cols as u16) {
                log::warn!("pty resize to {}x{} failed: {}", cols, rows, e);
            }
        }
    }

    /// Reap the child if it has exited, returning its exit status
    pub fn try_wait(&mut self) -> Option<i32> {
        self.pty.as_mut()?.try_wait()
    }

    /// Block until the child exits and return its exit status
    pub fn wait(&mut self) -> Result<i32, PtyError> {
        match self.pty {
            Some(ref mut pty) => Ok(pty.wait()?),
            None => Err(PtyError::NotRunning),
        }
    }

    /// An independent blocking reader over the PTY master
    pub fn reader(&self) -> Option<io::Result<File>> {
        self.pty.as_ref().map(|p| p.try_clone_reader())
    }

    /// Get terminal width
    pub fn cols(&self) -> usize {
        self.screen.width()
    }

    /// Get terminal height
    pub fn rows(&self) -> usize {
        self.screen.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::Cursor;

    #[test]
    fn test_terminal_new() {
        let term = Terminal::new(80, 24);
        assert_eq!(term.cols(), 80);
        assert_eq!(term.rows(), 24);
    }

    #[test]
    fn test_terminal_process() {
        let mut term = Terminal::new(80, 24);
        term.process(b"Hello, World!");

        assert_eq!(term.screen().grid()[0][0].ch, b'H');
        assert_eq!(term.screen().grid()[0][12].ch, b'!');
    }

    #[test]
    fn test_terminal_resize_keeps_content() {
        let mut term = Terminal::new(80, 24);
        term.process(b"X");
        term.resize(100, 30);

        assert_eq!(term.cols(), 100);
        assert_eq!(term.rows(), 30);
        assert_eq!(term.screen().grid()[0][0].ch, b'X');
    }

    #[test]
    fn test_write_without_child_fails() {
        let mut term = Terminal::new(80, 24);
        assert!(term.write(b"x").is_err());
    }

    #[test]
    fn test_process_full_stream() {
        let mut term = Terminal::new(8, 4);
        term.process(b"\x1b[2J\x1b[Hok\x1b[31m!\x1b[0m\r\n$ ");

        assert_eq!(term.screen().grid().row(0).unwrap().text(8), "ok!");
        assert_eq!(term.screen().grid()[0][2].fg, 1);
        assert_eq!(term.screen().cursor(), Cursor { row: 1, col: 2 });
    }
}
