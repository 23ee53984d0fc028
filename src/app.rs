//! Session - the I/O loop
//!
//! A single-threaded pump multiplexing three sources: bytes from the child,
//! events from the window collaborator, and SIGCHLD. All terminal state
//! mutation happens here, on the loop task; the only other thread is the
//! blocking PTY reader, which just forwards byte chunks.

use std::io::Read;

use anyhow::{Context, Result};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

use tern_core::input::{self, KeyAction, MouseEvent};
use tern_core::pty::READ_BUF_SIZE;
use tern_core::term::Terminal;
use tern_ui::{Frame, Metrics, MouseButton, ScrollDirection, Surface, WindowEvent};

/// A running terminal session bound to a surface
pub struct Session<S: Surface> {
    term: Terminal,
    surface: S,
    metrics: Metrics,
    scroll_lines: isize,
}

impl<S: Surface> Session<S> {
    pub fn new(term: Terminal, surface: S, scroll_lines: isize) -> Self {
        let metrics = surface.metrics();
        Self {
            term,
            surface,
            metrics,
            scroll_lines,
        }
    }

    /// Run the session until the child exits. Returns the child's exit
    /// status: its exit code on a clean exit, 128 + signal otherwise.
    pub async fn run(mut self, mut events: mpsc::Receiver<WindowEvent>) -> Result<i32> {
        let mut reader = self
            .term
            .reader()
            .context("terminal has no attached pty")?
            .context("failed to clone pty reader")?;

        let (tx, mut pty_rx) = mpsc::channel::<Vec<u8>>(32);
        tokio::task::spawn_blocking(move || {
            let mut buf = [0u8; READ_BUF_SIZE];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.blocking_send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        log::debug!("pty read ended: {}", e);
                        break;
                    }
                }
            }
        });

        let mut sigchld =
            signal(SignalKind::child()).context("failed to install SIGCHLD handler")?;
        let mut events_open = true;

        self.repaint();

        loop {
            tokio::select! {
                chunk = pty_rx.recv() => match chunk {
                    Some(bytes) => {
                        self.term.process(&bytes);
                        self.repaint();
                    }
                    None => {
                        // EOF: the child side of the PTY is gone.
                        return self.term.wait().context("waitpid failed");
                    }
                },
                ev = events.recv(), if events_open => match ev {
                    Some(ev) => {
                        self.handle_event(ev)?;
                        // Drain the burst before repainting once.
                        while let Ok(ev) = events.try_recv() {
                            self.handle_event(ev)?;
                        }
                        self.repaint();
                    }
                    None => events_open = false,
                },
                _ = sigchld.recv() => {
                    if let Some(status) = self.term.try_wait() {
                        return Ok(status);
                    }
                }
            }
        }
    }

    /// Apply one window event to the terminal state
    fn handle_event(&mut self, event: WindowEvent) -> Result<()> {
        match event {
            WindowEvent::Expose => {
                self.term.screen_mut().dirty = true;
            }
            WindowEvent::Resize { width, height } => {
                let (cols, rows) = self.metrics.grid_size(width, height);
                if cols != self.term.cols() || rows != self.term.rows() {
                    self.term.resize(cols, rows);
                }
            }
            WindowEvent::KeyPress {
                key,
                modifiers,
                text,
            } => match input::encode_key(key, modifiers, &text) {
                KeyAction::Write(bytes) => self.write_pty(&bytes)?,
                KeyAction::CopySelection => self.copy_selection(),
                KeyAction::RequestPaste => self.surface.clipboard_get(),
                KeyAction::Scroll(delta) => self.term.screen_mut().scroll_viewport(delta),
                KeyAction::Ignore => {}
            },
            WindowEvent::ButtonPress {
                button: MouseButton::Left,
                x,
                y,
            } => {
                let (row, col) = self.metrics.cell_at(x, y);
                let line = self.virtual_line(row);
                self.term.screen_mut().start_selection(line, col);
                self.report_mouse(MouseEvent::Press, col, row)?;
            }
            WindowEvent::ButtonRelease {
                button: MouseButton::Left,
                x,
                y,
            } => {
                let (row, col) = self.metrics.cell_at(x, y);
                if self.term.screen().selecting {
                    self.term.screen_mut().selecting = false;
                    self.copy_selection();
                }
                self.report_mouse(MouseEvent::Release, col, row)?;
            }
            WindowEvent::PointerMotion { x, y } => {
                let (row, col) = self.metrics.cell_at(x, y);
                if self.term.screen().selecting {
                    let line = self.virtual_line(row);
                    self.term.screen_mut().extend_selection(line, col);
                }
                self.report_mouse(MouseEvent::Motion, col, row)?;
            }
            WindowEvent::Scroll { direction, .. } => {
                let delta = match direction {
                    ScrollDirection::Up => -self.scroll_lines,
                    ScrollDirection::Down => self.scroll_lines,
                };
                self.term.screen_mut().scroll_viewport(delta);
            }
            WindowEvent::SelectionProvide { data } => {
                // Pasted bytes reach the child verbatim.
                self.write_pty(&data)?;
            }
            WindowEvent::ButtonPress { .. } | WindowEvent::ButtonRelease { .. } => {}
        }
        Ok(())
    }

    /// Map a viewport grid row to the virtual selection coordinate space
    fn virtual_line(&self, grid_row: usize) -> usize {
        let screen = self.term.screen();
        let line = grid_row as isize + screen.scrollback().len() as isize - screen.scroll_offset();
        line.max(0) as usize
    }

    /// The bytes a mouse event would put on the wire, or None when the
    /// current mode (or viewport position) suppresses the report
    fn mouse_report(&self, event: MouseEvent, col: usize, row: usize) -> Option<Vec<u8>> {
        let screen = self.term.screen();
        // The X10 encoding cannot express scrollback rows, so reports stop
        // while the viewport is scrolled.
        if screen.scroll_offset() < 0 {
            return None;
        }
        let mode = screen.modes.mouse_mode;
        let wanted = match event {
            MouseEvent::Press | MouseEvent::Release => mode.reports_buttons(),
            MouseEvent::Motion => mode.reports_motion(screen.selecting),
        };
        wanted.then(|| input::encode_mouse(event, col, row))
    }

    fn report_mouse(&mut self, event: MouseEvent, col: usize, row: usize) -> Result<()> {
        if let Some(bytes) = self.mouse_report(event, col, row) {
            self.write_pty(&bytes)?;
        }
        Ok(())
    }

    fn copy_selection(&mut self) {
        if let Some(text) = self.term.screen().selected_text() {
            self.surface.clipboard_set(text.as_bytes());
        }
    }

    fn write_pty(&mut self, bytes: &[u8]) -> Result<()> {
        self.term.write(bytes).context("write to pty failed")
    }

    /// Redraw if anything changed since the last frame
    fn repaint(&mut self) {
        if self.term.screen().dirty {
            let frame = Frame::snapshot(self.term.screen());
            self.surface.draw(&frame);
            self.term.screen_mut().dirty = false;
        }
    }
}
