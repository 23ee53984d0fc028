//! Escape sequence parser
//!
//! Uses the `vte` crate to drive a performer that applies the recognised
//! subset of CSI and simple escape sequences to the screen. Anything outside
//! that subset terminates cleanly and is dropped; the parser itself never
//! fails.

use vte::Params;

use crate::screen::{MouseMode, Screen};

/// Parser wraps the vte state machine and applies actions to a Screen
pub struct Parser {
    state_machine: vte::Parser,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            state_machine: vte::Parser::new(),
        }
    }

    /// Parse input bytes and apply actions to the screen
    pub fn parse(&mut self, screen: &mut Screen, bytes: &[u8]) {
        let mut performer = ScreenPerformer { screen };
        for byte in bytes {
            self.state_machine.advance(&mut performer, *byte);
        }
    }
}

/// Performer that applies vte actions to a Screen
struct ScreenPerformer<'a> {
    screen: &'a mut Screen,
}

impl vte::Perform for ScreenPerformer<'_> {
    fn print(&mut self, c: char) {
        // Cells hold single printable bytes; everything else is dropped.
        if ('\x20'..='\x7e').contains(&c) {
            self.screen.put_char(c as u8);
        }
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            // Backspace (BS)
            0x08 => self.screen.backspace(),
            // Line Feed (LF)
            0x0a => self.screen.line_feed(),
            // Carriage Return (CR)
            0x0d => self.screen.carriage_return(),
            _ => {
                log::trace!("Unhandled execute byte: 0x{:02x}", byte);
            }
        }
    }

    fn hook(&mut self, _params: &Params, _intermediates: &[u8], _ignore: bool, _action: char) {}

    fn put(&mut self, _byte: u8) {}

    fn unhook(&mut self) {}

    fn osc_dispatch(&mut self, _params: &[&[u8]], _bell_terminated: bool) {}

    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], _ignore: bool, action: char) {
        let params_vec = params_to_vec(params);

        match (action, intermediates) {
            // Cursor Up (CUU)
            ('A', []) => {
                let n = first_param(&params_vec, 1) as isize;
                self.screen.move_cursor_by(-n, 0);
            }
            // Cursor Down (CUD)
            ('B', []) => {
                let n = first_param(&params_vec, 1) as isize;
                self.screen.move_cursor_by(n, 0);
            }
            // Cursor Forward (CUF)
            ('C', []) => {
                let n = first_param(&params_vec, 1) as isize;
                self.screen.move_cursor_by(0, n);
            }
            // Cursor Back (CUB)
            ('D', []) => {
                let n = first_param(&params_vec, 1) as isize;
                self.screen.move_cursor_by(0, -n);
            }
            // Cursor Position (CUP)
            ('H', []) => {
                let row = first_param(&params_vec, 1).saturating_sub(1);
                let col = second_param(&params_vec, 1).saturating_sub(1);
                self.screen.move_cursor_to(row, col);
            }
            // Erase in Display (ED)
            ('J', []) => match first_param(&params_vec, 0) {
                0 => self.screen.clear_below(),
                1 => self.screen.clear_above(),
                2 => self.screen.clear_screen(),
                mode => log::trace!("Unhandled ED mode: {}", mode),
            },
            // Erase in Line (EL) - only the clear-to-end form is supported
            ('K', []) => match first_param(&params_vec, 0) {
                0 => self.screen.clear_to_eol(),
                mode => log::trace!("Unhandled EL mode: {}", mode),
            },
            // Insert Characters (ICH)
            ('@', []) => {
                let n = first_param(&params_vec, 1);
                self.screen.insert_blanks(n);
            }
            // SGR - Select Graphic Rendition
            ('m', []) => {
                self.handle_sgr(&params_vec);
            }
            // Set Top and Bottom Margins (DECSTBM)
            ('r', []) => {
                let top = first_param(&params_vec, 1);
                let bottom = second_param(&params_vec, self.screen.height());
                self.screen
                    .set_scroll_region(top.saturating_sub(1), bottom.saturating_sub(1));
            }
            // DEC private mode set/reset
            ('h', [b'?']) | ('l', [b'?']) => {
                let set = action == 'h';
                for &param in &params_vec {
                    self.handle_dec_mode(param, set);
                }
            }
            _ => {
                log::trace!(
                    "Unhandled CSI: action={:?}, intermediates={:?}, params={:?}",
                    action,
                    intermediates,
                    params_vec
                );
            }
        }
    }

    fn esc_dispatch(&mut self, intermediates: &[u8], _ignore: bool, byte: u8) {
        match (byte, intermediates) {
            // Save Cursor (DECSC)
            (b'7', []) => {
                self.screen.save_cursor();
            }
            // Restore Cursor (DECRC)
            (b'8', []) => {
                self.screen.restore_cursor();
            }
            _ => {
                log::trace!(
                    "Unhandled ESC: byte=0x{:02x}, intermediates={:?}",
                    byte,
                    intermediates
                );
            }
        }
    }
}

impl ScreenPerformer<'_> {
    /// Handle SGR parameters left to right. Only reset and the 16-colour
    /// foreground/background codes exist in this palette model.
    fn handle_sgr(&mut self, params: &[usize]) {
        if params.is_empty() {
            self.screen.style.reset();
            return;
        }

        for &param in params {
            match param {
                0 => self.screen.style.reset(),
                30..=37 => self.screen.style.fg = (param - 30) as u8,
                40..=47 => self.screen.style.bg = (param - 40) as u8,
                90..=97 => self.screen.style.fg = (param - 90 + 8) as u8,
                100..=107 => self.screen.style.bg = (param - 100 + 8) as u8,
                _ => {
                    log::trace!("Unhandled SGR parameter: {}", param);
                }
            }
        }
    }

    /// Handle DEC private mode set/reset
    fn handle_dec_mode(&mut self, mode: usize, set: bool) {
        match mode {
            // DECCKM - application cursor keys (not translated)
            1 => {}
            // DECAWM - Auto Wrap Mode
            7 => self.screen.modes.auto_wrap = set,
            // DECTCEM - cursor visibility (the cursor is always drawn)
            25 => {}
            // Normal mouse tracking
            1000 => {
                self.screen.modes.mouse_mode = if set {
                    MouseMode::Normal
                } else {
                    MouseMode::None
                };
            }
            // Button-event mouse tracking
            1002 => {
                self.screen.modes.mouse_mode = if set {
                    MouseMode::ButtonEvent
                } else {
                    MouseMode::None
                };
            }
            // Any-event mouse tracking
            1003 => {
                self.screen.modes.mouse_mode = if set {
                    MouseMode::AnyEvent
                } else {
                    MouseMode::None
                };
            }
            // Alternate screen buffer
            1049 => {
                if set {
                    self.screen.enter_alternate();
                } else {
                    self.screen.exit_alternate();
                }
            }
            _ => {
                log::trace!("Unhandled DEC mode: {} = {}", mode, set);
            }
        }
    }
}

// Helper functions

fn params_to_vec(params: &Params) -> Vec<usize> {
    let mut result = Vec::new();
    for item in params.iter() {
        for &subparam in item {
            result.push(subparam as usize);
        }
    }
    result
}

fn first_param(params: &[usize], default: usize) -> usize {
    params
        .first()
        .copied()
        .filter(|&v| v != 0)
        .unwrap_or(default)
}

fn second_param(params: &[usize], default: usize) -> usize {
    params
        .get(1)
        .copied()
        .filter(|&v| v != 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{DEFAULT_BG, DEFAULT_FG};
    use crate::screen::{Cursor, ScrollRegion};

    fn make() -> (Screen, Parser) {
        let _ = env_logger::builder().is_test(true).try_init();
        (Screen::new(8, 4), Parser::new())
    }

    fn row_text(screen: &Screen, r: usize) -> String {
        screen.grid().row(r).unwrap().text(screen.width())
    }

    #[test]
    fn test_print_line() {
        let (mut screen, mut parser) = make();
        parser.parse(&mut screen, b"Hi\n");

        assert_eq!(row_text(&screen, 0), "Hi");
        assert_eq!(screen.cursor(), Cursor { row: 1, col: 0 });
        assert!(screen.scrollback().is_empty());
    }

    #[test]
    fn test_wrap_continuation() {
        let (mut screen, mut parser) = make();
        parser.parse(&mut screen, b"ABCDEFGHX");

        assert_eq!(row_text(&screen, 0), "ABCDEFGH");
        assert_eq!(row_text(&screen, 1), "X");
        assert_eq!(screen.cursor(), Cursor { row: 1, col: 1 });
    }

    #[test]
    fn test_wrap_disabled_never_advances_row() {
        let (mut screen, mut parser) = make();
        parser.parse(&mut screen, b"\x1b[?7l");
        parser.parse(&mut screen, b"0123456789ABCDEF");

        assert_eq!(screen.cursor().row, 0);
        parser.parse(&mut screen, b"\x1b[?7h");
        assert!(screen.modes.auto_wrap);
    }

    #[test]
    fn test_sgr_applies_at_write_time() {
        let (mut screen, mut parser) = make();
        parser.parse(&mut screen, b"\x1b[31mR\x1b[0mG");

        assert_eq!(screen.grid()[0][0].fg, 1);
        assert_eq!(screen.grid()[0][1].fg, DEFAULT_FG);
        assert_eq!(screen.style.bg, DEFAULT_BG);
    }

    #[test]
    fn test_sgr_bright_and_background() {
        let (mut screen, mut parser) = make();
        parser.parse(&mut screen, b"\x1b[44;97mX");

        let cell = screen.grid()[0][0];
        assert_eq!(cell.bg, 4);
        assert_eq!(cell.fg, 15);
    }

    #[test]
    fn test_sgr_unknown_codes_ignored() {
        let (mut screen, mut parser) = make();
        parser.parse(&mut screen, b"\x1b[31m\x1b[38;5;196m");

        // The extended-colour triplet is three unknown codes; fg stays red.
        assert_eq!(screen.style.fg, 1);
    }

    #[test]
    fn test_sgr_reset_restores_defaults() {
        let (mut screen, mut parser) = make();
        parser.parse(&mut screen, b"\x1b[31;44m\x1b[0m");

        assert_eq!(screen.style.fg, DEFAULT_FG);
        assert_eq!(screen.style.bg, DEFAULT_BG);
    }

    #[test]
    fn test_cursor_movement_clamped() {
        let (mut screen, mut parser) = make();
        parser.parse(&mut screen, b"\x1b[99B\x1b[99C");
        assert_eq!(screen.cursor(), Cursor { row: 3, col: 7 });

        parser.parse(&mut screen, b"\x1b[99A\x1b[99D");
        assert_eq!(screen.cursor(), Cursor { row: 0, col: 0 });
    }

    #[test]
    fn test_cursor_position() {
        let (mut screen, mut parser) = make();
        parser.parse(&mut screen, b"\x1b[2;3H");
        assert_eq!(screen.cursor(), Cursor { row: 1, col: 2 });

        // Bare CUP homes; out-of-range coordinates clamp.
        parser.parse(&mut screen, b"\x1b[H");
        assert_eq!(screen.cursor(), Cursor { row: 0, col: 0 });
        parser.parse(&mut screen, b"\x1b[99;99H");
        assert_eq!(screen.cursor(), Cursor { row: 3, col: 7 });
    }

    #[test]
    fn test_clear_screen_homes_cursor() {
        let (mut screen, mut parser) = make();
        parser.parse(&mut screen, b"XXXX\x1b[2J");

        assert_eq!(row_text(&screen, 0), "");
        assert_eq!(screen.cursor(), Cursor { row: 0, col: 0 });
    }

    #[test]
    fn test_clear_to_eol() {
        let (mut screen, mut parser) = make();
        parser.parse(&mut screen, b"ABCDEF\x1b[1;3H\x1b[K");

        assert_eq!(row_text(&screen, 0), "AB");
    }

    #[test]
    fn test_clear_above_and_below() {
        let (mut screen, mut parser) = make();
        parser.parse(&mut screen, b"one\r\ntwo\r\nsix\x1b[2;2H\x1b[J");
        assert_eq!(row_text(&screen, 0), "one");
        assert_eq!(row_text(&screen, 1), "t");
        assert_eq!(row_text(&screen, 2), "");

        parser.parse(&mut screen, b"\x1b[1J");
        assert_eq!(row_text(&screen, 0), "");
    }

    #[test]
    fn test_save_restore_is_identity() {
        let (mut screen, mut parser) = make();
        parser.parse(&mut screen, b"\x1b[3;5H\x1b7\x1b8");

        assert_eq!(screen.cursor(), Cursor { row: 2, col: 4 });
    }

    #[test]
    fn test_scroll_region_set_and_clamped() {
        let (mut screen, mut parser) = make();
        parser.parse(&mut screen, b"\x1b[2;3r");
        assert_eq!(screen.scroll_region(), ScrollRegion { top: 1, bottom: 2 });

        parser.parse(&mut screen, b"\x1b[1;99r");
        assert_eq!(screen.scroll_region(), ScrollRegion { top: 0, bottom: 3 });
    }

    #[test]
    fn test_insert_blanks_shifts_row() {
        let (mut screen, mut parser) = make();
        parser.parse(&mut screen, b"abc\x1b[H\x1b[2@X");

        let row = screen.grid().row(0).unwrap();
        assert_eq!(row[0].ch, b'X');
        assert_eq!(row[1].ch, 0);
        assert_eq!(row[2].ch, b'a');
        assert_eq!(row[3].ch, b'b');
        assert_eq!(row[4].ch, b'c');
    }

    #[test]
    fn test_alternate_screen_round_trip() {
        let (mut screen, mut parser) = make();
        parser.parse(&mut screen, b"Primary");
        let scrollback_before = screen.scrollback().len();

        parser.parse(&mut screen, b"\x1b[?1049hALT\x1b[?1049l");

        assert!(!screen.is_alternate());
        assert_eq!(screen.scrollback().len(), scrollback_before);
        assert_eq!(row_text(&screen, 0), "Primary");
        assert_eq!(screen.cursor(), Cursor { row: 0, col: 0 });
    }

    #[test]
    fn test_alternate_screen_never_feeds_scrollback() {
        let (mut screen, mut parser) = make();
        parser.parse(&mut screen, b"\x1b[?1049h");
        for _ in 0..10 {
            parser.parse(&mut screen, b"fill\n");
        }

        assert_eq!(screen.scrollback().len(), 0);
    }

    #[test]
    fn test_mouse_modes() {
        let (mut screen, mut parser) = make();

        parser.parse(&mut screen, b"\x1b[?1000h");
        assert_eq!(screen.modes.mouse_mode, MouseMode::Normal);
        parser.parse(&mut screen, b"\x1b[?1002h");
        assert_eq!(screen.modes.mouse_mode, MouseMode::ButtonEvent);
        parser.parse(&mut screen, b"\x1b[?1003h");
        assert_eq!(screen.modes.mouse_mode, MouseMode::AnyEvent);
        parser.parse(&mut screen, b"\x1b[?1003l");
        assert_eq!(screen.modes.mouse_mode, MouseMode::None);
    }

    #[test]
    fn test_scrollback_retires_lines_in_order() {
        let (mut screen, mut parser) = make();
        for _ in 0..5 {
            parser.parse(&mut screen, b"AAAAAAAA\n");
        }

        assert_eq!(screen.scrollback().len(), 2);
        assert_eq!(screen.scrollback().get(1).unwrap().text(8), "AAAAAAAA");
        assert_eq!(row_text(&screen, 3), "");
        assert_eq!(screen.cursor(), Cursor { row: 3, col: 0 });
    }

    #[test]
    fn test_unknown_sequences_dropped() {
        let (mut screen, mut parser) = make();
        parser.parse(&mut screen, b"A");
        // DSR query, OSC title, a DCS blob, and an unknown DEC mode.
        parser.parse(&mut screen, b"\x1b[5n\x1b]0;title\x07\x1bPdata\x1b\\\x1b[?2004h");
        parser.parse(&mut screen, b"B");

        assert_eq!(row_text(&screen, 0), "AB");
        assert_eq!(screen.cursor(), Cursor { row: 0, col: 2 });
    }

    #[test]
    fn test_non_ascii_bytes_ignored() {
        let (mut screen, mut parser) = make();
        parser.parse(&mut screen, b"A\xc3\xa9B\x07\x01");

        // The UTF-8 pair decodes to a non-ASCII char and is dropped.
        assert_eq!(row_text(&screen, 0), "AB");
    }

    #[test]
    fn test_cursor_always_in_bounds_after_dispatch() {
        let (mut screen, mut parser) = make();
        let streams: &[&[u8]] = &[
            b"\x1b[999;999H",
            b"\x1b[999A",
            b"\x1b[999B",
            b"\x1b[999C",
            b"\x1b[999D",
            b"\x1b8",
            b"\x1b[2J",
            b"\x1b[?1049h",
            b"\x1b[?1049l",
        ];
        for stream in streams {
            parser.parse(&mut screen, stream);
            let cursor = screen.cursor();
            assert!(cursor.row < screen.height());
            assert!(cursor.col < screen.width());
        }
    }
}
