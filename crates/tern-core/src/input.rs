//! Input encoding
//!
//! Translates keyboard events into the byte sequences the child expects, or
//! into session actions (clipboard, scrollback navigation) that never touch
//! the PTY. Also encodes X10-style mouse reports.

use bitflags::bitflags;

bitflags! {
    /// Keyboard modifiers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        const SUPER = 1 << 3;
    }
}

/// Keyboard key, as delivered by the window collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Return,
    Backspace,
    Tab,
    Up,
    Down,
    Left,
    Right,
}

/// What a key press turns into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Bytes to write to the PTY
    Write(Vec<u8>),
    /// Copy the current selection to the clipboard
    CopySelection,
    /// Ask the window collaborator for clipboard contents
    RequestPaste,
    /// Move the viewport by this many lines (negative = into scrollback)
    Scroll(isize),
    /// Nothing to do
    Ignore,
}

/// Encode a key press. `text` carries the collaborator's translation of the
/// key (including control characters); shortcuts are resolved first, then
/// the text, then the special-key table.
pub fn encode_key(key: Option<Key>, modifiers: Modifiers, text: &[u8]) -> KeyAction {
    let ctrl = modifiers.contains(Modifiers::CTRL);
    let shift = modifiers.contains(Modifiers::SHIFT);

    if let Some(Key::Char(c)) = key {
        if ctrl && shift && c.eq_ignore_ascii_case(&'c') {
            return KeyAction::CopySelection;
        }
        if ctrl && c.eq_ignore_ascii_case(&'v') {
            return KeyAction::RequestPaste;
        }
        if ctrl && !shift && c.eq_ignore_ascii_case(&'c') {
            return KeyAction::Write(vec![0x03]);
        }
    }

    // Shift+Up/Down navigate scrollback instead of reaching the child.
    if shift {
        match key {
            Some(Key::Up) => return KeyAction::Scroll(-1),
            Some(Key::Down) => return KeyAction::Scroll(1),
            _ => {}
        }
    }

    if !text.is_empty() {
        return KeyAction::Write(text.to_vec());
    }

    match key {
        Some(Key::Return) => KeyAction::Write(b"\r".to_vec()),
        Some(Key::Backspace) => KeyAction::Write(b"\x08".to_vec()),
        Some(Key::Tab) => KeyAction::Write(b"\t".to_vec()),
        Some(Key::Up) => KeyAction::Write(arrow_key(b'A', shift)),
        Some(Key::Down) => KeyAction::Write(arrow_key(b'B', shift)),
        Some(Key::Right) => KeyAction::Write(arrow_key(b'C', shift)),
        Some(Key::Left) => KeyAction::Write(arrow_key(b'D', shift)),
        _ => KeyAction::Ignore,
    }
}

fn arrow_key(key: u8, shift: bool) -> Vec<u8> {
    if shift {
        let mut seq = b"\x1b[1;2".to_vec();
        seq.push(key);
        seq
    } else {
        vec![0x1b, b'[', key]
    }
}

/// X10 mouse report events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEvent {
    Press,
    Release,
    Motion,
}

/// Encode an X10 mouse report for a cell position on the visible grid.
/// Coordinates are 1-based on the wire with an offset of 32.
pub fn encode_mouse(event: MouseEvent, col: usize, row: usize) -> Vec<u8> {
    let button = match event {
        MouseEvent::Press => b' ',
        MouseEvent::Release => b'!',
        MouseEvent::Motion => b'"',
    };
    vec![
        0x1b,
        b'[',
        b'M',
        button,
        (col + 1 + 32) as u8,
        (row + 1 + 32) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_text_passes_through() {
        let action = encode_key(Some(Key::Char('a')), Modifiers::empty(), b"a");
        assert_eq!(action, KeyAction::Write(b"a".to_vec()));
    }

    #[test]
    fn test_special_keys() {
        assert_eq!(
            encode_key(Some(Key::Return), Modifiers::empty(), b""),
            KeyAction::Write(b"\r".to_vec())
        );
        assert_eq!(
            encode_key(Some(Key::Backspace), Modifiers::empty(), b""),
            KeyAction::Write(b"\x08".to_vec())
        );
        assert_eq!(
            encode_key(Some(Key::Tab), Modifiers::empty(), b""),
            KeyAction::Write(b"\t".to_vec())
        );
    }

    #[test]
    fn test_arrow_keys() {
        assert_eq!(
            encode_key(Some(Key::Up), Modifiers::empty(), b""),
            KeyAction::Write(b"\x1b[A".to_vec())
        );
        assert_eq!(
            encode_key(Some(Key::Left), Modifiers::SHIFT, b""),
            KeyAction::Write(b"\x1b[1;2D".to_vec())
        );
    }

    #[test]
    fn test_ctrl_c_is_etx() {
        let action = encode_key(Some(Key::Char('c')), Modifiers::CTRL, b"\x03");
        assert_eq!(action, KeyAction::Write(vec![0x03]));
    }

    #[test]
    fn test_clipboard_shortcuts() {
        assert_eq!(
            encode_key(Some(Key::Char('C')), Modifiers::CTRL | Modifiers::SHIFT, b""),
            KeyAction::CopySelection
        );
        assert_eq!(
            encode_key(Some(Key::Char('v')), Modifiers::CTRL, b"\x16"),
            KeyAction::RequestPaste
        );
        assert_eq!(
            encode_key(Some(Key::Char('V')), Modifiers::CTRL | Modifiers::SHIFT, b""),
            KeyAction::RequestPaste
        );
    }

    #[test]
    fn test_shift_arrows_scroll_viewport() {
        assert_eq!(
            encode_key(Some(Key::Up), Modifiers::SHIFT, b""),
            KeyAction::Scroll(-1)
        );
        assert_eq!(
            encode_key(Some(Key::Down), Modifiers::SHIFT, b""),
            KeyAction::Scroll(1)
        );
    }

    #[test]
    fn test_unmapped_key_ignored() {
        assert_eq!(encode_key(None, Modifiers::empty(), b""), KeyAction::Ignore);
    }

    #[test]
    fn test_mouse_report_encoding() {
        assert_eq!(
            encode_mouse(MouseEvent::Press, 0, 0),
            vec![0x1b, b'[', b'M', b' ', 33, 33]
        );
        assert_eq!(
            encode_mouse(MouseEvent::Release, 4, 2),
            vec![0x1b, b'[', b'M', b'!', 37, 35]
        );
        assert_eq!(encode_mouse(MouseEvent::Motion, 0, 0)[3], b'"');
    }
}
