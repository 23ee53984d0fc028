//! tern-core: Core terminal emulation library
//!
//! This crate provides the building blocks of the emulator:
//! - Cell, style, and palette types
//! - Screen buffer management (grids, scrollback, selection)
//! - Escape sequence parsing
//! - Keyboard and mouse input encoding
//! - Unix PTY handling

pub mod cell;
pub mod color;
pub mod grid;
pub mod input;
pub mod parser;
pub mod pty;
pub mod screen;
pub mod scrollback;
pub mod term;

pub use cell::{Cell, Style};
pub use color::{Palette, Rgb};
pub use grid::Grid;
pub use parser::Parser;
pub use pty::{Pty, PtyConfig, PtyError};
pub use screen::{Cursor, MouseMode, Screen, Selection};
pub use scrollback::ScrollbackRing;
pub use term::Terminal;
