//! Surface abstraction
//!
//! The interface a window backend implements to host a terminal session.
//! The session never touches a window system directly: it hands the backend
//! finished frames and clipboard requests, and receives `WindowEvent`s in
//! return.

use crate::events::Metrics;
use crate::frame::Frame;

/// A rendering surface plus clipboard transport
pub trait Surface {
    /// Font and border metrics for the pixel-to-cell transform
    fn metrics(&self) -> Metrics;

    /// Present a finished frame
    fn draw(&mut self, frame: &Frame);

    /// Place bytes on the clipboard
    fn clipboard_set(&mut self, data: &[u8]);

    /// Request the clipboard contents. The answer arrives asynchronously as
    /// a `WindowEvent::SelectionProvide`.
    fn clipboard_get(&mut self);
}
