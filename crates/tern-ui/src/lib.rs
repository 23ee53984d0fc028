//! tern-ui: window-collaborator abstraction
//!
//! Defines the events a window backend delivers, the draw directives it
//! consumes, and the `Surface` trait it implements. Backends live outside
//! this workspace; the shipped binary runs headless.

pub mod events;
pub mod frame;
pub mod traits;

pub use events::*;
pub use frame::Frame;
pub use traits::Surface;
