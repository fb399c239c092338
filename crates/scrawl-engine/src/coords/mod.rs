//! Screen-space quantities shared by the camera and the compositor.
//!
//! Everything here is in physical pixels.

mod viewport;

pub use viewport::Viewport;
