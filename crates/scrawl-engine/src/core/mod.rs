//! Contracts between the window runtime and the application.
//!
//! The runtime owns windows, surfaces and the device; applications see one
//! [`FrameCtx`] per window per frame.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
