//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Windows, the shared GPU device, and one surface per
//! window.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
