//! Scrawl: immediate-style debug drawing on wgpu.
//!
//! Lines, points and pixel-sized anchored squares are accumulated on the CPU in
//! growable streaming buffers, uploaded incrementally, and drawn instanced by a
//! compositor into any number of windows. Every window is a separate binding context;
//! per-context vertex bindings are cached and invalidated whenever a stream moves to
//! new storage.

pub mod buffer;
pub mod camera;
pub mod coords;
pub mod core;
pub mod device;
pub mod geometry;
pub mod logging;
pub mod paint;
pub mod primitive;
pub mod render;
pub mod scene;
pub mod time;
pub mod window;
