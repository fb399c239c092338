//! Scene buffers: what the user records each frame.
//!
//! A `Scene` owns one instance stream and one primitive buffer per kind, and fans
//! checkpoint operations out to all of them.

mod buffer;

pub use buffer::{Scene, SceneCounts, SharedScene};
