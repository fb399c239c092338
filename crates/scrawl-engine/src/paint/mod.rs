//! Color model shared by the scene and the renderers.
//!
//! Colors are linear, premultiplied alpha.

pub mod color;

pub use color::Color;
