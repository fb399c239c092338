//! GPU rendering of scenes.
//!
//! The `Compositor` owns the pipelines and globals uniform; scenes own their buffers.
//! Primitive sizes are in pixels and converted to clip space in the shaders using the
//! viewport uniform.

mod compositor;
mod ctx;

pub use compositor::Compositor;
pub use ctx::{RenderCtx, RenderTarget};
