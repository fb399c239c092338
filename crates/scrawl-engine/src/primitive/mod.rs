//! Per-kind primitive buffers and their vertex formats.

mod buffer;
mod vertex;

pub use buffer::{AnchorBuffer, DrawCall, LineBuffer, PointBuffer, PrimitiveBuffer};
pub use vertex::{AnchorVertex, InstanceTransform, LineVertex, PointVertex, PrimitiveKind, Vertex};
