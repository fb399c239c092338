//! CPU-side geometry generation for the primitive buffers.
//!
//! Builders append into any [`GeometrySink`]; `PrimitiveBuffer` is the sink used at
//! runtime, [`HostMesh`] is a plain `Vec` pair.

mod line;
mod quad;

pub use line::LineBuilder;
pub use quad::{anchored_square, point_sprite, QUAD_INDICES};

use crate::paint::Color;

/// Destination for generated vertices and indices.
///
/// Indices are absolute: builders read `vertex_count` before appending and offset
/// their indices by it.
pub trait GeometrySink<V> {
    fn vertex_count(&self) -> u32;
    fn push_vertex(&mut self, vertex: V);
    fn push_index(&mut self, index: u32);
}

/// Current drawing state applied to newly appended geometry.
///
/// `size` is in pixels: line width, point diameter or square edge.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Brush {
    pub color: Color,
    pub size: f32,
}

impl Brush {
    #[inline]
    pub const fn new(color: Color, size: f32) -> Self {
        Self { color, size }
    }
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            size: 1.0,
        }
    }
}

/// Geometry kept in host memory.
#[derive(Debug, Clone, PartialEq)]
pub struct HostMesh<V> {
    pub vertices: Vec<V>,
    pub indices: Vec<u32>,
}

impl<V> HostMesh<V> {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }
}

impl<V> Default for HostMesh<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> GeometrySink<V> for HostMesh<V> {
    #[inline]
    fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    #[inline]
    fn push_vertex(&mut self, vertex: V) {
        self.vertices.push(vertex);
    }

    #[inline]
    fn push_index(&mut self, index: u32) {
        self.indices.push(index);
    }
}
