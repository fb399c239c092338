use glam::{Vec2, Vec3};

use crate::primitive::{AnchorVertex, PointVertex};

use super::{Brush, GeometrySink};

/// Two counter-clockwise triangles over corners 0..4.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

const CORNERS: [Vec2; 4] = [
    Vec2::new(-1.0, -1.0),
    Vec2::new(1.0, -1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(-1.0, 1.0),
];

fn quad_indices(base: u32) -> impl Iterator<Item = u32> {
    QUAD_INDICES.into_iter().map(move |index| base + index)
}

/// Screen-aligned square of `brush.size` pixels pinned to `anchor`.
pub fn anchored_square<S: GeometrySink<AnchorVertex>>(sink: &mut S, anchor: Vec3, brush: Brush) {
    let half = brush.size * 0.5;
    let base = sink.vertex_count();
    for corner in CORNERS {
        sink.push_vertex(AnchorVertex::new(anchor, corner * half, brush.color));
    }
    for index in quad_indices(base) {
        sink.push_index(index);
    }
}

/// Round point of `brush.size` pixels in diameter at `position`.
pub fn point_sprite<S: GeometrySink<PointVertex>>(sink: &mut S, position: Vec3, brush: Brush) {
    let base = sink.vertex_count();
    for corner in CORNERS {
        sink.push_vertex(PointVertex::new(position, corner, brush.color, brush.size));
    }
    for index in quad_indices(base) {
        sink.push_index(index);
    }
}
