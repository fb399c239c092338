use glam::Vec3;

use crate::primitive::LineVertex;

use super::{Brush, GeometrySink};

/// Points closer than this to the previous point are dropped.
const MIN_SEGMENT_LENGTH: f32 = 1e-6;

/// Rolling state of a connected line strip.
///
/// Each point becomes a vertex pair once the next point (or `line_end`) fixes its
/// direction:
/// - the first pair uses the raw first-segment direction,
/// - interior pairs use the unit bisector of the incoming and outgoing directions,
/// - the closing pair uses the raw last-segment direction.
///
/// Consecutive pairs are joined by two triangles. A strip of `n >= 2` points yields
/// `2n` vertices and `6(n - 1)` indices; shorter strips yield nothing.
#[derive(Debug, Clone, Default)]
pub struct LineBuilder {
    /// Last accepted point and the brush it was added with.
    previous: Option<(Vec3, Brush)>,
    /// Point accepted before `previous`.
    before: Vec3,
    points: usize,
}

impl LineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of points accepted since the last reset.
    #[inline]
    pub fn points_seen(&self) -> usize {
        self.points
    }

    /// Returns `true` while a strip is in progress.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.points > 0
    }

    /// Forgets the current strip without emitting anything.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Extends the strip to `point`, emitting the pair for the previous point.
    pub fn line_to<S: GeometrySink<LineVertex>>(&mut self, sink: &mut S, point: Vec3, brush: Brush) {
        let Some((prev, prev_brush)) = self.previous else {
            self.accept(point, brush);
            return;
        };

        if point.distance(prev) <= MIN_SEGMENT_LENGTH {
            return;
        }

        if self.points == 1 {
            push_pair(sink, prev, point - prev, prev_brush);
        } else {
            let incoming = (prev - self.before).normalize();
            let outgoing = (point - prev).normalize();
            // a full reversal has no bisector
            let bisector = (incoming + outgoing).try_normalize().unwrap_or(incoming);

            let base = sink.vertex_count();
            push_pair(sink, prev, bisector, prev_brush);
            push_joint(sink, base);
        }

        self.accept(point, brush);
    }

    /// Emits the closing pair (if the strip has at least two points) and resets.
    pub fn line_end<S: GeometrySink<LineVertex>>(&mut self, sink: &mut S) {
        if self.points >= 2 {
            if let Some((last, brush)) = self.previous {
                let base = sink.vertex_count();
                push_pair(sink, last, last - self.before, brush);
                push_joint(sink, base);
            }
        }
        self.reset();
    }

    fn accept(&mut self, point: Vec3, brush: Brush) {
        if let Some((prev, _)) = self.previous {
            self.before = prev;
        }
        self.previous = Some((point, brush));
        self.points += 1;
    }
}

fn push_pair<S: GeometrySink<LineVertex>>(sink: &mut S, at: Vec3, direction: Vec3, brush: Brush) {
    sink.push_vertex(LineVertex::new(at, direction, brush.color, brush.size));
    sink.push_vertex(LineVertex::new(at, -direction, brush.color, brush.size));
}

/// Two triangles between the pair at `base - 2` and the pair at `base`.
fn push_joint<S: GeometrySink<LineVertex>>(sink: &mut S, base: u32) {
    for index in [base - 2, base, base - 1, base - 1, base, base + 1] {
        sink.push_index(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::HostMesh;
    use crate::paint::Color;

    fn strip(points: &[Vec3]) -> HostMesh<LineVertex> {
        let mut mesh = HostMesh::new();
        let mut builder = LineBuilder::new();
        for &p in points {
            builder.line_to(&mut mesh, p, Brush::default());
        }
        builder.line_end(&mut mesh);
        mesh
    }

    #[test]
    fn counts_follow_point_count() {
        for n in 2..8 {
            let points: Vec<Vec3> = (0..n).map(|i| Vec3::new(i as f32, (i % 2) as f32, 0.0)).collect();
            let mesh = strip(&points);
            assert_eq!(mesh.vertices.len(), 2 * n, "n = {n}");
            assert_eq!(mesh.indices.len(), 6 * (n - 1), "n = {n}");
        }
    }

    #[test]
    fn fewer_than_two_points_emit_nothing() {
        assert_eq!(strip(&[]), HostMesh::new());
        assert_eq!(strip(&[Vec3::ONE]), HostMesh::new());
    }

    #[test]
    fn single_segment_indices() {
        let mesh = strip(&[Vec3::ZERO, Vec3::X]);
        assert_eq!(mesh.indices, vec![0, 2, 1, 1, 2, 3]);
    }

    #[test]
    fn indices_are_offset_by_existing_vertices() {
        let mut mesh = strip(&[Vec3::ZERO, Vec3::X]);
        let mut builder = LineBuilder::new();
        builder.line_to(&mut mesh, Vec3::Y, Brush::default());
        builder.line_to(&mut mesh, Vec3::ONE, Brush::default());
        builder.line_end(&mut mesh);
        assert_eq!(&mesh.indices[6..], &[4, 6, 5, 5, 6, 7]);
    }

    #[test]
    fn end_pairs_use_raw_segment_direction() {
        let mesh = strip(&[Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0)]);
        let v = &mesh.vertices;
        assert_eq!(v[0].direction(), Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(v[1].direction(), Vec3::new(-3.0, 0.0, 0.0));
        assert_eq!(v[2].direction(), Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(v[2].position(), Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn interior_joint_uses_unit_bisector() {
        let mesh = strip(&[Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Vec3::new(2.0, 5.0, 0.0)]);
        let joint = mesh.vertices[2].direction();
        assert!((joint.length() - 1.0).abs() < 1e-6);
        let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert!(joint.abs_diff_eq(expected, 1e-6), "{joint:?}");
        assert_eq!(mesh.vertices[3].direction(), -joint);
    }

    #[test]
    fn zero_length_segment_is_skipped() {
        let with_repeat = strip(&[Vec3::ZERO, Vec3::X, Vec3::X, Vec3::new(1.0, 1.0, 0.0)]);
        let without = strip(&[Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0)]);
        assert_eq!(with_repeat, without);
        assert!(with_repeat.vertices.iter().all(|v| v.direction().is_finite()));
    }

    #[test]
    fn reversal_falls_back_to_incoming_direction() {
        let mesh = strip(&[Vec3::ZERO, Vec3::X, Vec3::ZERO]);
        assert_eq!(mesh.vertices[2].direction(), Vec3::X);
        assert!(mesh.vertices.iter().all(|v| v.direction().is_finite()));
    }

    #[test]
    fn pair_keeps_brush_of_its_own_point() {
        let red = Brush::new(Color::from_straight(1.0, 0.0, 0.0, 1.0), 2.0);
        let blue = Brush::new(Color::from_straight(0.0, 0.0, 1.0, 1.0), 6.0);

        let mut mesh = HostMesh::new();
        let mut builder = LineBuilder::new();
        builder.line_to(&mut mesh, Vec3::ZERO, red);
        builder.line_to(&mut mesh, Vec3::X, blue);
        builder.line_end(&mut mesh);

        assert_eq!(mesh.vertices[0].size, 2.0);
        assert_eq!(mesh.vertices[0].color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(mesh.vertices[2].size, 6.0);
        assert_eq!(mesh.vertices[3].color, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn line_end_resets_state() {
        let mut mesh = HostMesh::new();
        let mut builder = LineBuilder::new();
        builder.line_to(&mut mesh, Vec3::ZERO, Brush::default());
        assert!(builder.is_open());
        builder.line_end(&mut mesh);
        assert!(!builder.is_open());
        assert_eq!(builder.points_seen(), 0);
        assert!(mesh.vertices.is_empty());
    }
}
