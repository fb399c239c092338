use std::cell::RefCell;
use std::rc::Rc;

use glam::{Mat4, Quat, Vec3};

use crate::buffer::{BufferDevice, BufferError, BufferRole, ContextId, StreamBuffer, DEFAULT_CAPACITY};
use crate::geometry::{anchored_square, point_sprite, Brush, LineBuilder};
use crate::paint::Color;
use crate::primitive::{
    AnchorBuffer, DrawCall, InstanceTransform, LineBuffer, PointBuffer, PrimitiveKind,
};

/// Rotation vectors shorter than this are treated as no rotation.
const MIN_ROTATION_ANGLE: f32 = 1e-6;

/// Scene shared between the code that records it and every compositor drawing it.
pub type SharedScene<D> = Rc<RefCell<Scene<D>>>;

/// Stream lengths of every buffer in a scene.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct SceneCounts {
    pub instances: usize,
    pub line_vertices: usize,
    pub line_indices: usize,
    pub point_vertices: usize,
    pub point_indices: usize,
    pub anchor_vertices: usize,
    pub anchor_indices: usize,
}

/// Immediate-mode debug geometry: points, connected lines and anchored squares,
/// drawn once per instance transform.
///
/// Geometry is recorded with the current brush (`set_color`, `set_size`), which only
/// affects primitives appended afterwards. `save`/`restore`/`clear` apply to every
/// primitive buffer at once; the instance stream has its own set.
///
/// A new scene holds a single identity instance so geometry is visible by default.
pub struct Scene<D: BufferDevice> {
    instances: StreamBuffer<InstanceTransform, D>,
    lines: LineBuffer<D>,
    points: PointBuffer<D>,
    anchors: AnchorBuffer<D>,

    brush: Brush,
    line: LineBuilder,
}

impl<D: BufferDevice> Scene<D> {
    pub fn new() -> Self {
        Self::with_initial_capacity(DEFAULT_CAPACITY)
    }

    /// Scene whose streams start with room for `capacity` elements each.
    pub fn with_initial_capacity(capacity: usize) -> Self {
        let mut instances = StreamBuffer::with_capacity("instances", BufferRole::Instance, capacity);
        instances.push(InstanceTransform::IDENTITY);

        Self {
            instances,
            lines: LineBuffer::with_capacity(PrimitiveKind::Lines, capacity),
            points: PointBuffer::with_capacity(PrimitiveKind::Points, capacity),
            anchors: AnchorBuffer::with_capacity(PrimitiveKind::Anchors, capacity),
            brush: Brush::default(),
            line: LineBuilder::new(),
        }
    }

    /// Wraps the scene for sharing with compositors.
    pub fn shared(self) -> SharedScene<D> {
        Rc::new(RefCell::new(self))
    }

    // ── brush ─────────────────────────────────────────────────────────────

    pub fn set_color(&mut self, color: impl Into<Color>) {
        self.brush.color = color.into();
    }

    /// Sets the pixel size used for line width, point diameter and square edge.
    pub fn set_size(&mut self, size: f32) {
        self.brush.size = size;
    }

    #[inline]
    pub fn brush(&self) -> Brush {
        self.brush
    }

    // ── primitives ────────────────────────────────────────────────────────

    pub fn point(&mut self, position: Vec3) {
        point_sprite(&mut self.points, position, self.brush);
    }

    /// Single segment. Closes any line in progress first.
    pub fn line(&mut self, from: Vec3, to: Vec3) {
        self.line_end();
        self.line_to(from);
        self.line_to(to);
        self.line_end();
    }

    /// Extends the current connected line to `point`.
    pub fn line_to(&mut self, point: Vec3) {
        self.line.line_to(&mut self.lines, point, self.brush);
    }

    /// Finishes the current connected line.
    pub fn line_end(&mut self) {
        self.line.line_end(&mut self.lines);
    }

    /// Screen-aligned square pinned to `anchor`.
    pub fn anchored_square(&mut self, anchor: Vec3) {
        anchored_square(&mut self.anchors, anchor, self.brush);
    }

    // ── instances ─────────────────────────────────────────────────────────

    pub fn add_instance(&mut self, transform: Mat4) {
        self.instances.push(transform.into());
    }

    /// Adds `T * R * S`, where `rotation` is an axis-angle vector (angle = its length).
    pub fn add_instance_trs(&mut self, position: Vec3, rotation: Vec3, scale: Vec3) {
        self.add_instance(trs(position, rotation, scale));
    }

    pub fn save_instances(&mut self) {
        self.instances.save();
    }

    pub fn restore_instances(&mut self) {
        self.instances.restore();
    }

    /// Removes every instance, including the initial identity: nothing is drawn until
    /// one is added again.
    pub fn clear_instances(&mut self) {
        self.instances.clear();
    }

    // ── checkpoints ───────────────────────────────────────────────────────

    /// Checkpoints every primitive buffer.
    pub fn save(&mut self) {
        self.lines.save();
        self.points.save();
        self.anchors.save();
    }

    /// Drops primitives recorded since `save`. A line in progress is abandoned.
    pub fn restore(&mut self) {
        self.line.reset();
        self.lines.restore();
        self.points.restore();
        self.anchors.restore();
    }

    /// Drops every primitive. A line in progress is abandoned. Instances are kept.
    pub fn clear(&mut self) {
        self.line.reset();
        self.lines.clear();
        self.points.clear();
        self.anchors.clear();
    }

    // ── drawing ───────────────────────────────────────────────────────────

    /// Uploads pending data for `kind` and returns its draw for `context`, if any.
    pub fn prepare(
        &mut self,
        device: &D,
        context: ContextId,
        kind: PrimitiveKind,
    ) -> Result<Option<DrawCall<D::Binding>>, BufferError> {
        match kind {
            PrimitiveKind::Lines => self.lines.prepare(device, context, &mut self.instances),
            PrimitiveKind::Points => self.points.prepare(device, context, &mut self.instances),
            PrimitiveKind::Anchors => self.anchors.prepare(device, context, &mut self.instances),
        }
    }

    /// Drops bindings held for a context that went away.
    pub fn forget_context(&mut self, context: ContextId) {
        self.lines.forget_context(context);
        self.points.forget_context(context);
        self.anchors.forget_context(context);
    }

    /// Releases all device storage. Recorded geometry is kept and re-uploaded on demand.
    pub fn release(&mut self, device: &D) {
        self.lines.release(device);
        self.points.release(device);
        self.anchors.release(device);
        self.instances.release(device);
    }

    // ── inspection ────────────────────────────────────────────────────────

    pub fn counts(&self) -> SceneCounts {
        SceneCounts {
            instances: self.instances.len(),
            line_vertices: self.lines.vertices().len(),
            line_indices: self.lines.indices().len(),
            point_vertices: self.points.vertices().len(),
            point_indices: self.points.indices().len(),
            anchor_vertices: self.anchors.vertices().len(),
            anchor_indices: self.anchors.indices().len(),
        }
    }

    #[inline]
    pub fn instances(&self) -> &StreamBuffer<InstanceTransform, D> {
        &self.instances
    }

    #[inline]
    pub fn lines(&self) -> &LineBuffer<D> {
        &self.lines
    }

    #[inline]
    pub fn points(&self) -> &PointBuffer<D> {
        &self.points
    }

    #[inline]
    pub fn anchors(&self) -> &AnchorBuffer<D> {
        &self.anchors
    }

    /// Returns `true` while a connected line is in progress.
    #[inline]
    pub fn is_line_open(&self) -> bool {
        self.line.is_open()
    }
}

impl<D: BufferDevice> Default for Scene<D> {
    fn default() -> Self {
        Self::new()
    }
}

fn trs(position: Vec3, rotation: Vec3, scale: Vec3) -> Mat4 {
    let angle = rotation.length();
    let rotation = if angle <= MIN_ROTATION_ANGLE {
        Quat::IDENTITY
    } else {
        Quat::from_axis_angle(rotation / angle, angle)
    };
    Mat4::from_translation(position) * Mat4::from_quat(rotation) * Mat4::from_scale(scale)
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;
    use crate::buffer::{HostBinding, HostDevice};

    type HostScene = Scene<HostDevice>;

    const A: ContextId = ContextId(1);
    const B: ContextId = ContextId(2);

    fn one_of_each(scene: &mut HostScene) {
        scene.point(Vec3::ZERO);
        scene.line(Vec3::ZERO, Vec3::X);
        scene.anchored_square(Vec3::Y);
    }

    fn draw(scene: &mut HostScene, device: &HostDevice, context: ContextId, kind: PrimitiveKind) -> HostBinding {
        scene
            .prepare(device, context, kind)
            .unwrap()
            .expect("draw call")
            .binding
    }

    #[test]
    fn new_scene_has_identity_instance() {
        let scene = HostScene::new();
        assert_eq!(scene.instances().as_slice(), &[InstanceTransform::IDENTITY]);
        assert_eq!(
            scene.counts(),
            SceneCounts {
                instances: 1,
                ..SceneCounts::default()
            }
        );
    }

    #[test]
    fn primitive_counts() {
        let mut scene = HostScene::new();
        one_of_each(&mut scene);
        assert_eq!(
            scene.counts(),
            SceneCounts {
                instances: 1,
                line_vertices: 4,
                line_indices: 6,
                point_vertices: 4,
                point_indices: 6,
                anchor_vertices: 4,
                anchor_indices: 6,
            }
        );
    }

    #[test]
    fn save_restore_fans_out_to_every_buffer() {
        let mut scene = HostScene::new();
        one_of_each(&mut scene);
        let saved = scene.counts();

        scene.save();
        one_of_each(&mut scene);
        one_of_each(&mut scene);
        assert_ne!(scene.counts(), saved);

        scene.restore();
        assert_eq!(scene.counts(), saved);
    }

    #[test]
    fn clear_fans_out_and_keeps_instances() {
        let mut scene = HostScene::new();
        scene.add_instance(Mat4::from_translation(Vec3::X));
        one_of_each(&mut scene);

        scene.clear();
        assert_eq!(
            scene.counts(),
            SceneCounts {
                instances: 2,
                ..SceneCounts::default()
            }
        );
    }

    #[test]
    fn instance_checkpoints_are_independent() {
        let mut scene = HostScene::new();
        one_of_each(&mut scene);
        scene.save_instances();
        scene.add_instance(Mat4::IDENTITY);
        scene.add_instance(Mat4::IDENTITY);
        scene.restore_instances();

        assert_eq!(scene.counts().instances, 1);
        assert_eq!(scene.counts().line_vertices, 4);

        scene.clear_instances();
        assert_eq!(scene.counts().instances, 0);
        assert_eq!(scene.counts().point_vertices, 4);
    }

    #[test]
    fn line_closes_the_line_in_progress() {
        let mut scene = HostScene::new();
        scene.line_to(Vec3::ZERO);
        scene.line_to(Vec3::X);
        scene.line(Vec3::Y, Vec3::ONE);

        assert!(!scene.is_line_open());
        assert_eq!(scene.counts().line_vertices, 8);
        assert_eq!(scene.counts().line_indices, 12);
    }

    #[test]
    fn connected_line_counts() {
        let mut scene = HostScene::new();
        for i in 0..5 {
            scene.line_to(Vec3::new(i as f32, (i * i) as f32, 0.0));
        }
        scene.line_end();
        assert_eq!(scene.counts().line_vertices, 10);
        assert_eq!(scene.counts().line_indices, 24);
    }

    #[test]
    fn restore_abandons_open_line() {
        let mut scene = HostScene::new();
        scene.save();
        scene.line_to(Vec3::ZERO);
        scene.line_to(Vec3::X);
        scene.restore();

        assert!(!scene.is_line_open());
        scene.line_to(Vec3::Y);
        scene.line_end();
        assert_eq!(scene.counts().line_vertices, 0);
        assert_eq!(scene.counts().line_indices, 0);
    }

    #[test]
    fn brush_applies_at_append_time_only() {
        let mut scene = HostScene::new();
        scene.set_color(Color::from_straight(1.0, 0.0, 0.0, 1.0));
        scene.set_size(4.0);
        scene.point(Vec3::ZERO);
        scene.set_color([0.0, 1.0, 0.0, 1.0]);
        scene.set_size(9.0);

        let first = scene.points().vertices().as_slice()[0];
        assert_eq!(first.color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(first.size, 4.0);
        assert_eq!(scene.brush().size, 9.0);
    }

    #[test]
    fn trs_applies_scale_then_rotation_then_translation() {
        let mut scene = HostScene::new();
        scene.add_instance_trs(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.0, 0.0, FRAC_PI_2),
            Vec3::splat(2.0),
        );

        let m = scene.instances().as_slice()[1].matrix();
        let p = m.transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(1.0, 4.0, 3.0), 1e-5), "{p:?}");
    }

    #[test]
    fn tiny_rotation_is_identity() {
        let m = trs(Vec3::ZERO, Vec3::splat(1e-8), Vec3::ONE);
        assert_eq!(m, Mat4::IDENTITY);
    }

    #[test]
    fn empty_kinds_produce_no_draw() {
        let device = HostDevice::new();
        let mut scene = HostScene::new();
        scene.point(Vec3::ZERO);

        assert!(scene.prepare(&device, A, PrimitiveKind::Lines).unwrap().is_none());
        assert!(scene.prepare(&device, A, PrimitiveKind::Anchors).unwrap().is_none());
        assert!(scene.prepare(&device, A, PrimitiveKind::Points).unwrap().is_some());
    }

    #[test]
    fn instance_growth_reaches_every_kind_and_context() {
        let device = HostDevice::new();
        let mut scene = HostScene::new();
        one_of_each(&mut scene);

        for context in [A, B] {
            for kind in PrimitiveKind::ALL {
                draw(&mut scene, &device, context, kind);
            }
        }

        for _ in 0..8 {
            scene.add_instance(Mat4::IDENTITY);
        }

        // context B draws first this time; A must still see the new instance buffer
        for context in [B, A] {
            for kind in PrimitiveKind::ALL {
                let binding = draw(&mut scene, &device, context, kind);
                assert_eq!(binding.instances, scene.instances().storage().unwrap().id());
                assert!(device.is_live(binding.vertices));
            }
        }
    }

    #[test]
    fn forget_context_drops_bindings() {
        let device = HostDevice::new();
        let mut scene = HostScene::new();
        one_of_each(&mut scene);
        for kind in PrimitiveKind::ALL {
            draw(&mut scene, &device, A, kind);
        }

        scene.forget_context(A);
        assert!(scene.lines().bindings().is_empty());
        assert!(scene.points().bindings().is_empty());
        assert!(scene.anchors().bindings().is_empty());
    }
}
