use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

use crate::buffer::{AttributeFormat, StepMode, VertexAttribute, VertexLayout};
use crate::paint::Color;

/// A vertex type drawn by a `PrimitiveBuffer`.
pub trait Vertex: Pod {
    const LAYOUT: VertexLayout;
}

/// Which pipeline a primitive buffer is drawn with.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PrimitiveKind {
    Lines,
    Points,
    Anchors,
}

impl PrimitiveKind {
    /// Draw order used by the compositor.
    pub const ALL: [PrimitiveKind; 3] = [
        PrimitiveKind::Lines,
        PrimitiveKind::Points,
        PrimitiveKind::Anchors,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PrimitiveKind::Lines => "lines",
            PrimitiveKind::Points => "points",
            PrimitiveKind::Anchors => "anchors",
        }
    }
}

#[inline]
fn rgba(color: Color) -> [f32; 4] {
    [color.r, color.g, color.b, color.a]
}

// ── lines ─────────────────────────────────────────────────────────────────

/// One side of a mitered line joint.
///
/// The shader offsets `position` by `size / 2` pixels along the screen-space normal of
/// `direction`. The two vertices of a pair carry opposite directions.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub direction: [f32; 3],
    pub color: [f32; 4],
    pub size: f32,
}

impl LineVertex {
    pub fn new(position: Vec3, direction: Vec3, color: Color, size: f32) -> Self {
        Self {
            position: position.to_array(),
            direction: direction.to_array(),
            color: rgba(color),
            size,
        }
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        Vec3::from_array(self.direction)
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    const ATTRIBUTES: [VertexAttribute; 4] = [
        VertexAttribute::new(0, AttributeFormat::Float32x3, offset_of!(LineVertex, position) as u64),
        VertexAttribute::new(1, AttributeFormat::Float32x3, offset_of!(LineVertex, direction) as u64),
        VertexAttribute::new(2, AttributeFormat::Float32x4, offset_of!(LineVertex, color) as u64),
        VertexAttribute::new(3, AttributeFormat::Float32, offset_of!(LineVertex, size) as u64),
    ];
}

impl Vertex for LineVertex {
    const LAYOUT: VertexLayout = VertexLayout {
        stride: size_of::<LineVertex>() as u64,
        step: StepMode::Vertex,
        attributes: &Self::ATTRIBUTES,
    };
}

// ── points ────────────────────────────────────────────────────────────────

/// Corner of a round point sprite. `corner` is in `[-1, 1]²`; the shader scales it to
/// `size` pixels in diameter and discards fragments outside the unit circle.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PointVertex {
    pub position: [f32; 3],
    pub corner: [f32; 2],
    pub color: [f32; 4],
    pub size: f32,
}

impl PointVertex {
    pub fn new(position: Vec3, corner: Vec2, color: Color, size: f32) -> Self {
        Self {
            position: position.to_array(),
            corner: corner.to_array(),
            color: rgba(color),
            size,
        }
    }

    const ATTRIBUTES: [VertexAttribute; 4] = [
        VertexAttribute::new(0, AttributeFormat::Float32x3, offset_of!(PointVertex, position) as u64),
        VertexAttribute::new(1, AttributeFormat::Float32x2, offset_of!(PointVertex, corner) as u64),
        VertexAttribute::new(2, AttributeFormat::Float32x4, offset_of!(PointVertex, color) as u64),
        VertexAttribute::new(3, AttributeFormat::Float32, offset_of!(PointVertex, size) as u64),
    ];
}

impl Vertex for PointVertex {
    const LAYOUT: VertexLayout = VertexLayout {
        stride: size_of::<PointVertex>() as u64,
        step: StepMode::Vertex,
        attributes: &Self::ATTRIBUTES,
    };
}

// ── anchored squares ──────────────────────────────────────────────────────

/// Corner of a screen-aligned square pinned to a 3D anchor. `offset` is in pixels.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct AnchorVertex {
    pub anchor: [f32; 3],
    pub offset: [f32; 2],
    pub color: [f32; 4],
}

impl AnchorVertex {
    pub fn new(anchor: Vec3, offset: Vec2, color: Color) -> Self {
        Self {
            anchor: anchor.to_array(),
            offset: offset.to_array(),
            color: rgba(color),
        }
    }

    const ATTRIBUTES: [VertexAttribute; 3] = [
        VertexAttribute::new(0, AttributeFormat::Float32x3, offset_of!(AnchorVertex, anchor) as u64),
        VertexAttribute::new(1, AttributeFormat::Float32x2, offset_of!(AnchorVertex, offset) as u64),
        VertexAttribute::new(2, AttributeFormat::Float32x4, offset_of!(AnchorVertex, color) as u64),
    ];
}

impl Vertex for AnchorVertex {
    const LAYOUT: VertexLayout = VertexLayout {
        stride: size_of::<AnchorVertex>() as u64,
        step: StepMode::Vertex,
        attributes: &Self::ATTRIBUTES,
    };
}

// ── instances ─────────────────────────────────────────────────────────────

/// Per-instance model transform, column-major. Occupies shader locations 8..=11.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct InstanceTransform {
    pub transform: [[f32; 4]; 4],
}

impl InstanceTransform {
    pub const IDENTITY: Self = Self {
        transform: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    const ATTRIBUTES: [VertexAttribute; 4] = [
        VertexAttribute::new(8, AttributeFormat::Float32x4, 0),
        VertexAttribute::new(9, AttributeFormat::Float32x4, 16),
        VertexAttribute::new(10, AttributeFormat::Float32x4, 32),
        VertexAttribute::new(11, AttributeFormat::Float32x4, 48),
    ];

    pub const LAYOUT: VertexLayout = VertexLayout {
        stride: size_of::<InstanceTransform>() as u64,
        step: StepMode::Instance,
        attributes: &Self::ATTRIBUTES,
    };

    #[inline]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.transform)
    }
}

impl From<Mat4> for InstanceTransform {
    fn from(m: Mat4) -> Self {
        Self {
            transform: m.to_cols_array_2d(),
        }
    }
}
