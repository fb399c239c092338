//! Attribute layout descriptors.
//!
//! Primitive vertex types describe their memory layout with plain data instead of
//! backend types so that `PrimitiveBuffer` stays generic over the device.

/// Scalar/vector format of one vertex attribute. All formats are 32-bit floats.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AttributeFormat {
    Float32,
    Float32x2,
    Float32x3,
    Float32x4,
}

impl AttributeFormat {
    /// Size of the attribute in bytes.
    #[inline]
    pub const fn size(self) -> u64 {
        match self {
            AttributeFormat::Float32 => 4,
            AttributeFormat::Float32x2 => 8,
            AttributeFormat::Float32x3 => 12,
            AttributeFormat::Float32x4 => 16,
        }
    }

    pub(crate) fn to_wgpu(self) -> wgpu::VertexFormat {
        match self {
            AttributeFormat::Float32 => wgpu::VertexFormat::Float32,
            AttributeFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
            AttributeFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
            AttributeFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
        }
    }
}

/// One attribute: shader location, format and byte offset inside the element.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VertexAttribute {
    pub location: u32,
    pub format: AttributeFormat,
    pub offset: u64,
}

impl VertexAttribute {
    #[inline]
    pub const fn new(location: u32, format: AttributeFormat, offset: u64) -> Self {
        Self {
            location,
            format,
            offset,
        }
    }
}

/// How often an attribute stream advances.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StepMode {
    /// Advances once per vertex.
    Vertex,
    /// Advances once per instance (divisor 1).
    Instance,
}

/// Layout of one element type in a device buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexLayout {
    pub stride: u64,
    pub step: StepMode,
    pub attributes: &'static [VertexAttribute],
}

impl VertexLayout {
    /// Byte offset one past the last attribute.
    pub fn attribute_end(&self) -> u64 {
        self.attributes
            .iter()
            .map(|a| a.offset + a.format.size())
            .max()
            .unwrap_or(0)
    }

    /// Returns `true` if attributes fit in the stride and do not overlap.
    pub fn is_consistent(&self) -> bool {
        if self.attribute_end() > self.stride {
            return false;
        }

        let mut spans: Vec<(u64, u64)> = self
            .attributes
            .iter()
            .map(|a| (a.offset, a.offset + a.format.size()))
            .collect();
        spans.sort_unstable();
        spans.windows(2).all(|w| w[0].1 <= w[1].0)
    }

    pub(crate) fn wgpu_attributes(&self) -> Vec<wgpu::VertexAttribute> {
        self.attributes
            .iter()
            .map(|a| wgpu::VertexAttribute {
                format: a.format.to_wgpu(),
                offset: a.offset,
                shader_location: a.location,
            })
            .collect()
    }

    pub(crate) fn wgpu_step_mode(&self) -> wgpu::VertexStepMode {
        match self.step {
            StepMode::Vertex => wgpu::VertexStepMode::Vertex,
            StepMode::Instance => wgpu::VertexStepMode::Instance,
        }
    }
}
