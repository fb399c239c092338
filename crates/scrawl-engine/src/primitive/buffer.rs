use crate::buffer::{
    BindingCache, BindingSources, BufferDevice, BufferError, BufferRole, ContextId, StreamBuffer,
    DEFAULT_CAPACITY,
};
use crate::geometry::GeometrySink;

use super::{AnchorVertex, InstanceTransform, LineVertex, PointVertex, PrimitiveKind, Vertex};

/// Everything the compositor needs to issue one instanced indexed draw.
#[derive(Debug, Clone)]
pub struct DrawCall<B> {
    pub kind: PrimitiveKind,
    pub binding: B,
    pub index_count: u32,
    pub instance_count: u32,
}

/// Vertex + index streams of one primitive kind, with per-context bindings.
///
/// The instance stream is not owned here: the scene lends it to every primitive buffer
/// during `prepare`, so the same transforms apply to all kinds.
pub struct PrimitiveBuffer<V, D: BufferDevice> {
    kind: PrimitiveKind,
    vertices: StreamBuffer<V, D>,
    indices: StreamBuffer<u32, D>,
    bindings: BindingCache<D::Binding>,

    /// Instance stream generation the current bindings were built against.
    instance_generation: Option<u64>,
}

pub type LineBuffer<D> = PrimitiveBuffer<LineVertex, D>;
pub type PointBuffer<D> = PrimitiveBuffer<PointVertex, D>;
pub type AnchorBuffer<D> = PrimitiveBuffer<AnchorVertex, D>;

impl<V: Vertex, D: BufferDevice> PrimitiveBuffer<V, D> {
    pub fn new(kind: PrimitiveKind) -> Self {
        Self::with_capacity(kind, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(kind: PrimitiveKind, capacity: usize) -> Self {
        let label = kind.label();
        Self {
            kind,
            vertices: StreamBuffer::with_capacity(label, BufferRole::Vertex, capacity),
            indices: StreamBuffer::with_capacity(label, BufferRole::Index, capacity),
            bindings: BindingCache::new(),
            instance_generation: None,
        }
    }

    #[inline]
    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    #[inline]
    pub fn vertices(&self) -> &StreamBuffer<V, D> {
        &self.vertices
    }

    #[inline]
    pub fn indices(&self) -> &StreamBuffer<u32, D> {
        &self.indices
    }

    #[inline]
    pub fn bindings(&self) -> &BindingCache<D::Binding> {
        &self.bindings
    }

    pub fn save(&mut self) {
        self.vertices.save();
        self.indices.save();
    }

    pub fn restore(&mut self) {
        self.vertices.restore();
        self.indices.restore();
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    pub fn forget_context(&mut self, context: ContextId) {
        self.bindings.forget(context);
    }

    /// Uploads pending geometry and returns the draw for `context`.
    ///
    /// Returns `Ok(None)` without touching the device when there is nothing to draw
    /// (no vertices, no indices or no instances). Any reallocation, of this buffer's
    /// streams or of the shared instance stream, invalidates the bindings of every
    /// context; only `context` is rebuilt here.
    pub fn prepare(
        &mut self,
        device: &D,
        context: ContextId,
        instances: &mut StreamBuffer<InstanceTransform, D>,
    ) -> Result<Option<DrawCall<D::Binding>>, BufferError> {
        if self.vertices.is_empty() || self.indices.is_empty() || instances.is_empty() {
            return Ok(None);
        }

        self.bindings.ensure(context);

        // All three are attempted so a failure in one cannot hide a reallocation in another.
        let synced = [
            self.vertices.sync(device),
            self.indices.sync(device),
            instances.sync(device),
        ];

        let mut reallocated = synced.iter().any(|r| matches!(r, Ok(true)));
        if self.instance_generation != Some(instances.generation()) {
            self.instance_generation = Some(instances.generation());
            reallocated = true;
        }
        if reallocated {
            self.bindings.invalidate_all();
        }

        for result in synced {
            result?;
        }

        let (Some(vertices), Some(indices), Some(instance_buffer)) = (
            self.vertices.storage(),
            self.indices.storage(),
            instances.storage(),
        ) else {
            return Ok(None);
        };

        let binding = self
            .bindings
            .get_or_configure(context, || {
                device.create_binding(
                    context,
                    BindingSources {
                        vertex_layout: &V::LAYOUT,
                        instance_layout: &InstanceTransform::LAYOUT,
                        vertices,
                        indices,
                        instances: instance_buffer,
                    },
                )
            })
            .clone();

        Ok(Some(DrawCall {
            kind: self.kind,
            binding,
            index_count: count_u32(self.kind, self.indices.len())?,
            instance_count: count_u32(self.kind, instances.len())?,
        }))
    }

    /// Releases device storage. Bindings are dropped with it.
    pub fn release(&mut self, device: &D) {
        self.vertices.release(device);
        self.indices.release(device);
        self.bindings.invalidate_all();
    }
}

fn count_u32(kind: PrimitiveKind, len: usize) -> Result<u32, BufferError> {
    u32::try_from(len).map_err(|_| BufferError::CapacityOverflow {
        label: kind.label(),
        elements: len,
    })
}

impl<V: Vertex, D: BufferDevice> GeometrySink<V> for PrimitiveBuffer<V, D> {
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
