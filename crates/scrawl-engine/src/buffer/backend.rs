use super::{BufferError, ContextId, VertexLayout};

/// What a device buffer is read as when drawing.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferRole {
    Vertex,
    Index,
    Instance,
}

/// Parameters for allocating one device buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BufferDesc {
    pub label: &'static str,
    pub role: BufferRole,
    /// Size in bytes.
    pub size: u64,
}

/// Buffers a vertex binding reads from, with the layouts they are read with.
pub struct BindingSources<'a, B> {
    pub vertex_layout: &'a VertexLayout,
    pub instance_layout: &'a VertexLayout,
    pub vertices: &'a B,
    pub indices: &'a B,
    pub instances: &'a B,
}

/// Buffer-level operations the streaming layer needs from a graphics device.
///
/// Implementations are expected to be cheap handles (the wgpu one wraps cloned
/// `Device`/`Queue` handles). All calls happen on the thread that owns the device.
pub trait BufferDevice {
    /// Owned device buffer handle.
    type Buffer;

    /// Captured vertex-input state for one rendering context. Cloned into draw calls.
    type Binding: Clone;

    /// Allocates an uninitialized buffer of `desc.size` bytes.
    fn create_buffer(&self, desc: &BufferDesc) -> Result<Self::Buffer, BufferError>;

    /// Releases a buffer. The handle must not be used afterwards.
    fn release_buffer(&self, buffer: Self::Buffer);

    /// Device-side copy of `size` bytes from the start of `src` to the start of `dst`.
    fn copy_buffer(&self, src: &Self::Buffer, dst: &Self::Buffer, size: u64);

    /// Overwrites `data.len()` bytes of `buffer` starting at `offset`.
    fn write_buffer(&self, buffer: &Self::Buffer, offset: u64, data: &[u8]);

    /// Builds the vertex-input binding for `context` against the given buffers.
    fn create_binding(
        &self,
        context: ContextId,
        sources: BindingSources<'_, Self::Buffer>,
    ) -> Self::Binding;
}
