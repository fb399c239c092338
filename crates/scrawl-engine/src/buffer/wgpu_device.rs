use super::{BindingSources, BufferDesc, BufferDevice, BufferError, BufferRole, ContextId};

/// `BufferDevice` backed by wgpu.
///
/// Holds cloned device/queue handles, so constructing one per frame is cheap.
#[derive(Clone)]
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl WgpuDevice {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            device: device.clone(),
            queue: queue.clone(),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

/// Vertex-input state for one context: the buffers set at slots 0 (vertices),
/// 1 (instances) and the index buffer.
///
/// wgpu has no persistent vertex array object; the binding captures which buffer
/// handles a context draws from, and becomes stale when any of them is reallocated.
#[derive(Debug, Clone)]
pub struct WgpuBinding {
    pub context: ContextId,
    pub vertices: wgpu::Buffer,
    pub indices: wgpu::Buffer,
    pub instances: wgpu::Buffer,
}

fn usage_for(role: BufferRole) -> wgpu::BufferUsages {
    let base = wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST;
    match role {
        BufferRole::Vertex | BufferRole::Instance => base | wgpu::BufferUsages::VERTEX,
        BufferRole::Index => base | wgpu::BufferUsages::INDEX,
    }
}

/// wgpu requires copy/write sizes to be multiples of 4.
fn aligned(size: u64) -> u64 {
    size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT)
}

impl BufferDevice for WgpuDevice {
    type Buffer = wgpu::Buffer;
    type Binding = WgpuBinding;

    fn create_buffer(&self, desc: &BufferDesc) -> Result<wgpu::Buffer, BufferError> {
        let limit = self.device.limits().max_buffer_size;
        let size = aligned(desc.size);
        if size > limit {
            return Err(BufferError::TooLarge {
                label: desc.label,
                requested: size,
                limit,
            });
        }

        Ok(self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(desc.label),
            size,
            usage: usage_for(desc.role),
            mapped_at_creation: false,
        }))
    }

    fn release_buffer(&self, buffer: wgpu::Buffer) {
        // freed once pending copies and stale binding clones are gone
        drop(buffer);
    }

    fn copy_buffer(&self, src: &wgpu::Buffer, dst: &wgpu::Buffer, size: u64) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scrawl buffer growth"),
            });
        encoder.copy_buffer_to_buffer(src, 0, dst, 0, aligned(size));
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn write_buffer(&self, buffer: &wgpu::Buffer, offset: u64, data: &[u8]) {
        // element strides in this crate are multiples of 4, so offsets already are
        debug_assert_eq!(offset % wgpu::COPY_BUFFER_ALIGNMENT, 0);
        self.queue.write_buffer(buffer, offset, data);
    }

    fn create_binding(
        &self,
        context: ContextId,
        sources: BindingSources<'_, wgpu::Buffer>,
    ) -> WgpuBinding {
        debug_assert!(sources.vertex_layout.is_consistent());
        debug_assert!(sources.instance_layout.is_consistent());

        WgpuBinding {
            context,
            vertices: sources.vertices.clone(),
            indices: sources.indices.clone(),
            instances: sources.instances.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_sizes_round_up_to_alignment() {
        assert_eq!(aligned(0), 0);
        assert_eq!(aligned(4), 4);
        assert_eq!(aligned(6), 8);
        assert_eq!(aligned(48), 48);
    }

    #[test]
    fn index_buffers_are_not_vertex_buffers() {
        assert!(usage_for(BufferRole::Index).contains(wgpu::BufferUsages::INDEX));
        assert!(!usage_for(BufferRole::Index).contains(wgpu::BufferUsages::VERTEX));
        assert!(usage_for(BufferRole::Instance).contains(wgpu::BufferUsages::VERTEX));
    }
}
