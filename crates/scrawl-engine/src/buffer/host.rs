//! In-memory `BufferDevice`.
//!
//! Storage lives in host `Vec<u8>`s. Every call is counted so callers can check what
//! reached the "device": how many buffers were allocated and released, how many bytes
//! were uploaded, how many bindings were built and against which buffers. Used for
//! headless runs and for the crate's own tests.

use std::cell::RefCell;
use std::collections::HashMap;

use bytemuck::Pod;

use super::{BindingSources, BufferDesc, BufferDevice, BufferError, BufferRole, ContextId};

/// Buffer handle issued by [`HostDevice`].
#[derive(Debug, PartialEq, Eq)]
pub struct HostBuffer {
    id: u64,
    role: BufferRole,
    size: u64,
}

impl HostBuffer {
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn role(&self) -> BufferRole {
        self.role
    }

    /// Size in bytes.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Binding issued by [`HostDevice`]: which buffer ids were captured, for which context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostBinding {
    pub context: ContextId,
    /// Monotonic build counter across the whole device.
    pub serial: u64,
    pub vertices: u64,
    pub indices: u64,
    pub instances: u64,
}

/// Call counters.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct HostStats {
    pub allocations: u64,
    pub releases: u64,
    pub copies: u64,
    pub bytes_copied: u64,
    pub writes: u64,
    pub bytes_written: u64,
    pub bindings: u64,
}

#[derive(Default)]
struct HostState {
    next_id: u64,
    buffers: HashMap<u64, Vec<u8>>,
    stats: HostStats,
}

/// Host-memory graphics device.
pub struct HostDevice {
    state: RefCell<HostState>,
    max_buffer_size: u64,
}

impl HostDevice {
    pub fn new() -> Self {
        Self::with_max_buffer_size(u64::MAX)
    }

    /// Device whose allocations fail above `limit` bytes.
    pub fn with_max_buffer_size(limit: u64) -> Self {
        Self {
            state: RefCell::new(HostState::default()),
            max_buffer_size: limit,
        }
    }

    pub fn stats(&self) -> HostStats {
        self.state.borrow().stats
    }

    /// Number of buffers allocated and not yet released.
    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn is_live(&self, id: u64) -> bool {
        self.state.borrow().buffers.contains_key(&id)
    }

    /// Reads the first `count` elements of `buffer` back from storage.
    ///
    /// # Panics
    /// Panics if the buffer was released or is smaller than `count` elements.
    pub fn read<T: Pod>(&self, buffer: &HostBuffer, count: usize) -> Vec<T> {
        let state = self.state.borrow();
        let bytes = state
            .buffers
            .get(&buffer.id)
            .unwrap_or_else(|| panic!("read from released host buffer #{}", buffer.id));
        let len = count * std::mem::size_of::<T>();
        assert!(len <= bytes.len(), "read past end of host buffer #{}", buffer.id);
        bytemuck::pod_collect_to_vec(&bytes[..len])
    }
}

impl Default for HostDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferDevice for HostDevice {
    type Buffer = HostBuffer;
    type Binding = HostBinding;

    fn create_buffer(&self, desc: &BufferDesc) -> Result<HostBuffer, BufferError> {
        if desc.size > self.max_buffer_size {
            return Err(BufferError::TooLarge {
                label: desc.label,
                requested: desc.size,
                limit: self.max_buffer_size,
            });
        }

        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.buffers.insert(id, vec![0; desc.size as usize]);
        state.stats.allocations += 1;

        Ok(HostBuffer {
            id,
            role: desc.role,
            size: desc.size,
        })
    }

    fn release_buffer(&self, buffer: HostBuffer) {
        let mut state = self.state.borrow_mut();
        if state.buffers.remove(&buffer.id).is_none() {
            panic!("double release of host buffer #{}", buffer.id);
        }
        state.stats.releases += 1;
    }

    fn copy_buffer(&self, src: &HostBuffer, dst: &HostBuffer, size: u64) {
        let mut state = self.state.borrow_mut();
        let len = size as usize;

        let prefix = match state.buffers.get(&src.id) {
            Some(bytes) => bytes[..len].to_vec(),
            None => panic!("copy from released host buffer #{}", src.id),
        };
        match state.buffers.get_mut(&dst.id) {
            Some(bytes) => bytes[..len].copy_from_slice(&prefix),
            None => panic!("copy into released host buffer #{}", dst.id),
        }

        state.stats.copies += 1;
        state.stats.bytes_copied += size;
    }

    fn write_buffer(&self, buffer: &HostBuffer, offset: u64, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        let start = offset as usize;

        match state.buffers.get_mut(&buffer.id) {
            Some(bytes) => bytes[start..start + data.len()].copy_from_slice(data),
            None => panic!("write to released host buffer #{}", buffer.id),
        }

        state.stats.writes += 1;
        state.stats.bytes_written += data.len() as u64;
    }

    fn create_binding(
        &self,
        context: ContextId,
        sources: BindingSources<'_, HostBuffer>,
    ) -> HostBinding {
        let mut state = self.state.borrow_mut();
        for buffer in [sources.vertices, sources.indices, sources.instances] {
            assert!(
                state.buffers.contains_key(&buffer.id),
                "binding references released host buffer #{}",
                buffer.id
            );
        }

        state.stats.bindings += 1;
        HostBinding {
            context,
            serial: state.stats.bindings,
            vertices: sources.vertices.id,
            indices: sources.indices.id,
            instances: sources.instances.id,
        }
    }
}
