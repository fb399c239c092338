use std::marker::PhantomData;

use bytemuck::Pod;

use super::{BufferDesc, BufferDevice, BufferError, BufferRole};

/// A single device buffer of fixed capacity, measured in elements of `T`.
///
/// Only knows how to allocate, copy from a predecessor, write a range and be released.
/// Growth is handled one level up by replacing the whole `DeviceBuffer`.
pub struct DeviceBuffer<T, D: BufferDevice> {
    raw: D::Buffer,
    capacity: usize,
    _element: PhantomData<T>,
}

impl<T: Pod, D: BufferDevice> DeviceBuffer<T, D> {
    const STRIDE: u64 = std::mem::size_of::<T>() as u64;

    /// Allocates storage for `capacity` elements.
    pub fn allocate(
        device: &D,
        label: &'static str,
        role: BufferRole,
        capacity: usize,
    ) -> Result<Self, BufferError> {
        let size = (capacity as u64)
            .checked_mul(Self::STRIDE)
            .ok_or(BufferError::CapacityOverflow {
                label,
                elements: capacity,
            })?;

        let raw = device.create_buffer(&BufferDesc { label, role, size })?;

        Ok(Self {
            raw,
            capacity,
            _element: PhantomData,
        })
    }

    /// Capacity in elements.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Backend handle, for binding.
    #[inline]
    pub fn raw(&self) -> &D::Buffer {
        &self.raw
    }

    /// Copies the first `count` elements of `previous` into this buffer on the device.
    pub fn copy_prefix_from(&self, device: &D, previous: &Self, count: usize) {
        assert!(
            count <= previous.capacity && count <= self.capacity,
            "prefix copy of {count} elements exceeds capacity ({} -> {})",
            previous.capacity,
            self.capacity
        );
        if count == 0 {
            return;
        }
        device.copy_buffer(&previous.raw, &self.raw, count as u64 * Self::STRIDE);
    }

    /// Writes `elements` starting at element index `first`.
    ///
    /// # Panics
    /// Panics if the range does not fit. Callers grow first.
    pub fn write(&self, device: &D, first: usize, elements: &[T]) {
        assert!(
            first + elements.len() <= self.capacity,
            "device buffer overflow: {} + {} > {}",
            first,
            elements.len(),
            self.capacity
        );
        if elements.is_empty() {
            return;
        }
        device.write_buffer(
            &self.raw,
            first as u64 * Self::STRIDE,
            bytemuck::cast_slice(elements),
        );
    }

    /// Releases the device buffer.
    pub fn release(self, device: &D) {
        device.release_buffer(self.raw);
    }
}
