use bytemuck::Pod;

use super::{BufferDevice, BufferError, BufferRole, DeviceBuffer};

/// Initial device capacity (elements) for streams created with `new`.
pub const DEFAULT_CAPACITY: usize = 4;

/// Append-only host log mirrored into a growable device buffer.
///
/// - `push` only touches host memory.
/// - `sync` uploads the unsynced suffix, doubling device capacity when it no longer fits.
/// - `save`/`restore` checkpoint the log so transient geometry can be dropped each frame.
/// - `clear` empties the log but keeps device capacity.
///
/// Device storage is allocated lazily by the first non-empty `sync`, so geometry can be
/// recorded before any window or device exists.
///
/// Invariant: `synced <= elements.len()`.
pub struct StreamBuffer<T, D: BufferDevice> {
    label: &'static str,
    role: BufferRole,
    initial_capacity: usize,

    elements: Vec<T>,
    synced: usize,
    restore_point: usize,

    storage: Option<DeviceBuffer<T, D>>,
    generation: u64,
}

impl<T: Pod, D: BufferDevice> StreamBuffer<T, D> {
    pub fn new(label: &'static str, role: BufferRole) -> Self {
        Self::with_capacity(label, role, DEFAULT_CAPACITY)
    }

    /// Stream whose first device allocation holds at least `capacity` elements.
    pub fn with_capacity(label: &'static str, role: BufferRole, capacity: usize) -> Self {
        Self {
            label,
            role,
            initial_capacity: capacity.max(1),
            elements: Vec::new(),
            synced: 0,
            restore_point: 0,
            storage: None,
            generation: 0,
        }
    }

    /// Appends one element to the host log.
    #[inline]
    pub fn push(&mut self, element: T) {
        self.elements.push(element);
    }

    /// Number of elements in the host log.
    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Host log contents.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.elements
    }

    /// Number of leading elements already uploaded.
    #[inline]
    pub fn synced_len(&self) -> usize {
        self.synced
    }

    /// Log length captured by the last `save`.
    #[inline]
    pub fn restore_point(&self) -> usize {
        self.restore_point
    }

    /// Device capacity in elements (`0` before the first allocation).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.as_ref().map_or(0, DeviceBuffer::capacity)
    }

    /// Number of device allocations so far. Changes whenever the storage identity changes.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current device buffer, if one was allocated.
    #[inline]
    pub fn storage(&self) -> Option<&D::Buffer> {
        self.storage.as_ref().map(DeviceBuffer::raw)
    }

    #[inline]
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Uploads pending elements. Returns `true` if device storage was reallocated,
    /// in which case every binding that captured the old storage is stale.
    ///
    /// On error nothing changes: old storage, cursor and host log are kept.
    pub fn sync(&mut self, device: &D) -> Result<bool, BufferError> {
        debug_assert!(self.synced <= self.elements.len());

        let len = self.elements.len();
        if self.synced == len {
            return Ok(false);
        }

        let mut reallocated = false;
        let storage = match self.storage.take() {
            Some(current) if current.capacity() >= len => current,
            previous => {
                let start = previous
                    .as_ref()
                    .map_or(self.initial_capacity, DeviceBuffer::capacity);

                let grown = match grown_capacity(start, len) {
                    Some(capacity) => DeviceBuffer::allocate(device, self.label, self.role, capacity),
                    None => Err(BufferError::CapacityOverflow {
                        label: self.label,
                        elements: len,
                    }),
                };
                let fresh = match grown {
                    Ok(fresh) => fresh,
                    Err(err) => {
                        self.storage = previous;
                        return Err(err);
                    }
                };

                if let Some(previous) = previous {
                    log::debug!(
                        "growing `{}`: {} -> {} elements ({} kept)",
                        self.label,
                        previous.capacity(),
                        fresh.capacity(),
                        self.synced
                    );
                    fresh.copy_prefix_from(device, &previous, self.synced);
                    previous.release(device);
                }

                self.generation += 1;
                reallocated = true;
                fresh
            }
        };

        storage.write(device, self.synced, &self.elements[self.synced..]);
        self.storage = Some(storage);
        self.synced = len;

        Ok(reallocated)
    }

    /// Marks the current log length as the restore point.
    ///
    /// Saving while a multi-call primitive is under construction is allowed; finishing it
    /// first is the caller's responsibility.
    #[inline]
    pub fn save(&mut self) {
        self.restore_point = self.elements.len();
    }

    /// Drops everything appended since the last `save`. Never grows the log and never
    /// touches device storage.
    #[inline]
    pub fn restore(&mut self) {
        self.elements.truncate(self.restore_point);
        self.synced = self.synced.min(self.elements.len());
    }

    /// Empties the log. Device capacity and the checkpoint are kept.
    #[inline]
    pub fn clear(&mut self) {
        self.elements.clear();
        self.synced = 0;
    }

    /// Releases device storage. The host log is kept and will be re-uploaded on the next
    /// `sync`.
    pub fn release(&mut self, device: &D) {
        if let Some(storage) = self.storage.take() {
            storage.release(device);
            self.synced = 0;
        }
    }
}

/// Smallest `current * 2^k` (k >= 0) that holds `required` elements.
fn grown_capacity(current: usize, required: usize) -> Option<usize> {
    let mut capacity = current.max(1);
    while capacity < required {
        capacity = capacity.checked_mul(2)?;
    }
    Some(capacity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{HostDevice, HostStats};

    type Stream = StreamBuffer<u32, HostDevice>;

    fn stream() -> Stream {
        StreamBuffer::new("test stream", BufferRole::Vertex)
    }

    fn device_contents(device: &HostDevice, stream: &Stream) -> Vec<u32> {
        device.read(stream.storage().unwrap(), stream.synced_len())
    }

    // ── capacity math ─────────────────────────────────────────────────────

    #[test]
    fn grown_capacity_doubles_until_it_fits() {
        assert_eq!(grown_capacity(4, 5), Some(8));
        assert_eq!(grown_capacity(4, 9), Some(16));
        assert_eq!(grown_capacity(4, 17), Some(32));
    }

    #[test]
    fn grown_capacity_exact_fit_does_not_grow() {
        assert_eq!(grown_capacity(4, 4), Some(4));
        assert_eq!(grown_capacity(8, 8), Some(8));
    }

    #[test]
    fn grown_capacity_reports_overflow() {
        assert_eq!(grown_capacity(usize::MAX / 2 + 1, usize::MAX), None);
    }

    // ── sync ──────────────────────────────────────────────────────────────

    #[test]
    fn sync_on_empty_stream_is_noop() {
        let device = HostDevice::new();
        let mut s = stream();
        assert_eq!(s.sync(&device), Ok(false));
        assert_eq!(s.capacity(), 0);
        assert_eq!(device.stats(), HostStats::default());
    }

    #[test]
    fn first_sync_allocates_default_capacity() {
        let device = HostDevice::new();
        let mut s = stream();
        s.push(1);
        assert_eq!(s.sync(&device), Ok(true));
        assert_eq!(s.capacity(), DEFAULT_CAPACITY);
        assert_eq!(s.generation(), 1);
        assert_eq!(device_contents(&device, &s), vec![1]);
    }

    #[test]
    fn sync_is_idempotent() {
        let device = HostDevice::new();
        let mut s = stream();
        s.push(10);
        s.push(20);
        s.sync(&device).unwrap();
        let before = device.stats();

        assert_eq!(s.sync(&device), Ok(false));
        assert_eq!(s.sync(&device), Ok(false));
        assert_eq!(device.stats(), before);
        assert_eq!(device_contents(&device, &s), vec![10, 20]);
    }

    #[test]
    fn growth_preserves_prefix_across_reallocation() {
        let device = HostDevice::new();
        let mut s = stream();
        for v in 0..4 {
            s.push(v);
        }
        assert_eq!(s.sync(&device), Ok(true));
        assert_eq!(s.capacity(), 4);

        s.push(4);
        assert_eq!(s.sync(&device), Ok(true));
        assert_eq!(s.capacity(), 8);
        assert_eq!(device_contents(&device, &s), vec![0, 1, 2, 3, 4]);

        // old storage was released, prefix moved by a device-side copy
        let stats = device.stats();
        assert_eq!(stats.allocations, 2);
        assert_eq!(stats.releases, 1);
        assert_eq!(stats.bytes_copied, 4 * 4);
        assert_eq!(device.live_buffers(), 1);
    }

    #[test]
    fn first_sync_of_five_grows_to_eight() {
        let device = HostDevice::new();
        let mut s = stream();
        for v in [5, 6, 7, 8, 9] {
            s.push(v);
        }
        assert_eq!(s.sync(&device), Ok(true));
        assert_eq!(s.capacity(), 8);
        assert_eq!(device_contents(&device, &s), vec![5, 6, 7, 8, 9]);
    }

    #[test]
    fn many_doublings_keep_order() {
        let device = HostDevice::new();
        let mut s = stream();
        let mut expected = Vec::new();
        for v in 0..100u32 {
            s.push(v);
            expected.push(v);
            if v % 7 == 0 {
                s.sync(&device).unwrap();
            }
        }
        s.sync(&device).unwrap();
        assert_eq!(s.capacity(), 128);
        assert_eq!(device_contents(&device, &s), expected);
    }

    #[test]
    fn sync_uploads_only_the_suffix() {
        let device = HostDevice::new();
        let mut s = StreamBuffer::<u32, HostDevice>::with_capacity("suffix", BufferRole::Index, 16);
        s.push(1);
        s.push(2);
        s.sync(&device).unwrap();
        assert_eq!(device.stats().bytes_written, 8);

        s.push(3);
        assert_eq!(s.sync(&device), Ok(false));
        assert_eq!(device.stats().bytes_written, 12);
        assert_eq!(device.stats().writes, 2);
    }

    #[test]
    fn failed_allocation_keeps_previous_storage() {
        // room for 4 u32 elements, not 8
        let device = HostDevice::with_max_buffer_size(16);
        let mut s = stream();
        for v in 0..4 {
            s.push(v);
        }
        s.sync(&device).unwrap();
        let allocations = device.stats().allocations;

        s.push(4);
        let err = s.sync(&device).unwrap_err();
        assert!(matches!(err, BufferError::TooLarge { requested: 32, .. }));
        assert_eq!(s.capacity(), 4);
        assert_eq!(s.synced_len(), 4);
        assert_eq!(s.len(), 5);
        assert_eq!(s.generation(), 1);
        assert_eq!(device.stats().allocations, allocations);
        assert_eq!(device_contents(&device, &s), vec![0, 1, 2, 3]);
    }

    // ── checkpoints ───────────────────────────────────────────────────────

    #[test]
    fn save_restore_round_trip() {
        let device = HostDevice::new();
        let mut s = stream();
        s.push(1);
        s.sync(&device).unwrap();

        s.save();
        s.push(2);
        s.push(3);
        s.restore();
        assert_eq!(s.len(), 1);
        assert_eq!(s.synced_len(), 1);

        s.push(9);
        s.sync(&device).unwrap();
        assert_eq!(device_contents(&device, &s), vec![1, 9]);
    }

    #[test]
    fn restore_clamps_sync_cursor() {
        let device = HostDevice::new();
        let mut s = stream();
        s.push(1);
        s.save();
        s.push(2);
        s.push(3);
        s.sync(&device).unwrap();
        assert_eq!(s.synced_len(), 3);

        s.restore();
        assert_eq!(s.synced_len(), 1);

        s.push(7);
        assert_eq!(s.sync(&device), Ok(false));
        assert_eq!(device_contents(&device, &s), vec![1, 7]);
    }

    #[test]
    fn restore_never_grows_device_storage() {
        let device = HostDevice::new();
        let mut s = stream();
        s.save();
        for v in 0..9 {
            s.push(v);
        }
        s.sync(&device).unwrap();
        let capacity = s.capacity();
        s.restore();
        assert_eq!(s.capacity(), capacity);
        assert!(s.is_empty());
    }

    #[test]
    fn restore_after_clear_does_not_resurrect_elements() {
        let mut s = stream();
        s.push(1);
        s.push(2);
        s.save();
        s.clear();
        s.restore();
        assert!(s.is_empty());
        assert_eq!(s.restore_point(), 2);
    }

    #[test]
    fn clear_keeps_checkpoint_for_rebuilt_base() {
        let mut s = stream();
        for v in 0..3 {
            s.push(v);
        }
        s.save();
        s.clear();
        for v in 10..15 {
            s.push(v);
        }
        s.restore();
        assert_eq!(s.as_slice(), &[10, 11, 12]);
        assert_eq!(s.synced_len(), 0);
    }

    #[test]
    fn clear_resets_length_not_capacity() {
        let device = HostDevice::new();
        let mut s = stream();
        for v in 0..8 {
            s.push(v);
        }
        s.sync(&device).unwrap();
        assert_eq!(s.capacity(), 8);

        s.clear();
        assert_eq!(s.len(), 0);
        assert_eq!(s.synced_len(), 0);
        assert_eq!(s.capacity(), 8);

        for v in 0..8 {
            s.push(v);
        }
        assert_eq!(s.sync(&device), Ok(false));

        s.push(8);
        assert_eq!(s.sync(&device), Ok(true));
        assert_eq!(s.capacity(), 16);
    }

    #[test]
    fn release_forces_full_reupload() {
        let device = HostDevice::new();
        let mut s = stream();
        s.push(3);
        s.push(4);
        s.sync(&device).unwrap();
        s.release(&device);
        assert_eq!(s.capacity(), 0);
        assert_eq!(device.live_buffers(), 0);

        assert_eq!(s.sync(&device), Ok(true));
        assert_eq!(s.generation(), 2);
        assert_eq!(device_contents(&device, &s), vec![3, 4]);
    }
}
