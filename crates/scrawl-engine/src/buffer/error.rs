use thiserror::Error;

/// Failure while (re)allocating device storage for a stream.
///
/// Returned from `StreamBuffer::sync`. A failed sync leaves the stream exactly as it
/// was before the call, so the caller may skip the draw and retry next frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// The device cannot hold a buffer this large.
    #[error("buffer `{label}` needs {requested} bytes but the device limit is {limit} bytes")]
    TooLarge {
        label: &'static str,
        requested: u64,
        limit: u64,
    },

    /// Doubling the capacity (or converting it to bytes) overflowed.
    #[error("capacity overflow growing buffer `{label}` to {elements} elements")]
    CapacityOverflow {
        label: &'static str,
        elements: usize,
    },
}
