//! Growable device buffers and per-context vertex bindings.
//!
//! - `StreamBuffer`: host log + device mirror with save/restore/clear
//! - `BindingCache`: per-context binding state with global invalidation
//! - `BufferDevice`: the buffer operations a backend provides (wgpu, host memory)

mod backend;
mod binding;
mod device_buffer;
mod error;
mod host;
mod layout;
mod stream;
mod wgpu_device;

pub use backend::{BindingSources, BufferDesc, BufferDevice, BufferRole};
pub use binding::{BindingCache, BindingState, ContextId};
pub use device_buffer::DeviceBuffer;
pub use error::BufferError;
pub use host::{HostBinding, HostBuffer, HostDevice, HostStats};
pub use layout::{AttributeFormat, StepMode, VertexAttribute, VertexLayout};
pub use stream::{StreamBuffer, DEFAULT_CAPACITY};
pub use wgpu_device::{WgpuBinding, WgpuDevice};
