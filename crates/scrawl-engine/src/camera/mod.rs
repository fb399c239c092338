//! Cameras producing the compositor projection.

mod orbit;

pub use orbit::OrbitCamera;
