/// Represents a single acquired frame.
///
/// This object is short-lived and must be finalized promptly. Holding the surface
/// texture prevents acquisition of subsequent frames.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    /// Swapchain texture view; the resolve target when `msaa_view` is set.
    pub view: wgpu::TextureView,
    /// Multisampled color target, if the surface uses multisampling.
    pub msaa_view: Option<wgpu::TextureView>,
    pub encoder: wgpu::CommandEncoder,
}