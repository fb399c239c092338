/// Initialization parameters for the shared device and every window surface.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface format when available.
    ///
    /// Scene colors are linear; an sRGB target encodes them on write.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior).
    ///
    /// FIFO is broadly supported and paces continuous redraws to the display.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Required wgpu features.
    ///
    /// Favor an empty set for portability unless a feature is strictly necessary.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Multisample count for window color targets.
    ///
    /// Thin lines and small sprites need anti-aliasing. Falls back to 1 when the surface
    /// format does not support the requested count.
    pub sample_count: u32,

    /// Desired maximum frame latency for the surface.
    ///
    /// This value is a hint; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            sample_count: 4,
            desired_maximum_frame_latency: 2,
        }
    }
}
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_requests_4x_multisampling() {
        assert_eq!(GpuInit::default().sample_count, 4);
    }
}
