use crate::coords::Viewport;

/// Renderer-facing context: device/queue, target format and sample count, viewport
/// size in pixels.
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
    /// Pipelines must match the color target's sample count.
    pub sample_count: u32,
    pub viewport: Viewport, // physical px
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        sample_count: u32,
        viewport: Viewport,
    ) -> Self {
        Self {
            device,
            queue,
            surface_format,
            sample_count,
            viewport,
        }
    }
}

/// Target for drawing (encoder + color view).
///
/// With multisampling, `color_view` is the multisampled texture and every pass
/// resolves into `resolve_target`, the swapchain view.
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
    pub resolve_target: Option<&'a wgpu::TextureView>,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(
        encoder: &'a mut wgpu::CommandEncoder,
        color_view: &'a wgpu::TextureView,
        resolve_target: Option<&'a wgpu::TextureView>,
    ) -> Self {
        Self {
            encoder,
            color_view,
            resolve_target,
        }
    }

    /// Color attachment that keeps what earlier passes drew.
    pub fn load_attachment(&self) -> wgpu::RenderPassColorAttachment<'a> {
        self.attachment(wgpu::LoadOp::Load)
    }

    /// Color attachment that clears to `color` first.
    pub fn clear_attachment(&self, color: wgpu::Color) -> wgpu::RenderPassColorAttachment<'a> {
        self.attachment(wgpu::LoadOp::Clear(color))
    }

    fn attachment(&self, load: wgpu::LoadOp<wgpu::Color>) -> wgpu::RenderPassColorAttachment<'a> {
        wgpu::RenderPassColorAttachment {
            view: self.color_view,
            resolve_target: self.resolve_target,
            ops: wgpu::Operations {
                load,
                // the multisampled target carries over to the next pass
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        }
    }
}
