use anyhow::{Context, Result};
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;

use super::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction};

/// Swapchain of one window.
///
/// Borrows the window through `'w`; the runtime keeps both in one self-referencing
/// entry so the window outlives the surface.
pub struct WindowSurface<'w> {
    surface: wgpu::Surface<'w>,

    /// Active surface configuration.
    config: wgpu::SurfaceConfiguration,

    /// Current drawable size in physical pixels.
    size: PhysicalSize<u32>,

    /// Samples per pixel of the color target; 1 disables multisampling.
    sample_count: u32,

    /// Multisampled color target resolved into the swapchain texture each pass.
    msaa_view: Option<wgpu::TextureView>,
}

impl<'w> WindowSurface<'w> {
    /// Configures `surface` for `gpu` at `size`.
    pub fn new(
        surface: wgpu::Surface<'w>,
        gpu: &Gpu,
        size: PhysicalSize<u32>,
        init: &GpuInit,
    ) -> Result<Self> {
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let caps = surface.get_capabilities(gpu.adapter());
        let format = choose_surface_format(&caps, init.prefer_srgb)
            .context("no supported surface formats")?;
        let alpha_mode = choose_alpha_mode(&caps, init.alpha_mode);
        let features = gpu.adapter().get_texture_format_features(format);
        let sample_count = choose_sample_count(init.sample_count, features.flags);
        if sample_count != init.sample_count {
            log::warn!(
                "{format:?} does not support {}x multisampling, using {sample_count}x",
                init.sample_count
            );
        }

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: init.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };

        surface.configure(gpu.device(), &config);
        let msaa_view = create_msaa_view(gpu.device(), &config, sample_count);

        Ok(Self {
            surface,
            config,
            size,
            sample_count,
            msaa_view,
        })
    }

    /// Returns the active surface format.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Samples per pixel that pipelines drawing to this surface must use.
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Returns the current drawable size (physical pixels).
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Reconfigures the surface after a resize. Zero sizes (minimized) are recorded but
    /// not applied.
    pub fn resize(&mut self, gpu: &Gpu, new_size: PhysicalSize<u32>) {
        self.size = new_size;
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(gpu.device(), &self.config);
        self.msaa_view = create_msaa_view(gpu.device(), &self.config, self.sample_count);
    }

    /// Acquires the next surface texture and creates an encoder.
    pub fn begin_frame(&self, gpu: &Gpu) -> std::result::Result<GpuFrame, SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scrawl frame encoder"),
            });

        Ok(GpuFrame {
            surface_texture,
            view,
            msaa_view: self.msaa_view.clone(),
            encoder,
        })
    }

    /// Submits the recorded commands and presents the frame.
    pub fn submit(&self, gpu: &Gpu, frame: GpuFrame) {
        gpu.queue().submit(std::iter::once(frame.encoder.finish()));
        drop(frame.view);
        drop(frame.msaa_view);
        frame.surface_texture.present();
    }

    /// Converts a `SurfaceError` into a higher-level action.
    pub fn handle_surface_error(&mut self, gpu: &Gpu, err: SurfaceError) -> SurfaceErrorAction {
        let action = map_surface_error(err);
        if action == SurfaceErrorAction::Reconfigured && self.size.width > 0 && self.size.height > 0 {
            self.surface.configure(gpu.device(), &self.config);
        }
        action
    }
}

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        for f in preferred {
            if caps.formats.contains(&f) {
                return Some(f);
            }
        }
    }

    Some(caps.formats[0])
}

/// `requested` if the format supports it, otherwise single-sampled.
pub(crate) fn choose_sample_count(requested: u32, flags: wgpu::TextureFormatFeatureFlags) -> u32 {
    if requested > 1 && flags.sample_count_supported(requested) {
        requested
    } else {
        1
    }
}

fn create_msaa_view(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
) -> Option<wgpu::TextureView> {
    if sample_count <= 1 {
        return None;
    }

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("scrawl msaa color"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: config.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    Some(texture.create_view(&wgpu::TextureViewDescriptor::default()))
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

pub(crate) fn map_surface_error(err: SurfaceError) -> SurfaceErrorAction {
    match err {
        SurfaceError::Lost | SurfaceError::Outdated => SurfaceErrorAction::Reconfigured,
        SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        SurfaceError::Timeout => SurfaceErrorAction::SkipFrame,
        SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(formats: &[wgpu::TextureFormat], alpha_modes: &[wgpu::CompositeAlphaMode]) -> wgpu::SurfaceCapabilities {
        wgpu::SurfaceCapabilities {
            formats: formats.to_vec(),
            alpha_modes: alpha_modes.to_vec(),
            ..Default::default()
        }
    }

    #[test]
    fn srgb_format_is_preferred() {
        let c = caps(
            &[wgpu::TextureFormat::Bgra8Unorm, wgpu::TextureFormat::Bgra8UnormSrgb],
            &[],
        );
        assert_eq!(choose_surface_format(&c, true), Some(wgpu::TextureFormat::Bgra8UnormSrgb));
        assert_eq!(choose_surface_format(&c, false), Some(wgpu::TextureFormat::Bgra8Unorm));
    }

    #[test]
    fn no_formats_means_no_surface() {
        assert_eq!(choose_surface_format(&caps(&[], &[]), true), None);
    }

    #[test]
    fn unsupported_alpha_mode_falls_back() {
        let c = caps(&[], &[wgpu::CompositeAlphaMode::Opaque]);
        assert_eq!(
            choose_alpha_mode(&c, Some(wgpu::CompositeAlphaMode::PreMultiplied)),
            wgpu::CompositeAlphaMode::Opaque
        );
        assert_eq!(choose_alpha_mode(&caps(&[], &[]), None), wgpu::CompositeAlphaMode::Auto);
    }

    #[test]
    fn sample_count_falls_back_when_unsupported() {
        let x4 = wgpu::TextureFormatFeatureFlags::MULTISAMPLE_X4;
        assert_eq!(choose_sample_count(4, x4), 4);
        assert_eq!(choose_sample_count(4, wgpu::TextureFormatFeatureFlags::empty()), 1);
        assert_eq!(choose_sample_count(8, x4), 1);
        assert_eq!(choose_sample_count(1, x4), 1);
        assert_eq!(choose_sample_count(0, x4), 1);
    }

    #[test]
    fn surface_errors_map_to_actions() {
        assert_eq!(map_surface_error(SurfaceError::Outdated), SurfaceErrorAction::Reconfigured);
        assert_eq!(map_surface_error(SurfaceError::OutOfMemory), SurfaceErrorAction::Fatal);
        assert_eq!(map_surface_error(SurfaceError::Timeout), SurfaceErrorAction::SkipFrame);
    }
}
