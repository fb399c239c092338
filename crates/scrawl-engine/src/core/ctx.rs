use winit::window::{Window, WindowId};

use crate::buffer::ContextId;
use crate::coords::Viewport;
use crate::device::{Gpu, SurfaceErrorAction, WindowSurface};
use crate::paint::Color;
use crate::render::{RenderCtx, RenderTarget};
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

use super::app::AppControl;

/// Per-window handles.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    /// Binding-cache key for this window.
    pub context: ContextId,
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Drawable size in physical pixels.
    pub fn viewport(&self) -> Viewport {
        Viewport::from(self.window.inner_size())
    }
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `WindowSurface<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a Gpu,
    pub surface: &'a mut WindowSurface<'w>,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Current surface size in physical pixels.
    pub fn viewport(&self) -> Viewport {
        Viewport::from(self.surface.size())
    }

    /// Clears the surface with `clear`, calls `draw` with a ready [`RenderCtx`] and
    /// [`RenderTarget`], then presents the frame.
    ///
    /// Nothing is drawn while the window is minimized.
    pub fn render<F>(&mut self, clear: Color, draw: F) -> AppControl
    where
        F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>),
    {
        let viewport = self.viewport();
        if !viewport.is_valid() {
            return AppControl::Continue;
        }

        let mut frame = match self.surface.begin_frame(self.gpu) {
            Ok(f) => f,
            Err(err) => {
                log::warn!("surface error on {:?}: {err}", self.window.context);
                let action = self.surface.handle_surface_error(self.gpu, err);
                if action == SurfaceErrorAction::Fatal {
                    return AppControl::Exit;
                }
                return AppControl::Continue;
            }
        };

        let rctx = RenderCtx::new(
            self.gpu.device(),
            self.gpu.queue(),
            self.surface.surface_format(),
            self.surface.sample_count(),
            viewport,
        );

        // RenderTarget borrows frame.encoder; dropped before submit() takes frame.
        {
            let (color_view, resolve_target) = match frame.msaa_view.as_ref() {
                Some(msaa) => (msaa, Some(&frame.view)),
                None => (&frame.view, None),
            };
            let mut target = RenderTarget::new(&mut frame.encoder, color_view, resolve_target);

            // Clear pass; dropped before the draw callback records its own.
            {
                let attachment = target.clear_attachment(clear.to_wgpu());
                let _rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("scrawl clear"),
                    color_attachments: &[Some(attachment)],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                    multiview_mask: None,
                });
            }

            draw(&rctx, &mut target);
        }

        self.window.window.pre_present_notify();
        self.surface.submit(self.gpu, frame);

        AppControl::Continue
    }
}
