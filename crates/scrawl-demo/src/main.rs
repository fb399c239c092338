//! Two windows drawing the same three scenes from different orbits.

mod scenes;

use std::collections::HashMap;

use anyhow::Result;
use glam::Vec3;
use winit::dpi::LogicalSize;

use scrawl_engine::buffer::{ContextId, WgpuDevice};
use scrawl_engine::camera::OrbitCamera;
use scrawl_engine::core::{App, AppControl, FrameCtx};
use scrawl_engine::device::GpuInit;
use scrawl_engine::logging::{init_logging, LoggingConfig};
use scrawl_engine::paint::Color;
use scrawl_engine::render::Compositor;
use scrawl_engine::scene::{Scene, SharedScene};
use scrawl_engine::window::{Runtime, RuntimeConfig};

/// Per-window drawing state.
struct View {
    compositor: Compositor,
    camera: OrbitCamera,
    /// Radians per second around the vertical axis.
    orbit_speed: f32,
}

struct Demo {
    axes: SharedScene<WgpuDevice>,
    sprinkles: SharedScene<WgpuDevice>,
    ribbon: SharedScene<WgpuDevice>,

    views: HashMap<ContextId, View>,
    /// Window whose frames advance the animation.
    primary: Option<ContextId>,
    second_window_requested: bool,
}

impl Demo {
    fn new() -> Self {
        let mut axes: Scene<WgpuDevice> = Scene::new();
        scenes::build_axes(&mut axes);

        let mut sprinkles: Scene<WgpuDevice> = Scene::new();
        scenes::build_sprinkles(&mut sprinkles, 3);

        let mut ribbon: Scene<WgpuDevice> = Scene::new();
        scenes::build_ribbon_frame(&mut ribbon);

        Self {
            axes: axes.shared(),
            sprinkles: sprinkles.shared(),
            ribbon: ribbon.shared(),
            views: HashMap::new(),
            primary: None,
            second_window_requested: false,
        }
    }

    fn new_view(&self, index: usize) -> View {
        let mut compositor = Compositor::new();
        compositor.attach(self.axes.clone());
        compositor.attach(self.sprinkles.clone());
        compositor.attach(self.ribbon.clone());

        let mut camera = OrbitCamera::default();
        camera.rotation = Vec3::new(-0.45, 0.6 * index as f32, 0.0);
        camera.distance = 6.0 + 2.0 * index as f32;

        View {
            compositor,
            camera,
            orbit_speed: if index == 0 { 0.3 } else { -0.15 },
        }
    }
}

impl App for Demo {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let context = ctx.window.context;
        let elapsed = ctx.time.elapsed;

        if !self.second_window_requested {
            self.second_window_requested = true;
            ctx.runtime.create_window(RuntimeConfig {
                title: "scrawl: second view".to_string(),
                initial_size: LogicalSize::new(640.0, 480.0),
                ..RuntimeConfig::default()
            });
        }

        let primary = *self.primary.get_or_insert(context);
        if primary == context {
            let mut ribbon = self.ribbon.borrow_mut();
            scenes::animate_ribbon(&mut *ribbon, elapsed);
        }

        if !self.views.contains_key(&context) {
            let view = self.new_view(self.views.len());
            log::info!("new view for {context:?}");
            self.views.insert(context, view);
        }
        let Some(view) = self.views.get_mut(&context) else {
            return AppControl::Continue;
        };

        let viewport = ctx.viewport();
        let mut camera = view.camera.clone();
        camera.rotation.y += view.orbit_speed * elapsed;
        view.compositor.set_projection(camera.transform(viewport));

        let compositor = &mut view.compositor;
        ctx.render(Color::from_straight(0.06, 0.07, 0.09, 1.0), |rctx, target| {
            compositor.render(rctx, target, context);
        })
    }

    fn on_window_closed(&mut self, context: ContextId) {
        if let Some(view) = self.views.remove(&context) {
            view.compositor.forget_context(context);
        }
        if self.primary == Some(context) {
            self.primary = None;
        }
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "scrawl".to_string(),
        initial_size: LogicalSize::new(1024.0, 720.0),
        ..RuntimeConfig::default()
    };

    Runtime::run(config, GpuInit::default(), Demo::new())
}
