use std::collections::HashMap;
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::buffer::{ContextId, VertexLayout, WgpuBinding, WgpuDevice};
use crate::coords::Viewport;
use crate::primitive::{AnchorVertex, DrawCall, InstanceTransform, LineVertex, PointVertex, PrimitiveKind, Vertex};
use crate::render::{RenderCtx, RenderTarget};
use crate::scene::SharedScene;

/// Draws every attached scene into a render target.
///
/// Owns one pipeline per primitive kind (per surface format and sample count) and the
/// globals uniform (projection + viewport). Scenes are shared: the same scene may be attached to the
/// compositors of several windows, each drawing it with its own `ContextId`.
///
/// Per frame, for each kind in the order lines, points, anchors, every attached scene
/// uploads its pending data and contributes at most one instanced draw. All draws go
/// into a single load/store pass.
pub struct Compositor {
    scenes: Vec<SharedScene<WgpuDevice>>,

    projection: Mat4,
    /// `None` = use the render context viewport.
    viewport: Option<Viewport>,

    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    globals_ubo: Option<wgpu::Buffer>,

    pipelines: HashMap<PipelineKey, Pipelines>,
}

/// Pipelines depend on the target format and its sample count.
type PipelineKey = (wgpu::TextureFormat, u32);

struct Pipelines {
    lines: wgpu::RenderPipeline,
    points: wgpu::RenderPipeline,
    anchors: wgpu::RenderPipeline,
}

impl Pipelines {
    fn get(&self, kind: PrimitiveKind) -> &wgpu::RenderPipeline {
        match kind {
            PrimitiveKind::Lines => &self.lines,
            PrimitiveKind::Points => &self.points,
            PrimitiveKind::Anchors => &self.anchors,
        }
    }
}

impl Compositor {
    pub fn new() -> Self {
        Self {
            scenes: Vec::new(),
            projection: Mat4::IDENTITY,
            viewport: None,
            bind_group_layout: None,
            bind_group: None,
            globals_ubo: None,
            pipelines: HashMap::new(),
        }
    }

    /// Adds a scene. Attaching the same scene twice is a no-op.
    pub fn attach(&mut self, scene: SharedScene<WgpuDevice>) {
        if !self.is_attached(&scene) {
            self.scenes.push(scene);
        }
    }

    pub fn detach(&mut self, scene: &SharedScene<WgpuDevice>) {
        self.scenes.retain(|s| !Rc::ptr_eq(s, scene));
    }

    pub fn is_attached(&self, scene: &SharedScene<WgpuDevice>) -> bool {
        self.scenes.iter().any(|s| Rc::ptr_eq(s, scene))
    }

    pub fn scenes(&self) -> &[SharedScene<WgpuDevice>] {
        &self.scenes
    }

    /// Camera transform applied to every vertex (after the instance transform).
    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Pixel size used to turn primitive sizes into clip-space offsets.
    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        self.viewport = Some(Viewport::new(width, height));
    }

    /// Drops bindings every attached scene holds for a closed context.
    pub fn forget_context(&self, context: ContextId) {
        for scene in &self.scenes {
            scene.borrow_mut().forget_context(context);
        }
    }

    /// Uploads and draws every attached scene. Returns the number of draws issued.
    ///
    /// A scene whose upload fails is logged and skipped for this frame; the others
    /// still draw.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        context: ContextId,
    ) -> usize {
        self.ensure_bindings(ctx);
        self.ensure_pipelines(ctx);
        self.write_globals(ctx);

        let device = WgpuDevice::new(ctx.device, ctx.queue);
        let mut draws: Vec<DrawCall<WgpuBinding>> = Vec::new();
        for kind in PrimitiveKind::ALL {
            for scene in &self.scenes {
                match scene.borrow_mut().prepare(&device, context, kind) {
                    Ok(Some(call)) => draws.push(call),
                    Ok(None) => {}
                    Err(err) => log::error!("skipping {} draw: {err}", kind.label()),
                }
            }
        }

        if draws.is_empty() {
            return 0;
        }

        let Some(pipelines) = self.pipelines.get(&(ctx.surface_format, ctx.sample_count)) else {
            return 0;
        };
        let Some(bind_group) = self.bind_group.as_ref() else { return 0 };

        let attachment = target.load_attachment();
        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scrawl compositor pass"),
            color_attachments: &[Some(attachment)],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_bind_group(0, bind_group, &[]);

        let mut bound_kind = None;
        for call in &draws {
            if bound_kind != Some(call.kind) {
                rpass.set_pipeline(pipelines.get(call.kind));
                bound_kind = Some(call.kind);
            }
            rpass.set_vertex_buffer(0, call.binding.vertices.slice(..));
            rpass.set_vertex_buffer(1, call.binding.instances.slice(..));
            rpass.set_index_buffer(call.binding.indices.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..call.index_count, 0, 0..call.instance_count);
        }

        draws.len()
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.bind_group.is_some() && self.globals_ubo.is_some() {
            return;
        }

        let bind_group_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scrawl globals bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<Globals>() as u64),
                },
                count: None,
            }],
        });

        let globals_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scrawl globals ubo"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scrawl globals bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_ubo.as_entire_binding(),
            }],
        });

        self.bind_group_layout = Some(bind_group_layout);
        self.globals_ubo = Some(globals_ubo);
        self.bind_group = Some(bind_group);
        // pipelines were built against the previous layout
        self.pipelines.clear();
    }

    fn ensure_pipelines(&mut self, ctx: &RenderCtx<'_>) {
        let key = (ctx.surface_format, ctx.sample_count);
        if self.pipelines.contains_key(&key) {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };

        let layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scrawl pipeline layout"),
            bind_group_layouts: &[bgl],
            immediate_size: 0,
        });

        log::debug!(
            "building scrawl pipelines for {:?} at {}x",
            ctx.surface_format,
            ctx.sample_count
        );

        let pipelines = Pipelines {
            lines: create_pipeline(
                ctx,
                &layout,
                PrimitiveKind::Lines,
                include_str!("shaders/line.wgsl"),
                &LineVertex::LAYOUT,
            ),
            points: create_pipeline(
                ctx,
                &layout,
                PrimitiveKind::Points,
                include_str!("shaders/point.wgsl"),
                &PointVertex::LAYOUT,
            ),
            anchors: create_pipeline(
                ctx,
                &layout,
                PrimitiveKind::Anchors,
                include_str!("shaders/anchor.wgsl"),
                &AnchorVertex::LAYOUT,
            ),
        };
        self.pipelines.insert(key, pipelines);
    }

    fn write_globals(&self, ctx: &RenderCtx<'_>) {
        let Some(ubo) = self.globals_ubo.as_ref() else { return };
        let viewport = self.viewport.unwrap_or(ctx.viewport);
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&Globals::new(self.projection, viewport)));
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

fn create_pipeline(
    ctx: &RenderCtx<'_>,
    layout: &wgpu::PipelineLayout,
    kind: PrimitiveKind,
    source: &str,
    vertex: &VertexLayout,
) -> wgpu::RenderPipeline {
    let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(kind.label()),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let vertex_attributes = vertex.wgpu_attributes();
    let instance_attributes = InstanceTransform::LAYOUT.wgpu_attributes();
    let buffers = [
        wgpu::VertexBufferLayout {
            array_stride: vertex.stride,
            step_mode: vertex.wgpu_step_mode(),
            attributes: &vertex_attributes,
        },
        wgpu::VertexBufferLayout {
            array_stride: InstanceTransform::LAYOUT.stride,
            step_mode: InstanceTransform::LAYOUT.wgpu_step_mode(),
            attributes: &instance_attributes,
        },
    ];

    ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(kind.label()),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: ctx.surface_format,
                blend: Some(premul_alpha_blend()),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: ctx.sample_count,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview_mask: None,
        cache: None,
    })
}

// ── GPU types ─────────────────────────────────────────────────────────────

/// Globals uniform (80 bytes, matches `Globals` in the shaders):
///
///  offset  0  projection  mat4x4<f32>
///  offset 64  viewport    vec2<f32>   (pixels)
///  offset 72  padding to the 16-byte struct alignment
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct Globals {
    projection: [[f32; 4]; 4],
    viewport: [f32; 2],
    _pad: [f32; 2],
}

impl Globals {
    fn new(projection: Mat4, viewport: Viewport) -> Self {
        Self {
            projection: projection.to_cols_array_2d(),
            viewport: [viewport.width.max(1.0), viewport.height.max(1.0)],
            _pad: [0.0; 2],
        }
    }
}
