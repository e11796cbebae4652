//! wgpu backend: surface, depth, entity pipeline and the shared constant buffer.
//! wgpu = 26.x, winit = 0.30.x

use std::sync::Arc;

use asset::MeshData;
use bytemuck::{Pod, Zeroable};
use wgpu::{
    BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    BlendState, Buffer, BufferBindingType, BufferUsages, ColorTargetState, ColorWrites,
    CommandEncoderDescriptor, DepthBiasState, DepthStencilState, Device, DeviceDescriptor,
    Extent3d, Features, FragmentState, Instance, InstanceDescriptor, Limits, LoadOp, Operations,
    PipelineLayoutDescriptor, PowerPreference, PresentMode, Queue, RenderPassColorAttachment,
    RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor, ShaderModuleDescriptor,
    ShaderSource, ShaderStages, StoreOp, Surface, SurfaceConfiguration, SurfaceError,
    SurfaceTexture, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages,
    TextureView, TextureViewDescriptor, VertexBufferLayout, VertexState, VertexStepMode,
    util::DeviceExt,
};
use winit::{dpi::PhysicalSize, window::Window};

use crate::context::{Drawable, RenderContext};
use crate::error::{RenderError, RenderResult};
use crate::shader_record::RECORD_BUFFER_SIZE;

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;
const CONSTANTS_LABEL: &str = "Entity Constants";

/// Vertex: position + RGBA color.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    pub const LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4],
    };
}

impl From<&asset::MeshVertex> for Vertex {
    fn from(v: &asset::MeshVertex) -> Self {
        Self {
            pos: v.position,
            color: v.color,
        }
    }
}

/// The uniform buffer every entity writes its record into, with its bind group.
pub struct GpuConstantBuffer {
    buffer: Buffer,
    bind_group: BindGroup,
}

struct Frame {
    texture: SurfaceTexture,
    view: TextureView,
}

pub struct GpuState {
    // Surface
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,

    // Device/queue
    device: Device,
    queue: Queue,

    // Pipeline
    pipeline: RenderPipeline,
    constants_bgl: BindGroupLayout,

    // Depth
    depth_view: TextureView,

    // Per-frame state
    frame: Option<Frame>,
    bound: Option<(u32, BindGroup)>,

    // Size cache
    width: u32,
    height: u32,
}

impl GpuState {
    /// Create GPU state bound to an `Arc<Window>`.
    pub async fn new(window: Arc<Window>, backends: wgpu::Backends) -> RenderResult<Self> {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        // Instance & surface
        let instance = Instance::new(&InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        let info = adapter.get_info();
        log::info!("Adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("Entity Device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                ..Default::default()
            })
            .await?;

        // Surface format (prefer sRGB)
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .unwrap_or(TextureFormat::Bgra8UnormSrgb);
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let depth_view = create_depth_view(&device, &surface_config);

        // ==== Shaders ====
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Entity WGSL"),
            source: ShaderSource::Wgsl(include_str!("shaders/entity.wgsl").into()),
        });

        // ==== Constants BGL (vertex stage, binding 0) ====
        let constants_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Entity Constants BGL"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(RECORD_BUFFER_SIZE),
                },
                count: None,
            }],
        });

        // ==== Pipeline ====
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Entity PipelineLayout"),
            bind_group_layouts: &[&constants_bgl],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Entity Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(ColorTargetState {
                    format: surface_format,
                    blend: Some(BlendState::REPLACE),
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            // Demo shapes are flat and wound either way.
            primitive: wgpu::PrimitiveState {
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        log::info!(
            "GPU ready: {}x{}, format {:?}, constants {} bytes",
            width,
            height,
            surface_format,
            RECORD_BUFFER_SIZE
        );

        Ok(Self {
            surface,
            surface_config,
            device,
            queue,
            pipeline,
            constants_bgl,
            depth_view,
            frame: None,
            bound: None,
            width,
            height,
        })
    }

    pub fn new_blocking(window: Arc<Window>, backends: wgpu::Backends) -> RenderResult<Self> {
        pollster::block_on(Self::new(window, backends))
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Dynamic uniform buffer sized for one record, rounded up to 16 bytes.
    pub fn create_constant_buffer(&self) -> GpuConstantBuffer {
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(CONSTANTS_LABEL),
            size: RECORD_BUFFER_SIZE,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Entity Constants BG"),
            layout: &self.constants_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        GpuConstantBuffer { buffer, bind_group }
    }

    /// Resize: reconfigure surface & recreate depth view.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.surface_config.width = self.width;
        self.surface_config.height = self.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, &self.surface_config);
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    pub fn recreate_surface(&mut self) {
        self.frame = None;
        self.resize(self.width, self.height);
    }

    /// Encode one indexed draw on top of the current frame and submit it
    /// right away, so the next constant write cannot land before it.
    pub fn draw_indexed(
        &mut self,
        mesh: &str,
        vertex_buf: &Buffer,
        index_buf: &Buffer,
        index_count: u32,
    ) -> RenderResult<()> {
        let Some(frame) = self.frame.as_ref() else {
            return Err(RenderError::DrawRejected {
                mesh: mesh.to_owned(),
                reason: "no acquired frame",
            });
        };
        let Some((slot, constants)) = self.bound.as_ref() else {
            return Err(RenderError::DrawRejected {
                mesh: mesh.to_owned(),
                reason: "no constants bound",
            });
        };

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("EntityEncoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("EntityPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &frame.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Load,
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Load,
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(*slot, constants, &[]);
            rpass.set_vertex_buffer(0, vertex_buf.slice(..));
            rpass.set_index_buffer(index_buf.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..index_count, 0, 0..1);
        }
        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }
}

impl RenderContext for GpuState {
    type ConstantBuffer = GpuConstantBuffer;

    fn begin_frame(&mut self, clear_color: [f32; 4]) -> RenderResult<()> {
        let texture = self.surface.get_current_texture()?;
        let view = texture.texture.create_view(&TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("ClearEncoder"),
            });
        {
            let [r, g, b, a] = clear_color.map(f64::from);
            let _clear = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("ClearPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
        }
        self.queue.submit(Some(encoder.finish()));

        self.frame = Some(Frame { texture, view });
        Ok(())
    }

    fn write_discard(&mut self, buffer: &GpuConstantBuffer, bytes: &[u8]) -> RenderResult<()> {
        let size = wgpu::BufferSize::new(bytes.len() as u64).ok_or_else(|| {
            RenderError::ResourceMapFailure {
                label: CONSTANTS_LABEL,
                reason: "empty write".to_owned(),
            }
        })?;
        // The staging view is the mapping; dropping it unmaps and schedules the copy.
        let mut mapped = self
            .queue
            .write_buffer_with(&buffer.buffer, 0, size)
            .ok_or_else(|| RenderError::ResourceMapFailure {
                label: CONSTANTS_LABEL,
                reason: format!("staging view of {} bytes unavailable", bytes.len()),
            })?;
        mapped.copy_from_slice(bytes);
        Ok(())
    }

    fn bind_vertex_constants(&mut self, slot: u32, buffer: &GpuConstantBuffer) {
        self.bound = Some((slot, buffer.bind_group.clone()));
    }

    fn end_frame(&mut self) -> RenderResult<()> {
        if let Some(Frame { texture, view }) = self.frame.take() {
            drop(view);
            texture.present();
        }
        Ok(())
    }

    /// Attachments are per pass in wgpu; a fresh surface view is acquired by
    /// the next `begin_frame`, so only stale bindings need dropping here.
    fn rebind_targets(&mut self) {
        self.frame = None;
        self.bound = None;
    }
}

/// Uploaded mesh; shared by every entity that draws it.
pub struct GpuMesh {
    name: String,
    vertex_buf: Buffer,
    index_buf: Buffer,
    vertex_count: u32,
    index_count: u32,
}

impl GpuMesh {
    pub fn new(gpu: &GpuState, data: &MeshData) -> Self {
        let vertices: Vec<Vertex> = data.vertices.iter().map(Vertex::from).collect();
        let vertex_buf = gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} VB", data.name)),
                contents: bytemuck::cast_slice(&vertices),
                usage: BufferUsages::VERTEX,
            });
        let index_buf = gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} IB", data.name)),
                contents: bytemuck::cast_slice(&data.indices),
                usage: BufferUsages::INDEX,
            });
        log::debug!(
            "Uploaded mesh '{}' ({} vertices, {} indices)",
            data.name,
            data.vertex_count(),
            data.index_count()
        );
        Self {
            name: data.name.clone(),
            vertex_buf,
            index_buf,
            vertex_count: data.vertex_count(),
            index_count: data.index_count(),
        }
    }
}

impl Drawable<GpuState> for GpuMesh {
    fn name(&self) -> &str {
        &self.name
    }

    fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    fn index_count(&self) -> u32 {
        self.index_count
    }

    fn draw(&self, ctx: &mut GpuState) -> RenderResult<()> {
        ctx.draw_indexed(&self.name, &self.vertex_buf, &self.index_buf, self.index_count)
    }
}

/// Create a depth texture view matching the surface config.
fn create_depth_view(device: &Device, sc: &SurfaceConfiguration) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("DepthTex"),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}
