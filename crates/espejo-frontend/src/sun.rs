#![forbid(unsafe_code)]

//! WebGPU renderer for the landing-page sun.
//!
//! The sphere mesh lives in a read-only storage buffer of `vec4` positions
//! (`espejo_core::scene::unit_sphere`), so the vertex stage indexes it with
//! `vertex_index` and no vertex buffers are bound. Each frame issues two
//! draws against the same mesh:
//!
//! 1. corona: back faces only, translucent orange, alpha blended;
//! 2. sun: front faces, opaque gold.
//!
//! The sphere is convex, so face culling is enough and no depth buffer is
//! allocated.

use std::fmt;

#[cfg(any(target_arch = "wasm32", test))]
use espejo_core::scene::DrawUniforms;

// ---------------------------------------------------------------------------
// Platform-agnostic types
// ---------------------------------------------------------------------------

/// Bytes of one draw's uniform block: `mat4x4<f32>` + `vec4<f32>`.
#[cfg(any(target_arch = "wasm32", test))]
const DRAW_UNIFORM_BYTES: usize = 80;

/// Bytes of one mesh vertex (`vec4<f32>`).
#[cfg(any(target_arch = "wasm32", test))]
const VERTEX_BYTES: usize = 16;

/// Errors from GPU initialization or a frame.
#[derive(Debug, Clone)]
pub enum RendererError {
    /// No WebGPU adapter (browser without WebGPU, or blocked).
    NoAdapter,
    DeviceError(String),
    SurfaceError(String),
}

impl fmt::Display for RendererError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAdapter => write!(f, "WebGPU adapter not available"),
            Self::DeviceError(msg) => write!(f, "WebGPU device error: {msg}"),
            Self::SurfaceError(msg) => write!(f, "WebGPU surface error: {msg}"),
        }
    }
}

impl std::error::Error for RendererError {}

/// Serialize one draw's uniforms to the WGSL `Draw` layout.
#[cfg(any(target_arch = "wasm32", test))]
fn draw_uniform_bytes(uniforms: &DrawUniforms) -> [u8; DRAW_UNIFORM_BYTES] {
    let mut buf = [0u8; DRAW_UNIFORM_BYTES];
    let floats = uniforms
        .mvp
        .to_cols_array()
        .into_iter()
        .chain(uniforms.color);
    for (chunk, value) in buf.chunks_exact_mut(4).zip(floats) {
        chunk.copy_from_slice(&value.to_le_bytes());
    }
    buf
}

/// Pack mesh positions for the storage buffer.
#[cfg(any(target_arch = "wasm32", test))]
fn mesh_bytes(positions: &[[f32; 4]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(positions.len() * VERTEX_BYTES);
    for p in positions {
        for c in p {
            out.extend_from_slice(&c.to_le_bytes());
        }
    }
    out
}

// ---------------------------------------------------------------------------
// WGSL
// ---------------------------------------------------------------------------

#[cfg(target_arch = "wasm32")]
const SUN_SHADER_WGSL: &str = r#"
struct Draw {
    mvp: mat4x4<f32>,
    color: vec4<f32>,
};

@group(0) @binding(0) var<uniform> draw: Draw;
@group(0) @binding(1) var<storage, read> positions: array<vec4<f32>>;

@vertex
fn vs_main(@builtin(vertex_index) vi: u32) -> @builtin(position) vec4<f32> {
    return draw.mvp * positions[vi];
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return draw.color;
}
"#;

// ---------------------------------------------------------------------------
// GPU renderer (wasm32 only)
// ---------------------------------------------------------------------------

#[cfg(target_arch = "wasm32")]
mod gpu {
    use super::*;
    use espejo_core::scene::{FrameUniforms, SPHERE_SEGMENTS, unit_sphere};
    use web_sys::HtmlCanvasElement;

    /// One draw: its pipeline and the uniform block it reads.
    struct DrawPass {
        pipeline: wgpu::RenderPipeline,
        uniform_buffer: wgpu::Buffer,
        bind_group: wgpu::BindGroup,
    }

    /// WebGPU resources for the sun scene.
    pub struct SunRenderer {
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface: wgpu::Surface<'static>,
        surface_config: wgpu::SurfaceConfiguration,
        corona: DrawPass,
        sun: DrawPass,
        _mesh_buffer: wgpu::Buffer,
        vertex_count: u32,
    }

    impl SunRenderer {
        /// Initialize WebGPU on `canvas` at `width`×`height` pixels.
        pub async fn init(
            canvas: HtmlCanvasElement,
            width: u32,
            height: u32,
        ) -> Result<Self, RendererError> {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::BROWSER_WEBGPU,
                ..Default::default()
            });

            let surface = instance
                .create_surface(wgpu::SurfaceTarget::Canvas(canvas))
                .map_err(|e| RendererError::SurfaceError(e.to_string()))?;

            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::LowPower,
                    compatible_surface: Some(&surface),
                    force_fallback_adapter: false,
                })
                .await
                .map_err(|_| RendererError::NoAdapter)?;

            let (device, queue) = adapter
                .request_device(&wgpu::DeviceDescriptor {
                    label: Some("espejo-sun"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults(),
                    ..Default::default()
                })
                .await
                .map_err(|e| RendererError::DeviceError(e.to_string()))?;

            let surface_caps = surface.get_capabilities(&adapter);
            let format = surface_caps
                .formats
                .first()
                .copied()
                .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);

            let surface_config = wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format,
                width: width.max(1),
                height: height.max(1),
                present_mode: wgpu::PresentMode::Fifo,
                desired_maximum_frame_latency: 2,
                alpha_mode: surface_caps
                    .alpha_modes
                    .first()
                    .copied()
                    .unwrap_or(wgpu::CompositeAlphaMode::Auto),
                view_formats: vec![],
            };
            surface.configure(&device, &surface_config);

            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("sun_shader"),
                source: wgpu::ShaderSource::Wgsl(SUN_SHADER_WGSL.into()),
            });

            let bind_group_layout =
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("sun_bgl"),
                    entries: &[
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::VERTEX,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Storage { read_only: true },
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                    ],
                });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("sun_pl"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

            let mesh = unit_sphere(SPHERE_SEGMENTS.0, SPHERE_SEGMENTS.1);
            let mesh_bytes = mesh_bytes(&mesh);
            let mesh_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("sun_mesh"),
                size: mesh_bytes.len().max(VERTEX_BYTES) as u64,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            queue.write_buffer(&mesh_buffer, 0, &mesh_bytes);

            let make_pass = |label: &str, cull: wgpu::Face, blend: wgpu::BlendState| {
                let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(label),
                    layout: Some(&pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &shader,
                        entry_point: Some("vs_main"),
                        buffers: &[],
                        compilation_options: Default::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &shader,
                        entry_point: Some("fs_main"),
                        targets: &[Some(wgpu::ColorTargetState {
                            format,
                            blend: Some(blend),
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                        compilation_options: Default::default(),
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        front_face: wgpu::FrontFace::Ccw,
                        cull_mode: Some(cull),
                        ..Default::default()
                    },
                    depth_stencil: None,
                    multisample: wgpu::MultisampleState::default(),
                    multiview_mask: None,
                    cache: None,
                });
                let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(label),
                    size: DRAW_UNIFORM_BYTES as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(label),
                    layout: &bind_group_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: uniform_buffer.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: mesh_buffer.as_entire_binding(),
                        },
                    ],
                });
                DrawPass {
                    pipeline,
                    uniform_buffer,
                    bind_group,
                }
            };

            let corona = make_pass("corona", wgpu::Face::Front, wgpu::BlendState::ALPHA_BLENDING);
            let sun = make_pass("sun", wgpu::Face::Back, wgpu::BlendState::REPLACE);

            Ok(Self {
                device,
                queue,
                surface,
                surface_config,
                corona,
                sun,
                _mesh_buffer: mesh_buffer,
                vertex_count: mesh.len() as u32,
            })
        }

        /// Reconfigure the surface for a new canvas size.
        pub fn resize(&mut self, width: u32, height: u32) {
            self.surface_config.width = width.max(1);
            self.surface_config.height = height.max(1);
            self.surface.configure(&self.device, &self.surface_config);
        }

        /// Upload this frame's uniforms, draw corona then sun, and present.
        pub fn render_frame(&mut self, uniforms: &FrameUniforms) -> Result<(), RendererError> {
            self.queue.write_buffer(
                &self.corona.uniform_buffer,
                0,
                &draw_uniform_bytes(&uniforms.corona),
            );
            self.queue
                .write_buffer(&self.sun.uniform_buffer, 0, &draw_uniform_bytes(&uniforms.sun));

            let output = self
                .surface
                .get_current_texture()
                .map_err(|e| RendererError::SurfaceError(e.to_string()))?;

            let view = output
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());

            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("sun_frame"),
                });

            {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("sun_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        depth_slice: None,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                    multiview_mask: None,
                });

                for draw in [&self.corona, &self.sun] {
                    pass.set_pipeline(&draw.pipeline);
                    pass.set_bind_group(0, &draw.bind_group, &[]);
                    pass.draw(0..self.vertex_count, 0..1);
                }
            }

            self.queue.submit(std::iter::once(encoder.finish()));
            output.present();
            Ok(())
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use gpu::SunRenderer;
