use layers::{Lighting, Rgba8};

/// Per-frame shader inputs.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// Sun direction then `[ambient, diffuse, 0, 0]`.
    pub lighting: [[f32; 4]; 2],
    pub line_color: [f32; 4],
}

impl FrameUniforms {
    pub fn new(view_proj: [[f32; 4]; 4], lighting: &Lighting, line_color: Rgba8) -> Self {
        Self {
            view_proj,
            lighting: lighting.to_uniform(),
            line_color: line_color.to_f32(),
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod imp {
    use ::wgpu::util::DeviceExt;
    use layers::MeshBuffers;
    use std::borrow::Cow;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;

    use super::FrameUniforms;

    #[derive(Debug)]
    pub struct WgpuContext {
        pub _instance: &'static ::wgpu::Instance,
        pub surface: ::wgpu::Surface<'static>,
        pub device: ::wgpu::Device,
        pub queue: ::wgpu::Queue,
        pub config: ::wgpu::SurfaceConfiguration,
        pub _canvas: web_sys::HtmlCanvasElement,
        pub extrusion_pipeline: ::wgpu::RenderPipeline,
        pub wireframe_pipeline: ::wgpu::RenderPipeline,
        pub uniform_buffer: ::wgpu::Buffer,
        pub uniform_bind_group: ::wgpu::BindGroup,
        pub depth_view: ::wgpu::TextureView,
        pub vertex_buffer: ::wgpu::Buffer,
        pub index_buffer: ::wgpu::Buffer,
        pub index_count: u32,
        pub wireframe_vertex_buffer: ::wgpu::Buffer,
        pub wireframe_vertex_count: u32,
    }

    const EXTRUSION_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    sun_dir: vec4<f32>,
    light: vec4<f32>,
    line_color: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec4<f32>,
) -> VsOut {
    return VsOut(globals.view_proj * vec4<f32>(position, 1.0), normal, color);
}

@fragment
fn fs_main(fs_in: VsOut) -> @location(0) vec4<f32> {
    let n = normalize(fs_in.normal);
    let lambert = max(dot(n, globals.sun_dir.xyz), 0.0);
    let shade = globals.light.x + globals.light.y * lambert;
    return vec4<f32>(fs_in.color.rgb * shade, fs_in.color.a);
}
"#;

    const WIREFRAME_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    sun_dir: vec4<f32>,
    light: vec4<f32>,
    line_color: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return globals.view_proj * vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return globals.line_color;
}
"#;

    /// Basemap-like light grey behind the prisms.
    const CLEAR_COLOR: ::wgpu::Color = ::wgpu::Color {
        r: 0.925,
        g: 0.925,
        b: 0.914,
        a: 1.0,
    };

    #[repr(C)]
    #[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
    struct Vertex {
        position: [f32; 3],
        normal: [f32; 3],
        color: [f32; 4],
    }

    #[repr(C)]
    #[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
    struct LineVertex {
        position: [f32; 3],
    }

    #[repr(C)]
    #[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
    struct Globals {
        view_proj: [[f32; 4]; 4],
        sun_dir: [f32; 4],
        light: [f32; 4],
        line_color: [f32; 4],
    }

    impl From<&FrameUniforms> for Globals {
        fn from(u: &FrameUniforms) -> Self {
            Self {
                view_proj: u.view_proj,
                sun_dir: u.lighting[0],
                light: u.lighting[1],
                line_color: u.line_color,
            }
        }
    }

    fn create_depth_view(
        device: &::wgpu::Device,
        config: &::wgpu::SurfaceConfiguration,
    ) -> ::wgpu::TextureView {
        let tex = device.create_texture(&::wgpu::TextureDescriptor {
            label: Some("demand-map-depth"),
            size: ::wgpu::Extent3d {
                width: config.width.max(1),
                height: config.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: ::wgpu::TextureDimension::D2,
            format: ::wgpu::TextureFormat::Depth24Plus,
            usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        tex.create_view(&::wgpu::TextureViewDescriptor::default())
    }

    pub async fn init_wgpu_from_canvas_id(canvas_id: &str) -> Result<WgpuContext, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("window missing"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("document missing"))?;
        let canvas_elem = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str("canvas missing"))?
            .dyn_into::<web_sys::HtmlCanvasElement>()?;

        let width = canvas_elem.width();
        let height = canvas_elem.height();

        // `wgpu::Surface` must not outlive its `wgpu::Instance`; the instance
        // is leaked for the lifetime of the page.
        let instance: &'static ::wgpu::Instance = Box::leak(Box::new(::wgpu::Instance::new(
            &::wgpu::InstanceDescriptor {
                backends: ::wgpu::Backends::BROWSER_WEBGPU | ::wgpu::Backends::GL,
                ..Default::default()
            },
        )));

        let surface = instance
            .create_surface(::wgpu::SurfaceTarget::Canvas(canvas_elem.clone()))
            .map_err(|e| JsValue::from_str(&format!("surface error: {e}")))?;

        let adapter = instance
            .request_adapter(&::wgpu::RequestAdapterOptions {
                power_preference: ::wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| JsValue::from_str(&format!("adapter error: {e}")))?;

        let (device, queue) = adapter
            .request_device(&::wgpu::DeviceDescriptor {
                label: Some("demand-map-device"),
                required_features: ::wgpu::Features::empty(),
                required_limits: ::wgpu::Limits::downlevel_webgl2_defaults(),
                ..Default::default()
            })
            .await
            .map_err(|e| JsValue::from_str(&format!("device error: {e}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .cloned()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().cloned())
            .ok_or_else(|| JsValue::from_str("surface reports no formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .cloned()
            .unwrap_or(::wgpu::CompositeAlphaMode::Auto);

        let config = ::wgpu::SurfaceConfiguration {
            usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            desired_maximum_frame_latency: 2,
            present_mode: ::wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let depth_view = create_depth_view(&device, &config);

        let extrusion_shader = device.create_shader_module(::wgpu::ShaderModuleDescriptor {
            label: Some("demand-map-extrusion-shader"),
            source: ::wgpu::ShaderSource::Wgsl(Cow::Borrowed(EXTRUSION_SHADER)),
        });

        let wireframe_shader = device.create_shader_module(::wgpu::ShaderModuleDescriptor {
            label: Some("demand-map-wireframe-shader"),
            source: ::wgpu::ShaderSource::Wgsl(Cow::Borrowed(WIREFRAME_SHADER)),
        });

        // WebGL2 has no storage buffers, so globals live in a uniform buffer.
        let uniform_buffer = device.create_buffer(&::wgpu::BufferDescriptor {
            label: Some("demand-map-globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: ::wgpu::BufferUsages::UNIFORM | ::wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
                label: Some("demand-map-globals-bgl"),
                entries: &[::wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ::wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: ::wgpu::BindingType::Buffer {
                        ty: ::wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&::wgpu::BindGroupDescriptor {
            label: Some("demand-map-globals-bg"),
            layout: &uniform_bind_group_layout,
            entries: &[::wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
            label: Some("demand-map-pipeline-layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            immediate_size: 0,
        });

        let extrusion_pipeline = device.create_render_pipeline(&::wgpu::RenderPipelineDescriptor {
            label: Some("demand-map-extrusion-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: ::wgpu::VertexState {
                module: &extrusion_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[::wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as ::wgpu::BufferAddress,
                    step_mode: ::wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        ::wgpu::VertexAttribute {
                            format: ::wgpu::VertexFormat::Float32x3,
                            offset: 0,
                            shader_location: 0,
                        },
                        ::wgpu::VertexAttribute {
                            format: ::wgpu::VertexFormat::Float32x3,
                            offset: 12,
                            shader_location: 1,
                        },
                        ::wgpu::VertexAttribute {
                            format: ::wgpu::VertexFormat::Float32x4,
                            offset: 24,
                            shader_location: 2,
                        },
                    ],
                }],
            },
            fragment: Some(::wgpu::FragmentState {
                module: &extrusion_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(::wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(::wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: ::wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: ::wgpu::PrimitiveState {
                topology: ::wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: ::wgpu::FrontFace::Ccw,
                // Cap and wall winding depends on the source ring orientation.
                cull_mode: None,
                polygon_mode: ::wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(::wgpu::DepthStencilState {
                format: ::wgpu::TextureFormat::Depth24Plus,
                depth_write_enabled: true,
                depth_compare: ::wgpu::CompareFunction::Less,
                stencil: ::wgpu::StencilState::default(),
                bias: ::wgpu::DepthBiasState::default(),
            }),
            multisample: ::wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let wireframe_pipeline = device.create_render_pipeline(&::wgpu::RenderPipelineDescriptor {
            label: Some("demand-map-wireframe-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: ::wgpu::VertexState {
                module: &wireframe_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[::wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<LineVertex>() as ::wgpu::BufferAddress,
                    step_mode: ::wgpu::VertexStepMode::Vertex,
                    attributes: &[::wgpu::VertexAttribute {
                        format: ::wgpu::VertexFormat::Float32x3,
                        offset: 0,
                        shader_location: 0,
                    }],
                }],
            },
            fragment: Some(::wgpu::FragmentState {
                module: &wireframe_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(::wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(::wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: ::wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: ::wgpu::PrimitiveState {
                topology: ::wgpu::PrimitiveTopology::LineList,
                strip_index_format: None,
                front_face: ::wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: ::wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(::wgpu::DepthStencilState {
                format: ::wgpu::TextureFormat::Depth24Plus,
                depth_write_enabled: false,
                depth_compare: ::wgpu::CompareFunction::LessEqual,
                stencil: ::wgpu::StencilState::default(),
                bias: ::wgpu::DepthBiasState::default(),
            }),
            multisample: ::wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        // Placeholders until the first upload.
        let vertex_buffer = device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
            label: Some("demand-map-vertices"),
            contents: bytemuck::bytes_of(&Vertex {
                position: [0.0; 3],
                normal: [0.0; 3],
                color: [0.0; 4],
            }),
            usage: ::wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
            label: Some("demand-map-indices"),
            contents: bytemuck::cast_slice(&[0u32]),
            usage: ::wgpu::BufferUsages::INDEX,
        });
        let wireframe_vertex_buffer =
            device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                label: Some("demand-map-wireframe"),
                contents: bytemuck::bytes_of(&LineVertex { position: [0.0; 3] }),
                usage: ::wgpu::BufferUsages::VERTEX,
            });

        // Initialize uniforms so the first render doesn't read uninitialized memory.
        let globals = Globals {
            view_proj: [[0.0; 4]; 4],
            sun_dir: [0.0, 0.0, 1.0, 0.0],
            light: [1.0, 0.0, 0.0, 0.0],
            line_color: [1.0; 4],
        };
        queue.write_buffer(&uniform_buffer, 0, bytemuck::bytes_of(&globals));

        Ok(WgpuContext {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            _canvas: canvas_elem,
            extrusion_pipeline,
            wireframe_pipeline,
            uniform_buffer,
            uniform_bind_group,
            depth_view,
            vertex_buffer,
            index_buffer,
            index_count: 0,
            wireframe_vertex_buffer,
            wireframe_vertex_count: 0,
        })
    }

    pub fn upload_mesh(ctx: &mut WgpuContext, mesh: &MeshBuffers) {
        if mesh.indices.is_empty() {
            ctx.index_count = 0;
            return;
        }
        let vertices: Vec<Vertex> = mesh
            .vertices
            .iter()
            .map(|v| Vertex {
                position: v.position,
                normal: v.normal,
                color: v.color,
            })
            .collect();

        ctx.vertex_buffer = ctx
            .device
            .create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                label: Some("demand-map-vertices"),
                contents: bytemuck::cast_slice(&vertices),
                usage: ::wgpu::BufferUsages::VERTEX,
            });
        ctx.index_buffer = ctx
            .device
            .create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                label: Some("demand-map-indices"),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: ::wgpu::BufferUsages::INDEX,
            });
        ctx.index_count = mesh.indices.len() as u32;
    }

    pub fn upload_wireframe(ctx: &mut WgpuContext, points: &[[f32; 3]]) {
        if points.is_empty() {
            ctx.wireframe_vertex_count = 0;
            return;
        }
        ctx.wireframe_vertex_buffer =
            ctx.device
                .create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                    label: Some("demand-map-wireframe"),
                    contents: bytemuck::cast_slice(points),
                    usage: ::wgpu::BufferUsages::VERTEX,
                });
        ctx.wireframe_vertex_count = points.len() as u32;
    }

    pub fn surface_size(ctx: &WgpuContext) -> (u32, u32) {
        (ctx.config.width, ctx.config.height)
    }

    pub fn resize_wgpu(ctx: &mut WgpuContext, width: u32, height: u32) {
        ctx.config.width = width.max(1);
        ctx.config.height = height.max(1);
        ctx.surface.configure(&ctx.device, &ctx.config);
        ctx.depth_view = create_depth_view(&ctx.device, &ctx.config);
    }

    pub fn render_scene(ctx: &WgpuContext, uniforms: &FrameUniforms) -> Result<(), JsValue> {
        let frame = ctx
            .surface
            .get_current_texture()
            .map_err(|e| JsValue::from_str(&format!("surface acquire failed: {e}")))?;
        let view = frame
            .texture
            .create_view(&::wgpu::TextureViewDescriptor::default());

        ctx.queue.write_buffer(
            &ctx.uniform_buffer,
            0,
            bytemuck::bytes_of(&Globals::from(uniforms)),
        );

        let mut encoder = ctx
            .device
            .create_command_encoder(&::wgpu::CommandEncoderDescriptor {
                label: Some("demand-map-encoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&::wgpu::RenderPassDescriptor {
                label: Some("demand-map-pass"),
                color_attachments: &[Some(::wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: ::wgpu::Operations {
                        load: ::wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: ::wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(::wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_view,
                    depth_ops: Some(::wgpu::Operations {
                        load: ::wgpu::LoadOp::Clear(1.0),
                        store: ::wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            rpass.set_bind_group(0, &ctx.uniform_bind_group, &[]);

            if ctx.index_count > 0 {
                rpass.set_pipeline(&ctx.extrusion_pipeline);
                rpass.set_vertex_buffer(0, ctx.vertex_buffer.slice(..));
                rpass.set_index_buffer(ctx.index_buffer.slice(..), ::wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..ctx.index_count, 0, 0..1);
            }

            // Outlines after the fills so they stay visible through the tops.
            if ctx.wireframe_vertex_count > 0 {
                rpass.set_pipeline(&ctx.wireframe_pipeline);
                rpass.set_vertex_buffer(0, ctx.wireframe_vertex_buffer.slice(..));
                rpass.draw(0..ctx.wireframe_vertex_count, 0..1);
            }
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod imp {
    use layers::MeshBuffers;
    use wasm_bindgen::prelude::JsValue;

    use super::FrameUniforms;

    #[derive(Debug, Default)]
    pub struct WgpuContext;

    pub async fn init_wgpu_from_canvas_id(_canvas_id: &str) -> Result<WgpuContext, JsValue> {
        Err(JsValue::from_str(
            "wgpu initialization is only available on wasm32 targets",
        ))
    }

    pub fn upload_mesh(_ctx: &mut WgpuContext, _mesh: &MeshBuffers) {}

    pub fn upload_wireframe(_ctx: &mut WgpuContext, _points: &[[f32; 3]]) {}

    pub fn surface_size(_ctx: &WgpuContext) -> (u32, u32) {
        (0, 0)
    }

    pub fn resize_wgpu(_ctx: &mut WgpuContext, _width: u32, _height: u32) {}

    pub fn render_scene(_ctx: &WgpuContext, _uniforms: &FrameUniforms) -> Result<(), JsValue> {
        Err(JsValue::from_str(
            "wgpu rendering is only available on wasm32 targets",
        ))
    }
}

pub use imp::{
    WgpuContext, init_wgpu_from_canvas_id, render_scene, resize_wgpu, surface_size, upload_mesh,
    upload_wireframe,
};

#[cfg(test)]
mod tests {
    use super::FrameUniforms;
    use foundation::math::Vec3;
    use layers::{Lighting, Rgba8};

    #[test]
    fn uniforms_pack_lighting_and_line_colour() {
        let lighting = Lighting {
            ambient_intensity: 1.0,
            sun_intensity: 0.5,
            sun_dir: Vec3::UNIT_Z,
        };
        let u = FrameUniforms::new([[0.0; 4]; 4], &lighting, Rgba8::WHITE);
        assert_eq!(u.lighting[0], [0.0, 0.0, 1.0, 0.0]);
        assert_eq!(u.lighting[1][0], 0.35);
        assert_eq!(u.lighting[1][1], 0.3);
        assert_eq!(u.line_color, [1.0; 4]);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn host_context_reports_an_empty_surface() {
        let mut ctx = super::WgpuContext;
        super::resize_wgpu(&mut ctx, 800, 600);
        assert_eq!(super::surface_size(&ctx), (0, 0));
    }
}
