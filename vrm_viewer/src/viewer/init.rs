use std::{borrow::Cow, collections::BTreeMap, sync::Arc};

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable, cast_slice};
use wgpu::util::DeviceExt;
use winit::{dpi::PhysicalSize, window::Window};

use super::mesh::{MeshInstance, MeshUniforms, MeshVertex, avatar_primitive, primitive, view_projection_uniform};
use super::overlays::{OverlayConfig, TextOverlay};
use super::shaders::{
    GRADIENT_SHADER_SOURCE, MESH_SHADER_SOURCE, OVERLAY_SHADER_SOURCE, QUAD_INDICES, QUAD_VERTICES,
    QuadVertex,
};
use super::{PrimitiveBuffers, ShapeLibrary, ViewerState};
use crate::camera::{OrbitRig, capped_surface_size};
use crate::framing::DEFAULT_FOV_Y;
use crate::room::RoomConfig;
use crate::scenery::PrimitiveShape;
use crate::session::ViewerSession;

pub(super) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const HUD_OVERLAY_CONFIG: OverlayConfig = OverlayConfig {
    width: 520,
    height: 176,
    padding_x: 8,
    padding_y: 8,
    label: "hud-overlay",
};

const INITIAL_INSTANCE_CAPACITY: usize = 64;

/// Bundles the wgpu objects tied to the viewer window.
struct WgpuBootstrap {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    present_mode: wgpu::PresentMode,
    alpha_mode: wgpu::CompositeAlphaMode,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct GradientUniforms {
    top: [f32; 4],
    bottom: [f32; 4],
}

pub(super) async fn new(
    window: Arc<Window>,
    config: RoomConfig,
    session: ViewerSession,
) -> Result<ViewerState> {
    let scale_factor = window.scale_factor();
    let size = capped_surface_size(window.inner_size(), scale_factor);

    let wgpu = bootstrap_wgpu(window.clone()).await?;

    let surface_config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: wgpu.surface_format,
        width: size.width,
        height: size.height,
        present_mode: wgpu.present_mode,
        alpha_mode: wgpu.alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency: 1,
    };

    let (gradient_pipeline, gradient_bind_group) = create_gradient_resources(
        &wgpu.device,
        wgpu.surface_format,
        &config,
    );

    let camera_bind_group_layout =
        wgpu.device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("camera-uniform-layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<MeshUniforms>() as u64,
                        ),
                    },
                    count: None,
                }],
            });

    let initial_uniform = view_projection_uniform(glam::Mat4::IDENTITY);
    let camera_uniform_buffer = wgpu
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera-uniform-buffer"),
            contents: cast_slice(&[initial_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
    let camera_bind_group = wgpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("camera-uniform-bind-group"),
        layout: &camera_bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: camera_uniform_buffer.as_entire_binding(),
        }],
    });

    let mesh_pipeline = create_mesh_pipeline(
        &wgpu.device,
        &camera_bind_group_layout,
        wgpu.surface_format,
    );

    let overlay_bind_group_layout =
        wgpu.device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("overlay-bind-group-layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

    let overlay_pipeline = create_overlay_pipeline(
        &wgpu.device,
        &overlay_bind_group_layout,
        wgpu.surface_format,
    );

    let quad_index_buffer = wgpu
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad-index-buffer"),
            contents: cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });
    let gradient_vertex_buffer = wgpu
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("gradient-quad-vertex-buffer"),
            contents: cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

    let shapes = upload_shape_library(&wgpu.device);

    let mut avatar_buffers = BTreeMap::new();
    for avatar in session.avatars() {
        avatar_buffers.insert(
            avatar.key.clone(),
            upload_primitive(&wgpu.device, &avatar.key, avatar_primitive(&avatar.asset.mesh)),
        );
    }

    let instance_buffer = create_instance_buffer(&wgpu.device, INITIAL_INSTANCE_CAPACITY);

    let depth_view = create_depth_texture(&wgpu.device, size);

    let mut overlay = TextOverlay::new(
        &wgpu.device,
        &wgpu.queue,
        &overlay_bind_group_layout,
        size,
        HUD_OVERLAY_CONFIG,
    )?;
    let tail = session.hud.tail_lines(overlay.max_rows());
    overlay.set_lines(&tail);

    let mut rig = OrbitRig::new(DEFAULT_FOV_Y);
    if let Some(framing) = session.camera_framing() {
        rig.apply_framing(&framing);
    }
    let last_population = session.avatar_count();

    let state = ViewerState {
        window,
        surface: wgpu.surface,
        device: wgpu.device,
        queue: wgpu.queue,
        config: surface_config,
        size,
        scale_factor,
        gradient_pipeline,
        gradient_bind_group,
        gradient_vertex_buffer,
        quad_index_buffer,
        quad_index_count: QUAD_INDICES.len() as u32,
        mesh_pipeline,
        camera_bind_group,
        camera_uniform_buffer,
        depth_view,
        shapes,
        avatar_buffers,
        instance_buffer,
        instance_capacity: INITIAL_INSTANCE_CAPACITY,
        overlay_pipeline,
        overlay,
        rig,
        session,
        last_population,
    };
    state.surface.configure(&state.device, &state.config);
    Ok(state)
}

async fn bootstrap_wgpu(window: Arc<Window>) -> Result<WgpuBootstrap> {
    let instance = wgpu::Instance::default();
    let surface = instance
        .create_surface(window.clone())
        .context("creating wgpu surface")?;

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        })
        .await
        .context("requesting wgpu adapter")?;

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("vrm-viewer-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
            },
            None,
        )
        .await
        .context("requesting wgpu device")?;

    let surface_caps = surface.get_capabilities(&adapter);
    let surface_format = surface_caps
        .formats
        .iter()
        .copied()
        .find(|format| format.is_srgb())
        .unwrap_or(surface_caps.formats[0]);
    let present_mode = surface_caps
        .present_modes
        .iter()
        .copied()
        .find(|mode| *mode == wgpu::PresentMode::Mailbox)
        .unwrap_or(wgpu::PresentMode::Fifo);
    let alpha_mode = surface_caps
        .alpha_modes
        .first()
        .copied()
        .unwrap_or(wgpu::CompositeAlphaMode::Opaque);

    Ok(WgpuBootstrap {
        surface,
        device,
        queue,
        surface_format,
        present_mode,
        alpha_mode,
    })
}

fn create_gradient_resources(
    device: &wgpu::Device,
    surface_format: wgpu::TextureFormat,
    config: &RoomConfig,
) -> (wgpu::RenderPipeline, wgpu::BindGroup) {
    let uniforms = GradientUniforms {
        top: [
            config.background.top[0],
            config.background.top[1],
            config.background.top[2],
            1.0,
        ],
        bottom: [
            config.background.bottom[0],
            config.background.bottom[1],
            config.background.bottom[2],
            1.0,
        ],
    };
    let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("gradient-uniform-buffer"),
        contents: cast_slice(&[uniforms]),
        usage: wgpu::BufferUsages::UNIFORM,
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("gradient-uniform-layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(
                    std::mem::size_of::<GradientUniforms>() as u64
                ),
            },
            count: None,
        }],
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("gradient-bind-group"),
        layout: &bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        }],
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("gradient-shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(GRADIENT_SHADER_SOURCE)),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("gradient-pipeline-layout"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });
    let quad_vertex_layout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<QuadVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2],
    };

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("gradient-pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: "vs_main",
            buffers: &[quad_vertex_layout],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    });

    (pipeline, bind_group)
}

fn create_mesh_pipeline(
    device: &wgpu::Device,
    camera_layout: &wgpu::BindGroupLayout,
    surface_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("mesh-shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(MESH_SHADER_SOURCE)),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("mesh-pipeline-layout"),
        bind_group_layouts: &[camera_layout],
        push_constant_ranges: &[],
    });

    let vertex_layout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MeshVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
    };
    let instance_layout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MeshInstance>() as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &wgpu::vertex_attr_array![
            2 => Float32x4,
            3 => Float32x4,
            4 => Float32x4,
            5 => Float32x4,
            6 => Float32x4,
            7 => Float32x4,
            8 => Float32x4,
            9 => Float32x4,
        ],
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("mesh-pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: "mesh_vs_main",
            buffers: &[vertex_layout, instance_layout],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: "mesh_fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        // Avatar meshes arrive with arbitrary winding and thin scenery planes
        // must read from both sides, so backface culling stays off.
        primitive: wgpu::PrimitiveState {
            cull_mode: None,
            ..wgpu::PrimitiveState::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}

fn create_overlay_pipeline(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    surface_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("overlay-shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(OVERLAY_SHADER_SOURCE)),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("overlay-pipeline-layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });
    let quad_vertex_layout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<QuadVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2],
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("overlay-pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: "vs_main",
            buffers: &[quad_vertex_layout],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}

fn upload_shape_library(device: &wgpu::Device) -> ShapeLibrary {
    ShapeLibrary {
        cube: upload_primitive(device, "shape-box", primitive(PrimitiveShape::Box)),
        cylinder: upload_primitive(device, "shape-cylinder", primitive(PrimitiveShape::Cylinder)),
        plane: upload_primitive(device, "shape-plane", primitive(PrimitiveShape::Plane)),
        torus: upload_primitive(device, "shape-torus", primitive(PrimitiveShape::Torus)),
        dome: upload_primitive(device, "shape-dome", primitive(PrimitiveShape::Dome)),
        disc: upload_primitive(device, "shape-disc", primitive(PrimitiveShape::Disc)),
    }
}

pub(super) fn upload_primitive(
    device: &wgpu::Device,
    label: &str,
    primitive: super::mesh::MeshPrimitive,
) -> PrimitiveBuffers {
    let vertex_label = format!("{label}-vertex-buffer");
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(vertex_label.as_str()),
        contents: cast_slice(&primitive.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let index_label = format!("{label}-index-buffer");
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(index_label.as_str()),
        contents: cast_slice(&primitive.indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    PrimitiveBuffers {
        vertex: vertex_buffer,
        index: index_buffer,
        index_count: primitive.indices.len() as u32,
    }
}

pub(super) fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    let label = format!("mesh-instance-buffer({capacity})");
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label.as_str()),
        size: (capacity * std::mem::size_of::<MeshInstance>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

pub(super) fn create_depth_texture(
    device: &wgpu::Device,
    size: PhysicalSize<u32>,
) -> wgpu::TextureView {
    let extent = wgpu::Extent3d {
        width: size.width.max(1),
        height: size.height.max(1),
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("mesh-depth-texture"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
