//! Window-side runtime: owns the wgpu device/surface, the GPU copies of
//! scenery and avatar meshes, the HUD overlay, and the orbit camera.
//! `init` builds everything once, `render` draws the frame, and the event
//! loop in `main.rs` drives the small mutators exposed here.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use wgpu::SurfaceError;
use winit::{dpi::PhysicalSize, window::Window};

use crate::camera::{OrbitRig, capped_surface_size};
use crate::room::RoomConfig;
use crate::scenery::PrimitiveShape;
use crate::session::ViewerSession;

mod init;
mod mesh;
mod overlays;
mod render;
mod shaders;

/// Uploaded vertex/index buffers for one mesh.
pub(crate) struct PrimitiveBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

/// GPU copies of the six scenery primitives.
struct ShapeLibrary {
    cube: PrimitiveBuffers,
    cylinder: PrimitiveBuffers,
    plane: PrimitiveBuffers,
    torus: PrimitiveBuffers,
    dome: PrimitiveBuffers,
    disc: PrimitiveBuffers,
}

impl ShapeLibrary {
    fn get(&self, shape: PrimitiveShape) -> &PrimitiveBuffers {
        match shape {
            PrimitiveShape::Box => &self.cube,
            PrimitiveShape::Cylinder => &self.cylinder,
            PrimitiveShape::Plane => &self.plane,
            PrimitiveShape::Torus => &self.torus,
            PrimitiveShape::Dome => &self.dome,
            PrimitiveShape::Disc => &self.disc,
        }
    }
}

pub struct ViewerState {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    scale_factor: f64,
    gradient_pipeline: wgpu::RenderPipeline,
    gradient_bind_group: wgpu::BindGroup,
    gradient_vertex_buffer: wgpu::Buffer,
    quad_index_buffer: wgpu::Buffer,
    quad_index_count: u32,
    mesh_pipeline: wgpu::RenderPipeline,
    camera_bind_group: wgpu::BindGroup,
    camera_uniform_buffer: wgpu::Buffer,
    depth_view: wgpu::TextureView,
    shapes: ShapeLibrary,
    avatar_buffers: BTreeMap<String, PrimitiveBuffers>,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    overlay_pipeline: wgpu::RenderPipeline,
    overlay: overlays::TextOverlay,
    rig: OrbitRig,
    session: ViewerSession,
    last_population: usize,
}

impl ViewerState {
    pub async fn new(
        window: Arc<Window>,
        config: RoomConfig,
        session: ViewerSession,
    ) -> Result<Self> {
        init::new(window, config, session).await
    }

    pub fn window(&self) -> &Window {
        self.window.as_ref()
    }

    pub fn session_mut(&mut self) -> &mut ViewerSession {
        &mut self.session
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        let capped = capped_surface_size(new_size, self.scale_factor);
        self.size = capped;
        self.config.width = capped.width;
        self.config.height = capped.height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = init::create_depth_texture(&self.device, capped);
        self.overlay.update_layout(&self.device, capped);
    }

    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = scale_factor;
    }

    /// Per-frame bookkeeping: advance animation, blend the camera, pick up
    /// registry changes, and refresh the HUD panel.
    pub fn update(&mut self, dt: f32) {
        self.session.advance(dt);
        self.rig.update(dt);
        self.sync_avatars();

        let tail = self.session.hud.tail_lines(self.overlay.max_rows());
        self.overlay.set_lines(&tail);
    }

    pub fn orbit(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.rig.orbit(yaw_delta, pitch_delta);
    }

    pub fn zoom(&mut self, factor: f32) {
        self.rig.zoom(factor);
    }

    pub fn render(&mut self) -> Result<(), SurfaceError> {
        render::render(self)
    }

    /// Mirror the session registry onto the GPU: upload meshes for newly
    /// loaded avatars, drop buffers for cleared ones, and retarget the
    /// camera when the population changes.
    fn sync_avatars(&mut self) {
        let mut live: Vec<&str> = Vec::with_capacity(self.session.avatar_count());
        for avatar in self.session.avatars() {
            live.push(avatar.key.as_str());
            if !self.avatar_buffers.contains_key(&avatar.key) {
                let primitive = mesh::avatar_primitive(&avatar.asset.mesh);
                let buffers = init::upload_primitive(&self.device, &avatar.key, primitive);
                self.avatar_buffers.insert(avatar.key.clone(), buffers);
            }
        }
        self.avatar_buffers
            .retain(|key, _| live.iter().any(|live_key| live_key == key));

        let population = self.session.avatar_count();
        if population != self.last_population {
            self.last_population = population;
            if let Some(framing) = self.session.camera_framing() {
                self.rig.apply_framing(&framing);
            }
        }
    }
}
