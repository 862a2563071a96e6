use bytemuck::cast_slice;
use glam::{Mat4, Vec3};
use wgpu::SurfaceError;

use super::mesh::{MeshInstance, view_projection_uniform};
use super::{ViewerState, init};
use crate::camera::aspect_ratio;
use crate::room::rgb;
use crate::scenery::PrimitiveShape;

const GROUND_RADIUS: f32 = 5.2;
const GROUND_COLOR: [f32; 3] = rgb(0x141721);

const SHAPE_ORDER: [PrimitiveShape; 6] = [
    PrimitiveShape::Box,
    PrimitiveShape::Cylinder,
    PrimitiveShape::Plane,
    PrimitiveShape::Torus,
    PrimitiveShape::Dome,
    PrimitiveShape::Disc,
];

#[derive(Clone, Copy, Default)]
struct InstanceRange {
    offset: u32,
    count: u32,
}

struct FrameInstances {
    combined: Vec<MeshInstance>,
    shape_ranges: Vec<(PrimitiveShape, InstanceRange)>,
    /// One range per avatar, in registry load order.
    avatar_ranges: Vec<InstanceRange>,
}

pub(super) fn render(state: &mut ViewerState) -> Result<(), SurfaceError> {
    let frame = state.surface.get_current_texture()?;
    let view = frame
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());
    let mut encoder = state
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("vrm-viewer-encoder"),
        });

    let aspect = aspect_ratio(state.size);
    let uniform = view_projection_uniform(state.rig.view_projection(aspect));
    state
        .queue
        .write_buffer(&state.camera_uniform_buffer, 0, cast_slice(&[uniform]));

    let instances = build_frame_instances(state);
    ensure_instance_capacity(state, instances.combined.len());
    state
        .queue
        .write_buffer(&state.instance_buffer, 0, cast_slice(&instances.combined));
    state.overlay.upload(&state.queue);

    draw_background(state, &view, &mut encoder);
    draw_meshes(state, &view, &mut encoder, &instances);
    draw_overlay(state, &view, &mut encoder);

    state.queue.submit(std::iter::once(encoder.finish()));
    frame.present();
    Ok(())
}

fn draw_background(
    state: &ViewerState,
    view: &wgpu::TextureView,
    encoder: &mut wgpu::CommandEncoder,
) {
    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("gradient-pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    rpass.set_pipeline(&state.gradient_pipeline);
    rpass.set_bind_group(0, &state.gradient_bind_group, &[]);
    rpass.set_vertex_buffer(0, state.gradient_vertex_buffer.slice(..));
    rpass.set_index_buffer(state.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
    rpass.draw_indexed(0..state.quad_index_count, 0, 0..1);
}

fn draw_meshes(
    state: &ViewerState,
    view: &wgpu::TextureView,
    encoder: &mut wgpu::CommandEncoder,
    instances: &FrameInstances,
) {
    if instances.combined.is_empty() {
        return;
    }

    let depth_attachment = wgpu::RenderPassDepthStencilAttachment {
        view: &state.depth_view,
        depth_ops: Some(wgpu::Operations {
            load: wgpu::LoadOp::Clear(1.0),
            store: wgpu::StoreOp::Store,
        }),
        stencil_ops: None,
    };

    let mut mesh_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("mesh-pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: Some(depth_attachment),
        timestamp_writes: None,
        occlusion_query_set: None,
    });

    mesh_pass.set_pipeline(&state.mesh_pipeline);
    mesh_pass.set_bind_group(0, &state.camera_bind_group, &[]);

    let instance_bytes =
        (instances.combined.len() * std::mem::size_of::<MeshInstance>()) as u64;
    mesh_pass.set_vertex_buffer(1, state.instance_buffer.slice(0..instance_bytes));

    for &(shape, range) in &instances.shape_ranges {
        if range.count == 0 {
            continue;
        }
        let buffers = state.shapes.get(shape);
        mesh_pass.set_vertex_buffer(0, buffers.vertex.slice(..));
        mesh_pass.set_index_buffer(buffers.index.slice(..), wgpu::IndexFormat::Uint32);
        mesh_pass.draw_indexed(
            0..buffers.index_count,
            0,
            range.offset..(range.offset + range.count),
        );
    }

    for (avatar, range) in state.session.avatars().zip(&instances.avatar_ranges) {
        let Some(buffers) = state.avatar_buffers.get(&avatar.key) else {
            continue;
        };
        mesh_pass.set_vertex_buffer(0, buffers.vertex.slice(..));
        mesh_pass.set_index_buffer(buffers.index.slice(..), wgpu::IndexFormat::Uint32);
        mesh_pass.draw_indexed(
            0..buffers.index_count,
            0,
            range.offset..(range.offset + range.count),
        );
    }
}

fn draw_overlay(
    state: &ViewerState,
    view: &wgpu::TextureView,
    encoder: &mut wgpu::CommandEncoder,
) {
    if !state.overlay.is_visible() {
        return;
    }
    let mut overlay_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("hud-overlay-pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    overlay_pass.set_pipeline(&state.overlay_pipeline);
    overlay_pass.set_bind_group(0, state.overlay.bind_group(), &[]);
    overlay_pass.set_vertex_buffer(0, state.overlay.vertex_buffer().slice(..));
    overlay_pass.set_index_buffer(state.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
    overlay_pass.draw_indexed(0..state.quad_index_count, 0, 0..1);
}

/// Collect the frame's instances: the ground disc, scenery grouped by shape
/// so each primitive draws once, then one instance per avatar.
fn build_frame_instances(state: &ViewerState) -> FrameInstances {
    let mut combined = Vec::with_capacity(state.session.scenery().len() + 8);
    let mut shape_ranges = Vec::with_capacity(SHAPE_ORDER.len());

    for shape in SHAPE_ORDER {
        let offset = combined.len() as u32;

        if shape == PrimitiveShape::Disc {
            combined.push(MeshInstance::new(
                Mat4::from_scale(Vec3::new(GROUND_RADIUS, 1.0, GROUND_RADIUS)),
                [GROUND_COLOR[0], GROUND_COLOR[1], GROUND_COLOR[2], 1.0],
            ));
        }
        for piece in state
            .session
            .scenery()
            .iter()
            .filter(|piece| piece.shape == shape)
        {
            let model =
                Mat4::from_scale_rotation_translation(piece.scale, piece.rotation, piece.position);
            combined.push(MeshInstance::new(
                model,
                [piece.color[0], piece.color[1], piece.color[2], 1.0],
            ));
        }

        shape_ranges.push((
            shape,
            InstanceRange {
                offset,
                count: combined.len() as u32 - offset,
            },
        ));
    }

    let mut avatar_ranges = Vec::with_capacity(state.session.avatar_count());
    for (index, avatar) in state.session.avatars().enumerate() {
        let offset = combined.len() as u32;
        let model = avatar.model_matrix(state.session.sway_yaw(index));
        combined.push(MeshInstance::new(model, [0.92, 0.92, 0.92, 1.0]));
        avatar_ranges.push(InstanceRange { offset, count: 1 });
    }

    FrameInstances {
        combined,
        shape_ranges,
        avatar_ranges,
    }
}

/// Grow the shared instance buffer if the current frame needs more slots.
fn ensure_instance_capacity(state: &mut ViewerState, required: usize) {
    if required <= state.instance_capacity {
        return;
    }
    let capacity = required.next_power_of_two().max(state.instance_capacity);
    state.instance_buffer = init::create_instance_buffer(&state.device, capacity);
    state.instance_capacity = capacity;
}
