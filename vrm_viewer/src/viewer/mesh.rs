//! Procedural primitives for scenery plus the conversion from a decoded
//! avatar mesh into GPU-ready vertex data. Primitive geometry is unit-sized
//! in local space; the per-instance transform supplies the real dimensions.

use std::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use vrm_formats::VrmMesh;

use crate::scenery::PrimitiveShape;

const CYLINDER_SEGMENTS: u32 = 24;
const TORUS_MAJOR_SEGMENTS: u32 = 32;
const TORUS_TUBE_SEGMENTS: u32 = 12;
const TORUS_TUBE_RADIUS: f32 = 0.06;
const DOME_LAT_DIVS: u32 = 8;
const DOME_LON_DIVS: u32 = 16;
const DISC_SEGMENTS: u32 = 32;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

pub struct MeshPrimitive {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshPrimitive {
    fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct MeshInstance {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
    pub color: [f32; 4],
}

impl MeshInstance {
    /// Derive the normal matrix from the model transform. A degenerate
    /// transform falls back to the raw rotation-scale block rather than
    /// producing NaNs.
    pub fn new(model: Mat4, color: [f32; 4]) -> Self {
        let linear = Mat3::from_mat4(model);
        let normal_matrix = if linear.determinant().abs() > f32::EPSILON {
            linear.inverse().transpose()
        } else {
            linear
        };
        let columns = normal_matrix.to_cols_array_2d();
        Self {
            model: model.to_cols_array_2d(),
            normal: [
                [columns[0][0], columns[0][1], columns[0][2], 0.0],
                [columns[1][0], columns[1][1], columns[1][2], 0.0],
                [columns[2][0], columns[2][1], columns[2][2], 0.0],
            ],
            color,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct MeshUniforms {
    pub view_proj: [[f32; 4]; 4],
}

pub fn view_projection_uniform(matrix: Mat4) -> MeshUniforms {
    MeshUniforms {
        view_proj: matrix.to_cols_array_2d(),
    }
}

pub fn primitive(shape: PrimitiveShape) -> MeshPrimitive {
    match shape {
        PrimitiveShape::Box => build_box(),
        PrimitiveShape::Cylinder => build_cylinder(CYLINDER_SEGMENTS),
        PrimitiveShape::Plane => build_plane(),
        PrimitiveShape::Torus => build_torus(TORUS_MAJOR_SEGMENTS, TORUS_TUBE_SEGMENTS),
        PrimitiveShape::Dome => build_dome(DOME_LAT_DIVS, DOME_LON_DIVS),
        PrimitiveShape::Disc => build_disc(DISC_SEGMENTS),
    }
}

/// Repackage a decoded avatar mesh for upload.
pub fn avatar_primitive(mesh: &VrmMesh) -> MeshPrimitive {
    let vertices = mesh
        .positions
        .iter()
        .zip(&mesh.normals)
        .map(|(&position, &normal)| MeshVertex { position, normal })
        .collect();
    MeshPrimitive::new(vertices, mesh.indices.clone())
}

fn build_box() -> MeshPrimitive {
    #[rustfmt::skip]
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        // +X
        (
            [1.0, 0.0, 0.0],
            [
                [0.5, -0.5, -0.5],
                [0.5, 0.5, -0.5],
                [0.5, 0.5, 0.5],
                [0.5, -0.5, 0.5],
            ],
        ),
        // -X
        (
            [-1.0, 0.0, 0.0],
            [
                [-0.5, -0.5, 0.5],
                [-0.5, 0.5, 0.5],
                [-0.5, 0.5, -0.5],
                [-0.5, -0.5, -0.5],
            ],
        ),
        // +Y
        (
            [0.0, 1.0, 0.0],
            [
                [-0.5, 0.5, -0.5],
                [-0.5, 0.5, 0.5],
                [0.5, 0.5, 0.5],
                [0.5, 0.5, -0.5],
            ],
        ),
        // -Y
        (
            [0.0, -1.0, 0.0],
            [
                [-0.5, -0.5, 0.5],
                [-0.5, -0.5, -0.5],
                [0.5, -0.5, -0.5],
                [0.5, -0.5, 0.5],
            ],
        ),
        // +Z
        (
            [0.0, 0.0, 1.0],
            [
                [-0.5, -0.5, 0.5],
                [0.5, -0.5, 0.5],
                [0.5, 0.5, 0.5],
                [-0.5, 0.5, 0.5],
            ],
        ),
        // -Z
        (
            [0.0, 0.0, -1.0],
            [
                [0.5, -0.5, -0.5],
                [-0.5, -0.5, -0.5],
                [-0.5, 0.5, -0.5],
                [0.5, 0.5, -0.5],
            ],
        ),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (face_index, (normal, corners)) in faces.iter().enumerate() {
        let base = (face_index * 4) as u32;
        for corner in corners {
            vertices.push(MeshVertex {
                position: *corner,
                normal: *normal,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshPrimitive::new(vertices, indices)
}

fn build_cylinder(segments: u32) -> MeshPrimitive {
    let ring = segments.max(3);
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    // Side wall with outward normals.
    for i in 0..=ring {
        let angle = (i as f32 / ring as f32) * PI * 2.0;
        let x = angle.cos();
        let z = angle.sin();
        for y in [0.5f32, -0.5] {
            vertices.push(MeshVertex {
                position: [x, y, z],
                normal: [x, 0.0, z],
            });
        }
    }
    for i in 0..ring {
        let top = i * 2;
        let bottom = top + 1;
        let next_top = top + 2;
        let next_bottom = top + 3;
        indices.extend_from_slice(&[top, bottom, next_top, next_top, bottom, next_bottom]);
    }

    // Caps.
    for (cap_y, cap_normal, winding_flip) in [(0.5f32, [0.0, 1.0, 0.0], false), (-0.5, [0.0, -1.0, 0.0], true)]
    {
        let center = vertices.len() as u32;
        vertices.push(MeshVertex {
            position: [0.0, cap_y, 0.0],
            normal: cap_normal,
        });
        for i in 0..ring {
            let angle = (i as f32 / ring as f32) * PI * 2.0;
            vertices.push(MeshVertex {
                position: [angle.cos(), cap_y, angle.sin()],
                normal: cap_normal,
            });
        }
        for i in 0..ring {
            let current = center + 1 + i;
            let next = center + 1 + (i + 1) % ring;
            if winding_flip {
                indices.extend_from_slice(&[center, current, next]);
            } else {
                indices.extend_from_slice(&[center, next, current]);
            }
        }
    }

    MeshPrimitive::new(vertices, indices)
}

fn build_plane() -> MeshPrimitive {
    let normal = [0.0, 0.0, 1.0];
    let vertices = vec![
        MeshVertex {
            position: [-0.5, -0.5, 0.0],
            normal,
        },
        MeshVertex {
            position: [0.5, -0.5, 0.0],
            normal,
        },
        MeshVertex {
            position: [0.5, 0.5, 0.0],
            normal,
        },
        MeshVertex {
            position: [-0.5, 0.5, 0.0],
            normal,
        },
    ];
    MeshPrimitive::new(vertices, vec![0, 1, 2, 0, 2, 3])
}

fn build_torus(major_segments: u32, tube_segments: u32) -> MeshPrimitive {
    let major = major_segments.max(3);
    let tube = tube_segments.max(3);
    let mut vertices = Vec::with_capacity(((major + 1) * (tube + 1)) as usize);
    let mut indices = Vec::with_capacity((major * tube * 6) as usize);

    for i in 0..=major {
        let u = (i as f32 / major as f32) * PI * 2.0;
        let ring_center = Vec3::new(u.cos(), u.sin(), 0.0);
        for j in 0..=tube {
            let v = (j as f32 / tube as f32) * PI * 2.0;
            let normal = ring_center * v.cos() + Vec3::Z * v.sin();
            let position = ring_center + normal * TORUS_TUBE_RADIUS;
            vertices.push(MeshVertex {
                position: position.to_array(),
                normal: normal.to_array(),
            });
        }
    }

    let stride = tube + 1;
    for i in 0..major {
        for j in 0..tube {
            let current = i * stride + j;
            let next = current + stride;
            indices.extend_from_slice(&[
                current,
                next,
                current + 1,
                current + 1,
                next,
                next + 1,
            ]);
        }
    }

    MeshPrimitive::new(vertices, indices)
}

fn build_dome(lat_divisions: u32, lon_divisions: u32) -> MeshPrimitive {
    let lat_steps = lat_divisions.max(2);
    let lon_steps = lon_divisions.max(6);
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    // Latitude sweeps from the pole down to the equator only.
    for lat in 0..=lat_steps {
        let theta = (lat as f32 / lat_steps as f32) * (PI / 2.0);
        let sin_theta = theta.sin();
        let cos_theta = theta.cos();
        for lon in 0..=lon_steps {
            let phi = (lon as f32 / lon_steps as f32) * PI * 2.0;
            let normal = Vec3::new(sin_theta * phi.cos(), cos_theta, sin_theta * phi.sin());
            vertices.push(MeshVertex {
                position: normal.to_array(),
                normal: normal.to_array(),
            });
        }
    }

    let ring = lon_steps + 1;
    for lat in 0..lat_steps {
        for lon in 0..lon_steps {
            let current = lat * ring + lon;
            let next = current + ring;
            indices.extend_from_slice(&[
                current,
                next,
                current + 1,
                current + 1,
                next,
                next + 1,
            ]);
        }
    }

    MeshPrimitive::new(vertices, indices)
}

fn build_disc(segments: u32) -> MeshPrimitive {
    let ring = segments.max(3);
    let normal = [0.0, 1.0, 0.0];
    let mut vertices = Vec::with_capacity(ring as usize + 1);
    let mut indices = Vec::with_capacity(ring as usize * 3);

    vertices.push(MeshVertex {
        position: [0.0, 0.0, 0.0],
        normal,
    });
    for i in 0..ring {
        let angle = (i as f32 / ring as f32) * PI * 2.0;
        vertices.push(MeshVertex {
            position: [angle.cos(), 0.0, angle.sin()],
            normal,
        });
    }
    for i in 0..ring {
        let current = 1 + i;
        let next = 1 + (i + 1) % ring;
        indices.extend_from_slice(&[0, next, current]);
    }

    MeshPrimitive::new(vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_indices_in_range(primitive: &MeshPrimitive) {
        let count = primitive.vertices.len() as u32;
        assert!(primitive.indices.iter().all(|&idx| idx < count));
        assert_eq!(primitive.indices.len() % 3, 0);
    }

    #[test]
    fn every_shape_produces_valid_geometry() {
        for shape in [
            PrimitiveShape::Box,
            PrimitiveShape::Cylinder,
            PrimitiveShape::Plane,
            PrimitiveShape::Torus,
            PrimitiveShape::Dome,
            PrimitiveShape::Disc,
        ] {
            let built = primitive(shape);
            assert!(!built.vertices.is_empty(), "{shape:?} has no vertices");
            assert_indices_in_range(&built);
        }
    }

    #[test]
    fn box_is_unit_sized() {
        let cube = build_box();
        for vertex in &cube.vertices {
            for axis in vertex.position {
                assert!(axis.abs() <= 0.5 + 1e-6);
            }
        }
        assert_eq!(cube.indices.len(), 36);
    }

    #[test]
    fn disc_faces_up() {
        let disc = build_disc(16);
        assert!(disc.vertices.iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
        assert!(disc.vertices.iter().all(|v| v.position[1] == 0.0));
    }

    #[test]
    fn dome_stays_above_the_equator() {
        let dome = build_dome(6, 12);
        assert!(dome.vertices.iter().all(|v| v.position[1] >= -1e-6));
    }

    #[test]
    fn torus_radius_matches_ring_plus_tube() {
        let torus = build_torus(16, 8);
        for vertex in &torus.vertices {
            let radial = (vertex.position[0].powi(2) + vertex.position[1].powi(2)).sqrt();
            assert!(radial <= 1.0 + TORUS_TUBE_RADIUS + 1e-5);
            assert!(vertex.position[2].abs() <= TORUS_TUBE_RADIUS + 1e-5);
        }
    }

    #[test]
    fn instance_normal_matrix_counters_non_uniform_scale() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let instance = MeshInstance::new(model, [1.0; 4]);
        // Inverse transpose of diag(2,1,1) is diag(0.5,1,1).
        assert!((instance.normal[0][0] - 0.5).abs() < 1e-6);
        assert!((instance.normal[1][1] - 1.0).abs() < 1e-6);
        assert!((instance.normal[2][2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn avatar_primitive_keeps_vertex_and_index_counts() {
        let mesh = VrmMesh {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            indices: vec![0, 1, 2],
        };
        let built = avatar_primitive(&mesh);
        assert_eq!(built.vertices.len(), 3);
        assert_eq!(built.indices, vec![0, 1, 2]);
    }
}
