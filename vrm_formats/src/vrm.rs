//! VRM avatar documents. A VRM file is a GLB container whose glTF JSON
//! carries the `VRM` (0.x) or `VRMC_vrm` (1.0) extension; that marker is what
//! distinguishes a humanoid avatar from an arbitrary model, and parsing fails
//! without it. Decoding covers what a room viewer needs: rest-pose geometry
//! merged across primitives, world-space bounds, and the meta title.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail, ensure};
use byteorder::{ByteOrder, LittleEndian};
use glam::{Mat3, Mat4, Quat, Vec3};
use memmap2::MmapOptions;
use serde::Deserialize;

use crate::glb::GlbFile;

const COMPONENT_U8: u32 = 5121;
const COMPONENT_U16: u32 = 5123;
const COMPONENT_U32: u32 = 5125;
const COMPONENT_F32: u32 = 5126;
const MODE_TRIANGLES: u32 = 4;

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_point(point: Vec3) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    pub fn update(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn union(mut self, other: Aabb) -> Self {
        self.update(other.min);
        self.update(other.max);
        self
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfJson {
    #[serde(default)]
    extensions_used: Vec<String>,
    #[serde(default)]
    extensions: GltfExtensions,
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    meshes: Vec<Mesh>,
    #[serde(default)]
    accessors: Vec<Accessor>,
    #[serde(default)]
    buffer_views: Vec<BufferView>,
}

#[derive(Debug, Default, Deserialize)]
struct GltfExtensions {
    #[serde(rename = "VRM")]
    vrm: Option<Vrm0Extension>,
    #[serde(rename = "VRMC_vrm")]
    vrm1: Option<Vrm1Extension>,
}

#[derive(Debug, Deserialize)]
struct Vrm0Extension {
    #[serde(default)]
    meta: Option<Vrm0Meta>,
}

#[derive(Debug, Default, Deserialize)]
struct Vrm0Meta {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Vrm1Extension {
    #[serde(default)]
    meta: Option<Vrm1Meta>,
}

#[derive(Debug, Default, Deserialize)]
struct Vrm1Meta {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Node {
    #[serde(default)]
    children: Vec<usize>,
    mesh: Option<usize>,
    matrix: Option<[f32; 16]>,
    translation: Option<[f32; 3]>,
    rotation: Option<[f32; 4]>,
    scale: Option<[f32; 3]>,
}

impl Node {
    fn local_transform(&self) -> Mat4 {
        if let Some(matrix) = self.matrix {
            return Mat4::from_cols_array(&matrix);
        }
        let translation = Vec3::from(self.translation.unwrap_or([0.0; 3]));
        let rotation = self
            .rotation
            .map(Quat::from_array)
            .unwrap_or(Quat::IDENTITY);
        let scale = Vec3::from(self.scale.unwrap_or([1.0; 3]));
        Mat4::from_scale_rotation_translation(scale, rotation, translation)
    }
}

#[derive(Debug, Deserialize)]
struct Mesh {
    #[serde(default)]
    primitives: Vec<Primitive>,
}

#[derive(Debug, Deserialize)]
struct Primitive {
    attributes: PrimitiveAttributes,
    indices: Option<usize>,
    #[serde(default = "default_primitive_mode")]
    mode: u32,
}

fn default_primitive_mode() -> u32 {
    MODE_TRIANGLES
}

#[derive(Debug, Deserialize)]
struct PrimitiveAttributes {
    #[serde(rename = "POSITION")]
    position: Option<usize>,
    #[serde(rename = "NORMAL")]
    normal: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Accessor {
    buffer_view: Option<usize>,
    #[serde(default)]
    byte_offset: usize,
    component_type: u32,
    count: usize,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    min: Vec<f32>,
    #[serde(default)]
    max: Vec<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferView {
    #[serde(default)]
    byte_offset: usize,
    byte_length: usize,
    byte_stride: Option<usize>,
}

/// Renderable geometry flattened across all meshed nodes, node transforms
/// applied, indices rebased into a single list.
#[derive(Debug, Default, Clone)]
pub struct VrmMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl VrmMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[derive(Debug)]
pub struct VrmDocument {
    gltf: GltfJson,
    bin: Vec<u8>,
}

impl VrmDocument {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let document = Self::parse_unchecked(bytes)?;
        ensure!(
            document.has_avatar_marker(),
            "document is missing the VRM avatar extension"
        );
        Ok(document)
    }

    /// Parse without enforcing the avatar marker, for callers that want to
    /// report a missing marker as their own error kind.
    pub fn parse_unchecked(bytes: &[u8]) -> Result<Self> {
        let glb = GlbFile::parse(bytes).context("reading GLB container")?;
        let gltf: GltfJson =
            serde_json::from_slice(&glb.json).context("decoding glTF JSON chunk")?;
        Ok(Self {
            gltf,
            bin: glb.bin.unwrap_or_default(),
        })
    }

    pub fn has_avatar_marker(&self) -> bool {
        has_avatar_marker(&self.gltf)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("opening VRM file {}", path.display()))?;
        let mmap = unsafe { MmapOptions::new().map(&file) }
            .with_context(|| format!("memory-mapping VRM file {}", path.display()))?;
        Self::parse(&mmap).with_context(|| format!("parsing VRM file {}", path.display()))
    }

    /// Display title from the VRM meta block, when the exporter filled it in.
    pub fn title(&self) -> Option<&str> {
        if let Some(vrm) = &self.gltf.extensions.vrm {
            if let Some(title) = vrm.meta.as_ref().and_then(|meta| meta.title.as_deref()) {
                return Some(title);
            }
        }
        self.gltf
            .extensions
            .vrm1
            .as_ref()
            .and_then(|vrm| vrm.meta.as_ref())
            .and_then(|meta| meta.name.as_deref())
    }

    pub fn node_count(&self) -> usize {
        self.gltf.nodes.len()
    }

    pub fn mesh_count(&self) -> usize {
        self.gltf.meshes.len()
    }

    /// World-space bounds of all meshed nodes. Prefers the POSITION accessor
    /// min/max (mandatory per the glTF spec) and falls back to decoding the
    /// positions when an exporter omitted them. A document with no meshed
    /// nodes yields a zero-size box at the origin.
    pub fn bounds(&self) -> Result<Aabb> {
        let transforms = self.global_transforms();
        let mut bounds: Option<Aabb> = None;

        for (node_index, node) in self.gltf.nodes.iter().enumerate() {
            let Some(mesh_index) = node.mesh else {
                continue;
            };
            let mesh = self
                .gltf
                .meshes
                .get(mesh_index)
                .ok_or_else(|| anyhow!("node {node_index} references missing mesh {mesh_index}"))?;
            let transform = transforms[node_index];

            for primitive in &mesh.primitives {
                let Some(position_accessor) = primitive.attributes.position else {
                    continue;
                };
                let local = self.position_bounds(position_accessor)?;
                for corner in local.corners() {
                    let world = transform.transform_point3(corner);
                    match bounds.as_mut() {
                        Some(bounds) => bounds.update(world),
                        None => bounds = Some(Aabb::from_point(world)),
                    }
                }
            }
        }

        Ok(bounds.unwrap_or_else(|| Aabb::from_point(Vec3::ZERO)))
    }

    /// Flatten every triangle primitive into a single mesh with world-space
    /// positions. Primitives without POSITION data and non-triangle modes are
    /// skipped; missing normals fall back to +Y.
    pub fn merged_mesh(&self) -> Result<VrmMesh> {
        let transforms = self.global_transforms();
        let mut mesh = VrmMesh::default();

        for (node_index, node) in self.gltf.nodes.iter().enumerate() {
            let Some(mesh_index) = node.mesh else {
                continue;
            };
            let gltf_mesh = self
                .gltf
                .meshes
                .get(mesh_index)
                .ok_or_else(|| anyhow!("node {node_index} references missing mesh {mesh_index}"))?;
            let transform = transforms[node_index];
            let normal_matrix = normal_matrix(transform);

            for primitive in &gltf_mesh.primitives {
                if primitive.mode != MODE_TRIANGLES {
                    continue;
                }
                let Some(position_accessor) = primitive.attributes.position else {
                    continue;
                };
                let positions = self.read_vec3_accessor(position_accessor)?;
                let normals = match primitive.attributes.normal {
                    Some(accessor) => {
                        let normals = self.read_vec3_accessor(accessor)?;
                        ensure!(
                            normals.len() == positions.len(),
                            "primitive has {} normals for {} positions",
                            normals.len(),
                            positions.len()
                        );
                        Some(normals)
                    }
                    None => None,
                };

                let base = mesh.positions.len() as u32;
                for (index, position) in positions.iter().enumerate() {
                    mesh.positions
                        .push(transform.transform_point3(*position).to_array());
                    let normal = normals
                        .as_ref()
                        .map(|normals| normal_matrix * normals[index])
                        .map(|normal| normal.normalize_or_zero())
                        .filter(|normal| *normal != Vec3::ZERO)
                        .unwrap_or(Vec3::Y);
                    mesh.normals.push(normal.to_array());
                }

                match primitive.indices {
                    Some(accessor) => {
                        for index in self.read_index_accessor(accessor)? {
                            ensure!(
                                (index as usize) < positions.len(),
                                "primitive index {index} exceeds {} vertices",
                                positions.len()
                            );
                            mesh.indices.push(base + index);
                        }
                    }
                    None => mesh.indices.extend((0..positions.len() as u32).map(|i| base + i)),
                }
            }
        }

        Ok(mesh)
    }

    /// Global transform per node: roots are nodes never referenced as a
    /// child; children accumulate their parent chain. Malformed cycles are
    /// broken by visiting each node at most once.
    fn global_transforms(&self) -> Vec<Mat4> {
        let node_count = self.gltf.nodes.len();
        let mut child_set = BTreeSet::new();
        for node in &self.gltf.nodes {
            for &child in &node.children {
                if child < node_count {
                    child_set.insert(child);
                }
            }
        }

        let mut transforms = vec![Mat4::IDENTITY; node_count];
        let mut visited = vec![false; node_count];
        let mut stack: Vec<(usize, Mat4)> = (0..node_count)
            .filter(|index| !child_set.contains(index))
            .map(|index| (index, Mat4::IDENTITY))
            .collect();

        while let Some((index, parent)) = stack.pop() {
            if visited[index] {
                continue;
            }
            visited[index] = true;
            let global = parent * self.gltf.nodes[index].local_transform();
            transforms[index] = global;
            for &child in &self.gltf.nodes[index].children {
                if child < node_count {
                    stack.push((child, global));
                }
            }
        }

        transforms
    }

    fn position_bounds(&self, accessor_index: usize) -> Result<Aabb> {
        let accessor = self.accessor(accessor_index)?;
        if accessor.min.len() == 3 && accessor.max.len() == 3 {
            return Ok(Aabb {
                min: Vec3::new(accessor.min[0], accessor.min[1], accessor.min[2]),
                max: Vec3::new(accessor.max[0], accessor.max[1], accessor.max[2]),
            });
        }
        let positions = self.read_vec3_accessor(accessor_index)?;
        let mut bounds = positions
            .first()
            .map(|position| Aabb::from_point(*position))
            .unwrap_or_else(|| Aabb::from_point(Vec3::ZERO));
        for position in positions.iter().skip(1) {
            bounds.update(*position);
        }
        Ok(bounds)
    }

    fn read_vec3_accessor(&self, accessor_index: usize) -> Result<Vec<Vec3>> {
        let accessor = self.accessor(accessor_index)?;
        ensure!(
            accessor.kind == "VEC3" && accessor.component_type == COMPONENT_F32,
            "accessor {accessor_index} is {}/{} (expected float VEC3)",
            accessor.kind,
            accessor.component_type
        );
        let (data, stride) = self.accessor_data(accessor, 12)?;
        let mut out = Vec::with_capacity(accessor.count);
        for element in 0..accessor.count {
            let offset = element * stride;
            out.push(Vec3::new(
                LittleEndian::read_f32(&data[offset..]),
                LittleEndian::read_f32(&data[offset + 4..]),
                LittleEndian::read_f32(&data[offset + 8..]),
            ));
        }
        Ok(out)
    }

    fn read_index_accessor(&self, accessor_index: usize) -> Result<Vec<u32>> {
        let accessor = self.accessor(accessor_index)?;
        ensure!(
            accessor.kind == "SCALAR",
            "index accessor {accessor_index} is {} (expected SCALAR)",
            accessor.kind
        );
        let element_size = match accessor.component_type {
            COMPONENT_U8 => 1,
            COMPONENT_U16 => 2,
            COMPONENT_U32 => 4,
            other => bail!("index accessor {accessor_index} has component type {other}"),
        };
        let (data, stride) = self.accessor_data(accessor, element_size)?;
        let mut out = Vec::with_capacity(accessor.count);
        for element in 0..accessor.count {
            let offset = element * stride;
            let value = match accessor.component_type {
                COMPONENT_U8 => data[offset] as u32,
                COMPONENT_U16 => LittleEndian::read_u16(&data[offset..]) as u32,
                _ => LittleEndian::read_u32(&data[offset..]),
            };
            out.push(value);
        }
        Ok(out)
    }

    fn accessor(&self, index: usize) -> Result<&Accessor> {
        self.gltf
            .accessors
            .get(index)
            .ok_or_else(|| anyhow!("accessor {index} out of range"))
    }

    /// Slice of the BIN chunk covering an accessor plus the stride between
    /// elements. All reads are bounds-checked here so the decoders above can
    /// index freely.
    fn accessor_data(&self, accessor: &Accessor, element_size: usize) -> Result<(&[u8], usize)> {
        let view_index = accessor
            .buffer_view
            .ok_or_else(|| anyhow!("accessor has no buffer view"))?;
        let view = self
            .gltf
            .buffer_views
            .get(view_index)
            .ok_or_else(|| anyhow!("buffer view {view_index} out of range"))?;
        let stride = view.byte_stride.unwrap_or(element_size);
        ensure!(
            stride >= element_size,
            "buffer view {view_index} stride {stride} is smaller than element size {element_size}"
        );

        let view_end = view
            .byte_offset
            .checked_add(view.byte_length)
            .ok_or_else(|| anyhow!("buffer view {view_index} length overflow"))?;
        ensure!(
            view_end <= self.bin.len(),
            "buffer view {view_index} runs past the BIN chunk ({} > {})",
            view_end,
            self.bin.len()
        );

        let start = view
            .byte_offset
            .checked_add(accessor.byte_offset)
            .ok_or_else(|| anyhow!("accessor byte offset overflow"))?;
        let needed = match accessor.count {
            0 => Some(0),
            count => (count - 1)
                .checked_mul(stride)
                .and_then(|spanned| spanned.checked_add(element_size)),
        };
        let end = needed
            .and_then(|needed| start.checked_add(needed))
            .ok_or_else(|| anyhow!("accessor span overflow"))?;
        ensure!(
            end <= view_end,
            "accessor needs {} bytes at offset {start} but the view ends at {view_end}",
            end - start
        );
        Ok((&self.bin[start..view_end], stride))
    }
}

fn has_avatar_marker(gltf: &GltfJson) -> bool {
    gltf.extensions_used
        .iter()
        .any(|name| name == "VRM" || name == "VRMC_vrm")
        || gltf.extensions.vrm.is_some()
        || gltf.extensions.vrm1.is_some()
}

/// Inverse-transpose of the upper 3x3, for transforming normals under
/// non-uniform scale. Degenerate transforms fall back to identity.
fn normal_matrix(transform: Mat4) -> Mat3 {
    let linear = Mat3::from_mat4(transform);
    if linear.determinant().abs() <= f32::EPSILON {
        Mat3::IDENTITY
    } else {
        linear.inverse().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glb::build_glb;
    use serde_json::json;
    use std::io::Write;

    fn triangle_bin() -> Vec<u8> {
        let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
        let mut bin = Vec::new();
        for position in positions {
            for component in position {
                bin.extend_from_slice(&component.to_le_bytes());
            }
        }
        for index in [0u16, 1, 2] {
            bin.extend_from_slice(&index.to_le_bytes());
        }
        bin.extend_from_slice(&[0, 0]); // align to 4
        bin
    }

    fn avatar_json(node: serde_json::Value) -> serde_json::Value {
        json!({
            "asset": { "version": "2.0" },
            "extensionsUsed": ["VRM"],
            "extensions": { "VRM": { "meta": { "title": "Test Avatar" } } },
            "nodes": [node],
            "meshes": [{
                "primitives": [{
                    "attributes": { "POSITION": 0 },
                    "indices": 1
                }]
            }],
            "accessors": [
                {
                    "bufferView": 0,
                    "componentType": 5126,
                    "count": 3,
                    "type": "VEC3",
                    "min": [0.0, 0.0, 0.0],
                    "max": [1.0, 2.0, 0.0]
                },
                {
                    "bufferView": 1,
                    "componentType": 5123,
                    "count": 3,
                    "type": "SCALAR"
                }
            ],
            "bufferViews": [
                { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
                { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
            ],
            "buffers": [{ "byteLength": 44 }]
        })
    }

    fn avatar_glb(node: serde_json::Value) -> Vec<u8> {
        let json = serde_json::to_vec(&avatar_json(node)).unwrap();
        build_glb(&json, Some(&triangle_bin()))
    }

    #[test]
    fn rejects_documents_without_avatar_marker() {
        let json = serde_json::to_vec(&json!({ "asset": { "version": "2.0" } })).unwrap();
        let bytes = build_glb(&json, None);
        let err = VrmDocument::parse(&bytes).unwrap_err();
        assert!(err.to_string().contains("VRM avatar extension"), "{err}");
    }

    #[test]
    fn accepts_marker_from_extensions_object_alone() {
        let json = serde_json::to_vec(&json!({
            "asset": { "version": "2.0" },
            "extensions": { "VRM": {} }
        }))
        .unwrap();
        let bytes = build_glb(&json, None);
        assert!(VrmDocument::parse(&bytes).is_ok());
    }

    #[test]
    fn accepts_vrm1_marker() {
        let json = serde_json::to_vec(&json!({
            "asset": { "version": "2.0" },
            "extensionsUsed": ["VRMC_vrm"],
            "extensions": { "VRMC_vrm": { "meta": { "name": "One Point Oh" } } }
        }))
        .unwrap();
        let document = VrmDocument::parse(&build_glb(&json, None)).unwrap();
        assert_eq!(document.title(), Some("One Point Oh"));
    }

    #[test]
    fn reads_meta_title() {
        let document = VrmDocument::parse(&avatar_glb(json!({ "mesh": 0 }))).unwrap();
        assert_eq!(document.title(), Some("Test Avatar"));
    }

    #[test]
    fn bounds_follow_accessor_min_max() {
        let document = VrmDocument::parse(&avatar_glb(json!({ "mesh": 0 }))).unwrap();
        let bounds = document.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(bounds.max, Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn bounds_apply_node_scale_and_translation() {
        let document = VrmDocument::parse(&avatar_glb(json!({
            "mesh": 0,
            "translation": [0.0, 1.0, 0.0],
            "scale": [2.0, 2.0, 2.0]
        })))
        .unwrap();
        let bounds = document.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(2.0, 5.0, 0.0));
    }

    #[test]
    fn document_without_meshes_has_zero_size_bounds() {
        let json = serde_json::to_vec(&json!({
            "asset": { "version": "2.0" },
            "extensionsUsed": ["VRM"]
        }))
        .unwrap();
        let document = VrmDocument::parse(&build_glb(&json, None)).unwrap();
        let bounds = document.bounds().unwrap();
        assert_eq!(bounds.size(), Vec3::ZERO);
    }

    #[test]
    fn merged_mesh_decodes_indices_and_positions() {
        let document = VrmDocument::parse(&avatar_glb(json!({ "mesh": 0 }))).unwrap();
        let mesh = document.merged_mesh().unwrap();
        assert_eq!(mesh.positions.len(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.triangle_count(), 1);
        // No NORMAL accessor, so every normal falls back to +Y.
        assert!(mesh.normals.iter().all(|n| *n == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn merged_mesh_rebases_indices_across_nodes() {
        let mut root = avatar_json(json!({ "mesh": 0 }));
        root["nodes"] = json!([
            { "mesh": 0 },
            { "mesh": 0, "translation": [3.0, 0.0, 0.0] }
        ]);
        let bytes = build_glb(&serde_json::to_vec(&root).unwrap(), Some(&triangle_bin()));
        let mesh = VrmDocument::parse(&bytes).unwrap().merged_mesh().unwrap();
        assert_eq!(mesh.positions.len(), 6);
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(mesh.positions[3], [3.0, 0.0, 0.0]);
    }

    #[test]
    fn rejects_accessor_running_past_bin_chunk() {
        let mut root = avatar_json(json!({ "mesh": 0 }));
        root["accessors"][0]["count"] = json!(400);
        let bytes = build_glb(&serde_json::to_vec(&root).unwrap(), Some(&triangle_bin()));
        let document = VrmDocument::parse(&bytes).unwrap();
        assert!(document.merged_mesh().is_err());
    }

    #[test]
    fn rejects_accessor_offset_that_overflows() {
        let mut root = avatar_json(json!({ "mesh": 0 }));
        root["accessors"][0]["byteOffset"] = json!(u64::MAX);
        let bytes = build_glb(&serde_json::to_vec(&root).unwrap(), Some(&triangle_bin()));
        let document = VrmDocument::parse(&bytes).unwrap();
        assert!(document.merged_mesh().is_err());
    }

    #[test]
    fn rejects_accessor_count_that_overflows() {
        let mut root = avatar_json(json!({ "mesh": 0 }));
        root["accessors"][0]["count"] = json!(u64::MAX);
        let bytes = build_glb(&serde_json::to_vec(&root).unwrap(), Some(&triangle_bin()));
        let document = VrmDocument::parse(&bytes).unwrap();
        assert!(document.merged_mesh().is_err());
    }

    #[test]
    fn opens_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&avatar_glb(json!({ "mesh": 0 }))).unwrap();
        let document = VrmDocument::open(file.path()).unwrap();
        assert_eq!(document.mesh_count(), 1);
        assert_eq!(document.node_count(), 1);
    }
}
