use bytemuck::{Pod, Zeroable};

/// Fullscreen background gradient. Colors arrive through a uniform so the
/// pipeline is built once regardless of the room palette.
pub(super) const GRADIENT_SHADER_SOURCE: &str = r#"
struct GradientUniforms {
    top: vec4<f32>,
    bottom: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> gradient: GradientUniforms;

struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(input.position, 0.0, 1.0);
    out.uv = input.uv;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let color = mix(gradient.top.rgb, gradient.bottom.rgb, input.uv.y);
    return vec4<f32>(color, 1.0);
}
"#;

/// Instanced lit meshes: hemisphere ambient plus one directional key light,
/// flat per-instance albedo. Normals go through the instance's inverse
/// transpose so non-uniform scenery scales light correctly.
pub(super) const MESH_SHADER_SOURCE: &str = r#"
struct CameraUniforms {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: CameraUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) normal_0: vec4<f32>,
    @location(7) normal_1: vec4<f32>,
    @location(8) normal_2: vec4<f32>,
    @location(9) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn mesh_vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let normal_matrix = mat3x3<f32>(
        instance.normal_0.xyz,
        instance.normal_1.xyz,
        instance.normal_2.xyz,
    );
    var out: VertexOutput;
    out.position = camera.view_proj * model * vec4<f32>(vertex.position, 1.0);
    out.normal = normal_matrix * vertex.normal;
    out.color = instance.color;
    return out;
}

const SKY_COLOR: vec3<f32> = vec3<f32>(0.9, 0.9, 0.9);
const GROUND_COLOR: vec3<f32> = vec3<f32>(0.133, 0.2, 0.267);
const SUN_DIRECTION: vec3<f32> = vec3<f32>(4.0, 7.0, 3.0);
const SUN_INTENSITY: f32 = 1.05;

@fragment
fn mesh_fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(input.normal);
    let hemi = mix(GROUND_COLOR, SKY_COLOR, n.y * 0.5 + 0.5);
    let diffuse = max(dot(n, normalize(SUN_DIRECTION)), 0.0) * SUN_INTENSITY;
    let lit = input.color.rgb * (hemi + vec3<f32>(diffuse));
    return vec4<f32>(min(lit, vec3<f32>(1.0)), input.color.a);
}
"#;

/// Textured quad for the HUD text panel.
pub(super) const OVERLAY_SHADER_SOURCE: &str = r#"
struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(input.position, 0.0, 1.0);
    out.uv = input.uv;
    return out;
}

@group(0) @binding(0)
var overlay_texture: texture_2d<f32>;
@group(0) @binding(1)
var overlay_sampler: sampler;

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let uv = clamp(input.uv, vec2<f32>(0.0, 0.0), vec2<f32>(1.0, 1.0));
    return textureSample(overlay_texture, overlay_sampler, uv);
}
"#;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(super) struct QuadVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

pub(super) const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        position: [-1.0, 1.0],
        uv: [0.0, 0.0],
    },
    QuadVertex {
        position: [1.0, 1.0],
        uv: [1.0, 0.0],
    },
    QuadVertex {
        position: [-1.0, -1.0],
        uv: [0.0, 1.0],
    },
    QuadVertex {
        position: [1.0, -1.0],
        uv: [1.0, 1.0],
    },
];

pub(super) const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];
