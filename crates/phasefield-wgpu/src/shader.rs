//! WGSL propagation kernels.
//!
//! One module holds every kernel family. All entry points share a single bind
//! group layout:
//!
//! | binding | contents |
//! |---|---|
//! | 0 | `Geometry` uniform |
//! | 1 | element table, `N x 16` f32 |
//! | 2 | explicit points, `M x 4` f32 (point list only) |
//! | 3 | output: `M x 5` records, or the solved `N x 16` table |

use bytemuck::{Pod, Zeroable};

/// Entry point of one kernel family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    /// Rectilinear lattice.
    Rectilinear,
    /// Hexagonal lattice.
    Hexagonal,
    /// Explicit point list.
    Points,
    /// Single-focus phase solver.
    SingleFocus,
}

impl Kernel {
    /// All kernels, in pipeline creation order.
    pub const ALL: [Kernel; 4] = [
        Kernel::Rectilinear,
        Kernel::Hexagonal,
        Kernel::Points,
        Kernel::SingleFocus,
    ];

    /// WGSL entry point name.
    pub fn entry_point(self) -> &'static str {
        match self {
            Kernel::Rectilinear => "propagate_rect",
            Kernel::Hexagonal => "propagate_hex",
            Kernel::Points => "propagate_points",
            Kernel::SingleFocus => "solve_single_focus",
        }
    }
}

/// Geometry uniform (must match the WGSL `Geometry` layout).
///
/// ```text
/// dims      n1, n2, invocation count, element count
/// origin    xyz = lattice centre or focal point, w = spacing
/// vector_1  xyz = first lattice axis
/// vector_2  xyz = second lattice axis
/// scalars   x = wavenumber, y/z = centre offsets along the axes
/// ```
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GpuGeometry {
    /// Lattice shape, invocation count and element count.
    pub dims: [u32; 4],
    /// Origin and spacing.
    pub origin: [f32; 4],
    /// First lattice axis.
    pub vector_1: [f32; 4],
    /// Second lattice axis.
    pub vector_2: [f32; 4],
    /// Wavenumber and centre offsets.
    pub scalars: [f32; 4],
}

const WGSL_PROPAGATION_SHADER: &str = r#"
const TAU: f32 = 6.283185307179586;
const MIN_DISTANCE: f32 = 1e-9;
const WORKGROUP_SIZE: u32 = {{WORKGROUP_SIZE}}u;
const DESCRIPTOR_WIDTH: u32 = 16u;
const RECORD_WIDTH: u32 = 5u;

struct Geometry {
    dims: vec4<u32>,
    origin: vec4<f32>,
    vector_1: vec4<f32>,
    vector_2: vec4<f32>,
    scalars: vec4<f32>,
}

@group(0) @binding(0) var<uniform> geometry: Geometry;
@group(0) @binding(1) var<storage, read> elements: array<f32>;
@group(0) @binding(2) var<storage, read> points: array<vec4<f32>>;
@group(0) @binding(3) var<storage, read_write> output: array<f32>;

// 2D dispatch flattened to one index
fn invocation_index(gid: vec3<u32>, groups: vec3<u32>) -> u32 {
    return gid.x + gid.y * groups.x * WORKGROUP_SIZE;
}

fn element_position(e: u32) -> vec3<f32> {
    let b = e * DESCRIPTOR_WIDTH;
    return vec3<f32>(elements[b], elements[b + 1u], elements[b + 2u]);
}

fn element_normal(e: u32) -> vec3<f32> {
    let b = e * DESCRIPTOR_WIDTH;
    return normalize(vec3<f32>(elements[b + 3u], elements[b + 4u], elements[b + 5u]));
}

fn sin_theta(normal: vec3<f32>, d: vec3<f32>, r: f32) -> f32 {
    let cos_theta = dot(normal, d) / r;
    return sqrt(max(0.0, 1.0 - cos_theta * cos_theta));
}

fn element_pressure(e: u32, p: vec3<f32>, k: f32) -> vec2<f32> {
    let b = e * DESCRIPTOR_WIDTH;
    let d = p - element_position(e);
    let r = length(d);
    if (r < MIN_DISTANCE) {
        return vec2<f32>(0.0, 0.0);
    }
    let s = sin_theta(element_normal(e), d, r);
    let directivity = elements[b + 7u] + elements[b + 8u] * s + elements[b + 9u] * s * s;
    let amplitude = elements[b + 10u] * directivity / r;
    let phase = elements[b + 11u] + elements[b + 6u] * s - k * r;
    let wrapped = phase - TAU * round(phase / TAU);
    return amplitude * vec2<f32>(cos(wrapped), sin(wrapped));
}

fn write_record(index: u32, p: vec3<f32>) {
    var total = vec2<f32>(0.0, 0.0);
    for (var e = 0u; e < geometry.dims.w; e += 1u) {
        total += element_pressure(e, p, geometry.scalars.x);
    }
    let o = index * RECORD_WIDTH;
    output[o] = p.x;
    output[o + 1u] = p.y;
    output[o + 2u] = p.z;
    output[o + 3u] = total.x;
    output[o + 4u] = total.y;
}

// Point (i, j) with i along vector_1, row-major over (i, j)
fn lattice_point(index: u32) -> vec3<f32> {
    let i = f32(index / geometry.dims.y);
    let j = f32(index % geometry.dims.y);
    let a = i - geometry.scalars.y;
    let b = j - geometry.scalars.z;
    return geometry.origin.xyz
        + geometry.origin.w * (a * geometry.vector_1.xyz + b * geometry.vector_2.xyz);
}

@compute @workgroup_size({{WORKGROUP_SIZE}})
fn propagate_rect(
    @builtin(global_invocation_id) gid: vec3<u32>,
    @builtin(num_workgroups) groups: vec3<u32>,
) {
    let index = invocation_index(gid, groups);
    if (index >= geometry.dims.z) {
        return;
    }
    write_record(index, lattice_point(index));
}

@compute @workgroup_size({{WORKGROUP_SIZE}})
fn propagate_hex(
    @builtin(global_invocation_id) gid: vec3<u32>,
    @builtin(num_workgroups) groups: vec3<u32>,
) {
    let index = invocation_index(gid, groups);
    if (index >= geometry.dims.z) {
        return;
    }
    write_record(index, lattice_point(index));
}

@compute @workgroup_size({{WORKGROUP_SIZE}})
fn propagate_points(
    @builtin(global_invocation_id) gid: vec3<u32>,
    @builtin(num_workgroups) groups: vec3<u32>,
) {
    let index = invocation_index(gid, groups);
    if (index >= geometry.dims.z) {
        return;
    }
    write_record(index, points[index].xyz);
}

// One invocation per element; output starts as a copy of the element table
@compute @workgroup_size({{WORKGROUP_SIZE}})
fn solve_single_focus(
    @builtin(global_invocation_id) gid: vec3<u32>,
    @builtin(num_workgroups) groups: vec3<u32>,
) {
    let e = invocation_index(gid, groups);
    if (e >= geometry.dims.w) {
        return;
    }
    let b = e * DESCRIPTOR_WIDTH;
    let d = geometry.origin.xyz - element_position(e);
    let r = length(d);
    var phase = 0.0;
    if (r >= MIN_DISTANCE) {
        let s = sin_theta(element_normal(e), d, r);
        let x = geometry.scalars.x * r - elements[b + 6u] * s;
        phase = x - TAU * floor(x / TAU);
        if (phase >= TAU) {
            phase = 0.0;
        }
    }
    output[b + 11u] = phase;
}
"#;

/// Shader source specialised for a workgroup size.
pub fn propagation_shader(workgroup_size: u32) -> String {
    WGSL_PROPAGATION_SHADER.replace("{{WORKGROUP_SIZE}}", &workgroup_size.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_layout() {
        assert_eq!(std::mem::size_of::<GpuGeometry>(), 80);
        assert_eq!(std::mem::size_of::<GpuGeometry>() % 16, 0);
    }

    #[test]
    fn test_shader_specialisation() {
        let source = propagation_shader(128);
        assert!(!source.contains("{{"));
        assert!(source.contains("@workgroup_size(128)"));
        assert!(source.contains("const WORKGROUP_SIZE: u32 = 128u;"));
        for kernel in Kernel::ALL {
            assert!(source.contains(&format!("fn {}(", kernel.entry_point())));
        }
    }
}
