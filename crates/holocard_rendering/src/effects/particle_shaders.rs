//! Particle Shaders
//!
//! Camera-facing billboards, one instance per particle, six vertices per
//! instance generated from `vertex_index`.
//!
//! ## Blending
//!
//! Particles glow, they never occlude. The pass uses **additive blending**
//! (ONE + ONE):
//! - No sorting required (A + B = B + A)
//! - Depth is tested against the card but never written
//! - Fragments outside the soft disc are discarded early
//!
//! ```text
//! color_blend: src=ONE dst=ONE op=ADD
//! alpha_blend: src=ONE dst=ONE op=ADD
//! depth:       read-only
//! ```

use crate::material::BlendMode;

/// Container for the particle shader sources.
pub struct ParticleShaders;

impl ParticleShaders {
    /// Blend mode of the particle pass.
    pub const BLEND_MODE: BlendMode = BlendMode::Additive;

    /// Vertex entry point.
    pub const VERTEX_ENTRY: &'static str = "vs_particle";

    /// Fragment entry point.
    pub const FRAGMENT_ENTRY: &'static str = "fs_particle";

    /// The particle module.
    #[must_use]
    pub fn source() -> &'static str {
        PARTICLE_WGSL
    }
}

/// Particle billboard module
const PARTICLE_WGSL: &str = r#"
// Particle Billboard Shader
// ADDITIVE BLENDING - commutative, no sorting

struct SceneUniforms {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    light_view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    camera_right: vec4<f32>,
    camera_up: vec4<f32>,
    light_dir: vec4<f32>,
    ambient: vec4<f32>,
    accent_pos: vec4<f32>,
    accent_color: vec4<f32>,
    shadow: vec4<f32>,
}

@group(0) @binding(0) var<uniform> scene: SceneUniforms;

struct ParticleInstance {
    @location(0) position: vec3<f32>,
    @location(1) size: f32,
    @location(2) color: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
}

// Quad vertices (2 triangles)
const QUAD_POSITIONS: array<vec2<f32>, 6> = array<vec2<f32>, 6>(
    vec2<f32>(-0.5, -0.5),
    vec2<f32>(0.5, -0.5),
    vec2<f32>(0.5, 0.5),
    vec2<f32>(-0.5, -0.5),
    vec2<f32>(0.5, 0.5),
    vec2<f32>(-0.5, 0.5),
);

const QUAD_UVS: array<vec2<f32>, 6> = array<vec2<f32>, 6>(
    vec2<f32>(0.0, 1.0),
    vec2<f32>(1.0, 1.0),
    vec2<f32>(1.0, 0.0),
    vec2<f32>(0.0, 1.0),
    vec2<f32>(1.0, 0.0),
    vec2<f32>(0.0, 0.0),
);

@vertex
fn vs_particle(
    @builtin(vertex_index) vertex_idx: u32,
    instance: ParticleInstance,
) -> VertexOutput {
    var out: VertexOutput;

    let quad_idx = vertex_idx % 6u;
    let quad_pos = QUAD_POSITIONS[quad_idx];

    let right = scene.camera_right.xyz;
    let up = scene.camera_up.xyz;
    let vertex_pos = instance.position
        + right * quad_pos.x * instance.size
        + up * quad_pos.y * instance.size;

    out.position = scene.view_proj * vec4<f32>(vertex_pos, 1.0);
    out.uv = QUAD_UVS[quad_idx];
    out.color = instance.color;
    return out;
}

@fragment
fn fs_particle(in: VertexOutput) -> @location(0) vec4<f32> {
    let dist = distance(in.uv, vec2<f32>(0.5));
    if dist > 0.5 {
        discard;
    }

    // Quadratic falloff keeps the core from blowing out under ONE + ONE
    let falloff = 1.0 - dist * 2.0;
    let intensity = falloff * falloff;
    if intensity < 0.02 {
        discard;
    }

    return vec4<f32>(in.color.rgb * intensity * in.color.a, intensity);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_points_present() {
        let source = ParticleShaders::source();
        assert!(source.contains(&format!("fn {}(", ParticleShaders::VERTEX_ENTRY)));
        assert!(source.contains(&format!("fn {}(", ParticleShaders::FRAGMENT_ENTRY)));
    }

    #[test]
    fn test_additive_needs_no_sorting() {
        assert!(!ParticleShaders::BLEND_MODE.requires_sorting());
        assert!(!ParticleShaders::BLEND_MODE.writes_depth());
    }
}
