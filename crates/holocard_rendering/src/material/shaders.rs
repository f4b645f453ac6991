//! Material Shaders
//!
//! One WGSL module holds every card program:
//! 1. `vs_main` - shared vertex stage (model → world → clip)
//! 2. `vs_shadow` - depth-only stage for the Ultra shadow map
//! 3. `fs_standard` / `fs_holographic` / `fs_metallic` / `fs_energy`
//!
//! ## Bind Groups
//!
//! ```text
//! group 0  binding 0  SceneUniforms      (shared with the particle pass)
//!          binding 1  shadow_map         texture_depth_2d (1x1 stand-in below Ultra)
//!          binding 2  shadow_sampler     comparison
//! group 1  binding 0  MaterialUniforms   (per card)
//!          binding 1  base_map           texture_2d<f32>
//!          binding 2  base_sampler       anisotropic, per quality
//! ```
//!
//! Time only ever reaches the programs through `material.params.x`.

use super::descriptor::ShaderProgram;

/// Container for the material shader sources.
pub struct MaterialShaders;

impl MaterialShaders {
    /// Shared vertex entry point.
    pub const VERTEX_ENTRY: &'static str = "vs_main";

    /// Depth-only entry point for the shadow pass.
    pub const SHADOW_ENTRY: &'static str = "vs_shadow";

    /// The full material module.
    #[must_use]
    pub fn source() -> &'static str {
        MATERIAL_WGSL
    }

    /// Fragment entry point for `program`.
    #[must_use]
    pub fn fragment_entry(program: ShaderProgram) -> &'static str {
        program.fragment_entry()
    }
}

/// Card material module
const MATERIAL_WGSL: &str = r#"
// Card Material Shaders
// Shared vertex stage + one fragment entry per program

struct SceneUniforms {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    light_view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,      // xyz = eye, w = environment intensity
    camera_right: vec4<f32>,
    camera_up: vec4<f32>,
    light_dir: vec4<f32>,       // xyz = towards light, w = directional intensity
    ambient: vec4<f32>,         // rgb = colour, w = intensity
    accent_pos: vec4<f32>,      // xyz = position, w = intensity (0 = off)
    accent_color: vec4<f32>,
    shadow: vec4<f32>,          // x = enabled, y = depth bias
}

struct MaterialUniforms {
    tint_intensity: vec4<f32>,  // rgb = tint, w = intensity
    surface: vec4<f32>,         // roughness, metalness, clearcoat, pulse speed
    params: vec4<f32>,          // time, program index
}

@group(0) @binding(0) var<uniform> scene: SceneUniforms;
@group(0) @binding(1) var shadow_map: texture_depth_2d;
@group(0) @binding(2) var shadow_sampler: sampler_comparison;
@group(1) @binding(0) var<uniform> material: MaterialUniforms;
@group(1) @binding(1) var base_map: texture_2d<f32>;
@group(1) @binding(2) var base_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world = scene.model * vec4<f32>(in.position, 1.0);
    out.clip = scene.view_proj * world;
    out.world_pos = world.xyz;
    out.normal = normalize((scene.model * vec4<f32>(in.normal, 0.0)).xyz);
    out.uv = in.uv;
    return out;
}

@vertex
fn vs_shadow(in: VertexInput) -> @builtin(position) vec4<f32> {
    return scene.light_view_proj * scene.model * vec4<f32>(in.position, 1.0);
}

// === Shared lighting ===

fn shadow_factor(world_pos: vec3<f32>) -> f32 {
    if scene.shadow.x == 0.0 {
        return 1.0;
    }
    let clip = scene.light_view_proj * vec4<f32>(world_pos, 1.0);
    let ndc = clip.xyz / clip.w;
    let uv = vec2<f32>(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5);
    return textureSampleCompareLevel(shadow_map, shadow_sampler, uv, ndc.z - scene.shadow.y);
}

fn light_terms(n: vec3<f32>, world_pos: vec3<f32>) -> vec3<f32> {
    let l = normalize(scene.light_dir.xyz);
    let diffuse = max(dot(n, l), 0.0) * scene.light_dir.w * shadow_factor(world_pos);
    var color = scene.ambient.rgb * scene.ambient.w + vec3<f32>(diffuse);

    if scene.accent_pos.w > 0.0 {
        let to_accent = scene.accent_pos.xyz - world_pos;
        let d = length(to_accent);
        let falloff = scene.accent_pos.w / (1.0 + d * d);
        color += scene.accent_color.rgb * max(dot(n, to_accent / max(d, 0.0001)), 0.0) * falloff;
    }
    return color;
}

fn view_dir(world_pos: vec3<f32>) -> vec3<f32> {
    return normalize(scene.camera_pos.xyz - world_pos);
}

fn fresnel(n: vec3<f32>, v: vec3<f32>, power: f32) -> f32 {
    return pow(1.0 - max(dot(n, v), 0.0), power);
}

// Procedural studio environment; intensity 0 switches reflections off.
fn environment(dir: vec3<f32>) -> vec3<f32> {
    let t = clamp(dir.y * 0.5 + 0.5, 0.0, 1.0);
    return mix(vec3<f32>(0.08, 0.08, 0.1), vec3<f32>(0.9, 0.92, 1.0), t) * scene.camera_pos.w;
}

fn hash2(p: vec2<f32>) -> f32 {
    return fract(sin(dot(p, vec2<f32>(12.9898, 78.233))) * 43758.5453);
}

fn hue_to_rgb(h: f32) -> vec3<f32> {
    let r = abs(h * 6.0 - 3.0) - 1.0;
    let g = 2.0 - abs(h * 6.0 - 2.0);
    let b = 2.0 - abs(h * 6.0 - 4.0);
    return clamp(vec3<f32>(r, g, b), vec3<f32>(0.0), vec3<f32>(1.0));
}

// === Programs ===

@fragment
fn fs_standard(in: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    let albedo = textureSample(base_map, base_sampler, in.uv);
    let n = select(-in.normal, in.normal, front);
    let v = view_dir(in.world_pos);
    let roughness = material.surface.x;
    let metalness = material.surface.y;
    let clearcoat = material.surface.z;

    let env = environment(reflect(-v, n));
    let diffuse = albedo.rgb * light_terms(n, in.world_pos) * (1.0 - metalness * 0.5);
    let f0 = mix(vec3<f32>(0.04), albedo.rgb, metalness);
    let specular = env * f0 * (1.0 - roughness);
    let coat = env * fresnel(n, v, 5.0) * clearcoat;

    return vec4<f32>(diffuse + specular + coat, 1.0);
}

@fragment
fn fs_holographic(in: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    let albedo = textureSample(base_map, base_sampler, in.uv);
    let n = select(-in.normal, in.normal, front);
    let v = view_dir(in.world_pos);
    let t = material.params.x;
    let intensity = material.tint_intensity.w;

    // Multi-wave interference
    let wave = sin(in.uv.x * 20.0 + t * 2.0) * sin(in.uv.y * 15.0 - t * 1.5)
        + sin((in.uv.x + in.uv.y) * 10.0 + t);

    // Fresnel-weighted rainbow shift
    let fr = fresnel(n, v, 2.0);
    let rainbow = hue_to_rgb(fract(wave * 0.15 + fr + t * 0.1));

    // Sparkle noise
    let sparkle = step(0.985, hash2(floor(in.uv * 200.0) + vec2<f32>(floor(t * 8.0))));

    let holo = mix(rainbow, material.tint_intensity.rgb, 0.3) * (fr + 0.3) + vec3<f32>(sparkle);
    let base = albedo.rgb * light_terms(n, in.world_pos);
    let alpha = clamp(albedo.a * (0.9 + 0.1 * fr), 0.0, 1.0);

    return vec4<f32>(base + holo * intensity, alpha);
}

@fragment
fn fs_metallic(in: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    let albedo = textureSample(base_map, base_sampler, in.uv);
    let n = select(-in.normal, in.normal, front);
    let v = view_dir(in.world_pos);
    let t = material.params.x;
    let gold = material.tint_intensity.rgb;

    // Time-varying ripple perturbs the reflection normal
    let ripple = sin(length(in.uv - vec2<f32>(0.5)) * 30.0 - t * 3.0) * 0.05;
    let rippled = normalize(n + vec3<f32>(ripple, ripple, 0.0));

    let fr = fresnel(rippled, v, 3.0);
    let env = environment(reflect(-v, rippled));
    let base = albedo.rgb * light_terms(n, in.world_pos);
    let reflection = env * gold * material.tint_intensity.w;

    let color = mix(base * mix(vec3<f32>(1.0), gold, 0.4), base * gold + reflection, 0.35 + 0.65 * fr);
    return vec4<f32>(color, 1.0);
}

@fragment
fn fs_energy(in: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    let albedo = textureSample(base_map, base_sampler, in.uv);
    let n = select(-in.normal, in.normal, front);
    let t = material.params.x;
    let pulse = 0.5 + 0.5 * sin(t * material.surface.w);

    // Pulsing edge glow
    let centered = in.uv - vec2<f32>(0.5);
    let edge = max(abs(centered.x), abs(centered.y)) * 2.0;
    let edge_glow = smoothstep(0.7, 1.0, edge) * (0.6 + 0.4 * pulse);

    // Radial wave
    let radial = 0.5 + 0.5 * sin(length(centered) * 25.0 - t * 4.0);

    let glow = material.tint_intensity.rgb * (edge_glow + radial * 0.2 * pulse) * material.tint_intensity.w;
    let base = albedo.rgb * light_terms(n, in.world_pos);

    return vec4<f32>(base + glow, clamp(albedo.a + edge_glow * 0.5, 0.0, 1.0));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_program_has_an_entry_point() {
        let source = MaterialShaders::source();
        assert!(source.contains(&format!("fn {}(", MaterialShaders::VERTEX_ENTRY)));
        assert!(source.contains(&format!("fn {}(", MaterialShaders::SHADOW_ENTRY)));
        for program in ShaderProgram::ALL {
            let entry = MaterialShaders::fragment_entry(program);
            assert!(source.contains(&format!("fn {entry}(")), "missing {entry}");
        }
    }

    #[test]
    fn test_time_reaches_programs_through_uniforms() {
        assert!(!MaterialShaders::source().contains("var<push_constant>"));
        assert!(MaterialShaders::source().contains("let t = material.params.x;"));
    }
}
