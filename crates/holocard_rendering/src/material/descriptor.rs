//! Material descriptors.
//!
//! A descriptor is the CPU-side description of everything the GPU needs to
//! paint one card: which program, which uniform values, how to blend, how to
//! filter the artwork. It is owned by exactly one mesh.

use bytemuck::{Pod, Zeroable};
use std::collections::BTreeMap;

/// `time` uniform (seconds). The only value that changes every frame.
pub const U_TIME: &str = "time";
/// Effect strength.
pub const U_INTENSITY: &str = "intensity";
/// PBR roughness.
pub const U_ROUGHNESS: &str = "roughness";
/// PBR metalness.
pub const U_METALNESS: &str = "metalness";
/// Clear-coat layer strength.
pub const U_CLEARCOAT: &str = "clearcoat";
/// Effect tint.
pub const U_TINT: &str = "tint";
/// Glow pulse frequency.
pub const U_PULSE_SPEED: &str = "pulse_speed";
/// Card artwork.
pub const U_BASE_MAP: &str = "base_map";

/// Shader programs a card can be painted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShaderProgram {
    /// Physically based roughness/metalness, optional clear coat.
    StandardPbr,
    /// Multi-wave interference, fresnel rainbow shift, sparkle noise.
    Holographic,
    /// Fresnel environment reflection with a time ripple, gold tinted.
    DynamicMetallic,
    /// Pulsing edge glow with a radial wave.
    EnergyGlow,
}

impl ShaderProgram {
    /// All programs.
    pub const ALL: [Self; 4] = [
        Self::StandardPbr,
        Self::Holographic,
        Self::DynamicMetallic,
        Self::EnergyGlow,
    ];

    /// Stable identifier, used in logs and performance samples.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::StandardPbr => "standard_pbr",
            Self::Holographic => "holographic",
            Self::DynamicMetallic => "dynamic_metallic",
            Self::EnergyGlow => "energy_glow",
        }
    }

    /// Fragment entry point in the material shader module.
    #[must_use]
    pub const fn fragment_entry(self) -> &'static str {
        match self {
            Self::StandardPbr => "fs_standard",
            Self::Holographic => "fs_holographic",
            Self::DynamicMetallic => "fs_metallic",
            Self::EnergyGlow => "fs_energy",
        }
    }

    /// True for the rarity-specific custom programs.
    #[must_use]
    pub const fn is_custom(self) -> bool {
        !matches!(self, Self::StandardPbr)
    }

    /// How the program composites over the scene.
    #[must_use]
    pub const fn blend_mode(self) -> BlendMode {
        match self {
            Self::StandardPbr | Self::DynamicMetallic => BlendMode::Opaque,
            Self::Holographic | Self::EnergyGlow => BlendMode::AlphaBlend,
        }
    }
}

impl std::fmt::Display for ShaderProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Blend mode.
///
/// - Opaque: writes depth, no blending
/// - AlphaBlend: `SRC_ALPHA + ONE_MINUS_SRC_ALPHA`, needs back-to-front order
/// - Additive: `ONE + ONE`, commutative, no sorting (particles)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Replace.
    Opaque,
    /// Classic alpha blending.
    AlphaBlend,
    /// Additive glow.
    Additive,
}

impl BlendMode {
    /// The wgpu blend state for this mode.
    #[must_use]
    pub const fn blend_state(self) -> wgpu::BlendState {
        match self {
            Self::Opaque => wgpu::BlendState::REPLACE,
            Self::AlphaBlend => wgpu::BlendState::ALPHA_BLENDING,
            Self::Additive => {
                let add = wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                };
                wgpu::BlendState { color: add, alpha: add }
            }
        }
    }

    /// Opaque surfaces write depth; blended ones only test it.
    #[must_use]
    pub const fn writes_depth(self) -> bool {
        matches!(self, Self::Opaque)
    }

    /// True if draws must be sorted back to front.
    #[must_use]
    pub const fn requires_sorting(self) -> bool {
        matches!(self, Self::AlphaBlend)
    }
}

/// Where the artwork comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TextureRef {
    /// Card artwork URL.
    Image(String),
    /// Built-in neutral placeholder.
    Placeholder,
}

/// Sampling quality for the artwork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureFiltering {
    /// Anisotropic filtering clamp (1, 2, 4, 8 or 16).
    pub anisotropy: u16,
    /// Build a full mip chain on upload.
    pub generate_mipmaps: bool,
}

impl TextureFiltering {
    /// Number of mip levels to allocate for a `width` x `height` texture.
    #[must_use]
    pub fn mip_level_count(&self, width: u32, height: u32) -> u32 {
        if self.generate_mipmaps {
            32 - width.max(height).max(1).leading_zeros()
        } else {
            1
        }
    }

    /// Sampler for this filtering. Anisotropy needs linear filtering on
    /// every stage.
    #[must_use]
    pub fn sampler_descriptor(&self) -> wgpu::SamplerDescriptor<'static> {
        wgpu::SamplerDescriptor {
            label: Some("Card Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            anisotropy_clamp: self.anisotropy.max(1),
            ..Default::default()
        }
    }
}

/// A uniform value.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// Scalar.
    Float(f32),
    /// Linear RGB.
    Color([f32; 3]),
    /// Texture reference.
    Texture(TextureRef),
}

/// Packed material uniforms, bound at group 1 binding 0.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct MaterialUniforms {
    /// Tint (rgb) + intensity (w)
    pub tint_intensity: [f32; 4],
    /// Roughness, metalness, clear coat, pulse speed
    pub surface: [f32; 4],
    /// Time (x), program index (y), unused (zw)
    pub params: [f32; 4],
}

impl MaterialUniforms {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

/// Everything needed to paint one card.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDescriptor {
    /// Shader program. Never changes for the descriptor's lifetime.
    pub program: ShaderProgram,
    /// Named uniform bindings.
    pub uniforms: BTreeMap<&'static str, UniformValue>,
    /// Compositing mode.
    pub blend_mode: BlendMode,
    /// Rendered into the shadow map.
    pub casts_shadow: bool,
    /// Artwork sampling.
    pub filtering: TextureFiltering,
}

impl MaterialDescriptor {
    /// Scalar uniform.
    #[must_use]
    pub fn float(&self, name: &str) -> Option<f32> {
        match self.uniforms.get(name) {
            Some(UniformValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    /// Colour uniform.
    #[must_use]
    pub fn color(&self, name: &str) -> Option<[f32; 3]> {
        match self.uniforms.get(name) {
            Some(UniformValue::Color(c)) => Some(*c),
            _ => None,
        }
    }

    /// Current artwork binding.
    #[must_use]
    pub fn texture(&self) -> &TextureRef {
        match self.uniforms.get(U_BASE_MAP) {
            Some(UniformValue::Texture(texture)) => texture,
            _ => &TextureRef::Placeholder,
        }
    }

    /// Writes the `time` uniform.
    pub fn set_time(&mut self, time: f32) {
        self.uniforms.insert(U_TIME, UniformValue::Float(time));
    }

    /// Rebinds the artwork to the placeholder.
    pub fn use_placeholder(&mut self) {
        self.uniforms
            .insert(U_BASE_MAP, UniformValue::Texture(TextureRef::Placeholder));
    }

    /// Same material up to the time uniform.
    #[must_use]
    pub fn same_material(&self, other: &Self) -> bool {
        let strip = |d: &Self| {
            let mut uniforms = d.uniforms.clone();
            uniforms.remove(U_TIME);
            uniforms
        };
        self.program == other.program
            && self.blend_mode == other.blend_mode
            && self.casts_shadow == other.casts_shadow
            && self.filtering == other.filtering
            && strip(self) == strip(other)
    }

    /// Packs the uniforms for upload.
    #[must_use]
    pub fn pack(&self) -> MaterialUniforms {
        let tint = self.color(U_TINT).unwrap_or([1.0, 1.0, 1.0]);
        let program_index = Self::program_index(self.program);
        MaterialUniforms {
            tint_intensity: [
                tint[0],
                tint[1],
                tint[2],
                self.float(U_INTENSITY).unwrap_or(0.0),
            ],
            surface: [
                self.float(U_ROUGHNESS).unwrap_or(0.5),
                self.float(U_METALNESS).unwrap_or(0.0),
                self.float(U_CLEARCOAT).unwrap_or(0.0),
                self.float(U_PULSE_SPEED).unwrap_or(0.0),
            ],
            params: [self.float(U_TIME).unwrap_or(0.0), program_index, 0.0, 0.0],
        }
    }

    fn program_index(program: ShaderProgram) -> f32 {
        match program {
            ShaderProgram::StandardPbr => 0.0,
            ShaderProgram::Holographic => 1.0,
            ShaderProgram::DynamicMetallic => 2.0,
            ShaderProgram::EnergyGlow => 3.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout() {
        // 3 x vec4<f32>, 16-byte aligned for WGSL uniform buffers
        assert_eq!(MaterialUniforms::SIZE, 48);
        assert_eq!(MaterialUniforms::SIZE % 16, 0);
    }

    #[test]
    fn test_mip_levels() {
        let full = TextureFiltering { anisotropy: 8, generate_mipmaps: true };
        assert_eq!(full.mip_level_count(1024, 512), 11);
        assert_eq!(full.mip_level_count(1, 1), 1);

        let single = TextureFiltering { anisotropy: 2, generate_mipmaps: false };
        assert_eq!(single.mip_level_count(1024, 1024), 1);
    }

    #[test]
    fn test_blend_modes() {
        assert_eq!(ShaderProgram::StandardPbr.blend_mode(), BlendMode::Opaque);
        assert_eq!(ShaderProgram::EnergyGlow.blend_mode(), BlendMode::AlphaBlend);
        assert!(!BlendMode::Additive.requires_sorting());
        assert!(BlendMode::AlphaBlend.requires_sorting());
        assert_eq!(
            BlendMode::Additive.blend_state().color.dst_factor,
            wgpu::BlendFactor::One
        );
    }
}
