//! # Material Resolver
//!
//! `(rarity, quality, shaders) → MaterialDescriptor`, pure and infallible.
//!
//! ```text
//! shaders off | quality Low   → StandardPbr   roughness 0.4, metalness 0.1 (0.8 legendary+)
//! Common / Uncommon           → StandardPbr   enhanced; uncommon adds clear coat 0.3
//! Rare / Epic                 → Holographic   intensity 0.5 / 0.8
//! Legendary                   → DynamicMetallic gold tint
//! Mythic                      → EnergyGlow    teal, intensity 1.5, pulse 2.0
//! ```
//!
//! The program depends on nothing else. Time lives in uniform values, so the
//! same card never switches program mid-flight.

use super::descriptor::{
    MaterialDescriptor, ShaderProgram, TextureFiltering, TextureRef, UniformValue, U_BASE_MAP,
    U_CLEARCOAT, U_INTENSITY, U_METALNESS, U_PULSE_SPEED, U_ROUGHNESS, U_TIME, U_TINT,
};
use crate::palette::{rarity_color, LEGENDARY_GOLD, MYTHIC_TEAL};
use holocard_shared::{QualityTier, Rarity};
use std::collections::BTreeMap;

// =============================================================================
// FALLBACK PBR (shaders disabled or Low quality)
// =============================================================================

/// Roughness of the fixed physically shaded material.
pub const FALLBACK_ROUGHNESS: f32 = 0.4;
/// Metalness of the fixed material.
pub const FALLBACK_METALNESS: f32 = 0.1;
/// Metalness of the fixed material for Legendary and Mythic.
pub const FALLBACK_PREMIUM_METALNESS: f32 = 0.8;

// =============================================================================
// ENHANCED PBR (Common / Uncommon)
// =============================================================================

/// Enhanced PBR roughness.
pub const ENHANCED_ROUGHNESS: f32 = 0.3;
/// Enhanced PBR metalness.
pub const ENHANCED_METALNESS: f32 = 0.2;
/// Uncommon clear-coat layer.
pub const UNCOMMON_CLEARCOAT: f32 = 0.3;

// =============================================================================
// CUSTOM PROGRAMS
// =============================================================================

/// Holographic strength for Rare.
pub const RARE_HOLO_INTENSITY: f32 = 0.5;
/// Holographic strength for Epic.
pub const EPIC_HOLO_INTENSITY: f32 = 0.8;
/// Metallic reflection strength.
pub const METALLIC_INTENSITY: f32 = 1.0;
/// Energy glow strength.
pub const ENERGY_GLOW_INTENSITY: f32 = 1.5;
/// Energy glow pulse frequency.
pub const ENERGY_PULSE_SPEED: f32 = 2.0;

/// Program selection alone. A pure function of its three inputs.
#[must_use]
pub const fn program_for(rarity: Rarity, quality: QualityTier, shaders_enabled: bool) -> ShaderProgram {
    if !shaders_enabled || matches!(quality, QualityTier::Low) {
        return ShaderProgram::StandardPbr;
    }
    match rarity {
        Rarity::Common | Rarity::Uncommon => ShaderProgram::StandardPbr,
        Rarity::Rare | Rarity::Epic => ShaderProgram::Holographic,
        Rarity::Legendary => ShaderProgram::DynamicMetallic,
        Rarity::Mythic => ShaderProgram::EnergyGlow,
    }
}

/// Artwork filtering for a quality tier: 2x/4x/8x/16x anisotropy, mip chain
/// from Medium up.
#[must_use]
pub const fn filtering_for(quality: QualityTier) -> TextureFiltering {
    match quality {
        QualityTier::Low => TextureFiltering { anisotropy: 2, generate_mipmaps: false },
        QualityTier::Medium => TextureFiltering { anisotropy: 4, generate_mipmaps: true },
        QualityTier::High => TextureFiltering { anisotropy: 8, generate_mipmaps: true },
        QualityTier::Ultra => TextureFiltering { anisotropy: 16, generate_mipmaps: true },
    }
}

/// Resolves the material for a card.
///
/// A missing or empty `base_image` binds the placeholder texture. Loading the
/// image is the caller's concern; if it later fails, the caller rebinds with
/// [`MaterialDescriptor::use_placeholder`].
#[must_use]
pub fn resolve(
    rarity: Rarity,
    quality: QualityTier,
    shaders_enabled: bool,
    base_image: Option<&str>,
) -> MaterialDescriptor {
    let program = program_for(rarity, quality, shaders_enabled);

    let mut uniforms = BTreeMap::new();
    uniforms.insert(U_TIME, UniformValue::Float(0.0));
    let texture = match base_image {
        Some(url) if !url.is_empty() => TextureRef::Image(url.to_string()),
        _ => TextureRef::Placeholder,
    };
    uniforms.insert(U_BASE_MAP, UniformValue::Texture(texture));

    let custom = shaders_enabled && quality != QualityTier::Low;
    if custom {
        bind_program_uniforms(&mut uniforms, program, rarity);
    } else {
        let metalness = if rarity >= Rarity::Legendary {
            FALLBACK_PREMIUM_METALNESS
        } else {
            FALLBACK_METALNESS
        };
        uniforms.insert(U_ROUGHNESS, UniformValue::Float(FALLBACK_ROUGHNESS));
        uniforms.insert(U_METALNESS, UniformValue::Float(metalness));
    }

    MaterialDescriptor {
        program,
        uniforms,
        blend_mode: program.blend_mode(),
        casts_shadow: quality == QualityTier::Ultra,
        filtering: filtering_for(quality),
    }
}

fn bind_program_uniforms(
    uniforms: &mut BTreeMap<&'static str, UniformValue>,
    program: ShaderProgram,
    rarity: Rarity,
) {
    match program {
        ShaderProgram::StandardPbr => {
            uniforms.insert(U_ROUGHNESS, UniformValue::Float(ENHANCED_ROUGHNESS));
            uniforms.insert(U_METALNESS, UniformValue::Float(ENHANCED_METALNESS));
            if rarity == Rarity::Uncommon {
                uniforms.insert(U_CLEARCOAT, UniformValue::Float(UNCOMMON_CLEARCOAT));
            }
        }
        ShaderProgram::Holographic => {
            let intensity = if rarity == Rarity::Epic {
                EPIC_HOLO_INTENSITY
            } else {
                RARE_HOLO_INTENSITY
            };
            uniforms.insert(U_INTENSITY, UniformValue::Float(intensity));
            uniforms.insert(U_TINT, UniformValue::Color(rarity_color(rarity)));
        }
        ShaderProgram::DynamicMetallic => {
            uniforms.insert(U_INTENSITY, UniformValue::Float(METALLIC_INTENSITY));
            uniforms.insert(U_TINT, UniformValue::Color(LEGENDARY_GOLD));
            uniforms.insert(U_ROUGHNESS, UniformValue::Float(0.15));
            uniforms.insert(U_METALNESS, UniformValue::Float(1.0));
        }
        ShaderProgram::EnergyGlow => {
            uniforms.insert(U_INTENSITY, UniformValue::Float(ENERGY_GLOW_INTENSITY));
            uniforms.insert(U_PULSE_SPEED, UniformValue::Float(ENERGY_PULSE_SPEED));
            uniforms.insert(U_TINT, UniformValue::Color(MYTHIC_TEAL));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_quality_is_fixed_pbr() {
        for rarity in Rarity::ALL {
            let material = resolve(rarity, QualityTier::Low, true, Some("art.png"));
            assert_eq!(material.program, ShaderProgram::StandardPbr);
            assert_eq!(material.float(U_ROUGHNESS), Some(FALLBACK_ROUGHNESS));
            let expected = if rarity >= Rarity::Legendary { 0.8 } else { 0.1 };
            assert_eq!(material.float(U_METALNESS), Some(expected));
            assert_eq!(material.float(U_CLEARCOAT), None);
        }
    }

    #[test]
    fn test_shaders_disabled_is_fixed_pbr() {
        let material = resolve(Rarity::Mythic, QualityTier::Ultra, false, None);
        assert_eq!(material.program, ShaderProgram::StandardPbr);
        assert_eq!(material.float(U_METALNESS), Some(FALLBACK_PREMIUM_METALNESS));
        assert!(material.casts_shadow);
    }

    #[test]
    fn test_rarity_programs() {
        let q = QualityTier::High;
        assert_eq!(program_for(Rarity::Common, q, true), ShaderProgram::StandardPbr);
        assert_eq!(program_for(Rarity::Uncommon, q, true), ShaderProgram::StandardPbr);
        assert_eq!(program_for(Rarity::Rare, q, true), ShaderProgram::Holographic);
        assert_eq!(program_for(Rarity::Epic, q, true), ShaderProgram::Holographic);
        assert_eq!(program_for(Rarity::Legendary, q, true), ShaderProgram::DynamicMetallic);
        assert_eq!(program_for(Rarity::Mythic, q, true), ShaderProgram::EnergyGlow);
    }

    #[test]
    fn test_holographic_intensity() {
        let rare = resolve(Rarity::Rare, QualityTier::Medium, true, None);
        let epic = resolve(Rarity::Epic, QualityTier::Medium, true, None);
        assert_eq!(rare.float(U_INTENSITY), Some(RARE_HOLO_INTENSITY));
        assert_eq!(epic.float(U_INTENSITY), Some(EPIC_HOLO_INTENSITY));
    }

    #[test]
    fn test_uncommon_clearcoat() {
        let uncommon = resolve(Rarity::Uncommon, QualityTier::High, true, None);
        let common = resolve(Rarity::Common, QualityTier::High, true, None);
        assert_eq!(uncommon.float(U_CLEARCOAT), Some(UNCOMMON_CLEARCOAT));
        assert_eq!(common.float(U_CLEARCOAT), None);
    }

    #[test]
    fn test_filtering_scales_with_quality() {
        let anisotropy: Vec<u16> = QualityTier::ALL
            .into_iter()
            .map(|q| filtering_for(q).anisotropy)
            .collect();
        assert_eq!(anisotropy, vec![2, 4, 8, 16]);
        assert!(!filtering_for(QualityTier::Low).generate_mipmaps);
        assert!(filtering_for(QualityTier::Medium).generate_mipmaps);
    }

    #[test]
    fn test_missing_image_binds_placeholder() {
        assert_eq!(resolve(Rarity::Rare, QualityTier::High, true, None).texture(), &TextureRef::Placeholder);
        assert_eq!(resolve(Rarity::Rare, QualityTier::High, true, Some("")).texture(), &TextureRef::Placeholder);
        assert_eq!(
            resolve(Rarity::Rare, QualityTier::High, true, Some("a.png")).texture(),
            &TextureRef::Image("a.png".into())
        );
    }

    #[test]
    fn test_shadows_only_at_ultra() {
        for quality in QualityTier::ALL {
            let material = resolve(Rarity::Epic, quality, true, None);
            assert_eq!(material.casts_shadow, quality == QualityTier::Ultra);
        }
    }
}
