//! # Capability Profiler
//!
//! Decides, once per viewer mount, whether 3D can run at all and which
//! quality `auto` should mean on this device.
//!
//! ## Classification
//!
//! ```text
//! backend:  Vulkan | Metal | DX12 | WebGPU → api 2
//!           GL                             → api 1
//!           none / other                   → unsupported
//!
//! tier:     discrete GPU                   → High
//!           integrated / virtual GPU       → Medium (Low under 8K textures)
//!           CPU / unknown                  → Low
//! ```
//!
//! Detection never fails. A probe error or panic yields the unsupported
//! profile, which forces the static path.

mod probe;

pub use probe::{AdapterReport, DeviceClass, GraphicsBackend, GraphicsProbe, StaticProbe, WgpuProbe};

use crate::error::{panic_message, ProbeError};
use holocard_shared::{QualityPreset, QualityTier};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Integrated GPUs below this texture limit are treated as low end.
pub const MEDIUM_TIER_MIN_TEXTURE: u32 = 8192;

/// Coarse device speed estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PerformanceTier {
    /// Software or weak GPUs
    Low,
    /// Integrated GPUs
    Medium,
    /// Discrete GPUs
    High,
}

/// What the device can do. Immutable for the lifetime of a viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCapabilityProfile {
    /// A graphics API the renderer can drive was found.
    pub graphics_api_supported: bool,
    /// API generation, see [`GraphicsBackend::api_version`].
    pub api_version: u32,
    /// Coarse performance estimate.
    pub performance_tier: PerformanceTier,
}

impl DeviceCapabilityProfile {
    /// The safest profile: no 3D at all.
    #[must_use]
    pub const fn unsupported() -> Self {
        Self {
            graphics_api_supported: false,
            api_version: 0,
            performance_tier: PerformanceTier::Low,
        }
    }

    /// Classifies an adapter report.
    #[must_use]
    pub fn classify(report: &AdapterReport) -> Self {
        let api_version = report.backend.api_version();
        if api_version == 0 {
            return Self::unsupported();
        }

        let performance_tier = match report.device_class {
            DeviceClass::Discrete => PerformanceTier::High,
            DeviceClass::Integrated | DeviceClass::Virtual => {
                if report.max_texture_dimension < MEDIUM_TIER_MIN_TEXTURE {
                    PerformanceTier::Low
                } else {
                    PerformanceTier::Medium
                }
            }
            DeviceClass::Cpu | DeviceClass::Other => PerformanceTier::Low,
        };

        Self {
            graphics_api_supported: true,
            api_version,
            performance_tier,
        }
    }

    /// Concrete quality for a preset. `Auto` follows the performance tier
    /// and never picks Ultra.
    #[must_use]
    pub const fn resolve_quality(&self, preset: QualityPreset) -> QualityTier {
        match preset.concrete() {
            Some(tier) => tier,
            None => match self.performance_tier {
                PerformanceTier::Low => QualityTier::Low,
                PerformanceTier::Medium => QualityTier::Medium,
                PerformanceTier::High => QualityTier::High,
            },
        }
    }
}

/// Runs `probe` and classifies the result. Never panics, never errors.
pub fn detect(probe: &dyn GraphicsProbe) -> DeviceCapabilityProfile {
    let outcome = catch_unwind(AssertUnwindSafe(|| probe.probe()))
        .unwrap_or_else(|payload| Err(ProbeError::Panicked(panic_message(payload.as_ref()))));

    match outcome {
        Ok(report) => {
            let profile = DeviceCapabilityProfile::classify(&report);
            tracing::info!(
                adapter = %report.name,
                api_version = profile.api_version,
                tier = ?profile.performance_tier,
                "device capabilities detected"
            );
            profile
        }
        Err(err) => {
            tracing::info!(error = %err, "no usable graphics API, cards render statically");
            DeviceCapabilityProfile::unsupported()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(backend: GraphicsBackend, device_class: DeviceClass, max_texture_dimension: u32) -> AdapterReport {
        AdapterReport {
            name: "test".into(),
            backend,
            device_class,
            max_texture_dimension,
        }
    }

    struct PanickingProbe;

    impl GraphicsProbe for PanickingProbe {
        fn probe(&self) -> Result<AdapterReport, ProbeError> {
            panic!("driver crashed");
        }
    }

    #[test]
    fn test_tiers() {
        let discrete = DeviceCapabilityProfile::classify(&report(GraphicsBackend::Vulkan, DeviceClass::Discrete, 16384));
        assert_eq!(discrete.performance_tier, PerformanceTier::High);
        assert_eq!(discrete.api_version, 2);

        let integrated = DeviceCapabilityProfile::classify(&report(GraphicsBackend::Metal, DeviceClass::Integrated, 8192));
        assert_eq!(integrated.performance_tier, PerformanceTier::Medium);

        let weak = DeviceCapabilityProfile::classify(&report(GraphicsBackend::Gl, DeviceClass::Integrated, 4096));
        assert_eq!(weak.performance_tier, PerformanceTier::Low);
        assert_eq!(weak.api_version, 1);

        let software = DeviceCapabilityProfile::classify(&report(GraphicsBackend::Vulkan, DeviceClass::Cpu, 16384));
        assert_eq!(software.performance_tier, PerformanceTier::Low);
        assert!(software.graphics_api_supported);
    }

    #[test]
    fn test_unknown_backend_is_unsupported() {
        let profile = DeviceCapabilityProfile::classify(&report(GraphicsBackend::Other, DeviceClass::Discrete, 16384));
        assert_eq!(profile, DeviceCapabilityProfile::unsupported());
    }

    #[test]
    fn test_probe_failure_and_panic_are_unsupported() {
        let failing = StaticProbe::failing(ProbeError::NoAdapter);
        assert!(!detect(&failing).graphics_api_supported);
        assert!(!detect(&PanickingProbe).graphics_api_supported);
    }

    #[test]
    fn test_auto_never_resolves_to_ultra() {
        let high = detect(&StaticProbe::discrete());
        assert_eq!(high.resolve_quality(QualityPreset::Auto), QualityTier::High);
        assert_eq!(high.resolve_quality(QualityPreset::Ultra), QualityTier::Ultra);

        let medium = detect(&StaticProbe::integrated());
        assert_eq!(medium.resolve_quality(QualityPreset::Auto), QualityTier::Medium);
        assert_eq!(medium.resolve_quality(QualityPreset::Low), QualityTier::Low);
    }
}
