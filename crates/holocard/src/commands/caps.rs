//! Capabilities command

use holocard_rendering::capability::{detect, GraphicsProbe, WgpuProbe};
use holocard_shared::{QualityPreset, QualityTier};

pub fn run() {
    let probe = WgpuProbe::default();

    println!("HOLOCARD Device Capabilities");
    println!("============================\n");

    match probe.probe() {
        Ok(report) => {
            println!("Adapter:");
            println!("  Name:         {}", report.name);
            println!("  Backend:      {:?}", report.backend);
            println!("  Class:        {:?}", report.device_class);
            println!("  Max texture:  {}", report.max_texture_dimension);
        }
        Err(err) => {
            println!("Adapter: not available ({err})");
        }
    }

    let profile = detect(&probe);

    println!();
    println!("Profile:");
    println!(
        "  3D supported: {}",
        if profile.graphics_api_supported { "Yes" } else { "No" }
    );
    println!("  API version:  {}", profile.api_version);
    println!("  Tier:         {:?}", profile.performance_tier);

    println!();
    if profile.graphics_api_supported {
        println!(
            "Auto quality: {:?}",
            profile.resolve_quality(QualityPreset::Auto)
        );
        println!();
        println!("Quality tiers:");
        for tier in QualityTier::ALL {
            println!("  - {tier:?}");
        }
    } else {
        println!("Cards will render as static images.");
    }
}
