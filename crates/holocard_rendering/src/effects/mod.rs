//! # Visual Effects
//!
//! - `ParticleField` - CPU-simulated ambient particles for premium cards
//! - `ParticleShaders` - additive billboard pass

mod particle_field;
mod particle_shaders;

pub use particle_field::{
    particle_count, ParticleBounds, ParticleField, ParticleStyle, ParticleVertex,
    BRIGHTNESS_VARIATION, JITTER_AMPLITUDE, REFERENCE_RATE, SIZE_VARIATION,
    STANDARD_PARTICLE_COUNT, ULTRA_PARTICLE_COUNT,
};
pub use particle_shaders::ParticleShaders;
