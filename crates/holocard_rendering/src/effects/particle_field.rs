//! Ambient Particle Field
//!
//! A fixed-size point cloud drifting around premium cards. Structure of
//! arrays, allocated once per mount and never resized:
//!
//! ```text
//! positions  [N] ─┐
//! velocities [N]  ├─ tick(): p += v · (dt · 60), jitter y, wrap per axis
//! sizes      [N]  │
//! colors     [N] ─┴─ fill_instances() ──► ParticleVertex[N] (additive pass)
//! ```
//!
//! Only Rare and above get a field. Common and Uncommon never do.

use crate::palette;
use bytemuck::{Pod, Zeroable};
use holocard_shared::{QualityTier, Rarity, Vec3};
use rand::Rng;

/// Particle count at Ultra.
pub const ULTRA_PARTICLE_COUNT: usize = 150;

/// Particle count below Ultra.
pub const STANDARD_PARTICLE_COUNT: usize = 75;

/// Velocities are tuned per 60 Hz frame.
pub const REFERENCE_RATE: f32 = 60.0;

/// Vertical jitter amplitude.
pub const JITTER_AMPLITUDE: f32 = 0.001;

/// Size spread around the rarity base (±30 %).
pub const SIZE_VARIATION: f32 = 0.3;

/// Brightness spread around the rarity colour (±15 %).
pub const BRIGHTNESS_VARIATION: f32 = 0.15;

/// Per-rarity drift speed, base size and colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleStyle {
    /// Max speed per axis (units per 60 Hz frame).
    pub speed: f32,
    /// Base billboard size.
    pub size: f32,
    /// Base colour.
    pub color: [f32; 3],
}

impl ParticleStyle {
    /// Style table lookup.
    #[must_use]
    pub const fn for_rarity(rarity: Rarity) -> Self {
        let (speed, size) = match rarity {
            Rarity::Common => (0.001, 0.02),
            Rarity::Uncommon => (0.002, 0.025),
            Rarity::Rare => (0.003, 0.03),
            Rarity::Epic => (0.004, 0.035),
            Rarity::Legendary => (0.005, 0.04),
            Rarity::Mythic => (0.006, 0.05),
        };
        Self {
            speed,
            size,
            color: palette::rarity_color(rarity),
        }
    }
}

/// Box the field lives in, centred on the card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleBounds {
    /// Extent along x.
    pub width: f32,
    /// Extent along y.
    pub height: f32,
    /// Extent along z.
    pub depth: f32,
}

impl ParticleBounds {
    /// Creates bounds. Non-positive extents are clamped to a small minimum.
    #[must_use]
    pub fn new(width: f32, height: f32, depth: f32) -> Self {
        Self {
            width: width.max(0.01),
            height: height.max(0.01),
            depth: depth.max(0.01),
        }
    }

    /// Half extents.
    #[must_use]
    pub fn half(&self) -> Vec3 {
        Vec3::new(self.width * 0.5, self.height * 0.5, self.depth * 0.5)
    }

    /// True if `p` lies inside the box (inclusive).
    #[must_use]
    pub fn contains(&self, p: Vec3) -> bool {
        let h = self.half();
        p.x.abs() <= h.x && p.y.abs() <= h.y && p.z.abs() <= h.z
    }
}

impl Default for ParticleBounds {
    /// Slightly larger than the card so particles frame it.
    fn default() -> Self {
        Self::new(4.0, 5.0, 2.0)
    }
}

/// Number of particles for `quality`.
#[must_use]
pub const fn particle_count(quality: QualityTier) -> usize {
    match quality {
        QualityTier::Ultra => ULTRA_PARTICLE_COUNT,
        QualityTier::Low | QualityTier::Medium | QualityTier::High => STANDARD_PARTICLE_COUNT,
    }
}

/// Per-instance vertex data for the particle pass.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleVertex {
    /// World position
    pub position: [f32; 3],
    /// Billboard size
    pub size: f32,
    /// RGBA
    pub color: [f32; 4],
}

impl ParticleVertex {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32, 2 => Float32x4];

    /// Instance-stepped buffer layout.
    #[must_use]
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::SIZE as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// The simulated field.
#[derive(Debug, Clone)]
pub struct ParticleField {
    rarity: Rarity,
    bounds: ParticleBounds,
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    sizes: Vec<f32>,
    colors: Vec<[f32; 3]>,
}

impl ParticleField {
    /// Allocates a field for a premium card.
    ///
    /// Returns `None` for Common and Uncommon. Particles start uniformly
    /// inside `bounds` with a random velocity up to the rarity speed per axis.
    pub fn allocate<R: Rng + ?Sized>(
        rarity: Rarity,
        quality: QualityTier,
        bounds: ParticleBounds,
        rng: &mut R,
    ) -> Option<Self> {
        if !rarity.is_premium() {
            return None;
        }

        let style = ParticleStyle::for_rarity(rarity);
        let count = particle_count(quality);
        let half = bounds.half();

        let mut positions = Vec::with_capacity(count);
        let mut velocities = Vec::with_capacity(count);
        let mut sizes = Vec::with_capacity(count);
        let mut colors = Vec::with_capacity(count);

        for _ in 0..count {
            positions.push(Vec3::new(
                rng.gen_range(-half.x..=half.x),
                rng.gen_range(-half.y..=half.y),
                rng.gen_range(-half.z..=half.z),
            ));
            velocities.push(Vec3::new(
                rng.gen_range(-style.speed..=style.speed),
                rng.gen_range(-style.speed..=style.speed),
                rng.gen_range(-style.speed..=style.speed),
            ));
            sizes.push(style.size * rng.gen_range(1.0 - SIZE_VARIATION..=1.0 + SIZE_VARIATION));
            let brightness = rng.gen_range(1.0 - BRIGHTNESS_VARIATION..=1.0 + BRIGHTNESS_VARIATION);
            colors.push(style.color.map(|c| (c * brightness).min(1.0)));
        }

        tracing::debug!(?rarity, ?quality, count, "particle field allocated");

        Some(Self {
            rarity,
            bounds,
            positions,
            velocities,
            sizes,
            colors,
        })
    }

    /// Advances every particle.
    ///
    /// Jitter is applied before wrapping so a tick never leaves a particle
    /// outside the box.
    pub fn tick(&mut self, dt: f32, elapsed: f32) {
        let step = dt.max(0.0) * REFERENCE_RATE;
        let half = self.bounds.half();

        for (i, (position, velocity)) in self
            .positions
            .iter_mut()
            .zip(self.velocities.iter())
            .enumerate()
        {
            let mut p = *position + *velocity * step;
            p.y += (elapsed + i as f32 * 0.1).sin() * JITTER_AMPLITUDE;

            p.x = wrap(p.x, half.x);
            p.y = wrap(p.y, half.y);
            p.z = wrap(p.z, half.z);
            *position = p;
        }
    }

    /// Writes one instance per particle into `out` (cleared first).
    pub fn fill_instances(&self, out: &mut Vec<ParticleVertex>) {
        out.clear();
        out.extend(
            self.positions
                .iter()
                .zip(&self.sizes)
                .zip(&self.colors)
                .map(|((p, size), c)| ParticleVertex {
                    position: p.to_array(),
                    size: *size,
                    color: [c[0], c[1], c[2], 1.0],
                }),
        );
    }

    /// Particle count. Fixed for the field's lifetime.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Always false for an allocated field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Rarity the field was styled for.
    #[must_use]
    pub fn rarity(&self) -> Rarity {
        self.rarity
    }

    /// The wrapping box.
    #[must_use]
    pub fn bounds(&self) -> ParticleBounds {
        self.bounds
    }

    /// Current positions.
    #[must_use]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Per-particle velocities.
    #[must_use]
    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    /// Per-particle sizes.
    #[must_use]
    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    /// Per-particle colours.
    #[must_use]
    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors
    }
}

/// Past one extreme → the opposite extreme.
#[inline]
fn wrap(value: f32, half: f32) -> f32 {
    if value > half {
        -half
    } else if value < -half {
        half
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn field(rarity: Rarity, quality: QualityTier) -> Option<ParticleField> {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        ParticleField::allocate(rarity, quality, ParticleBounds::default(), &mut rng)
    }

    #[test]
    fn test_vertex_size() {
        assert_eq!(ParticleVertex::SIZE, 32);
    }

    #[test]
    fn test_gating() {
        assert!(field(Rarity::Common, QualityTier::Ultra).is_none());
        assert!(field(Rarity::Uncommon, QualityTier::Ultra).is_none());
        assert!(field(Rarity::Rare, QualityTier::Low).is_some());
    }

    #[test]
    fn test_counts() {
        assert_eq!(field(Rarity::Mythic, QualityTier::Ultra).map(|f| f.len()), Some(150));
        assert_eq!(field(Rarity::Mythic, QualityTier::High).map(|f| f.len()), Some(75));
        assert_eq!(field(Rarity::Epic, QualityTier::Medium).map(|f| f.len()), Some(75));
    }

    #[test]
    fn test_variation_ranges() {
        let f = field(Rarity::Legendary, QualityTier::Ultra).unwrap();
        let style = ParticleStyle::for_rarity(Rarity::Legendary);
        for size in f.sizes() {
            assert!(*size >= style.size * 0.7 - 1e-6 && *size <= style.size * 1.3 + 1e-6);
        }
        for v in f.velocities() {
            assert!(v.x.abs() <= style.speed && v.y.abs() <= style.speed && v.z.abs() <= style.speed);
        }
    }

    #[test]
    fn test_wrap_is_symmetric() {
        assert_eq!(wrap(2.1, 2.0), -2.0);
        assert_eq!(wrap(-2.1, 2.0), 2.0);
        assert_eq!(wrap(1.5, 2.0), 1.5);
    }

    #[test]
    fn test_positions_stay_bounded() {
        let mut f = field(Rarity::Mythic, QualityTier::Ultra).unwrap();
        let mut elapsed = 0.0;
        for _ in 0..5_000 {
            elapsed += 1.0 / 60.0;
            f.tick(1.0 / 60.0, elapsed);
        }
        assert!(f.positions().iter().all(|p| f.bounds().contains(*p)));
        assert_eq!(f.len(), 150);
    }

    #[test]
    fn test_same_seed_same_field() {
        let a = field(Rarity::Rare, QualityTier::High).unwrap();
        let b = field(Rarity::Rare, QualityTier::High).unwrap();
        assert_eq!(a.positions(), b.positions());
        assert_eq!(a.colors(), b.colors());
    }

    #[test]
    fn test_fill_instances() {
        let f = field(Rarity::Epic, QualityTier::High).unwrap();
        let mut out = vec![ParticleVertex::default(); 3];
        f.fill_instances(&mut out);
        assert_eq!(out.len(), f.len());
        assert_eq!(out[0].position, f.positions()[0].to_array());
        assert_eq!(out[0].color[3], 1.0);
    }
}
