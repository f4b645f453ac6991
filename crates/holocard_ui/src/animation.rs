//! Spring-damped animation.
//!
//! The pose never eases along a fixed curve. Every animated quantity is a
//! mass-spring-damper pulled towards its target, so retargeting mid-flight
//! keeps the current velocity and never snaps.
//!
//! Integration runs in fixed 1 ms substeps (semi-implicit Euler) regardless of
//! the frame rate, so a 30 Hz and a 144 Hz display land on the same curve.

use holocard_shared::Vec3;

/// Spring constants for a unit mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringConfig {
    /// Pull towards the target.
    pub tension: f32,
    /// Velocity damping.
    pub friction: f32,
}

impl SpringConfig {
    /// Default motion: close to critically damped, with a visible settle.
    pub const ANIMATED: Self = Self { tension: 170.0, friction: 26.0 };

    /// Used when animations are disabled. Reaches the target quickly with
    /// no overshoot.
    pub const STIFF: Self = Self { tension: 400.0, friction: 40.0 };

    /// Picks the configuration for the animation preference.
    #[must_use]
    pub const fn for_animations(enabled: bool) -> Self {
        if enabled {
            Self::ANIMATED
        } else {
            Self::STIFF
        }
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self::ANIMATED
    }
}

/// A single spring-driven value.
#[derive(Debug, Clone)]
pub struct Spring {
    current: f32,
    velocity: f32,
    target: f32,
    config: SpringConfig,
}

impl Spring {
    /// Integration step (seconds).
    pub const SUBSTEP: f32 = 0.001;

    /// Displacement and velocity under this are treated as "arrived".
    pub const REST_THRESHOLD: f32 = 1e-4;

    /// Longest frame delta integrated in one update. Longer stalls (tab in
    /// background, debugger) are clamped so the loop stays bounded.
    pub const MAX_FRAME_DELTA: f32 = 0.1;

    /// Creates a spring resting at `value`.
    #[must_use]
    pub fn new(value: f32, config: SpringConfig) -> Self {
        Self {
            current: value,
            velocity: 0.0,
            target: value,
            config,
        }
    }

    /// Current value.
    #[must_use]
    pub fn value(&self) -> f32 {
        self.current
    }

    /// Current target.
    #[must_use]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// True once the spring sits exactly on its target.
    #[must_use]
    pub fn is_at_rest(&self) -> bool {
        self.current == self.target && self.velocity == 0.0
    }

    /// Retargets. Velocity is preserved.
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Swaps tension/friction in place without disturbing the motion.
    pub fn set_config(&mut self, config: SpringConfig) {
        self.config = config;
    }

    /// Jumps to `value` and stops.
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.velocity = 0.0;
    }

    /// Advances the spring by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if self.is_at_rest() {
            return;
        }

        let mut remaining = dt.clamp(0.0, Self::MAX_FRAME_DELTA);
        while remaining > 0.0 {
            let h = remaining.min(Self::SUBSTEP);
            let displacement = self.current - self.target;
            let force = -self.config.tension * displacement - self.config.friction * self.velocity;
            self.velocity += force * h;
            self.current += self.velocity * h;
            remaining -= h;

            if (self.current - self.target).abs() < Self::REST_THRESHOLD
                && self.velocity.abs() < Self::REST_THRESHOLD
            {
                self.current = self.target;
                self.velocity = 0.0;
                break;
            }
        }
    }
}

/// Three springs sharing one configuration.
#[derive(Debug, Clone)]
pub struct Spring3 {
    /// X component.
    pub x: Spring,
    /// Y component.
    pub y: Spring,
    /// Z component.
    pub z: Spring,
}

impl Spring3 {
    /// Creates a vector spring resting at `value`.
    #[must_use]
    pub fn new(value: Vec3, config: SpringConfig) -> Self {
        Self {
            x: Spring::new(value.x, config),
            y: Spring::new(value.y, config),
            z: Spring::new(value.z, config),
        }
    }

    /// Current value.
    #[must_use]
    pub fn value(&self) -> Vec3 {
        Vec3::new(self.x.value(), self.y.value(), self.z.value())
    }

    /// Retargets all components.
    pub fn set_target(&mut self, target: Vec3) {
        self.x.set_target(target.x);
        self.y.set_target(target.y);
        self.z.set_target(target.z);
    }

    /// Swaps the configuration of all components.
    pub fn set_config(&mut self, config: SpringConfig) {
        self.x.set_config(config);
        self.y.set_config(config);
        self.z.set_config(config);
    }

    /// Advances all components.
    pub fn update(&mut self, dt: f32) {
        self.x.update(dt);
        self.y.update(dt);
        self.z.update(dt);
    }

    /// True once every component is at rest.
    #[must_use]
    pub fn is_at_rest(&self) -> bool {
        self.x.is_at_rest() && self.y.is_at_rest() && self.z.is_at_rest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(spring: &mut Spring, frames: usize) {
        for _ in 0..frames {
            spring.update(1.0 / 60.0);
        }
    }

    #[test]
    fn test_spring_reaches_target_exactly() {
        let mut spring = Spring::new(0.0, SpringConfig::ANIMATED);
        spring.set_target(1.0);
        settle(&mut spring, 300);

        assert_eq!(spring.value(), 1.0);
        assert!(spring.is_at_rest());
    }

    #[test]
    fn test_stiff_spring_is_faster() {
        let mut soft = Spring::new(0.0, SpringConfig::ANIMATED);
        let mut stiff = Spring::new(0.0, SpringConfig::STIFF);
        soft.set_target(1.0);
        stiff.set_target(1.0);

        settle(&mut soft, 6);
        settle(&mut stiff, 6);

        assert!(stiff.value() > soft.value(), "stiff {} soft {}", stiff.value(), soft.value());
    }

    #[test]
    fn test_stiff_spring_does_not_overshoot() {
        let mut spring = Spring::new(0.0, SpringConfig::STIFF);
        spring.set_target(1.0);
        for _ in 0..120 {
            spring.update(1.0 / 60.0);
            assert!(spring.value() <= 1.0 + Spring::REST_THRESHOLD);
        }
    }

    #[test]
    fn test_frame_rate_independent() {
        let mut slow = Spring::new(0.0, SpringConfig::ANIMATED);
        let mut fast = Spring::new(0.0, SpringConfig::ANIMATED);
        slow.set_target(1.0);
        fast.set_target(1.0);

        for _ in 0..10 {
            slow.update(0.02);
        }
        for _ in 0..20 {
            fast.update(0.01);
        }

        assert!((slow.value() - fast.value()).abs() < 1e-3);
    }

    #[test]
    fn test_config_swap_keeps_position() {
        let mut spring = Spring::new(0.0, SpringConfig::ANIMATED);
        spring.set_target(1.0);
        spring.update(0.05);
        let before = spring.value();

        spring.set_config(SpringConfig::STIFF);
        assert_eq!(spring.value(), before);
    }
}
