//! Scene description.
//!
//! Lighting, environment, camera and orbit limits for one mounted card,
//! all derived from the concrete quality tier and the rarity:
//!
//! ```text
//! quality  ambient  key   shadow   environment  accent (Epic+)
//! Low      0.4      1.0   -        -            -
//! Medium   0.4      1.0   -        0.6          -
//! High     0.4      1.0   -        0.8          rarity colour
//! Ultra    0.4      1.0   2048²    1.0          rarity colour
//! ```

use crate::gpu::SceneUniforms;
use crate::palette;
use holocard_shared::{Mat4, QualityTier, Rarity, Vec3};
use holocard_ui::PoseState;

/// Ambient light intensity.
pub const AMBIENT_INTENSITY: f32 = 0.4;
/// Key light intensity.
pub const DIRECTIONAL_INTENSITY: f32 = 1.0;
/// Shadow map edge length at Ultra.
pub const SHADOW_MAP_SIZE: u32 = 2048;
/// Shadow comparison bias.
pub const SHADOW_BIAS: f32 = 0.002;
/// Accent point light intensity.
pub const ACCENT_INTENSITY: f32 = 0.8;

/// Point light tinted by rarity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccentLight {
    /// World position.
    pub position: Vec3,
    /// Linear RGB.
    pub color: [f32; 3],
    /// Intensity.
    pub intensity: f32,
}

/// Light rig.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingRig {
    /// Ambient intensity.
    pub ambient: f32,
    /// Key light intensity.
    pub directional: f32,
    /// Key light position; the light points at the origin.
    pub directional_position: Vec3,
    /// Shadow map size, `None` without shadows.
    pub shadow_map_size: Option<u32>,
    /// Optional accent light.
    pub accent: Option<AccentLight>,
}

/// Perspective camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    /// Vertical field of view (radians).
    pub fov_y: f32,
    /// Near plane.
    pub near: f32,
    /// Far plane.
    pub far: f32,
}

impl CameraRig {
    /// World-space extent visible at `distance` for `aspect`.
    #[must_use]
    pub fn visible_extent(&self, distance: f32, aspect: f32) -> (f32, f32) {
        let height = 2.0 * distance * (self.fov_y * 0.5).tan();
        (height * aspect, height)
    }
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            fov_y: 45f32.to_radians(),
            near: 0.1,
            far: 100.0,
        }
    }
}

/// Orbit control limits, present when controls are shown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitLimits {
    /// Closest camera distance.
    pub min_distance: f32,
    /// Furthest camera distance.
    pub max_distance: f32,
    /// Largest angle from the +z axis (radians).
    pub max_angle: f32,
}

impl Default for OrbitLimits {
    fn default() -> Self {
        Self {
            min_distance: 3.0,
            max_distance: 8.0,
            max_angle: std::f32::consts::FRAC_PI_3,
        }
    }
}

impl OrbitLimits {
    /// Pulls a requested camera position back inside the limits.
    #[must_use]
    pub fn clamp(&self, camera: Vec3) -> Vec3 {
        let distance = camera.length();
        if !distance.is_finite() || distance < 1e-6 {
            return Vec3::new(0.0, 0.0, self.min_distance.max(1.0));
        }

        let mut dir = camera * (1.0 / distance);
        let angle = dir.z.clamp(-1.0, 1.0).acos();
        if angle > self.max_angle {
            let lateral = Vec3::new(dir.x, dir.y, 0.0).normalize_or_zero();
            let (sin, cos) = self.max_angle.sin_cos();
            dir = lateral * sin + Vec3::new(0.0, 0.0, cos);
        }
        dir * distance.clamp(self.min_distance, self.max_distance)
    }
}

/// Everything the mounted scene needs besides the card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneSetup {
    /// Concrete quality.
    pub quality: QualityTier,
    /// Lights.
    pub lighting: LightingRig,
    /// Environment reflection intensity; `None` skips the environment.
    pub environment: Option<f32>,
    /// Camera.
    pub camera: CameraRig,
    /// Orbit limits when controls are shown.
    pub orbit: Option<OrbitLimits>,
}

impl SceneSetup {
    /// Setup for `quality` and `rarity`.
    #[must_use]
    pub fn for_quality(quality: QualityTier, rarity: Rarity, show_controls: bool) -> Self {
        let environment = match quality {
            QualityTier::Low => None,
            QualityTier::Medium => Some(0.6),
            QualityTier::High => Some(0.8),
            QualityTier::Ultra => Some(1.0),
        };

        let accent = (rarity >= Rarity::Epic && quality >= QualityTier::High).then(|| AccentLight {
            position: Vec3::new(-2.0, 1.5, 2.5),
            color: palette::rarity_color(rarity),
            intensity: ACCENT_INTENSITY,
        });

        Self {
            quality,
            lighting: LightingRig {
                ambient: AMBIENT_INTENSITY,
                directional: DIRECTIONAL_INTENSITY,
                directional_position: Vec3::new(5.0, 5.0, 5.0),
                shadow_map_size: (quality == QualityTier::Ultra).then_some(SHADOW_MAP_SIZE),
                accent,
            },
            environment,
            camera: CameraRig::default(),
            orbit: show_controls.then(OrbitLimits::default),
        }
    }

    /// Camera position after orbit limits.
    #[must_use]
    pub fn camera_position(&self, requested: Vec3) -> Vec3 {
        match &self.orbit {
            Some(limits) => limits.clamp(requested),
            None => requested,
        }
    }

    /// Uniforms for one frame.
    #[must_use]
    pub fn uniforms(&self, pose: &PoseState, requested_camera: Vec3, aspect: f32) -> SceneUniforms {
        let eye = self.camera_position(requested_camera);
        let view = Mat4::look_at(eye, Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective(self.camera.fov_y, aspect, self.camera.near, self.camera.far);

        let forward = (Vec3::ZERO - eye).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward);

        let light = &self.lighting;
        let light_dir = light.directional_position.normalize_or_zero();
        let light_view = Mat4::look_at(light.directional_position, Vec3::ZERO, Vec3::Y);
        let light_proj = Mat4::orthographic(-3.0, 3.0, -3.0, 3.0, 0.1, 20.0);

        let (accent_pos, accent_color) = match light.accent {
            Some(accent) => (
                [accent.position.x, accent.position.y, accent.position.z, accent.intensity],
                [accent.color[0], accent.color[1], accent.color[2], 1.0],
            ),
            None => ([0.0; 4], [0.0; 4]),
        };

        SceneUniforms {
            view_proj: (proj * view).cols,
            model: Mat4::from_pose(pose.position, pose.rotation, pose.scale).cols,
            light_view_proj: (light_proj * light_view).cols,
            camera_pos: [eye.x, eye.y, eye.z, self.environment.unwrap_or(0.0)],
            camera_right: [right.x, right.y, right.z, 0.0],
            camera_up: [up.x, up.y, up.z, 0.0],
            light_dir: [light_dir.x, light_dir.y, light_dir.z, light.directional],
            ambient: [1.0, 1.0, 1.0, light.ambient],
            accent_pos,
            accent_color,
            shadow: match light.shadow_map_size {
                Some(_) => [1.0, SHADOW_BIAS, 0.0, 0.0],
                None => [0.0; 4],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadow_only_at_ultra() {
        for quality in QualityTier::ALL {
            let setup = SceneSetup::for_quality(quality, Rarity::Rare, false);
            assert_eq!(
                setup.lighting.shadow_map_size.is_some(),
                quality == QualityTier::Ultra
            );
            assert_eq!(setup.lighting.ambient, 0.4);
            assert_eq!(setup.lighting.directional, 1.0);
        }
    }

    #[test]
    fn test_environment_skipped_at_low() {
        assert_eq!(SceneSetup::for_quality(QualityTier::Low, Rarity::Mythic, false).environment, None);
        assert_eq!(SceneSetup::for_quality(QualityTier::Medium, Rarity::Mythic, false).environment, Some(0.6));
    }

    #[test]
    fn test_accent_light() {
        let high = SceneSetup::for_quality(QualityTier::High, Rarity::Legendary, false);
        assert_eq!(high.lighting.accent.map(|a| a.color), Some(palette::LEGENDARY_GOLD));
        assert!(SceneSetup::for_quality(QualityTier::Medium, Rarity::Legendary, false).lighting.accent.is_none());
        assert!(SceneSetup::for_quality(QualityTier::Ultra, Rarity::Rare, false).lighting.accent.is_none());
    }

    #[test]
    fn test_orbit_limits() {
        let setup = SceneSetup::for_quality(QualityTier::High, Rarity::Rare, true);
        let limits = setup.orbit.unwrap();

        let far = setup.camera_position(Vec3::new(0.0, 0.0, 50.0));
        assert!((far.length() - limits.max_distance).abs() < 1e-4);

        let behind = setup.camera_position(Vec3::new(5.0, 0.0, 0.0));
        assert!((behind.z / behind.length() - limits.max_angle.cos()).abs() < 1e-4);

        let free = SceneSetup::for_quality(QualityTier::High, Rarity::Rare, false);
        assert_eq!(free.camera_position(Vec3::new(0.0, 0.0, 50.0)), Vec3::new(0.0, 0.0, 50.0));
    }

    #[test]
    fn test_visible_extent() {
        let (w, h) = CameraRig::default().visible_extent(5.0, 0.5);
        assert!((h - 2.0 * 5.0 * (22.5f32).to_radians().tan()).abs() < 1e-4);
        assert!((w - h * 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_uniform_flags() {
        let pose = PoseState {
            rotation: Vec3::ZERO,
            position: Vec3::ZERO,
            scale: 1.0,
            is_hovered: false,
            is_flipped: false,
        };
        let ultra = SceneSetup::for_quality(QualityTier::Ultra, Rarity::Epic, false)
            .uniforms(&pose, Vec3::new(0.0, 0.0, 5.0), 1.0);
        assert_eq!(ultra.shadow[0], 1.0);
        assert_eq!(ultra.camera_pos[3], 1.0);
        assert_eq!(ultra.accent_pos[3], ACCENT_INTENSITY);

        let low = SceneSetup::for_quality(QualityTier::Low, Rarity::Epic, false)
            .uniforms(&pose, Vec3::new(0.0, 0.0, 5.0), 1.0);
        assert_eq!(low.shadow[0], 0.0);
        assert_eq!(low.camera_pos[3], 0.0);
        assert_eq!(low.accent_pos[3], 0.0);
    }
}
