//! The shared physical-state vector
//!
//! This is what the renderer consumes and what the sync layer ships between
//! devices. It is replaced wholesale on every sync message, never merged, so
//! it is a plain `Copy` value.

use serde::{Deserialize, Serialize};

/// Camera distance at rest
pub const REST_CAMERA_DEPTH: f32 = 50.0;

/// Hue at rest
pub const REST_HUE: f32 = 0.6;

/// Minimal 3-vector
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn scale(self, k: f32) -> Self {
        Self::new(self.x * k, self.y * k, self.z * k)
    }

    pub fn add(self, other: Vec3) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Component-wise linear interpolation
    pub fn lerp(self, target: Vec3, factor: f32) -> Self {
        Self::new(
            lerp(self.x, target.x, factor),
            lerp(self.y, target.y, factor),
            lerp(self.z, target.z, factor),
        )
    }
}

/// Linear interpolation; never overshoots for `factor` in [0, 1]
pub fn lerp(current: f32, target: f32, factor: f32) -> f32 {
    current + (target - current) * factor
}

/// Simulation parameters driving the visual effect
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PhysicalState {
    /// Radial scale, 1.0 at rest
    pub expansion: f32,
    /// Contraction towards the centre, 0.0 at rest
    pub focus: f32,
    pub warp_speed: f32,
    pub momentum: Vec3,
    pub angular_velocity: Vec3,
    /// Integrated angular velocity
    pub rotation: Vec3,
    pub target_position: Vec3,
    pub current_position: Vec3,
    /// Current camera distance
    pub camera_depth: f32,
    /// Camera distance being approached
    pub camera_target: f32,
    pub hue: f32,
    pub is_stopped: bool,
}

impl Default for PhysicalState {
    fn default() -> Self {
        Self {
            expansion: 1.0,
            focus: 0.0,
            warp_speed: 0.0,
            momentum: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            rotation: Vec3::ZERO,
            target_position: Vec3::ZERO,
            current_position: Vec3::ZERO,
            camera_depth: REST_CAMERA_DEPTH,
            camera_target: REST_CAMERA_DEPTH,
            hue: REST_HUE,
            is_stopped: false,
        }
    }
}

impl PhysicalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set expansion (builder style, mostly for tests and seeding)
    pub fn with_expansion(mut self, expansion: f32) -> Self {
        self.expansion = expansion;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_does_not_overshoot() {
        let mut v = 0.0;
        for _ in 0..100 {
            let next = lerp(v, 1.0, 0.3);
            assert!(next >= v && next <= 1.0);
            v = next;
        }
    }

    #[test]
    fn test_camel_case_wire_names() {
        let json = serde_json::to_value(PhysicalState::default()).unwrap();
        assert!(json.get("warpSpeed").is_some());
        assert!(json.get("angularVelocity").is_some());
        assert!(json.get("isStopped").is_some());
    }

    #[test]
    fn test_partial_state_fills_defaults() {
        let state: PhysicalState = serde_json::from_str(r#"{"expansion":2.0}"#).unwrap();
        assert_eq!(state.expansion, 2.0);
        assert_eq!(state.camera_depth, REST_CAMERA_DEPTH);
        assert_eq!(state.momentum, Vec3::ZERO);
    }

    #[test]
    fn test_vec3_ops() {
        let v = Vec3::new(3.0, 4.0, 0.0);
        assert_eq!(v.length(), 5.0);
        assert_eq!(v.scale(2.0), Vec3::new(6.0, 8.0, 0.0));
        assert_eq!(v.add(Vec3::new(1.0, 1.0, 1.0)), Vec3::new(4.0, 5.0, 1.0));
    }
}
