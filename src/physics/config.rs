//! Integrator tuning

use super::state::{REST_CAMERA_DEPTH, REST_HUE};
use crate::{Result, SilkError};
use serde::Deserialize;

/// Hue marker per action
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HuePalette {
    pub stop: f32,
    pub expand: f32,
    pub focus: f32,
    pub swipe: f32,
    pub punch: f32,
    pub moving: f32,
    pub rest: f32,
}

impl Default for HuePalette {
    fn default() -> Self {
        Self {
            stop: 0.3,
            expand: 0.55,
            focus: 0.0,
            swipe: 0.75,
            punch: 0.15,
            moving: 0.45,
            rest: REST_HUE,
        }
    }
}

/// Configuration for [`MomentumIntegrator`](super::MomentumIntegrator)
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct IntegratorConfig {
    pub expansion_cap: f32,
    pub expansion_floor: f32,
    pub focus_cap: f32,

    /// Expansion added per open-palm event
    pub expand_rate: f32,
    /// Extra expansion per unit of depth
    pub depth_bonus: f32,
    /// Extra expansion per unit of positive approach speed
    pub approach_bonus: f32,

    /// Focus added per fist event while the hand holds still
    pub focus_rate_static: f32,
    /// Focus added per fist event while the hand moves
    pub focus_rate_moving: f32,

    pub warp_step: f32,
    pub warp_cap: f32,

    /// Swipe direction to momentum
    pub swipe_momentum_gain: f32,
    /// Momentum to angular velocity on the dominant axis
    pub swipe_angular_gain: f32,
    pub max_momentum: f32,

    /// Scene units per normalized hand unit for `move`
    pub position_range: f32,
    /// Absolute bound on target position components
    pub position_limit: f32,

    pub camera_base: f32,
    pub camera_min: f32,
    pub camera_max: f32,
    pub camera_expansion_gain: f32,
    pub camera_approach_gain: f32,
    pub camera_depth_gain: f32,
    pub camera_focus_gain: f32,

    /// Per-tick multiplier on momentum
    pub momentum_damping: f32,
    /// Per-tick multiplier on angular velocity
    pub angular_damping: f32,

    /// Current-to-target position factor
    pub position_lerp: f32,
    /// Camera interpolation factor bounds; the factor grows with distance
    pub camera_lerp_min: f32,
    pub camera_lerp_max: f32,
    /// Factor added per scene unit of remaining camera distance
    pub camera_lerp_gain: f32,

    /// Slow return-to-rest factor for expansion, focus, hue and camera target
    pub rest_lerp: f32,
    /// Return-to-rest factor for warp speed
    pub warp_rest_lerp: f32,

    /// Ticks without an event before the state starts returning to rest
    pub stale_ticks: u32,

    pub hues: HuePalette,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            expansion_cap: 3.0,
            expansion_floor: 0.5,
            focus_cap: 1.0,
            expand_rate: 0.05,
            depth_bonus: 0.05,
            approach_bonus: 1.0,
            focus_rate_static: 0.03,
            focus_rate_moving: 0.1,
            warp_step: 0.3,
            warp_cap: 1.0,
            swipe_momentum_gain: 50.0,
            swipe_angular_gain: 0.01,
            max_momentum: 5.0,
            position_range: 100.0,
            position_limit: 50.0,
            camera_base: REST_CAMERA_DEPTH,
            camera_min: 15.0,
            camera_max: 90.0,
            camera_expansion_gain: 10.0,
            camera_approach_gain: 100.0,
            camera_depth_gain: 10.0,
            camera_focus_gain: 20.0,
            momentum_damping: 0.98,
            angular_damping: 0.97,
            position_lerp: 0.05,
            camera_lerp_min: 0.03,
            camera_lerp_max: 0.25,
            camera_lerp_gain: 0.005,
            rest_lerp: 0.05,
            warp_rest_lerp: 0.02,
            stale_ticks: 30,
            hues: HuePalette::default(),
        }
    }
}

impl IntegratorConfig {
    /// Set the damping factors
    pub fn with_damping(mut self, momentum: f32, angular: f32) -> Self {
        self.momentum_damping = momentum;
        self.angular_damping = angular;
        self
    }

    /// Set the stale-event threshold
    pub fn with_stale_ticks(mut self, ticks: u32) -> Self {
        self.stale_ticks = ticks;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, v: f32| {
            if v > 0.0 && v < 1.0 {
                Ok(())
            } else {
                Err(SilkError::ConfigError(format!(
                    "{} must be within (0, 1), got {}",
                    name, v
                )))
            }
        };
        unit("momentum_damping", self.momentum_damping)?;
        unit("angular_damping", self.angular_damping)?;
        unit("position_lerp", self.position_lerp)?;
        unit("camera_lerp_min", self.camera_lerp_min)?;
        unit("camera_lerp_max", self.camera_lerp_max)?;
        unit("rest_lerp", self.rest_lerp)?;
        unit("warp_rest_lerp", self.warp_rest_lerp)?;

        if self.camera_lerp_min > self.camera_lerp_max {
            return Err(SilkError::ConfigError(
                "camera_lerp_min must not exceed camera_lerp_max".to_string(),
            ));
        }
        if !(self.camera_min <= self.camera_base && self.camera_base <= self.camera_max)
            || self.camera_min <= 0.0
        {
            return Err(SilkError::ConfigError(format!(
                "camera range must satisfy 0 < min <= base <= max, got {} / {} / {}",
                self.camera_min, self.camera_base, self.camera_max
            )));
        }
        if !(self.position_limit > 0.0) {
            return Err(SilkError::ConfigError(format!(
                "position_limit must be positive, got {}",
                self.position_limit
            )));
        }
        if !(self.expansion_floor <= 1.0 && 1.0 <= self.expansion_cap) {
            return Err(SilkError::ConfigError(
                "expansion floor/cap must bracket 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(IntegratorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_damping_out_of_range() {
        let config = IntegratorConfig::default().with_damping(1.0, 0.9);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_camera_range_checked() {
        let mut config = IntegratorConfig::default();
        config.camera_min = 60.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_position_limit_checked() {
        let mut config = IntegratorConfig::default();
        config.position_limit = -1.0;
        assert!(config.validate().is_err());
        config.position_limit = f32::NAN;
        assert!(config.validate().is_err());

        let config: IntegratorConfig = toml::from_str("position_limit = 0.0").unwrap();
        assert!(config.validate().is_err());
    }
}
