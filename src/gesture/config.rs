//! Gesture classifier configuration
//!
//! Thresholds are tuned against MediaPipe-style normalized landmarks. Two
//! earlier calibrations disagreed on the fist/open split, so everything here
//! is meant to be overridden from the config file.

use crate::{Result, SilkError};
use serde::Deserialize;

/// Upper bound on the velocity averaging window
pub const MAX_VELOCITY_HISTORY: usize = 10;

/// Configuration for [`GestureClassifier`](super::GestureClassifier)
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Average finger extension below this is a fist
    pub fist_threshold: f32,

    /// Average finger extension above this is an open palm
    pub open_threshold: f32,

    /// Enable the index-finger "stop" pose
    pub detect_stop: bool,

    /// Tip-to-base distance that counts as an extended finger
    pub finger_extended_threshold: f32,

    /// Averaged planar speed above this is a swipe
    pub swipe_speed_threshold: f32,

    /// Averaged planar speed above this (and below swipe) is a move
    pub move_speed_threshold: f32,

    /// Averaged approach speed above this on a closed hand is a punch
    pub punch_approach_threshold: f32,

    /// Per-sample planar displacement clamp (rejects detector spikes)
    pub max_step: f32,

    /// Samples averaged for planar velocity
    pub velocity_history: usize,

    /// Samples averaged for approach speed
    pub depth_history: usize,

    /// Consecutive identical raw labels required before reporting
    pub stability_count: u32,

    /// Minimum time between two reported label changes
    pub min_debounce_ms: u64,

    /// Raw z mapped to depth 1.0
    pub near_z: f32,

    /// Raw z mapped to depth 0.0
    pub far_z: f32,

    /// Planar speed under which the hand counts as static
    pub static_speed: f32,

    /// Approach speed magnitude under which the hand counts as static
    pub static_approach: f32,

    /// Time without a hand before `hand_present` drops
    pub hand_lost_grace_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            fist_threshold: 0.15,
            open_threshold: 0.25,
            detect_stop: true,
            finger_extended_threshold: 0.15,
            swipe_speed_threshold: 0.03,
            move_speed_threshold: 0.01,
            punch_approach_threshold: 0.02,
            max_step: 0.15,
            velocity_history: 5,
            depth_history: 3,
            stability_count: 3,
            min_debounce_ms: 100,
            near_z: -0.2,
            far_z: 0.2,
            static_speed: 0.005,
            static_approach: 0.005,
            hand_lost_grace_ms: 300,
        }
    }
}

impl GestureConfig {
    /// Set the fist/open split
    pub fn with_thresholds(mut self, fist: f32, open: f32) -> Self {
        self.fist_threshold = fist;
        self.open_threshold = open;
        self
    }

    /// Set the debounce gate
    pub fn with_debounce(mut self, stability_count: u32, min_debounce_ms: u64) -> Self {
        self.stability_count = stability_count;
        self.min_debounce_ms = min_debounce_ms;
        self
    }

    /// Set the hand-lost grace period
    pub fn with_grace_ms(mut self, grace_ms: u64) -> Self {
        self.hand_lost_grace_ms = grace_ms;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.fist_threshold < self.open_threshold) {
            return Err(SilkError::ConfigError(format!(
                "fist_threshold ({}) must be below open_threshold ({})",
                self.fist_threshold, self.open_threshold
            )));
        }
        if self.move_speed_threshold > self.swipe_speed_threshold {
            return Err(SilkError::ConfigError(
                "move_speed_threshold must not exceed swipe_speed_threshold".to_string(),
            ));
        }
        if self.stability_count == 0 {
            return Err(SilkError::ConfigError(
                "stability_count must be at least 1".to_string(),
            ));
        }
        if self.velocity_history == 0 || self.velocity_history > MAX_VELOCITY_HISTORY {
            return Err(SilkError::ConfigError(format!(
                "velocity_history must be within 1..={}",
                MAX_VELOCITY_HISTORY
            )));
        }
        if self.depth_history == 0 {
            return Err(SilkError::ConfigError(
                "depth_history must be at least 1".to_string(),
            ));
        }
        if (self.far_z - self.near_z).abs() < f32::EPSILON {
            return Err(SilkError::ConfigError(
                "near_z and far_z must differ".to_string(),
            ));
        }
        Ok(())
    }
}
