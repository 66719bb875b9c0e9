//! Configuration for the integration layer
//!
//! Provides centralized configuration for all components. Every section is
//! `#[serde(default)]`, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! [gesture]
//! stability_count = 4
//!
//! [sync]
//! server_url = "ws://192.168.1.20:8081"
//! ```

use crate::gesture::GestureConfig;
use crate::physics::IntegratorConfig;
use crate::sync::SyncConfig;
use crate::{Result, SilkError};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Environment variable naming a TOML config file
pub const CONFIG_ENV: &str = "SILK_CONFIG";

/// Frame loop and detector feed settings
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Ticks per second of the frame loop
    pub frame_rate: u32,

    /// Drive the classifier from the simulated detector
    pub simulate: bool,

    /// Frames per second produced by the simulated detector
    pub detector_fps: u32,

    /// Duration of each simulated gesture phase
    pub simulation_phase_ms: u64,

    /// Capacity of the detector frame queue
    pub frame_queue: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60,
            simulate: true,
            detector_fps: 30,
            simulation_phase_ms: 4000,
            frame_queue: 64,
        }
    }
}

impl OrchestratorConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate.max(1) as f64)
    }
}

/// Configuration for the complete client
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SilkConfig {
    pub gesture: GestureConfig,
    pub integrator: IntegratorConfig,
    pub sync: SyncConfig,
    pub orchestrator: OrchestratorConfig,
}

impl SilkConfig {
    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            SilkError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: SilkConfig = toml::from_str(&text)?;
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from `$SILK_CONFIG` if set, defaults otherwise
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.is_empty() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Set the sync configuration
    pub fn with_sync(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }

    /// Set the gesture configuration
    pub fn with_gesture(mut self, gesture: GestureConfig) -> Self {
        self.gesture = gesture;
        self
    }

    /// Set the integrator configuration
    pub fn with_integrator(mut self, integrator: IntegratorConfig) -> Self {
        self.integrator = integrator;
        self
    }

    /// Run without a sync server
    pub fn standalone(mut self) -> Self {
        self.sync.enabled = false;
        self
    }

    /// Feed the classifier externally instead of from the simulator
    pub fn without_simulation(mut self) -> Self {
        self.orchestrator.simulate = false;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.gesture.validate()?;
        self.integrator.validate()?;
        self.sync.validate()?;

        if self.orchestrator.frame_rate == 0 {
            return Err(SilkError::ConfigError(
                "frame_rate must be positive".to_string(),
            ));
        }
        if self.orchestrator.simulate && self.orchestrator.detector_fps == 0 {
            return Err(SilkError::ConfigError(
                "detector_fps must be positive".to_string(),
            ));
        }
        if self.orchestrator.frame_queue == 0 {
            return Err(SilkError::ConfigError(
                "frame_queue must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SilkConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.sync.enabled);
        assert_eq!(config.orchestrator.frame_rate, 60);
    }

    #[test]
    fn test_config_builder() {
        let config = SilkConfig::default().standalone().without_simulation();
        assert!(!config.sync.enabled);
        assert!(!config.orchestrator.simulate);
    }

    #[test]
    fn test_partial_toml() {
        let config: SilkConfig = toml::from_str(
            r#"
            [gesture]
            stability_count = 4

            [orchestrator]
            frame_rate = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.gesture.stability_count, 4);
        assert_eq!(config.orchestrator.frame_rate, 30);
        assert_eq!(config.orchestrator.detector_fps, 30);
        assert_eq!(config.sync.reconnect_delay_ms, 3000);
    }

    #[test]
    fn test_load_missing_file() {
        let err = SilkConfig::load("/nonexistent/silk.toml").unwrap_err();
        assert!(matches!(err, SilkError::ConfigError(_)));
    }

    #[test]
    fn test_zero_frame_rate_rejected() {
        let mut config = SilkConfig::default();
        config.orchestrator.frame_rate = 0;
        assert!(config.validate().is_err());
    }
}
