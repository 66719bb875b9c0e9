//! Error types for Liquid Silk
//!
//! Only setup and channel plumbing return these. Per-frame paths (gesture
//! classification, integration, hub message handling) absorb bad input and
//! keep going.

use thiserror::Error;

/// Liquid Silk errors
#[derive(Error, Debug, Clone)]
pub enum SilkError {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// File system I/O error
    #[error("IO error: {0}")]
    IOError(String),

    /// Malformed or unknown sync message
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// Socket connect/accept/send failure
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Channel communication error
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// Frame loop error
    #[error("Orchestrator error: {0}")]
    OrchestratorError(String),
}

impl From<std::io::Error> for SilkError {
    fn from(e: std::io::Error) -> Self {
        SilkError::IOError(e.to_string())
    }
}

impl From<serde_json::Error> for SilkError {
    fn from(e: serde_json::Error) -> Self {
        SilkError::ProtocolError(e.to_string())
    }
}

impl From<toml::de::Error> for SilkError {
    fn from(e: toml::de::Error) -> Self {
        SilkError::ConfigError(e.to_string())
    }
}

impl SilkError {
    /// Check if this error is recoverable
    ///
    /// Recoverable errors leave the frame loop and the sync worker running.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SilkError::ConfigError(_) => false,
            SilkError::IOError(_) => false,
            // Dropped with a log line, connection stays open
            SilkError::ProtocolError(_) => true,
            // Handled by reconnecting
            SilkError::TransportError(_) => true,
            SilkError::ChannelError(_) => false,
            // Worker threads could not be started
            SilkError::OrchestratorError(_) => false,
        }
    }

    /// Get a user-friendly description of the error
    pub fn user_message(&self) -> String {
        match self {
            SilkError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            SilkError::IOError(_) => "File system error occurred.".to_string(),
            SilkError::ProtocolError(_) => {
                "Received an unexpected sync message. It was ignored.".to_string()
            }
            SilkError::TransportError(_) => {
                "Sync connection lost. Reconnecting...".to_string()
            }
            SilkError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            SilkError::OrchestratorError(_) => {
                "Animation loop error occurred.".to_string()
            }
        }
    }
}

/// Result type alias for Liquid Silk operations
pub type Result<T> = std::result::Result<T, SilkError>;
