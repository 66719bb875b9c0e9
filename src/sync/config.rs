//! Sync service configuration

use crate::{Result, SilkError};
use serde::Deserialize;
use std::time::Duration;

/// How `apply-master` is arbitrated while another connection is master
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectionPolicy {
    /// The requester wins; every other connection is demoted
    #[default]
    Preempt,
    /// Only an unclaimed slot can be taken; requests are ignored otherwise
    ClaimUnheld,
}

/// Configuration for the sync server and client
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Whether the client connects at all (standalone otherwise)
    pub enabled: bool,

    /// Server address the client dials
    pub server_url: String,

    /// Address the server listens on
    pub bind_addr: String,

    /// Fixed delay between reconnection attempts
    pub reconnect_delay_ms: u64,

    pub election: ElectionPolicy,

    /// Send `apply-master` after every successful connect
    pub claim_master: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            server_url: "ws://127.0.0.1:8081".to_string(),
            bind_addr: "0.0.0.0:8081".to_string(),
            reconnect_delay_ms: 3000,
            election: ElectionPolicy::Preempt,
            claim_master: false,
        }
    }
}

impl SyncConfig {
    /// Set the server URL
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// Set the listen address
    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Set the reconnection delay
    pub fn with_reconnect_delay_ms(mut self, delay: u64) -> Self {
        self.reconnect_delay_ms = delay;
        self
    }

    /// Set the election policy
    pub fn with_election(mut self, election: ElectionPolicy) -> Self {
        self.election = election;
        self
    }

    /// Claim mastership on every (re)connect
    pub fn claiming_master(mut self) -> Self {
        self.claim_master = true;
        self
    }

    /// Disable syncing (standalone mode)
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Replace the port of `bind_addr`
    pub fn with_port(mut self, port: u16) -> Self {
        let host = self
            .bind_addr
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| self.bind_addr.clone());
        self.bind_addr = format!("{}:{}", host, port);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.enabled
            && !(self.server_url.starts_with("ws://") || self.server_url.starts_with("wss://"))
        {
            return Err(SilkError::ConfigError(format!(
                "server_url must be a ws:// or wss:// URL, got {}",
                self.server_url
            )));
        }
        if self.reconnect_delay_ms == 0 {
            return Err(SilkError::ConfigError(
                "reconnect_delay_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
