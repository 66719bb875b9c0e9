//! Sync wire protocol
//!
//! JSON text frames shaped `{type, data?, payload?}`:
//!
//! | type           | direction            | body              |
//! |----------------|----------------------|-------------------|
//! | `init-sync`    | server -> client     | `data`: state     |
//! | `state-sync`   | server -> slaves     | `data`: state     |
//! | `apply-master` | client -> server     | none              |
//! | `master-ok`    | server -> client     | none              |
//! | `state-update` | master -> server     | `payload`: state  |
//!
//! Decoding accepts the state under either key.

use crate::physics::PhysicalState;
use crate::{Result, SilkError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-connection role
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Master,
    #[default]
    Slave,
}

impl Role {
    pub fn is_master(&self) -> bool {
        matches!(self, Role::Master)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Master => write!(f, "master"),
            Role::Slave => write!(f, "slave"),
        }
    }
}

/// A decoded sync message
#[derive(Clone, Debug, PartialEq)]
pub enum SyncMessage {
    /// Current authoritative state, pushed on connect
    InitSync(PhysicalState),
    /// Re-broadcast of a master update
    StateSync(PhysicalState),
    /// Request mastership
    ApplyMaster,
    /// Mastership granted
    MasterOk,
    /// New authoritative state from the master
    StateUpdate(PhysicalState),
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
}

impl SyncMessage {
    /// Wire name of the message type
    pub fn type_name(&self) -> &'static str {
        match self {
            SyncMessage::InitSync(_) => "init-sync",
            SyncMessage::StateSync(_) => "state-sync",
            SyncMessage::ApplyMaster => "apply-master",
            SyncMessage::MasterOk => "master-ok",
            SyncMessage::StateUpdate(_) => "state-update",
        }
    }

    /// State carried by the message, if any
    pub fn state(&self) -> Option<&PhysicalState> {
        match self {
            SyncMessage::InitSync(s) | SyncMessage::StateSync(s) | SyncMessage::StateUpdate(s) => {
                Some(s)
            }
            SyncMessage::ApplyMaster | SyncMessage::MasterOk => None,
        }
    }

    /// Encode as a JSON text frame
    pub fn encode(&self) -> Result<String> {
        let (data, payload) = match self {
            SyncMessage::InitSync(s) | SyncMessage::StateSync(s) => {
                (Some(serde_json::to_value(s)?), None)
            }
            SyncMessage::StateUpdate(s) => (None, Some(serde_json::to_value(s)?)),
            SyncMessage::ApplyMaster | SyncMessage::MasterOk => (None, None),
        };
        let envelope = Envelope {
            kind: self.type_name().to_string(),
            data,
            payload,
        };
        Ok(serde_json::to_string(&envelope)?)
    }

    /// Decode a JSON text frame
    ///
    /// Unknown types and missing state bodies are protocol errors.
    pub fn decode(text: &str) -> Result<Self> {
        let envelope: Envelope = serde_json::from_str(text)?;
        let kind = envelope.kind.as_str();
        let state = || -> Result<PhysicalState> {
            let body = envelope
                .data
                .clone()
                .or_else(|| envelope.payload.clone())
                .ok_or_else(|| SilkError::ProtocolError(format!("{} without state", kind)))?;
            Ok(serde_json::from_value(body)?)
        };

        match kind {
            "init-sync" => Ok(SyncMessage::InitSync(state()?)),
            "state-sync" => Ok(SyncMessage::StateSync(state()?)),
            "apply-master" => Ok(SyncMessage::ApplyMaster),
            "master-ok" => Ok(SyncMessage::MasterOk),
            "state-update" => Ok(SyncMessage::StateUpdate(state()?)),
            other => Err(SilkError::ProtocolError(format!(
                "unknown message type: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_update_uses_payload() {
        let msg = SyncMessage::StateUpdate(PhysicalState::default().with_expansion(2.0));
        let value: Value = serde_json::from_str(&msg.encode().unwrap()).unwrap();
        assert_eq!(value["type"], "state-update");
        assert_eq!(value["payload"]["expansion"], 2.0);
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_init_sync_uses_data() {
        let value: Value =
            serde_json::from_str(&SyncMessage::InitSync(PhysicalState::default()).encode().unwrap())
                .unwrap();
        assert_eq!(value["type"], "init-sync");
        assert_eq!(value["data"]["expansion"], 1.0);
    }

    #[test]
    fn test_bare_messages() {
        assert_eq!(
            SyncMessage::MasterOk.encode().unwrap(),
            r#"{"type":"master-ok"}"#
        );
        assert_eq!(
            SyncMessage::decode(r#"{"type":"apply-master"}"#).unwrap(),
            SyncMessage::ApplyMaster
        );
    }

    #[test]
    fn test_decode_partial_state() {
        let msg = SyncMessage::decode(r#"{"type":"state-update","payload":{"expansion":2.0}}"#)
            .unwrap();
        let state = msg.state().unwrap();
        assert_eq!(state.expansion, 2.0);
        assert_eq!(state.focus, 0.0);
    }

    #[test]
    fn test_state_under_either_key() {
        let msg = SyncMessage::decode(r#"{"type":"state-sync","payload":{"hue":0.1}}"#).unwrap();
        assert!(matches!(msg, SyncMessage::StateSync(s) if (s.hue - 0.1).abs() < 1e-6));
    }

    #[test]
    fn test_protocol_errors() {
        assert!(matches!(
            SyncMessage::decode(r#"{"type":"teleport"}"#),
            Err(SilkError::ProtocolError(_))
        ));
        assert!(matches!(
            SyncMessage::decode(r#"{"type":"state-update"}"#),
            Err(SilkError::ProtocolError(_))
        ));
        assert!(SyncMessage::decode("not json").is_err());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::default(), Role::Slave);
        assert_eq!(Role::Master.to_string(), "master");
    }
}
