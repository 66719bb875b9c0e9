//! Server-side arbitration
//!
//! The hub owns every connection's role and the authoritative
//! [`PhysicalState`]. All role changes happen under one lock, so there is no
//! window in which two connections are master. Writes from anything but the
//! current master are dropped without an error reply.
//!
//! Outboxes are unbounded and fire-and-forget: a slow slave just sees newer
//! `state-sync` messages supersede older ones.

use super::config::ElectionPolicy;
use super::protocol::{Role, SyncMessage};
use crate::physics::PhysicalState;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Identifies one client connection
pub type ConnectionId = Uuid;

/// Sending half of a connection's outbound queue
pub type Outbox = UnboundedSender<SyncMessage>;

/// What the hub did with an inbound message
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HubOutcome {
    /// Connection is now master; these were demoted
    Promoted { demoted: Vec<ConnectionId> },
    /// Mastership request refused (claim-unheld policy)
    ClaimRefused { holder: ConnectionId },
    /// State stored and re-broadcast to this many slaves
    StateStored { recipients: usize },
    /// Dropped; the reason is logged
    Ignored,
}

struct Connection {
    role: Role,
    outbox: Outbox,
}

struct HubInner {
    connections: HashMap<ConnectionId, Connection>,
    state: PhysicalState,
}

/// Shared connection registry and authoritative state
#[derive(Clone)]
pub struct SyncHub {
    inner: Arc<Mutex<HubInner>>,
    policy: ElectionPolicy,
}

impl SyncHub {
    pub fn new(policy: ElectionPolicy) -> Self {
        Self::with_state(policy, PhysicalState::default())
    }

    /// Start from a known state instead of the default
    pub fn with_state(policy: ElectionPolicy, state: PhysicalState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HubInner {
                connections: HashMap::new(),
                state,
            })),
            policy,
        }
    }

    /// Register a connection as slave and push `init-sync` to it
    pub fn connect(&self, outbox: Outbox) -> ConnectionId {
        let id = Uuid::new_v4();
        let mut inner = self.inner.lock();
        let _ = outbox.send(SyncMessage::InitSync(inner.state));
        inner.connections.insert(
            id,
            Connection {
                role: Role::Slave,
                outbox,
            },
        );
        info!(
            "Client {} connected, {} connection(s)",
            id,
            inner.connections.len()
        );
        id
    }

    /// Forget a connection
    ///
    /// A departing master simply frees the slot; nobody is promoted and the
    /// authoritative state is kept for the next `init-sync`.
    pub fn disconnect(&self, id: ConnectionId) {
        let mut inner = self.inner.lock();
        if let Some(conn) = inner.connections.remove(&id) {
            info!(
                "Client {} ({}) disconnected, {} connection(s)",
                id,
                conn.role,
                inner.connections.len()
            );
        }
    }

    /// Decode and handle one text frame; malformed frames are dropped
    pub fn handle_text(&self, id: ConnectionId, text: &str) -> HubOutcome {
        match SyncMessage::decode(text) {
            Ok(msg) => self.handle(id, msg),
            Err(e) => {
                warn!("Dropping message from {}: {}", id, e);
                HubOutcome::Ignored
            }
        }
    }

    /// Handle one decoded message from `id`
    pub fn handle(&self, id: ConnectionId, msg: SyncMessage) -> HubOutcome {
        debug!("Received {} from {}", msg.type_name(), id);
        let mut inner = self.inner.lock();
        if !inner.connections.contains_key(&id) {
            warn!("Message from unknown connection {}", id);
            return HubOutcome::Ignored;
        }

        match msg {
            SyncMessage::ApplyMaster => self.apply_master(&mut inner, id),
            SyncMessage::StateUpdate(state) => {
                let is_master = inner
                    .connections
                    .get(&id)
                    .is_some_and(|c| c.role.is_master());
                if !is_master {
                    debug!("Ignoring state-update from non-master {}", id);
                    return HubOutcome::Ignored;
                }
                inner.state = state;
                let mut recipients = 0;
                for conn in inner.connections.values().filter(|c| c.role == Role::Slave) {
                    if conn.outbox.send(SyncMessage::StateSync(state)).is_ok() {
                        recipients += 1;
                    }
                }
                HubOutcome::StateStored { recipients }
            }
            other => {
                warn!(
                    "Ignoring server-bound {} from {}",
                    other.type_name(),
                    id
                );
                HubOutcome::Ignored
            }
        }
    }

    fn apply_master(&self, inner: &mut HubInner, id: ConnectionId) -> HubOutcome {
        let holder = inner
            .connections
            .iter()
            .find(|(other, c)| **other != id && c.role.is_master())
            .map(|(other, _)| *other);

        if let (ElectionPolicy::ClaimUnheld, Some(holder)) = (self.policy, holder) {
            info!("Refusing mastership for {}: held by {}", id, holder);
            return HubOutcome::ClaimRefused { holder };
        }

        let mut demoted = Vec::new();
        for (other, conn) in inner.connections.iter_mut() {
            if *other != id && conn.role.is_master() {
                conn.role = Role::Slave;
                demoted.push(*other);
            }
        }
        if let Some(conn) = inner.connections.get_mut(&id) {
            conn.role = Role::Master;
            let _ = conn.outbox.send(SyncMessage::MasterOk);
        }
        info!("Client {} is now master", id);
        HubOutcome::Promoted { demoted }
    }

    /// Role of a connection
    pub fn role_of(&self, id: ConnectionId) -> Option<Role> {
        self.inner.lock().connections.get(&id).map(|c| c.role)
    }

    /// Current master, if any
    pub fn master_id(&self) -> Option<ConnectionId> {
        self.inner
            .lock()
            .connections
            .iter()
            .find(|(_, c)| c.role.is_master())
            .map(|(id, _)| *id)
    }

    /// Number of live connections
    pub fn client_count(&self) -> usize {
        self.inner.lock().connections.len()
    }

    /// Last state accepted from a master
    pub fn authoritative_state(&self) -> PhysicalState {
        self.inner.lock().state
    }

    pub fn policy(&self) -> ElectionPolicy {
        self.policy
    }
}

impl Default for SyncHub {
    fn default() -> Self {
        Self::new(ElectionPolicy::default())
    }
}
