//! Single-master state synchronization
//!
//! One server ([`SyncHub`] behind a [`SyncServer`]) arbitrates which client
//! is master and re-broadcasts the master's state to everyone else. Clients
//! run a [`SyncClient`] on a background thread and talk to it through a
//! [`SyncLink`].

pub mod client;
pub mod config;
pub mod hub;
pub mod protocol;
pub mod server;
pub mod shared;

pub use client::{ClientSession, SyncClient, SyncCommand, SyncLink};
pub use config::{ElectionPolicy, SyncConfig};
pub use hub::{ConnectionId, HubOutcome, SyncHub};
pub use protocol::{Role, SyncMessage};
pub use server::SyncServer;
pub use shared::{SharedSyncState, SyncStatus};
