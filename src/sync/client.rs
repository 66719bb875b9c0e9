//! Sync client
//!
//! [`ClientSession`] is the protocol state machine with no I/O attached.
//! [`SyncClient`] drives it over a WebSocket, reconnecting forever with a
//! fixed delay, and mirrors the session into a [`SharedSyncState`] that the
//! frame loop reads. The frame loop talks back through a [`SyncLink`].

use super::config::SyncConfig;
use super::protocol::{Role, SyncMessage};
use super::shared::{SharedSyncState, SyncStatus};
use crate::physics::PhysicalState;
use crate::{Result, SilkError};
use futures::{SinkExt, StreamExt};
use std::thread::JoinHandle;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

type Socket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Commands from the frame loop to the network worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncCommand {
    /// Ask the server for mastership
    ApplyMaster,
    /// Close the socket and stop reconnecting
    Shutdown,
}

/// Client-side protocol state
#[derive(Debug, Default)]
pub struct ClientSession {
    status: SyncStatus,
}

impl ClientSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }

    pub fn role(&self) -> Role {
        self.status.role
    }

    pub fn on_connected(&mut self) {
        self.status.connected = true;
        self.status.role = Role::Slave;
    }

    /// Mastership never survives a dropped socket
    pub fn on_disconnected(&mut self) {
        self.status.connected = false;
        self.status.role = Role::Slave;
    }

    /// Apply one server message
    pub fn handle(&mut self, msg: SyncMessage) {
        match msg {
            SyncMessage::InitSync(state) => self.replace_shadow(state),
            SyncMessage::StateSync(state) => {
                // The server only re-broadcasts to slaves, so seeing one means
                // another client took over.
                if self.status.role.is_master() {
                    info!("Received state-sync while master, demoted");
                    self.status.role = Role::Slave;
                }
                self.replace_shadow(state);
            }
            SyncMessage::MasterOk => {
                info!("Mastership granted");
                self.status.role = Role::Master;
            }
            other => warn!("Ignoring client-bound {}", other.type_name()),
        }
    }

    fn replace_shadow(&mut self, state: PhysicalState) {
        self.status.shadow = Some(state);
        self.status.generation += 1;
    }
}

/// Frame-loop side of a running [`SyncClient`]
#[derive(Clone)]
pub struct SyncLink {
    command_tx: mpsc::UnboundedSender<SyncCommand>,
    state_tx: watch::Sender<Option<PhysicalState>>,
    shared: SharedSyncState,
}

impl SyncLink {
    /// Request mastership; the answer shows up in [`SyncLink::status`]
    pub fn apply_master(&self) -> Result<()> {
        self.send(SyncCommand::ApplyMaster)
    }

    /// Offer the latest local state; only sent while master
    ///
    /// Older unsent states are overwritten.
    pub fn publish(&self, state: PhysicalState) {
        self.state_tx.send_replace(Some(state));
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(SyncCommand::Shutdown)
    }

    pub fn status(&self) -> SyncStatus {
        self.shared.snapshot()
    }

    pub fn shared(&self) -> SharedSyncState {
        self.shared.clone()
    }

    fn send(&self, cmd: SyncCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .map_err(|e| SilkError::ChannelError(format!("Sync worker gone: {}", e)))
    }
}

enum Exit {
    Disconnected,
    Shutdown,
}

/// WebSocket sync client
pub struct SyncClient {
    config: SyncConfig,
    session: ClientSession,
    shared: SharedSyncState,
    command_rx: mpsc::UnboundedReceiver<SyncCommand>,
    state_rx: watch::Receiver<Option<PhysicalState>>,
}

impl SyncClient {
    pub fn new(config: SyncConfig) -> (Self, SyncLink) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(None);
        let shared = SharedSyncState::new();

        let client = Self {
            config,
            session: ClientSession::new(),
            shared: shared.clone(),
            command_rx,
            state_rx,
        };
        let link = SyncLink {
            command_tx,
            state_tx,
            shared,
        };
        (client, link)
    }

    /// Run the client on a dedicated thread with its own runtime
    pub fn start_worker(self) -> Result<JoinHandle<()>> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SilkError::TransportError(format!("Runtime creation failed: {}", e)))?;

        let handle = std::thread::Builder::new()
            .name("sync-client".to_string())
            .spawn(move || {
                info!("Sync client worker starting");
                runtime.block_on(self.run());
                info!("Sync client worker stopped");
            })?;
        Ok(handle)
    }

    /// Connect, serve, and reconnect until shut down
    pub async fn run(mut self) {
        loop {
            match connect_async(self.config.server_url.as_str()).await {
                Ok((socket, _)) => {
                    info!("Connected to {}", self.config.server_url);
                    self.session.on_connected();
                    self.mirror();

                    let exit = self.serve(socket).await;

                    self.session.on_disconnected();
                    self.mirror();
                    if let Exit::Shutdown = exit {
                        return;
                    }
                    warn!(
                        "Disconnected, retrying in {}ms",
                        self.config.reconnect_delay_ms
                    );
                }
                Err(e) => {
                    debug!(
                        "Connect to {} failed: {}, retrying in {}ms",
                        self.config.server_url, e, self.config.reconnect_delay_ms
                    );
                }
            }

            if let Exit::Shutdown = self.wait_before_retry().await {
                return;
            }
        }
    }

    async fn wait_before_retry(&mut self) -> Exit {
        let deadline = Instant::now() + self.config.reconnect_delay();
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => return Exit::Disconnected,
                cmd = self.command_rx.recv() => match cmd {
                    Some(SyncCommand::ApplyMaster) => {
                        debug!("Not connected, dropping apply-master");
                    }
                    Some(SyncCommand::Shutdown) | None => return Exit::Shutdown,
                },
            }
        }
    }

    async fn serve(&mut self, socket: Socket) -> Exit {
        let (mut sink, mut stream) = socket.split();

        if self.config.claim_master {
            if let Err(e) = send(&mut sink, &SyncMessage::ApplyMaster).await {
                warn!("{}", e);
                return Exit::Disconnected;
            }
        }

        loop {
            tokio::select! {
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => match SyncMessage::decode(&text) {
                        Ok(msg) => {
                            debug!("Received {}", msg.type_name());
                            self.session.handle(msg);
                            self.mirror();
                        }
                        Err(e) => warn!("Dropping message from server: {}", e),
                    },
                    Some(Ok(Message::Close(_))) | None => return Exit::Disconnected,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Socket error: {}", e);
                        return Exit::Disconnected;
                    }
                },
                cmd = self.command_rx.recv() => match cmd {
                    Some(SyncCommand::ApplyMaster) => {
                        if let Err(e) = send(&mut sink, &SyncMessage::ApplyMaster).await {
                            warn!("{}", e);
                            return Exit::Disconnected;
                        }
                    }
                    Some(SyncCommand::Shutdown) | None => {
                        let _ = sink.close().await;
                        return Exit::Shutdown;
                    }
                },
                changed = self.state_rx.changed() => {
                    if changed.is_err() {
                        let _ = sink.close().await;
                        return Exit::Shutdown;
                    }
                    let latest = *self.state_rx.borrow_and_update();
                    if let (true, Some(state)) = (self.session.role().is_master(), latest) {
                        if let Err(e) = send(&mut sink, &SyncMessage::StateUpdate(state)).await {
                            warn!("{}", e);
                            return Exit::Disconnected;
                        }
                    }
                },
            }
        }
    }

    fn mirror(&self) {
        self.shared.store(self.session.status());
    }
}

async fn send<S>(sink: &mut S, msg: &SyncMessage) -> Result<()>
where
    S: futures::Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    let text = msg.encode().inspect_err(|e| error!("Encode failed: {}", e))?;
    sink.send(Message::Text(text))
        .await
        .map_err(|e| SilkError::TransportError(format!("Send failed: {}", e)))
}
