//! WebSocket front end for a [`SyncHub`]

use super::hub::{ConnectionId, SyncHub};
use super::protocol::SyncMessage;
use crate::{Result, SilkError};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// Accepts WebSocket clients and feeds them to a hub
pub struct SyncServer {
    listener: TcpListener,
    hub: SyncHub,
}

impl SyncServer {
    /// Bind the listening socket
    pub async fn bind(addr: &str, hub: SyncHub) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| SilkError::TransportError(format!("Failed to bind {}: {}", addr, e)))?;
        Ok(Self { listener, hub })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn hub(&self) -> SyncHub {
        self.hub.clone()
    }

    /// Accept connections forever; failed accepts are logged and skipped
    pub async fn run(self) -> Result<()> {
        info!("Sync server listening on {}", self.local_addr()?);
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("Accept failed: {}", e);
                    continue;
                }
            };
            let hub = self.hub.clone();
            tokio::spawn(async move {
                if let Err(e) = serve_connection(stream, peer, hub).await {
                    debug!("Connection {} ended: {}", peer, e);
                }
            });
        }
    }
}

async fn serve_connection(stream: TcpStream, peer: SocketAddr, hub: SyncHub) -> Result<()> {
    let socket = tokio_tungstenite::accept_async(stream)
        .await
        .map_err(|e| SilkError::TransportError(format!("Handshake with {} failed: {}", peer, e)))?;
    let (mut sink, mut stream) = socket.split();

    let (outbox, mut outbox_rx) = mpsc::unbounded_channel::<SyncMessage>();
    let id = hub.connect(outbox);
    debug!("Peer {} is connection {}", peer, id);

    let writer = tokio::spawn(async move {
        while let Some(msg) = outbox_rx.recv().await {
            let text = match msg.encode() {
                Ok(text) => text,
                Err(e) => {
                    error!("Encode failed: {}", e);
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Text(text)).await {
                debug!("Write to {} failed: {}", id, e);
                break;
            }
        }
        let _ = sink.close().await;
    });

    let result = read_loop(&mut stream, id, &hub).await;

    hub.disconnect(id);
    writer.abort();
    result
}

async fn read_loop<S>(stream: &mut S, id: ConnectionId, hub: &SyncHub) -> Result<()>
where
    S: futures::Stream<Item = std::result::Result<Message, tokio_tungstenite::tungstenite::Error>>
        + Unpin,
{
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                hub.handle_text(id, &text);
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(SilkError::TransportError(format!(
                    "Read from {} failed: {}",
                    id, e
                )))
            }
        }
    }
    Ok(())
}
