//! WebSocket connection handler
//!
//! Handles individual client connections: WebSocket handshake (reading the
//! username from the upgrade request), line dispatch through a `Session`,
//! and a writer task draining the connection's outbound queue.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info};

use crate::auth::RoleResolver;
use crate::config::{Config, QuoteFailurePolicy};
use crate::connection::{Connection, Outbound};
use crate::error::ChatError;
use crate::quote::QuoteGateway;
use crate::registry::RegistryHandle;
use crate::session::Session;
use crate::types::ConnectionId;

/// Shared collaborators handed to every connection
#[derive(Clone)]
pub struct ServerState {
    pub registry: RegistryHandle,
    pub gateway: Arc<dyn QuoteGateway>,
    pub roles: Arc<RoleResolver>,
    pub on_quote_failure: QuoteFailurePolicy,
    pub outbound_buffer: usize,
}

impl ServerState {
    pub fn new(config: &Config, registry: RegistryHandle, gateway: Arc<dyn QuoteGateway>) -> Self {
        Self {
            registry,
            gateway,
            roles: Arc::new(RoleResolver::new(config.admins.iter().cloned())),
            on_quote_failure: config.quote.on_failure,
            outbound_buffer: config.outbound_buffer.max(1),
        }
    }
}

/// Handle a new TCP connection
///
/// Performs WebSocket handshake, dispatches inbound lines until the client
/// goes away, then leaves the current room.
pub async fn handle_connection(stream: TcpStream, state: ServerState) -> Result<(), ChatError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    // WebSocket handshake
    let mut username = String::new();
    let ws_stream = tokio_tungstenite::accept_hdr_async(
        stream,
        |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            username = username_from_query(req.uri().query());
            Ok(resp)
        },
    )
    .await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let conn_id = ConnectionId::new();
    let user = state.roles.resolve(&username);
    info!(
        "Connection {} from {} as {}",
        conn_id,
        peer_addr,
        user.display_name()
    );

    // Channel for server -> client frames
    let (msg_tx, mut msg_rx) = mpsc::channel::<Outbound>(state.outbound_buffer);
    let conn = Connection::new(conn_id, username, msg_tx);
    let mut session = Session::new(
        conn.clone(),
        user,
        state.registry.clone(),
        state.gateway.clone(),
        state.on_quote_failure,
    );

    // Spawn write task (Outbound -> WebSocket)
    let mut write_task = tokio::spawn(async move {
        while let Some(frame) = msg_rx.recv().await {
            match frame {
                Outbound::Text(text) => {
                    if ws_sender.send(Message::Text(text.into())).await.is_err() {
                        debug!("WebSocket send failed, ending write task");
                        break;
                    }
                }
                Outbound::Close => break,
            }
        }
        debug!("Write task ended for {}", conn_id);

        // Send close frame when done
        let _ = ws_sender.close().await;
    });

    // Read loop (WebSocket -> Session) until the client or the writer stops
    loop {
        tokio::select! {
            msg_result = ws_receiver.next() => {
                match msg_result {
                    Some(Ok(Message::Text(text))) => {
                        session.handle_line(&text).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("Client {} closed the connection", conn_id);
                        break;
                    }
                    Some(Ok(Message::Ping(_))) => {
                        // Pong is handled automatically by tungstenite
                        debug!("Ping from {}", conn_id);
                    }
                    Some(Ok(_)) => {
                        // Binary and other frame types are ignored
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error for {}: {}", conn_id, e);
                        break;
                    }
                }
            }
            _ = &mut write_task => {
                debug!("Write task completed for {}", conn_id);
                break;
            }
        }
    }

    session.close();
    conn.close();

    info!("Connection {} disconnected", conn_id);

    Ok(())
}

/// Extract `username` from a query string such as `username=alice&x=1`
fn username_from_query(query: Option<&str>) -> String {
    query
        .into_iter()
        .flat_map(|q| q.split('&'))
        .find_map(|pair| pair.strip_prefix("username="))
        .map(|raw| {
            urlencoding::decode(&raw.replace('+', " "))
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        })
        .unwrap_or_default()
}
