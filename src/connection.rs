//! Connection handle definition
//!
//! Represents one connected client as seen by rooms: its identity and the
//! outbound channel drained by the connection's writer task.

use std::time::Instant;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::SendError;
use crate::types::ConnectionId;

/// Frame queued for delivery to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// One UTF-8 text frame
    Text(String),
    /// Ask the writer task to close the socket
    Close,
}

/// Handle to a connected client
///
/// Cheap to clone; every clone feeds the same outbound channel.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Unique identifier for this connection
    pub id: ConnectionId,
    /// Username (empty for anonymous connections)
    pub username: String,
    /// Connection time
    pub joined_at: Instant,
    /// Server → Client frame channel
    sender: mpsc::Sender<Outbound>,
}

impl Connection {
    /// Create a new connection handle with the given ID and sender channel
    pub fn new(id: ConnectionId, username: impl Into<String>, sender: mpsc::Sender<Outbound>) -> Self {
        Self {
            id,
            username: username.into(),
            joined_at: Instant::now(),
            sender,
        }
    }

    /// Queue a text frame for this client
    ///
    /// Never waits: a full queue drops the frame and reports `ChannelFull`,
    /// a closed queue (writer gone) reports `ChannelClosed`.
    pub fn send(&self, text: impl Into<String>) -> Result<(), SendError> {
        self.sender
            .try_send(Outbound::Text(text.into()))
            .map_err(|e| match e {
                TrySendError::Full(_) => SendError::ChannelFull,
                TrySendError::Closed(_) => SendError::ChannelClosed,
            })
    }

    /// Ask the writer task to close the socket
    ///
    /// Never waits; if the queue is full the writer still stops once every
    /// handle to this connection is dropped.
    pub fn close(&self) {
        let _ = self.sender.try_send(Outbound::Close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_delivers_text() {
        let (tx, mut rx) = mpsc::channel(4);
        let conn = Connection::new(ConnectionId::new(), "alice", tx);

        conn.send("hello").unwrap();

        assert_eq!(rx.recv().await, Some(Outbound::Text("hello".to_string())));
    }

    #[tokio::test]
    async fn test_send_to_dropped_receiver_is_closed() {
        let (tx, rx) = mpsc::channel(4);
        let conn = Connection::new(ConnectionId::new(), "alice", tx);
        drop(rx);

        assert!(matches!(conn.send("hello"), Err(SendError::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_send_to_full_queue_is_dropped() {
        let (tx, _rx) = mpsc::channel(1);
        let conn = Connection::new(ConnectionId::new(), "alice", tx);

        conn.send("first").unwrap();

        assert!(matches!(conn.send("second"), Err(SendError::ChannelFull)));
    }

    #[tokio::test]
    async fn test_close_follows_pending_text() {
        let (tx, mut rx) = mpsc::channel(4);
        let conn = Connection::new(ConnectionId::new(), "", tx);

        conn.send("bye").unwrap();
        conn.close();

        assert_eq!(rx.recv().await, Some(Outbound::Text("bye".to_string())));
        assert_eq!(rx.recv().await, Some(Outbound::Close));
    }

    #[tokio::test]
    async fn test_close_on_full_queue_does_not_wait() {
        let (tx, mut rx) = mpsc::channel(1);
        let conn = Connection::new(ConnectionId::new(), "", tx);

        conn.send("pending").unwrap();
        conn.close();

        assert_eq!(rx.recv().await, Some(Outbound::Text("pending".to_string())));
    }
}
