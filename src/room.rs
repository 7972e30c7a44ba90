//! Room actor and broadcast loop
//!
//! Each room runs as its own task. Membership changes and broadcasts are
//! routed through the same inbox, so the loop is the only code that ever
//! touches the member list and delivery order within a room is the order
//! events were enqueued.
//!
//! The loop waits on two sources at once: the inbox and the room's
//! cancellation token. Cancellation wins when both are ready.

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::error::{ChatError, SendError};
use crate::types::ConnectionId;

/// Events processed by a room's loop
#[derive(Debug)]
enum RoomEvent {
    /// Fan a payload out to every member except `exclude`
    Broadcast {
        payload: String,
        exclude: Option<ConnectionId>,
    },
    /// Add a member (no-op if already present)
    Join { conn: Connection },
    /// Remove a member (no-op if absent)
    Leave { id: ConnectionId },
    /// Snapshot of member usernames in registration order
    ListMembers { reply: oneshot::Sender<Vec<String>> },
}

/// Cloneable handle used to talk to a running room
#[derive(Debug, Clone)]
pub struct RoomHandle {
    name: String,
    inbox: mpsc::UnboundedSender<RoomEvent>,
    shutdown: CancellationToken,
}

impl RoomHandle {
    /// Room name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the room has received its termination signal
    pub fn is_terminated(&self) -> bool {
        self.shutdown.is_cancelled() || self.inbox.is_closed()
    }

    /// Queue a payload for broadcast
    ///
    /// Never waits. Fails with `RoomTerminated` once the room is deleted.
    pub fn enqueue(
        &self,
        payload: impl Into<String>,
        exclude: Option<ConnectionId>,
    ) -> Result<(), ChatError> {
        self.push(RoomEvent::Broadcast {
            payload: payload.into(),
            exclude,
        })
    }

    /// Add a connection to the room's membership
    pub fn join(&self, conn: Connection) -> Result<(), ChatError> {
        self.push(RoomEvent::Join { conn })
    }

    /// Remove a connection from the room's membership
    pub fn leave(&self, id: ConnectionId) -> Result<(), ChatError> {
        self.push(RoomEvent::Leave { id })
    }

    /// Usernames of the current members
    ///
    /// The snapshot reflects every event enqueued before this call.
    pub async fn list_members(&self) -> Result<Vec<String>, ChatError> {
        let (reply, rx) = oneshot::channel();
        self.push(RoomEvent::ListMembers { reply })?;
        rx.await.map_err(|_| self.terminated())
    }

    /// Signal the loop to stop
    pub(crate) fn terminate(&self) {
        self.shutdown.cancel();
    }

    fn push(&self, event: RoomEvent) -> Result<(), ChatError> {
        if self.shutdown.is_cancelled() {
            return Err(self.terminated());
        }
        self.inbox.send(event).map_err(|_| self.terminated())
    }

    fn terminated(&self) -> ChatError {
        ChatError::RoomTerminated(self.name.clone())
    }
}

/// A named broadcast group
///
/// Owned by its own task once spawned; all access goes through `RoomHandle`.
pub struct Room {
    name: String,
    /// Current members in registration order
    members: Vec<Connection>,
    inbox: mpsc::UnboundedReceiver<RoomEvent>,
    shutdown: CancellationToken,
}

impl Room {
    /// Create a room and the handle that feeds it
    pub fn new(name: impl Into<String>) -> (Self, RoomHandle) {
        let name = name.into();
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let room = Self {
            name: name.clone(),
            members: Vec::new(),
            inbox: rx,
            shutdown: shutdown.clone(),
        };
        let handle = RoomHandle {
            name,
            inbox: tx,
            shutdown,
        };
        (room, handle)
    }

    /// Create a room and spawn its loop on the current runtime
    pub fn spawn(name: impl Into<String>) -> RoomHandle {
        let (room, handle) = Self::new(name);
        tokio::spawn(room.run());
        handle
    }

    /// Run the broadcast loop until terminated
    pub async fn run(mut self) {
        debug!("Room {} loop started", self.name);

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    break;
                }
                event = self.inbox.recv() => {
                    match event {
                        Some(event) => self.handle_event(event),
                        None => break,
                    }
                }
            }
        }

        // Members left behind belong to their own connection lifecycle
        self.inbox.close();
        info!(
            "Room {} terminated with {} orphaned member(s)",
            self.name,
            self.members.len()
        );
    }

    fn handle_event(&mut self, event: RoomEvent) {
        match event {
            RoomEvent::Broadcast { payload, exclude } => {
                self.broadcast(&payload, exclude);
            }
            RoomEvent::Join { conn } => {
                if !self.contains(conn.id) {
                    debug!("Connection {} joined room {}", conn.id, self.name);
                    self.members.push(conn);
                }
            }
            RoomEvent::Leave { id } => {
                self.members.retain(|m| m.id != id);
            }
            RoomEvent::ListMembers { reply } => {
                let names = self.members.iter().map(|m| m.username.clone()).collect();
                let _ = reply.send(names);
            }
        }
    }

    /// Deliver one payload to every member but the excluded one
    ///
    /// Dead members are collected during the pass and removed afterwards.
    fn broadcast(&mut self, payload: &str, exclude: Option<ConnectionId>) {
        let mut dead = Vec::new();

        for member in &self.members {
            if Some(member.id) == exclude {
                continue;
            }
            match member.send(payload) {
                Ok(()) => {}
                Err(SendError::ChannelFull) => {
                    warn!(
                        "Dropped message to slow connection {} in room {}",
                        member.id, self.name
                    );
                }
                Err(SendError::ChannelClosed) => {
                    warn!(
                        "Send to connection {} in room {} failed, evicting",
                        member.id, self.name
                    );
                    dead.push(member.id);
                }
            }
        }

        if !dead.is_empty() {
            self.members.retain(|m| !dead.contains(&m.id));
        }
    }

    fn contains(&self, id: ConnectionId) -> bool {
        self.members.iter().any(|m| m.id == id)
    }
}
