//! RoomRegistry actor implementation
//!
//! The authoritative room name → room directory. Runs as a single actor task
//! so creation, deletion and lookup are serialized without locks; callers
//! talk to it through a cloneable `RegistryHandle`.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::auth::Authorizer;
use crate::connection::Connection;
use crate::error::ChatError;
use crate::room::{Room, RoomHandle};
use crate::types::User;

/// Channel buffer size for registry commands
const CHANNEL_BUFFER_SIZE: usize = 256;

/// Commands sent from sessions to the registry actor
#[derive(Debug)]
pub enum RegistryCommand {
    /// Create a room and start its loop
    Create {
        name: String,
        requester: User,
        reply: oneshot::Sender<Result<RoomHandle, ChatError>>,
    },
    /// Terminate a room and forget it
    Delete {
        name: String,
        requester: User,
        reply: oneshot::Sender<Result<(), ChatError>>,
    },
    /// Look a room up by name
    Lookup {
        name: String,
        reply: oneshot::Sender<Option<RoomHandle>>,
    },
    /// Names of all registered rooms
    List {
        reply: oneshot::Sender<Vec<String>>,
    },
}

/// The registry actor
///
/// Every room reachable from `rooms` has a running loop.
pub struct RoomRegistry {
    /// All active rooms: name -> handle
    rooms: HashMap<String, RoomHandle>,
    authorizer: Arc<dyn Authorizer>,
    /// Command receiver channel
    receiver: mpsc::Receiver<RegistryCommand>,
}

impl RoomRegistry {
    /// Create a new registry with the given command receiver
    pub fn new(receiver: mpsc::Receiver<RegistryCommand>, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            rooms: HashMap::new(),
            authorizer,
            receiver,
        }
    }

    /// Create a registry, spawn its actor and return the handle
    pub fn spawn(authorizer: Arc<dyn Authorizer>) -> RegistryHandle {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        tokio::spawn(Self::new(rx, authorizer).run());
        RegistryHandle { sender: tx }
    }

    /// Run the registry event loop
    ///
    /// Continuously receives and processes commands until all handles are dropped.
    pub async fn run(mut self) {
        info!("RoomRegistry started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        for room in self.rooms.values() {
            room.terminate();
        }
        info!("RoomRegistry shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::Create {
                name,
                requester,
                reply,
            } => {
                let _ = reply.send(self.create_room(name, &requester));
            }
            RegistryCommand::Delete {
                name,
                requester,
                reply,
            } => {
                let _ = reply.send(self.delete_room(&name, &requester));
            }
            RegistryCommand::Lookup { name, reply } => {
                let _ = reply.send(self.rooms.get(&name).cloned());
            }
            RegistryCommand::List { reply } => {
                let mut names: Vec<String> = self.rooms.keys().cloned().collect();
                names.sort();
                let _ = reply.send(names);
            }
        }
    }

    fn create_room(&mut self, name: String, requester: &User) -> Result<RoomHandle, ChatError> {
        if !self.authorizer.can_manage_rooms(requester) {
            return Err(ChatError::Unauthorized);
        }
        if self.rooms.contains_key(&name) {
            return Err(ChatError::AlreadyExists(name));
        }

        let handle = Room::spawn(name.clone());
        self.rooms.insert(name.clone(), handle.clone());

        info!("{} created room {}", requester.display_name(), name);
        debug!("Total rooms: {}", self.rooms.len());
        Ok(handle)
    }

    fn delete_room(&mut self, name: &str, requester: &User) -> Result<(), ChatError> {
        if !self.authorizer.can_manage_rooms(requester) {
            return Err(ChatError::Unauthorized);
        }
        let Some(room) = self.rooms.remove(name) else {
            return Err(ChatError::NotFound(name.to_string()));
        };

        room.terminate();

        info!("{} deleted room {}", requester.display_name(), name);
        debug!("Total rooms: {}", self.rooms.len());
        Ok(())
    }
}

/// Cloneable handle to the registry actor
#[derive(Debug, Clone)]
pub struct RegistryHandle {
    sender: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    /// Create a room; fails with `Unauthorized` or `AlreadyExists`
    pub async fn create_room(&self, name: &str, requester: &User) -> Result<RoomHandle, ChatError> {
        self.request(|reply| RegistryCommand::Create {
            name: name.to_string(),
            requester: requester.clone(),
            reply,
        })
        .await?
    }

    /// Delete a room; fails with `Unauthorized` or `NotFound`
    ///
    /// Returns once the room is unreachable and signalled, without waiting
    /// for its loop to exit.
    pub async fn delete_room(&self, name: &str, requester: &User) -> Result<(), ChatError> {
        self.request(|reply| RegistryCommand::Delete {
            name: name.to_string(),
            requester: requester.clone(),
            reply,
        })
        .await?
    }

    /// Look a room up by name
    pub async fn lookup(&self, name: &str) -> Result<Option<RoomHandle>, ChatError> {
        self.request(|reply| RegistryCommand::Lookup {
            name: name.to_string(),
            reply,
        })
        .await
    }

    /// Add a connection to the named room; fails with `NotFound`
    pub async fn join(&self, name: &str, conn: Connection) -> Result<RoomHandle, ChatError> {
        let room = self
            .lookup(name)
            .await?
            .ok_or_else(|| ChatError::NotFound(name.to_string()))?;
        room.join(conn)?;
        Ok(room)
    }

    /// Sorted names of all registered rooms
    pub async fn room_names(&self) -> Result<Vec<String>, ChatError> {
        self.request(|reply| RegistryCommand::List { reply }).await
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> RegistryCommand,
    ) -> Result<T, ChatError> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(make(reply))
            .await
            .map_err(|_| ChatError::ChannelClosed)?;
        rx.await.map_err(|_| ChatError::ChannelClosed)
    }
}
