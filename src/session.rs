//! Per-connection command dispatch
//!
//! A `Session` is the state behind one connection: who it acts as and which
//! room it is currently in. Each inbound line is parsed into a `Command` and
//! applied; errors go back to this connection only.

use std::sync::Arc;

use tracing::{debug, info};

use crate::command::Command;
use crate::config::QuoteFailurePolicy;
use crate::connection::Connection;
use crate::error::ChatError;
use crate::message::Notice;
use crate::quote::{spawn_quote, QuoteGateway};
use crate::registry::RegistryHandle;
use crate::room::RoomHandle;
use crate::types::{User, ANONYMOUS};

pub struct Session {
    conn: Connection,
    user: User,
    registry: RegistryHandle,
    gateway: Arc<dyn QuoteGateway>,
    on_quote_failure: QuoteFailurePolicy,
    /// Room this connection currently belongs to
    room: Option<RoomHandle>,
}

impl Session {
    pub fn new(
        conn: Connection,
        user: User,
        registry: RegistryHandle,
        gateway: Arc<dyn QuoteGateway>,
        on_quote_failure: QuoteFailurePolicy,
    ) -> Self {
        Self {
            conn,
            user,
            registry,
            gateway,
            on_quote_failure,
            room: None,
        }
    }

    /// Name of the current room, if any
    pub fn current_room(&self) -> Option<&str> {
        self.room.as_ref().map(|r| r.name())
    }

    /// Handle one inbound line, reporting failures to this connection
    pub async fn handle_line(&mut self, line: &str) {
        if let Err(e) = self.dispatch(line).await {
            debug!("Command from {} failed: {}", self.conn.id, e);
            self.reply(Notice::from(e));
        }
    }

    /// Parse and apply one inbound line
    pub async fn dispatch(&mut self, line: &str) -> Result<(), ChatError> {
        match Command::parse(line)? {
            Command::Message(text) => self.send_message(text),
            Command::Join(room) => self.join(&room).await,
            Command::Leave => {
                if let Some(room) = self.leave_current() {
                    self.reply(Notice::YouLeft { room });
                }
                Ok(())
            }
            Command::Users => self.list_users().await,
            Command::Stock(ticker) => self.request_quote(ticker),
            Command::Create(room) => {
                self.registry.create_room(&room, &self.user).await?;
                self.reply(Notice::RoomCreated { room });
                Ok(())
            }
            Command::Delete(room) => {
                self.registry.delete_room(&room, &self.user).await?;
                if self.current_room() == Some(room.as_str()) {
                    self.room = None;
                }
                self.reply(Notice::RoomDeleted { room });
                Ok(())
            }
        }
    }

    /// Leave the current room on disconnect
    pub fn close(&mut self) {
        if let Some(room) = self.leave_current() {
            info!("{} left room {} on disconnect", self.user.display_name(), room);
        }
    }

    fn send_message(&mut self, text: String) -> Result<(), ChatError> {
        if text.trim().is_empty() {
            return Ok(());
        }
        let room = self.active_room()?;
        let notice = Notice::Chat {
            from: self.user.display_name().to_string(),
            text,
        };
        room.enqueue(notice, Some(self.conn.id))
            .map_err(|e| self.forget_room(e))
    }

    async fn join(&mut self, name: &str) -> Result<(), ChatError> {
        if self.current_room() == Some(name) && self.active_room().is_ok() {
            self.reply(Notice::Welcome {
                room: name.to_string(),
            });
            return Ok(());
        }

        let room = self.registry.join(name, self.conn.clone()).await?;
        self.leave_current();

        room.enqueue(
            Notice::Joined {
                username: self.user.display_name().to_string(),
            },
            Some(self.conn.id),
        )?;
        self.room = Some(room);

        info!("{} joined room {}", self.user.display_name(), name);
        self.reply(Notice::Welcome {
            room: name.to_string(),
        });
        Ok(())
    }

    async fn list_users(&mut self) -> Result<(), ChatError> {
        let room = self.active_room()?;
        let members = room
            .list_members()
            .await
            .map_err(|e| self.forget_room(e))?;

        let users = members
            .into_iter()
            .map(|name| if name.is_empty() { ANONYMOUS.to_string() } else { name })
            .collect();
        self.reply(Notice::Users(users));
        Ok(())
    }

    fn request_quote(&mut self, ticker: String) -> Result<(), ChatError> {
        let room = self.active_room()?;
        debug!("{} requested quote for {}", self.user.display_name(), ticker);
        spawn_quote(self.gateway.clone(), room, ticker, self.on_quote_failure);
        Ok(())
    }

    /// Leave the current room, announcing it to the remaining members
    fn leave_current(&mut self) -> Option<String> {
        let room = self.room.take()?;
        if room.leave(self.conn.id).is_ok() {
            let _ = room.enqueue(
                Notice::Left {
                    username: self.user.display_name().to_string(),
                },
                None,
            );
        }
        Some(room.name().to_string())
    }

    fn active_room(&mut self) -> Result<RoomHandle, ChatError> {
        match &self.room {
            None => Err(ChatError::NotInRoom),
            Some(room) if room.is_terminated() => {
                let name = room.name().to_string();
                self.room = None;
                Err(ChatError::RoomTerminated(name))
            }
            Some(room) => Ok(room.clone()),
        }
    }

    fn forget_room(&mut self, err: ChatError) -> ChatError {
        if matches!(err, ChatError::RoomTerminated(_)) {
            self.room = None;
        }
        err
    }

    fn reply(&self, notice: Notice) {
        if let Err(e) = self.conn.send(notice) {
            debug!("Reply to {} dropped: {}", self.conn.id, e);
        }
    }
}
