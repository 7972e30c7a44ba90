//! Room-Based WebSocket Broadcast Chat Server Library
//!
//! A WebSocket chat server built with tokio-tungstenite where clients talk in
//! named rooms using a small slash-command language.
//!
//! # Features
//! - WebSocket connection handling, username from the upgrade query string
//! - Admin-only room creation and deletion (`/create`, `/delete`)
//! - Room joining and leaving (`/join`, `/leave`)
//! - Member listing (`/users`)
//! - Real-time broadcast to every other member of a room
//! - Stock quotes posted to the room (`/stock=AAPL`)
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `RoomRegistry` is the actor owning the room name → room directory
//! - Each `Room` runs its own broadcast loop, fed by its inbox and stopped by
//!   a cancellation token
//! - Each connection runs a `Session` that parses lines into `Command`s
//! - Stock lookups run as short-lived tasks that post back into the room
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use room_broadcast::{handle_connection, Config, RoleAuthorizer, RoomRegistry, ServerState, StooqGateway};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::default();
//!     let listener = TcpListener::bind(&config.bind_addr).await.unwrap();
//!     let registry = RoomRegistry::spawn(Arc::new(RoleAuthorizer));
//!     let gateway = Arc::new(StooqGateway::new(&config.quote).unwrap());
//!     let state = ServerState::new(&config, registry, gateway);
//!
//!     while let Ok((stream, _)) = listener.accept().await {
//!         tokio::spawn(handle_connection(stream, state.clone()));
//!     }
//! }
//! ```

pub mod auth;
pub mod command;
pub mod config;
pub mod connection;
pub mod error;
pub mod handler;
pub mod message;
pub mod quote;
pub mod registry;
pub mod room;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use auth::{Authorizer, RoleAuthorizer, RoleResolver};
pub use command::Command;
pub use config::{Config, QuoteConfig, QuoteFailurePolicy};
pub use connection::{Connection, Outbound};
pub use error::{ChatError, ConfigError, QuoteError, SendError};
pub use handler::{handle_connection, ServerState};
pub use message::Notice;
pub use quote::{QuoteGateway, StooqGateway};
pub use registry::{RegistryHandle, RoomRegistry};
pub use room::{Room, RoomHandle};
pub use session::Session;
pub use types::{ConnectionId, Role, User};
