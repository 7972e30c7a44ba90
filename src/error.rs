//! Error types for the chat server
//!
//! Defines engine errors, stock quote errors, configuration errors and
//! connection send errors. Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Engine-level errors
///
/// Covers both fatal errors (connection termination) and
/// command errors (reported back to the originating connection only).
#[derive(Debug, Error)]
pub enum ChatError {
    /// WebSocket protocol error (fatal for the connection)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The registry actor has stopped
    #[error("Channel closed")]
    ChannelClosed,

    /// No room with the given name
    #[error("Room not found: {0}")]
    NotFound(String),

    /// A room with the given name already exists
    #[error("Room already exists: {0}")]
    AlreadyExists(String),

    /// Requester lacks the room management capability
    #[error("Unauthorized")]
    Unauthorized,

    /// Slash-prefixed input that matches no command
    #[error("Unrecognized command: {0}")]
    UnrecognizedCommand(String),

    /// The room was deleted
    #[error("Room terminated: {0}")]
    RoomTerminated(String),

    /// Room-scoped command issued outside a room
    #[error("Not in room")]
    NotInRoom,
}

/// Stock quote gateway errors
#[derive(Debug, Error)]
pub enum QuoteError {
    /// Transport failure or non-success status
    #[error("Quote source unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Close price field missing or not numeric
    #[error("Unexpected quote format: {0}")]
    UpstreamFormat(String),
}

impl From<reqwest::Error> for QuoteError {
    fn from(err: reqwest::Error) -> Self {
        QuoteError::UpstreamUnavailable(err.to_string())
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Message send errors
///
/// Occurs when attempting to send frames to a connection.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,

    /// The connection's outbound queue is full
    #[error("Channel full")]
    ChannelFull,
}
