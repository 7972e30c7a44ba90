//! Basic type definitions for the chat server
//!
//! Provides newtype wrappers and identity types:
//! - `ConnectionId`: UUID-based unique connection identifier
//! - `Role`: privilege level of a user
//! - `User`: the identity a connection acts as

use uuid::Uuid;

/// Name shown for connections that did not supply a username
pub const ANONYMOUS: &str = "Anonymous";

/// Unique connection identifier (newtype pattern)
///
/// Wraps a UUID v4 for type-safe connection identification.
/// Implements Hash and Eq for use as HashMap keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Privilege level of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The server itself (startup rooms, maintenance)
    System,
    /// May create and delete rooms
    Admin,
    /// Regular chat participant
    User,
}

/// Identity a connection acts as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Username, empty for anonymous connections
    pub username: String,
    pub role: Role,
}

impl User {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    /// The principal used for server-initiated operations
    pub fn system() -> Self {
        Self::new("system", Role::System)
    }

    /// Get the display name for this user
    ///
    /// Returns the username if set, otherwise "Anonymous".
    pub fn display_name(&self) -> &str {
        if self.username.is_empty() {
            ANONYMOUS
        } else {
            &self.username
        }
    }
}
