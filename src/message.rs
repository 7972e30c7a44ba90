//! Outbound text protocol
//!
//! Every engine-generated frame is a single line of UTF-8 text. `Notice`
//! enumerates them and renders the exact wire text via `Display`.

use std::fmt;

use crate::error::ChatError;

/// Server → Client text frame
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Relayed user message
    Chat { from: String, text: String },
    /// Sent to a connection after it joins a room
    Welcome { room: String },
    /// A member joined the room
    Joined { username: String },
    /// A member left the room
    Left { username: String },
    /// Sent to a connection after it leaves a room
    YouLeft { room: String },
    /// Reply to `/users`
    Users(Vec<String>),
    /// Room created successfully
    RoomCreated { room: String },
    /// Room deleted successfully
    RoomDeleted { room: String },
    /// Stock quote result
    Quote { ticker: String, price: f64 },
    /// Stock quote failure
    QuoteFailed { ticker: String },
    /// Command error, sent to the originating connection only
    Error(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Chat { from, text } => write!(f, "{}: {}", from, text),
            Notice::Welcome { room } => write!(f, "Welcome to the {} chat room!", room),
            Notice::Joined { username } => write!(f, "{} joined the room", username),
            Notice::Left { username } => write!(f, "{} left the room", username),
            Notice::YouLeft { room } => write!(f, "You left the {} chat room.", room),
            Notice::Users(users) if users.is_empty() => {
                write!(f, "There are no users in this room.")
            }
            Notice::Users(users) => write!(f, "Users in this room: {}", users.join(", ")),
            Notice::RoomCreated { room } => write!(f, "Room {} created", room),
            Notice::RoomDeleted { room } => write!(f, "Room {} deleted", room),
            Notice::Quote { ticker, price } => {
                write!(f, "{} quote is ${:.2} per share", ticker, price)
            }
            Notice::QuoteFailed { ticker } => write!(f, "Unable to fetch quote for {}", ticker),
            Notice::Error(message) => write!(f, "Error: {}", message),
        }
    }
}

impl From<Notice> for String {
    fn from(notice: Notice) -> Self {
        notice.to_string()
    }
}

/// Convert ChatError to a Notice for client notification
impl From<ChatError> for Notice {
    fn from(err: ChatError) -> Self {
        let message = match &err {
            ChatError::NotFound(room) => format!("Room '{}' not found", room),
            ChatError::AlreadyExists(room) => format!("Room '{}' already exists", room),
            ChatError::Unauthorized => "You are not allowed to manage rooms".to_string(),
            ChatError::UnrecognizedCommand(line) => format!("Unrecognized command: {}", line),
            ChatError::RoomTerminated(room) => format!("Room '{}' no longer exists", room),
            ChatError::NotInRoom => "You are not in a room".to_string(),
            // Transport errors are not typically converted (connection closes)
            _ => "Internal error".to_string(),
        };
        Notice::Error(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_format() {
        let notice = Notice::Chat {
            from: "alice".to_string(),
            text: "hi there".to_string(),
        };
        assert_eq!(notice.to_string(), "alice: hi there");
    }

    #[test]
    fn test_quote_format_two_decimals() {
        let notice = Notice::Quote {
            ticker: "AAPL".to_string(),
            price: 123.45,
        };
        assert_eq!(notice.to_string(), "AAPL quote is $123.45 per share");

        let notice = Notice::Quote {
            ticker: "MSFT".to_string(),
            price: 7.0,
        };
        assert_eq!(notice.to_string(), "MSFT quote is $7.00 per share");
    }

    #[test]
    fn test_users_format() {
        assert_eq!(
            Notice::Users(vec![]).to_string(),
            "There are no users in this room."
        );
        assert_eq!(
            Notice::Users(vec!["alice".to_string(), "bob".to_string()]).to_string(),
            "Users in this room: alice, bob"
        );
    }

    #[test]
    fn test_system_notices() {
        assert_eq!(
            Notice::Welcome { room: "general".to_string() }.to_string(),
            "Welcome to the general chat room!"
        );
        assert_eq!(
            Notice::Left { username: "bob".to_string() }.to_string(),
            "bob left the room"
        );
    }

    #[test]
    fn test_error_conversion() {
        let notice: Notice = ChatError::NotFound("lobby".to_string()).into();
        assert_eq!(notice.to_string(), "Error: Room 'lobby' not found");

        let notice: Notice = ChatError::NotInRoom.into();
        assert_eq!(notice.to_string(), "Error: You are not in a room");
    }
}
