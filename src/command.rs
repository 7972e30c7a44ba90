//! Command parsing
//!
//! Turns one inbound line into a `Command`. Prefix rules are tried in a
//! fixed order and the first match wins.

use crate::error::ChatError;

/// Structured interpretation of one line of client input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Relay text to the current room
    Message(String),
    /// `/join <room>`
    Join(String),
    /// `/leave`
    Leave,
    /// `/users`
    Users,
    /// `/stock=<TICKER>`
    Stock(String),
    /// `/create <room>`
    Create(String),
    /// `/delete <room>`
    Delete(String),
}

impl Command {
    /// Parse a line of input
    ///
    /// Slash-prefixed input that matches no rule is `UnrecognizedCommand`.
    pub fn parse(line: &str) -> Result<Self, ChatError> {
        let line = line.trim_end_matches(['\r', '\n']);

        if let Some(room) = line.strip_prefix("/join ") {
            return room_argument(line, room).map(Command::Join);
        }
        if line.starts_with("/leave") {
            return Ok(Command::Leave);
        }
        if line.starts_with("/users") {
            return Ok(Command::Users);
        }
        if let Some(ticker) = line.strip_prefix("/stock=") {
            return Ok(Command::Stock(ticker.to_string()));
        }
        if let Some(room) = line.strip_prefix("/create ") {
            return room_argument(line, room).map(Command::Create);
        }
        if let Some(room) = line.strip_prefix("/delete ") {
            return room_argument(line, room).map(Command::Delete);
        }
        if line.starts_with('/') {
            return Err(ChatError::UnrecognizedCommand(line.to_string()));
        }

        Ok(Command::Message(line.to_string()))
    }
}

fn room_argument(line: &str, room: &str) -> Result<String, ChatError> {
    let room = room.trim();
    if room.is_empty() {
        Err(ChatError::UnrecognizedCommand(line.to_string()))
    } else {
        Ok(room.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_message() {
        assert_eq!(
            Command::parse("hello everyone").unwrap(),
            Command::Message("hello everyone".to_string())
        );
    }

    #[test]
    fn test_room_commands() {
        assert_eq!(
            Command::parse("/join lobby").unwrap(),
            Command::Join("lobby".to_string())
        );
        assert_eq!(
            Command::parse("/create  trading ").unwrap(),
            Command::Create("trading".to_string())
        );
        assert_eq!(
            Command::parse("/delete trading").unwrap(),
            Command::Delete("trading".to_string())
        );
        assert_eq!(Command::parse("/leave").unwrap(), Command::Leave);
        assert_eq!(Command::parse("/users").unwrap(), Command::Users);
    }

    #[test]
    fn test_stock_ticker_taken_verbatim() {
        assert_eq!(
            Command::parse("/stock=AAPL").unwrap(),
            Command::Stock("AAPL".to_string())
        );
        assert_eq!(
            Command::parse("/stock=aapl.us").unwrap(),
            Command::Stock("aapl.us".to_string())
        );
        assert_eq!(
            Command::parse("/stock=").unwrap(),
            Command::Stock(String::new())
        );
    }

    #[test]
    fn test_trailing_line_break_is_stripped() {
        assert_eq!(
            Command::parse("/join lobby\r\n").unwrap(),
            Command::Join("lobby".to_string())
        );
    }

    #[test]
    fn test_unrecognized_slash_command() {
        assert!(matches!(
            Command::parse("/shrug"),
            Err(ChatError::UnrecognizedCommand(_))
        ));
        // Missing argument does not fall through to a plain message
        assert!(matches!(
            Command::parse("/join"),
            Err(ChatError::UnrecognizedCommand(_))
        ));
        assert!(matches!(
            Command::parse("/create   "),
            Err(ChatError::UnrecognizedCommand(_))
        ));
    }
}
