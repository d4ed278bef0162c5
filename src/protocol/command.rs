//! Line Command Parser
//!
//! Requests are single text lines terminated by `\n`. The line is trimmed of
//! surrounding whitespace and then matched against a fixed set of
//! case-sensitive keywords.
//!
//! ## Grammar
//!
//! ```text
//! SET <key> <value...>    key is the second space-separated token,
//!                         value is the rest of the line (may contain spaces)
//! GET <key>               key is the trimmed remainder after "GET "
//! DELETE <key>            key is the trimmed remainder after "DELETE "
//! ALL
//! FLUSH
//! ```
//!
//! Anything else parses as [`Command::Unknown`]. The only hard parse error is
//! a `SET` line with fewer than three tokens.

use thiserror::Error;

const SET_PREFIX: &str = "SET ";
const GET_PREFIX: &str = "GET ";
const DELETE_PREFIX: &str = "DELETE ";

/// Errors that can occur while parsing a request line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// `SET` needs a keyword, a key and a value
    #[error("invalid format")]
    InvalidFormat,
}

/// A parsed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
    All,
    Flush,
    Unknown,
}

impl Command {
    /// Parses one request line. The line may still carry its terminator.
    pub fn parse(line: &str) -> Result<Command, CommandError> {
        let line = line.trim();

        if line.starts_with(SET_PREFIX) {
            let mut parts = line.splitn(3, ' ');
            let _keyword = parts.next();
            return match (parts.next(), parts.next()) {
                (Some(key), Some(value)) => Ok(Command::Set {
                    key: key.to_string(),
                    value: value.to_string(),
                }),
                _ => Err(CommandError::InvalidFormat),
            };
        }

        if let Some(rest) = line.strip_prefix(GET_PREFIX) {
            return Ok(Command::Get {
                key: rest.trim().to_string(),
            });
        }

        if let Some(rest) = line.strip_prefix(DELETE_PREFIX) {
            return Ok(Command::Delete {
                key: rest.trim().to_string(),
            });
        }

        Ok(match line {
            "ALL" => Command::All,
            "FLUSH" => Command::Flush,
            _ => Command::Unknown,
        })
    }

    /// Returns the command keyword, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Set { .. } => "SET",
            Command::Get { .. } => "GET",
            Command::Delete { .. } => "DELETE",
            Command::All => "ALL",
            Command::Flush => "FLUSH",
            Command::Unknown => "UNKNOWN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(key: &str, value: &str) -> Command {
        Command::Set {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_parse_set() {
        assert_eq!(Command::parse("SET a 1\n"), Ok(set("a", "1")));
        assert_eq!(Command::parse("SET a 1\r\n"), Ok(set("a", "1")));
    }

    #[test]
    fn test_parse_set_value_keeps_spaces() {
        assert_eq!(
            Command::parse("SET greeting hello big world"),
            Ok(set("greeting", "hello big world"))
        );
    }

    #[test]
    fn test_parse_set_too_few_tokens() {
        assert_eq!(Command::parse("SET a"), Err(CommandError::InvalidFormat));
        assert_eq!(Command::parse("SET a\n"), Err(CommandError::InvalidFormat));
    }

    #[test]
    fn test_parse_set_double_space_yields_empty_key() {
        // Splitting is on single spaces; the datastore rejects the empty key
        assert_eq!(Command::parse("SET  a b"), Ok(set("", "a b")));
    }

    #[test]
    fn test_parse_get_and_delete() {
        assert_eq!(
            Command::parse("GET a\n"),
            Ok(Command::Get { key: "a".to_string() })
        );
        assert_eq!(
            Command::parse("GET   spaced key  "),
            Ok(Command::Get {
                key: "spaced key".to_string()
            })
        );
        assert_eq!(
            Command::parse("DELETE a\n"),
            Ok(Command::Delete { key: "a".to_string() })
        );
    }

    #[test]
    fn test_parse_bare_keywords() {
        assert_eq!(Command::parse("ALL\n"), Ok(Command::All));
        assert_eq!(Command::parse("  FLUSH  \r\n"), Ok(Command::Flush));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(Command::parse("FOO\n"), Ok(Command::Unknown));
        assert_eq!(Command::parse(""), Ok(Command::Unknown));
        // Keywords are case-sensitive
        assert_eq!(Command::parse("get a"), Ok(Command::Unknown));
        // A keyword with no argument is trimmed down to the bare keyword
        assert_eq!(Command::parse("GET \n"), Ok(Command::Unknown));
        assert_eq!(Command::parse("SET"), Ok(Command::Unknown));
        assert_eq!(Command::parse("ALL extra"), Ok(Command::Unknown));
    }

    #[test]
    fn test_command_name() {
        assert_eq!(set("a", "b").name(), "SET");
        assert_eq!(Command::All.name(), "ALL");
        assert_eq!(Command::Unknown.name(), "UNKNOWN");
    }
}
