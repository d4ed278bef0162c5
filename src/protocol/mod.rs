//! Line Protocol Implementation
//!
//! This module implements the text protocol VertexKV speaks with its
//! clients: one request per `\n`-terminated line, one CRLF-terminated reply
//! per request.
//!
//! ## Modules
//!
//! - `command`: Parses a request line into a [`Command`]
//! - `reply`: Defines the [`Reply`] enum and its wire serialization
//!
//! ## Example
//!
//! ```
//! use vertexkv::protocol::{Command, Reply};
//!
//! let command = Command::parse("GET name\n").unwrap();
//! assert_eq!(command, Command::Get { key: "name".to_string() });
//!
//! let reply = Reply::Value { key: "name".to_string(), value: "Vertex".to_string() };
//! assert_eq!(&reply.serialize()[..], b"VALUE name\r\nVertex\r\n");
//! ```

pub mod command;
pub mod reply;

// Re-export commonly used types for convenience
pub use command::{Command, CommandError};
pub use reply::{Reply, CRLF};
