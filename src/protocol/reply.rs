//! Protocol Replies
//!
//! Every request line produces exactly one [`Reply`]. Replies are plain text
//! and every line of a reply ends with CRLF.
//!
//! ## Wire Format
//!
//! ```text
//! OK\r\n
//! ERR\r\n
//! NODATA\r\n
//! UNKNOWN\r\n
//! VALUE <key>\r\n<value>\r\n
//! ALLVALUES\r\n<key>=<value>\r\n...ENDOFALLVALUES\r\n
//! Error in <line> : <message>\r\n
//! ```

use bytes::{BufMut, BytesMut};
use std::fmt;

/// The CRLF terminator that ends every reply line
pub const CRLF: &[u8] = b"\r\n";

/// A reply to a single request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The command succeeded
    Ok,

    /// A malformed SET line
    Err,

    /// The requested key has no data (missing or rejected)
    NoData,

    /// The line did not match any command
    Unknown,

    /// The value stored at a key
    Value { key: String, value: String },

    /// Every key-value pair in the store
    AllValues(Vec<(String, String)>),

    /// An operation was rejected; carries the offending request line
    Error { line: String, message: String },
}

impl Reply {
    /// Creates an error reply for `line`.
    pub fn error(line: impl Into<String>, message: impl fmt::Display) -> Self {
        Reply::Error {
            line: line.into(),
            message: message.to_string(),
        }
    }

    /// Serializes the reply to bytes for sending over the wire.
    pub fn serialize(&self) -> BytesMut {
        let mut buf = BytesMut::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes the reply into an existing buffer.
    pub fn serialize_into(&self, buf: &mut BytesMut) {
        match self {
            Reply::Ok => line(buf, b"OK"),
            Reply::Err => line(buf, b"ERR"),
            Reply::NoData => line(buf, b"NODATA"),
            Reply::Unknown => line(buf, b"UNKNOWN"),
            Reply::Value { key, value } => {
                buf.put_slice(b"VALUE ");
                line(buf, key.as_bytes());
                line(buf, value.as_bytes());
            }
            Reply::AllValues(pairs) => {
                line(buf, b"ALLVALUES");
                for (key, value) in pairs {
                    buf.put_slice(key.as_bytes());
                    buf.put_u8(b'=');
                    line(buf, value.as_bytes());
                }
                line(buf, b"ENDOFALLVALUES");
            }
            Reply::Error { line: request, message } => {
                buf.put_slice(b"Error in ");
                buf.put_slice(request.as_bytes());
                buf.put_slice(b" : ");
                line(buf, message.as_bytes());
            }
        }
    }
}

fn line(buf: &mut BytesMut, content: &[u8]) {
    buf.put_slice(content);
    buf.put_slice(CRLF);
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.serialize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_replies() {
        assert_eq!(&Reply::Ok.serialize()[..], b"OK\r\n");
        assert_eq!(&Reply::Err.serialize()[..], b"ERR\r\n");
        assert_eq!(&Reply::NoData.serialize()[..], b"NODATA\r\n");
        assert_eq!(&Reply::Unknown.serialize()[..], b"UNKNOWN\r\n");
    }

    #[test]
    fn test_value_reply() {
        let reply = Reply::Value {
            key: "a".to_string(),
            value: "1".to_string(),
        };
        assert_eq!(&reply.serialize()[..], b"VALUE a\r\n1\r\n");
    }

    #[test]
    fn test_all_values_reply() {
        let reply = Reply::AllValues(vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "two words".to_string()),
        ]);
        assert_eq!(
            &reply.serialize()[..],
            b"ALLVALUES\r\na=1\r\nb=two words\r\nENDOFALLVALUES\r\n"
        );

        let empty = Reply::AllValues(vec![]);
        assert_eq!(&empty.serialize()[..], b"ALLVALUES\r\nENDOFALLVALUES\r\n");
    }

    #[test]
    fn test_error_reply() {
        let reply = Reply::error("SET a 1", "Key already exists");
        assert_eq!(
            &reply.serialize()[..],
            b"Error in SET a 1 : Key already exists\r\n"
        );
    }

    #[test]
    fn test_serialize_into_appends() {
        let mut buf = BytesMut::new();
        Reply::Ok.serialize_into(&mut buf);
        Reply::NoData.serialize_into(&mut buf);
        assert_eq!(&buf[..], b"OK\r\nNODATA\r\n");
        assert_eq!(Reply::Ok.to_string(), "OK\r\n");
    }
}
