//! Snapshot Codec
//!
//! Converts a datastore into a compressed byte stream and back.
//!
//! ## Format
//!
//! A snapshot is a JSON document compressed with gzip in a single streaming
//! pass. There is no header, version tag or checksum.
//!
//! ```text
//! {
//!   "saved_at": 1760000000000,
//!   "entries": { "name": {"type": "string", "value": "Vertex"} },
//!   "expiry":  { "name": 1760003600000 }
//! }
//! ```
//!
//! Timestamps are milliseconds since the Unix epoch.

use crate::storage::{Contents, Datastore, Value};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors that can occur while encoding or decoding a snapshot.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The compressed stream could not be written or flushed
    #[error("compression failed: {0}")]
    Io(#[from] std::io::Error),

    /// The document could not be serialized or deserialized. Corrupt gzip
    /// data surfaces here as well, since decompression happens while the
    /// JSON is being read.
    #[error("invalid snapshot document: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON has no representation for NaN or infinity
    #[error("value of {key} is not a finite number")]
    NonFiniteFloat { key: String },
}

/// A point-in-time copy of a datastore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// When the snapshot was taken (ms since epoch)
    pub saved_at: u64,
    /// Key-value pairs
    pub entries: HashMap<String, Value>,
    /// Expiry bookkeeping (ms since epoch)
    #[serde(default)]
    pub expiry: HashMap<String, u64>,
}

impl Snapshot {
    /// Captures the current contents of `store`.
    ///
    /// The datastore's shared lock is held only while its maps are copied.
    pub fn capture(store: &Datastore) -> Self {
        let Contents { entries, expiry } = store.contents();
        Self {
            saved_at: to_millis(SystemTime::now()),
            entries,
            expiry: expiry
                .into_iter()
                .map(|(key, at)| (key, to_millis(at)))
                .collect(),
        }
    }

    /// Converts the snapshot back into datastore contents.
    pub fn into_contents(self) -> Contents {
        Contents {
            entries: self.entries,
            expiry: self
                .expiry
                .into_iter()
                .map(|(key, ms)| (key, from_millis(ms)))
                .collect(),
        }
    }

    /// Returns the capture time.
    pub fn saved_at(&self) -> SystemTime {
        from_millis(self.saved_at)
    }

    /// Checks that every entry can be written and read back.
    pub fn validate(&self) -> Result<(), CodecError> {
        match self
            .entries
            .iter()
            .find(|(_, value)| matches!(value, Value::Float(f) if !f.is_finite()))
        {
            Some((key, _)) => Err(CodecError::NonFiniteFloat { key: key.clone() }),
            None => Ok(()),
        }
    }
}

fn to_millis(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn from_millis(ms: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(ms)
}

/// Encodes and compresses `snapshot` into `writer`.
///
/// The snapshot is not re-checked here: run [`Snapshot::validate`] first,
/// since serde_json writes non-finite floats as `null`.
pub fn encode<W: Write>(snapshot: &Snapshot, writer: W) -> Result<(), CodecError> {
    let mut encoder = GzEncoder::new(writer, Compression::default());
    serde_json::to_writer(&mut encoder, snapshot)?;
    encoder.finish()?.flush()?;
    Ok(())
}

/// Decompresses and decodes a snapshot from `reader`.
pub fn decode<R: Read>(reader: R) -> Result<Snapshot, CodecError> {
    let decoder = GzDecoder::new(reader);
    Ok(serde_json::from_reader(decoder)?)
}

/// Encodes `snapshot` into a new buffer.
pub fn encode_to_vec(snapshot: &Snapshot) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    encode(snapshot, &mut buf)?;
    Ok(buf)
}

/// Decodes a snapshot from an in-memory buffer.
pub fn decode_from_slice(data: &[u8]) -> Result<Snapshot, CodecError> {
    decode(data)
}
