//! Snapshot Persistence Module
//!
//! VertexKV persists by writing full, compressed snapshots of the datastore.
//! There is no write-ahead log: each save rewrites the snapshot file.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐   every interval   ┌──────────────────┐
//! │ SnapshotScheduler│───────────────────>│     Gateway      │
//! │ (Tokio task)     │                    │  save() / load() │
//! └──────────────────┘                    └────────┬─────────┘
//!                                                  │
//!                                                  ▼
//!                                         ┌──────────────────┐
//!                                         │      codec       │
//!                                         │ JSON + gzip      │
//!                                         └────────┬─────────┘
//!                                                  │
//!                                                  ▼
//!                                      <persistence dir>/datastore.data
//! ```
//!
//! ## Modules
//!
//! - `codec`: Snapshot encoding and compression
//! - `gateway`: Snapshot file location, save and load
//! - `scheduler`: Cancellable periodic save task

pub mod codec;
pub mod gateway;
pub mod scheduler;

// Re-export commonly used types
pub use codec::{CodecError, Snapshot};
pub use gateway::{Gateway, PersistenceError, SNAPSHOT_FILE_NAME};
pub use scheduler::{SnapshotScheduler, DEFAULT_SNAPSHOT_INTERVAL};
