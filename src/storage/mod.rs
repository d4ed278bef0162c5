//! Storage Module
//!
//! This module provides the in-memory datastore for VertexKV: a validated,
//! bounded key-value map behind a single readers-writer lock, plus the value
//! type it stores.
//!
//! ## Features
//!
//! - **RwLock**: Multiple concurrent readers, exclusive writers
//! - **Key Validation**: Keys are checked against an allowed character class
//! - **Capacity Bound**: At most `max_entries` keys after any successful write
//! - **TTL Bookkeeping**: Every insert records an expiry timestamp (not enforced)
//!
//! ## Example
//!
//! ```
//! use vertexkv::storage::{Datastore, StoreError, Value};
//! use std::sync::Arc;
//!
//! let store = Arc::new(Datastore::new());
//!
//! store.set("name", Value::from("Vertex")).unwrap();
//! assert_eq!(store.get("name"), Ok(Value::from("Vertex")));
//!
//! store.delete("name").unwrap();
//! assert_eq!(store.get("name"), Err(StoreError::KeyNotFound));
//! ```

pub mod engine;
pub mod value;

// Re-export commonly used types
pub use engine::{
    validate_key, Contents, Datastore, StoreError, StoreLimits, StoreResult, StoreStats,
    DEFAULT_MAX_ENTRIES, DEFAULT_MAX_KEY_AGE, MAX_KEY_AGE,
};
pub use value::Value;
