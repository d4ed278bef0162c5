//! Thread-Safe Datastore
//!
//! This module implements the core datastore for VertexKV: a validated,
//! bounded key-value map shared by every client connection and by the
//! snapshot scheduler.
//!
//! ## Design Decisions
//!
//! 1. **One RwLock**: Entries and TTL bookkeeping live behind a single
//!    readers-writer lock so every reader sees a fully applied mutation.
//! 2. **Insert-only SET**: `set` fails on an existing key; `update` is the
//!    only way to change a stored value.
//! 3. **Bounded**: the entry count never exceeds `max_entries` after a
//!    successful mutation. Capacity is checked after insertion and the
//!    insert is rolled back on overflow.
//! 4. **TTL bookkeeping only**: each insert records `now + max_key_age`.
//!    Nothing reads it to expire keys.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Datastore                            │
//! │                                                             │
//! │   set / update / delete / flush_all    get / get_all        │
//! │           (exclusive)                     (shared)          │
//! │                 │                            │              │
//! │                 ▼                            ▼              │
//! │   ┌───────────────────────────────────────────────────────┐ │
//! │   │                 RwLock<Contents>                      │ │
//! │   │   entries: HashMap<String, Value>                     │ │
//! │   │   expiry:  HashMap<String, SystemTime>                │ │
//! │   └───────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The lock is only ever held for in-memory map manipulation, never across
//! network or disk I/O.

use crate::storage::Value;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};
use thiserror::Error;

/// Maximum number of entries a datastore holds by default.
pub const DEFAULT_MAX_ENTRIES: usize = 100_000;

/// Default lifetime recorded in the TTL bookkeeping (60 minutes).
pub const DEFAULT_MAX_KEY_AGE: Duration = Duration::from_secs(60 * 60);

/// Longest lifetime recorded in the TTL bookkeeping (100 years). Larger ages
/// are clamped to it.
pub const MAX_KEY_AGE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Accepted key characters: ASCII letters and digits, ASCII whitespace,
/// underscore, hyphen and the extended-Latin range U+0080..=U+00FF.
static KEY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9 \t\n\x0B\f\r_\x{80}-\x{FF}-]+$").expect("key pattern is a valid regex")
});

/// Errors returned by datastore operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    #[error("Empty key is not allowed")]
    EmptyKey,

    #[error("Key with special characters is not allowed")]
    InvalidKey,

    #[error("Nil value is not allowed")]
    NilValue,

    #[error("Key not found")]
    KeyNotFound,

    #[error("Key already exists")]
    DuplicateKey,

    #[error("Out of memory")]
    OutOfMemory,
}

/// Result type for datastore operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Validates a key.
///
/// Empty keys are rejected first; any other key must consist entirely of
/// characters from the accepted class. A key that does not match is invalid.
pub fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::EmptyKey);
    }
    if !KEY_PATTERN.is_match(key) {
        return Err(StoreError::InvalidKey);
    }
    Ok(())
}

/// Returns `now + age`, with `age` clamped to `MAX_KEY_AGE`.
///
/// Saturates at `now` if the platform clock cannot represent the sum.
fn expiry_from(now: SystemTime, age: Duration) -> SystemTime {
    now.checked_add(age.min(MAX_KEY_AGE)).unwrap_or(now)
}

/// Capacity and lifetime bounds for a datastore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    /// Upper bound on the number of entries
    pub max_entries: usize,
    /// Lifetime recorded in the TTL bookkeeping for new keys
    pub max_key_age: Duration,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            max_key_age: DEFAULT_MAX_KEY_AGE,
        }
    }
}

/// An owned copy of everything a datastore holds.
///
/// This is what the snapshot codec persists and what a datastore is rebuilt
/// from at startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contents {
    /// Key-value pairs
    pub entries: HashMap<String, Value>,
    /// Absolute expiry timestamp per key (bookkeeping only)
    pub expiry: HashMap<String, SystemTime>,
}

/// The datastore shared by all connections.
///
/// Wrap it in an `Arc` and hand clones of the `Arc` to the server and the
/// persistence layer.
///
/// # Example
///
/// ```
/// use vertexkv::storage::{Datastore, StoreError, Value};
///
/// let store = Datastore::new();
///
/// store.set("name", Value::from("Vertex")).unwrap();
/// assert_eq!(store.get("name"), Ok(Value::from("Vertex")));
///
/// // SET is insert-only
/// assert_eq!(store.set("name", Value::from("other")), Err(StoreError::DuplicateKey));
///
/// store.update("name", Value::from("other")).unwrap();
/// assert_eq!(store.get("name"), Ok(Value::from("other")));
/// ```
pub struct Datastore {
    contents: RwLock<Contents>,

    limits: StoreLimits,

    /// Statistics: total GET operations
    get_count: AtomicU64,

    /// Statistics: total SET operations
    set_count: AtomicU64,

    /// Statistics: total UPDATE operations
    update_count: AtomicU64,

    /// Statistics: total DELETE operations
    del_count: AtomicU64,

    /// Statistics: operations rejected with an error
    rejected_count: AtomicU64,
}

impl std::fmt::Debug for Datastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Datastore")
            .field("len", &self.len())
            .field("limits", &self.limits)
            .field("get_count", &self.get_count.load(Ordering::Relaxed))
            .field("set_count", &self.set_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for Datastore {
    fn default() -> Self {
        Self::new()
    }
}

impl Datastore {
    /// Creates an empty datastore with default limits.
    pub fn new() -> Self {
        Self::with_limits(StoreLimits::default())
    }

    /// Creates an empty datastore with the given limits.
    pub fn with_limits(limits: StoreLimits) -> Self {
        Self::from_contents(limits, Contents::default())
    }

    /// Rebuilds a datastore from previously captured contents.
    ///
    /// Contents are taken as-is; loading is not a mutation and does not
    /// re-validate keys or enforce capacity.
    pub fn from_contents(limits: StoreLimits, contents: Contents) -> Self {
        Self {
            contents: RwLock::new(contents),
            limits,
            get_count: AtomicU64::new(0),
            set_count: AtomicU64::new(0),
            update_count: AtomicU64::new(0),
            del_count: AtomicU64::new(0),
            rejected_count: AtomicU64::new(0),
        }
    }

    /// Returns the limits this datastore enforces.
    pub fn limits(&self) -> StoreLimits {
        self.limits
    }

    fn reject<T>(&self, err: StoreError) -> StoreResult<T> {
        self.rejected_count.fetch_add(1, Ordering::Relaxed);
        Err(err)
    }

    /// Inserts a new key.
    ///
    /// Fails with `DuplicateKey` if the key already exists and with
    /// `OutOfMemory` if the insert would push the store past `max_entries`.
    pub fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        self.set_opt(key, Some(value))
    }

    /// Inserts a new key whose value may be absent.
    ///
    /// `None` is rejected with `NilValue` after key validation.
    pub fn set_opt(&self, key: &str, value: Option<Value>) -> StoreResult<()> {
        self.set_count.fetch_add(1, Ordering::Relaxed);

        if let Err(e) = validate_key(key) {
            return self.reject(e);
        }
        let value = match value {
            Some(v) => v,
            None => return self.reject(StoreError::NilValue),
        };

        let mut contents = self.contents.write();
        if contents.entries.contains_key(key) {
            return self.reject(StoreError::DuplicateKey);
        }

        contents.entries.insert(key.to_string(), value);
        contents
            .expiry
            .insert(key.to_string(), expiry_from(SystemTime::now(), self.limits.max_key_age));

        if contents.entries.len() > self.limits.max_entries {
            contents.entries.remove(key);
            contents.expiry.remove(key);
            return self.reject(StoreError::OutOfMemory);
        }

        Ok(())
    }

    /// Returns a copy of the value stored at `key`.
    pub fn get(&self, key: &str) -> StoreResult<Value> {
        self.get_count.fetch_add(1, Ordering::Relaxed);

        if let Err(e) = validate_key(key) {
            return self.reject(e);
        }

        let contents = self.contents.read();
        match contents.entries.get(key) {
            Some(value) => Ok(value.clone()),
            None => self.reject(StoreError::KeyNotFound),
        }
    }

    /// Replaces the value of an existing key.
    ///
    /// The TTL bookkeeping for the key is left untouched.
    pub fn update(&self, key: &str, value: Value) -> StoreResult<()> {
        self.update_count.fetch_add(1, Ordering::Relaxed);

        if let Err(e) = validate_key(key) {
            return self.reject(e);
        }

        let mut contents = self.contents.write();
        match contents.entries.get_mut(key) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => self.reject(StoreError::KeyNotFound),
        }
    }

    /// Removes a key together with its TTL bookkeeping.
    pub fn delete(&self, key: &str) -> StoreResult<()> {
        self.del_count.fetch_add(1, Ordering::Relaxed);

        if let Err(e) = validate_key(key) {
            return self.reject(e);
        }

        let mut contents = self.contents.write();
        if contents.entries.remove(key).is_none() {
            return self.reject(StoreError::KeyNotFound);
        }
        contents.expiry.remove(key);
        Ok(())
    }

    /// Returns a copy of every key-value pair.
    pub fn get_all(&self) -> HashMap<String, Value> {
        self.contents.read().entries.clone()
    }

    /// Empties the datastore, including the TTL bookkeeping.
    pub fn flush_all(&self) {
        let mut contents = self.contents.write();
        contents.entries = HashMap::new();
        contents.expiry = HashMap::new();
    }

    /// Copies entries and TTL bookkeeping under a single shared lock.
    pub fn contents(&self) -> Contents {
        self.contents.read().clone()
    }

    /// Returns the recorded expiry timestamp for `key`, if any.
    pub fn expires_at(&self, key: &str) -> Option<SystemTime> {
        self.contents.read().expiry.get(key).copied()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.contents.read().entries.len()
    }

    /// Returns true if the datastore holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns datastore statistics.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            keys: self.len() as u64,
            get_ops: self.get_count.load(Ordering::Relaxed),
            set_ops: self.set_count.load(Ordering::Relaxed),
            update_ops: self.update_count.load(Ordering::Relaxed),
            del_ops: self.del_count.load(Ordering::Relaxed),
            rejected: self.rejected_count.load(Ordering::Relaxed),
        }
    }
}

/// Datastore statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of keys currently stored
    pub keys: u64,
    /// Total GET operations
    pub get_ops: u64,
    /// Total SET operations
    pub set_ops: u64,
    /// Total UPDATE operations
    pub update_ops: u64,
    /// Total DELETE operations
    pub del_ops: u64,
    /// Operations that returned an error
    pub rejected: u64,
}
