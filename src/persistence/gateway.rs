//! Persistence Gateway
//!
//! Owns the location of the snapshot file and moves datastores between
//! memory and disk through the snapshot codec.
//!
//! ## Contract
//!
//! - `save` captures the datastore, then encodes, compresses and writes it
//!   over the previous file (truncate and rewrite, never append).
//! - `load` returns an empty datastore when no snapshot exists yet. Any other
//!   failure is returned so the caller can decide how to degrade;
//!   `load_or_empty` logs it and falls back to an empty datastore.

use crate::config::Config;
use crate::persistence::codec::{self, CodecError, Snapshot};
use crate::storage::{Datastore, StoreLimits};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// File name of the snapshot inside the persistence directory.
pub const SNAPSHOT_FILE_NAME: &str = "datastore.data";

/// Errors that can occur while saving or loading a snapshot.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read snapshot at {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write snapshot at {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to decode snapshot at {path}: {source}")]
    Decode { path: PathBuf, source: CodecError },

    #[error("failed to encode snapshot for {path}: {source}")]
    Encode { path: PathBuf, source: CodecError },

    #[error("snapshot task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Saves and loads datastore snapshots at a fixed path.
#[derive(Debug, Clone)]
pub struct Gateway {
    path: PathBuf,
    limits: StoreLimits,
}

impl Gateway {
    /// Creates a gateway writing `datastore.data` inside `dir`.
    ///
    /// `limits` are applied to datastores produced by `load`.
    pub fn new(dir: impl AsRef<Path>, limits: StoreLimits) -> Self {
        Self {
            path: dir.as_ref().join(SNAPSHOT_FILE_NAME),
            limits,
        }
    }

    /// Creates a gateway from the persistence and store sections of `config`.
    ///
    /// A relative persistence path resolves against the working directory.
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.persistence.path, config.store.limits())
    }

    /// Returns the snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes a snapshot of `store`, replacing any previous snapshot.
    pub fn save(&self, store: &Datastore) -> Result<(), PersistenceError> {
        let snapshot = Snapshot::capture(store);
        let entries = snapshot.entries.len();

        // Refuse before the previous snapshot is truncated
        snapshot.validate().map_err(|source| PersistenceError::Encode {
            path: self.path.clone(),
            source,
        })?;

        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).map_err(|source| self.write_error(source))?;
            }
        }

        let file = File::create(&self.path).map_err(|source| self.write_error(source))?;
        let mut writer = BufWriter::new(file);

        codec::encode(&snapshot, &mut writer).map_err(|source| match source {
            CodecError::Io(source) => self.write_error(source),
            source => PersistenceError::Encode {
                path: self.path.clone(),
                source,
            },
        })?;

        let file = writer
            .into_inner()
            .map_err(|e| self.write_error(e.into_error()))?;
        file.sync_all().map_err(|source| self.write_error(source))?;

        debug!(path = %self.path.display(), entries, "Snapshot saved");
        Ok(())
    }

    /// Saves on the blocking thread pool so async callers never stall a
    /// runtime worker on disk I/O.
    pub async fn save_in_background(&self, store: Arc<Datastore>) -> Result<(), PersistenceError> {
        let gateway = self.clone();
        tokio::task::spawn_blocking(move || gateway.save(&store)).await?
    }

    /// Loads the datastore from the snapshot file.
    ///
    /// A missing file is not an error: it yields an empty datastore.
    pub fn load(&self) -> Result<Datastore, PersistenceError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No snapshot found, starting empty");
                return Ok(Datastore::with_limits(self.limits));
            }
            Err(source) => {
                return Err(PersistenceError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let snapshot = codec::decode(BufReader::new(file)).map_err(|source| {
            PersistenceError::Decode {
                path: self.path.clone(),
                source,
            }
        })?;

        let entries = snapshot.entries.len();
        if entries > self.limits.max_entries {
            warn!(
                path = %self.path.display(),
                entries,
                max_entries = self.limits.max_entries,
                "Snapshot holds more entries than allowed; new inserts will be rejected"
            );
        }

        let age_secs = SystemTime::now()
            .duration_since(snapshot.saved_at())
            .map(|age| age.as_secs())
            .unwrap_or(0);
        info!(path = %self.path.display(), entries, age_secs, "Snapshot loaded");
        Ok(Datastore::from_contents(self.limits, snapshot.into_contents()))
    }

    /// Loads the datastore, falling back to an empty one on any failure.
    pub fn load_or_empty(&self) -> Datastore {
        match self.load() {
            Ok(store) => store,
            Err(e) => {
                error!(error = %e, "Failed to load snapshot, starting with an empty datastore");
                Datastore::with_limits(self.limits)
            }
        }
    }

    fn write_error(&self, source: io::Error) -> PersistenceError {
        PersistenceError::Write {
            path: self.path.clone(),
            source,
        }
    }
}
