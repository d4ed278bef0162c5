//! # VertexKV - An In-Memory Key-Value Store with Snapshot Persistence
//!
//! VertexKV keeps a bounded map of validated keys to typed values in memory,
//! serves it to many concurrent clients over a line-oriented text protocol
//! (optionally behind mutual TLS), and periodically writes compressed
//! snapshots to disk so a restart picks up where it left off.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              VertexKV                                   │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │   Server    │───>│ Connection  │───>│ Dispatcher  │                  │
//! │  │ (TCP / TLS) │    │  Handler    │    │             │                  │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘                  │
//! │                                               │                         │
//! │                                               ▼                         │
//! │  ┌─────────────┐    ┌──────────────────────────────────────────────┐   │
//! │  │  Protocol   │    │                 Datastore                    │   │
//! │  │  Command /  │    │   entries + expiry bookkeeping               │   │
//! │  │  Reply      │    │   one RwLock, bounded by max_entries         │   │
//! │  └─────────────┘    └──────────────────────────────────────────────┘   │
//! │                                               ▲                         │
//! │                                               │ snapshot                │
//! │                     ┌─────────────────────────┴───────────────────────┐ │
//! │                     │   SnapshotScheduler ──> Gateway ──> gzip JSON   │ │
//! │                     │      (Background Tokio Task)                    │ │
//! │                     └─────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use vertexkv::config::Config;
//! use vertexkv::connection::ConnectionStats;
//! use vertexkv::persistence::{Gateway, SnapshotScheduler};
//! use vertexkv::server::Server;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let gateway = Gateway::from_config(&config);
//!
//!     // Restore the last snapshot (or start empty)
//!     let store = Arc::new(gateway.load_or_empty());
//!
//!     let server = Server::bind(&config.server, Arc::clone(&store), Arc::new(ConnectionStats::new())).await?;
//!     let scheduler = SnapshotScheduler::start(Arc::clone(&store), gateway, config.snapshot_interval());
//!
//!     server.run().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Supported Commands
//!
//! - `SET key value` - insert a new key (existing keys are rejected)
//! - `GET key`
//! - `DELETE key`
//! - `ALL` - list every key-value pair
//! - `FLUSH` - remove every key
//!
//! ## Module Overview
//!
//! - [`storage`]: Thread-safe bounded datastore and key validation
//! - [`protocol`]: Request line parsing and reply encoding
//! - [`commands`]: Maps requests to datastore operations
//! - [`connection`]: Per-client connection handling
//! - [`server`]: Listener, accept loop and mutual TLS
//! - [`persistence`]: Snapshot codec, gateway and periodic scheduler
//! - [`config`]: TOML configuration with defaults

pub mod commands;
pub mod config;
pub mod connection;
pub mod persistence;
pub mod protocol;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::Dispatcher;
pub use config::Config;
pub use connection::{handle_connection, ConnectionStats};
pub use persistence::{Gateway, SnapshotScheduler};
pub use protocol::{Command, Reply};
pub use server::Server;
pub use storage::{Datastore, StoreError, Value};

/// The default port VertexKV listens on
pub const DEFAULT_PORT: u16 = 6380;

/// The default host VertexKV binds to
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Version of VertexKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
