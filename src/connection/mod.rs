//! Connection Handler Module
//!
//! This module manages individual client connections to VertexKV.
//! Each client connection is handled by its own async task, so a slow or
//! idle client never blocks the others.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Server accept loop                      │
//! │                    (server/mod.rs)                          │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │
//!                        │ accept() (+ TLS handshake)
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ConnectionHandler                           │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │ Read line   │───>│ Parse cmd   │───>│ Execute cmd │     │
//! │  └─────────────┘    └─────────────┘    └─────────────┘     │
//! │                                               │             │
//! │                                               ▼             │
//! │                                      ┌─────────────┐        │
//! │                                      │ Send reply  │        │
//! │                                      └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Transport-agnostic**: the same handler serves TCP and TLS streams
//! - **Pipelining**: several request lines in one packet are answered in order
//! - **Statistics**: tracks connection and command metrics

pub mod handler;

// Re-export commonly used types
pub use handler::{
    handle_connection, ConnectionError, ConnectionHandler, ConnectionStats, MAX_LINE_LENGTH,
};
