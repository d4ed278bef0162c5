//! Command Dispatch Module
//!
//! This module implements the command processing layer for VertexKV.
//! It receives request lines, executes them against the datastore,
//! and returns the matching replies.
//!
//! ## Architecture
//!
//! ```text
//! Client Request Line
//!       │
//!       ▼
//! ┌─────────────────┐
//! │ Command::parse  │  (protocol module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   Dispatcher    │  (this module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   Datastore     │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - `SET key value`, `GET key`, `DELETE key`
//! - `ALL`, `FLUSH`

pub mod dispatcher;

pub use dispatcher::Dispatcher;
