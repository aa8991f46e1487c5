// ============================================
// File: crates/cryptoserve-server/src/lib.rs
// ============================================
//! # Cryptoserve Server Library
//!
//! ## Creation Reason
//! Provides the server side of Cryptoserve: accepting peers, greeting
//! them, running the exercise they select, and reporting how it went.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`config`]: Server configuration management
//! - [`server`]: Accept loop and lifecycle
//! - [`handlers`]: Per-connection session supervision
//! - [`greeting`]: The menu every peer receives first
//! - [`client`]: Scripted peer used by the `cryptoserve-client` binary
//! - [`error`]: Server-specific error types
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Cryptoserve Server                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌─────────────┐     ┌─────────────┐     ┌─────────────────┐    │
//! │  │   Config    │────►│   Server    │────►│ ConnectionHandler│   │
//! │  │             │     │ accept loop │     │  (one per peer) │    │
//! │  └─────────────┘     └─────────────┘     └────────┬────────┘    │
//! │                                                   │             │
//! │                                                   ▼             │
//! │                                         ┌──────────────────┐    │
//! │                                         │ ExerciseRegistry │    │
//! │                                         └──────────────────┘    │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                     Transport Layer                             │
//! │        Channel (framed, timeout-bounded) over TcpStream         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Configuration changes require restart (no hot-reload)
//! - The registry is built once and never mutated
//!
//! ## Last Modified
//! v0.1.0 - Initial server library

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod greeting;
pub mod handlers;
pub mod server;

// Re-export primary types
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use handlers::{ConnectionHandler, SessionOutcome};
pub use server::Server;
