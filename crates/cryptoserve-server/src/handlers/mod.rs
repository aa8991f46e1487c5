// ============================================
// File: crates/cryptoserve-server/src/handlers/mod.rs
// ============================================
//! # Connection Handlers
//!
//! ## Creation Reason
//! Provides the per-connection session logic the accept loop hands every
//! new peer to.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`connection`]: Greeting, selection and supervised exercise run
//!
//! ## Handler Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ConnectionHandler                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │   greeting ──► selection ──► registry.resolve()             │
//! │                                   │                         │
//! │                                   ▼                         │
//! │                   catch_unwind(exercise.run(channel))       │
//! │                                   │                         │
//! │                                   ▼                         │
//! │                    SessionOutcome + error report            │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - One handler is shared by every connection task; keep it immutable
//! - Nothing a single peer does may take down the accept loop
//!
//! ## Last Modified
//! v0.1.0 - Initial handlers structure

pub mod connection;

pub use connection::{ConnectionHandler, SessionOutcome};
