// ============================================
// File: crates/cryptoserve-transport/src/lib.rs
// ============================================
//! # Cryptoserve Transport - Session Channel
//!
//! ## Creation Reason
//! Provides the per-connection message interface exercises talk through,
//! built on the core frame codec and bounded by a session timeout.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`channel`]: The framed, timeout-bounded `Channel`
//! - [`traits`]: `PeerStream`, the stream abstraction under a channel
//! - [`listener`]: TCP listener construction
//! - [`error`]: Transport-specific error types
//!
//! ## Data Flow
//! ```text
//!   exercise ──send──► Channel ──encode──► stream ──► peer
//!   exercise ◄─expect─ Channel ◄─decode─── stream ◄── peer
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - A channel belongs to exactly one connection
//! - Every suspension point is a bounded read or write
//!
//! ## Last Modified
//! v0.1.0 - Initial transport layer implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod channel;
pub mod error;
pub mod listener;
pub mod traits;

// Re-export primary types
pub use channel::Channel;
pub use error::{Result, TransportError};
pub use listener::bind_listener;
pub use traits::PeerStream;
