// ============================================
// File: crates/cryptoserve-core/src/lib.rs
// ============================================
//! # Cryptoserve Core - Protocol & Error Taxonomy
//!
//! ## Creation Reason
//! Provides the definitions shared by every other Cryptoserve crate: the
//! framed wire format and the classified errors that cross it.
//!
//! ## Main Functionality
//!
//! ### Protocol Module ([`protocol`])
//! - `Frame`, `Header` and `ServerFlags`
//! - Binary codec for the 4-byte header framing
//!
//! ### Report Module ([`report`])
//! - `ExerciseError` and its `ErrorKind`
//! - `ErrorReport`, the JSON body of an error-flagged frame
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              cryptoserve-server                     │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                     │
//! │         ▼                     ▼                     │
//! │  cryptoserve-exercises ─► cryptoserve-transport     │
//! │         │                     │                     │
//! │         └──────────┬──────────┘                     │
//! │                    ▼                                │
//! │             cryptoserve-core  ◄── You are here      │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - No async, no I/O in this crate
//! - Wire format changes break every existing peer
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod protocol;
pub mod report;

// Re-export commonly used items
pub use error::{CoreError, Result};
pub use protocol::{Frame, Header, ServerFlags};
pub use report::{ErrorKind, ErrorReport, ExerciseError};
