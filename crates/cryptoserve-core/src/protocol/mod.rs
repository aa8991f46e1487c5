// ============================================
// File: crates/cryptoserve-core/src/protocol/mod.rs
// ============================================
//! # Protocol Module
//!
//! ## Creation Reason
//! Defines the wire protocol spoken between Cryptoserve and a peer.
//!
//! ### Submodules
//! - [`frame`]: Frame, header and flag definitions
//! - [`codec`]: Binary serialization/deserialization
//!
//! ## Protocol Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Server ─────── greeting (menu text) ─────────────► Peer    │
//! │  Server ◄────── selection (ordinal or name) ─────── Peer    │
//! │                                                             │
//! │  Server ◄══════ exercise rounds (send/expect) ═════► Peer   │
//! │                                                             │
//! │  Server ─────── error report (ERROR flag) ────────► Peer    │
//! │                  (only on failure)                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Every message, in both directions, is one frame
//! - Big-endian byte order for multi-byte integers
//!
//! ## Last Modified
//! v0.1.0 - Initial protocol definitions

pub mod codec;
pub mod frame;

// Re-export primary types
pub use codec::{Codec, FrameCodec};
pub use frame::{Frame, Header, ServerFlags, HEADER_SIZE, MAX_PAYLOAD_SIZE, OK_PAYLOAD};
