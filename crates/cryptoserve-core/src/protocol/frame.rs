// ============================================
// File: crates/cryptoserve-core/src/protocol/frame.rs
// ============================================
//! # Frame Definitions
//!
//! ## Creation Reason
//! Defines the single message shape exchanged between server and peer.
//!
//! ## Wire Layout
//! ```text
//! ┌──────────────┬────────────────┬─────────────────┬──────────────┐
//! │ server_flags │ exercise_flags │ payload_length  │   payload    │
//! │    1 byte    │     1 byte     │ 2 bytes (BE)    │ 0..=65535 B  │
//! └──────────────┴────────────────┴─────────────────┴──────────────┘
//! ```
//!
//! Flags precede the length so flag bits can grow without reframing.
//!
//! ## ⚠️ Important Note for Next Developer
//! - The header layout is fixed; changing it breaks every peer
//! - Exercise flags are opaque to the engine
//!
//! ## Last Modified
//! v0.1.0 - Initial frame definitions

use std::fmt;

use bytes::Bytes;

// ============================================
// Constants
// ============================================

/// Size of the frame header in bytes.
pub const HEADER_SIZE: usize = 4;

/// Largest payload a single frame can carry.
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;

/// Literal payload of an acknowledgement.
pub const OK_PAYLOAD: &[u8] = b"OK";

// ============================================
// ServerFlags
// ============================================

/// Protocol-level flag byte owned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ServerFlags(u8);

impl ServerFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);

    /// Payload is a structured error report.
    pub const ERROR: Self = Self(1 << 7);

    /// Wraps a raw flag byte.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Returns the raw flag byte.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if the error bit is set.
    #[must_use]
    pub const fn is_error(self) -> bool {
        self.contains(Self::ERROR)
    }
}

impl std::ops::BitOr for ServerFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for ServerFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0b{:08b}", self.0)
    }
}

// ============================================
// Header
// ============================================

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Protocol-level flags.
    pub server_flags: ServerFlags,
    /// Exercise-specific flags.
    pub exercise_flags: u8,
    /// Number of payload bytes that follow the header.
    pub length: u16,
}

impl Header {
    /// Returns the payload length as a `usize`.
    #[must_use]
    pub const fn payload_len(&self) -> usize {
        self.length as usize
    }
}

// ============================================
// Frame
// ============================================

/// A complete message: flags plus payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    /// Protocol-level flags.
    pub server_flags: ServerFlags,
    /// Exercise-specific flags.
    pub exercise_flags: u8,
    /// Message body.
    pub payload: Bytes,
}

impl Frame {
    /// Creates an unflagged frame.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            server_flags: ServerFlags::NONE,
            exercise_flags: 0,
            payload: payload.into(),
        }
    }

    /// Creates a frame with both flag bytes set.
    pub fn with_flags(
        payload: impl Into<Bytes>,
        server_flags: ServerFlags,
        exercise_flags: u8,
    ) -> Self {
        Self {
            server_flags,
            exercise_flags,
            payload: payload.into(),
        }
    }

    /// Returns `true` if the frame carries an error report.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.server_flags.is_error()
    }

    /// Total encoded size of this frame.
    #[must_use]
    pub fn wire_len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}
