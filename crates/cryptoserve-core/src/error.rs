// ============================================
// File: crates/cryptoserve-core/src/error.rs
// ============================================
//! # Core Error Types
//!
//! ## Creation Reason
//! Defines the framing errors raised by the wire codec.
//!
//! ## Main Functionality
//! - `CoreError`: framing failures (header, payload size, truncation)
//! - `Result<T>`: alias used throughout the core crate
//!
//! Exercise-level failures that travel to the peer live in
//! [`crate::report`], not here. A `CoreError` is always a server-side
//! concern and is never forwarded verbatim.
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

// ============================================
// Result Type Alias
// ============================================

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

// ============================================
// CoreError
// ============================================

/// Framing errors raised while encoding or decoding messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Fewer bytes than a full header were available.
    #[error("Header too short: expected {expected} bytes, got {actual}")]
    HeaderTooShort {
        /// Header size in bytes
        expected: usize,
        /// Bytes actually available
        actual: usize,
    },

    /// Payload does not fit in the 16-bit length field.
    #[error("Payload too large: max {max} bytes, got {actual}")]
    PayloadTooLarge {
        /// Maximum encodable payload size
        max: usize,
        /// Size that was requested
        actual: usize,
    },

    /// Buffer ended before the declared payload length.
    #[error("Payload truncated: header declared {declared} bytes, got {actual}")]
    PayloadTruncated {
        /// Length declared by the header
        declared: usize,
        /// Bytes actually available
        actual: usize,
    },
}

impl CoreError {
    /// Creates a `HeaderTooShort` error.
    pub const fn header_too_short(expected: usize, actual: usize) -> Self {
        Self::HeaderTooShort { expected, actual }
    }

    /// Creates a `PayloadTooLarge` error.
    pub const fn payload_too_large(max: usize, actual: usize) -> Self {
        Self::PayloadTooLarge { max, actual }
    }

    /// Creates a `PayloadTruncated` error.
    pub const fn truncated(declared: usize, actual: usize) -> Self {
        Self::PayloadTruncated { declared, actual }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::header_too_short(4, 1);
        assert!(err.to_string().contains('4'));
        assert!(err.to_string().contains('1'));

        let err = CoreError::payload_too_large(65535, 70000);
        assert!(err.to_string().contains("70000"));
    }
}
