// ============================================
// File: crates/cryptoserve-transport/src/error.rs
// ============================================
//! # Transport Error Types
//!
//! ## Creation Reason
//! Defines the errors a session channel operation can end with. Exercises
//! propagate these with `?`, so a classified [`ExerciseError`] raised by a
//! verifier travels through the same type as a timeout or a disconnect.
//!
//! ## Error Categories
//! 1. **Exercise**: the peer violated the exercise protocol
//! 2. **Terminal**: timeout or peer disconnect; the session is over
//! 3. **Internal**: framing or I/O failures on the server side
//!
//! ## ⚠️ Important Note for Next Developer
//! - Use [`TransportError::into_report`] to decide what the peer sees;
//!   never send `to_string()` of an internal error
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use cryptoserve_core::error::CoreError;
use cryptoserve_core::report::ExerciseError;

// ============================================
// Result Type Alias
// ============================================

/// Result type for channel operations and exercises.
pub type Result<T> = std::result::Result<T, TransportError>;

// ============================================
// TransportError
// ============================================

/// Errors raised by the session channel.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The peer violated the exercise protocol.
    #[error(transparent)]
    Exercise(#[from] ExerciseError),

    /// A read or write did not finish within the session timeout.
    #[error("{operation} timed out after {}s", timeout.as_secs_f64())]
    TimedOut {
        /// Which operation was pending
        operation: &'static str,
        /// Configured session timeout
        timeout: Duration,
    },

    /// The peer closed the connection.
    #[error("Connection closed by peer")]
    Closed,

    /// Frame could not be encoded or decoded.
    #[error(transparent)]
    Frame(#[from] CoreError),

    /// Failed to bind a listening socket.
    #[error("Failed to bind to {addr}: {reason}")]
    BindFailed {
        /// Address we tried to bind to
        addr: SocketAddr,
        /// Why binding failed
        reason: String,
    },

    /// I/O error from the underlying stream.
    #[error("I/O error: {context}")]
    Io {
        /// What operation was being performed
        context: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

impl TransportError {
    /// Creates a `TimedOut` error.
    pub const fn timed_out(operation: &'static str, timeout: Duration) -> Self {
        Self::TimedOut { operation, timeout }
    }

    /// Creates a `BindFailed` error.
    pub fn bind_failed(addr: SocketAddr, reason: impl Into<String>) -> Self {
        Self::BindFailed {
            addr,
            reason: reason.into(),
        }
    }

    /// Wraps an I/O error, folding disconnects into `Closed`.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => Self::Closed,
            _ => Self::Io {
                context: context.into(),
                source,
            },
        }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` if the error came from the server, not the peer.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Frame(_) | Self::Io { .. } | Self::BindFailed { .. }
        )
    }

    /// Maps this error to the report the peer should receive.
    ///
    /// Returns `None` when the peer is already gone.
    #[must_use]
    pub fn into_report(self) -> Option<ExerciseError> {
        match self {
            Self::Exercise(err) => Some(err),
            Self::TimedOut { timeout, .. } => Some(ExerciseError::client_timeout(timeout)),
            Self::Closed => None,
            Self::Frame(_) | Self::Io { .. } | Self::BindFailed { .. } => {
                Some(ExerciseError::unexpected())
            }
        }
    }
}

// ============================================
// Tests
// ============================================
