// ============================================
// File: crates/cryptoserve-transport/src/traits.rs
// ============================================
//! # Transport Traits
//!
//! ## Creation Reason
//! Abstracts the byte stream under a session channel so the same channel
//! code runs over TCP sockets in production and in-memory duplex pipes in
//! tests.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Implementations must be `Send` to live inside spawned tasks
//! - Blanket-implemented; never implement it by hand
//!
//! ## Last Modified
//! v0.1.0 - Initial trait definitions

use tokio::io::{AsyncRead, AsyncWrite};

/// Bidirectional byte stream a [`Channel`](crate::Channel) can own.
///
/// # Example
/// ```
/// use cryptoserve_transport::traits::PeerStream;
///
/// fn assert_stream<S: PeerStream>(_: &S) {}
///
/// let (a, _b) = tokio::io::duplex(64);
/// assert_stream(&a);
/// ```
pub trait PeerStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> PeerStream for T where T: AsyncRead + AsyncWrite + Unpin + Send {}
