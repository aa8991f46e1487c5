// ============================================
// File: crates/cryptoserve-transport/src/listener.rs
// ============================================
//! # TCP Listener
//!
//! ## Creation Reason
//! Builds the accepting socket with the options a restartable server
//! needs, then hands it to Tokio.
//!
//! ## Socket Options
//! - `SO_REUSEADDR`: quick rebinding after restart
//! - Non-blocking: required for Tokio
//!
//! ## Last Modified
//! v0.1.0 - Initial listener implementation

use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;
use tracing::info;

use crate::error::{Result, TransportError};

/// Backlog passed to `listen(2)`.
const LISTEN_BACKLOG: i32 = 1024;

/// Binds a TCP listener to `addr`.
///
/// # Errors
/// - `BindFailed`: if the socket cannot be created, configured or bound
pub fn bind_listener(addr: SocketAddr) -> Result<TcpListener> {
    info!("Binding TCP listener to {}", addr);

    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))
        .map_err(|e| TransportError::io("creating TCP socket", e))?;

    socket
        .set_reuse_address(true)
        .map_err(|e| TransportError::io("setting SO_REUSEADDR", e))?;

    socket
        .set_nonblocking(true)
        .map_err(|e| TransportError::io("setting non-blocking", e))?;

    socket
        .bind(&addr.into())
        .map_err(|e| TransportError::bind_failed(addr, e.to_string()))?;

    socket
        .listen(LISTEN_BACKLOG)
        .map_err(|e| TransportError::bind_failed(addr, e.to_string()))?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener).map_err(|e| TransportError::io("registering listener", e))
}
