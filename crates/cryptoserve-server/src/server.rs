// ============================================
// File: crates/cryptoserve-server/src/server.rs
// ============================================
//! # Server Orchestrator
//!
//! ## Creation Reason
//! Owns the listening socket and the accept loop, handing every
//! connection to the shared [`ConnectionHandler`] on its own task.
//!
//! ## Main Functionality
//! - `Server`: lifecycle (bind, serve, shutdown)
//! - One spawned task per accepted connection
//! - Shutdown via [`Server::shutdown`] or Ctrl+C
//!
//! ## Server Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Server                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │   TcpListener ──accept──► tokio::spawn ──► ConnectionHandler│
//! │        ▲                       │                            │
//! │        │                       ▼                            │
//! │   select! { shutdown_rx, ctrl_c }      Arc<ExerciseRegistry>│
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Shutdown stops accepting; sessions already running finish on their
//!   own, bounded by the session timeout
//! - Accept errors are logged and the loop continues
//!
//! ## Last Modified
//! v0.1.0 - Initial server implementation

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use cryptoserve_exercises::ExerciseRegistry;
use cryptoserve_transport::bind_listener;

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::handlers::{ConnectionHandler, SessionOutcome};

/// Pause after a failed `accept` so a persistent error does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

// ============================================
// Server
// ============================================

/// Cryptoserve server.
///
/// # Lifecycle
/// 1. Create with `Server::new(config, registry)`
/// 2. Start with `server.run().await`
/// 3. Stop via `server.shutdown()` or Ctrl+C
pub struct Server {
    config: ServerConfig,
    handler: Arc<ConnectionHandler>,
    shutdown: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Creates a server over an already discovered registry.
    #[must_use]
    pub fn new(config: ServerConfig, registry: Arc<ExerciseRegistry>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let handler = Arc::new(ConnectionHandler::new(registry, config.session_timeout()));

        Self {
            config,
            handler,
            shutdown: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Binds the configured address and serves until shutdown.
    ///
    /// # Errors
    /// Returns `StartupFailed` if the address cannot be bound.
    pub async fn run(&self) -> Result<()> {
        let addr = self.config.listen_addr();
        let listener = bind_listener(addr).map_err(|e| {
            error!("Failed to bind {}: {}", addr, e);
            ServerError::startup_failed(e.to_string())
        })?;

        self.serve(listener).await
    }

    /// Serves connections from `listener` until shutdown.
    ///
    /// # Errors
    /// Returns an error if the listener's address cannot be read.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        info!(
            addr = %local_addr,
            exercises = self.handler.exercise_count(),
            timeout_secs = self.config.session.timeout_secs,
            "Cryptoserve listening"
        );

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        };
        tokio::pin!(ctrl_c);

        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    debug!("Accept loop received shutdown signal");
                    break;
                }
                () = &mut ctrl_c => {
                    info!("Received shutdown signal");
                    self.shutdown.store(true, Ordering::SeqCst);
                    break;
                }
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            if self.shutdown.load(Ordering::SeqCst) {
                                break;
                            }
                            self.spawn_session(stream, peer);
                        }
                        Err(e) => {
                            if !self.shutdown.load(Ordering::SeqCst) {
                                warn!("Accept error: {}", e);
                                tokio::time::sleep(ACCEPT_BACKOFF).await;
                            }
                        }
                    }
                }
            }
        }

        info!("Server shutdown complete");
        Ok(())
    }

    /// Runs one session on its own task.
    fn spawn_session(&self, stream: tokio::net::TcpStream, peer: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!(peer = %peer, "Failed to set TCP_NODELAY: {}", e);
        }

        info!(peer = %peer, "Accepted connection");
        let handler = Arc::clone(&self.handler);

        tokio::spawn(async move {
            match handler.handle(stream, peer).await {
                SessionOutcome::Completed { exercise } => {
                    info!(peer = %peer, exercise = %exercise, "Session finished");
                }
                SessionOutcome::Failed { exercise, error } => {
                    info!(
                        peer = %peer,
                        exercise = exercise.as_deref().unwrap_or("-"),
                        kind = %error.kind(),
                        "Session failed"
                    );
                }
                SessionOutcome::Disconnected { exercise } => {
                    info!(
                        peer = %peer,
                        exercise = exercise.as_deref().unwrap_or("-"),
                        "Session disconnected"
                    );
                }
            }
        });
    }

    /// Triggers server shutdown programmatically.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());
    }

    /// Returns `true` once shutdown has been requested.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("listen_addr", &self.config.listen_addr())
            .field("handler", &self.handler)
            .field("shutdown", &self.shutdown.load(Ordering::SeqCst))
            .finish()
    }
}

// ============================================
// Tests
// ============================================
