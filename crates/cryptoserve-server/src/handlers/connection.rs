// ============================================
// File: crates/cryptoserve-server/src/handlers/connection.rs
// ============================================
//! # Connection Supervisor
//!
//! ## Creation Reason
//! Runs one peer session from greeting to close, and guarantees that
//! whatever the exercise does, the peer gets a classified report and the
//! accept loop keeps running.
//!
//! ## Session Flow
//! ```text
//! accept ─► greeting ─► selection ─► resolve ─► exercise.run()
//!                           │            │             │
//!                           ▼            ▼             ▼
//!                        report ◄────────┴──── error / panic
//!                           │
//!                           ▼
//!                         close
//! ```
//!
//! ## Outcome Mapping
//! | Result                    | Peer sees                 | Log level |
//! |---------------------------|---------------------------|-----------|
//! | `Ok`                      | nothing more              | info      |
//! | `Exercise(e)`             | report of `e`             | info      |
//! | `TimedOut`                | `ClientTimeoutError`      | info      |
//! | `Closed`                  | nothing                   | info      |
//! | framing / I/O / panic     | `UnexpectedServerError`   | error     |
//!
//! ## ⚠️ Important Note for Next Developer
//! - Internal error detail goes to the log only, never to the peer
//! - A failed report delivery is swallowed; the channel is closed anyway
//!
//! ## Last Modified
//! v0.1.0 - Initial supervisor

use std::any::Any;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, error, info};

use cryptoserve_core::report::{ErrorKind, ExerciseError};
use cryptoserve_exercises::{ExerciseDescriptor, ExerciseRegistry};
use cryptoserve_transport::{Channel, PeerStream, TransportError};

use crate::greeting;

// ============================================
// SessionOutcome
// ============================================

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The exercise ran to completion.
    Completed {
        /// Exercise name.
        exercise: String,
    },
    /// The session ended with a report sent to the peer.
    Failed {
        /// Exercise name, if one was selected.
        exercise: Option<String>,
        /// What the peer was told.
        error: ExerciseError,
    },
    /// The peer went away; nothing was reported.
    Disconnected {
        /// Exercise name, if one was selected.
        exercise: Option<String>,
    },
}

impl SessionOutcome {
    /// Kind of the reported error, if any.
    #[must_use]
    pub const fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Failed { error, .. } => Some(error.kind()),
            _ => None,
        }
    }
}

// ============================================
// ConnectionHandler
// ============================================

/// Supervises sessions against a shared registry.
pub struct ConnectionHandler {
    registry: Arc<ExerciseRegistry>,
    greeting: String,
    timeout: Duration,
}

impl ConnectionHandler {
    /// Creates a handler. The greeting is rendered once, here.
    #[must_use]
    pub fn new(registry: Arc<ExerciseRegistry>, timeout: Duration) -> Self {
        let greeting = greeting::render(&registry);
        Self {
            registry,
            greeting,
            timeout,
        }
    }

    /// Number of exercises offered.
    #[must_use]
    pub fn exercise_count(&self) -> usize {
        self.registry.len()
    }

    /// Runs one session over `stream` and closes it.
    pub async fn handle(&self, stream: impl PeerStream + 'static, peer: SocketAddr) -> SessionOutcome {
        debug!(peer = %peer, "Session started");

        let mut channel = Channel::new(stream, self.timeout);
        let outcome = self.supervise(&mut channel, peer).await;
        channel.close().await;

        debug!(peer = %peer, ?outcome, "Session closed");
        outcome
    }

    async fn supervise(&self, channel: &mut Channel, peer: SocketAddr) -> SessionOutcome {
        let descriptor = match self.select(channel).await {
            Ok(descriptor) => descriptor,
            Err(e) => return conclude(channel, peer, None, e).await,
        };

        let name = descriptor.name().to_owned();
        let exercise = descriptor.exercise();
        info!(peer = %peer, exercise = %name, "Starting exercise");

        let result = AssertUnwindSafe(exercise.run(channel)).catch_unwind().await;

        match result {
            Ok(Ok(())) => {
                info!(peer = %peer, exercise = %name, "Exercise completed");
                SessionOutcome::Completed { exercise: name }
            }
            Ok(Err(e)) => conclude(channel, peer, Some(name), e).await,
            Err(panic) => {
                error!(
                    peer = %peer,
                    exercise = %name,
                    panic = panic_message(panic.as_ref()),
                    "Exercise panicked"
                );
                let report = ExerciseError::unexpected();
                deliver(channel, &report).await;
                SessionOutcome::Failed {
                    exercise: Some(name),
                    error: report,
                }
            }
        }
    }

    /// Sends the greeting and resolves the peer's selection.
    async fn select(&self, channel: &mut Channel) -> Result<ExerciseDescriptor, TransportError> {
        channel.send(self.greeting.as_bytes()).await?;
        let selection = channel.expect_text(None).await?;
        debug!(selection = %selection.trim(), "Selection received");
        Ok(self.registry.resolve(&selection)?.clone())
    }
}

impl std::fmt::Debug for ConnectionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandler")
            .field("exercises", &self.registry.len())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

// ============================================
// Helpers
// ============================================

/// Maps a session error to its outcome, reporting it if the peer is still
/// there.
async fn conclude(
    channel: &mut Channel,
    peer: SocketAddr,
    exercise: Option<String>,
    err: TransportError,
) -> SessionOutcome {
    if err.is_internal() {
        error!(peer = %peer, exercise = ?exercise, error = %err, "Unexpected server error");
    }

    match err.into_report() {
        Some(report) => {
            if report.kind().is_peer_fault() {
                info!(peer = %peer, exercise = ?exercise, error = %report, "Exercise failed");
            }
            deliver(channel, &report).await;
            SessionOutcome::Failed {
                exercise,
                error: report,
            }
        }
        None => {
            info!(peer = %peer, exercise = ?exercise, "Peer disconnected");
            SessionOutcome::Disconnected { exercise }
        }
    }
}

async fn deliver(channel: &mut Channel, report: &ExerciseError) {
    if let Err(e) = channel.report(report).await {
        debug!(error = %e, "Could not deliver error report");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cryptoserve_core::report::ErrorReport;
    use cryptoserve_exercises::Exercise;
    use tokio::io::duplex;

    const TIMEOUT: Duration = Duration::from_secs(5);

    struct Echo;

    #[async_trait]
    impl Exercise for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn run(&self, channel: &mut Channel) -> cryptoserve_transport::Result<()> {
            let payload = channel.expect(Some(3)).await?;
            channel.send(&payload).await
        }
    }

    struct Panics;

    #[async_trait]
    impl Exercise for Panics {
        fn name(&self) -> &str {
            "panics"
        }

        async fn run(&self, _channel: &mut Channel) -> cryptoserve_transport::Result<()> {
            panic!("index out of bounds");
        }
    }

    fn handler(timeout: Duration) -> ConnectionHandler {
        let registry = ExerciseRegistry::from_exercises([
            Arc::new(Echo) as Arc<dyn Exercise>,
            Arc::new(Panics),
        ]);
        ConnectionHandler::new(Arc::new(registry), timeout)
    }

    fn peer_addr() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    async fn report(peer: &mut Channel) -> ErrorReport {
        let frame = peer.receive().await.unwrap();
        assert!(frame.is_error());
        ErrorReport::from_json(&frame.payload).unwrap()
    }

    #[tokio::test]
    async fn test_completed_session() {
        let handler = handler(TIMEOUT);
        let (server, peer) = duplex(1 << 16);
        let mut peer = Channel::new(peer, TIMEOUT);

        let peer_side = async {
            let greeting = peer.expect_text(None).await.unwrap();
            assert!(greeting.contains("0. Echo"));
            peer.send(b"0").await.unwrap();
            peer.send(b"abc").await.unwrap();
            assert_eq!(&peer.expect(Some(3)).await.unwrap()[..], b"abc");
        };

        let (outcome, ()) = tokio::join!(handler.handle(server, peer_addr()), peer_side);
        assert_eq!(
            outcome,
            SessionOutcome::Completed {
                exercise: "echo".into()
            }
        );
    }

    #[tokio::test]
    async fn test_exercise_error_is_reported() {
        let handler = handler(TIMEOUT);
        let (server, peer) = duplex(1 << 16);
        let mut peer = Channel::new(peer, TIMEOUT);

        let peer_side = async {
            peer.expect(None).await.unwrap();
            peer.send(b"echo").await.unwrap();
            peer.send(b"toolong").await.unwrap();
            report(&mut peer).await
        };

        let (outcome, report) = tokio::join!(handler.handle(server, peer_addr()), peer_side);
        assert_eq!(outcome.error_kind(), Some(ErrorKind::DataTransmission));
        assert!(report.error.starts_with("DataTransmissionError: expected 3 bytes"));
    }

    #[tokio::test]
    async fn test_invalid_selection_is_reported() {
        let handler = handler(TIMEOUT);
        let (server, peer) = duplex(1 << 16);
        let mut peer = Channel::new(peer, TIMEOUT);

        let peer_side = async {
            peer.expect(None).await.unwrap();
            peer.send(b"2").await.unwrap();
            report(&mut peer).await
        };

        let (outcome, report) = tokio::join!(handler.handle(server, peer_addr()), peer_side);
        assert_eq!(outcome.error_kind(), Some(ErrorKind::InvalidSelection));
        assert!(report.error.starts_with("InvalidSelectionError"));
    }

    #[tokio::test]
    async fn test_panic_becomes_unexpected_error() {
        let handler = handler(TIMEOUT);
        let (server, peer) = duplex(1 << 16);
        let mut peer = Channel::new(peer, TIMEOUT);

        let peer_side = async {
            peer.expect(None).await.unwrap();
            peer.send(b"Panics").await.unwrap();
            report(&mut peer).await
        };

        let (outcome, report) = tokio::join!(handler.handle(server, peer_addr()), peer_side);
        assert_eq!(outcome.error_kind(), Some(ErrorKind::UnexpectedServer));
        assert!(report.error.starts_with("UnexpectedServerError"));
        assert!(!report.error.contains("index out of bounds"));
        assert!(!report.explanation.contains("index out of bounds"));
    }

    #[tokio::test]
    async fn test_disconnect_before_selection() {
        let handler = handler(TIMEOUT);
        let (server, peer) = duplex(1 << 16);
        drop(peer);

        let outcome = handler.handle(server, peer_addr()).await;
        assert_eq!(outcome, SessionOutcome::Disconnected { exercise: None });
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_peer_times_out() {
        let handler = handler(Duration::from_secs(7));
        let (server, peer) = duplex(1 << 16);
        let mut peer = Channel::new(peer, Duration::from_secs(60));

        let peer_side = async {
            peer.expect(None).await.unwrap();
            report(&mut peer).await
        };

        let (outcome, report) = tokio::join!(handler.handle(server, peer_addr()), peer_side);
        assert_eq!(outcome.error_kind(), Some(ErrorKind::ClientTimeout));
        assert!(report.explanation.contains('7'));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(5u8);
        assert_eq!(panic_message(payload.as_ref()), "<non-string panic payload>");
    }
}
