// ============================================
// File: crates/cryptoserve-exercises/src/testing.rs
// ============================================
//! # Test Peers
//!
//! ## Creation Reason
//! Runs an exercise's server half on an in-memory duplex stream so unit
//! tests can drive the peer half through the same `Channel` type.
//!
//! ## Last Modified
//! v0.1.0 - Initial test helpers

use std::future::Future;
use std::time::Duration;

use tokio::io::duplex;
use tokio::task::JoinHandle;

use cryptoserve_core::report::{ErrorKind, ExerciseError};
use cryptoserve_transport::{Channel, Result, TransportError};

pub(crate) const TIMEOUT: Duration = Duration::from_secs(5);

/// Runs the server half in a task and returns the peer half.
pub(crate) fn spawn<F, Fut>(server: F) -> (Channel, JoinHandle<Result<()>>)
where
    F: FnOnce(Channel) -> Fut,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let (server_stream, peer_stream) = duplex(1 << 17);
    let handle = tokio::spawn(server(Channel::new(server_stream, TIMEOUT)));
    (Channel::new(peer_stream, TIMEOUT), handle)
}

/// Unwraps the exercise error a server half ended with.
pub(crate) fn exercise_error(result: Result<()>) -> ExerciseError {
    match result {
        Err(TransportError::Exercise(e)) => e,
        other => panic!("expected an exercise error, got {other:?}"),
    }
}

/// Asserts that a server half ended with an exercise error of `kind`.
pub(crate) fn assert_kind(result: Result<()>, kind: ErrorKind) -> ExerciseError {
    let err = exercise_error(result);
    assert_eq!(err.kind(), kind, "{err}");
    err
}
