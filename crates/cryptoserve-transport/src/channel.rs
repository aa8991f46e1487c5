// ============================================
// File: crates/cryptoserve-transport/src/channel.rs
// ============================================
//! # Session Channel
//!
//! ## Creation Reason
//! Gives exercises a framed, timeout-bounded duplex interface to their
//! peer so they can be written as a plain sequence of send/expect rounds.
//!
//! ## Main Functionality
//! - `send` / `send_with_flags`: write one complete frame
//! - `receive`: read exactly one frame (header, then declared payload)
//! - `expect` / `expect_with` / `expect_text`: receive plus validation
//! - `ok` / `error` / `report`: standard server replies
//!
//! ## Operation State Machine
//! ```text
//!   Idle ──► Reading(header) ──► Reading(payload) ──► Idle
//!                 │                    │
//!                 ├──► TimedOut        ├──► TimedOut
//!                 └──► Closed          └──► Closed
//! ```
//! Every call starts and ends at `Idle`; no partial frame survives a call.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Each operation is individually bounded by the session timeout
//! - A short read is a disconnect, never a short message
//! - The same type drives the peer side in tests
//!
//! ## Last Modified
//! v0.1.0 - Initial channel implementation

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, trace};

use cryptoserve_core::protocol::codec::{decode_header, encode};
use cryptoserve_core::protocol::{Frame, ServerFlags, HEADER_SIZE, OK_PAYLOAD};
use cryptoserve_core::report::ExerciseError;

use crate::error::{Result, TransportError};
use crate::traits::PeerStream;

// ============================================
// Channel
// ============================================

/// Framed duplex channel to one peer.
///
/// # Example
/// ```ignore
/// async fn echo(channel: &mut Channel) -> Result<()> {
///     let payload = channel.expect(None).await?;
///     channel.send(&payload).await
/// }
/// ```
pub struct Channel {
    /// Underlying byte stream.
    stream: Box<dyn PeerStream>,
    /// Bound for every read and write.
    timeout: Duration,
}

impl Channel {
    /// Creates a channel over `stream`.
    ///
    /// # Arguments
    /// * `stream` - Connected byte stream
    /// * `timeout` - Bound applied to each send and receive
    pub fn new(stream: impl PeerStream + 'static, timeout: Duration) -> Self {
        Self {
            stream: Box::new(stream),
            timeout,
        }
    }

    /// Returns the configured per-operation timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    // ========================================
    // Sending
    // ========================================

    /// Sends `data` with no flags set.
    ///
    /// # Errors
    /// Fails on timeout, disconnect, or if `data` exceeds 65535 bytes.
    pub async fn send(&mut self, data: &[u8]) -> Result<()> {
        self.send_with_flags(data, ServerFlags::NONE, 0).await
    }

    /// Sends `data` with explicit flag bytes.
    ///
    /// # Errors
    /// Fails on timeout, disconnect, or if `data` exceeds 65535 bytes.
    pub async fn send_with_flags(
        &mut self,
        data: &[u8],
        server_flags: ServerFlags,
        exercise_flags: u8,
    ) -> Result<()> {
        let frame = encode(data, server_flags, exercise_flags)?;
        trace!(
            len = data.len(),
            server_flags = %server_flags,
            exercise_flags,
            "Sending frame"
        );

        let timeout = self.timeout;
        let write = async {
            self.stream.write_all(&frame).await?;
            self.stream.flush().await
        };

        match tokio::time::timeout(timeout, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(TransportError::io("writing frame", e)),
            Err(_) => Err(TransportError::timed_out("send", timeout)),
        }
    }

    /// Sends the literal acknowledgement `OK`.
    ///
    /// # Errors
    /// Fails on timeout or disconnect.
    pub async fn ok(&mut self) -> Result<()> {
        self.send(OK_PAYLOAD).await
    }

    /// Sends `message` with the error flag set.
    ///
    /// # Errors
    /// Fails on timeout or disconnect.
    pub async fn error(&mut self, message: &str) -> Result<()> {
        self.send_with_flags(message.as_bytes(), ServerFlags::ERROR, 0)
            .await
    }

    /// Sends the structured report for `err` with the error flag set.
    ///
    /// # Errors
    /// Fails on timeout or disconnect.
    pub async fn report(&mut self, err: &ExerciseError) -> Result<()> {
        self.error(&err.report().to_json()).await
    }

    // ========================================
    // Receiving
    // ========================================

    /// Receives exactly one frame.
    ///
    /// # Errors
    /// - `Closed` if the peer disconnects before the frame is complete
    /// - `TimedOut` if the frame does not arrive within the timeout
    pub async fn receive(&mut self) -> Result<Frame> {
        let timeout = self.timeout;
        match tokio::time::timeout(timeout, self.read_frame()).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::timed_out("receive", timeout)),
        }
    }

    async fn read_frame(&mut self) -> Result<Frame> {
        let mut header = [0u8; HEADER_SIZE];
        self.stream
            .read_exact(&mut header)
            .await
            .map_err(|e| TransportError::io("reading header", e))?;
        let header = decode_header(&header)?;

        let mut payload = vec![0u8; header.payload_len()];
        self.stream
            .read_exact(&mut payload)
            .await
            .map_err(|e| TransportError::io("reading payload", e))?;

        trace!(
            len = payload.len(),
            server_flags = %header.server_flags,
            exercise_flags = header.exercise_flags,
            "Received frame"
        );

        Ok(Frame::with_flags(
            payload,
            header.server_flags,
            header.exercise_flags,
        ))
    }

    /// Receives a frame and returns its payload.
    ///
    /// If `length` is `Some(n)` with `n > 0`, a payload of any other size
    /// raises a `DataTransmission` error.
    ///
    /// # Errors
    /// Fails on size mismatch, timeout or disconnect.
    pub async fn expect(&mut self, length: Option<usize>) -> Result<Bytes> {
        self.expect_with(length, |frame| Ok(frame.payload.clone()))
            .await
    }

    /// Receives a frame, checks its size, and hands it to `verifier`.
    ///
    /// The verifier sees the payload and both flag bytes; anything else it
    /// needs is captured by the closure. Its result is returned as-is.
    ///
    /// # Errors
    /// Fails on size mismatch, verifier rejection, timeout or disconnect.
    pub async fn expect_with<T, F>(&mut self, length: Option<usize>, verifier: F) -> Result<T>
    where
        F: FnOnce(&Frame) -> std::result::Result<T, ExerciseError> + Send,
    {
        let frame = self.receive().await?;

        if let Some(expected) = length.filter(|&n| n > 0) {
            let actual = frame.payload.len();
            if actual != expected {
                debug!(expected, actual, "Payload size mismatch");
                return Err(size_mismatch(expected, actual).into());
            }
        }

        Ok(verifier(&frame)?)
    }

    /// Receives a UTF-8 text payload.
    ///
    /// If `length` is `Some(n)` with `n > 0`, the decoded text must contain
    /// exactly `n` characters.
    ///
    /// # Errors
    /// Fails on invalid UTF-8, character-count mismatch, timeout or
    /// disconnect.
    pub async fn expect_text(&mut self, length: Option<usize>) -> Result<String> {
        let text = self
            .expect_with(None, |frame| {
                String::from_utf8(frame.payload.to_vec()).map_err(|_| {
                    ExerciseError::data_transmission("message is not valid UTF-8")
                        .with_explanation("The server expected text but the bytes you sent do not decode as UTF-8.")
                        .with_hint("Are you encoding your text as UTF-8 before sending it?")
                })
            })
            .await?;

        if let Some(expected) = length.filter(|&n| n > 0) {
            let actual = text.chars().count();
            if actual != expected {
                return Err(ExerciseError::data_transmission(format!(
                    "expected string of length {expected} but received string of length {actual}"
                ))
                .into());
            }
        }

        Ok(text)
    }

    // ========================================
    // Lifecycle
    // ========================================

    /// Flushes and shuts down the write half.
    ///
    /// Errors are ignored; the peer may already be gone.
    pub async fn close(&mut self) {
        let timeout = self.timeout;
        let shutdown = async {
            let _ = self.stream.flush().await;
            self.stream.shutdown().await
        };

        match tokio::time::timeout(timeout, shutdown).await {
            Ok(Ok(())) => trace!("Channel closed"),
            Ok(Err(e)) => debug!("Channel shutdown error: {}", e),
            Err(_) => debug!("Channel shutdown timed out"),
        }
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Builds the error for a payload of the wrong size.
fn size_mismatch(expected: usize, actual: usize) -> ExerciseError {
    let plural = if expected == 1 { "" } else { "s" };
    ExerciseError::data_transmission(format!(
        "expected {expected} byte{plural} but received {actual} instead"
    ))
    .with_explanation("The message you sent does not have the size this step of the exercise requires.")
    .with_hint("Does the length in your header match the number of payload bytes?")
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use cryptoserve_core::report::{ErrorKind, ErrorReport};
    use tokio::io::duplex;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn pair() -> (Channel, Channel) {
        let (server, peer) = duplex(1 << 17);
        (Channel::new(server, TIMEOUT), Channel::new(peer, TIMEOUT))
    }

    #[tokio::test]
    async fn test_send_receive_with_flags() {
        let (mut server, mut peer) = pair();

        server
            .send_with_flags(b"cards", ServerFlags::NONE, 0x02)
            .await
            .unwrap();

        let frame = peer.receive().await.unwrap();
        assert_eq!(&frame.payload[..], b"cards");
        assert_eq!(frame.exercise_flags, 0x02);
        assert!(!frame.is_error());
    }

    #[tokio::test]
    async fn test_empty_and_max_payloads() {
        let (mut server, mut peer) = pair();
        let big = vec![0xAB; u16::MAX as usize];

        peer.send(b"").await.unwrap();
        peer.send(&big).await.unwrap();

        assert!(server.expect(None).await.unwrap().is_empty());
        assert_eq!(server.expect(None).await.unwrap().len(), big.len());
    }

    #[tokio::test]
    async fn test_send_too_large_fails() {
        let (mut server, _peer) = pair();
        let result = server.send(&vec![0u8; 65536]).await;
        assert!(matches!(result, Err(TransportError::Frame(_))));
    }

    #[tokio::test]
    async fn test_expect_length_mismatch() {
        for expected in [1usize, 2, 16] {
            let (mut server, mut peer) = pair();
            peer.send(&vec![0u8; expected + 1]).await.unwrap();
            peer.send(&vec![0u8; expected]).await.unwrap();

            let err = server.expect(Some(expected)).await.unwrap_err();
            match err {
                TransportError::Exercise(e) => assert_eq!(e.kind(), ErrorKind::DataTransmission),
                other => panic!("unexpected error: {other}"),
            }

            assert_eq!(server.expect(Some(expected)).await.unwrap().len(), expected);
        }
    }

    #[tokio::test]
    async fn test_expect_zero_length_is_unchecked() {
        let (mut server, mut peer) = pair();
        peer.send(b"anything").await.unwrap();
        assert_eq!(&server.expect(Some(0)).await.unwrap()[..], b"anything");
    }

    #[tokio::test]
    async fn test_expect_with_sees_flags_and_context() {
        let (mut server, mut peer) = pair();
        let bankroll = 100u16;

        peer.send_with_flags(&[0x00, 0x32], ServerFlags::NONE, 0x07)
            .await
            .unwrap();

        let (bet, flags) = server
            .expect_with(Some(2), |frame| {
                let bet = u16::from_be_bytes([frame.payload[0], frame.payload[1]]);
                if bet > bankroll {
                    return Err(ExerciseError::invalid_parameter("bet is too high"));
                }
                Ok((bet, frame.exercise_flags))
            })
            .await
            .unwrap();

        assert_eq!(bet, 50);
        assert_eq!(flags, 0x07);
    }

    #[tokio::test]
    async fn test_verifier_error_propagates() {
        let (mut server, mut peer) = pair();
        peer.send(b"x").await.unwrap();

        let err = server
            .expect_with(None, |_| -> std::result::Result<(), _> {
                Err(ExerciseError::data_mismatch("nope"))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Exercise(ref e) if e.kind() == ErrorKind::DataMismatch));
    }

    #[tokio::test]
    async fn test_expect_text() {
        let (mut server, mut peer) = pair();
        peer.send("héllo".as_bytes()).await.unwrap();
        peer.send(&[0xFF, 0xFE]).await.unwrap();
        peer.send(b"abc").await.unwrap();

        assert_eq!(server.expect_text(Some(5)).await.unwrap(), "héllo");
        assert!(matches!(
            server.expect_text(None).await,
            Err(TransportError::Exercise(ref e)) if e.kind() == ErrorKind::DataTransmission
        ));
        assert!(server.expect_text(Some(4)).await.is_err());
    }

    #[tokio::test]
    async fn test_ok_and_report() {
        let (mut server, mut peer) = pair();

        server.ok().await.unwrap();
        server
            .report(&ExerciseError::invalid_length("too long").with_hint("shorter"))
            .await
            .unwrap();

        let ok = peer.receive().await.unwrap();
        assert_eq!(&ok.payload[..], OK_PAYLOAD);
        assert!(!ok.is_error());

        let report = peer.receive().await.unwrap();
        assert!(report.is_error());
        let parsed = ErrorReport::from_json(&report.payload).unwrap();
        assert_eq!(parsed.error, "InvalidLengthError: too long");
        assert_eq!(parsed.hints, vec!["shorter"]);
    }

    #[tokio::test]
    async fn test_disconnect_mid_header_is_closed() {
        let (server, mut peer) = duplex(64);
        let mut server = Channel::new(server, TIMEOUT);

        peer.write_all(&[0x00, 0x00]).await.unwrap();
        drop(peer);

        assert!(matches!(server.receive().await, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_short_payload_is_closed() {
        let (server, mut peer) = duplex(64);
        let mut server = Channel::new(server, TIMEOUT);

        peer.write_all(&[0x00, 0x00, 0x00, 0x08, b'a', b'b']).await.unwrap();
        drop(peer);

        assert!(matches!(server.receive().await, Err(TransportError::Closed)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_times_out() {
        let (server, _peer) = duplex(64);
        let mut server = Channel::new(server, Duration::from_secs(3));

        let err = server.receive().await.unwrap_err();
        assert!(matches!(err, TransportError::TimedOut { timeout, .. } if timeout == Duration::from_secs(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_times_out_when_peer_stops_reading() {
        let (server, _peer) = duplex(8);
        let mut server = Channel::new(server, Duration::from_secs(3));

        let err = server.send(&[0u8; 64]).await.unwrap_err();
        assert!(matches!(err, TransportError::TimedOut { operation: "send", .. }));
    }
}
