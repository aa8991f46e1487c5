// ============================================
// File: crates/cryptoserve-core/src/report.rs
// ============================================
//! # Exercise Errors and Error Reports
//!
//! ## Creation Reason
//! Every failure a peer can cause, or be told about, is an
//! [`ExerciseError`]. Errors are classified by [`ErrorKind`] and carry a
//! human-readable explanation plus remediation hints so the peer can fix
//! its half of the protocol.
//!
//! ## Main Functionality
//! - `ErrorKind`: closed set of failure classes with stable wire names
//! - `ExerciseError`: kind + message + explanation + hints
//! - `ErrorReport`: the serde shape sent to the peer as JSON
//!
//! ## Report Format
//! ```text
//! {"error":"DataMismatchError: hash does not match","explanation":"...","hints":["..."]}
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - NEVER put internal error detail into a report; use
//!   [`ExerciseError::unexpected`] for anything the peer did not cause
//! - Wire names are part of the protocol, do not rename them
//!
//! ## Last Modified
//! v0.1.0 - Initial error taxonomy

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================
// ErrorKind
// ============================================

/// Classification of an exercise failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Generic exercise failure.
    Exercise,
    /// Padding was missing, too long, or not null bytes.
    InvalidPadding,
    /// Input length is outside what the exercise accepts.
    InvalidLength,
    /// A value computed by the peer does not match the server's.
    DataMismatch,
    /// A message had the wrong size or could not be decoded.
    DataTransmission,
    /// A parameter supplied by the peer is not acceptable.
    InvalidParameter,
    /// The peer did not respond within the configured timeout.
    ClientTimeout,
    /// Something went wrong on the server side.
    UnexpectedServer,
    /// The exercise selection did not resolve to an exercise.
    InvalidSelection,
}

impl ErrorKind {
    /// Name used for this kind on the wire.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Exercise => "ExerciseError",
            Self::InvalidPadding => "InvalidPaddingError",
            Self::InvalidLength => "InvalidLengthError",
            Self::DataMismatch => "DataMismatchError",
            Self::DataTransmission => "DataTransmissionError",
            Self::InvalidParameter => "InvalidParameterError",
            Self::ClientTimeout => "ClientTimeoutError",
            Self::UnexpectedServer => "UnexpectedServerError",
            Self::InvalidSelection => "InvalidSelectionError",
        }
    }

    /// Returns `true` if the peer caused this failure.
    #[must_use]
    pub const fn is_peer_fault(self) -> bool {
        !matches!(self, Self::UnexpectedServer)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

// ============================================
// ExerciseError
// ============================================

/// A classified exercise failure.
///
/// # Example
/// ```
/// use cryptoserve_core::report::{ErrorKind, ExerciseError};
///
/// let err = ExerciseError::invalid_length("input data is too large")
///     .with_explanation("The length must fit in a single byte.")
///     .with_hint("Are you sending less than 256 bytes?");
///
/// assert_eq!(err.kind(), ErrorKind::InvalidLength);
/// assert_eq!(err.hints().len(), 1);
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ExerciseError {
    kind: ErrorKind,
    message: String,
    explanation: String,
    hints: Vec<String>,
}

impl ExerciseError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            explanation: String::new(),
            hints: Vec::new(),
        }
    }

    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates a generic `Exercise` error.
    pub fn exercise(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Exercise, message)
    }

    /// Creates an `InvalidPadding` error.
    pub fn invalid_padding(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidPadding, message)
    }

    /// Creates an `InvalidLength` error.
    pub fn invalid_length(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidLength, message)
    }

    /// Creates a `DataMismatch` error.
    pub fn data_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataMismatch, message)
    }

    /// Creates a `DataTransmission` error.
    pub fn data_transmission(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataTransmission, message)
    }

    /// Creates an `InvalidParameter` error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParameter, message)
    }

    /// Creates an `InvalidSelection` error.
    pub fn invalid_selection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidSelection, message)
    }

    /// Creates a `ClientTimeout` error naming the configured timeout.
    pub fn client_timeout(timeout: Duration) -> Self {
        let secs = timeout.as_secs_f64();
        Self::new(ErrorKind::ClientTimeout, "client took too long to respond").with_explanation(
            format!(
                "The server waited {secs} seconds for your client without receiving a complete message, so the connection is being closed."
            ),
        )
        .with_hints([
            "Is your client sending the 4-byte header before the payload?",
            "Does the declared payload length match the number of bytes you send?",
        ])
    }

    /// Creates the generic `UnexpectedServer` error.
    ///
    /// Carries no detail about what actually failed.
    #[must_use]
    pub fn unexpected() -> Self {
        Self::new(ErrorKind::UnexpectedServer, "an unexpected server error occurred")
            .with_explanation(
                "The server ran into a problem it could not recover from. This is not caused by your client.",
            )
    }

    // ========================================
    // Builders
    // ========================================

    /// Sets the explanation.
    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    /// Appends a hint.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }

    /// Appends several hints, keeping their order.
    #[must_use]
    pub fn with_hints<I, S>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hints.extend(hints.into_iter().map(Into::into));
        self
    }

    // ========================================
    // Accessors
    // ========================================

    /// Failure class.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Short description of what went wrong.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Longer human-readable explanation.
    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Remediation hints, in order.
    #[must_use]
    pub fn hints(&self) -> &[String] {
        &self.hints
    }

    /// Builds the wire report for this error.
    #[must_use]
    pub fn report(&self) -> ErrorReport {
        ErrorReport::from(self)
    }
}

// ============================================
// ErrorReport
// ============================================

/// Structured error report sent to the peer with the error flag set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// `"<WireName>: <message>"`.
    pub error: String,
    /// Human-readable explanation (may be empty).
    pub explanation: String,
    /// Remediation hints.
    pub hints: Vec<String>,
}

impl ErrorReport {
    /// Serializes the report as compact JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        // A struct of strings always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parses a report received from the wire.
    ///
    /// # Errors
    /// Returns the JSON error if the payload is not a report.
    pub fn from_json(payload: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(payload)
    }
}

impl From<&ExerciseError> for ErrorReport {
    fn from(err: &ExerciseError) -> Self {
        Self {
            error: err.to_string(),
            explanation: err.explanation.clone(),
            hints: err.hints.clone(),
        }
    }
}

// ============================================
// Tests
// ============================================
