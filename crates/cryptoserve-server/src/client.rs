// ============================================
// File: crates/cryptoserve-server/src/client.rs
// ============================================
//! # Scripted Peer Client
//!
//! ## Creation Reason
//! A small peer for trying exercises by hand: it prints the greeting,
//! sends a selection, then plays a script of sends and receives and
//! renders whatever the server answers, error reports included.
//!
//! ## Script Steps
//! | Step          | Meaning                                  |
//! |---------------|------------------------------------------|
//! | `send:<hex>`  | send raw bytes                           |
//! | `text:<utf8>` | send text as-is                          |
//! | `recv`        | wait for exactly one message             |
//!
//! After the script, messages are read until the server closes the
//! connection or goes quiet for the channel timeout.
//!
//! ## ⚠️ Important Note for Next Developer
//! - An error report always ends the script; the server closes after it
//!
//! ## Last Modified
//! v0.1.0 - Initial client

use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use cryptoserve_core::{ErrorReport, Frame};
use cryptoserve_transport::{Channel, Result, TransportError};

use crate::greeting;

// ============================================
// Step
// ============================================

/// Error parsing a script step.
#[derive(Error, Debug)]
pub enum StepError {
    /// The step has no known prefix.
    #[error("unknown step '{0}', expected send:<hex>, text:<utf8> or recv")]
    Unknown(String),

    /// The hex payload does not decode.
    #[error("invalid hex in step '{step}': {source}")]
    Hex {
        /// The offending step
        step: String,
        /// Decoder error
        #[source]
        source: hex::FromHexError,
    },
}

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Send these bytes.
    Send(Vec<u8>),
    /// Wait for one message.
    Receive,
}

impl FromStr for Step {
    type Err = StepError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s == "recv" {
            return Ok(Self::Receive);
        }
        if let Some(text) = s.strip_prefix("text:") {
            return Ok(Self::Send(text.as_bytes().to_vec()));
        }
        if let Some(digits) = s.strip_prefix("send:") {
            return hex::decode(digits)
                .map(Self::Send)
                .map_err(|source| StepError::Hex {
                    step: s.to_owned(),
                    source,
                });
        }
        Err(StepError::Unknown(s.to_owned()))
    }
}

// ============================================
// Transcript
// ============================================

/// Everything the server said, rendered for the terminal.
#[derive(Debug, Default)]
pub struct Transcript {
    /// Rendered messages in arrival order.
    pub entries: Vec<String>,
    /// The error report that ended the session, if any.
    pub report: Option<ErrorReport>,
}

impl Transcript {
    /// Records a frame. Returns `true` if it was an error report.
    fn record(&mut self, frame: &Frame) -> bool {
        if !frame.is_error() {
            self.entries.push(describe(frame));
            return false;
        }

        match ErrorReport::from_json(&frame.payload) {
            Ok(report) => {
                self.entries.push(render_report(&report));
                self.report = Some(report);
            }
            Err(e) => {
                debug!("Error payload is not a report: {}", e);
                self.entries.push(describe(frame));
            }
        }
        true
    }
}

// ============================================
// Session
// ============================================

/// Runs the greeting, selection and `steps` against the server.
///
/// # Errors
/// Fails on a timeout during a `recv` step or on a broken connection.
pub async fn run(channel: &mut Channel, selection: &str, steps: &[Step]) -> Result<Transcript> {
    let mut transcript = Transcript::default();

    let greeting = channel.receive().await?;
    if transcript.record(&greeting) {
        return Ok(transcript);
    }
    channel.send(selection.as_bytes()).await?;

    for step in steps {
        match step {
            Step::Send(data) => match channel.send(data).await {
                Ok(()) => {}
                Err(TransportError::Closed) => break,
                Err(e) => return Err(e),
            },
            Step::Receive => {
                if transcript.record(&channel.receive().await?) {
                    return Ok(transcript);
                }
            }
        }
    }

    loop {
        match channel.receive().await {
            Ok(frame) => {
                if transcript.record(&frame) {
                    break;
                }
            }
            Err(TransportError::Closed | TransportError::TimedOut { .. }) => break,
            Err(e) => return Err(e),
        }
    }

    Ok(transcript)
}

// ============================================
// Rendering
// ============================================

/// Renders a payload as text when it is printable, otherwise as hex.
#[must_use]
pub fn describe(frame: &Frame) -> String {
    let body = match std::str::from_utf8(&frame.payload) {
        Ok(text) if is_printable(text) => text.to_owned(),
        _ => format!("0x{}", hex::encode(&frame.payload)),
    };

    if frame.exercise_flags == 0 {
        body
    } else {
        format!("[flags {:#04x}] {body}", frame.exercise_flags)
    }
}

fn is_printable(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
}

/// Renders an error report as boxed Error, Explanation and Hints sections.
#[must_use]
pub fn render_report(report: &ErrorReport) -> String {
    let hints = report
        .hints
        .iter()
        .map(|hint| format!("• {hint}"))
        .collect::<Vec<_>>()
        .join("\n");

    [
        greeting::boxed("Error", &report.error),
        greeting::boxed("Explanation", &report.explanation),
        greeting::boxed("Hints", &hints),
    ]
    .join("\n")
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::io::duplex;

    use cryptoserve_core::ServerFlags;
    use cryptoserve_exercises::{default_catalog, ExerciseRegistry, Tables};

    use crate::handlers::ConnectionHandler;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn steps(script: &[&str]) -> Vec<Step> {
        script.iter().map(|s| s.parse().unwrap()).collect()
    }

    async fn against_server(selection: &str, script: &[&str]) -> Transcript {
        let registry = ExerciseRegistry::discover(&default_catalog(), &Arc::new(Tables::default()));
        let handler = ConnectionHandler::new(Arc::new(registry), TIMEOUT);
        let peer: SocketAddr = "127.0.0.1:40001".parse().unwrap();

        let (server, client) = duplex(1 << 16);
        let mut channel = Channel::new(client, TIMEOUT);
        let steps = steps(script);

        let (_, transcript) = tokio::join!(
            handler.handle(server, peer),
            run(&mut channel, selection, &steps)
        );
        transcript.unwrap()
    }

    #[test]
    fn test_step_parse() {
        assert_eq!("recv".parse::<Step>().unwrap(), Step::Receive);
        assert_eq!("text:Apple".parse::<Step>().unwrap(), Step::Send(b"Apple".to_vec()));
        assert_eq!("send:3a58".parse::<Step>().unwrap(), Step::Send(vec![0x3A, 0x58]));
        assert!(matches!("send:3a5".parse::<Step>(), Err(StepError::Hex { .. })));
        assert!(matches!("wait".parse::<Step>(), Err(StepError::Unknown(_))));
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(&Frame::new(&b"OK"[..])), "OK");
        assert_eq!(describe(&Frame::new(&[0x0A, 0xA0][..])), "0x0aa0");
        assert_eq!(describe(&Frame::new(&b""[..])), "0x");
        let flagged = Frame::with_flags(&[0x00, 0x07][..], ServerFlags::NONE, 0x01);
        assert_eq!(describe(&flagged), "[flags 0x01] 0x0007");
    }

    #[test]
    fn test_render_report() {
        let report = ErrorReport {
            error: "InvalidPaddingError: wrong amount of padding".into(),
            explanation: "The padded data has the wrong amount of padding.".into(),
            hints: vec!["Is the data padded to the next multiple of 4?".into()],
        };
        let rendered = render_report(&report);
        assert!(rendered.contains("─ Error "));
        assert!(rendered.contains("─ Hints "));
        assert!(rendered.contains("• Is the data padded"));
    }

    #[tokio::test]
    async fn test_simple_hash_script() {
        let transcript = against_server(
            "Simple Hash",
            &[
                "text:Apple",
                "recv",
                "send:4170706c65000000",
                "recv",
                "send:3a58",
                "recv",
                "send:7bf1",
                "recv",
            ],
        )
        .await;

        assert!(transcript.report.is_none());
        assert!(transcript.entries[0].contains("Available Exercises"));
        assert_eq!(&transcript.entries[1..], ["OK", "OK", "0x0aa0", "0x62ae"]);
    }

    #[tokio::test]
    async fn test_error_report_ends_script() {
        let transcript =
            against_server("0", &["text:abc", "recv", "text:abc!", "recv", "recv"]).await;

        let report = transcript.report.unwrap();
        assert!(report.error.starts_with("InvalidPaddingError"));
        assert!(transcript.entries.last().unwrap().contains("─ Explanation "));
    }
}
