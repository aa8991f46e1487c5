// ============================================
// File: crates/cryptoserve-exercises/src/simple_hash.rs
// ============================================
//! # Simple Hash
//!
//! ## Creation Reason
//! Introductory exercise: the peer and the server take turns folding
//! 16-bit chunks of a message into a shared hash.
//!
//! ## Protocol
//! ```text
//! peer   ── data (≤ 255 bytes) ─────────────►  server
//! peer   ◄─────────────────────────── "OK" ──  server
//! peer   ── data ‖ 0x00 × (4 - len % 4) ────►  server
//! peer   ◄─────────────────────────── "OK" ──  server
//!        for each big-endian u16 chunk i:
//!          i even: peer sends  h = f(h, chunk)
//!          i odd:  server sends h = g(h, chunk)
//! ```
//! The hash starts as `[len, len]`.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Padding is always 1..=4 bytes, never 0
//! - All arithmetic is modulo 2¹⁶
//!
//! ## Last Modified
//! v0.1.0 - Initial exercise

use std::sync::Arc;

use async_trait::async_trait;

use cryptoserve_core::report::ExerciseError;
use cryptoserve_transport::{Channel, Result};

use crate::exercise::Exercise;
use crate::registry::StaticUnit;
use crate::tables::Tables;

/// Longest accepted input; its length must fit in one byte.
pub const MAX_INPUT_LEN: usize = 255;

/// Registration for this module.
pub const UNIT: StaticUnit = StaticUnit::new("simple_hash", load);

fn load(_: &Arc<Tables>) -> crate::error::Result<Vec<Arc<dyn Exercise>>> {
    Ok(vec![Arc::new(SimpleHash)])
}

/// The Simple Hash exercise.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleHash;

#[async_trait]
impl Exercise for SimpleHash {
    fn name(&self) -> &str {
        "simple_hash"
    }

    async fn run(&self, channel: &mut Channel) -> Result<()> {
        simple_hash(channel).await
    }
}

/// Runs the exercise over `channel`.
///
/// # Errors
/// Returns the first length, padding or hash violation.
pub async fn simple_hash(channel: &mut Channel) -> Result<()> {
    let data = channel
        .expect_with(None, |frame| verify_initial_data(&frame.payload))
        .await?;
    channel.ok().await?;

    let chunks = channel
        .expect_with(None, |frame| verify_padded_data(&frame.payload, &data))
        .await?;
    channel.ok().await?;

    let mut hash = seed(data.len());

    for (i, chunk) in chunks.into_iter().enumerate() {
        if i % 2 == 0 {
            hash = f(hash, chunk);
            channel
                .expect_with(Some(2), |frame| verify_hash(&frame.payload, hash))
                .await?;
        } else {
            hash = g(hash, chunk);
            channel.send(&hash.to_be_bytes()).await?;
        }
    }

    Ok(())
}

// ============================================
// Hash Functions
// ============================================

/// Peer-side round function.
#[must_use]
pub const fn f(a: u16, b: u16) -> u16 {
    (a ^ b.wrapping_add(0xC0DE)).rotate_left(3)
}

/// Server-side round function.
#[must_use]
pub const fn g(a: u16, b: u16) -> u16 {
    (a ^ b.wrapping_add(0xBEAD)) >> 1
}

/// Initial hash for a message of `len` bytes.
#[must_use]
pub fn seed(len: usize) -> u16 {
    let len = (len & 0xFF) as u8;
    u16::from_be_bytes([len, len])
}

/// Null bytes appended to a message of `len` bytes.
#[must_use]
pub const fn padding_len(len: usize) -> usize {
    4 - len % 4
}

// ============================================
// Verifiers
// ============================================

fn verify_initial_data(data: &[u8]) -> std::result::Result<Vec<u8>, ExerciseError> {
    if data.len() > MAX_INPUT_LEN {
        return Err(ExerciseError::invalid_length("input data is too large")
            .with_explanation(
                "The data you sent was too large for Simple Hash to handle. Recall that the length must be representable by a single byte.",
            )
            .with_hint("Are you sending less than 256 bytes of input data?"));
    }
    Ok(data.to_vec())
}

fn verify_padded_data(padded: &[u8], initial: &[u8]) -> std::result::Result<Vec<u16>, ExerciseError> {
    let padding = padding_len(initial.len());

    if padded.len() != initial.len() + padding {
        return Err(ExerciseError::invalid_padding("wrong amount of padding")
            .with_explanation("The padded data has the wrong amount of padding.")
            .with_hint("Is the data padded to the next multiple of 4?"));
    }

    let (prefix, pad) = padded.split_at(initial.len());
    if prefix != initial || pad.iter().any(|&byte| byte != 0x00) {
        return Err(ExerciseError::invalid_padding("data was padded improperly")
            .with_explanation("The original data was padded improperly.")
            .with_hints([
                "Is padding applied only to the end of the data to be hashed?",
                "Are you padding the data with null (0x00) bytes?",
                "Make sure the original data is not modified after being sent (besides padding, of course).",
            ]));
    }

    Ok(padded
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect())
}

fn verify_hash(payload: &[u8], expected: u16) -> std::result::Result<u16, ExerciseError> {
    let received = u16::from_be_bytes([payload[0], payload[1]]);

    if received != expected {
        return Err(ExerciseError::data_mismatch(format!(
            "received hash {received:#06x} does not match"
        ))
        .with_explanation("You made some mistake in hashing.")
        .with_hints([
            "Are you applying the operations in the correct order as outlined in the documentation?",
            "Are you using f to hash the data on your turn (not g)?",
            "Are you using unsigned 16-bit integers for storing data? Are they being promoted to larger types accidentally?",
            "Are you sending the data in the correct order?",
        ]));
    }

    Ok(received)
}

// ============================================
// Tests
// ============================================
