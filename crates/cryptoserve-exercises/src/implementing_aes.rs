// ============================================
// File: crates/cryptoserve-exercises/src/implementing_aes.rs
// ============================================
//! # Implementing AES
//!
//! ## Creation Reason
//! Drills the peer on the four AES round operations one at a time. The
//! exercise flags byte tells the peer which operation to apply to the
//! operand it just received.
//!
//! ## Operations
//! | Flag   | Operation      | Operand            | Answer   |
//! |--------|----------------|--------------------|----------|
//! | `0x01` | key addition   | state ‖ round key  | 16 bytes |
//! | `0x02` | byte substitution | 1 byte          | 1 byte   |
//! | `0x04` | row shift      | 16 bytes           | 16 bytes |
//! | `0x08` | column mix     | 16 bytes           | 16 bytes |
//!
//! Each operation is repeated 2 to 5 times, in table order; the server
//! sends `OK` when every answer was correct.
//!
//! ## Last Modified
//! v0.1.0 - Initial exercise

use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cryptoserve_core::protocol::ServerFlags;
use cryptoserve_core::report::ExerciseError;
use cryptoserve_transport::{Channel, Result};

use crate::exercise::Exercise;
use crate::primitives::aes::{add_round_key, mix_columns, shift_rows, sub_byte, State, BLOCK_SIZE};
use crate::registry::StaticUnit;
use crate::tables::Tables;

/// Repetitions per operation.
pub const REPETITIONS: RangeInclusive<usize> = 2..=5;

/// Registration for this module.
pub const UNIT: StaticUnit = StaticUnit::new("implementing_aes", load);

fn load(_: &Arc<Tables>) -> crate::error::Result<Vec<Arc<dyn Exercise>>> {
    Ok(vec![Arc::new(ImplementingAes)])
}

// ============================================
// Operation
// ============================================

/// One AES round operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Operation {
    /// XOR of state and round key.
    KeyAddition = 0x01,
    /// S-box lookup of a single byte.
    SubBytes = 0x02,
    /// Row rotation.
    ShiftRows = 0x04,
    /// Column mixing.
    MixColumns = 0x08,
}

impl Operation {
    /// All operations, in drill order.
    pub const ALL: [Self; 4] = [
        Self::KeyAddition,
        Self::SubBytes,
        Self::ShiftRows,
        Self::MixColumns,
    ];

    /// Exercise flag identifying this operation.
    #[must_use]
    pub const fn flag(self) -> u8 {
        self as u8
    }

    /// Parses an exercise flag.
    #[must_use]
    pub fn from_flag(flag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.flag() == flag)
    }

    /// Size of the operand sent to the peer.
    #[must_use]
    pub const fn operand_len(self) -> usize {
        match self {
            Self::KeyAddition => 2 * BLOCK_SIZE,
            Self::SubBytes => 1,
            Self::ShiftRows | Self::MixColumns => BLOCK_SIZE,
        }
    }

    /// Size of the expected answer.
    #[must_use]
    pub const fn result_len(self) -> usize {
        match self {
            Self::SubBytes => 1,
            Self::KeyAddition | Self::ShiftRows | Self::MixColumns => BLOCK_SIZE,
        }
    }

    /// Computes the reference answer. `operand` must be `operand_len()`
    /// bytes long.
    #[must_use]
    pub fn apply(self, operand: &[u8]) -> Vec<u8> {
        match self {
            Self::KeyAddition => {
                let (state, key) = operand.split_at(BLOCK_SIZE);
                add_round_key(&to_state(state), &to_state(key)).to_vec()
            }
            Self::SubBytes => operand.iter().copied().map(sub_byte).collect(),
            Self::ShiftRows => shift_rows(&to_state(operand)).to_vec(),
            Self::MixColumns => mix_columns(&to_state(operand)).to_vec(),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::KeyAddition => "key addition",
            Self::SubBytes => "byte substitution",
            Self::ShiftRows => "row shift",
            Self::MixColumns => "column mix",
        };
        write!(f, "{name} (flag {:#04x})", self.flag())
    }
}

fn to_state(bytes: &[u8]) -> State {
    let mut state = [0u8; BLOCK_SIZE];
    let len = bytes.len().min(BLOCK_SIZE);
    state[..len].copy_from_slice(&bytes[..len]);
    state
}

// ============================================
// Exercise
// ============================================

/// The Implementing AES exercise.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImplementingAes;

#[async_trait]
impl Exercise for ImplementingAes {
    fn name(&self) -> &str {
        "implementing_aes"
    }

    async fn run(&self, channel: &mut Channel) -> Result<()> {
        let mut rng = StdRng::from_entropy();
        drill(channel, &mut rng).await
    }
}

/// Runs every operation for a random number of repetitions.
///
/// # Errors
/// Returns a `DataMismatch` error on the first wrong answer.
pub async fn drill<R>(channel: &mut Channel, rng: &mut R) -> Result<()>
where
    R: Rng + Send,
{
    for operation in Operation::ALL {
        let repetitions = rng.gen_range(REPETITIONS);

        for _ in 0..repetitions {
            let mut operand = vec![0u8; operation.operand_len()];
            rng.fill(operand.as_mut_slice());
            let expected = operation.apply(&operand);

            channel
                .send_with_flags(&operand, ServerFlags::NONE, operation.flag())
                .await?;
            channel
                .expect_with(Some(operation.result_len()), |frame| {
                    verify_result(operation, &frame.payload, &expected)
                })
                .await?;
        }
    }

    channel.ok().await
}

fn verify_result(
    operation: Operation,
    received: &[u8],
    expected: &[u8],
) -> std::result::Result<(), ExerciseError> {
    if received != expected {
        return Err(ExerciseError::data_mismatch(format!(
            "{operation} result does not match"
        ))
        .with_explanation(format!(
            "The server expected {expected:02x?} but received {received:02x?}."
        ))
        .with_hints([
            "Is your state laid out column by column, as in FIPS-197?",
            "Are you checking the exercise flags to pick the operation?",
        ]));
    }
    Ok(())
}

// ============================================
// Tests
// ============================================
