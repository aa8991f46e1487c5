// ============================================
// File: crates/cryptoserve-exercises/src/key_exchange.rs
// ============================================
//! # Diffie-Hellman Key Exchange
//!
//! ## Creation Reason
//! The peer agrees on a shared secret with the server in Z*₂₅₁, derives
//! an AES-128 key from it and proves it by decrypting a random block.
//!
//! ## Protocol
//! ```text
//! peer   ◄──────────────── [g, gᵉ mod 251] ──  server
//! peer   ── B = gᵇ mod 251 (1 byte) ────────►  server
//!        secret = Bᵉ mod 251, key = secret × 16
//! peer   ◄──────────────── ciphertext ‖ iv ──  server   (AES-128-CBC, one block)
//! peer   ── plaintext (16 bytes) ───────────►  server
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The generator comes from `Tables::group_generators`; the unit refuses
//!   to load when that table is empty
//!
//! ## Last Modified
//! v0.1.0 - Initial exercise

use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::trace;

use cryptoserve_core::report::ExerciseError;
use cryptoserve_transport::{Channel, Result};

use crate::error::RegistryError;
use crate::exercise::Exercise;
use crate::primitives::aes::{encrypt_cbc_block, State, BLOCK_SIZE};
use crate::registry::StaticUnit;
use crate::tables::{Tables, GROUP_MODULUS};

const NAME: &str = "diffie_hellman_key_exchange";

/// Registration for this module.
pub const UNIT: StaticUnit = StaticUnit::new(NAME, load);

fn load(tables: &Arc<Tables>) -> crate::error::Result<Vec<Arc<dyn Exercise>>> {
    if tables.group_generators.is_empty() {
        return Err(RegistryError::missing_table(NAME, "group_generators"));
    }
    Ok(vec![Arc::new(KeyExchange::new(Arc::clone(tables)))])
}

/// The Diffie-Hellman exercise.
#[derive(Debug, Clone)]
pub struct KeyExchange {
    tables: Arc<Tables>,
}

impl KeyExchange {
    /// Creates the exercise over shared tables.
    #[must_use]
    pub const fn new(tables: Arc<Tables>) -> Self {
        Self { tables }
    }
}

#[async_trait]
impl Exercise for KeyExchange {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, channel: &mut Channel) -> Result<()> {
        let mut rng = StdRng::from_entropy();
        key_exchange(channel, &self.tables, &mut rng).await
    }
}

/// Runs one exchange.
///
/// # Errors
/// Returns an error if the peer's public value is out of range or the
/// returned plaintext does not match.
pub async fn key_exchange<R>(channel: &mut Channel, tables: &Tables, rng: &mut R) -> Result<()>
where
    R: Rng + Send,
{
    let Some(&generator) = tables.group_generators.choose(rng) else {
        return Err(ExerciseError::unexpected().into());
    };
    let exponent = rng.gen_range(1..tables.group_order);
    let public = mod_pow(u32::from(generator), exponent, GROUP_MODULUS);

    trace!(generator, public, "Sending key contribution");
    channel.send(&[generator, low_byte(public)]).await?;

    let peer_public = channel
        .expect_with(Some(1), |frame| verify_public_value(frame.payload[0]))
        .await?;

    let secret = low_byte(mod_pow(u32::from(peer_public), exponent, GROUP_MODULUS));
    let key = [secret; BLOCK_SIZE];

    let mut plaintext: State = [0; BLOCK_SIZE];
    let mut iv: State = [0; BLOCK_SIZE];
    rng.fill(&mut plaintext);
    rng.fill(&mut iv);

    let ciphertext = encrypt_cbc_block(&key, &iv, &plaintext);
    let mut message = Vec::with_capacity(2 * BLOCK_SIZE);
    message.extend_from_slice(&ciphertext);
    message.extend_from_slice(&iv);
    channel.send(&message).await?;

    channel
        .expect_with(Some(BLOCK_SIZE), |frame| verify_plaintext(&frame.payload, &plaintext))
        .await
}

/// `base^exponent mod modulus` by square-and-multiply.
#[must_use]
pub fn mod_pow(base: u32, mut exponent: u32, modulus: u32) -> u32 {
    let mut result = 1 % modulus;
    let mut base = base % modulus;
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = result * base % modulus;
        }
        base = base * base % modulus;
        exponent >>= 1;
    }
    result
}

fn low_byte(value: u32) -> u8 {
    value.to_be_bytes()[3]
}

fn verify_public_value(value: u8) -> std::result::Result<u8, ExerciseError> {
    if value == 0 || u32::from(value) >= GROUP_MODULUS {
        return Err(ExerciseError::invalid_parameter(format!(
            "key contribution {value} is not in Z*{GROUP_MODULUS}"
        ))
        .with_explanation(format!(
            "Your public value must be a member of the multiplicative group, i.e. between 1 and {}.",
            GROUP_MODULUS - 1
        ))
        .with_hint("Are you reducing g^b modulo 251 before sending it?"));
    }
    Ok(value)
}

fn verify_plaintext(received: &[u8], original: &State) -> std::result::Result<(), ExerciseError> {
    if received != original {
        return Err(
            ExerciseError::data_mismatch("plaintext does not match the original data")
                .with_explanation(format!(
                    "The plaintext the server received did not match the original data generated. The server encrypted {original:02x?} but received {received:02x?}."
                ))
                .with_hints([
                    "Are you parsing the data from the server as the ciphertext and IV correctly?",
                    "Are you using the correct mode of decryption for AES?",
                ]),
        );
    }
    Ok(())
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::generic_array::GenericArray;
    use aes::cipher::{BlockDecrypt, KeyInit};
    use aes::Aes128;
    use cryptoserve_core::report::ErrorKind;

    use crate::testing::{assert_kind, spawn};

    const PEER_EXPONENT: u32 = 77;

    fn start(seed: u64) -> (Channel, tokio::task::JoinHandle<Result<()>>) {
        let tables = Tables::compute();
        spawn(move |mut channel| async move {
            let mut rng = StdRng::seed_from_u64(seed);
            key_exchange(&mut channel, &tables, &mut rng).await
        })
    }

    fn decrypt(key: u8, message: &[u8]) -> Vec<u8> {
        let cipher = Aes128::new(GenericArray::from_slice(&[key; 16]));
        let mut block = GenericArray::clone_from_slice(&message[..16]);
        cipher.decrypt_block(&mut block);
        block.iter().zip(&message[16..]).map(|(b, iv)| b ^ iv).collect()
    }

    /// Performs the peer half up to receiving ciphertext ‖ iv.
    async fn exchange(peer: &mut Channel) -> (u8, Vec<u8>) {
        let offer = peer.expect(Some(2)).await.unwrap();
        let (generator, server_public) = (u32::from(offer[0]), u32::from(offer[1]));

        let public = mod_pow(generator, PEER_EXPONENT, GROUP_MODULUS);
        peer.send(&[low_byte(public)]).await.unwrap();

        let secret = low_byte(mod_pow(server_public, PEER_EXPONENT, GROUP_MODULUS));
        let message = peer.expect(Some(32)).await.unwrap();
        (secret, message.to_vec())
    }

    #[test]
    fn test_mod_pow() {
        assert_eq!(mod_pow(6, 0, 251), 1);
        assert_eq!(mod_pow(6, 250, 251), 1);
        assert_eq!(mod_pow(2, 10, 251), 1024 % 251);
        assert_eq!(mod_pow(250, 3, 251), 250);
    }

    #[tokio::test]
    async fn test_successful_exchange() {
        for seed in 0..4 {
            let (mut peer, server) = start(seed);
            let (secret, message) = exchange(&mut peer).await;
            peer.send(&decrypt(secret, &message)).await.unwrap();
            server.await.unwrap().unwrap();
        }
    }

    #[tokio::test]
    async fn test_offer_uses_a_generator() {
        let tables = Tables::compute();
        let (mut peer, _server) = start(9);
        let offer = peer.expect(Some(2)).await.unwrap();
        assert!(tables.group_generators.contains(&offer[0]));
        assert!((1..251).contains(&offer[1]));
    }

    #[tokio::test]
    async fn test_wrong_plaintext() {
        let (mut peer, server) = start(1);
        let (secret, message) = exchange(&mut peer).await;

        let mut plaintext = decrypt(secret, &message);
        plaintext[0] ^= 0xFF;
        peer.send(&plaintext).await.unwrap();

        let err = assert_kind(server.await.unwrap(), ErrorKind::DataMismatch);
        assert_eq!(err.hints().len(), 2);
    }

    #[tokio::test]
    async fn test_public_value_out_of_range() {
        for value in [0u8, 251, 255] {
            let (mut peer, server) = start(2);
            peer.expect(Some(2)).await.unwrap();
            peer.send(&[value]).await.unwrap();
            assert_kind(server.await.unwrap(), ErrorKind::InvalidParameter);
        }
    }

    #[tokio::test]
    async fn test_public_value_wrong_size() {
        let (mut peer, server) = start(3);
        peer.expect(Some(2)).await.unwrap();
        peer.send(&[1, 2]).await.unwrap();
        assert_kind(server.await.unwrap(), ErrorKind::DataTransmission);
    }

    #[test]
    fn test_missing_generators_fails_to_load() {
        let Err(err) = load(&Arc::new(Tables::default())) else {
            panic!("load should fail without generators");
        };
        assert_eq!(err, RegistryError::missing_table(NAME, "group_generators"));
    }
}
