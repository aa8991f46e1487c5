// ============================================
// File: crates/cryptoserve-exercises/src/primitives/aes.rs
// ============================================
//! # AES Reference Transforms
//!
//! ## Creation Reason
//! The AES exercises verify the peer's round operations byte for byte.
//! Substitution, row shift and key addition are small enough to keep
//! local; column mixing and whole-block encryption come from the `aes`
//! crate.
//!
//! ## State Layout
//! A 16-byte state is column-major, as in FIPS-197: byte `r + 4c` is row
//! `r`, column `c`.
//!
//! ## ⚠️ Important Note for Next Developer
//! - `SBOX` is built at compile time; it must match FIPS-197 Figure 7
//! - These are teaching transforms, not a constant-time cipher
//!
//! ## Last Modified
//! v0.1.0 - Initial reference transforms

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, KeyInit};
use aes::{Aes128, Block};

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// One AES block.
pub type State = [u8; BLOCK_SIZE];

// ============================================
// Substitution Box
// ============================================

/// Multiplication in GF(2⁸) modulo x⁸ + x⁴ + x³ + x + 1.
const fn gf_mul(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0u8;
    while b != 0 {
        if b & 1 != 0 {
            product ^= a;
        }
        let carry = a & 0x80;
        a <<= 1;
        if carry != 0 {
            a ^= 0x1B;
        }
        b >>= 1;
    }
    product
}

/// `a²⁵⁴`, the multiplicative inverse (0 maps to 0).
const fn gf_inverse(a: u8) -> u8 {
    let mut result = 1u8;
    let mut base = a;
    let mut exponent = 254u8;
    while exponent != 0 {
        if exponent & 1 != 0 {
            result = gf_mul(result, base);
        }
        base = gf_mul(base, base);
        exponent >>= 1;
    }
    result
}

const fn affine(b: u8) -> u8 {
    b ^ b.rotate_left(1) ^ b.rotate_left(2) ^ b.rotate_left(3) ^ b.rotate_left(4) ^ 0x63
}

const fn build_sbox() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = affine(gf_inverse(i as u8));
        i += 1;
    }
    table
}

/// The AES forward substitution box.
pub const SBOX: [u8; 256] = build_sbox();

/// Substitutes a single byte.
#[must_use]
pub const fn sub_byte(byte: u8) -> u8 {
    SBOX[byte as usize]
}

// ============================================
// Round Transforms
// ============================================

/// XORs `state` with `round_key`.
#[must_use]
pub fn add_round_key(state: &State, round_key: &State) -> State {
    let mut out = *state;
    for (byte, key) in out.iter_mut().zip(round_key) {
        *byte ^= key;
    }
    out
}

/// Applies the S-box to every byte.
#[must_use]
pub fn sub_bytes(state: &State) -> State {
    state.map(sub_byte)
}

/// Rotates row `r` left by `r` positions.
#[must_use]
pub fn shift_rows(state: &State) -> State {
    let mut out = [0u8; BLOCK_SIZE];
    for row in 0..4 {
        for column in 0..4 {
            out[row + 4 * column] = state[row + 4 * ((column + row) % 4)];
        }
    }
    out
}

/// Mixes each column.
#[must_use]
pub fn mix_columns(state: &State) -> State {
    let mut block = Block::clone_from_slice(state);
    aes::hazmat::mix_columns(&mut block);
    to_state(&block)
}

// ============================================
// Block Encryption
// ============================================

/// Encrypts one block with AES-128 in CBC mode.
///
/// With a single block, CBC is `E(key, plaintext ⊕ iv)`.
#[must_use]
pub fn encrypt_cbc_block(key: &State, iv: &State, plaintext: &State) -> State {
    let cipher = Aes128::new(GenericArray::from_slice(key));
    let mut block = Block::clone_from_slice(&add_round_key(plaintext, iv));
    cipher.encrypt_block(&mut block);
    to_state(&block)
}

fn to_state(block: &Block) -> State {
    let mut state = [0u8; BLOCK_SIZE];
    state.copy_from_slice(block);
    state
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::BlockDecrypt;

    #[test]
    fn test_sbox_known_values() {
        assert_eq!(sub_byte(0x00), 0x63);
        assert_eq!(sub_byte(0x01), 0x7C);
        assert_eq!(sub_byte(0x53), 0xED);
        assert_eq!(sub_byte(0xFF), 0x16);
    }

    #[test]
    fn test_sbox_is_permutation() {
        let mut seen = [false; 256];
        for value in SBOX {
            assert!(!seen[value as usize]);
            seen[value as usize] = true;
        }
    }

    #[test]
    fn test_shift_rows_layout() {
        let state: State = core::array::from_fn(|i| i as u8);
        let shifted = shift_rows(&state);
        assert_eq!(
            shifted,
            [0, 5, 10, 15, 4, 9, 14, 3, 8, 13, 2, 7, 12, 1, 6, 11]
        );
    }

    #[test]
    fn test_mix_columns_fips_column() {
        // db 13 53 45 -> 8e 4d a1 bc
        let mut state = [0u8; BLOCK_SIZE];
        state[..4].copy_from_slice(&[0xDB, 0x13, 0x53, 0x45]);
        let mixed = mix_columns(&state);
        assert_eq!(&mixed[..4], &[0x8E, 0x4D, 0xA1, 0xBC]);
    }

    #[test]
    fn test_round_matches_hazmat() {
        let state: State = core::array::from_fn(|i| (i as u8).wrapping_mul(37).wrapping_add(11));
        let round_key: State = core::array::from_fn(|i| (i as u8) ^ 0xA5);

        let ours = add_round_key(&mix_columns(&shift_rows(&sub_bytes(&state))), &round_key);

        let mut block = Block::clone_from_slice(&state);
        aes::hazmat::cipher_round(&mut block, &Block::clone_from_slice(&round_key));

        assert_eq!(ours, to_state(&block));
    }

    #[test]
    fn test_cbc_block_decrypts() {
        let key = [0x2A; BLOCK_SIZE];
        let iv: State = core::array::from_fn(|i| i as u8);
        let plaintext = *b"sixteen byte msg";

        let ciphertext = encrypt_cbc_block(&key, &iv, &plaintext);
        assert_ne!(ciphertext, plaintext);

        let cipher = Aes128::new(GenericArray::from_slice(&key));
        let mut block = Block::clone_from_slice(&ciphertext);
        cipher.decrypt_block(&mut block);
        assert_eq!(add_round_key(&to_state(&block), &iv), plaintext);
    }
}
