// ============================================
// File: crates/cryptoserve-exercises/src/primitives/mod.rs
// ============================================
//! # Cryptographic Primitives
//!
//! Reference computations the exercises check peer answers against.

pub mod aes;

pub use self::aes::{add_round_key, encrypt_cbc_block, mix_columns, shift_rows, sub_byte, State};
