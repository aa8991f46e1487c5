// ============================================
// File: crates/cryptoserve-exercises/src/lib.rs
// ============================================
//! # Cryptoserve Exercises - Contract, Registry & Built-ins
//!
//! ## Creation Reason
//! Holds everything that knows what an exercise computes: the
//! [`Exercise`] trait, the static registry that discovers exercises, the
//! precomputed tables they draw parameters from, and the built-in
//! exercises themselves.
//!
//! ## Main Functionality
//! - [`exercise`]: the async exercise contract
//! - [`registry`]: catalog, discovery and selection
//! - [`tables`]: Z*₂₅₁ generators and full-period LCG parameters
//! - [`primitives`]: AES reference transforms
//! - Built-ins: [`simple_hash`], [`key_exchange`], [`implementing_aes`],
//!   [`red_dog`]
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              cryptoserve-server                     │
//! │                    │                                │
//! │                    ▼                                │
//! │  cryptoserve-exercises  ◄── You are here            │
//! │         │                                           │
//! │         ▼                                           │
//! │  cryptoserve-transport ─► cryptoserve-core          │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - New exercises: add a module exposing a `UNIT` and list it in
//!   [`default_catalog`]; menu numbers follow catalog order
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod exercise;
pub mod implementing_aes;
pub mod key_exchange;
pub mod primitives;
pub mod red_dog;
pub mod registry;
pub mod simple_hash;
pub mod tables;

#[cfg(test)]
mod testing;

// Re-export commonly used items
pub use error::{RegistryError, Result};
pub use exercise::Exercise;
pub use registry::{Catalog, ExerciseDescriptor, ExerciseRegistry, ExerciseUnit, Selector};
pub use tables::Tables;

/// The built-in exercises, in menu order.
#[must_use]
pub fn default_catalog() -> Catalog {
    Catalog::new()
        .unit(simple_hash::UNIT)
        .unit(key_exchange::UNIT)
        .unit(implementing_aes::UNIT)
        .unit(red_dog::UNIT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_default_catalog() {
        let registry = ExerciseRegistry::discover(&default_catalog(), &Arc::new(Tables::compute()));
        let titles: Vec<_> = registry.iter().map(ExerciseDescriptor::title).collect();
        assert_eq!(
            titles,
            vec![
                "Simple Hash",
                "Diffie Hellman Key Exchange",
                "Implementing Aes",
                "Red Dog"
            ]
        );
    }

    #[test]
    fn test_default_catalog_without_tables() {
        let registry = ExerciseRegistry::discover(&default_catalog(), &Arc::new(Tables::default()));
        let names: Vec<_> = registry.iter().map(ExerciseDescriptor::name).collect();
        assert_eq!(names, vec!["simple_hash", "implementing_aes"]);
    }
}
