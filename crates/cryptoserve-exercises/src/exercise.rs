// ============================================
// File: crates/cryptoserve-exercises/src/exercise.rs
// ============================================
//! # Exercise Contract
//!
//! ## Creation Reason
//! Every exercise is an independently written state machine that talks to
//! its peer through a [`Channel`]. This trait is the only thing the
//! supervisor knows about it.
//!
//! ## Main Functionality
//! - `Exercise`: the async entry point
//! - `title_case`: menu rendering of a snake_case name
//!
//! ## ⚠️ Important Note for Next Developer
//! - `run` must communicate exclusively through the channel
//! - Return `Ok(())` only when the peer completed every round; raise an
//!   `ExerciseError` (through `?`) for anything the peer got wrong
//! - Never `unwrap` peer-controlled data; the supervisor catches panics,
//!   but the peer then only sees a generic server error
//!
//! ## Last Modified
//! v0.1.0 - Initial exercise contract

use async_trait::async_trait;

use cryptoserve_transport::{Channel, Result};

/// An interactive protocol the server runs against one peer.
#[async_trait]
pub trait Exercise: Send + Sync {
    /// snake_case identifier, unique within a registry.
    fn name(&self) -> &str;

    /// Human-readable name shown in the menu.
    fn title(&self) -> String {
        title_case(self.name())
    }

    /// Drives the exercise to completion.
    ///
    /// # Errors
    /// Returns the first protocol violation, timeout or disconnect.
    async fn run(&self, channel: &mut Channel) -> Result<()>;
}

/// Converts `simple_hash` into `Simple Hash`.
#[must_use]
pub fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("simple_hash"), "Simple Hash");
        assert_eq!(title_case("diffie_hellman_key_exchange"), "Diffie Hellman Key Exchange");
        assert_eq!(title_case("implementing_AES"), "Implementing Aes");
        assert_eq!(title_case("red__dog"), "Red Dog");
    }
}
