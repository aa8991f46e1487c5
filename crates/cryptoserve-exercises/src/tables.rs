// ============================================
// File: crates/cryptoserve-exercises/src/tables.rs
// ============================================
//! # Precomputed Tables
//!
//! ## Creation Reason
//! Some exercises draw their parameters from sets that are expensive to
//! enumerate: the generators of Z*₂₅₁ and every full-period linear
//! congruential generator modulo 256. Both are computed once at startup
//! and shared read-only by every connection.
//!
//! ## Main Functionality
//! - `Tables::compute()`: brute-force both sets
//! - `Lcg`: the 8-bit linear congruential generator itself
//!
//! ## ⚠️ Important Note for Next Developer
//! - Tables are immutable after construction; share them with `Arc`
//! - `compute()` walks every (a, c) pair, call it once per process
//!
//! ## Last Modified
//! v0.1.0 - Initial tables

use tracing::debug;

// ============================================
// Constants
// ============================================

/// Prime modulus of the Diffie-Hellman group.
pub const GROUP_MODULUS: u32 = 251;

/// Modulus of the card-dealing generator.
pub const LCG_MODULUS: usize = 256;

// ============================================
// Tables
// ============================================

/// Read-only parameter tables shared by all exercises.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tables {
    /// Generators of the multiplicative group modulo [`GROUP_MODULUS`],
    /// ascending.
    pub group_generators: Vec<u8>,
    /// Order of that group.
    pub group_order: u32,
    /// `(a, c)` pairs whose generator visits all 256 states.
    pub lcg_parameters: Vec<LcgParameters>,
}

impl Tables {
    /// Enumerates both tables.
    #[must_use]
    pub fn compute() -> Self {
        let group = multiplicative_group(GROUP_MODULUS);
        let group_order = u32::try_from(group.len()).unwrap_or(u32::MAX);
        let group_generators = group
            .iter()
            .copied()
            .filter(|&g| element_order(g, GROUP_MODULUS) == group_order)
            .filter_map(|g| u8::try_from(g).ok())
            .collect::<Vec<_>>();

        let lcg_parameters = (0..=u8::MAX)
            .flat_map(|a| (0..=u8::MAX).map(move |c| LcgParameters::new(a, c)))
            .filter(|params| Lcg::new(*params, 0).period() == LCG_MODULUS)
            .collect::<Vec<_>>();

        debug!(
            generators = group_generators.len(),
            lcg_parameters = lcg_parameters.len(),
            "Precomputed exercise tables"
        );

        Self {
            group_generators,
            group_order,
            lcg_parameters,
        }
    }
}

/// Members of Z*ₘ: residues coprime to `modulus`.
fn multiplicative_group(modulus: u32) -> Vec<u32> {
    (1..modulus).filter(|&i| gcd(i, modulus) == 1).collect()
}

/// Number of distinct powers of `element` modulo `modulus`.
fn element_order(element: u32, modulus: u32) -> u32 {
    let mut current = element % modulus;
    let mut order = 1;
    while current != 1 {
        current = current * element % modulus;
        order += 1;
        if order > modulus {
            return 0;
        }
    }
    order
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

// ============================================
// LCG
// ============================================

/// Multiplier and increment of an 8-bit LCG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LcgParameters {
    /// Multiplier `a`.
    pub multiplier: u8,
    /// Increment `c`.
    pub increment: u8,
}

impl LcgParameters {
    /// Creates a parameter pair.
    #[must_use]
    pub const fn new(multiplier: u8, increment: u8) -> Self {
        Self {
            multiplier,
            increment,
        }
    }
}

/// `xₙ₊₁ = (a·xₙ + c) mod 256`, computed with wrapping `u8` arithmetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lcg {
    params: LcgParameters,
    state: u8,
}

impl Lcg {
    /// Creates a generator with the given seed.
    #[must_use]
    pub const fn new(params: LcgParameters, seed: u8) -> Self {
        Self {
            params,
            state: seed,
        }
    }

    /// Advances and returns the new state.
    pub fn next_value(&mut self) -> u8 {
        self.state = self
            .params
            .multiplier
            .wrapping_mul(self.state)
            .wrapping_add(self.params.increment);
        self.state
    }

    /// Number of distinct states visited before a repeat, starting from
    /// the current state. Does not advance `self`.
    #[must_use]
    pub fn period(&self) -> usize {
        let mut seen = [false; LCG_MODULUS];
        let mut cursor = self.clone();
        let mut value = cursor.state;
        let mut count = 0;

        while !seen[value as usize] {
            seen[value as usize] = true;
            count += 1;
            value = cursor.next_value();
        }

        count
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_generators() {
        let tables = Tables::compute();

        assert_eq!(tables.group_order, 250);
        // φ(250) primitive roots.
        assert_eq!(tables.group_generators.len(), 100);
        assert_eq!(tables.group_generators[0], 6);
        assert!(!tables.group_generators.contains(&1));
    }

    #[test]
    fn test_lcg_parameters_are_hull_dobell() {
        let tables = Tables::compute();

        assert_eq!(tables.lcg_parameters.len(), 64 * 128);
        for params in &tables.lcg_parameters {
            assert_eq!(params.increment % 2, 1);
            assert_eq!(params.multiplier % 4, 1);
        }
    }

    #[test]
    fn test_lcg_sequence() {
        let mut lcg = Lcg::new(LcgParameters::new(5, 3), 0);
        assert_eq!(lcg.next_value(), 3);
        assert_eq!(lcg.next_value(), 18);
        assert_eq!(lcg.next_value(), 93);
        // 5 * 93 + 3 = 468 = 212 mod 256
        assert_eq!(lcg.next_value(), 212);
        assert_eq!(lcg.period(), 256);
    }

    #[test]
    fn test_short_period() {
        let lcg = Lcg::new(LcgParameters::new(0, 7), 0);
        assert_eq!(lcg.period(), 2);
    }

    #[test]
    fn test_element_order() {
        assert_eq!(element_order(1, 251), 1);
        assert_eq!(element_order(6, 251), 250);
        assert_eq!(element_order(250, 251), 2);
    }
}
