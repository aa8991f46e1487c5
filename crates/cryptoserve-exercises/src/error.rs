// ============================================
// File: crates/cryptoserve-exercises/src/error.rs
// ============================================
//! # Registry Error Types
//!
//! ## Last Modified
//! v0.1.0 - Initial registry errors

use thiserror::Error;

/// Result type for loading exercise units.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors raised while loading an exercise unit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A precomputed table the unit needs is empty.
    #[error("Unit '{unit}' requires table '{table}', which is empty")]
    MissingTable {
        /// Unit being loaded
        unit: String,
        /// Name of the missing table
        table: &'static str,
    },

    /// The unit failed for another reason.
    #[error("Unit '{unit}' failed to load: {reason}")]
    LoadFailed {
        /// Unit being loaded
        unit: String,
        /// Failure description
        reason: String,
    },
}

impl RegistryError {
    /// Creates a `MissingTable` error.
    pub fn missing_table(unit: impl Into<String>, table: &'static str) -> Self {
        Self::MissingTable {
            unit: unit.into(),
            table,
        }
    }

    /// Creates a `LoadFailed` error.
    pub fn load_failed(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LoadFailed {
            unit: unit.into(),
            reason: reason.into(),
        }
    }

    /// Name of the unit that failed.
    #[must_use]
    pub fn unit(&self) -> &str {
        match self {
            Self::MissingTable { unit, .. } | Self::LoadFailed { unit, .. } => unit,
        }
    }
}
