//! Error types for the battle simulation.

use thiserror::Error;

use crate::weapon::WeaponKind;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all battle simulation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    /// A configuration value is out of its allowed range.
    #[error("Invalid config value for '{field}': {reason}")]
    InvalidConfig {
        /// Dotted path of the offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Configuration text could not be parsed.
    #[error("Failed to parse config: {0}")]
    ConfigParse(String),

    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(u64),

    /// The requested hero is not in the roster.
    #[error("Unknown hero: {0}")]
    UnknownHero(String),

    /// Operation requires the session to be in a different phase.
    #[error("Invalid phase: expected {expected}, session is {actual}")]
    InvalidPhase {
        /// Phase the operation needs.
        expected: &'static str,
        /// Phase the session is in.
        actual: &'static str,
    },

    /// No upgrade offer is waiting for a choice.
    #[error("No upgrade offer is pending")]
    NoPendingOffer,

    /// The chosen weapon is not part of the pending offer.
    #[error("Weapon {0:?} is not offered")]
    UpgradeNotOffered(WeaponKind),

    /// Only a won match may continue to the next level.
    #[error("Continuing is only permitted after a victory")]
    ContinueNotPermitted,

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}

impl GameError {
    /// Shorthand for [`GameError::InvalidConfig`].
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
