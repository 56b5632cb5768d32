//! Error types.

use thiserror::Error;

/// Configuration could not be read or did not match the expected shape.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The underlying configuration source failed.
    #[error("failed to load catalog configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// The document parser could not be built from its settings.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The configured points marker produced an invalid pattern.
    #[error("invalid points marker pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Why a roster entry is not a legal selection.
///
/// The `Display` output of each variant is the message shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The entry was flagged during a version migration.
    #[error("Invalid Unit")]
    InvalidUnit,
    /// No datasheet of that name exists in the list's manual version.
    #[error("Unit not available in MFM {version}")]
    Unresolved {
        /// Version token of the manual the list is priced against.
        version: String,
    },
    /// Boarding actions detachment has no slot for the unit.
    #[error("Unit not available in this Detachment")]
    SlotNotFound,
    /// Boarding actions slot (or its exception rule) is exhausted.
    #[error("{message}")]
    SlotExceeded {
        /// Slot or exception rule description.
        message: String,
    },
    /// Standard per-datasheet cap reached.
    #[error("Only {max} of this unit allowed")]
    CapExceeded {
        /// Computed cap.
        max: u32,
    },
    /// The chosen enhancement is not offered by the active detachment.
    #[error("Enhancement not available in this detachment")]
    EnhancementNotOffered,
    /// Boarding actions enhancement budget exceeded.
    #[error("Only {max} enhancements allowed")]
    EnhancementLimit {
        /// Computed cap.
        max: u32,
    },
}
