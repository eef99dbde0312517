//! Error types for the colony economy core.
//!
//! Validation outcomes of the admission pipeline are not errors and live in
//! [`crate::scheduler::Rejection`]. Everything here is either infrastructure
//! (store, codec, config) or a broken invariant.

use thiserror::Error;

use crate::planet::PlanetId;
use crate::player::PlayerId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for the economy core.
#[derive(Debug, Error)]
pub enum GameError {
    /// The store has no planet with this identifier.
    #[error("Planet not found: {0}")]
    PlanetNotFound(PlanetId),

    /// The store has no player with this identifier.
    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// A serializable transaction lost a race against a concurrent commit.
    ///
    /// Nothing was written. The caller may retry the whole operation.
    #[error("Serialization conflict on planet {planet}, retry the operation")]
    ConcurrencyConflict {
        /// Planet whose aggregate was modified concurrently.
        planet: PlanetId,
    },

    /// Programmer error: the data breaks an invariant the core relies on.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    /// The storage backend failed.
    #[error("Storage failure: {0}")]
    Storage(String),

    /// A stored row could not be encoded or decoded.
    #[error("Failed to {action} {entity}: {message}")]
    Codec {
        /// "encode" or "decode".
        action: &'static str,
        /// Kind of row involved.
        entity: &'static str,
        /// Underlying codec message.
        message: String,
    },

    /// Configuration text could not be parsed.
    #[error("Failed to parse config: {0}")]
    ConfigParse(String),

    /// Player creation was refused.
    #[error(transparent)]
    Player(#[from] PlayerError),
}

impl GameError {
    /// Whether retrying the same operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}

/// Reasons a new player cannot be created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerError {
    /// Nickname must be 4-16 letters or digits with at most one space.
    #[error("Invalid nickname: {0:?}")]
    InvalidNickname(String),

    /// Another player already uses this nickname (ignoring case and spaces).
    #[error("Nickname is in use: {0:?}")]
    NicknameInUse(String),

    /// The user already owns a player.
    #[error("User {0:?} already has a player")]
    UserAlreadyHasPlayer(String),
}
