//! Players: identity, permissions and research levels.

use serde::{Deserialize, Serialize};

use crate::data::ResearchId;
use crate::error::PlayerError;
use crate::levels::Levels;
use crate::planet::PlanetId;

/// Shortest allowed nickname.
pub const NICKNAME_MIN_LEN: usize = 4;
/// Longest allowed nickname.
pub const NICKNAME_MAX_LEN: usize = 16;

/// Unique player identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct PlayerId(pub u64);

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Moderation tier. The economy core never branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    /// Unrestricted.
    God,
    /// Server administrator.
    Admin,
    /// Game master.
    GameMaster,
    /// Community moderator.
    Moderator,
    /// Regular player.
    #[default]
    User,
}

/// A player account in the game world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Player identifier.
    pub id: PlayerId,
    /// Identifier of the owning user account.
    pub user_id: String,
    /// Nickname as typed.
    pub nickname: String,
    /// Lowercase nickname without spaces, unique across players.
    pub nickname_key: String,
    /// Moderation tier.
    pub permissions: Permission,
    /// Research levels.
    pub research: Levels<ResearchId>,
    /// The player's planet, once created.
    pub planet: Option<PlanetId>,
}

impl Player {
    /// Create a player with no research and no planet.
    ///
    /// # Errors
    /// Returns [`PlayerError::InvalidNickname`] if the nickname breaks the
    /// naming rules.
    pub fn new(id: PlayerId, user_id: impl Into<String>, nickname: &str) -> Result<Self, PlayerError> {
        validate_nickname(nickname)?;
        Ok(Self {
            id,
            user_id: user_id.into(),
            nickname: nickname.to_string(),
            nickname_key: nickname_key(nickname),
            permissions: Permission::User,
            research: Levels::new(),
            planet: None,
        })
    }
}

/// Uniqueness key of a nickname: lowercase with spaces removed.
#[must_use]
pub fn nickname_key(nickname: &str) -> String {
    nickname
        .chars()
        .filter(|c| *c != ' ')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Check a nickname: 4-16 ASCII letters or digits with at most one inner space.
pub fn validate_nickname(nickname: &str) -> Result<(), PlayerError> {
    let invalid = || PlayerError::InvalidNickname(nickname.to_string());

    let len = nickname.chars().count();
    if !(NICKNAME_MIN_LEN..=NICKNAME_MAX_LEN).contains(&len) {
        return Err(invalid());
    }
    if !nickname.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ') {
        return Err(invalid());
    }
    if nickname.matches(' ').count() > 1 || nickname.starts_with(' ') || nickname.ends_with(' ') {
        return Err(invalid());
    }
    Ok(())
}
