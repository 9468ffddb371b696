//! Identifiers for players, games and tournaments.
//!
//! Players and tournaments are named by the organizer. Game ids are derived
//! from the game's content so that re-pairing the same round reproduces them.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wrap an existing id string.
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Derive an id from `fields`: the first 16 hex digits of the SHA256 of
    /// the fields joined with `|`.
    pub fn generate(fields: &[&str]) -> Self {
        let digest = Sha256::digest(fields.join("|").as_bytes());
        Self(hex::encode(&digest[..8]))
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

pub type PlayerId = EntityId;
pub type GameId = EntityId;
pub type TournamentId = EntityId;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_generation_deterministic() {
        let id1 = EntityId::generate(&["club-open", "3", "alice", "bob"]);
        let id2 = EntityId::generate(&["club-open", "3", "alice", "bob"]);
        assert_eq!(id1, id2);
    }

    #[test]
    fn test_entity_id_field_order_matters() {
        let id1 = EntityId::generate(&["club-open", "3", "alice", "bob"]);
        let id2 = EntityId::generate(&["club-open", "3", "bob", "alice"]);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_entity_id_length_and_hex() {
        let id = EntityId::generate(&["test", "input"]);
        assert_eq!(id.as_str().len(), 16);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_entity_id_serializes_as_plain_string() {
        let id = EntityId::from("alice");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"alice\"");

        let deserialized: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_entity_id_display() {
        let id = EntityId::new("abc123def456".to_string());
        assert_eq!(format!("{}", id), "abc123def456");
        assert!(format!("{:?}", id).contains("abc123def456"));
    }
}
