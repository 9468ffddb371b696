//! Filesystem snapshots of tournaments.
//!
//! Each tournament lives in its own directory under the data dir:
//! - `players.jsonl`: the roster, one standing per line
//! - `games.jsonl`: every paired game, byes included, in pairing order

pub mod jsonl;

use std::path::PathBuf;

use thiserror::Error;

use crate::models::TournamentId;

pub use jsonl::{
    append_games, read_games, read_players, write_games, write_players, EntityType, JsonlReader,
    JsonlWriter,
};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed line {line} in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    /// Create a storage config rooted at `data_dir`.
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Directory holding one subdirectory per tournament.
    pub fn tournaments_dir(&self) -> PathBuf {
        self.data_dir.join("tournaments")
    }

    /// Directory of a single tournament.
    pub fn tournament_dir(&self, tournament: &TournamentId) -> PathBuf {
        self.tournaments_dir().join(tournament.as_str())
    }

    /// Path of one of a tournament's JSONL files.
    pub fn entity_path(&self, tournament: &TournamentId, entity: EntityType) -> PathBuf {
        self.tournament_dir(tournament).join(entity.filename())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_paths() {
        let config = StorageConfig::new(PathBuf::from("/data"));
        let open = TournamentId::from("spring-open");

        assert_eq!(config.tournaments_dir(), PathBuf::from("/data/tournaments"));
        assert_eq!(
            config.tournament_dir(&open),
            PathBuf::from("/data/tournaments/spring-open")
        );
        assert_eq!(
            config.entity_path(&open, EntityType::Game),
            PathBuf::from("/data/tournaments/spring-open/games.jsonl")
        );
    }

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }
}
