//! JSONL (JSON Lines) storage.
//!
//! Each line is one entity. Unlike a cache, these files are the record of
//! the tournament, so a malformed line is an error rather than skipped.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use super::{StorageConfig, StorageError};
use crate::models::{Game, PlayerStanding, TournamentId};

/// Entity types for JSONL storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Player,
    Game,
}

impl EntityType {
    /// Get the filename for this entity type.
    pub fn filename(&self) -> &'static str {
        match self {
            EntityType::Player => "players.jsonl",
            EntityType::Game => "games.jsonl",
        }
    }
}

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    /// Create a new JSONL writer for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a writer for one of a tournament's files.
    pub fn for_entity(config: &StorageConfig, tournament: &TournamentId, entity: EntityType) -> Self {
        Self::new(config.entity_path(tournament, entity))
    }

    /// Path of the file being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the parent directory exists.
    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Append entities to the file, creating it if needed.
    pub fn append_batch(&self, entities: &[T]) -> Result<usize, StorageError> {
        if entities.is_empty() {
            return Ok(0);
        }

        self.ensure_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let count = write_lines(BufWriter::new(file), entities)?;
        info!("Appended {} entities to {:?}", count, self.path);
        Ok(count)
    }

    /// Write entities, replacing the entire file.
    ///
    /// The new contents go to a sibling temp file first and are renamed into
    /// place, so a crash never leaves a half-written snapshot.
    pub fn write_all(&self, entities: &[T]) -> Result<usize, StorageError> {
        self.ensure_dir()?;

        let tmp = self.path.with_extension("jsonl.tmp");
        let count = write_lines(BufWriter::new(File::create(&tmp)?), entities)?;
        fs::rename(&tmp, &self.path)?;

        info!("Wrote {} entities to {:?}", count, self.path);
        Ok(count)
    }
}

fn write_lines<T: Serialize, W: Write>(
    mut writer: BufWriter<W>,
    entities: &[T],
) -> Result<usize, StorageError> {
    for entity in entities {
        let json = serde_json::to_string(entity)?;
        writeln!(writer, "{}", json)?;
    }
    writer.flush()?;
    Ok(entities.len())
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    /// Create a new JSONL reader for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a reader for one of a tournament's files.
    pub fn for_entity(config: &StorageConfig, tournament: &TournamentId, entity: EntityType) -> Self {
        Self::new(config.entity_path(tournament, entity))
    }

    /// Read all entities. A missing file reads as empty.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut entities = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let entity = serde_json::from_str(&line).map_err(|source| StorageError::Parse {
                path: self.path.clone(),
                line: index + 1,
                source,
            })?;
            entities.push(entity);
        }

        debug!("Read {} entities from {:?}", entities.len(), self.path);
        Ok(entities)
    }
}

/// Read a tournament's roster, ordered by pairing number.
pub fn read_players(
    config: &StorageConfig,
    tournament: &TournamentId,
) -> Result<Vec<PlayerStanding>, StorageError> {
    let mut players: Vec<PlayerStanding> =
        JsonlReader::for_entity(config, tournament, EntityType::Player).read_all()?;
    players.sort_by_key(|p| p.pairing_number);
    Ok(players)
}

/// Replace a tournament's roster.
pub fn write_players(
    config: &StorageConfig,
    tournament: &TournamentId,
    players: &[PlayerStanding],
) -> Result<usize, StorageError> {
    JsonlWriter::for_entity(config, tournament, EntityType::Player).write_all(players)
}

/// Read a tournament's game log, ordered by round then board.
pub fn read_games(config: &StorageConfig, tournament: &TournamentId) -> Result<Vec<Game>, StorageError> {
    let mut games: Vec<Game> =
        JsonlReader::for_entity(config, tournament, EntityType::Game).read_all()?;
    games.sort_by_key(|g| (g.round, g.board));
    Ok(games)
}

/// Append newly paired games to a tournament's log.
pub fn append_games(
    config: &StorageConfig,
    tournament: &TournamentId,
    games: &[Game],
) -> Result<usize, StorageError> {
    JsonlWriter::for_entity(config, tournament, EntityType::Game).append_batch(games)
}

/// Replace a tournament's game log, e.g. after a result is reported.
pub fn write_games(
    config: &StorageConfig,
    tournament: &TournamentId,
    games: &[Game],
) -> Result<usize, StorageError> {
    JsonlWriter::for_entity(config, tournament, EntityType::Game).write_all(games)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GameResult, PlayerId};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> StorageConfig {
        StorageConfig::new(temp_dir.path().to_path_buf())
    }

    fn open() -> TournamentId {
        TournamentId::from("open")
    }

    #[test]
    fn test_players_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let players = vec![
            PlayerStanding::new(PlayerId::from("b"), 2).with_name("Bea".to_string()),
            PlayerStanding::new(PlayerId::from("a"), 1).with_score(1.5),
        ];
        assert_eq!(write_players(&config, &open(), &players).unwrap(), 2);

        let read = read_players(&config, &open()).unwrap();
        assert_eq!(read, vec![players[1].clone(), players[0].clone()]);
    }

    #[test]
    fn test_games_append_and_sort() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let round_two = vec![Game::new(open(), 2, 1, PlayerId::from("a"), PlayerId::from("b"))];
        let round_one = vec![
            Game::bye(open(), 1, 2, PlayerId::from("c")),
            Game::new(open(), 1, 1, PlayerId::from("b"), PlayerId::from("a"))
                .with_result(GameResult::Draw),
        ];

        append_games(&config, &open(), &round_two).unwrap();
        append_games(&config, &open(), &round_one).unwrap();

        let games = read_games(&config, &open()).unwrap();
        let order: Vec<(u32, u32)> = games.iter().map(|g| (g.round, g.board)).collect();
        assert_eq!(order, vec![(1, 1), (1, 2), (2, 1)]);
        assert_eq!(games[0].result, Some(GameResult::Draw));
        assert!(games[1].is_bye());
    }

    #[test]
    fn test_write_games_replaces_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let game = Game::new(open(), 1, 1, PlayerId::from("a"), PlayerId::from("b"));
        append_games(&config, &open(), &[game.clone()]).unwrap();

        let reported = game.with_result(GameResult::WhiteWins);
        write_games(&config, &open(), &[reported.clone()]).unwrap();

        assert_eq!(read_games(&config, &open()).unwrap(), vec![reported]);
        assert!(!config
            .entity_path(&open(), EntityType::Game)
            .with_extension("jsonl.tmp")
            .exists());
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        assert!(read_players(&config, &open()).unwrap().is_empty());
        assert!(read_games(&config, &open()).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_line_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad_lines.jsonl");
        std::fs::write(
            &path,
            "{\"id\":\"a\",\"pairing_number\":1}\n\nnot-valid-json\n",
        )
        .unwrap();

        let reader: JsonlReader<PlayerStanding> = JsonlReader::new(path);
        match reader.read_all() {
            Err(StorageError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_append_batch_empty() {
        let temp_dir = TempDir::new().unwrap();
        let writer: JsonlWriter<Game> = JsonlWriter::new(temp_dir.path().join("games.jsonl"));

        assert_eq!(writer.append_batch(&[]).unwrap(), 0);
        assert!(!writer.path().exists());
    }

    #[test]
    fn test_entity_type_filename() {
        assert_eq!(EntityType::Player.filename(), "players.jsonl");
        assert_eq!(EntityType::Game.filename(), "games.jsonl");
    }
}
