//! Score and standing updates.
//!
//! Pure functions from `(players, games)` to updated players. Every game a
//! standing reflects is recorded in its `applied_games`, so feeding the same
//! result twice is rejected instead of double-counted.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{Color, Game, GameId, PlayerId, PlayerStanding};

/// Errors that can occur while applying results.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StandingsError {
    #[error("Game {game} references unknown player {player}")]
    UnknownPlayer { game: GameId, player: PlayerId },

    #[error("Game {game} is already reflected in the standing of {player}")]
    AlreadyApplied { game: GameId, player: PlayerId },

    #[error("Game {0} appears more than once")]
    DuplicateGame(GameId),

    #[error("Game {0} pairs a player against themselves")]
    SelfPairing(GameId),
}

/// Apply newly reported results to `players`.
///
/// Byes always score; played games without a result are skipped. Either
/// every scored game is applied or none is.
pub fn update_standings(
    players: &[PlayerStanding],
    new_results: &[Game],
) -> Result<Vec<PlayerStanding>, StandingsError> {
    let index: HashMap<&PlayerId, usize> = players
        .iter()
        .enumerate()
        .map(|(i, p)| (&p.id, i))
        .collect();

    let mut scored: Vec<&Game> = new_results.iter().filter(|g| g.is_scored()).collect();
    scored.sort_by_key(|g| (g.round, g.board));

    let skipped = new_results.len() - scored.len();
    if skipped > 0 {
        debug!(skipped, "skipping games without a reported result");
    }

    let mut seen = HashSet::new();
    for game in &scored {
        if !seen.insert(&game.id) {
            return Err(StandingsError::DuplicateGame(game.id.clone()));
        }
        if game.black.as_ref() == Some(&game.white) {
            return Err(StandingsError::SelfPairing(game.id.clone()));
        }
        for player in std::iter::once(&game.white).chain(game.black.as_ref()) {
            let Some(&i) = index.get(player) else {
                return Err(StandingsError::UnknownPlayer {
                    game: game.id.clone(),
                    player: player.clone(),
                });
            };
            if players[i].applied_games.contains(&game.id) {
                return Err(StandingsError::AlreadyApplied {
                    game: game.id.clone(),
                    player: player.clone(),
                });
            }
        }
    }

    let mut updated = players.to_vec();
    for game in &scored {
        match &game.black {
            None => {
                let player = &mut updated[index[&game.white]];
                player.score += 1.0;
                player.byes += 1;
                player.applied_games.push(game.id.clone());
            }
            Some(black) => {
                let sides = [
                    (&game.white, black, Color::White),
                    (black, &game.white, Color::Black),
                ];
                for (player_id, opponent, color) in sides {
                    let points = game.points_for(player_id).unwrap_or(0.0);
                    let player = &mut updated[index[player_id]];
                    player.score += points;
                    player.opponents.push(opponent.clone());
                    player.colors.push(color);
                    player.applied_games.push(game.id.clone());
                }
            }
        }
    }

    info!(applied = scored.len(), "standings updated");
    Ok(updated)
}

/// Rebuild every standing from scratch out of the full game log.
///
/// Running this twice on the same input gives the same output.
pub fn recompute_standings(
    players: &[PlayerStanding],
    games: &[Game],
) -> Result<Vec<PlayerStanding>, StandingsError> {
    let reset: Vec<PlayerStanding> = players.iter().map(|p| p.reset()).collect();
    update_standings(&reset, games)
}

/// One line of a standings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingRow {
    pub rank: u32,
    pub player_id: PlayerId,
    pub name: Option<String>,
    pub pairing_number: u32,
    pub score: f64,
    /// Sum of the opponents' scores
    pub buchholz: f64,
    pub games_played: usize,
    pub color_balance: i32,
    pub withdrawn: bool,
}

/// Order players by score, then Buchholz, then pairing number.
pub fn rank_standings(players: &[PlayerStanding]) -> Vec<StandingRow> {
    let scores: HashMap<&PlayerId, f64> = players.iter().map(|p| (&p.id, p.score)).collect();

    let mut rows: Vec<StandingRow> = players
        .iter()
        .map(|p| StandingRow {
            rank: 0,
            player_id: p.id.clone(),
            name: p.name.clone(),
            pairing_number: p.pairing_number,
            score: p.score,
            buchholz: p.opponents.iter().filter_map(|o| scores.get(o)).sum(),
            games_played: p.opponents.len(),
            color_balance: p.color_balance(),
            withdrawn: p.withdrawn,
        })
        .collect();

    rows.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(b.buchholz.total_cmp(&a.buchholz))
            .then(a.pairing_number.cmp(&b.pairing_number))
    });
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i as u32 + 1;
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GameResult, TournamentId};
    use pretty_assertions::assert_eq;

    fn tournament() -> TournamentId {
        TournamentId::from("open")
    }

    fn roster() -> Vec<PlayerStanding> {
        ["a", "b", "c"]
            .iter()
            .enumerate()
            .map(|(i, id)| PlayerStanding::new(PlayerId::from(*id), i as u32 + 1))
            .collect()
    }

    fn game(round: u32, white: &str, black: &str, result: GameResult) -> Game {
        Game::new(
            tournament(),
            round,
            1,
            PlayerId::from(white),
            PlayerId::from(black),
        )
        .with_result(result)
    }

    fn find<'a>(players: &'a [PlayerStanding], id: &str) -> &'a PlayerStanding {
        players.iter().find(|p| p.id.as_str() == id).unwrap()
    }

    #[test]
    fn test_win_and_bye() {
        let games = vec![
            game(1, "a", "b", GameResult::WhiteWins),
            Game::bye(tournament(), 1, 2, PlayerId::from("c")),
        ];

        let updated = update_standings(&roster(), &games).unwrap();

        let a = find(&updated, "a");
        assert_eq!(a.score, 1.0);
        assert_eq!(a.opponents, vec![PlayerId::from("b")]);
        assert_eq!(a.colors, vec![Color::White]);

        let b = find(&updated, "b");
        assert_eq!(b.score, 0.0);
        assert_eq!(b.colors, vec![Color::Black]);

        let c = find(&updated, "c");
        assert_eq!(c.score, 1.0);
        assert_eq!(c.byes, 1);
        assert!(c.colors.is_empty());
        assert!(c.opponents.is_empty());
    }

    #[test]
    fn test_draw() {
        let updated =
            update_standings(&roster(), &[game(1, "b", "c", GameResult::Draw)]).unwrap();
        assert_eq!(find(&updated, "b").score, 0.5);
        assert_eq!(find(&updated, "c").score, 0.5);
        assert_eq!(find(&updated, "a").score, 0.0);
    }

    #[test]
    fn test_unreported_games_are_skipped() {
        let pending = Game::new(tournament(), 1, 1, PlayerId::from("a"), PlayerId::from("b"));
        let updated = update_standings(&roster(), &[pending]).unwrap();
        assert_eq!(updated, roster());
    }

    #[test]
    fn test_reapplying_a_game_is_rejected() {
        let result = game(1, "a", "b", GameResult::BlackWins);
        let once = update_standings(&roster(), &[result.clone()]).unwrap();

        let twice = update_standings(&once, &[result.clone()]);
        assert_eq!(
            twice,
            Err(StandingsError::AlreadyApplied {
                game: result.id.clone(),
                player: PlayerId::from("a"),
            })
        );
    }

    #[test]
    fn test_duplicate_in_batch_is_rejected() {
        let result = game(1, "a", "b", GameResult::Draw);
        assert_eq!(
            update_standings(&roster(), &[result.clone(), result.clone()]),
            Err(StandingsError::DuplicateGame(result.id))
        );
    }

    #[test]
    fn test_unknown_player_rejects_whole_batch() {
        let games = vec![
            game(1, "a", "b", GameResult::WhiteWins),
            game(1, "c", "zed", GameResult::WhiteWins),
        ];
        assert!(matches!(
            update_standings(&roster(), &games),
            Err(StandingsError::UnknownPlayer { .. })
        ));
    }

    #[test]
    fn test_self_pairing_is_rejected() {
        let games = vec![game(1, "a", "a", GameResult::Draw)];
        assert!(matches!(
            update_standings(&roster(), &games),
            Err(StandingsError::SelfPairing(_))
        ));
    }

    #[test]
    fn test_scores_never_decrease_and_touch_two_players() {
        let before = roster();
        let after = update_standings(&before, &[game(1, "a", "c", GameResult::BlackWins)]).unwrap();

        for (old, new) in before.iter().zip(&after) {
            assert!(new.score >= old.score);
        }
        let changed = before.iter().zip(&after).filter(|(o, n)| o != n).count();
        assert_eq!(changed, 2);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let games = vec![
            game(1, "a", "b", GameResult::WhiteWins),
            Game::bye(tournament(), 1, 2, PlayerId::from("c")),
            game(2, "c", "a", GameResult::Draw),
            Game::bye(tournament(), 2, 2, PlayerId::from("b")),
        ];

        let once = recompute_standings(&roster(), &games).unwrap();
        let twice = recompute_standings(&once, &games).unwrap();
        assert_eq!(once, twice);

        let a = find(&once, "a");
        assert_eq!(a.score, 1.5);
        assert_eq!(a.colors, vec![Color::White, Color::Black]);
    }

    #[test]
    fn test_games_apply_in_round_order() {
        let games = vec![
            game(2, "c", "a", GameResult::Draw),
            game(1, "a", "b", GameResult::WhiteWins),
        ];
        let updated = update_standings(&roster(), &games).unwrap();
        assert_eq!(
            find(&updated, "a").opponents,
            vec![PlayerId::from("b"), PlayerId::from("c")]
        );
    }

    #[test]
    fn test_rank_standings_uses_buchholz() {
        let games = vec![
            game(1, "a", "b", GameResult::WhiteWins),
            Game::bye(tournament(), 1, 2, PlayerId::from("c")),
        ];
        let players = update_standings(&roster(), &games).unwrap();
        let rows = rank_standings(&players);

        // a and c tie on points and Buchholz; the seed decides.
        assert_eq!(rows[0].player_id.as_str(), "a");
        assert_eq!(rows[1].player_id.as_str(), "c");
        assert_eq!(rows[2].player_id.as_str(), "b");
        assert_eq!(rows[2].buchholz, 1.0);
        assert_eq!(rows.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}
