//! Swiss-system pairing.
//!
//! - **constraints**: pair legality and preference weights
//! - **colors**: colour allocation for a finalized pair
//! - **swiss**: the round generator, with blossom-matching fallback

pub mod colors;
pub mod constraints;
mod swiss;

use thiserror::Error;

use crate::matching::MatchingError;
use crate::models::PlayerId;

pub use colors::ColorFit;
pub use constraints::{compatible, Compatibility, Entrant, PairingContext};
pub use swiss::generate_swiss_round;

/// Errors that can occur while generating a round.
#[derive(Debug, Error)]
pub enum PairingError {
    #[error("Invalid round number: {0}")]
    InvalidRound(u32),

    #[error("Round {round} exceeds the tournament limit of {max} rounds")]
    RoundLimitExceeded { round: u32, max: u32 },

    #[error("No active players to pair")]
    EmptyRoster,

    #[error("Duplicate player id: {0}")]
    DuplicatePlayer(PlayerId),

    #[error("Duplicate pairing number: {0}")]
    DuplicatePairingNumber(u32),

    #[error("Invalid standing for {player}: {reason}")]
    InvalidStanding { player: PlayerId, reason: String },

    #[error("Round {round} is already paired (games exist for round {existing})")]
    RoundAlreadyPaired { round: u32, existing: u32 },

    #[error("Round {0} cannot be paired without rematches and rematches are disabled")]
    RelaxationDisabled(u32),

    #[error("Internal pairing inconsistency: {0}")]
    Inconsistent(String),

    #[error("Matching failed: {0}")]
    Matching(#[from] MatchingError),
}

impl PairingError {
    /// A defect in the engine or its input bookkeeping, not a bad request.
    /// Retrying with the same input cannot succeed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PairingError::Inconsistent(_) | PairingError::Matching(_))
    }

    /// Malformed input, rejected before any pairing was attempted.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PairingError::InvalidRound(_)
                | PairingError::RoundLimitExceeded { .. }
                | PairingError::EmptyRoster
                | PairingError::DuplicatePlayer(_)
                | PairingError::DuplicatePairingNumber(_)
                | PairingError::InvalidStanding { .. }
                | PairingError::RoundAlreadyPaired { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::config::PairingConfig;
    use crate::models::{Game, GameResult, PlayerStanding, Relaxation, TournamentId};
    use crate::standings::update_standings;

    fn find<'a>(players: &'a [PlayerStanding], id: &PlayerId) -> &'a PlayerStanding {
        players.iter().find(|p| &p.id == id).unwrap()
    }

    #[test]
    fn test_error_classification() {
        assert!(PairingError::EmptyRoster.is_validation());
        assert!(!PairingError::EmptyRoster.is_fatal());
        assert!(PairingError::Inconsistent("x".to_string()).is_fatal());
        assert!(!PairingError::RelaxationDisabled(3).is_validation());
        assert!(!PairingError::RelaxationDisabled(3).is_fatal());
    }

    /// Play out random tournaments and check every round against the
    /// pairing guarantees.
    #[test]
    fn test_simulated_tournaments() {
        let tournament = TournamentId::from("sim");
        let config = PairingConfig::default();
        assert_eq!(config.max_color_imbalance, 1);

        for seed in 0..40 {
            let mut rng = StdRng::seed_from_u64(seed);
            let size: u32 = rng.gen_range(2..=16);
            let rounds: u32 = rng.gen_range(1..=size.min(7));

            let mut players: Vec<PlayerStanding> = (1..=size)
                .map(|n| PlayerStanding::new(PlayerId::from(format!("p{}", n)), n))
                .collect();
            let mut log: Vec<Game> = Vec::new();

            for round in 1..=rounds {
                let pairing =
                    generate_swiss_round(&players, &log, round, &tournament, &config).unwrap();

                // Everyone exactly once.
                let mut seen = HashSet::new();
                for game in &pairing.games {
                    assert!(seen.insert(game.white.clone()), "seed {}", seed);
                    if let Some(black) = &game.black {
                        assert!(seen.insert(black.clone()), "seed {}", seed);
                    }
                }
                assert_eq!(seen.len(), size as usize);
                assert_eq!(pairing.boards().count(), (size / 2) as usize);
                assert_eq!(pairing.bye().is_some(), size % 2 == 1);

                // Rematches only when flagged.
                for game in pairing.boards() {
                    let white = find(&players, &game.white);
                    if white.has_played(game.black.as_ref().unwrap()) {
                        assert!(game.relaxations.contains(&Relaxation::Rematch));
                    }
                }

                // Nobody gets a second bye while someone has none.
                if let Some(bye) = pairing.bye() {
                    let fewest = players.iter().map(|p| p.byes).min().unwrap();
                    assert_eq!(find(&players, &bye.white).byes, fewest);
                }

                let reported: Vec<Game> = pairing
                    .games
                    .into_iter()
                    .map(|g| {
                        if g.is_bye() {
                            return g;
                        }
                        let result = match rng.gen_range(0..3) {
                            0 => GameResult::WhiteWins,
                            1 => GameResult::BlackWins,
                            _ => GameResult::Draw,
                        };
                        g.with_result(result)
                    })
                    .collect();

                let updated = update_standings(&players, &reported).unwrap();
                for (before, after) in players.iter().zip(&updated) {
                    assert!(after.score >= before.score);
                }

                // Nobody drifts past |W-B| = 1 unless the game is flagged.
                for game in reported.iter().filter(|g| !g.is_bye()) {
                    for id in [Some(&game.white), game.black.as_ref()].into_iter().flatten() {
                        let balance = find(&updated, id).color_balance().unsigned_abs();
                        if balance > config.max_color_imbalance {
                            assert!(game.relaxations.contains(&Relaxation::ColorImbalance));
                        }
                    }
                }

                players = updated;
                log.extend(reported);
            }
        }
    }
}
