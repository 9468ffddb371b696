//! Pair legality and preference weights.
//!
//! A rematch is the only hard constraint, and even it gives way once the
//! generator switches to relaxed mode. Everything else is expressed in the
//! weight; see [`WeightConfig`] for the scale.

use std::collections::HashSet;

use crate::config::{PairingConfig, WeightConfig};
use crate::models::{Game, PlayerId, PlayerStanding};

use super::colors::{self, ColorFit};

/// A player as seen by the generator: the caller's standing with any
/// history from prior games folded in.
#[derive(Debug, Clone)]
pub struct Entrant {
    pub standing: PlayerStanding,
    opponents: HashSet<PlayerId>,
}

impl Entrant {
    /// Merge `prior_games` into `standing`.
    ///
    /// Games listed in `applied_games` are skipped, opponents already on
    /// record are not added twice and the bye count only ever grows to the
    /// number of byes found in the log.
    pub fn new(standing: &PlayerStanding, prior_games: &[Game]) -> Self {
        let mut merged = standing.clone();
        let mut opponents: HashSet<PlayerId> = standing.opponents.iter().cloned().collect();
        let mut logged_byes = 0;

        for game in prior_games.iter().filter(|g| g.involves(&standing.id)) {
            if game.is_bye() {
                logged_byes += 1;
                continue;
            }
            if standing.applied_games.contains(&game.id) {
                continue;
            }
            if let (Some(color), Some(opponent)) =
                (game.color_of(&standing.id), game.opponent_of(&standing.id))
            {
                if opponents.insert(opponent.clone()) {
                    merged.opponents.push(opponent.clone());
                    merged.colors.push(color);
                }
            }
        }

        merged.byes = merged.byes.max(logged_byes);

        Self {
            standing: merged,
            opponents,
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.standing.id
    }

    pub fn half_points(&self) -> u32 {
        self.standing.half_points()
    }

    pub fn pairing_number(&self) -> u32 {
        self.standing.pairing_number
    }

    pub fn byes(&self) -> u32 {
        self.standing.byes
    }

    pub fn has_played(&self, other: &PlayerId) -> bool {
        self.opponents.contains(other)
    }
}

/// Settings a compatibility check runs under.
#[derive(Debug, Clone, Copy)]
pub struct PairingContext<'a> {
    pub config: &'a PairingConfig,
    /// Whether rematches are currently acceptable
    pub relax_rematches: bool,
}

impl<'a> PairingContext<'a> {
    pub fn strict(config: &'a PairingConfig) -> Self {
        Self {
            config,
            relax_rematches: false,
        }
    }

    pub fn relaxed(config: &'a PairingConfig) -> Self {
        Self {
            config,
            relax_rematches: true,
        }
    }
}

/// Verdict on pairing two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compatibility {
    pub legal: bool,
    pub rematch: bool,
    pub color_fit: ColorFit,
    pub weight: i64,
}

/// Judge the pair `a`-`b`.
pub fn compatible(a: &Entrant, b: &Entrant, context: &PairingContext<'_>) -> Compatibility {
    let rematch = a.has_played(b.id()) || b.has_played(a.id());
    let color_fit = colors::fit(
        &a.standing,
        &b.standing,
        context.config.max_color_imbalance,
    );
    let gap = a.half_points().abs_diff(b.half_points());

    Compatibility {
        legal: !rematch || context.relax_rematches,
        rematch,
        color_fit,
        weight: weight(&context.config.weights, gap, color_fit, rematch),
    }
}

fn weight(weights: &WeightConfig, gap: u32, color_fit: ColorFit, rematch: bool) -> i64 {
    let color_term = match color_fit {
        ColorFit::Satisfied => weights.color_preference,
        ColorFit::Tolerated => weights.color_tolerated,
        ColorFit::Exceeded => 0,
    };
    let rematch_term = if rematch { weights.rematch_penalty } else { 0 };

    weights.base - weights.score_step * i64::from(gap) + color_term - rematch_term
}
