//! Round model: the output of one generator invocation.

use serde::{Deserialize, Serialize};

use super::{Game, PlayerId, Relaxation, TournamentId};

/// A relaxed constraint, reported so organizers can be told about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaxationEvent {
    pub kind: Relaxation,
    pub board: u32,
    pub white: PlayerId,
    pub black: PlayerId,
}

impl std::fmt::Display for RelaxationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "board {}: {} ({} vs {})",
            self.board, self.kind, self.white, self.black
        )
    }
}

/// The complete pairing of one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundPairing {
    pub tournament_id: TournamentId,

    pub round: u32,

    /// Games in board order; a bye, if any, is last
    pub games: Vec<Game>,

    /// Every constraint relaxed to complete the round
    #[serde(default)]
    pub relaxations: Vec<RelaxationEvent>,

    /// Whether the blossom fallback had to be used
    #[serde(default)]
    pub used_fallback: bool,
}

impl RoundPairing {
    /// The bye game, if the round has one.
    pub fn bye(&self) -> Option<&Game> {
        self.games.iter().find(|g| g.is_bye())
    }

    /// Played (non-bye) games.
    pub fn boards(&self) -> impl Iterator<Item = &Game> {
        self.games.iter().filter(|g| !g.is_bye())
    }

    pub fn is_relaxed(&self) -> bool {
        !self.relaxations.is_empty()
    }

    pub fn has_relaxation(&self, kind: Relaxation) -> bool {
        self.relaxations.iter().any(|r| r.kind == kind)
    }
}
