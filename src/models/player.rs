//! Player standing model: the pairing view of a tournament entrant.

use serde::{Deserialize, Serialize};

use super::{Color, GameId, PlayerId};

/// A player's standing going into the next round.
///
/// Standings are value snapshots: the engine never mutates a caller's
/// standings in place, it returns updated copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStanding {
    /// Stable identifier
    pub id: PlayerId,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Seed assigned at tournament start (1 = strongest); never changes
    pub pairing_number: u32,

    /// Wins + 0.5 x draws, byes counting as wins
    #[serde(default)]
    pub score: f64,

    /// Opponents met so far, in round order
    #[serde(default)]
    pub opponents: Vec<PlayerId>,

    /// Colours played so far, in round order (byes excluded)
    #[serde(default)]
    pub colors: Vec<Color>,

    /// Number of byes received
    #[serde(default)]
    pub byes: u32,

    /// Withdrawn players are kept for history but never paired
    #[serde(default)]
    pub withdrawn: bool,

    /// Games already reflected in this standing
    #[serde(default)]
    pub applied_games: Vec<GameId>,
}

impl PlayerStanding {
    /// Create a fresh standing with no history.
    pub fn new(id: PlayerId, pairing_number: u32) -> Self {
        Self {
            id,
            name: None,
            pairing_number,
            score: 0.0,
            opponents: Vec::new(),
            colors: Vec::new(),
            byes: 0,
            withdrawn: false,
            applied_games: Vec::new(),
        }
    }

    /// Builder method to set the display name.
    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    /// Builder method to set the score.
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    /// Builder method to record a past game against `opponent` with `color`.
    pub fn with_game(mut self, opponent: PlayerId, color: Color) -> Self {
        self.opponents.push(opponent);
        self.colors.push(color);
        self
    }

    /// Builder method to set the bye count.
    pub fn with_byes(mut self, byes: u32) -> Self {
        self.byes = byes;
        self
    }

    /// Builder method to mark the player withdrawn.
    pub fn withdrawn(mut self) -> Self {
        self.withdrawn = true;
        self
    }

    /// Identity, name and withdrawal kept, everything else wiped as at tournament start.
    pub fn reset(&self) -> Self {
        Self {
            name: self.name.clone(),
            withdrawn: self.withdrawn,
            ..Self::new(self.id.clone(), self.pairing_number)
        }
    }

    /// Score in half points, the unit score groups are keyed on.
    pub fn half_points(&self) -> u32 {
        (self.score * 2.0).round().max(0.0) as u32
    }

    pub fn is_active(&self) -> bool {
        !self.withdrawn
    }

    pub fn has_played(&self, opponent: &PlayerId) -> bool {
        self.opponents.contains(opponent)
    }

    /// Whites minus blacks.
    pub fn color_balance(&self) -> i32 {
        self.colors.iter().map(|c| c.balance_delta()).sum()
    }

    /// The colour this player should receive next.
    ///
    /// More whites than blacks means black is due and vice versa; with equal
    /// counts the colour not played last is due. No history, no preference.
    pub fn due_color(&self) -> Option<Color> {
        let balance = self.color_balance();
        if balance > 0 {
            Some(Color::Black)
        } else if balance < 0 {
            Some(Color::White)
        } else {
            self.colors.last().map(|c| c.opposite())
        }
    }
}
