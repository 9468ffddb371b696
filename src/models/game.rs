//! Game model: one board of a round, or a bye.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Color, EntityId, GameId, PlayerId, TournamentId};

/// Reported outcome of a played game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    #[serde(rename = "1-0")]
    WhiteWins,
    #[serde(rename = "0-1")]
    BlackWins,
    #[serde(rename = "1/2-1/2")]
    Draw,
}

impl GameResult {
    /// Points earned by the side playing `color`.
    pub fn points_for(&self, color: Color) -> f64 {
        match (self, color) {
            (GameResult::Draw, _) => 0.5,
            (GameResult::WhiteWins, Color::White) | (GameResult::BlackWins, Color::Black) => 1.0,
            _ => 0.0,
        }
    }
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameResult::WhiteWins => write!(f, "1-0"),
            GameResult::BlackWins => write!(f, "0-1"),
            GameResult::Draw => write!(f, "1/2-1/2"),
        }
    }
}

impl FromStr for GameResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1-0" | "white" => Ok(GameResult::WhiteWins),
            "0-1" | "black" => Ok(GameResult::BlackWins),
            "1/2-1/2" | "1/2" | "=" | "draw" => Ok(GameResult::Draw),
            other => Err(format!("Unknown result: {}", other)),
        }
    }
}

/// A constraint the generator had to relax to complete a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relaxation {
    /// The two players have met before in this tournament.
    Rematch,
    /// A player's colour imbalance exceeds the configured limit.
    ColorImbalance,
}

impl std::fmt::Display for Relaxation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Relaxation::Rematch => write!(f, "rematch"),
            Relaxation::ColorImbalance => write!(f, "color imbalance"),
        }
    }
}

/// A single game of a round. A game with no black player is a bye.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    /// Deterministic identifier
    pub id: GameId,

    /// Tournament this game belongs to
    pub tournament_id: TournamentId,

    /// Round number (1-based)
    pub round: u32,

    /// Board number within the round (1 = top board)
    pub board: u32,

    /// White player, or the player receiving the bye
    pub white: PlayerId,

    /// Black player; `None` marks a bye
    pub black: Option<PlayerId>,

    /// Result, `None` until reported
    #[serde(default)]
    pub result: Option<GameResult>,

    /// Constraints relaxed to form this pairing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relaxations: Vec<Relaxation>,

    /// When the result was recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_at: Option<DateTime<Utc>>,
}

impl Game {
    /// Create a new pairing with auto-generated ID.
    pub fn new(
        tournament_id: TournamentId,
        round: u32,
        board: u32,
        white: PlayerId,
        black: PlayerId,
    ) -> Self {
        let id = EntityId::generate(&[
            tournament_id.as_str(),
            &round.to_string(),
            white.as_str(),
            black.as_str(),
        ]);

        Self {
            id,
            tournament_id,
            round,
            board,
            white,
            black: Some(black),
            result: None,
            relaxations: Vec::new(),
            reported_at: None,
        }
    }

    /// Create a bye for `player`.
    pub fn bye(tournament_id: TournamentId, round: u32, board: u32, player: PlayerId) -> Self {
        let id = EntityId::generate(&[
            tournament_id.as_str(),
            &round.to_string(),
            player.as_str(),
            "bye",
        ]);

        Self {
            id,
            tournament_id,
            round,
            board,
            white: player,
            black: None,
            result: None,
            relaxations: Vec::new(),
            reported_at: None,
        }
    }

    /// Builder method to set the result.
    pub fn with_result(mut self, result: GameResult) -> Self {
        self.result = Some(result);
        self
    }

    pub fn is_bye(&self) -> bool {
        self.black.is_none()
    }

    /// Byes score without a report; played games need a result.
    pub fn is_scored(&self) -> bool {
        self.is_bye() || self.result.is_some()
    }

    pub fn involves(&self, player: &PlayerId) -> bool {
        &self.white == player || self.black.as_ref() == Some(player)
    }

    /// Colour `player` had in this game, `None` for a bye or a stranger.
    pub fn color_of(&self, player: &PlayerId) -> Option<Color> {
        let black = self.black.as_ref()?;
        if &self.white == player {
            Some(Color::White)
        } else if black == player {
            Some(Color::Black)
        } else {
            None
        }
    }

    pub fn opponent_of(&self, player: &PlayerId) -> Option<&PlayerId> {
        match self.color_of(player)? {
            Color::White => self.black.as_ref(),
            Color::Black => Some(&self.white),
        }
    }

    /// Points `player` earned, if the game has been scored.
    pub fn points_for(&self, player: &PlayerId) -> Option<f64> {
        if self.is_bye() {
            return (&self.white == player).then_some(1.0);
        }
        let color = self.color_of(player)?;
        self.result.map(|r| r.points_for(color))
    }
}
