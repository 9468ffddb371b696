//! Core data models for the pairing engine.

mod color;
mod game;
mod ids;
mod player;
mod round;

pub use color::*;
pub use game::*;
pub use ids::*;
pub use player::*;
pub use round::*;
