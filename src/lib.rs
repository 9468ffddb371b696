//! # Swiss Pairing
//!
//! A Swiss-system round pairing engine.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (players, games, rounds, ids)
//! - **matching**: Maximum-cardinality matching on general graphs
//! - **pairing**: Pair legality, colour allocation and the round generator
//! - **standings**: Applying results, rebuilding and ranking standings
//! - **config**: Configuration loading and validation
//! - **storage**: Per-tournament JSONL snapshots

pub mod config;
pub mod matching;
pub mod models;
pub mod pairing;
pub mod standings;
pub mod storage;

pub use models::*;
pub use pairing::{generate_swiss_round, PairingError};
pub use standings::{rank_standings, recompute_standings, update_standings, StandingsError};
