//! Swiss round generator.
//!
//! One invocation walks `grouping -> greedy pairing -> floater merge ->
//! (complete | matching fallback) -> colour allocation -> emit`. Players are
//! addressed by their index into the sorted entrant list throughout; lower
//! index means higher score, then lower pairing number.

use std::cmp::Reverse;
use std::collections::{HashSet, VecDeque};

use tracing::{debug, info, trace, warn};

use crate::config::PairingConfig;
use crate::matching::{maximum_matching_from, Graph, Matching};
use crate::models::{
    Color, Game, PlayerStanding, Relaxation, RelaxationEvent, RoundPairing, TournamentId,
};

use super::colors::{self, ColorFit};
use super::constraints::{compatible, Entrant, PairingContext};
use super::PairingError;

/// Generate the pairings for `round`.
///
/// `prior_games` may contain games from other tournaments; only games of
/// `tournament_id` are consulted. The result is all-or-nothing: either every
/// active player is placed in exactly one game (or the bye) or an error is
/// returned.
pub fn generate_swiss_round(
    players: &[PlayerStanding],
    prior_games: &[Game],
    round: u32,
    tournament_id: &TournamentId,
    config: &PairingConfig,
) -> Result<RoundPairing, PairingError> {
    validate(players, prior_games, round, tournament_id, config)?;

    let history: Vec<Game> = prior_games
        .iter()
        .filter(|g| &g.tournament_id == tournament_id)
        .cloned()
        .collect();

    let mut entrants: Vec<Entrant> = players
        .iter()
        .filter(|p| p.is_active())
        .map(|p| Entrant::new(p, &history))
        .collect();
    entrants.sort_by_key(|e| (Reverse(e.half_points()), e.pairing_number()));

    debug!(
        round,
        active = entrants.len(),
        withdrawn = players.len() - entrants.len(),
        "pairing round"
    );

    let builder = RoundBuilder {
        entrants,
        config,
        round,
    };
    let (bye, pool) = builder.pair_round()?;
    Ok(builder.emit(tournament_id, bye, pool))
}

fn validate(
    players: &[PlayerStanding],
    prior_games: &[Game],
    round: u32,
    tournament_id: &TournamentId,
    config: &PairingConfig,
) -> Result<(), PairingError> {
    if round == 0 {
        return Err(PairingError::InvalidRound(round));
    }

    if let Some(max) = config.max_rounds {
        if round > max {
            return Err(PairingError::RoundLimitExceeded { round, max });
        }
    }

    if players.is_empty() {
        return Err(PairingError::EmptyRoster);
    }

    let mut ids = HashSet::new();
    let mut pairing_numbers = HashSet::new();
    for player in players {
        if !ids.insert(&player.id) {
            return Err(PairingError::DuplicatePlayer(player.id.clone()));
        }
        if !pairing_numbers.insert(player.pairing_number) {
            return Err(PairingError::DuplicatePairingNumber(player.pairing_number));
        }
        if !player.score.is_finite() || player.score < 0.0 {
            return Err(PairingError::InvalidStanding {
                player: player.id.clone(),
                reason: format!("score {} is not a non-negative number", player.score),
            });
        }
    }

    if !players.iter().any(|p| p.is_active()) {
        return Err(PairingError::EmptyRoster);
    }

    if let Some(existing) = prior_games
        .iter()
        .filter(|g| &g.tournament_id == tournament_id)
        .map(|g| g.round)
        .filter(|&r| r >= round)
        .max()
    {
        return Err(PairingError::RoundAlreadyPaired { round, existing });
    }

    Ok(())
}

/// Pairs found for a pool of entrants.
struct PoolPairing {
    pairs: Vec<(usize, usize)>,
    used_fallback: bool,
}

struct RoundBuilder<'a> {
    entrants: Vec<Entrant>,
    config: &'a PairingConfig,
    round: u32,
}

impl<'a> RoundBuilder<'a> {
    /// Choose the bye (if any) and pair everyone else.
    fn pair_round(&self) -> Result<(Option<usize>, PoolPairing), PairingError> {
        let everyone: Vec<usize> = (0..self.entrants.len()).collect();

        if everyone.len() % 2 == 0 {
            if let Some(pairing) = self.pair_strict(&everyone)? {
                return Ok((None, pairing));
            }
            return Ok((None, self.pair_relaxed(&everyone)?));
        }

        let candidates = self.bye_candidates();
        for &candidate in &candidates {
            let pool: Vec<usize> = everyone.iter().copied().filter(|&i| i != candidate).collect();
            if let Some(pairing) = self.pair_strict(&pool)? {
                debug!(player = %self.entrants[candidate].id(), "bye assigned");
                return Ok((Some(candidate), pairing));
            }
            debug!(
                player = %self.entrants[candidate].id(),
                "no rematch-free round with this bye, trying next candidate"
            );
        }

        let candidate = candidates
            .first()
            .copied()
            .ok_or_else(|| PairingError::Inconsistent("odd roster with no bye candidate".to_string()))?;
        let pool: Vec<usize> = everyone.into_iter().filter(|&i| i != candidate).collect();
        Ok((Some(candidate), self.pair_relaxed(&pool)?))
    }

    /// Bye candidates in fairness order: fewest byes only, then lowest
    /// score, then highest pairing number.
    fn bye_candidates(&self) -> Vec<usize> {
        let Some(fewest) = self.entrants.iter().map(|e| e.byes()).min() else {
            return Vec::new();
        };

        let mut candidates: Vec<usize> = (0..self.entrants.len())
            .filter(|&i| self.entrants[i].byes() == fewest)
            .collect();
        candidates.sort_by_key(|&i| {
            let e = &self.entrants[i];
            (e.half_points(), Reverse(e.pairing_number()))
        });
        candidates
    }

    /// Pair `pool` without rematches, or report that it can't be done.
    fn pair_strict(&self, pool: &[usize]) -> Result<Option<PoolPairing>, PairingError> {
        let context = PairingContext::strict(self.config);
        let (mut pairs, mut residual) = self.slide_down(pool, &context);

        if residual.is_empty() {
            return Ok(Some(PoolPairing {
                pairs,
                used_fallback: false,
            }));
        }

        debug!(
            residual = residual.len(),
            "greedy pairing left players unpaired, falling back to matching"
        );

        if self.perfect_matching(pool, &context)?.is_none() {
            return Ok(None);
        }

        // Hand the lowest greedy pairs back to the matcher until the
        // residual closes; the full pool is known to close.
        loop {
            if let Some(matched) = self.perfect_matching(&residual, &context)? {
                pairs.extend(matched);
                return Ok(Some(PoolPairing {
                    pairs,
                    used_fallback: true,
                }));
            }
            match pairs.pop() {
                Some((a, b)) => {
                    trace!(a, b, "unpairing to widen the residual");
                    residual.push(a);
                    residual.push(b);
                }
                None => {
                    return Err(PairingError::Inconsistent(
                        "pool has a perfect matching but its residual does not".to_string(),
                    ))
                }
            }
        }
    }

    /// Pair `pool` allowing rematches, admitting them one at a time in
    /// order of preference until the matching is perfect.
    fn pair_relaxed(&self, pool: &[usize]) -> Result<PoolPairing, PairingError> {
        if !self.config.allow_rematches {
            return Err(PairingError::RelaxationDisabled(self.round));
        }
        if pool.len() % 2 == 1 {
            return Err(PairingError::Inconsistent(format!(
                "{} players left to pair after the bye",
                pool.len()
            )));
        }

        let relaxed = PairingContext::relaxed(self.config);
        let mut legal = Vec::new();
        let mut rematches = Vec::new();
        for i in 0..pool.len() {
            for j in (i + 1)..pool.len() {
                let c = compatible(&self.entrants[pool[i]], &self.entrants[pool[j]], &relaxed);
                if c.rematch {
                    rematches.push((c.weight, i, j));
                } else {
                    legal.push((c.weight, i, j));
                }
            }
        }
        legal.sort_by_key(|&(w, _, _)| Reverse(w));
        rematches.sort_by_key(|&(w, _, _)| Reverse(w));

        let mut graph = Graph::new(pool.len());
        for &(_, i, j) in &legal {
            graph.add_edge(i, j)?;
        }
        let seed = greedy_seed(&graph, &legal)?;
        let mut matching = maximum_matching_from(&graph, seed)?;

        let mut admitted = 0;
        for &(_, i, j) in &rematches {
            if matching.is_perfect() {
                break;
            }
            graph.add_edge(i, j)?;
            admitted += 1;
            matching = maximum_matching_from(&graph, matching)?;
        }

        if !matching.is_perfect() {
            return Err(PairingError::Inconsistent(format!(
                "{} players unpaired after admitting every rematch",
                matching.unmatched().len()
            )));
        }

        warn!(
            round = self.round,
            admitted, "no rematch-free round exists, relaxing no-rematch"
        );

        Ok(PoolPairing {
            pairs: matching
                .pairs()
                .into_iter()
                .map(|(i, j)| (pool[i], pool[j]))
                .collect(),
            used_fallback: true,
        })
    }

    /// Greedy Dutch-style pairing down the score groups. Returns the pairs
    /// and whoever could not be placed.
    fn slide_down(
        &self,
        pool: &[usize],
        context: &PairingContext<'_>,
    ) -> (Vec<(usize, usize)>, Vec<usize>) {
        let mut sorted = pool.to_vec();
        sorted.sort_unstable();

        let mut groups: VecDeque<Vec<usize>> = VecDeque::new();
        for i in sorted {
            let points = self.entrants[i].half_points();
            match groups.back_mut() {
                Some(group) if self.entrants[group[0]].half_points() == points => group.push(i),
                _ => groups.push_back(vec![i]),
            }
        }

        let mut pairs = Vec::new();
        let mut floaters: Vec<usize> = Vec::new();

        while let Some(group) = groups.pop_front() {
            let mut remaining: Vec<usize> = floaters.drain(..).chain(group).collect();

            while !remaining.is_empty() {
                let top = remaining.remove(0);
                match self.pick_partner(top, &remaining, context) {
                    Some(pos) => {
                        let partner = remaining.remove(pos);
                        pairs.push((top, partner));
                    }
                    None => {
                        trace!(player = %self.entrants[top].id(), "floats down");
                        floaters.push(top);
                    }
                }
            }
        }

        (pairs, floaters)
    }

    /// Position in `remaining` of `top`'s partner.
    ///
    /// A partner that keeps both players inside the colour limit always wins.
    /// Among those, the first player of the bottom half is preferred, sliding
    /// down through the bottom half and only then up into the top half; a
    /// better colour fit wins over position within the same half.
    fn pick_partner(
        &self,
        top: usize,
        remaining: &[usize],
        context: &PairingContext<'_>,
    ) -> Option<usize> {
        let preferred = ((remaining.len() + 1) / 2).saturating_sub(1);

        remaining
            .iter()
            .enumerate()
            .filter_map(|(pos, &candidate)| {
                let c = compatible(&self.entrants[top], &self.entrants[candidate], context);
                c.legal.then_some((pos, c.color_fit))
            })
            .min_by_key(|&(pos, fit)| {
                (
                    fit == ColorFit::Exceeded,
                    pos < preferred,
                    fit,
                    pos.abs_diff(preferred),
                )
            })
            .map(|(pos, _)| pos)
    }

    /// Perfect matching of `pool` over edges legal under `context`, if one exists.
    fn perfect_matching(
        &self,
        pool: &[usize],
        context: &PairingContext<'_>,
    ) -> Result<Option<Vec<(usize, usize)>>, PairingError> {
        if pool.len() % 2 == 1 {
            return Ok(None);
        }

        let mut edges = Vec::new();
        for i in 0..pool.len() {
            for j in (i + 1)..pool.len() {
                let c = compatible(&self.entrants[pool[i]], &self.entrants[pool[j]], context);
                if c.legal {
                    edges.push((c.weight, i, j));
                }
            }
        }
        edges.sort_by_key(|&(w, _, _)| Reverse(w));

        let mut graph = Graph::new(pool.len());
        for &(_, i, j) in &edges {
            graph.add_edge(i, j)?;
        }

        let matching = maximum_matching_from(&graph, greedy_seed(&graph, &edges)?)?;
        if !matching.is_perfect() {
            return Ok(None);
        }

        Ok(Some(
            matching
                .pairs()
                .into_iter()
                .map(|(i, j)| (pool[i], pool[j]))
                .collect(),
        ))
    }

    /// Turn index pairs into games: board order, colours, relaxation flags.
    fn emit(
        &self,
        tournament_id: &TournamentId,
        bye: Option<usize>,
        pool: PoolPairing,
    ) -> RoundPairing {
        let mut pairs: Vec<(usize, usize)> = pool
            .pairs
            .into_iter()
            .map(|(a, b)| if a < b { (a, b) } else { (b, a) })
            .collect();
        pairs.sort_by_key(|&(a, b)| {
            let (ea, eb) = (&self.entrants[a], &self.entrants[b]);
            (
                Reverse(ea.half_points()),
                Reverse(ea.half_points().saturating_add(eb.half_points())),
                ea.pairing_number(),
            )
        });

        let relaxed = PairingContext::relaxed(self.config);
        let max_imbalance = self.config.max_color_imbalance;
        let mut games = Vec::with_capacity(pairs.len() + 1);
        let mut events = Vec::new();

        for (board_index, &(a, b)) in pairs.iter().enumerate() {
            let (ea, eb) = (&self.entrants[a], &self.entrants[b]);
            let color_a = colors::allocate(
                &ea.standing,
                &eb.standing,
                board_index,
                self.config.first_board_color,
            );
            let (white, black) = if color_a == Color::White {
                (ea, eb)
            } else {
                (eb, ea)
            };

            let board = board_index as u32 + 1;
            let mut game = Game::new(
                tournament_id.clone(),
                self.round,
                board,
                white.id().clone(),
                black.id().clone(),
            );

            if compatible(ea, eb, &relaxed).rematch {
                game.relaxations.push(Relaxation::Rematch);
            }
            let imbalance_exceeded = colors::balance_after(&white.standing, Color::White)
                .unsigned_abs()
                > max_imbalance
                || colors::balance_after(&black.standing, Color::Black).unsigned_abs()
                    > max_imbalance;
            if imbalance_exceeded {
                game.relaxations.push(Relaxation::ColorImbalance);
            }

            for &kind in &game.relaxations {
                warn!(
                    round = self.round,
                    board,
                    white = %game.white,
                    black = %black.id(),
                    "{} allowed to complete the round",
                    kind
                );
                events.push(RelaxationEvent {
                    kind,
                    board,
                    white: game.white.clone(),
                    black: black.id().clone(),
                });
            }

            games.push(game);
        }

        if let Some(index) = bye {
            games.push(Game::bye(
                tournament_id.clone(),
                self.round,
                games.len() as u32 + 1,
                self.entrants[index].id().clone(),
            ));
        }

        info!(
            round = self.round,
            games = pairs.len(),
            bye = bye.is_some(),
            relaxations = events.len(),
            fallback = pool.used_fallback,
            "round paired"
        );

        RoundPairing {
            tournament_id: tournament_id.clone(),
            round: self.round,
            games,
            relaxations: events,
            used_fallback: pool.used_fallback,
        }
    }
}

/// Greedy matching over `edges` (already in preference order), used to seed
/// the blossom search so preferred pairs survive where possible.
fn greedy_seed(graph: &Graph, edges: &[(i64, usize, usize)]) -> Result<Matching, PairingError> {
    let mut taken = vec![false; graph.size()];
    let mut pairs = Vec::new();
    for &(_, i, j) in edges {
        if !taken[i] && !taken[j] {
            taken[i] = true;
            taken[j] = true;
            pairs.push((i, j));
        }
    }
    Ok(Matching::from_pairs(graph, &pairs)?)
}
