//! Edmonds' blossom algorithm for maximum-cardinality matching.
//!
//! Vertices, tree parents and blossom bases all live in flat index arrays.
//! Contracting an odd cycle relabels the `base` of every vertex in it to the
//! cycle's base; lifting a path back out of a blossom follows the `parent`
//! links that `mark_path` threads around the cycle when it is contracted.
//!
//! Runs in O(V^3).

use std::collections::VecDeque;

use tracing::trace;

use super::{Graph, Matching, MatchingError};

/// Marker for "no vertex".
const NONE: usize = usize::MAX;

/// Compute a maximum matching of `graph`, starting from the empty matching.
pub fn maximum_matching(graph: &Graph) -> Matching {
    let mates = vec![NONE; graph.size()];
    Search::new(graph, mates).run()
}

/// Compute a maximum matching of `graph`, growing it from `seed`.
///
/// The seed's pairs are kept unless an augmenting path reroutes them, so a
/// seed built from preferred edges biases which maximum matching comes back.
pub fn maximum_matching_from(graph: &Graph, seed: Matching) -> Result<Matching, MatchingError> {
    if seed.mate.len() != graph.size() {
        return Err(MatchingError::InvalidSeed(format!(
            "seed covers {} vertices, graph has {}",
            seed.mate.len(),
            graph.size()
        )));
    }

    let mut mates = vec![NONE; graph.size()];
    for (v, m) in seed.into_mates().into_iter().enumerate() {
        if let Some(u) = m {
            if !graph.has_edge(v, u) {
                return Err(MatchingError::InvalidSeed(format!(
                    "{}-{} is not an edge",
                    v, u
                )));
            }
            mates[v] = u;
        }
    }
    for (v, &u) in mates.iter().enumerate() {
        if u != NONE && mates[u] != v {
            return Err(MatchingError::InvalidSeed(format!(
                "{} and {} disagree on their partners",
                v, u
            )));
        }
    }

    Ok(Search::new(graph, mates).run())
}

struct Search<'g> {
    graph: &'g Graph,
    /// mate[v] is v's partner, or NONE if v is single.
    mate: Vec<usize>,
    /// parent[v] is the even vertex that reached odd vertex v in the current tree.
    parent: Vec<usize>,
    /// base[v] is the base of the outermost blossom containing v.
    base: Vec<usize>,
    /// used[v] marks even (outer) vertices of the current tree.
    used: Vec<bool>,
    /// Scratch marks for the blossom being contracted, indexed by base.
    in_blossom: Vec<bool>,
    queue: VecDeque<usize>,
}

impl<'g> Search<'g> {
    fn new(graph: &'g Graph, mate: Vec<usize>) -> Self {
        let n = graph.size();
        Self {
            graph,
            mate,
            parent: vec![NONE; n],
            base: (0..n).collect(),
            used: vec![false; n],
            in_blossom: vec![false; n],
            queue: VecDeque::with_capacity(n),
        }
    }

    fn run(mut self) -> Matching {
        // A vertex with no augmenting path now will never get one later.
        for root in 0..self.graph.size() {
            if self.mate[root] != NONE {
                continue;
            }
            if let Some(end) = self.find_augmenting_path(root) {
                trace!(root, end, "augmenting");
                self.augment(end);
            }
        }

        let mates = self
            .mate
            .into_iter()
            .map(|m| if m == NONE { None } else { Some(m) })
            .collect();
        Matching::from_mates(mates)
    }

    /// Grow an alternating tree from `root`; return the single vertex that ends
    /// an augmenting path, if one is found.
    fn find_augmenting_path(&mut self, root: usize) -> Option<usize> {
        let graph = self.graph;
        let n = graph.size();

        self.used.fill(false);
        self.parent.fill(NONE);
        for (v, b) in self.base.iter_mut().enumerate() {
            *b = v;
        }

        self.used[root] = true;
        self.queue.clear();
        self.queue.push_back(root);

        while let Some(v) = self.queue.pop_front() {
            for &to in graph.neighbours(v) {
                if self.base[v] == self.base[to] || self.mate[v] == to {
                    continue;
                }

                let to_is_even =
                    to == root || (self.mate[to] != NONE && self.parent[self.mate[to]] != NONE);

                if to_is_even {
                    // Even-even edge closes an odd cycle: contract it.
                    let cycle_base = self.lowest_common_ancestor(v, to);
                    self.in_blossom.fill(false);
                    self.mark_path(v, cycle_base, to);
                    self.mark_path(to, cycle_base, v);

                    for u in 0..n {
                        if self.in_blossom[self.base[u]] {
                            self.base[u] = cycle_base;
                            if !self.used[u] {
                                self.used[u] = true;
                                self.queue.push_back(u);
                            }
                        }
                    }
                } else if self.parent[to] == NONE {
                    self.parent[to] = v;
                    if self.mate[to] == NONE {
                        return Some(to);
                    }
                    let next = self.mate[to];
                    self.used[next] = true;
                    self.queue.push_back(next);
                }
            }
        }

        None
    }

    /// Base of the first blossom shared by the tree paths from `a` and `b` to the root.
    fn lowest_common_ancestor(&self, a: usize, b: usize) -> usize {
        let mut seen = vec![false; self.graph.size()];

        let mut a = a;
        loop {
            a = self.base[a];
            seen[a] = true;
            if self.mate[a] == NONE {
                break;
            }
            a = self.parent[self.mate[a]];
        }

        let mut b = b;
        loop {
            b = self.base[b];
            if seen[b] {
                return b;
            }
            b = self.parent[self.mate[b]];
        }
    }

    /// Walk from `v` up to blossom base `cycle_base`, marking every blossom on
    /// the way and pointing odd vertices back across the cycle so the path can
    /// be lifted later.
    fn mark_path(&mut self, mut v: usize, cycle_base: usize, mut child: usize) {
        while self.base[v] != cycle_base {
            let m = self.mate[v];
            self.in_blossom[self.base[v]] = true;
            self.in_blossom[self.base[m]] = true;
            self.parent[v] = child;
            child = m;
            v = self.parent[m];
        }
    }

    /// Flip matched and unmatched edges along the path ending at `end`.
    fn augment(&mut self, end: usize) {
        let mut v = end;
        while v != NONE {
            let pv = self.parent[v];
            let next = self.mate[pv];
            self.mate[v] = pv;
            self.mate[pv] = v;
            v = next;
        }
    }
}
