//! Maximum-cardinality matching in general undirected graphs.
//!
//! The pairing generator falls back to this when greedy score-group pairing
//! leaves players it cannot place. Vertices are dense indices `0..n`; the
//! caller keeps its own index-to-player table.

mod blossom;

use thiserror::Error;

pub use blossom::{maximum_matching, maximum_matching_from};

/// Graph construction and seeding errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchingError {
    #[error("Self-loop on vertex {0}")]
    SelfLoop(usize),

    #[error("Vertex {vertex} out of range for graph of {size} vertices")]
    VertexOutOfRange { vertex: usize, size: usize },

    #[error("Duplicate edge {0}-{1}")]
    DuplicateEdge(usize, usize),

    #[error("Seed matching is not a valid matching of this graph: {0}")]
    InvalidSeed(String),
}

/// A simple undirected graph stored as adjacency lists.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    adjacency: Vec<Vec<usize>>,
    edge_count: usize,
}

impl Graph {
    /// Create a graph with `size` isolated vertices.
    pub fn new(size: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); size],
            edge_count: 0,
        }
    }

    /// Build a graph from an edge list, rejecting malformed input.
    pub fn from_edges(size: usize, edges: &[(usize, usize)]) -> Result<Self, MatchingError> {
        let mut graph = Self::new(size);
        for &(u, v) in edges {
            graph.add_edge(u, v)?;
        }
        Ok(graph)
    }

    /// Add the undirected edge `u-v`.
    pub fn add_edge(&mut self, u: usize, v: usize) -> Result<(), MatchingError> {
        let size = self.size();
        for vertex in [u, v] {
            if vertex >= size {
                return Err(MatchingError::VertexOutOfRange { vertex, size });
            }
        }
        if u == v {
            return Err(MatchingError::SelfLoop(u));
        }
        if self.has_edge(u, v) {
            return Err(MatchingError::DuplicateEdge(u, v));
        }

        self.adjacency[u].push(v);
        self.adjacency[v].push(u);
        self.edge_count += 1;
        Ok(())
    }

    /// Whether `u-v` is an edge; out-of-range vertices have no edges.
    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.adjacency
            .get(u)
            .map(|neighbours| neighbours.contains(&v))
            .unwrap_or(false)
    }

    /// Number of vertices.
    pub fn size(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Vertices adjacent to `v`.
    pub fn neighbours(&self, v: usize) -> &[usize] {
        &self.adjacency[v]
    }
}

/// A matching: each vertex paired with at most one neighbour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matching {
    mate: Vec<Option<usize>>,
}

impl Matching {
    /// The empty matching on `size` vertices.
    pub fn empty(size: usize) -> Self {
        Self {
            mate: vec![None; size],
        }
    }

    /// Build a matching from disjoint pairs, checking each pair is an edge of `graph`.
    pub fn from_pairs(graph: &Graph, pairs: &[(usize, usize)]) -> Result<Self, MatchingError> {
        let mut matching = Self::empty(graph.size());
        for &(u, v) in pairs {
            if !graph.has_edge(u, v) {
                return Err(MatchingError::InvalidSeed(format!("{}-{} is not an edge", u, v)));
            }
            if matching.mate[u].is_some() || matching.mate[v].is_some() {
                return Err(MatchingError::InvalidSeed(format!(
                    "{}-{} reuses a matched vertex",
                    u, v
                )));
            }
            matching.mate[u] = Some(v);
            matching.mate[v] = Some(u);
        }
        Ok(matching)
    }

    /// The vertex matched with `v`, if any.
    pub fn partner(&self, v: usize) -> Option<usize> {
        self.mate.get(v).copied().flatten()
    }

    /// Number of matched pairs.
    pub fn len(&self) -> usize {
        self.mate.iter().filter(|m| m.is_some()).count() / 2
    }

    /// Whether no vertex is matched.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every vertex is matched.
    pub fn is_perfect(&self) -> bool {
        self.mate.iter().all(|m| m.is_some())
    }

    /// Matched pairs as `(low, high)`, ordered by the lower vertex.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        self.mate
            .iter()
            .copied()
            .enumerate()
            .filter_map(|(v, m)| m.filter(|&u| v < u).map(|u| (v, u)))
            .collect()
    }

    /// Vertices left single.
    pub fn unmatched(&self) -> Vec<usize> {
        self.mate
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_none())
            .map(|(v, _)| v)
            .collect()
    }

    pub(crate) fn into_mates(self) -> Vec<Option<usize>> {
        self.mate
    }

    pub(crate) fn from_mates(mate: Vec<Option<usize>>) -> Self {
        Self { mate }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_rejects_self_loop() {
        let mut graph = Graph::new(3);
        assert_eq!(graph.add_edge(1, 1), Err(MatchingError::SelfLoop(1)));
    }

    #[test]
    fn test_graph_rejects_out_of_range() {
        let mut graph = Graph::new(2);
        assert_eq!(
            graph.add_edge(0, 5),
            Err(MatchingError::VertexOutOfRange { vertex: 5, size: 2 })
        );
    }

    #[test]
    fn test_graph_rejects_duplicate_edge() {
        let mut graph = Graph::new(3);
        graph.add_edge(0, 1).unwrap();
        assert_eq!(graph.add_edge(1, 0), Err(MatchingError::DuplicateEdge(1, 0)));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_seed_must_be_matching() {
        let graph = Graph::from_edges(3, &[(0, 1), (1, 2)]).unwrap();
        assert!(Matching::from_pairs(&graph, &[(0, 2)]).is_err());
        assert!(Matching::from_pairs(&graph, &[(0, 1), (1, 2)]).is_err());

        let seed = Matching::from_pairs(&graph, &[(1, 2)]).unwrap();
        assert_eq!(seed.partner(2), Some(1));
        assert_eq!(seed.unmatched(), vec![0]);
        assert_eq!(seed.pairs(), vec![(1, 2)]);
    }
}
