//! Boundary extraction for triangulated blend spaces.

use std::collections::BTreeMap;

use serde::Serialize;

use super::triangulation::Triangle;

/// Undirected edge between two sample indices.
///
/// The indices are stored sorted, so `Edge::new(a, b) == Edge::new(b, a)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
}

impl Edge {
    #[must_use]
    pub fn new(a: usize, b: usize) -> Self {
        if a <= b { Self { a, b } } else { Self { a: b, b: a } }
    }

    #[must_use]
    pub const fn indices(self) -> [usize; 2] {
        [self.a, self.b]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EdgeError {
    #[error("edge ({}, {}) is shared by {count} triangles", edge.a, edge.b)]
    NonManifold { edge: Edge, count: usize },
}

fn count_edges(triangles: &[Triangle]) -> BTreeMap<Edge, usize> {
    let mut counts: BTreeMap<Edge, usize> = BTreeMap::new();
    for tri in triangles {
        let [i0, i1, i2] = tri.indices;
        for edge in [Edge::new(i0, i1), Edge::new(i1, i2), Edge::new(i2, i0)] {
            *counts.entry(edge).or_default() += 1;
        }
    }
    counts
}

/// Collects the edges that belong to exactly one triangle, sorted.
///
/// Errors when an edge is shared by more than two triangles, which cannot
/// happen in a planar triangulation.
pub fn try_outer_edges(triangles: &[Triangle]) -> Result<Vec<Edge>, EdgeError> {
    let counts = count_edges(triangles);
    if let Some((edge, count)) = counts.iter().find(|(_, count)| **count > 2) {
        return Err(EdgeError::NonManifold {
            edge: *edge,
            count: *count,
        });
    }

    Ok(counts
        .into_iter()
        .filter_map(|(edge, count)| (count == 1).then_some(edge))
        .collect())
}

/// Like [`try_outer_edges`], but asserts in debug builds instead of failing.
///
/// Release builds log the problem and skip the offending edges.
#[must_use]
pub fn outer_edges(triangles: &[Triangle]) -> Vec<Edge> {
    match try_outer_edges(triangles) {
        Ok(edges) => edges,
        Err(err) => {
            debug_assert!(false, "{err}");
            log::error!("outer edge extraction: {err}");
            count_edges(triangles)
                .into_iter()
                .filter_map(|(edge, count)| (count == 1).then_some(edge))
                .collect()
        }
    }
}

/// Returns `true` when every vertex touched by `edges` has exactly two
/// incident edges and the edges form one connected loop.
#[must_use]
pub fn is_single_closed_loop(edges: &[Edge]) -> bool {
    if edges.len() < 3 {
        return false;
    }

    let mut adjacency: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for edge in edges {
        adjacency.entry(edge.a).or_default().push(edge.b);
        adjacency.entry(edge.b).or_default().push(edge.a);
    }
    if adjacency.values().any(|neighbours| neighbours.len() != 2) {
        return false;
    }

    let Some((&start, _)) = adjacency.iter().next() else {
        return false;
    };
    let mut previous = start;
    let mut current = adjacency[&start][0];
    let mut visited = 1;
    while current != start {
        let neighbours = &adjacency[&current];
        let next = if neighbours[0] == previous {
            neighbours[1]
        } else {
            neighbours[0]
        };
        previous = current;
        current = next;
        visited += 1;
        if visited > edges.len() {
            return false;
        }
    }

    visited == edges.len()
}
