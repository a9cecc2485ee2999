//! Cross-call ledger of visited road edges.
//!
//! Counts are keyed by the unordered node pair, so `(u, v)` and `(v, u)`
//! share one entry, and only ever grow until [`VisitedEdges::clear`]. The
//! searches read it to rank neighbours; the caller marks each accepted route
//! afterwards and reads coverage back for reporting.

use std::collections::HashMap;

use crate::error::{AppError, Result};
use crate::models::{undirected_length, EdgeKey, NodeId, RoadNetwork, Segment};

#[derive(Debug, Clone, Default)]
pub struct VisitedEdges {
    counts: HashMap<EdgeKey, u32>,
}

impl VisitedEdges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, a: NodeId, b: NodeId) {
        let count = self.counts.entry(EdgeKey::new(a, b)).or_insert(0);
        *count = count.saturating_add(1);
    }

    pub fn contains(&self, a: NodeId, b: NodeId) -> bool {
        self.counts.contains_key(&EdgeKey::new(a, b))
    }

    /// Visit count of the pair, 0 when never visited.
    pub fn count(&self, a: NodeId, b: NodeId) -> u32 {
        self.counts.get(&EdgeKey::new(a, b)).copied().unwrap_or(0)
    }

    /// Number of distinct visited pairs.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    pub fn mark_edges_visited(&mut self, route: &[NodeId]) {
        for w in route.windows(2) {
            self.add(w[0], w[1]);
        }
    }

    /// Mark a node sequence recorded outside the generator (e.g. a snapped
    /// GPS track). Consecutive duplicates collapse and pairs without a direct
    /// edge are skipped. Returns the number of pairs marked.
    pub fn mark_track_visited<G: RoadNetwork + ?Sized>(
        &mut self,
        graph: &G,
        nodes: &[NodeId],
    ) -> usize {
        let mut track = nodes.to_vec();
        track.dedup();

        let mut marked = 0;
        for w in track.windows(2) {
            if graph.has_edge(w[0], w[1]) || graph.has_edge(w[1], w[0]) {
                self.add(w[0], w[1]);
                marked += 1;
            }
        }

        tracing::debug!(
            track_nodes = nodes.len(),
            marked = marked,
            skipped = track.len().saturating_sub(1) - marked,
            "Seeded ledger from track"
        );

        marked
    }

    /// Classify each consecutive pair of `route` as new or previously visited
    /// against the current ledger state. Call before marking the route.
    pub fn segments_for<G: RoadNetwork + ?Sized>(
        &self,
        graph: &G,
        route: &[NodeId],
    ) -> Result<Vec<Segment>> {
        route
            .windows(2)
            .map(|w| {
                let (u, v) = (w[0], w[1]);
                let distance = graph.edge_length(u, v).ok_or_else(|| {
                    AppError::Graph(format!("Route pair {} -> {} is not an edge", u, v))
                })?;
                Ok(Segment {
                    is_new: !self.contains(u, v),
                    distance,
                })
            })
            .collect()
    }

    /// Total length of distinct visited pairs that exist as edges in `graph`.
    pub fn total_visited_length<G: RoadNetwork + ?Sized>(&self, graph: &G) -> f64 {
        self.counts
            .keys()
            .filter_map(|key| {
                let (a, b) = key.nodes();
                undirected_length(graph, a, b)
            })
            .sum()
    }

    /// Fraction (0-1) of the network length visited at least once.
    pub fn coverage<G: RoadNetwork + ?Sized>(&self, graph: &G) -> f64 {
        let total = graph.total_length();
        if total <= 0.0 {
            return 0.0;
        }
        self.total_visited_length(graph) / total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, RoadGraph};

    /// 1 - 2 - 3 - 4 with 100m, 200m, 300m roads.
    fn line() -> RoadGraph {
        let mut graph = RoadGraph::new();
        let origin = Coordinates::new(51.0, 19.0).unwrap();
        for id in 1..=4u64 {
            graph.add_node(id, origin.offset_m(0.0, id as f64 * 100.0));
        }
        graph.add_road(1, 2, 100.0).unwrap();
        graph.add_road(2, 3, 200.0).unwrap();
        graph.add_road(3, 4, 300.0).unwrap();
        graph
    }

    #[test]
    fn test_lookup_is_symmetric() {
        let mut ledger = VisitedEdges::new();
        ledger.add(1, 2);

        assert!(ledger.contains(1, 2));
        assert!(ledger.contains(2, 1));
        assert!(!ledger.contains(2, 3));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_counts_accumulate_across_directions() {
        let mut ledger = VisitedEdges::new();
        ledger.add(1, 2);
        ledger.add(2, 1);
        ledger.add(1, 2);

        assert_eq!(ledger.count(1, 2), 3);
        assert_eq!(ledger.count(2, 1), 3);
        assert_eq!(ledger.count(3, 4), 0);
    }

    #[test]
    fn test_clear() {
        let mut ledger = VisitedEdges::new();
        ledger.mark_edges_visited(&[1, 2, 3]);
        assert!(!ledger.is_empty());

        ledger.clear();
        assert!(ledger.is_empty());
        assert_eq!(ledger.count(1, 2), 0);
    }

    #[test]
    fn test_segments_reflect_state_before_marking() {
        let graph = line();
        let mut ledger = VisitedEdges::new();
        ledger.add(3, 2);

        let segments = ledger.segments_for(&graph, &[1, 2, 3, 4]).unwrap();
        assert_eq!(
            segments,
            vec![
                Segment {
                    is_new: true,
                    distance: 100.0,
                },
                Segment {
                    is_new: false,
                    distance: 200.0,
                },
                Segment {
                    is_new: true,
                    distance: 300.0,
                },
            ]
        );

        ledger.mark_edges_visited(&[1, 2, 3, 4]);
        let segments = ledger.segments_for(&graph, &[4, 3, 2, 1]).unwrap();
        assert!(segments.iter().all(|s| !s.is_new));
    }

    #[test]
    fn test_segments_reject_non_edges() {
        let graph = line();
        let ledger = VisitedEdges::new();
        assert!(matches!(
            ledger.segments_for(&graph, &[1, 3]),
            Err(AppError::Graph(_))
        ));
    }

    #[test]
    fn test_coverage_counts_distinct_pairs_once() {
        let graph = line();
        let mut ledger = VisitedEdges::new();
        assert_eq!(ledger.coverage(&graph), 0.0);

        ledger.mark_edges_visited(&[1, 2, 1, 2]);
        assert_eq!(ledger.total_visited_length(&graph), 100.0);
        assert!((ledger.coverage(&graph) - 100.0 / 600.0).abs() < 1e-9);

        ledger.mark_edges_visited(&[2, 3, 4]);
        assert!((ledger.coverage(&graph) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_visited_pairs_outside_graph_are_ignored() {
        let graph = line();
        let mut ledger = VisitedEdges::new();
        ledger.add(1, 4);
        ledger.add(10, 11);
        assert_eq!(ledger.total_visited_length(&graph), 0.0);
    }

    #[test]
    fn test_coverage_of_empty_graph_is_zero() {
        let mut ledger = VisitedEdges::new();
        ledger.add(1, 2);
        assert_eq!(ledger.coverage(&RoadGraph::new()), 0.0);
    }

    #[test]
    fn test_mark_track_skips_gaps_and_duplicates() {
        let graph = line();
        let mut ledger = VisitedEdges::new();

        // 1,1 collapses; 2 -> 4 has no road
        let marked = ledger.mark_track_visited(&graph, &[1, 1, 2, 4, 3]);
        assert_eq!(marked, 2);
        assert!(ledger.contains(1, 2));
        assert!(ledger.contains(3, 4));
        assert!(!ledger.contains(2, 4));
    }
}
