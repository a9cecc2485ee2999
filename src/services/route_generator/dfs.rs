use super::{SearchContext, SegmentRequest, SegmentSearch};
use crate::error::Result;
use crate::models::{NodeId, SearchStrategy};

/// Exhaustive depth-first backtracking. The first acceptable path wins.
///
/// Unlike the other strategies, every intermediate target carries its own
/// share of the window: a segment is accepted at its target once the route
/// reaches `min_length / remaining_targets`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DfsSearch;

/// One level of the explicit search stack.
struct Frame {
    node: NodeId,
    /// Ordered once on entry; consumed front to back
    neighbours: Vec<NodeId>,
    next: usize,
    length: f64,
}

impl DfsSearch {
    fn threshold(request: &SegmentRequest) -> f64 {
        match request.target {
            None => request.min_length,
            Some(_) => request.min_length / request.remaining_targets.max(1) as f64,
        }
    }

    fn accepts(request: &SegmentRequest, node: NodeId, length: f64) -> bool {
        let reached = request.consumed + length >= Self::threshold(request);
        match request.target {
            None => reached,
            Some(target) => node == target && reached,
        }
    }
}

impl SegmentSearch for DfsSearch {
    fn strategy(&self) -> SearchStrategy {
        SearchStrategy::Dfs
    }

    fn generate_segment(
        &self,
        ctx: &mut SearchContext<'_>,
        request: &SegmentRequest,
    ) -> Result<Vec<NodeId>> {
        let source = request.source;
        if Self::accepts(request, source, 0.0) {
            return Ok(vec![source]);
        }

        let depth_limit = ctx.depth_limit();
        let mut path = vec![source];
        let mut stack = vec![Frame {
            node: source,
            neighbours: ctx.ordered_neighbours(source, None),
            next: 0,
            length: 0.0,
        }];
        let mut expanded: usize = 0;

        // `path` always mirrors the nodes of `stack`
        while let Some(frame) = stack.last_mut() {
            let Some(&next) = frame.neighbours.get(frame.next) else {
                stack.pop();
                path.pop();
                continue;
            };
            frame.next += 1;

            let node = frame.node;
            let Some(step) = ctx.edge_length(node, next) else {
                continue;
            };
            let length = frame.length + step;
            if length > request.max_remaining || path.len() > depth_limit {
                continue;
            }

            path.push(next);
            expanded += 1;

            if Self::accepts(request, next, length) {
                tracing::debug!(
                    expanded = expanded,
                    depth = path.len() - 1,
                    length = %format!("{:.1}", length),
                    "DFS segment accepted"
                );
                return Ok(path);
            }

            let neighbours = ctx.ordered_neighbours(next, Some(node));
            stack.push(Frame {
                node: next,
                neighbours,
                next: 0,
                length,
            });
        }

        tracing::debug!(expanded = expanded, "DFS search space exhausted");
        Err(request.not_found(self.strategy()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, RoadGraph, RoadNetwork, RouteRequest};
    use crate::services::route_generator::NeighbourPolicy;
    use crate::services::visited_edges::VisitedEdges;

    /// 1 - 2 - 3 - 4 - 5, 100m each, plus a 2 - 6 spur of 50m.
    fn graph() -> RoadGraph {
        let mut graph = RoadGraph::new();
        let origin = Coordinates::new(51.0, 19.0).unwrap();
        for id in 1..=6u64 {
            graph.add_node(id, origin.offset_m(0.0, id as f64 * 50.0));
        }
        for id in 1..5u64 {
            graph.add_road(id, id + 1, 100.0).unwrap();
        }
        graph.add_road(2, 6, 50.0).unwrap();
        graph
    }

    fn segment(source: NodeId, target: Option<NodeId>, min: f64, max: f64) -> SegmentRequest {
        SegmentRequest {
            source,
            target,
            consumed: 0.0,
            max_remaining: max,
            min_length: min,
            remaining_targets: 1,
        }
    }

    fn search(
        graph: &RoadGraph,
        request: &SegmentRequest,
        depth_limit: usize,
    ) -> Result<Vec<NodeId>> {
        let ledger = VisitedEdges::new();
        let route_request = RouteRequest::new(request.source, 1.0);
        let mut ctx = SearchContext::new(
            graph,
            &ledger,
            NeighbourPolicy::Ranked,
            &route_request,
            depth_limit,
            3,
        );
        DfsSearch.generate_segment(&mut ctx, request)
    }

    #[test]
    fn test_reaches_target() {
        let graph = graph();
        let path = search(&graph, &segment(1, Some(4), 0.0, 1_000.0), 100).unwrap();
        assert_eq!(path, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_free_segment_stops_in_window() {
        let graph = graph();
        let path = search(&graph, &segment(1, None, 250.0, 350.0), 100).unwrap();
        let length = graph.path_length(&path).unwrap();
        assert!((250.0..=350.0).contains(&length), "{:?} = {}", path, length);
    }

    #[test]
    fn test_no_immediate_backtracking() {
        let graph = graph();
        // from the 6 spur the longest walk is 6-2-3-4-5 (350m)
        let path = search(&graph, &segment(6, None, 250.0, 250.0), 100).unwrap();
        assert_eq!(path, vec![6, 2, 3, 4]);
        assert!(search(&graph, &segment(6, None, 500.0, 500.0), 100).is_err());
    }

    #[test]
    fn test_budget_prunes() {
        let graph = graph();
        let err = search(&graph, &segment(1, Some(5), 0.0, 350.0), 100).unwrap_err();
        assert!(err.is_route_not_found());
    }

    #[test]
    fn test_depth_limit_prunes() {
        let graph = graph();
        assert!(search(&graph, &segment(1, Some(4), 0.0, 1_000.0), 2).is_err());
        assert!(search(&graph, &segment(1, Some(4), 0.0, 1_000.0), 3).is_ok());
    }

    #[test]
    fn test_target_threshold_is_split_across_remaining_targets() {
        let graph = graph();
        let mut request = segment(1, Some(3), 600.0, 1_000.0);
        // 600 / 3 = 200 reached exactly at node 3
        request.remaining_targets = 3;
        assert_eq!(search(&graph, &request, 100).unwrap(), vec![1, 2, 3]);

        // 600 / 2 = 300 cannot be met on the way to 3 without revisiting
        request.remaining_targets = 2;
        assert!(search(&graph, &request, 100).is_err());
    }

    #[test]
    fn test_unknown_source_exhausts() {
        let graph = graph();
        let err = search(&graph, &segment(99, Some(1), 0.0, 1_000.0), 100).unwrap_err();
        assert!(err.is_route_not_found());
    }
}
