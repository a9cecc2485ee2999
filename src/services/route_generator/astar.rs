use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

use super::{SearchContext, SegmentRequest, SegmentSearch};
use crate::error::{AppError, Result};
use crate::models::{NodeId, RoadNetwork, SearchStrategy};

/// Best-first search ordered by `f = g + h`, where `h` is the great-circle
/// distance to the target.
///
/// Needs a target: a request with neither waypoints nor an end node has
/// nothing to aim the heuristic at and fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct AStarSearch;

/// Open-set entry. `seq` breaks `f` ties in push order, so the neighbour
/// policy decides between equally promising nodes.
#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    f: f64,
    seq: u64,
    g: f64,
    node: NodeId,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f
            .total_cmp(&other.f)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Straight-line meters from `node` to `target`; 0 when either has no
/// coordinates, which keeps the estimate admissible.
fn heuristic(graph: &dyn RoadNetwork, node: NodeId, target: NodeId) -> f64 {
    match (graph.coordinates(node), graph.coordinates(target)) {
        (Some(a), Some(b)) => a.distance_to(&b),
        _ => 0.0,
    }
}

fn reconstruct(came_from: &HashMap<NodeId, NodeId>, source: NodeId, target: NodeId) -> Vec<NodeId> {
    let mut path = vec![target];
    let mut current = target;
    while current != source {
        match came_from.get(&current) {
            Some(&previous) => {
                path.push(previous);
                current = previous;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

impl SegmentSearch for AStarSearch {
    fn strategy(&self) -> SearchStrategy {
        SearchStrategy::AStar
    }

    fn generate_segment(
        &self,
        ctx: &mut SearchContext<'_>,
        request: &SegmentRequest,
    ) -> Result<Vec<NodeId>> {
        let Some(target) = request.target else {
            return Err(AppError::RouteNotFound(
                "best-first search needs a waypoint or end node to aim at".to_string(),
            ));
        };

        let graph = ctx.graph();
        let source = request.source;
        let threshold = request.final_threshold();

        let mut open = BinaryHeap::new();
        let mut came_from: HashMap<NodeId, NodeId> = HashMap::new();
        let mut g_score: HashMap<NodeId, f64> = HashMap::from([(source, 0.0)]);
        let mut seq: u64 = 0;

        open.push(Reverse(OpenEntry {
            f: heuristic(graph, source, target),
            seq,
            g: 0.0,
            node: source,
        }));

        while let Some(Reverse(entry)) = open.pop() {
            let current = entry.node;
            let g = g_score.get(&current).copied().unwrap_or(f64::INFINITY);

            // Skip stale heap entries
            if entry.g > g {
                continue;
            }

            if current == target && request.consumed + g >= threshold {
                let path = reconstruct(&came_from, source, target);
                tracing::debug!(
                    pushed = seq + 1,
                    length = %format!("{:.1}", g),
                    "A* segment accepted"
                );
                return Ok(path);
            }

            let previous = came_from.get(&current).copied();
            for neighbour in ctx.ordered_neighbours(current, previous) {
                let Some(step) = ctx.edge_length(current, neighbour) else {
                    continue;
                };
                let tentative = g + step;
                if tentative > request.max_remaining {
                    continue;
                }

                let improves = g_score
                    .get(&neighbour)
                    .map_or(true, |&known| tentative < known);
                if improves {
                    came_from.insert(neighbour, current);
                    g_score.insert(neighbour, tentative);
                    seq += 1;
                    open.push(Reverse(OpenEntry {
                        f: tentative + heuristic(graph, neighbour, target),
                        seq,
                        g: tentative,
                        node: neighbour,
                    }));
                }
            }
        }

        tracing::debug!(pushed = seq + 1, "A* open set exhausted");
        Err(request.not_found(self.strategy()))
    }
}
