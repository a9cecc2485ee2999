use super::{SearchContext, SegmentRequest, SegmentSearch};
use crate::error::Result;
use crate::models::{NodeId, SearchStrategy};

/// Repeated bounded walks. Each step takes the first neighbour the policy
/// offers, so with `prefer_new` the walk drifts towards unvisited roads.
#[derive(Debug, Clone, Copy)]
pub struct RandomWalkSearch {
    max_steps: usize,
    restarts: usize,
}

impl RandomWalkSearch {
    pub fn new(max_steps: usize, restarts: usize) -> Self {
        Self {
            max_steps,
            restarts,
        }
    }

    fn accepts(request: &SegmentRequest, node: NodeId, used: f64) -> bool {
        match request.target {
            None => request.consumed + used >= request.min_length,
            Some(target) => node == target && request.consumed + used >= request.final_threshold(),
        }
    }

    /// One walk from the segment source. `None` when the walk stops without
    /// meeting the acceptance rule.
    fn walk(&self, ctx: &mut SearchContext<'_>, request: &SegmentRequest) -> Option<Vec<NodeId>> {
        let mut path = vec![request.source];
        let mut used = 0.0;
        let mut previous: Option<NodeId> = None;

        if Self::accepts(request, request.source, used) {
            return Some(path);
        }

        let steps = self.max_steps.min(ctx.depth_limit());
        for _ in 0..steps {
            let current = path[path.len() - 1];
            // Dead end: turning back is the only way out
            let Some(next) = ctx
                .ordered_neighbours(current, previous)
                .first()
                .copied()
                .or(previous)
            else {
                break;
            };

            let step = ctx.edge_length(current, next)?;
            if step <= 0.0 || used + step > request.max_remaining {
                break;
            }

            path.push(next);
            used += step;
            previous = Some(current);

            if Self::accepts(request, next, used) {
                return Some(path);
            }
        }

        None
    }
}

impl SegmentSearch for RandomWalkSearch {
    fn strategy(&self) -> SearchStrategy {
        SearchStrategy::RandomWalk
    }

    fn generate_segment(
        &self,
        ctx: &mut SearchContext<'_>,
        request: &SegmentRequest,
    ) -> Result<Vec<NodeId>> {
        for attempt in 0..self.restarts {
            if let Some(path) = self.walk(ctx, request) {
                tracing::debug!(
                    attempt = attempt + 1,
                    steps = path.len() - 1,
                    "Random walk segment accepted"
                );
                return Ok(path);
            }
        }

        tracing::debug!(restarts = self.restarts, "Random walk restarts exhausted");
        Err(request.not_found(self.strategy()))
    }
}
