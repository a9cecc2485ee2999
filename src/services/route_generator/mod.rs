mod astar;
mod dfs;
pub mod neighbour_policy;
mod random_walk;

use rand::{rngs::StdRng, SeedableRng};
use std::collections::HashSet;

use crate::config::RouteGeneratorConfig;
use crate::error::{AppError, Result};
use crate::models::{EdgeKey, NodeId, RoadNetwork, RouteRequest, SearchStrategy};
use crate::services::visited_edges::VisitedEdges;

pub use astar::AStarSearch;
pub use dfs::DfsSearch;
pub use neighbour_policy::NeighbourPolicy;
pub use random_walk::RandomWalkSearch;

/// One sub-search between two consecutive targets of a route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentRequest {
    pub source: NodeId,
    /// `None` means "stop once the distance is reached"
    pub target: Option<NodeId>,
    /// Route length already accepted before this segment
    pub consumed: f64,
    /// Upper bound on this segment's own length
    pub max_remaining: f64,
    /// Lower bound of the whole route's tolerance window
    pub min_length: f64,
    /// Targets left including this one
    pub remaining_targets: usize,
}

impl SegmentRequest {
    pub fn is_final(&self) -> bool {
        self.remaining_targets <= 1
    }

    /// Threshold for strategies that only enforce the window on the last
    /// segment: intermediate targets are accepted on arrival.
    pub fn final_threshold(&self) -> f64 {
        if self.is_final() {
            self.min_length
        } else {
            0.0
        }
    }

    pub(crate) fn not_found(&self, strategy: SearchStrategy) -> AppError {
        let target = self
            .target
            .map(|t| t.to_string())
            .unwrap_or_else(|| "any".to_string());
        AppError::RouteNotFound(format!(
            "{} found no segment {} -> {} within {:.1}m",
            strategy, self.source, target, self.max_remaining
        ))
    }
}

/// Per-call search state shared by every segment of one route.
pub struct SearchContext<'a> {
    graph: &'a dyn RoadNetwork,
    ledger: &'a VisitedEdges,
    policy: NeighbourPolicy,
    prefer_new: bool,
    depth_limit: usize,
    ignored_edges: HashSet<EdgeKey>,
    ignored_nodes: HashSet<NodeId>,
    rng: StdRng,
}

impl<'a> SearchContext<'a> {
    pub fn new(
        graph: &'a dyn RoadNetwork,
        ledger: &'a VisitedEdges,
        policy: NeighbourPolicy,
        request: &RouteRequest,
        depth_limit: usize,
        seed: u64,
    ) -> Self {
        SearchContext {
            graph,
            ledger,
            policy,
            prefer_new: request.prefer_new,
            depth_limit,
            ignored_edges: request.ignored_edge_keys().collect(),
            ignored_nodes: request.ignored_nodes.iter().copied().collect(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn graph(&self) -> &'a dyn RoadNetwork {
        self.graph
    }

    pub fn depth_limit(&self) -> usize {
        self.depth_limit
    }

    pub fn edge_length(&self, from: NodeId, to: NodeId) -> Option<f64> {
        self.graph.edge_length(from, to)
    }

    /// Outgoing neighbours of `node` minus `exclude` (the node just arrived
    /// from), ignored nodes and ignored edges.
    pub fn neighbours(&self, node: NodeId, exclude: Option<NodeId>) -> Vec<NodeId> {
        self.graph
            .successors(node)
            .into_iter()
            .filter(|&next| Some(next) != exclude)
            .filter(|next| !self.ignored_nodes.contains(next))
            .filter(|&next| !self.ignored_edges.contains(&EdgeKey::new(node, next)))
            .collect()
    }

    /// [`neighbours`](Self::neighbours) in the order the policy prefers.
    pub fn ordered_neighbours(&mut self, node: NodeId, exclude: Option<NodeId>) -> Vec<NodeId> {
        let neighbours = self.neighbours(node, exclude);
        let rng = &mut self.rng;
        self.policy
            .order(node, neighbours, self.ledger, self.prefer_new, rng)
    }
}

/// A segment search algorithm. The stitcher only depends on this.
pub trait SegmentSearch: Send + Sync {
    fn strategy(&self) -> SearchStrategy;

    /// Path from `request.source` (inclusive) satisfying the strategy's
    /// acceptance rule, or [`AppError::RouteNotFound`].
    fn generate_segment(
        &self,
        ctx: &mut SearchContext<'_>,
        request: &SegmentRequest,
    ) -> Result<Vec<NodeId>>;
}

/// Builds routes by stitching segment searches between consecutive targets.
pub struct RouteGenerator<'a> {
    graph: &'a dyn RoadNetwork,
    ledger: &'a VisitedEdges,
    config: RouteGeneratorConfig,
    search: Box<dyn SegmentSearch>,
}

impl<'a> RouteGenerator<'a> {
    /// Generator using the strategy named in `config`.
    pub fn new(
        graph: &'a dyn RoadNetwork,
        ledger: &'a VisitedEdges,
        config: RouteGeneratorConfig,
    ) -> Self {
        let strategy = config.search_strategy;
        Self::with_strategy(graph, ledger, config, strategy)
    }

    pub fn with_strategy(
        graph: &'a dyn RoadNetwork,
        ledger: &'a VisitedEdges,
        config: RouteGeneratorConfig,
        strategy: SearchStrategy,
    ) -> Self {
        let search: Box<dyn SegmentSearch> = match strategy {
            SearchStrategy::Dfs => Box::new(DfsSearch),
            SearchStrategy::AStar => Box::new(AStarSearch),
            SearchStrategy::RandomWalk => Box::new(RandomWalkSearch::new(
                config.seg_max_steps,
                config.seg_restarts,
            )),
        };
        Self::with_search(graph, ledger, config, search)
    }

    pub fn with_search(
        graph: &'a dyn RoadNetwork,
        ledger: &'a VisitedEdges,
        config: RouteGeneratorConfig,
        search: Box<dyn SegmentSearch>,
    ) -> Self {
        RouteGenerator {
            graph,
            ledger,
            config,
            search,
        }
    }

    pub fn strategy(&self) -> SearchStrategy {
        self.search.strategy()
    }

    /// Generate a connected route for `request`.
    ///
    /// Targets are the waypoints followed by the end node; each is reached by
    /// an independent segment search sharing one distance budget. Any failing
    /// segment fails the whole route, no partial route is returned.
    pub fn generate(&self, request: &RouteRequest) -> Result<Vec<NodeId>> {
        let strategy = self.strategy();
        let window = request
            .window(self.config.default_tolerance(strategy))
            .map_err(AppError::InvalidRequest)?;
        let depth_limit = request
            .depth_limit
            .unwrap_or_else(|| self.config.default_depth_limit(strategy));
        let seed = request
            .seed
            .or(self.config.seed)
            .unwrap_or_else(rand::random::<u64>);

        let mut ctx = SearchContext::new(
            self.graph,
            self.ledger,
            self.config.neighbour_policy,
            request,
            depth_limit,
            seed,
        );

        let targets = request.targets();
        let mut route: Vec<NodeId> = vec![request.start];
        let mut consumed = 0.0;

        for (index, target) in targets.iter().enumerate() {
            let max_remaining = window.max - consumed;
            if max_remaining <= 0.0 {
                tracing::warn!(
                    strategy = %strategy,
                    consumed = %format!("{:.1}", consumed),
                    max_length = %format!("{:.1}", window.max),
                    "Distance budget exhausted before all targets were reached"
                );
                return Err(AppError::RouteNotFound(format!(
                    "distance budget of {:.1}m exhausted after {} of {} targets",
                    window.max,
                    index,
                    targets.len()
                )));
            }

            let segment_request = SegmentRequest {
                source: route[route.len() - 1],
                target: *target,
                consumed,
                max_remaining,
                min_length: window.min,
                remaining_targets: targets.len() - index,
            };

            tracing::debug!(
                strategy = %strategy,
                source = segment_request.source,
                target_node = ?segment_request.target,
                budget = %format!("{:.1}", max_remaining),
                "Searching segment {}/{}",
                index + 1,
                targets.len()
            );

            let segment = match self.search.generate_segment(&mut ctx, &segment_request) {
                Ok(segment) => segment,
                Err(e) => {
                    tracing::warn!(strategy = %strategy, error = %e, "Segment search failed");
                    return Err(e);
                }
            };

            let length = self.graph.path_length(&segment).ok_or_else(|| {
                AppError::Internal(format!("{} returned a disconnected segment", strategy))
            })?;

            route.extend(segment.into_iter().skip(1));
            consumed += length;
        }

        if route.len() < 2 {
            return Err(AppError::RouteNotFound(format!(
                "{} produced no edges from {}",
                strategy, request.start
            )));
        }

        if !window.contains(consumed) {
            tracing::warn!(
                strategy = %strategy,
                distance_m = %format!("{:.1}", consumed),
                window = %window,
                "Route length falls outside the tolerance window"
            );
        }

        tracing::info!(
            strategy = %strategy,
            nodes = route.len(),
            distance_m = %format!("{:.1}", consumed),
            window = %window,
            "Generated route"
        );

        Ok(route)
    }
}
