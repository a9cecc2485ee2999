use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{EdgeKey, NodeId, ToleranceWindow};

/// Interchangeable segment search algorithms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    /// Exhaustive depth-first backtracking
    Dfs,
    /// Heuristic best-first search
    AStar,
    /// Randomized greedy walk with restarts
    #[default]
    RandomWalk,
}

impl SearchStrategy {
    pub const ALL: [SearchStrategy; 3] = [
        SearchStrategy::Dfs,
        SearchStrategy::AStar,
        SearchStrategy::RandomWalk,
    ];
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchStrategy::Dfs => write!(f, "dfs"),
            SearchStrategy::AStar => write!(f, "astar"),
            SearchStrategy::RandomWalk => write!(f, "random"),
        }
    }
}

impl FromStr for SearchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dfs" | "depth-first" => Ok(SearchStrategy::Dfs),
            "astar" | "a*" | "best-first" => Ok(SearchStrategy::AStar),
            "random" | "random-walk" | "randomwalk" => Ok(SearchStrategy::RandomWalk),
            _ => Err(format!(
                "Invalid search strategy: '{}'. Use 'dfs', 'astar' or 'random'",
                s
            )),
        }
    }
}

/// Constraints for one `generate` call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteRequest {
    pub start: NodeId,
    #[serde(default)]
    pub end: Option<NodeId>,
    /// Intermediate targets, visited in order
    #[serde(default)]
    pub waypoints: Vec<NodeId>,
    /// Target length in meters
    pub distance: f64,
    /// Fractional tolerance; the strategy default applies when absent
    #[serde(default)]
    pub tolerance: Option<f64>,
    #[serde(default)]
    pub prefer_new: bool,
    /// Edges per segment; the strategy default applies when absent
    #[serde(default)]
    pub depth_limit: Option<usize>,
    /// Undirected pairs that must not be traversed
    #[serde(default)]
    pub ignored_edges: Vec<(NodeId, NodeId)>,
    #[serde(default)]
    pub ignored_nodes: Vec<NodeId>,
    /// Fixes the neighbour shuffle for reproducible output
    #[serde(default)]
    pub seed: Option<u64>,
}

impl RouteRequest {
    pub fn new(start: NodeId, distance: f64) -> Self {
        RouteRequest {
            start,
            end: None,
            waypoints: Vec::new(),
            distance,
            tolerance: None,
            prefer_new: false,
            depth_limit: None,
            ignored_edges: Vec::new(),
            ignored_nodes: Vec::new(),
            seed: None,
        }
    }

    pub fn with_end(mut self, end: NodeId) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_waypoints(mut self, waypoints: Vec<NodeId>) -> Self {
        self.waypoints = waypoints;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn with_prefer_new(mut self, prefer_new: bool) -> Self {
        self.prefer_new = prefer_new;
        self
    }

    pub fn with_depth_limit(mut self, depth_limit: usize) -> Self {
        self.depth_limit = Some(depth_limit);
        self
    }

    pub fn with_ignored_edges(mut self, edges: Vec<(NodeId, NodeId)>) -> Self {
        self.ignored_edges = edges;
        self
    }

    pub fn with_ignored_nodes(mut self, nodes: Vec<NodeId>) -> Self {
        self.ignored_nodes = nodes;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Window for this request given the tolerance actually applied. Fails
    /// on a non-positive distance or a tolerance outside `[0, 1)`.
    pub fn window(&self, default_tolerance: f64) -> Result<ToleranceWindow, String> {
        ToleranceWindow::new(self.distance, self.tolerance.unwrap_or(default_tolerance))
    }

    /// Ordered segment targets. `None` stands for "reach the distance anywhere".
    pub fn targets(&self) -> Vec<Option<NodeId>> {
        let mut targets: Vec<Option<NodeId>> = self.waypoints.iter().copied().map(Some).collect();
        if let Some(end) = self.end {
            targets.push(Some(end));
        }
        if targets.is_empty() {
            targets.push(None);
        }
        targets
    }

    pub fn ignored_edge_keys(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.ignored_edges.iter().map(|&pair| EdgeKey::from(pair))
    }
}

/// One consecutive node pair of a route, classified against the ledger.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    pub is_new: bool,
    /// Shortest parallel edge length in meters
    pub distance: f64,
}

/// A route together with its novelty classification, captured before the
/// route was marked visited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedRoute {
    pub nodes: Vec<NodeId>,
    pub segments: Vec<Segment>,
}

impl GeneratedRoute {
    pub fn distance(&self) -> f64 {
        self.segments.iter().map(|s| s.distance).sum()
    }

    pub fn new_distance(&self) -> f64 {
        self.segments
            .iter()
            .filter(|s| s.is_new)
            .map(|s| s.distance)
            .sum()
    }

    /// Share of the route length on previously unvisited edges (0-1).
    pub fn new_fraction(&self) -> f64 {
        let total = self.distance();
        if total <= 0.0 {
            return 0.0;
        }
        self.new_distance() / total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_rejects_bad_distance_and_tolerance() {
        let mut req = RouteRequest::new(1, 5_000.0).with_tolerance(0.2);
        assert!(req.window(0.1).is_ok());

        req.distance = 0.0;
        assert!(req.window(0.1).is_err());

        req.distance = 5_000.0;
        req.tolerance = Some(1.0);
        assert!(req.window(0.1).is_err());

        req.tolerance = Some(0.0);
        assert_eq!(req.window(0.1).unwrap().min, 5_000.0);

        // the fallback tolerance goes through the same check
        req.tolerance = None;
        assert!(req.window(1.5).is_err());
    }

    #[test]
    fn test_targets() {
        let free = RouteRequest::new(1, 1_000.0);
        assert_eq!(free.targets(), vec![None]);

        let loop_route = RouteRequest::new(1, 1_000.0).with_end(1);
        assert_eq!(loop_route.targets(), vec![Some(1)]);

        let via = RouteRequest::new(1, 1_000.0)
            .with_waypoints(vec![4, 7])
            .with_end(9);
        assert_eq!(via.targets(), vec![Some(4), Some(7), Some(9)]);

        let via_no_end = RouteRequest::new(1, 1_000.0).with_waypoints(vec![4]);
        assert_eq!(via_no_end.targets(), vec![Some(4)]);
    }

    #[test]
    fn test_window_uses_default_tolerance() {
        let req = RouteRequest::new(1, 1_000.0);
        let window = req.window(0.3).unwrap();
        assert!((window.min - 700.0).abs() < 1e-9);

        let req = req.with_tolerance(0.1);
        let window = req.window(0.3).unwrap();
        assert!((window.max - 1100.0).abs() < 1e-9);
    }

    #[test]
    fn test_request_deserialize_defaults() {
        let req: RouteRequest =
            serde_json::from_str(r#"{"start": 5, "distance": 6000.0}"#).unwrap();
        assert_eq!(req, RouteRequest::new(5, 6_000.0));
    }

    #[test]
    fn test_search_strategy_from_str() {
        let parse = |s: &str| s.parse::<SearchStrategy>().unwrap();
        assert_eq!(parse("dfs"), SearchStrategy::Dfs);
        assert_eq!(parse("A*"), SearchStrategy::AStar);
        assert_eq!(parse("RANDOM"), SearchStrategy::RandomWalk);
        assert!("bfs".parse::<SearchStrategy>().is_err());
    }

    #[test]
    fn test_search_strategy_display_round_trips() {
        for strategy in SearchStrategy::ALL {
            let parsed: SearchStrategy = strategy.to_string().parse().unwrap();
            assert_eq!(parsed, strategy);
        }
    }

    #[test]
    fn test_generated_route_novelty() {
        let route = GeneratedRoute {
            nodes: vec![1, 2, 3, 4],
            segments: vec![
                Segment {
                    is_new: true,
                    distance: 100.0,
                },
                Segment {
                    is_new: false,
                    distance: 300.0,
                },
                Segment {
                    is_new: true,
                    distance: 100.0,
                },
            ],
        };

        assert_eq!(route.distance(), 500.0);
        assert_eq!(route.new_distance(), 200.0);
        assert!((route.new_fraction() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_generated_route_empty_has_zero_novelty() {
        let route = GeneratedRoute {
            nodes: vec![1],
            segments: vec![],
        };
        assert_eq!(route.new_fraction(), 0.0);
    }
}
