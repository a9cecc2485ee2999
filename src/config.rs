use crate::constants::*;
use crate::error::AppError;
use crate::models::SearchStrategy;
use crate::services::route_generator::NeighbourPolicy;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Road graph document loaded by the `coverage` binary when no
    /// `--graph` flag is given
    pub graph_path: Option<PathBuf>,
    pub route_generator: RouteGeneratorConfig,
}

#[derive(Debug, Clone)]
pub struct RouteGeneratorConfig {
    /// Segment search used by `RouteGenerator::new`
    pub search_strategy: SearchStrategy,

    /// How ledger counts order neighbours when a request prefers new roads
    pub neighbour_policy: NeighbourPolicy,

    /// Maximum steps of one random-walk attempt
    pub seg_max_steps: usize,

    /// Random-walk attempts per segment
    pub seg_restarts: usize,

    /// Default tolerance (fraction of distance) per strategy, used when a
    /// request carries none
    pub dfs_tolerance: f64,
    pub astar_tolerance: f64,
    pub random_walk_tolerance: f64,

    /// Default depth limits (edges per segment). A* is unbounded.
    pub dfs_depth_limit: usize,
    pub random_walk_depth_limit: usize,

    /// Fixed RNG seed for reproducible runs; a request's own seed wins
    pub seed: Option<u64>,
}

impl Default for RouteGeneratorConfig {
    fn default() -> Self {
        Self {
            search_strategy: SearchStrategy::default(),
            neighbour_policy: NeighbourPolicy::default(),
            seg_max_steps: DEFAULT_SEG_MAX_STEPS,
            seg_restarts: DEFAULT_SEG_RESTARTS,
            dfs_tolerance: DEFAULT_DFS_TOLERANCE,
            astar_tolerance: DEFAULT_ASTAR_TOLERANCE,
            random_walk_tolerance: DEFAULT_RANDOM_WALK_TOLERANCE,
            dfs_depth_limit: DEFAULT_DFS_DEPTH_LIMIT,
            random_walk_depth_limit: DEFAULT_RANDOM_WALK_DEPTH_LIMIT,
            seed: None,
        }
    }
}

impl RouteGeneratorConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let config = Self {
            search_strategy: env::var("ROUTE_SEARCH_STRATEGY")
                .unwrap_or_else(|_| defaults.search_strategy.to_string())
                .parse()?,

            neighbour_policy: env::var("ROUTE_NEIGHBOUR_POLICY")
                .unwrap_or_else(|_| defaults.neighbour_policy.to_string())
                .parse()?,

            seg_max_steps: env::var("ROUTE_SEG_MAX_STEPS")
                .unwrap_or_else(|_| defaults.seg_max_steps.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_SEG_MAX_STEPS")?,

            seg_restarts: env::var("ROUTE_SEG_RESTARTS")
                .unwrap_or_else(|_| defaults.seg_restarts.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_SEG_RESTARTS")?,

            dfs_tolerance: env::var("ROUTE_DFS_TOLERANCE")
                .unwrap_or_else(|_| defaults.dfs_tolerance.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_DFS_TOLERANCE")?,

            astar_tolerance: env::var("ROUTE_ASTAR_TOLERANCE")
                .unwrap_or_else(|_| defaults.astar_tolerance.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_ASTAR_TOLERANCE")?,

            random_walk_tolerance: env::var("ROUTE_RANDOM_WALK_TOLERANCE")
                .unwrap_or_else(|_| defaults.random_walk_tolerance.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_RANDOM_WALK_TOLERANCE")?,

            dfs_depth_limit: env::var("ROUTE_DFS_DEPTH_LIMIT")
                .unwrap_or_else(|_| defaults.dfs_depth_limit.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_DFS_DEPTH_LIMIT")?,

            random_walk_depth_limit: env::var("ROUTE_RANDOM_WALK_DEPTH_LIMIT")
                .unwrap_or_else(|_| defaults.random_walk_depth_limit.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_RANDOM_WALK_DEPTH_LIMIT")?,

            seed: match env::var("ROUTE_SEED") {
                Ok(value) => Some(value.parse().map_err(|_| "Invalid ROUTE_SEED")?),
                Err(_) => None,
            },
        };

        for (name, value) in [
            ("ROUTE_DFS_TOLERANCE", config.dfs_tolerance),
            ("ROUTE_ASTAR_TOLERANCE", config.astar_tolerance),
            ("ROUTE_RANDOM_WALK_TOLERANCE", config.random_walk_tolerance),
        ] {
            if !(0.0..1.0).contains(&value) {
                return Err(format!("{} must be in [0, 1)", name));
            }
        }

        Ok(config)
    }

    /// Tolerance applied when a request does not set one.
    pub fn default_tolerance(&self, strategy: SearchStrategy) -> f64 {
        match strategy {
            SearchStrategy::Dfs => self.dfs_tolerance,
            SearchStrategy::AStar => self.astar_tolerance,
            SearchStrategy::RandomWalk => self.random_walk_tolerance,
        }
    }

    /// Depth limit applied when a request does not set one.
    pub fn default_depth_limit(&self, strategy: SearchStrategy) -> usize {
        match strategy {
            SearchStrategy::Dfs => self.dfs_depth_limit,
            SearchStrategy::AStar => usize::MAX,
            SearchStrategy::RandomWalk => self.random_walk_depth_limit,
        }
    }
}

impl Config {
    pub fn from_env() -> crate::error::Result<Self> {
        dotenv::dotenv().ok();

        Ok(Config {
            graph_path: env::var("ROADCOVER_GRAPH").ok().map(PathBuf::from),
            route_generator: RouteGeneratorConfig::from_env().map_err(AppError::Config)?,
        })
    }
}
