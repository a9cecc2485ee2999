//! Stable crate-wide constants.
//!
//! Values here are structural invariants and default fallbacks for
//! env-var-based configuration. They should rarely change. For tuning knobs
//! that benefit from runtime experimentation, see
//! [`RouteGeneratorConfig`](crate::config::RouteGeneratorConfig) instead.

/// Mean Earth radius in meters, used by the haversine distance.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// --- Randomized walk budgets ---

/// Maximum number of steps in a single random-walk attempt.
/// Overridden by `ROUTE_SEG_MAX_STEPS`.
pub const DEFAULT_SEG_MAX_STEPS: usize = 300;
/// Number of random-walk attempts per segment before giving up.
/// Overridden by `ROUTE_SEG_RESTARTS`.
pub const DEFAULT_SEG_RESTARTS: usize = 1_000;

// --- Per-strategy tolerance defaults (fraction of the target distance) ---

/// Depth-first search: ±15%.
pub const DEFAULT_DFS_TOLERANCE: f64 = 0.15;
/// Best-first (A*) search: ±30%.
pub const DEFAULT_ASTAR_TOLERANCE: f64 = 0.30;
/// Randomized walk: ±20%.
pub const DEFAULT_RANDOM_WALK_TOLERANCE: f64 = 0.20;

// --- Per-strategy depth limits (edges per segment) ---

/// Depth-first search never descends more than this many edges per segment.
pub const DEFAULT_DFS_DEPTH_LIMIT: usize = 1_000;
/// Random walk depth limit. Large enough that `seg_max_steps` is the
/// effective bound unless a request asks for less.
pub const DEFAULT_RANDOM_WALK_DEPTH_LIMIT: usize = 1_000_000;

// --- Experiments ---

/// Routes generated per scenario by the `coverage` binary.
pub const DEFAULT_EXPERIMENT_ROUTES: usize = 10;
