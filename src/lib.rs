// Library exports for the coverage binary and integration tests

pub mod config;
pub mod constants;
pub mod error;
pub mod evaluation;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{GeneratedRoute, NodeId, RoadGraph, RoadNetwork, RouteRequest, SearchStrategy};
pub use services::route_generator::RouteGenerator;
pub use services::session::CoverageSession;
pub use services::visited_edges::VisitedEdges;
