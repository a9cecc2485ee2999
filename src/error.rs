use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// The search space under the given bounds was exhausted without an
    /// acceptable route. Every strategy reports failure this way.
    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Graph error: {0}")]
    Graph(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for the single search-failure kind callers are expected to
    /// retry with relaxed constraints.
    pub fn is_route_not_found(&self) -> bool {
        matches!(self, AppError::RouteNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
