pub mod coordinates;
pub mod distance;
pub mod graph;
pub mod route;

pub use coordinates::*;
pub use distance::*;
pub use graph::*;
pub use route::*;
