pub mod route_generator;
pub mod session;
pub mod visited_edges;
