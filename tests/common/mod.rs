use roadcover::config::RouteGeneratorConfig;
use roadcover::models::{Coordinates, NodeId, RoadGraph};

/// Length of every road in the fixtures. Nodes sit closer together than
/// this, so straight-line distance never overestimates road distance.
pub const ROAD_M: f64 = 100.0;

fn origin() -> Coordinates {
    Coordinates::new(52.0, 21.0).unwrap()
}

/// `size` x `size` grid, node id `row * size + col`, 4-neighbour roads.
#[allow(dead_code)]
pub fn grid(size: u64) -> RoadGraph {
    let mut graph = RoadGraph::new();
    for row in 0..size {
        for col in 0..size {
            graph.add_node(
                row * size + col,
                origin().offset_m(row as f64 * 90.0, col as f64 * 90.0),
            );
        }
    }
    for row in 0..size {
        for col in 0..size {
            let id = row * size + col;
            if col + 1 < size {
                graph.add_road(id, id + 1, ROAD_M).unwrap();
            }
            if row + 1 < size {
                graph.add_road(id, id + size, ROAD_M).unwrap();
            }
        }
    }
    graph
}

/// `count` nodes on a circle of 100m radius, each joined to the next.
#[allow(dead_code)]
pub fn ring(count: u64) -> RoadGraph {
    let mut graph = RoadGraph::new();
    for id in 0..count {
        let angle = id as f64 / count as f64 * std::f64::consts::TAU;
        let (north, east) = (100.0 * angle.cos(), 100.0 * angle.sin());
        graph.add_node(id, origin().offset_m(north, east));
    }
    for id in 0..count {
        graph.add_road(id, (id + 1) % count, ROAD_M).unwrap();
    }
    graph
}

/// Straight line `0 - 1 - ... - (count - 1)`.
#[allow(dead_code)]
pub fn path(count: u64) -> RoadGraph {
    let mut graph = RoadGraph::new();
    for id in 0..count {
        graph.add_node(id, origin().offset_m(0.0, id as f64 * 90.0));
    }
    for id in 1..count {
        graph.add_road(id - 1, id, ROAD_M).unwrap();
    }
    graph
}

/// Generator config with a fixed seed and a restart budget small enough
/// for hopeless random walks to fail fast.
#[allow(dead_code)]
pub fn test_config() -> RouteGeneratorConfig {
    RouteGeneratorConfig {
        seg_restarts: 200,
        seed: Some(2024),
        ..RouteGeneratorConfig::default()
    }
}

/// True if every consecutive pair of `route` is joined by a road.
#[allow(dead_code)]
pub fn is_connected(graph: &RoadGraph, route: &[NodeId]) -> bool {
    use roadcover::models::RoadNetwork;
    route.windows(2).all(|w| graph.has_edge(w[0], w[1]))
}
