//! Read-only road network model consumed by the route searches.
//!
//! The searches only need coordinate lookup, successor enumeration and the
//! shortest parallel edge for an ordered pair, which is what [`RoadNetwork`]
//! exposes. [`RoadGraph`] is the in-memory implementation used by the
//! binary and the tests; a service embedding the crate can implement the
//! trait over its own cached graph instead.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::Coordinates;

/// Opaque node identifier (OSM node ids fit).
pub type NodeId = u64;

/// Unordered node pair. `(u, v)` and `(v, u)` normalize to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey(NodeId, NodeId);

impl EdgeKey {
    pub fn new(a: NodeId, b: NodeId) -> Self {
        if a <= b {
            EdgeKey(a, b)
        } else {
            EdgeKey(b, a)
        }
    }

    pub fn nodes(&self) -> (NodeId, NodeId) {
        (self.0, self.1)
    }
}

impl From<(NodeId, NodeId)> for EdgeKey {
    fn from((a, b): (NodeId, NodeId)) -> Self {
        EdgeKey::new(a, b)
    }
}

/// One directed edge instance. Several may exist between the same ordered pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Length in meters
    pub length: f64,
    /// Curve geometry; a straight line between the nodes when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Vec<Coordinates>>,
}

impl Edge {
    pub fn new(length: f64) -> Self {
        Edge {
            length,
            geometry: None,
        }
    }

    pub fn with_geometry(mut self, geometry: Vec<Coordinates>) -> Self {
        self.geometry = Some(geometry);
        self
    }
}

/// Graph provider contract used by the searches and the ledger.
pub trait RoadNetwork {
    fn coordinates(&self, node: NodeId) -> Option<Coordinates>;

    /// Outgoing neighbours of `node`, each listed once. Unknown nodes have none.
    fn successors(&self, node: NodeId) -> Vec<NodeId>;

    /// Length of the shortest parallel edge `from -> to`, if any.
    fn edge_length(&self, from: NodeId, to: NodeId) -> Option<f64>;

    /// Every ordered pair joined by at least one directed edge.
    fn edge_pairs(&self) -> Vec<(NodeId, NodeId)>;

    fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.edge_length(from, to).is_some()
    }

    /// Sum of shortest-parallel-edge lengths along `route`.
    /// `None` when a consecutive pair has no direct edge.
    fn path_length(&self, route: &[NodeId]) -> Option<f64> {
        route
            .windows(2)
            .map(|pair| self.edge_length(pair[0], pair[1]))
            .sum()
    }

    /// Length of the whole network, counting each unordered pair once with
    /// its shortest edge in either direction.
    fn total_length(&self) -> f64 {
        let mut seen = HashSet::new();
        let mut total = 0.0;
        for (from, to) in self.edge_pairs() {
            let key = EdgeKey::new(from, to);
            if !seen.insert(key) {
                continue;
            }
            if let Some(length) = undirected_length(self, from, to) {
                total += length;
            }
        }
        total
    }
}

/// Shortest edge between `a` and `b` in either direction.
pub fn undirected_length<G: RoadNetwork + ?Sized>(graph: &G, a: NodeId, b: NodeId) -> Option<f64> {
    match (graph.edge_length(a, b), graph.edge_length(b, a)) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, y) => x.or(y),
    }
}

/// In-memory directed multigraph.
#[derive(Debug, Clone, Default)]
pub struct RoadGraph {
    nodes: HashMap<NodeId, Coordinates>,
    /// Successors in insertion order, without duplicates
    adjacency: HashMap<NodeId, Vec<NodeId>>,
    edges: HashMap<(NodeId, NodeId), Vec<Edge>>,
}

impl RoadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: NodeId, coordinates: Coordinates) {
        self.nodes.insert(id, coordinates);
    }

    /// Add one directed edge. Parallel edges accumulate.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, edge: Edge) -> Result<()> {
        if !edge.length.is_finite() || edge.length < 0.0 {
            return Err(AppError::Graph(format!(
                "Edge {} -> {} has invalid length {}",
                from, to, edge.length
            )));
        }

        let successors = self.adjacency.entry(from).or_default();
        if !successors.contains(&to) {
            successors.push(to);
        }
        self.edges.entry((from, to)).or_default().push(edge);
        Ok(())
    }

    /// Add a two-way road as a pair of symmetric directed edges.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, length: f64) -> Result<()> {
        self.add_edge(a, b, Edge::new(length))?;
        self.add_edge(b, a, Edge::new(length))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Shortest parallel edge `from -> to`.
    pub fn shortest_edge(&self, from: NodeId, to: NodeId) -> Option<&Edge> {
        self.edges
            .get(&(from, to))?
            .iter()
            .min_by(|a, b| a.length.total_cmp(&b.length))
    }

    /// Polyline of a route: edge geometry where present, otherwise the
    /// straight line between node coordinates.
    pub fn route_geometry(&self, route: &[NodeId]) -> Result<Vec<Coordinates>> {
        let mut path = Vec::new();
        for w in route.windows(2) {
            let (u, v) = (w[0], w[1]);
            let Some(edge) = self.shortest_edge(u, v) else {
                return Err(AppError::Graph(format!("No edge between {} and {}", u, v)));
            };
            match &edge.geometry {
                Some(geometry) => path.extend(geometry.iter().copied()),
                None => {
                    let (Some(a), Some(b)) = (self.nodes.get(&u), self.nodes.get(&v)) else {
                        return Err(AppError::Graph(format!(
                            "Missing coordinates for edge {} -> {}",
                            u, v
                        )));
                    };
                    path.push(*a);
                    path.push(*b);
                }
            }
        }
        Ok(path)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let document: GraphDocument = serde_json::from_str(json)?;
        Self::try_from(document)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl RoadNetwork for RoadGraph {
    fn coordinates(&self, node: NodeId) -> Option<Coordinates> {
        self.nodes.get(&node).copied()
    }

    fn successors(&self, node: NodeId) -> Vec<NodeId> {
        self.adjacency.get(&node).cloned().unwrap_or_default()
    }

    fn edge_length(&self, from: NodeId, to: NodeId) -> Option<f64> {
        self.shortest_edge(from, to).map(|edge| edge.length)
    }

    fn edge_pairs(&self) -> Vec<(NodeId, NodeId)> {
        self.edges.keys().copied().collect()
    }
}

/// Serialized graph form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub length: f64,
    #[serde(default)]
    pub geometry: Option<Vec<Coordinates>>,
    /// One-way edges are not mirrored
    #[serde(default)]
    pub oneway: bool,
}

impl TryFrom<GraphDocument> for RoadGraph {
    type Error = AppError;

    fn try_from(document: GraphDocument) -> Result<Self> {
        let mut graph = RoadGraph::new();

        for node in document.nodes {
            let coordinates = Coordinates::new(node.lat, node.lng)
                .map_err(|e| AppError::Graph(format!("Node {}: {}", node.id, e)))?;
            graph.add_node(node.id, coordinates);
        }

        for edge in document.edges {
            let mut forward = Edge::new(edge.length);
            forward.geometry = edge.geometry.clone();
            graph.add_edge(edge.from, edge.to, forward)?;

            if !edge.oneway {
                let mut backward = Edge::new(edge.length);
                backward.geometry = edge.geometry.map(|mut g| {
                    g.reverse();
                    g
                });
                graph.add_edge(edge.to, edge.from, backward)?;
            }
        }

        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Loaded road graph"
        );

        Ok(graph)
    }
}
