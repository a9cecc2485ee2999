use rand::{rngs::StdRng, seq::SliceRandom};
use std::fmt;
use std::str::FromStr;

use crate::models::NodeId;
use crate::services::visited_edges::VisitedEdges;

/// How "prefer new roads" turns ledger counts into a neighbour order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NeighbourPolicy {
    /// Shuffle, then stable-sort by visit count of the connecting edge.
    /// Every neighbour stays available, least-visited first.
    #[default]
    Ranked,
    /// Keep only never-visited neighbours (shuffled); fall back to all
    /// neighbours (shuffled) when every one has been visited.
    Filtered,
}

impl fmt::Display for NeighbourPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NeighbourPolicy::Ranked => write!(f, "ranked"),
            NeighbourPolicy::Filtered => write!(f, "filtered"),
        }
    }
}

impl FromStr for NeighbourPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ranked" => Ok(NeighbourPolicy::Ranked),
            "filtered" => Ok(NeighbourPolicy::Filtered),
            _ => Err(format!(
                "Invalid neighbour policy: {}. Use 'ranked' or 'filtered'",
                s
            )),
        }
    }
}

impl NeighbourPolicy {
    /// Order the neighbours of `node`. Without `prefer_new` the result is
    /// just a shuffle.
    pub fn order(
        self,
        node: NodeId,
        mut neighbours: Vec<NodeId>,
        ledger: &VisitedEdges,
        prefer_new: bool,
        rng: &mut StdRng,
    ) -> Vec<NodeId> {
        neighbours.shuffle(rng);
        if !prefer_new {
            return neighbours;
        }

        match self {
            NeighbourPolicy::Ranked => {
                // (visit_count, shuffle_rank) keys are unique, so ties keep
                // shuffle order regardless of sort stability.
                let mut ranked: Vec<(u32, usize, NodeId)> = neighbours
                    .into_iter()
                    .enumerate()
                    .map(|(rank, next)| (ledger.count(node, next), rank, next))
                    .collect();
                ranked.sort_unstable_by_key(|&(count, rank, _)| (count, rank));
                ranked.into_iter().map(|(_, _, next)| next).collect()
            }
            NeighbourPolicy::Filtered => {
                let unvisited: Vec<NodeId> = neighbours
                    .iter()
                    .copied()
                    .filter(|&next| !ledger.contains(node, next))
                    .collect();
                if unvisited.is_empty() {
                    neighbours
                } else {
                    unvisited
                }
            }
        }
    }
}
