//! Neighbor and expansion queries over the dependency graph

use crate::error::Result;
use crate::graph::DependencyGraph;
use petgraph::Direction as EdgeDirection;
use petgraph::stable_graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::str::FromStr;

/// Which edges a query follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Outgoing,
    Incoming,
    Both,
}

impl Direction {
    fn edge_directions(self) -> &'static [EdgeDirection] {
        match self {
            Direction::Outgoing => &[EdgeDirection::Outgoing],
            Direction::Incoming => &[EdgeDirection::Incoming],
            Direction::Both => &[EdgeDirection::Outgoing, EdgeDirection::Incoming],
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "outgoing" | "out" => Ok(Direction::Outgoing),
            "incoming" | "in" => Ok(Direction::Incoming),
            "both" => Ok(Direction::Both),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

/// How far an expansion walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hops {
    Bounded(usize),
    Unbounded,
}

impl From<Option<usize>> for Hops {
    fn from(hops: Option<usize>) -> Self {
        hops.map_or(Hops::Unbounded, Hops::Bounded)
    }
}

impl DependencyGraph {
    /// Directly connected paths, sorted and de-duplicated.
    pub fn neighbors(&self, path: &str, direction: Direction) -> Result<Vec<String>> {
        let idx = self.index_of(path)?;
        let neighbors: BTreeSet<&str> = direction
            .edge_directions()
            .iter()
            .flat_map(|&dir| self.inner().neighbors_directed(idx, dir))
            .filter_map(|n| self.path_at(n))
            .collect();
        Ok(neighbors.into_iter().map(str::to_string).collect())
    }

    /// Paths reachable from any seed within `hops` outgoing steps, seeds included.
    pub fn expand<S: AsRef<str>>(&self, seeds: &[S], hops: Hops) -> Result<BTreeSet<String>> {
        self.expand_directed(seeds, hops, Direction::Outgoing)
    }

    /// Breadth-first expansion along `direction`. Safe on cyclic graphs.
    pub fn expand_directed<S: AsRef<str>>(
        &self,
        seeds: &[S],
        hops: Hops,
        direction: Direction,
    ) -> Result<BTreeSet<String>> {
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut queue: VecDeque<(NodeIndex, usize)> = VecDeque::new();

        for seed in seeds {
            let idx = self.index_of(seed.as_ref())?;
            if visited.insert(idx) {
                queue.push_back((idx, 0));
            }
        }

        while let Some((current, depth)) = queue.pop_front() {
            if let Hops::Bounded(max) = hops {
                if depth >= max {
                    continue;
                }
            }
            for &dir in direction.edge_directions() {
                for next in self.inner().neighbors_directed(current, dir) {
                    if visited.insert(next) {
                        queue.push_back((next, depth + 1));
                    }
                }
            }
        }

        tracing::debug!("Expanded {} seeds to {} nodes", seeds.len(), visited.len());

        Ok(visited
            .into_iter()
            .filter_map(|idx| self.path_at(idx))
            .map(str::to_string)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DependencyEdge, FileNode, ReferenceKind};

    fn module_edge() -> DependencyEdge {
        DependencyEdge {
            kind: ReferenceKind::ModuleReference,
            external: false,
            label: None,
        }
    }

    fn chain(paths: &[&str]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for path in paths {
            graph.add_node(FileNode::resolved(*path, ""));
        }
        for pair in paths.windows(2) {
            graph.add_edge(pair[0], pair[1], module_edge()).unwrap();
        }
        graph
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!("in".parse::<Direction>(), Ok(Direction::Incoming));
        assert_eq!("BOTH".parse::<Direction>(), Ok(Direction::Both));
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn test_expand_respects_hop_limit() {
        let graph = chain(&["a.tf", "b.tf", "c.tf", "d.tf"]);

        let one = graph.expand(&["a.tf"], Hops::Bounded(1)).unwrap();
        assert_eq!(one.into_iter().collect::<Vec<_>>(), vec!["a.tf", "b.tf"]);

        let all = graph.expand(&["a.tf"], Hops::Unbounded).unwrap();
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_expand_incoming_walks_dependents() {
        let graph = chain(&["a.tf", "b.tf", "c.tf"]);
        let dependents = graph
            .expand_directed(&["c.tf"], Hops::Unbounded, Direction::Incoming)
            .unwrap();
        assert_eq!(dependents.len(), 3);

        let forward = graph.expand(&["c.tf"], Hops::Unbounded).unwrap();
        assert_eq!(forward.into_iter().collect::<Vec<_>>(), vec!["c.tf"]);
    }

    #[test]
    fn test_hops_from_option() {
        assert_eq!(Hops::from(Some(2)), Hops::Bounded(2));
        assert_eq!(Hops::from(None), Hops::Unbounded);
    }
}
