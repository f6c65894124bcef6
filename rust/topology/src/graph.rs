// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Undirected graph of spaces with merged adjacency/connection edges.
//!
//! - **Nodes** = spaces, stored in insertion order.
//! - **Edges** = one per unordered pair, carrying independent
//!   `is_adjacent` / `is_connected` flags.
//!
//! Insertion order is preserved everywhere (node list, neighbor lists, pair
//! queries) so that every algorithm built on top is deterministic.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::model::{AdjacencyEdge, ConnectionEdge, SpaceSpec};

/// A merged relationship between two spaces.
#[derive(Debug, Clone, PartialEq)]
pub struct SpaceEdge {
    /// Source node index.
    pub source: usize,
    /// Target node index.
    pub target: usize,
    pub is_adjacent: bool,
    pub is_connected: bool,
    pub door_width: Option<f64>,
    pub door_height: Option<f64>,
}

/// Graph of spaces used as layout input.
#[derive(Debug, Clone, Default)]
pub struct TopologyGraph {
    nodes: Vec<SpaceSpec>,
    edges: Vec<SpaceEdge>,
    /// Adjacency list: node index → list of (neighbor index, edge index).
    adjacency: Vec<Vec<(usize, usize)>>,
    /// Map from space id to node index.
    id_to_node: FxHashMap<String, usize>,
    /// Map from ordered node pair to edge index.
    pair_to_edge: FxHashMap<(usize, usize), usize>,
}

impl TopologyGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from flat lists, skipping anything malformed.
    ///
    /// Spaces with invalid areas and edges referencing unknown spaces are
    /// logged and dropped instead of failing the whole build.
    pub fn from_parts(
        spaces: impl IntoIterator<Item = SpaceSpec>,
        adjacencies: impl IntoIterator<Item = AdjacencyEdge>,
        connections: impl IntoIterator<Item = ConnectionEdge>,
    ) -> Self {
        let mut graph = Self::new();
        for spec in spaces {
            if let Err(err) = graph.add_space(spec) {
                tracing::warn!(error = %err, "Skipping invalid space");
            }
        }
        for edge in adjacencies {
            if let Err(err) = graph.add_adjacency(&edge) {
                tracing::warn!(error = %err, "Skipping invalid adjacency");
            }
        }
        for edge in connections {
            if let Err(err) = graph.add_connection(&edge) {
                tracing::warn!(error = %err, "Skipping invalid connection");
            }
        }
        tracing::debug!(
            spaces = graph.len(),
            edges = graph.edges.len(),
            "Built topology graph"
        );
        graph
    }

    // =========================================================================
    // Graph mutation
    // =========================================================================

    /// Adds a space. Re-adding an existing id replaces its attributes and
    /// keeps its edges.
    pub fn add_space(&mut self, spec: SpaceSpec) -> Result<()> {
        spec.validate()?;
        if let Some(&idx) = self.id_to_node.get(&spec.id) {
            self.nodes[idx] = spec;
            return Ok(());
        }
        let idx = self.nodes.len();
        self.id_to_node.insert(spec.id.clone(), idx);
        self.nodes.push(spec);
        self.adjacency.push(Vec::new());
        Ok(())
    }

    /// Marks a pair as sharing a boundary.
    pub fn add_adjacency(&mut self, edge: &AdjacencyEdge) -> Result<()> {
        let idx = self.upsert_edge(&edge.space_a, &edge.space_b)?;
        self.edges[idx].is_adjacent = true;
        Ok(())
    }

    /// Marks a pair as traversable, recording any door size hints.
    pub fn add_connection(&mut self, edge: &ConnectionEdge) -> Result<()> {
        let idx = self.upsert_edge(&edge.space_a, &edge.space_b)?;
        let merged = &mut self.edges[idx];
        merged.is_connected = true;
        merged.door_width = edge.door_width.or(merged.door_width);
        merged.door_height = edge.door_height.or(merged.door_height);
        Ok(())
    }

    fn upsert_edge(&mut self, a: &str, b: &str) -> Result<usize> {
        let source = self.node_index(a).ok_or_else(|| Error::missing(a))?;
        let target = self.node_index(b).ok_or_else(|| Error::missing(b))?;
        let key = (source.min(target), source.max(target));
        if let Some(&idx) = self.pair_to_edge.get(&key) {
            return Ok(idx);
        }

        let idx = self.edges.len();
        self.edges.push(SpaceEdge {
            source,
            target,
            is_adjacent: false,
            is_connected: false,
            door_width: None,
            door_height: None,
        });
        self.pair_to_edge.insert(key, idx);
        self.adjacency[source].push((target, idx));
        if source != target {
            self.adjacency[target].push((source, idx));
        }
        Ok(idx)
    }

    // =========================================================================
    // Graph accessors
    // =========================================================================

    /// Returns the number of spaces.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.id_to_node.contains_key(id)
    }

    /// All spaces in insertion order.
    pub fn spaces(&self) -> &[SpaceSpec] {
        &self.nodes
    }

    pub fn space(&self, id: &str) -> Option<&SpaceSpec> {
        self.node_index(id).map(|idx| &self.nodes[idx])
    }

    /// All merged edges in insertion order.
    pub fn edges(&self) -> &[SpaceEdge] {
        &self.edges
    }

    /// Returns the node index for a space id.
    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.id_to_node.get(id).copied()
    }

    /// Ids of all spaces sharing an edge with `id` (empty for unknown ids).
    pub fn neighbors(&self, id: &str) -> Vec<&str> {
        self.node_index(id)
            .map(|idx| {
                self.adjacency[idx]
                    .iter()
                    .map(|&(neighbor, _)| self.nodes[neighbor].id.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the degree (number of related spaces) of a space.
    pub fn degree(&self, id: &str) -> usize {
        self.node_index(id)
            .map(|idx| self.adjacency[idx].len())
            .unwrap_or(0)
    }

    /// Pairs flagged as adjacent, in edge insertion order.
    pub fn adjacent_pairs(&self) -> Vec<(&str, &str)> {
        self.pairs_where(|e| e.is_adjacent)
    }

    /// Pairs flagged as connected, in edge insertion order.
    pub fn connected_pairs(&self) -> Vec<(&str, &str)> {
        self.pairs_where(|e| e.is_connected)
    }

    fn pairs_where(&self, pred: impl Fn(&SpaceEdge) -> bool) -> Vec<(&str, &str)> {
        self.edges
            .iter()
            .filter(|e| pred(e))
            .map(|e| {
                (
                    self.nodes[e.source].id.as_str(),
                    self.nodes[e.target].id.as_str(),
                )
            })
            .collect()
    }

    /// Door size hints recorded on the connection between two spaces.
    pub fn door_hint(&self, a: &str, b: &str) -> Option<(Option<f64>, Option<f64>)> {
        let (ia, ib) = (self.node_index(a)?, self.node_index(b)?);
        let edge = &self.edges[*self.pair_to_edge.get(&(ia.min(ib), ia.max(ib)))?];
        edge.is_connected
            .then_some((edge.door_width, edge.door_height))
    }

    /// Distinct storey elevations carried by the spaces, ascending.
    pub fn storey_elevations(&self) -> Vec<f64> {
        let mut elevations: Vec<f64> = self
            .nodes
            .iter()
            .filter_map(|s| s.storey_elevation)
            .filter(|e| e.is_finite())
            .collect();
        elevations.sort_by(f64::total_cmp);
        elevations.dedup_by(|a, b| (*a - *b).abs() <= ELEVATION_TOLERANCE);
        elevations
    }

    /// Spaces plus the edges between them, restricted to `ids`.
    ///
    /// Node order follows this graph's insertion order, not `ids`.
    pub fn subgraph<S: AsRef<str>>(&self, ids: &[S]) -> TopologyGraph {
        let mut keep = vec![false; self.nodes.len()];
        for id in ids {
            if let Some(idx) = self.node_index(id.as_ref()) {
                keep[idx] = true;
            }
        }

        let mut sub = TopologyGraph::new();
        for (idx, spec) in self.nodes.iter().enumerate() {
            if keep[idx] {
                // already validated on insertion
                let _ = sub.add_space(spec.clone());
            }
        }
        for edge in &self.edges {
            if !(keep[edge.source] && keep[edge.target]) {
                continue;
            }
            let (a, b) = (&self.nodes[edge.source].id, &self.nodes[edge.target].id);
            if let Ok(idx) = sub.upsert_edge(a, b) {
                sub.edges[idx] = SpaceEdge {
                    source: sub.edges[idx].source,
                    target: sub.edges[idx].target,
                    ..edge.clone()
                };
            }
        }
        sub
    }

    /// Returns a list of problems with the graph as a whole (empty = OK).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.nodes.is_empty() {
            errors.push("No spaces defined.".to_string());
        }
        errors
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// All space ids in breadth-first order.
    ///
    /// Starts from `root` (or the first inserted space). Spaces unreachable
    /// from the root follow, each unvisited space seeding a further BFS in
    /// insertion order, so every id appears exactly once.
    pub fn bfs_order(&self, root: Option<&str>) -> Result<Vec<&str>> {
        if self.nodes.is_empty() {
            return Ok(Vec::new());
        }
        let start = match root {
            Some(id) => self.node_index(id).ok_or_else(|| Error::missing(id))?,
            None => 0,
        };

        let n = self.nodes.len();
        let mut visited = vec![false; n];
        let mut order = Vec::with_capacity(n);
        let seeds = std::iter::once(start).chain(0..n);

        for seed in seeds {
            if visited[seed] {
                continue;
            }
            let mut queue = VecDeque::new();
            visited[seed] = true;
            queue.push_back(seed);

            while let Some(node) = queue.pop_front() {
                order.push(self.nodes[node].id.as_str());
                for &(neighbor, _) in &self.adjacency[node] {
                    if !visited[neighbor] {
                        visited[neighbor] = true;
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        Ok(order)
    }

    /// BFS hop count between two spaces, `None` if unreachable or unknown.
    pub fn shortest_path_length(&self, a: &str, b: &str) -> Option<usize> {
        let source = self.node_index(a)?;
        let target = self.node_index(b)?;
        let dist = self.bfs_distances(source);
        (dist[target] != usize::MAX).then_some(dist[target])
    }

    /// BFS distance from a source to all other nodes.
    fn bfs_distances(&self, source: usize) -> Vec<usize> {
        let n = self.nodes.len();
        let mut dist = vec![usize::MAX; n];
        let mut queue = VecDeque::new();

        dist[source] = 0;
        queue.push_back(source);

        while let Some(node) = queue.pop_front() {
            for &(neighbor, _) in &self.adjacency[node] {
                if dist[neighbor] == usize::MAX {
                    dist[neighbor] = dist[node] + 1;
                    queue.push_back(neighbor);
                }
            }
        }

        dist
    }
}

/// Elevations closer than this are the same storey.
pub const ELEVATION_TOLERANCE: f64 = 1e-6;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SpaceCategory;

    fn make_office() -> TopologyGraph {
        // room_a, room_b, room_c all hang off the corridor
        TopologyGraph::from_parts(
            vec![
                SpaceSpec::new("corridor").with_category(SpaceCategory::Corridor),
                SpaceSpec::new("room_a"),
                SpaceSpec::new("room_b"),
                SpaceSpec::new("room_c"),
            ],
            vec![
                AdjacencyEdge::new("room_a", "corridor"),
                AdjacencyEdge::new("room_b", "corridor"),
                AdjacencyEdge::new("room_c", "corridor"),
            ],
            vec![
                ConnectionEdge::new("room_a", "corridor"),
                ConnectionEdge::new("room_b", "corridor").with_door(1.0, 2.1),
            ],
        )
    }

    #[test]
    fn graph_basic_properties() {
        let g = make_office();
        assert_eq!(g.len(), 4);
        assert_eq!(g.edges().len(), 3);
        assert_eq!(g.degree("corridor"), 3);
        assert_eq!(g.degree("room_a"), 1);
        assert_eq!(g.degree("nowhere"), 0);
        assert_eq!(g.neighbors("corridor"), vec!["room_a", "room_b", "room_c"]);
    }

    #[test]
    fn flags_merge_on_the_same_pair() {
        let g = make_office();
        assert_eq!(g.adjacent_pairs().len(), 3);
        assert_eq!(g.connected_pairs().len(), 2);
        assert_eq!(g.door_hint("corridor", "room_b"), Some((Some(1.0), Some(2.1))));
        assert_eq!(g.door_hint("room_a", "corridor"), Some((None, None)));
        // adjacent only, not connected
        assert_eq!(g.door_hint("room_c", "corridor"), None);
    }

    #[test]
    fn edge_to_unknown_space_is_rejected() {
        let mut g = make_office();
        let err = g.add_adjacency(&AdjacencyEdge::new("room_a", "ghost"));
        assert!(matches!(err, Err(Error::MissingNode { ref space_id }) if space_id == "ghost"));

        let err = g.add_connection(&ConnectionEdge::new("ghost", "room_a"));
        assert!(err.is_err());
        assert_eq!(g.edges().len(), 3);
    }

    #[test]
    fn from_parts_skips_malformed_input() {
        let g = TopologyGraph::from_parts(
            vec![
                SpaceSpec::new("a"),
                SpaceSpec::new("b"),
                SpaceSpec::new("bad").with_area(-3.0, None),
            ],
            vec![AdjacencyEdge::new("a", "b"), AdjacencyEdge::new("a", "missing")],
            vec![ConnectionEdge::new("missing", "b")],
        );
        assert_eq!(g.len(), 2);
        assert!(!g.contains("bad"));
        assert_eq!(g.adjacent_pairs(), vec![("a", "b")]);
        assert!(g.connected_pairs().is_empty());
    }

    #[test]
    fn bfs_from_root() {
        let g = make_office();
        let order = g.bfs_order(Some("room_b")).unwrap();
        assert_eq!(order, vec!["room_b", "corridor", "room_a", "room_c"]);
    }

    #[test]
    fn bfs_covers_disconnected_spaces() {
        let mut g = make_office();
        g.add_space(SpaceSpec::new("island")).unwrap();
        let order = g.bfs_order(None).unwrap();
        assert_eq!(order.len(), 5);
        assert_eq!(order[0], "corridor");
        assert_eq!(order[4], "island");
    }

    #[test]
    fn bfs_edge_cases() {
        assert!(TopologyGraph::new().bfs_order(None).unwrap().is_empty());
        assert!(make_office().bfs_order(Some("ghost")).is_err());
    }

    #[test]
    fn shortest_path_hops() {
        let mut g = make_office();
        assert_eq!(g.shortest_path_length("room_a", "room_a"), Some(0));
        assert_eq!(g.shortest_path_length("room_a", "corridor"), Some(1));
        assert_eq!(g.shortest_path_length("room_a", "room_c"), Some(2));

        g.add_space(SpaceSpec::new("island")).unwrap();
        assert_eq!(g.shortest_path_length("room_a", "island"), None);
        assert_eq!(g.shortest_path_length("room_a", "ghost"), None);
    }

    #[test]
    fn re_adding_space_keeps_edges() {
        let mut g = make_office();
        g.add_space(SpaceSpec::new("room_a").with_name("Renamed")).unwrap();
        assert_eq!(g.len(), 4);
        assert_eq!(g.space("room_a").unwrap().name, "Renamed");
        assert_eq!(g.degree("room_a"), 1);
    }

    #[test]
    fn storeys_and_subgraph() {
        let g = TopologyGraph::from_parts(
            vec![
                SpaceSpec::new("a").with_storey("l1", 0.0),
                SpaceSpec::new("b").with_storey("l1", 0.0),
                SpaceSpec::new("c").with_storey("l2", 3.0),
            ],
            vec![AdjacencyEdge::new("a", "b"), AdjacencyEdge::new("b", "c")],
            vec![ConnectionEdge::new("a", "b").with_door(0.9, 2.0)],
        );
        assert_eq!(g.storey_elevations(), vec![0.0, 3.0]);

        let ground = g.subgraph(&["b", "a"]);
        assert_eq!(ground.len(), 2);
        assert_eq!(ground.spaces()[0].id, "a");
        assert_eq!(ground.adjacent_pairs(), vec![("a", "b")]);
        assert_eq!(ground.connected_pairs(), vec![("a", "b")]);
        assert_eq!(ground.door_hint("a", "b"), Some((Some(0.9), Some(2.0))));
        assert_eq!(ground.degree("b"), 1);
    }

    #[test]
    fn validate_reports_empty_graph() {
        assert_eq!(TopologyGraph::new().validate(), vec!["No spaces defined."]);
        assert!(make_office().validate().is_empty());
    }
}
