// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Placement order: breadth-first from the circulation spine.

use spaceplan_topology::TopologyGraph;

/// Space ids in BFS order, rooted at the first corridor or entrance (or the
/// first space when there is none).
pub(crate) fn placement_order(graph: &TopologyGraph) -> Vec<&str> {
    let root = graph
        .spaces()
        .iter()
        .find(|s| s.category.is_circulation())
        .map(|s| s.id.as_str());
    tracing::debug!(root = ?root, "Placement order root");

    // the root comes from the graph itself, so the lookup cannot miss
    graph
        .bfs_order(root)
        .unwrap_or_else(|_| graph.spaces().iter().map(|s| s.id.as_str()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spaceplan_topology::{AdjacencyEdge, ConnectionEdge, SpaceCategory, SpaceSpec};

    #[test]
    fn corridor_is_placed_first() {
        let graph = TopologyGraph::from_parts(
            vec![
                SpaceSpec::new("room_a"),
                SpaceSpec::new("room_b"),
                SpaceSpec::new("hall").with_category(SpaceCategory::Corridor),
            ],
            vec![AdjacencyEdge::new("room_a", "hall")],
            vec![ConnectionEdge::new("room_b", "hall")],
        );
        assert_eq!(placement_order(&graph), vec!["hall", "room_a", "room_b"]);
    }

    #[test]
    fn entrance_also_qualifies_as_root() {
        let graph = TopologyGraph::from_parts(
            vec![
                SpaceSpec::new("office"),
                SpaceSpec::new("lobby").with_category(SpaceCategory::Entrance),
            ],
            vec![AdjacencyEdge::new("office", "lobby")],
            vec![],
        );
        assert_eq!(placement_order(&graph)[0], "lobby");
    }

    #[test]
    fn without_circulation_first_space_is_root() {
        let graph = TopologyGraph::from_parts(
            vec![SpaceSpec::new("x"), SpaceSpec::new("y")],
            vec![],
            vec![],
        );
        assert_eq!(placement_order(&graph), vec!["x", "y"]);
    }
}
