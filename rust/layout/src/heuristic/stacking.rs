// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Storey grouping for multi-floor layouts.

use spaceplan_topology::graph::ELEVATION_TOLERANCE;
use spaceplan_topology::TopologyGraph;

/// Space ids per storey, ascending by elevation.
///
/// Spaces without an elevation join the lowest storey. Returns a single
/// group when the graph has at most one distinct elevation.
pub(crate) fn storey_groups(graph: &TopologyGraph) -> Vec<Vec<&str>> {
    let elevations = graph.storey_elevations();
    if elevations.len() <= 1 {
        return vec![graph.spaces().iter().map(|s| s.id.as_str()).collect()];
    }

    let mut groups: Vec<Vec<&str>> = vec![Vec::new(); elevations.len()];
    for spec in graph.spaces() {
        let slot = spec
            .storey_elevation
            .and_then(|z| {
                elevations
                    .iter()
                    .position(|e| (e - z).abs() <= ELEVATION_TOLERANCE)
            })
            .unwrap_or(0);
        groups[slot].push(spec.id.as_str());
    }
    groups
}
