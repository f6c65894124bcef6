// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Constructive layout with local search.
//!
//! Per storey: BFS ordering from the circulation spine, vertical cores in a
//! row at `y = 0`, the remaining spaces shelf-packed (or laid out as a
//! compact grid when the topology has no pairs) above the core row, then
//! seeded hill climbing. Storeys are laid out bottom-up and stacked in plan
//! with `floor_gap` between them, cores of the same stack sharing x. A
//! single storey without pairs wraps its cores into a block so the whole
//! plan stays near-square.

mod cores;
mod ordering;
mod packing;
mod scoring;
mod search;
mod stacking;

use rand::rngs::StdRng;
use rand::SeedableRng;
use spaceplan_topology::{SpaceSpec, TopologyGraph};

use crate::config::SolverConfig;
use crate::error::Result;
use crate::postprocess::{round_to, snap_up};
use crate::rect::LayoutRect;
use crate::solver::LayoutSolver;

use cores::CoreAlignment;

/// The default backend. Never fails for a well-formed graph.
#[derive(Debug, Clone, Default)]
pub struct HeuristicSolver {
    config: SolverConfig,
}

impl HeuristicSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Lays out every space of `graph`. The result follows the graph's
    /// insertion order and is fully determined by the graph and the config.
    pub fn layout(&self, graph: &TopologyGraph) -> Vec<LayoutRect> {
        if graph.is_empty() {
            return Vec::new();
        }
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut alignment = CoreAlignment::default();
        let storeys = stacking::storey_groups(graph);

        let mut rects = if storeys.len() <= 1 {
            self.layout_storey(graph, &mut rng, &mut alignment, true)
        } else {
            self.stack_storeys(graph, &storeys, &mut rng, &mut alignment)
        };
        rects.sort_by_key(|r| graph.node_index(&r.space_id).unwrap_or(usize::MAX));
        rects
    }

    fn stack_storeys(
        &self,
        graph: &TopologyGraph,
        storeys: &[Vec<&str>],
        rng: &mut StdRng,
        alignment: &mut CoreAlignment,
    ) -> Vec<LayoutRect> {
        let gap = if self.config.floor_gap > 0.0 {
            snap_up(self.config.floor_gap, self.config.grid_unit)
        } else {
            0.0
        };

        let mut all = Vec::with_capacity(graph.len());
        let mut offset = 0.0_f64;
        for (level, ids) in storeys.iter().enumerate() {
            let storey = graph.subgraph(ids);
            let mut rects = self.layout_storey(&storey, rng, alignment, false);
            let top = rects.iter().map(LayoutRect::y2).fold(0.0, f64::max);
            for rect in &mut rects {
                rect.y = round_to(rect.y + offset, 6);
            }
            tracing::debug!(level, spaces = ids.len(), offset, "Storey placed");
            offset = round_to(offset + top + gap, 6);
            all.extend(rects);
        }
        all
    }

    fn layout_storey(
        &self,
        graph: &TopologyGraph,
        rng: &mut StdRng,
        alignment: &mut CoreAlignment,
        standalone: bool,
    ) -> Vec<LayoutRect> {
        let order = ordering::placement_order(graph);
        let (core_specs, room_specs): (Vec<&SpaceSpec>, Vec<&SpaceSpec>) = order
            .iter()
            .filter_map(|id| graph.space(id))
            .partition(|s| s.is_vertical_core());

        let sparse = graph.adjacent_pairs().is_empty() && graph.connected_pairs().is_empty();
        // stacked storeys need one row so core columns line up
        let wrap = (sparse && standalone).then(|| (graph.len() as f64).sqrt().ceil() as usize);
        let anchors = cores::place_cores(&core_specs, &self.config, alignment, wrap);
        let base_y = anchors.iter().map(LayoutRect::y2).fold(0.0, f64::max);

        let rooms = if sparse {
            packing::compact_grid(&room_specs, &self.config, base_y)
        } else {
            packing::shelf_pack(&room_specs, &self.config, base_y)
        };

        let mut rects = anchors.clone();
        rects.extend(rooms);
        if let Some(score) = search::hill_climb(graph, &mut rects, &self.config, rng) {
            tracing::debug!(score, "Storey score");
        }
        cores::repin(&mut rects, &anchors);
        rects
    }
}

impl LayoutSolver for HeuristicSolver {
    fn solve(&self, graph: &TopologyGraph) -> Result<Vec<LayoutRect>> {
        Ok(self.layout(graph))
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}
