// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Layout quality used by the local search.
//!
//! `score = touching fraction of desired pairs + circulation_weight × mean
//! circulation quality of the cores`. Higher is better.

use spaceplan_topology::{CoreType, SpaceCategory, TopologyGraph};

use crate::config::SolverConfig;
use crate::geometry::{gap_distance, touch};
use crate::rect::LayoutRect;

/// Per-rectangle facts that do not change while positions are swapped.
pub(crate) struct Scorer<'a> {
    desired: &'a [(usize, usize)],
    stairs: Vec<usize>,
    elevators: Vec<usize>,
    corridors: Vec<usize>,
    /// Non-core spaces with at most one topological neighbour.
    dead_ends: Vec<bool>,
    /// Non-core spaces.
    rooms: Vec<bool>,
    area_scale: f64,
    touch_tolerance: f64,
    circulation_weight: f64,
}

impl<'a> Scorer<'a> {
    pub(crate) fn new(
        graph: &TopologyGraph,
        rects: &[LayoutRect],
        desired: &'a [(usize, usize)],
        config: &SolverConfig,
    ) -> Self {
        let mut stairs = Vec::new();
        let mut elevators = Vec::new();
        let mut corridors = Vec::new();
        let mut dead_ends = vec![false; rects.len()];
        let mut rooms = vec![false; rects.len()];

        for (idx, rect) in rects.iter().enumerate() {
            let Some(spec) = graph.space(&rect.space_id) else {
                continue;
            };
            match spec.core_type() {
                CoreType::Stair => stairs.push(idx),
                CoreType::Elevator => elevators.push(idx),
                CoreType::Generic => {}
            }
            if spec.category == SpaceCategory::Corridor {
                corridors.push(idx);
            }
            if !spec.is_vertical_core() {
                rooms[idx] = true;
                dead_ends[idx] = graph.degree(&spec.id) <= 1;
            }
        }

        let total_area: f64 = rects.iter().map(LayoutRect::area).sum();
        Self {
            desired,
            stairs,
            elevators,
            corridors,
            dead_ends,
            rooms,
            area_scale: total_area.sqrt().max(1e-9),
            touch_tolerance: config.touch_tolerance,
            circulation_weight: config.circulation_weight,
        }
    }

    pub(crate) fn score(&self, rects: &[LayoutRect]) -> f64 {
        self.adjacency_fraction(rects) + self.circulation_weight * self.circulation_quality(rects)
    }

    /// Fraction of desired pairs whose rectangles touch.
    pub(crate) fn adjacency_fraction(&self, rects: &[LayoutRect]) -> f64 {
        if self.desired.is_empty() {
            return 0.0;
        }
        let touching = self
            .desired
            .iter()
            .filter(|&&(a, b)| touch(&rects[a], &rects[b], self.touch_tolerance))
            .count();
        touching as f64 / self.desired.len() as f64
    }

    /// Mean per-core circulation term, zero without stairs or elevators.
    pub(crate) fn circulation_quality(&self, rects: &[LayoutRect]) -> f64 {
        let count = self.stairs.len() + self.elevators.len();
        if count == 0 {
            return 0.0;
        }
        let stair_sum: f64 = self.stairs.iter().map(|&s| self.stair_term(rects, s)).sum();
        let elevator_sum: f64 = self.elevators.iter().map(|&e| self.elevator_term(rects, e)).sum();
        (stair_sum + elevator_sum) / count as f64
    }

    /// Reward for a corridor close by, minus a penalty for dead-end rooms
    /// walling in the stair.
    fn stair_term(&self, rects: &[LayoutRect], stair: usize) -> f64 {
        let core = &rects[stair];
        let proximity = self
            .corridors
            .iter()
            .map(|&c| gap_distance(core, &rects[c]))
            .reduce(f64::min)
            .map_or(0.0, |gap| 1.0 / (1.0 + gap));

        let (mut touching, mut blocked) = (0usize, 0usize);
        for (idx, rect) in rects.iter().enumerate() {
            if idx == stair || !self.rooms[idx] || !touch(core, rect, self.touch_tolerance) {
                continue;
            }
            touching += 1;
            if self.dead_ends[idx] {
                blocked += 1;
            }
        }
        let penalty = if touching == 0 {
            0.0
        } else {
            0.5 * blocked as f64 / touching as f64
        };
        proximity - penalty
    }

    /// Reward for sitting near the area-weighted centre of the storey.
    fn elevator_term(&self, rects: &[LayoutRect], elevator: usize) -> f64 {
        let core = &rects[elevator];
        let (mut weighted, mut weight) = (0.0, 0.0);
        for (idx, rect) in rects.iter().enumerate() {
            if idx == elevator {
                continue;
            }
            weighted += rect.area() * core.center_distance(rect);
            weight += rect.area();
        }
        if weight <= 0.0 {
            return 0.0;
        }
        1.0 / (1.0 + (weighted / weight) / self.area_scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use spaceplan_topology::{AdjacencyEdge, SpaceSpec};

    fn graph() -> TopologyGraph {
        TopologyGraph::from_parts(
            vec![
                SpaceSpec::new("hall").with_category(SpaceCategory::Corridor),
                SpaceSpec::new("stair_1").with_category(SpaceCategory::Core),
                SpaceSpec::new("office"),
            ],
            vec![
                AdjacencyEdge::new("hall", "office"),
                AdjacencyEdge::new("hall", "stair_1"),
            ],
            vec![],
        )
    }

    #[test]
    fn touching_pairs_count_fully() {
        let graph = graph();
        let rects = vec![
            LayoutRect::new("hall", 0.0, 0.0, 4.0, 2.0),
            LayoutRect::new("stair_1", 4.0, 0.0, 2.0, 2.0),
            LayoutRect::new("office", 0.0, 2.0, 4.0, 4.0),
        ];
        let desired = [(0, 1), (0, 2)];
        let config = SolverConfig::default();
        let scorer = Scorer::new(&graph, &rects, &desired, &config);
        assert_relative_eq!(scorer.adjacency_fraction(&rects), 1.0);
        // stair touches the corridor (gap 0) and no dead-end room
        assert_relative_eq!(scorer.circulation_quality(&rects), 1.0);
        assert_relative_eq!(scorer.score(&rects), 1.0 + config.circulation_weight);
    }

    #[test]
    fn distant_pairs_lower_the_score() {
        let graph = graph();
        let near = vec![
            LayoutRect::new("hall", 0.0, 0.0, 4.0, 2.0),
            LayoutRect::new("stair_1", 4.0, 0.0, 2.0, 2.0),
            LayoutRect::new("office", 0.0, 2.0, 4.0, 4.0),
        ];
        let far = vec![
            LayoutRect::new("hall", 0.0, 0.0, 4.0, 2.0),
            LayoutRect::new("stair_1", 10.0, 0.0, 2.0, 2.0),
            LayoutRect::new("office", 20.0, 2.0, 4.0, 4.0),
        ];
        let desired = [(0, 1), (0, 2)];
        let config = SolverConfig::default();
        let scorer = Scorer::new(&graph, &near, &desired, &config);
        assert!(scorer.score(&far) < scorer.score(&near));
        assert_relative_eq!(scorer.adjacency_fraction(&far), 0.0);
    }

    #[test]
    fn dead_end_rooms_against_stair_are_penalised() {
        let graph = TopologyGraph::from_parts(
            vec![
                SpaceSpec::new("stair_1").with_category(SpaceCategory::Core),
                SpaceSpec::new("closet"),
            ],
            vec![AdjacencyEdge::new("stair_1", "closet")],
            vec![],
        );
        let rects = vec![
            LayoutRect::new("stair_1", 0.0, 0.0, 2.0, 2.0),
            LayoutRect::new("closet", 2.0, 0.0, 2.0, 2.0),
        ];
        let desired = [(0, 1)];
        let scorer = Scorer::new(&graph, &rects, &desired, &SolverConfig::default());
        // no corridor, one touching dead-end neighbour
        assert_relative_eq!(scorer.circulation_quality(&rects), -0.5);
    }

    #[test]
    fn no_cores_means_no_circulation_term() {
        let graph = TopologyGraph::from_parts(
            vec![SpaceSpec::new("a"), SpaceSpec::new("b")],
            vec![AdjacencyEdge::new("a", "b")],
            vec![],
        );
        let rects = vec![
            LayoutRect::new("a", 0.0, 0.0, 2.0, 2.0),
            LayoutRect::new("b", 2.0, 0.0, 2.0, 2.0),
        ];
        let desired = [(0, 1)];
        let scorer = Scorer::new(&graph, &rects, &desired, &SolverConfig::default());
        assert_relative_eq!(scorer.circulation_quality(&rects), 0.0);
    }
}
