// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Grid-discretised problem data, owned so it can move to the solver thread.

use std::collections::{BTreeMap, BTreeSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rustc_hash::FxHashMap;
use spaceplan_topology::circulation::stack_key;
use spaceplan_topology::graph::ELEVATION_TOLERANCE;
use spaceplan_topology::{CoreType, SpaceSpec, TopologyGraph};

use crate::config::SolverConfig;

/// Candidate shapes kept per space.
const MAX_SHAPES: usize = 6;

/// Long/short side limit when a space has no aspect bounds.
const DEFAULT_MAX_ELONGATION: f64 = 3.0;

/// One admissible rectangle size, in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Shape {
    pub w: i64,
    pub h: i64,
    /// `|w * h - target|`.
    pub deviation: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct CpSpace {
    pub id: String,
    pub floor: usize,
    pub core: CoreType,
    pub shapes: Vec<Shape>,
}

impl CpSpace {
    pub(crate) fn max_width(&self) -> i64 {
        self.shapes.iter().map(|s| s.w).max().unwrap_or(1)
    }

    pub(crate) fn max_height(&self) -> i64 {
        self.shapes.iter().map(|s| s.h).max().unwrap_or(1)
    }

    fn longest_side(&self) -> i64 {
        self.max_width().max(self.max_height())
    }
}

/// Everything the integer model needs, in grid units.
#[derive(Debug, Clone)]
pub(crate) struct CpInstance {
    pub spaces: Vec<CpSpace>,
    pub floor_count: usize,
    pub max_dim: i64,
    /// Upper bound of x and y. A single row per floor always fits.
    pub max_coord: i64,
    /// Adjacent or connected pairs, deduplicated.
    pub desired: Vec<(usize, usize)>,
    /// Same-type core pairs on one floor.
    pub conflicts: Vec<(usize, usize)>,
    /// Consecutive occurrences of one stack key; multi-storey mode only.
    pub stacks: Vec<(usize, usize)>,
    /// Interchangeable spaces, ordered by x to prune mirrored solutions.
    pub twins: Vec<(usize, usize)>,
    pub circulation: bool,
}

fn ceil_div(a: i64, b: i64) -> i64 {
    (a + b - 1) / b
}

fn aspect_ok(spec: &SpaceSpec, w: i64, h: i64) -> bool {
    let ratio = w as f64 / h as f64;
    if spec.aspect_ratio_min.is_none() && spec.aspect_ratio_max.is_none() {
        return (w.max(h) as f64 / w.min(h) as f64) <= DEFAULT_MAX_ELONGATION + 1e-9;
    }
    spec.aspect_ratio_min.map_or(true, |m| ratio >= m - 1e-9)
        && spec.aspect_ratio_max.map_or(true, |m| ratio <= m + 1e-9)
}

/// The shapes closest to `target` with area at least `need`, at most
/// [`MAX_SHAPES`] of them. Falls back to the nearest square when no shape
/// passes the aspect filter.
pub(crate) fn candidate_shapes(spec: &SpaceSpec, need: i64, target: i64, max_dim: i64) -> Vec<Shape> {
    let mut shapes = Vec::new();
    for w in 1..=max_dim {
        let rounded = (target as f64 / w as f64).round() as i64;
        for h in [ceil_div(need, w), rounded, ceil_div(target, w)] {
            if h < 1 || h > max_dim || w * h < need || !aspect_ok(spec, w, h) {
                continue;
            }
            shapes.push(Shape {
                w,
                h,
                deviation: (w * h - target).abs(),
            });
        }
    }
    shapes.sort_by_key(|s| (s.deviation, (s.w - s.h).abs(), s.w, s.h));
    shapes.dedup();
    shapes.truncate(MAX_SHAPES);

    if shapes.is_empty() {
        let area = need.max(target);
        let w = (area as f64).sqrt().ceil() as i64;
        let h = ceil_div(area, w);
        shapes.push(Shape {
            w,
            h,
            deviation: (w * h - target).abs(),
        });
    }
    shapes
}

impl CpInstance {
    pub(crate) fn build(graph: &TopologyGraph, config: &SolverConfig) -> Self {
        let cell = config.grid_unit * config.grid_unit;
        let sizes: Vec<(i64, i64)> = graph
            .spaces()
            .iter()
            .map(|s| {
                let need = ((s.effective_area_min() / cell) - 1e-9).ceil().max(1.0) as i64;
                let target = (s.effective_area_target() / cell).round().max(1.0) as i64;
                (need, target)
            })
            .collect();
        let total_target: i64 = sizes.iter().map(|s| s.1).sum();
        let max_dim = 8.max(((total_target as f64).sqrt() * 3.0) as i64);

        let elevations = graph.storey_elevations();
        let layered = config.multi_storey_mode && elevations.len() > 1;
        let floor_of = |spec: &SpaceSpec| -> usize {
            if !layered {
                return 0;
            }
            spec.storey_elevation
                .and_then(|z| {
                    elevations
                        .iter()
                        .position(|e| (e - z).abs() <= ELEVATION_TOLERANCE)
                })
                .unwrap_or(0)
        };

        // seed only reorders candidates, which steers solver tie-breaking
        let mut rng = StdRng::seed_from_u64(config.seed);
        let spaces: Vec<CpSpace> = graph
            .spaces()
            .iter()
            .zip(&sizes)
            .map(|(spec, &(need, target))| {
                let mut shapes = candidate_shapes(spec, need, target, max_dim);
                shapes.shuffle(&mut rng);
                CpSpace {
                    id: spec.id.clone(),
                    floor: floor_of(spec),
                    core: spec.core_type(),
                    shapes,
                }
            })
            .collect();

        let index: FxHashMap<&str, usize> = spaces
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.as_str(), i))
            .collect();
        let mut desired: Vec<(usize, usize)> = graph
            .adjacent_pairs()
            .into_iter()
            .chain(graph.connected_pairs())
            .filter_map(|(a, b)| {
                let (a, b) = (*index.get(a)?, *index.get(b)?);
                Some((a.min(b), a.max(b)))
            })
            .filter(|(a, b)| a != b)
            .collect();
        desired.sort_unstable();
        desired.dedup();

        let mut conflicts = Vec::new();
        for (i, a) in spaces.iter().enumerate() {
            for (j, b) in spaces.iter().enumerate().skip(i + 1) {
                if a.core != CoreType::Generic && a.core == b.core && a.floor == b.floor {
                    conflicts.push((i, j));
                }
            }
        }

        let mut stacks = Vec::new();
        if config.multi_storey_mode {
            let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
            for (i, spec) in graph.spaces().iter().enumerate() {
                if spec.core_type() != CoreType::Generic {
                    groups.entry(stack_key(spec)).or_default().push(i);
                }
            }
            for ids in groups.values() {
                stacks.extend(ids.windows(2).map(|w| (w[0], w[1])));
            }
        }

        let floor_count = if layered { elevations.len() } else { 1 };
        let mut rows = vec![0i64; floor_count];
        for space in &spaces {
            rows[space.floor] += space.longest_side();
        }
        let widest_row = rows.into_iter().max().unwrap_or(0);
        let max_coord = (max_dim * 3).min(widest_row).max(1);
        let twins = find_twins(&spaces, &desired, &stacks);

        Self {
            spaces,
            floor_count,
            max_dim,
            max_coord,
            desired,
            conflicts,
            stacks,
            twins,
            circulation: config.multi_storey_mode,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.spaces.len()
    }

    /// Upper bound of any end coordinate.
    pub(crate) fn extent(&self) -> i64 {
        let longest = self.spaces.iter().map(CpSpace::longest_side).max().unwrap_or(1);
        self.max_coord + longest
    }
}

/// Consecutive members of each class of spaces that can trade places without
/// changing the objective: same floor, core type, shape set and partners.
/// Spaces aligned across storeys are never twins.
fn find_twins(
    spaces: &[CpSpace],
    desired: &[(usize, usize)],
    stacks: &[(usize, usize)],
) -> Vec<(usize, usize)> {
    let stacked: BTreeSet<usize> = stacks.iter().flat_map(|&(a, b)| [a, b]).collect();
    // equal partner sets imply the class has no internal links
    let partners = |i: usize| -> BTreeSet<usize> {
        desired
            .iter()
            .filter_map(|&(a, b)| match (a == i, b == i) {
                (true, _) => Some(b),
                (_, true) => Some(a),
                _ => None,
            })
            .collect()
    };
    let sorted_shapes = |s: &CpSpace| {
        let mut shapes = s.shapes.clone();
        shapes.sort_by_key(|sh| (sh.w, sh.h));
        shapes
    };

    let mut twins = Vec::new();
    let mut claimed = vec![false; spaces.len()];
    for i in 0..spaces.len() {
        if claimed[i] || stacked.contains(&i) {
            continue;
        }
        let mut last = i;
        for j in i + 1..spaces.len() {
            if claimed[j] || stacked.contains(&j) {
                continue;
            }
            let (a, b) = (&spaces[i], &spaces[j]);
            if a.floor == b.floor
                && a.core == b.core
                && sorted_shapes(a) == sorted_shapes(b)
                && partners(i) == partners(j)
            {
                claimed[j] = true;
                twins.push((last, j));
                last = j;
            }
        }
    }
    twins
}

#[cfg(test)]
mod tests {
    use super::*;
    use spaceplan_topology::{AdjacencyEdge, ConnectionEdge, SpaceCategory};

    #[test]
    fn shapes_cover_minimum_and_prefer_target() {
        let spec = SpaceSpec::new("a");
        let shapes = candidate_shapes(&spec, 40, 80, 30);
        assert!(!shapes.is_empty() && shapes.len() <= MAX_SHAPES);
        assert!(shapes.iter().all(|s| s.w * s.h >= 40));
        assert!(shapes.iter().all(|s| s.w.max(s.h) <= 3 * s.w.min(s.h)));
        assert_eq!(shapes[0].deviation, 0);
    }

    #[test]
    fn aspect_bounds_restrict_shapes() {
        let spec = SpaceSpec::new("a").with_aspect_ratio(Some(2.0), Some(2.0));
        let shapes = candidate_shapes(&spec, 8, 8, 20);
        assert_eq!(shapes, vec![Shape { w: 4, h: 2, deviation: 0 }]);
    }

    #[test]
    fn impossible_aspect_falls_back_to_square() {
        let spec = SpaceSpec::new("a").with_aspect_ratio(Some(50.0), None);
        let shapes = candidate_shapes(&spec, 9, 9, 10);
        assert_eq!(shapes, vec![Shape { w: 3, h: 3, deviation: 0 }]);
    }

    #[test]
    fn instance_collects_pairs() {
        let graph = TopologyGraph::from_parts(
            vec![
                SpaceSpec::new("stair_a").with_category(SpaceCategory::Core),
                SpaceSpec::new("stair_b").with_category(SpaceCategory::Core),
                SpaceSpec::new("hall").with_category(SpaceCategory::Corridor),
            ],
            vec![AdjacencyEdge::new("hall", "stair_a")],
            vec![ConnectionEdge::new("stair_a", "hall")],
        );
        let inst = CpInstance::build(&graph, &SolverConfig::default());
        assert_eq!(inst.len(), 3);
        assert_eq!(inst.desired, vec![(0, 2)]);
        assert_eq!(inst.conflicts, vec![(0, 1)]);
        assert!(inst.stacks.is_empty());
        assert!(inst.max_dim >= 8);
        let row: i64 = inst.spaces.iter().map(CpSpace::longest_side).sum();
        assert_eq!(inst.max_coord, row.min(3 * inst.max_dim));
    }

    #[test]
    fn multi_storey_mode_layers_floors_and_stacks_cores() {
        let graph = TopologyGraph::from_parts(
            vec![
                SpaceSpec::new("stair_a_f1").with_storey("L1", 0.0),
                SpaceSpec::new("stair_a_f2").with_storey("L2", 3.0),
                SpaceSpec::new("office").with_storey("L2", 3.0),
            ],
            vec![],
            vec![],
        );
        let config = SolverConfig {
            multi_storey_mode: true,
            ..SolverConfig::default()
        };
        let inst = CpInstance::build(&graph, &config);
        assert_eq!(inst.floor_count, 2);
        assert_eq!(inst.spaces[0].floor, 0);
        assert_eq!(inst.spaces[2].floor, 1);
        assert_eq!(inst.stacks, vec![(0, 1)]);
        // different floors never conflict
        assert!(inst.conflicts.is_empty());
    }

    #[test]
    fn same_seed_same_candidate_order() {
        let graph = TopologyGraph::from_parts(vec![SpaceSpec::new("a")], vec![], vec![]);
        let a = CpInstance::build(&graph, &SolverConfig::default());
        let b = CpInstance::build(&graph, &SolverConfig::default());
        assert_eq!(a.spaces[0].shapes, b.spaces[0].shapes);
    }

    #[test]
    fn identical_rooms_around_a_hub_are_twins() {
        let mut spaces = vec![SpaceSpec::new("hall").with_category(SpaceCategory::Corridor)];
        let mut edges = Vec::new();
        for i in 0..3 {
            spaces.push(SpaceSpec::new(format!("room_{i}")).with_area(12.0, None));
            edges.push(AdjacencyEdge::new("hall", format!("room_{i}")));
        }
        spaces.push(SpaceSpec::new("store").with_area(6.0, None));
        let graph = TopologyGraph::from_parts(spaces, edges, vec![]);
        let inst = CpInstance::build(&graph, &SolverConfig::default());
        assert_eq!(inst.twins, vec![(1, 2), (2, 3)]);
    }

    #[test]
    fn rooms_with_different_partners_are_not_twins() {
        let graph = TopologyGraph::from_parts(
            vec![
                SpaceSpec::new("a").with_area(12.0, None),
                SpaceSpec::new("b").with_area(12.0, None),
                SpaceSpec::new("c").with_area(12.0, None),
            ],
            vec![AdjacencyEdge::new("a", "c")],
            vec![],
        );
        let inst = CpInstance::build(&graph, &SolverConfig::default());
        assert!(inst.twins.is_empty());
    }
}
