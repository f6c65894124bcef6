// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Seeded hill climbing over position swaps.
//!
//! The rectangles of a storey form an arena indexed by position; desired
//! pairs are stored as index pairs. Each step swaps the origins of two
//! non-core rectangles and keeps the swap only if the score does not drop
//! and neither moved rectangle overlaps another.

use std::collections::BTreeSet;

use rand::Rng;
use rustc_hash::FxHashMap;
use spaceplan_topology::TopologyGraph;

use crate::config::SolverConfig;
use crate::geometry::overlaps;
use crate::rect::LayoutRect;

use super::scoring::Scorer;

/// Adjacent or connected pairs as sorted, deduplicated index pairs into
/// `rects`.
pub(crate) fn desired_pairs(graph: &TopologyGraph, rects: &[LayoutRect]) -> Vec<(usize, usize)> {
    let index: FxHashMap<&str, usize> = rects
        .iter()
        .enumerate()
        .map(|(i, r)| (r.space_id.as_str(), i))
        .collect();
    let pairs: BTreeSet<(usize, usize)> = graph
        .adjacent_pairs()
        .into_iter()
        .chain(graph.connected_pairs())
        .filter_map(|(a, b)| Some((*index.get(a)?, *index.get(b)?)))
        .filter(|(a, b)| a != b)
        .map(|(a, b)| (a.min(b), a.max(b)))
        .collect();
    pairs.into_iter().collect()
}

/// True if `rects[idx]` overlaps any other rectangle.
fn collides(rects: &[LayoutRect], idx: usize, tol: f64) -> bool {
    rects
        .iter()
        .enumerate()
        .any(|(j, other)| j != idx && overlaps(&rects[idx], other, tol))
}

fn swap_origins(rects: &mut [LayoutRect], a: usize, b: usize) {
    let (ax, ay) = (rects[a].x, rects[a].y);
    rects[a].x = rects[b].x;
    rects[a].y = rects[b].y;
    rects[b].x = ax;
    rects[b].y = ay;
}

/// Improves `rects` in place and returns the final score, or `None` when
/// there is nothing to optimise (no desired pairs or fewer than two movable
/// rectangles).
pub(crate) fn hill_climb<R: Rng>(
    graph: &TopologyGraph,
    rects: &mut [LayoutRect],
    config: &SolverConfig,
    rng: &mut R,
) -> Option<f64> {
    let desired = desired_pairs(graph, rects);
    if desired.is_empty() {
        return None;
    }
    let movable: Vec<usize> = rects
        .iter()
        .enumerate()
        .filter(|(_, r)| graph.space(&r.space_id).map_or(true, |s| !s.is_vertical_core()))
        .map(|(i, _)| i)
        .collect();
    if movable.len() < 2 {
        return None;
    }

    let scorer = Scorer::new(graph, rects, &desired, config);
    let mut best = scorer.score(rects);
    let initial = best;
    let mut accepted = 0usize;

    for _ in 0..config.max_iter {
        let i = rng.gen_range(0..movable.len());
        let mut j = rng.gen_range(0..movable.len() - 1);
        if j >= i {
            j += 1;
        }
        let (a, b) = (movable[i], movable[j]);

        swap_origins(rects, a, b);
        let clear = !collides(rects, a, config.overlap_tolerance)
            && !collides(rects, b, config.overlap_tolerance);
        let score = if clear { scorer.score(rects) } else { f64::NEG_INFINITY };
        if score >= best {
            best = score;
            accepted += 1;
        } else {
            swap_origins(rects, a, b);
        }
    }

    tracing::debug!(initial, best, accepted, iterations = config.max_iter, "Local search finished");
    Some(best)
}
