// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vertical-core pre-placement.
//!
//! Stairs and elevators go in a single row at `y = 0`, sorted by
//! [`grouping_key`] so the same cores appear in the same left-to-right order
//! on every storey. When any core carries a side hint the row is split into
//! two groups separated by `core_split_gap`. [`CoreAlignment`] carries the x
//! position of each stack key from one storey to the next.
//!
//! A single-storey plan without any pairs has nothing to align, so its cores
//! wrap into a near-square block instead of one long row.

use rustc_hash::FxHashMap;
use spaceplan_topology::circulation::{grouping_key, side_hint, stack_key};
use spaceplan_topology::{CoreSide, SpaceSpec};

use crate::config::SolverConfig;
use crate::postprocess::{round_to, snap_up};
use crate::rect::LayoutRect;

use super::packing::snapped_dims;

/// x positions per stack key, in occurrence order within a storey.
#[derive(Debug, Default, Clone)]
pub(crate) struct CoreAlignment {
    slots: FxHashMap<String, Vec<f64>>,
}

impl CoreAlignment {
    fn lookup(&self, key: &str, occurrence: usize) -> Option<f64> {
        self.slots.get(key).and_then(|xs| xs.get(occurrence)).copied()
    }

    /// Records `x` for a key occurrence seen for the first time.
    fn record(&mut self, key: &str, occurrence: usize, x: f64) {
        let xs = self.slots.entry(key.to_string()).or_default();
        if xs.len() == occurrence {
            xs.push(x);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

/// First x at or right of `desired` where `[x, x + width)` clears every
/// occupied interval.
fn first_free(occupied: &[(f64, f64)], desired: f64, width: f64) -> f64 {
    let mut sorted = occupied.to_vec();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut x = desired;
    for &(start, end) in &sorted {
        if x < end - 1e-9 && x + width > start + 1e-9 {
            x = end;
        }
    }
    x
}

/// Places the given cores in a row at `y = 0`.
///
/// Cores whose stack key already has an x in `alignment` reuse it (shifted
/// right if that spot is taken); new keys are recorded. With `wrap` set and
/// no side hints, the row breaks every `wrap` cores and further rows stack
/// upward.
pub(crate) fn place_cores(
    cores: &[&SpaceSpec],
    config: &SolverConfig,
    alignment: &mut CoreAlignment,
    wrap: Option<usize>,
) -> Vec<LayoutRect> {
    let mut sorted: Vec<&SpaceSpec> = cores.to_vec();
    sorted.sort_by_cached_key(|s| grouping_key(s));

    let split = sorted.iter().any(|s| side_hint(s).is_some());
    if let Some(columns) = wrap.filter(|&c| !split && c > 0 && sorted.len() > c) {
        return place_block(&sorted, config, alignment, columns);
    }
    let groups: Vec<Vec<&SpaceSpec>> = if split {
        let (second, first): (Vec<&SpaceSpec>, Vec<&SpaceSpec>) = sorted
            .into_iter()
            .partition(|s| side_hint(s) == Some(CoreSide::Second));
        vec![first, second]
    } else {
        vec![sorted]
    };

    let mut rects = Vec::with_capacity(cores.len());
    let mut occupied: Vec<(f64, f64)> = Vec::new();
    let mut occurrences: FxHashMap<String, usize> = FxHashMap::default();
    let mut cursor = 0.0_f64;

    for (group_idx, group) in groups.iter().enumerate() {
        if group_idx > 0 && !occupied.is_empty() && !group.is_empty() {
            let row_end = occupied.iter().map(|o| o.1).fold(0.0, f64::max);
            let gap = if config.core_split_gap > 0.0 {
                snap_up(config.core_split_gap, config.grid_unit)
            } else {
                0.0
            };
            cursor = round_to(row_end + gap, 6);
        }
        for spec in group {
            let (w, h) = snapped_dims(spec, config);
            let key = stack_key(spec);
            let occurrence = occurrences.entry(key.clone()).or_insert(0);
            let desired = alignment.lookup(&key, *occurrence).unwrap_or(cursor);
            let x = round_to(first_free(&occupied, desired, w), 6);
            alignment.record(&key, *occurrence, x);
            *occurrence += 1;

            occupied.push((x, x + w));
            cursor = cursor.max(round_to(x + w, 6));
            rects.push(LayoutRect::new(spec.id.clone(), x, 0.0, w, h));
        }
    }
    tracing::debug!(cores = rects.len(), split, "Vertical cores pre-placed");
    rects
}

/// Rows of `columns` cores, left-aligned, each row on top of the previous.
fn place_block(
    sorted: &[&SpaceSpec],
    config: &SolverConfig,
    alignment: &mut CoreAlignment,
    columns: usize,
) -> Vec<LayoutRect> {
    let mut rects = Vec::with_capacity(sorted.len());
    let mut occurrences: FxHashMap<String, usize> = FxHashMap::default();
    let mut y = 0.0_f64;
    for row in sorted.chunks(columns) {
        let mut x = 0.0_f64;
        let mut row_h = 0.0_f64;
        for spec in row {
            let (w, h) = snapped_dims(spec, config);
            let key = stack_key(spec);
            let occurrence = occurrences.entry(key.clone()).or_insert(0);
            alignment.record(&key, *occurrence, x);
            *occurrence += 1;

            rects.push(LayoutRect::new(spec.id.clone(), x, y, w, h));
            x = round_to(x + w, 6);
            row_h = row_h.max(h);
        }
        y = round_to(y + row_h, 6);
    }
    tracing::debug!(cores = rects.len(), columns, "Vertical cores pre-placed as a block");
    rects
}

/// Restores each core's `y` and height from its pre-placement rectangle.
pub(crate) fn repin(rects: &mut [LayoutRect], anchors: &[LayoutRect]) {
    let by_id: FxHashMap<&str, &LayoutRect> =
        anchors.iter().map(|a| (a.space_id.as_str(), a)).collect();
    for rect in rects.iter_mut() {
        if let Some(anchor) = by_id.get(rect.space_id.as_str()) {
            rect.y = anchor.y;
            rect.height = anchor.height;
        }
    }
}
