// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Post-processing of solver output: grid snapping and overlap/area
//! reporting.

use std::collections::BTreeMap;

use spaceplan_topology::SpaceSpec;

use crate::geometry::intersection_area;
use crate::rect::LayoutRect;

/// Rounds a value to `decimals` decimal places.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Snaps `value` up to the next multiple of `grid`, at least one unit.
pub(crate) fn snap_up(value: f64, grid: f64) -> f64 {
    // 1e-9 keeps exact multiples from rounding up a whole unit
    let units = (value / grid - 1e-9).ceil().max(1.0);
    round_to(units * grid, 6)
}

/// Rounds all coordinates to the nearest grid multiple.
///
/// Zero or sub-unit sizes become exactly one grid unit.
pub fn snap_to_grid(rects: &[LayoutRect], grid: f64) -> Vec<LayoutRect> {
    let snap = |v: f64| round_to((v / grid).round() * grid, 6);
    rects
        .iter()
        .map(|r| LayoutRect {
            space_id: r.space_id.clone(),
            x: snap(r.x),
            y: snap(r.y),
            width: snap(r.width).max(grid),
            height: snap(r.height).max(grid),
        })
        .collect()
}

/// Describes every pair whose intersection area exceeds `tol`.
pub fn check_overlaps(rects: &[LayoutRect], tol: f64) -> Vec<String> {
    let mut issues = Vec::new();
    for (i, a) in rects.iter().enumerate() {
        for b in &rects[i + 1..] {
            let area = intersection_area(a, b);
            if area > tol {
                issues.push(format!(
                    "Overlap between '{}' and '{}': area={:.3} m²",
                    a.space_id, b.space_id, area
                ));
            }
        }
    }
    issues
}

/// `space_id → (placed area − area_target)` for spaces with an explicit
/// target.
pub fn compute_area_deviations(rects: &[LayoutRect], specs: &[SpaceSpec]) -> BTreeMap<String, f64> {
    let targets: BTreeMap<&str, f64> = specs
        .iter()
        .filter_map(|s| s.area_target.map(|t| (s.id.as_str(), t)))
        .collect();
    rects
        .iter()
        .filter_map(|r| {
            targets
                .get(r.space_id.as_str())
                .map(|t| (r.space_id.clone(), round_to(r.area() - t, 4)))
        })
        .collect()
}
