// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Initial placement of non-core spaces: shelf packing for connected
//! programmes, a compact grid for sparse ones.

use spaceplan_topology::SpaceSpec;

use crate::config::SolverConfig;
use crate::postprocess::{round_to, snap_up};
use crate::rect::LayoutRect;
use crate::solver::initial_dims;

/// Width/height ratio for a space: the configured default, clamped into the
/// space's own aspect bounds when it has them.
fn aspect_for(spec: &SpaceSpec, config: &SolverConfig) -> f64 {
    let mut aspect = config.default_aspect_ratio;
    if let Some(max) = spec.aspect_ratio_max {
        aspect = aspect.min(max);
    }
    if let Some(min) = spec.aspect_ratio_min {
        aspect = aspect.max(min);
    }
    aspect
}

/// Grid-snapped `(width, height)` of a space's initial rectangle. Both are
/// rounded up, so the placed area never falls below the target.
pub(crate) fn snapped_dims(spec: &SpaceSpec, config: &SolverConfig) -> (f64, f64) {
    let (w, h) = initial_dims(spec.effective_area_target(), aspect_for(spec, config));
    (snap_up(w, config.grid_unit), snap_up(h, config.grid_unit))
}

/// Row-wise shelf packing starting at `origin_y`.
///
/// The shelf width grows with the widest room and the total area, capped by
/// `max_strip_width`. A room that would cross the shelf edge opens a new
/// row unless it is the first one in its row.
pub(crate) fn shelf_pack(specs: &[&SpaceSpec], config: &SolverConfig, origin_y: f64) -> Vec<LayoutRect> {
    let dims: Vec<(f64, f64)> = specs.iter().map(|s| snapped_dims(s, config)).collect();
    let max_w = dims.iter().map(|d| d.0).fold(0.0, f64::max);
    let total_area: f64 = dims.iter().map(|d| d.0 * d.1).sum();
    let shelf_width = (1.8 * max_w)
        .max(1.35 * total_area.sqrt())
        .min(config.max_strip_width);

    let mut rects = Vec::with_capacity(specs.len());
    let (mut x, mut y, mut row_h) = (0.0_f64, origin_y, 0.0_f64);
    for (spec, (w, h)) in specs.iter().zip(dims) {
        if x + w > shelf_width + 1e-9 && x > 0.0 {
            x = 0.0;
            y = round_to(y + row_h, 6);
            row_h = 0.0;
        }
        rects.push(LayoutRect::new(spec.id.clone(), x, y, w, h));
        x = round_to(x + w, 6);
        row_h = row_h.max(h);
    }
    tracing::trace!(shelf_width, rows_end = y + row_h, "Shelf packing done");
    rects
}

/// Near-square grid for programmes without adjacency or connection
/// requirements: `ceil(sqrt(n))` columns, each row centred on the widest
/// one.
pub(crate) fn compact_grid(specs: &[&SpaceSpec], config: &SolverConfig, origin_y: f64) -> Vec<LayoutRect> {
    if specs.is_empty() {
        return Vec::new();
    }
    let grid = config.grid_unit;
    let cols = (specs.len() as f64).sqrt().ceil() as usize;
    let dims: Vec<(f64, f64)> = specs.iter().map(|s| snapped_dims(s, config)).collect();

    let rows: Vec<&[(f64, f64)]> = dims.chunks(cols).collect();
    let row_widths: Vec<f64> = rows.iter().map(|r| r.iter().map(|d| d.0).sum()).collect();
    let full_width = row_widths.iter().copied().fold(0.0, f64::max);

    let mut rects = Vec::with_capacity(specs.len());
    let mut y = origin_y;
    let mut ids = specs.iter().map(|s| s.id.as_str());
    for (row, row_width) in rows.iter().zip(&row_widths) {
        // floor keeps the row on the grid
        let mut x = (((full_width - row_width) / 2.0) / grid).floor() * grid;
        let mut row_h = 0.0_f64;
        for &(w, h) in row.iter() {
            if let Some(id) = ids.next() {
                rects.push(LayoutRect::new(id, round_to(x, 6), y, w, h));
            }
            x += w;
            row_h = row_h.max(h);
        }
        y = round_to(y + row_h, 6);
    }
    rects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{has_overlaps, OVERLAP_TOLERANCE};
    use crate::rect::bounding_box;

    fn specs(areas: &[f64]) -> Vec<SpaceSpec> {
        areas
            .iter()
            .enumerate()
            .map(|(i, a)| SpaceSpec::new(format!("s{i}")).with_area(*a, None))
            .collect()
    }

    fn on_grid(v: f64, grid: f64) -> bool {
        let units = v / grid;
        (units - units.round()).abs() < 1e-6
    }

    #[test]
    fn snapped_dims_cover_target_area() {
        let config = SolverConfig::default();
        let spec = SpaceSpec::new("a").with_area(17.0, None);
        let (w, h) = snapped_dims(&spec, &config);
        assert!(w * h >= 17.0);
        assert!(on_grid(w, config.grid_unit) && on_grid(h, config.grid_unit));
    }

    #[test]
    fn aspect_bounds_override_default() {
        let config = SolverConfig::default();
        let spec = SpaceSpec::new("a")
            .with_area(16.0, None)
            .with_aspect_ratio(Some(0.9), Some(1.1));
        let (w, h) = snapped_dims(&spec, &config);
        assert!((w / h - 1.0).abs() < 0.2);
    }

    #[test]
    fn shelf_pack_is_disjoint_and_starts_at_origin() {
        let config = SolverConfig::default();
        let owned = specs(&[20.0, 12.0, 30.0, 8.0, 25.0, 40.0]);
        let refs: Vec<&SpaceSpec> = owned.iter().collect();
        let rects = shelf_pack(&refs, &config, 4.0);
        assert_eq!(rects.len(), 6);
        assert!(!has_overlaps(&rects, OVERLAP_TOLERANCE));
        assert!(rects.iter().all(|r| r.y >= 4.0));
        assert_eq!(rects[0].x, 0.0);
        assert_eq!(rects[0].y, 4.0);
    }

    #[test]
    fn shelf_pack_respects_strip_width() {
        let config = SolverConfig {
            max_strip_width: 12.0,
            ..SolverConfig::default()
        };
        let owned = specs(&[20.0; 10]);
        let refs: Vec<&SpaceSpec> = owned.iter().collect();
        let rects = shelf_pack(&refs, &config, 0.0);
        assert!(rects.iter().all(|r| r.x2() <= 12.0 + 1e-9));
    }

    #[test]
    fn compact_grid_is_near_square() {
        let config = SolverConfig::default();
        let owned = specs(&[20.0; 9]);
        let refs: Vec<&SpaceSpec> = owned.iter().collect();
        let rects = compact_grid(&refs, &config, 0.0);
        assert!(!has_overlaps(&rects, OVERLAP_TOLERANCE));
        let (x0, y0, x1, y1) = bounding_box(&rects).unwrap();
        let (w, h) = (x1 - x0, y1 - y0);
        assert!(w.max(h) / w.min(h) < 2.0);
        assert!(rects.iter().all(|r| on_grid(r.x, config.grid_unit)));
    }

    #[test]
    fn compact_grid_centres_short_last_row() {
        let config = SolverConfig::default();
        let owned = specs(&[16.0; 5]);
        let refs: Vec<&SpaceSpec> = owned.iter().collect();
        let rects = compact_grid(&refs, &config, 0.0);
        // 3 columns: the last row holds two rooms and is shifted right
        assert!(rects[3].x > 0.0);
        assert!(!has_overlaps(&rects, OVERLAP_TOLERANCE));
    }
}
