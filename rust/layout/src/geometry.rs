// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rectangle predicates shared by both solvers and the validator.
//!
//! These two functions define what "adjacency satisfied" and "no overlap"
//! mean everywhere in the engine.

use crate::rect::LayoutRect;

/// Default tolerance for [`touch`] (m).
pub const TOUCH_TOLERANCE: f64 = 0.1;

/// Default tolerance for [`overlaps`] (m).
pub const OVERLAP_TOLERANCE: f64 = 0.01;

/// True when the rectangles share an edge.
///
/// One axis must nearly coincide (gap within `tol`) while the other axis
/// overlaps by more than `tol`. Corner-only contact does not count.
pub fn touch(a: &LayoutRect, b: &LayoutRect, tol: f64) -> bool {
    let x_gap = a.x.max(b.x) - a.x2().min(b.x2());
    let y_gap = a.y.max(b.y) - a.y2().min(b.y2());

    // vertical shared edge
    let x_touch = x_gap.abs() <= tol;
    let y_overlap = -y_gap > tol;
    // horizontal shared edge
    let y_touch = y_gap.abs() <= tol;
    let x_overlap = -x_gap > tol;

    (x_touch && y_overlap) || (y_touch && x_overlap)
}

/// True when the interiors intersect by more than `tol` on both axes.
pub fn overlaps(a: &LayoutRect, b: &LayoutRect, tol: f64) -> bool {
    let inter_w = a.x2().min(b.x2()) - a.x.max(b.x);
    let inter_h = a.y2().min(b.y2()) - a.y.max(b.y);
    inter_w > tol && inter_h > tol
}

/// Area of the intersection, zero when disjoint.
pub fn intersection_area(a: &LayoutRect, b: &LayoutRect) -> f64 {
    let inter_w = a.x2().min(b.x2()) - a.x.max(b.x);
    let inter_h = a.y2().min(b.y2()) - a.y.max(b.y);
    inter_w.max(0.0) * inter_h.max(0.0)
}

/// Shortest axis-aligned clearance between two rectangles (zero when they
/// touch or overlap).
pub fn gap_distance(a: &LayoutRect, b: &LayoutRect) -> f64 {
    let dx = (a.x.max(b.x) - a.x2().min(b.x2())).max(0.0);
    let dy = (a.y.max(b.y) - a.y2().min(b.y2())).max(0.0);
    (dx * dx + dy * dy).sqrt()
}

/// True if any pair overlaps beyond `tol`.
pub fn has_overlaps(rects: &[LayoutRect], tol: f64) -> bool {
    rects
        .iter()
        .enumerate()
        .any(|(i, a)| rects[i + 1..].iter().any(|b| overlaps(a, b, tol)))
}
