// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Axis-aligned rectangles produced by the solvers.

use serde::{Deserialize, Serialize};

/// Placement of one space. `(x, y)` is the lower-left corner, in metres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRect {
    pub space_id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LayoutRect {
    pub fn new(space_id: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            space_id: space_id.into(),
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn x2(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn y2(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Same size, new lower-left corner.
    pub fn moved_to(&self, x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..self.clone()
        }
    }

    /// Manhattan distance between centers.
    pub fn center_distance(&self, other: &LayoutRect) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        (ax - bx).abs() + (ay - by).abs()
    }
}

/// Axis-aligned bounds `(min_x, min_y, max_x, max_y)`; `None` for no rects.
pub fn bounding_box<'a>(
    rects: impl IntoIterator<Item = &'a LayoutRect>,
) -> Option<(f64, f64, f64, f64)> {
    rects.into_iter().fold(None, |acc, r| {
        Some(match acc {
            None => (r.x, r.y, r.x2(), r.y2()),
            Some((x0, y0, x1, y1)) => (x0.min(r.x), y0.min(r.y), x1.max(r.x2()), y1.max(r.y2())),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_values() {
        let r = LayoutRect::new("a", 1.0, 2.0, 4.0, 3.0);
        assert_eq!(r.x2(), 5.0);
        assert_eq!(r.y2(), 5.0);
        assert_eq!(r.area(), 12.0);
        assert_eq!(r.center(), (3.0, 3.5));
    }

    #[test]
    fn bounding_box_spans_all() {
        let rects = [
            LayoutRect::new("a", 0.0, 0.0, 2.0, 2.0),
            LayoutRect::new("b", 5.0, -1.0, 1.0, 1.0),
        ];
        assert_eq!(bounding_box(&rects), Some((0.0, -1.0, 6.0, 2.0)));
        assert_eq!(bounding_box(&[] as &[LayoutRect]), None);
    }

    #[test]
    fn moved_to_keeps_size() {
        let r = LayoutRect::new("a", 0.0, 0.0, 2.0, 3.0).moved_to(4.0, 5.0);
        assert_eq!((r.x, r.y, r.width, r.height), (4.0, 5.0, 2.0, 3.0));
        assert_eq!(r.space_id, "a");
    }
}
