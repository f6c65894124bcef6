// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Post-hoc checks on topology and layout.
//!
//! Nothing here fails: every finding is a human-readable message and the
//! caller decides which ones are fatal.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use spaceplan_topology::{CoreType, SpaceSpec, TopologyGraph, VerticalCoreSpec};

use crate::error::Result;
use crate::postprocess::check_overlaps;
use crate::rect::LayoutRect;

/// Checks the topology against building-level circulation requirements.
///
/// A building with more than one storey needs a stair; from
/// `highrise_elevator_threshold` storeys on it also needs an elevator.
/// `storey_count` defaults to the number of distinct elevations in the graph.
pub fn validate_topology(
    graph: &TopologyGraph,
    vertical_cores: &[VerticalCoreSpec],
    storey_count: Option<usize>,
    highrise_elevator_threshold: usize,
) -> Vec<String> {
    // edge endpoints are guaranteed to exist by graph construction
    let mut errors = graph.validate();

    let storeys = storey_count.unwrap_or_else(|| graph.storey_elevations().len());
    let has = |wanted: CoreType| vertical_cores.iter().any(|c| c.core_type == wanted);

    if storeys > 1 && !has(CoreType::Stair) {
        errors.push(format!(
            "Building has {storeys} storeys but no stair core is defined."
        ));
    }
    if highrise_elevator_threshold > 0
        && storeys >= highrise_elevator_threshold
        && !has(CoreType::Elevator)
    {
        errors.push(format!(
            "Building has {storeys} storeys (threshold {highrise_elevator_threshold}) but no elevator core is defined."
        ));
    }

    errors
}

/// Checks a solved layout: overlaps, missing rectangles and areas below the
/// requested minimum.
pub fn validate_layout(rects: &[LayoutRect], specs: &[SpaceSpec], tol: f64) -> Vec<String> {
    let mut errors = check_overlaps(rects, tol);

    let by_id: FxHashMap<&str, &LayoutRect> =
        rects.iter().map(|r| (r.space_id.as_str(), r)).collect();

    for spec in specs {
        if !by_id.contains_key(spec.id.as_str()) {
            errors.push(format!("Space '{}' has no layout rectangle.", spec.id));
        }
    }

    for spec in specs {
        let (Some(rect), Some(min)) = (by_id.get(spec.id.as_str()), spec.area_min) else {
            continue;
        };
        if rect.area() < min - tol {
            errors.push(format!(
                "Space '{}' area {:.2} m² < min {:.2} m².",
                spec.id,
                rect.area(),
                min
            ));
        }
    }

    errors
}

/// Checks that a shaft opening keeps a positive, identical size on every
/// level it passes through. Keys are storey elevations.
pub fn validate_shaft_openings(openings: &BTreeMap<OrderedElevation, LayoutRect>) -> Vec<String> {
    let mut errors = Vec::new();
    let tol = 1e-6;

    for (elevation, rect) in openings {
        if rect.width <= 0.0 || rect.height <= 0.0 {
            errors.push(format!(
                "Shaft opening '{}' at elevation {:.3} has non-positive size {:.3} x {:.3}.",
                rect.space_id, elevation.0, rect.width, rect.height
            ));
        }
    }

    let mut levels = openings.iter();
    if let Some((base_elev, base)) = levels.next() {
        for (elevation, rect) in levels {
            if (rect.width - base.width).abs() > tol || (rect.height - base.height).abs() > tol {
                errors.push(format!(
                    "Shaft opening size mismatch between elevation {:.3} ({:.3} x {:.3}) and {:.3} ({:.3} x {:.3}).",
                    base_elev.0, base.width, base.height, elevation.0, rect.width, rect.height
                ));
            }
        }
    }

    errors
}

/// Storey elevation usable as an ordered map key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderedElevation(pub f64);

impl Eq for OrderedElevation {}

impl PartialOrd for OrderedElevation {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedElevation {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// A non-fatal finding about the input topology, as reported by ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyWarning {
    pub code: String,
    pub severity: String,
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<String>,
    pub message: String,
}

/// Serializable summary of constraint violations for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintsReport {
    pub topology_errors: Vec<String>,
    pub layout_errors: Vec<String>,
    pub area_deviations: BTreeMap<String, f64>,
    #[serde(default)]
    pub topology_warnings: Vec<TopologyWarning>,
    /// True when there are no topology or layout errors; warnings do not count.
    pub ok: bool,
}

impl ConstraintsReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn build_constraints_report(
    topology_errors: Vec<String>,
    layout_errors: Vec<String>,
    area_deviations: BTreeMap<String, f64>,
    topology_warnings: Vec<TopologyWarning>,
) -> ConstraintsReport {
    let ok = topology_errors.is_empty() && layout_errors.is_empty();
    ConstraintsReport {
        topology_errors,
        layout_errors,
        area_deviations,
        topology_warnings,
        ok,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_storeys() -> TopologyGraph {
        TopologyGraph::from_parts(
            vec![
                SpaceSpec::new("s1").with_name("S1").with_storey("l1", 0.0),
                SpaceSpec::new("s2").with_name("S2").with_storey("l2", 3.0),
            ],
            vec![],
            vec![],
        )
    }

    #[test]
    fn multi_storey_requires_stair() {
        let errors = validate_topology(&two_storeys(), &[], None, 6);
        assert!(errors.iter().any(|e| e.to_lowercase().contains("stair")));
    }

    #[test]
    fn highrise_requires_elevator() {
        let cores = [VerticalCoreSpec::new("stair-1", CoreType::Stair)];
        let errors = validate_topology(&two_storeys(), &cores, Some(6), 6);
        assert!(errors.iter().any(|e| e.to_lowercase().contains("elevator")));
    }

    #[test]
    fn passes_with_stair_and_elevator() {
        let cores = [
            VerticalCoreSpec::new("stair-1", CoreType::Stair),
            VerticalCoreSpec::new("elevator-1", CoreType::Elevator),
        ];
        assert!(validate_topology(&two_storeys(), &cores, Some(6), 6).is_empty());
    }

    #[test]
    fn empty_topology_is_an_error() {
        let errors = validate_topology(&TopologyGraph::new(), &[], None, 6);
        assert_eq!(errors, vec!["No spaces defined."]);
    }

    #[test]
    fn layout_reports_missing_and_undersized() {
        let specs = [
            SpaceSpec::new("a").with_area(20.0, Some(18.0)),
            SpaceSpec::new("b"),
        ];
        let rects = [LayoutRect::new("a", 0.0, 0.0, 4.0, 4.0)];
        let errors = validate_layout(&rects, &specs, 0.01);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("'b' has no layout rectangle"));
        assert!(errors[1].contains("16.00") && errors[1].contains("18.00"));
    }

    #[test]
    fn shaft_openings_non_positive() {
        let mut openings = BTreeMap::new();
        openings.insert(OrderedElevation(0.0), LayoutRect::new("open", 0.0, 0.0, 0.0, 1.0));
        let errors = validate_shaft_openings(&openings);
        assert!(errors.iter().any(|e| e.contains("non-positive")));
    }

    #[test]
    fn shaft_openings_size_mismatch() {
        let mut openings = BTreeMap::new();
        openings.insert(OrderedElevation(0.0), LayoutRect::new("open_l1", 0.0, 0.0, 1.0, 1.0));
        openings.insert(OrderedElevation(3.0), LayoutRect::new("open_l2", 0.0, 0.0, 1.2, 1.0));
        let errors = validate_shaft_openings(&openings);
        assert!(errors.iter().any(|e| e.to_lowercase().contains("mismatch")));
    }

    #[test]
    fn report_includes_warnings_without_failing() {
        let warnings = vec![TopologyWarning {
            code: "space.missing_name".into(),
            severity: "warning".into(),
            entity_id: "urn:test:space_unnamed".into(),
            predicate: None,
            message: "Space is missing a name; using id tail as fallback.".into(),
        }];
        let mut devs = BTreeMap::new();
        devs.insert("s1".to_string(), 1.0);

        let report = build_constraints_report(vec![], vec![], devs, warnings.clone());
        assert!(report.ok);
        assert_eq!(report.topology_warnings, warnings);

        let json = report.to_json().unwrap();
        assert!(json.contains("\"ok\": true"));
        assert!(!json.contains("predicate"));
    }
}
