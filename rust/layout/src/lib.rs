// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Spaceplan Layout
//!
//! Turns a [`TopologyGraph`](spaceplan_topology::TopologyGraph) into one
//! axis-aligned rectangle per space.
//!
//! Two interchangeable backends implement [`LayoutSolver`]:
//!
//! - [`HeuristicSolver`]: BFS-ordered shelf packing with vertical cores
//!   pre-placed, multi-storey stacking and seeded hill climbing. Fast,
//!   deterministic and infallible.
//! - [`CpSolver`]: a mixed-integer model on the layout grid, minimising area
//!   deviation, bounding box and relationship distances under a wall-clock
//!   limit. May fail with a named solver status.
//!
//! ```no_run
//! use spaceplan_layout::{solve_layout, SolverConfig};
//! use spaceplan_topology::{AdjacencyEdge, SpaceSpec, TopologyGraph};
//!
//! let graph = TopologyGraph::from_parts(
//!     vec![SpaceSpec::new("office"), SpaceSpec::new("hall")],
//!     vec![AdjacencyEdge::new("office", "hall")],
//!     vec![],
//! );
//! let rects = solve_layout(&graph, &SolverConfig::default())?;
//! assert_eq!(rects.len(), 2);
//! # Ok::<(), spaceplan_layout::Error>(())
//! ```

pub mod config;
pub mod cp;
pub mod error;
pub mod geometry;
pub mod heuristic;
pub mod postprocess;
pub mod rect;
pub mod solver;
pub mod validate;

pub use config::{SolverConfig, SolverKind};
pub use cp::CpSolver;
pub use error::{Error, Result};
pub use geometry::{has_overlaps, overlaps, touch, OVERLAP_TOLERANCE, TOUCH_TOLERANCE};
pub use heuristic::HeuristicSolver;
pub use postprocess::{check_overlaps, compute_area_deviations, snap_to_grid};
pub use rect::{bounding_box, LayoutRect};
pub use solver::{solve_layout, solver_for, LayoutSolver};
pub use validate::{
    build_constraints_report, validate_layout, validate_shaft_openings, validate_topology,
    ConstraintsReport, OrderedElevation, TopologyWarning,
};
