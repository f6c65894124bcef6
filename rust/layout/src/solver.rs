// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Common interface of the layout backends.

use spaceplan_topology::TopologyGraph;

use crate::config::{SolverConfig, SolverKind};
use crate::cp::CpSolver;
use crate::error::Result;
use crate::heuristic::HeuristicSolver;
use crate::rect::LayoutRect;

/// Produces one rectangle per space of the graph.
///
/// Implementations are interchangeable: the returned ids are exactly the
/// graph's space ids, each once, and no two rectangles overlap beyond the
/// configured tolerance.
pub trait LayoutSolver: Send + Sync {
    fn solve(&self, graph: &TopologyGraph) -> Result<Vec<LayoutRect>>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// Builds the backend selected by `config.solver`.
pub fn solver_for(config: &SolverConfig) -> Box<dyn LayoutSolver> {
    match config.solver {
        SolverKind::Heuristic => Box::new(HeuristicSolver::new(config.clone())),
        SolverKind::Cp => Box::new(CpSolver::new(config.clone())),
    }
}

/// Validates `config` and solves with the selected backend.
pub fn solve_layout(graph: &TopologyGraph, config: &SolverConfig) -> Result<Vec<LayoutRect>> {
    config.validate()?;
    let solver = solver_for(config);
    tracing::info!(
        solver = solver.name(),
        spaces = graph.len(),
        seed = config.seed,
        "Running layout solver"
    );
    let rects = solver.solve(graph)?;
    tracing::info!(rects = rects.len(), "Layout generated");
    Ok(rects)
}

/// Width and height of a rectangle with the given area and width/height
/// ratio.
pub fn initial_dims(area: f64, aspect_ratio: f64) -> (f64, f64) {
    let w = (area * aspect_ratio).sqrt();
    (w, area / w)
}
