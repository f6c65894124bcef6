// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Exact backend: a mixed-integer formulation on the layout grid.
//!
//! The model is built and solved on a worker thread that searches until
//! `time_limit_secs` and then returns its best layout. Only a search that
//! found nothing in that time is reported as [`Error::Timeout`]. If the
//! worker overruns the limit the caller stops waiting and raises a stop flag
//! the search checks between nodes.

mod instance;
mod model;
mod search;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use spaceplan_topology::TopologyGraph;

use crate::config::SolverConfig;
use crate::error::{Error, Result};
use crate::postprocess::round_to;
use crate::rect::LayoutRect;
use crate::solver::LayoutSolver;

use instance::CpInstance;
use model::{solve_instance, GridPlacement, Solved};
use search::Budget;

/// Extra wait past the limit for the worker to hand back its incumbent.
const RESULT_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Default)]
pub struct CpSolver {
    config: SolverConfig,
}

fn status_error(err: microlp::Error) -> Error {
    let status = match err {
        microlp::Error::Infeasible => "INFEASIBLE".to_string(),
        microlp::Error::Unbounded => "UNBOUNDED".to_string(),
        microlp::Error::InternalError(msg) => format!("MODEL_INVALID ({msg})"),
    };
    Error::SolverStatus { status }
}

impl CpSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    fn solve_with_limit(&self, instance: CpInstance) -> Result<Vec<GridPlacement>> {
        let limit_secs = self.config.time_limit_secs;
        let limit = Duration::from_secs(limit_secs);
        let stop = Arc::new(AtomicBool::new(false));
        let budget = Budget::new(limit, Arc::clone(&stop));

        let (tx, rx) = mpsc::channel();
        std::thread::Builder::new()
            .name("spaceplan-cp".into())
            .spawn(move || {
                // receiver may be gone after a timeout
                let _ = tx.send(solve_instance(&instance, &budget));
            })
            .map_err(|e| Error::SolverStatus {
                status: format!("NOT_STARTED ({e})"),
            })?;

        let received = rx.recv_timeout(limit + RESULT_GRACE);
        if received.is_err() {
            stop.store(true, Ordering::Relaxed);
        }
        match received {
            Ok(Ok(Some(Solved { placements, optimal }))) => {
                if optimal {
                    tracing::debug!("Constraint solver status OPTIMAL");
                } else {
                    tracing::info!(limit_secs, "Constraint solver status FEASIBLE, returning best layout found");
                }
                Ok(placements)
            }
            Ok(Ok(None)) | Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!(limit_secs, "Constraint solver timed out");
                Err(Error::Timeout { limit_secs })
            }
            Ok(Err(err)) => Err(status_error(err)),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(Error::SolverStatus {
                status: "ABORTED".into(),
            }),
        }
    }

    /// Converts grid placements to metres, stacking floors upward with
    /// `floor_gap` between them.
    fn to_rects(&self, instance: &CpInstance, placements: &[GridPlacement]) -> Vec<LayoutRect> {
        let grid = self.config.grid_unit;
        let mut offsets = vec![0.0; instance.floor_count];
        if instance.floor_count > 1 {
            let gap_units = (self.config.floor_gap / grid - 1e-9).ceil().max(0.0) as i64;
            let mut tops = vec![0i64; instance.floor_count];
            for (space, p) in instance.spaces.iter().zip(placements) {
                tops[space.floor] = tops[space.floor].max(p.y + p.h);
            }
            let mut base = 0i64;
            for (floor, top) in tops.iter().enumerate() {
                offsets[floor] = base as f64 * grid;
                base += top + gap_units;
            }
        }

        instance
            .spaces
            .iter()
            .zip(placements)
            .map(|(space, p)| {
                LayoutRect::new(
                    space.id.clone(),
                    round_to(p.x as f64 * grid, 4),
                    round_to(p.y as f64 * grid + offsets[space.floor], 4),
                    round_to(p.w as f64 * grid, 4),
                    round_to(p.h as f64 * grid, 4),
                )
            })
            .collect()
    }
}

impl LayoutSolver for CpSolver {
    fn solve(&self, graph: &TopologyGraph) -> Result<Vec<LayoutRect>> {
        if graph.is_empty() {
            return Ok(Vec::new());
        }
        let instance = CpInstance::build(graph, &self.config);
        tracing::debug!(
            spaces = instance.len(),
            floors = instance.floor_count,
            max_dim = instance.max_dim,
            "Solving integer layout model"
        );
        let placements = self.solve_with_limit(instance.clone())?;
        Ok(self.to_rects(&instance, &placements))
    }

    fn name(&self) -> &'static str {
        "cp"
    }
}
