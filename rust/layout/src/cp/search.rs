// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Depth-first branch and bound over LP relaxations.
//!
//! The relaxation is solved once; every branch re-solves a clone of its
//! parent [`Solution`] with one extra bound. The best integral solution is
//! kept as the search goes, so a search cut short by its [`Budget`] still
//! returns the best layout found.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use microlp::{ComparisonOp, Problem, Solution, Variable};

const INTEGRALITY_TOLERANCE: f64 = 1e-6;

/// Branching priority of an integer variable. Lower ranks branch first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Rank {
    /// Candidate shape selection.
    Shape,
    /// No-overlap separation side.
    Side,
    /// Sign and nearest-core selectors.
    Auxiliary,
    /// Grid coordinates.
    Coordinate,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct IntegerVar {
    pub var: Variable,
    pub rank: Rank,
    pub binary: bool,
}

/// Deadline plus a flag the caller raises to stop the search early.
#[derive(Debug, Clone)]
pub(crate) struct Budget {
    deadline: Instant,
    stop: Arc<AtomicBool>,
}

impl Budget {
    pub(crate) fn new(limit: Duration, stop: Arc<AtomicBool>) -> Self {
        Self {
            deadline: Instant::now() + limit,
            stop,
        }
    }

    fn exhausted(&self) -> bool {
        self.stop.load(Ordering::Relaxed) || Instant::now() >= self.deadline
    }
}

#[derive(Debug)]
pub(crate) struct Outcome {
    pub best: Option<Solution>,
    /// The whole tree was explored, so `best` is optimal (or absent because
    /// the model is infeasible).
    pub complete: bool,
    pub nodes: usize,
}

#[derive(Debug, Clone, Copy)]
enum Bound {
    Fix(f64),
    AtMost(f64),
    AtLeast(f64),
}

struct Step {
    parent: Solution,
    var: Variable,
    bound: Bound,
}

impl Step {
    fn apply(self) -> Result<Solution, microlp::Error> {
        match self.bound {
            Bound::Fix(v) => self.parent.fix_var(self.var, v),
            Bound::AtMost(v) => self.parent.add_constraint([(self.var, 1.0)], ComparisonOp::Le, v),
            Bound::AtLeast(v) => self.parent.add_constraint([(self.var, 1.0)], ComparisonOp::Ge, v),
        }
    }
}

fn is_integral(value: f64) -> bool {
    (value - value.round()).abs() <= INTEGRALITY_TOLERANCE
}

/// Bounds for the two children, preferred child first.
fn children(int: &IntegerVar, value: f64) -> [Bound; 2] {
    if int.binary {
        // selecting a shape or a side first dives to a feasible layout fastest
        let up_first = matches!(int.rank, Rank::Shape | Rank::Side) || value >= 0.5;
        if up_first {
            [Bound::Fix(1.0), Bound::Fix(0.0)]
        } else {
            [Bound::Fix(0.0), Bound::Fix(1.0)]
        }
    } else {
        let floor = value.floor();
        if value - floor < 0.5 {
            [Bound::AtMost(floor), Bound::AtLeast(floor + 1.0)]
        } else {
            [Bound::AtLeast(floor + 1.0), Bound::AtMost(floor)]
        }
    }
}

struct Search<'a> {
    order: Vec<IntegerVar>,
    budget: &'a Budget,
    best: Option<Solution>,
    best_objective: f64,
    stack: Vec<Step>,
}

impl Search<'_> {
    /// Objectives with integral costs are integral at integer points, so a
    /// node must beat the incumbent by at least one.
    fn can_improve(&self, objective: f64) -> bool {
        (objective - INTEGRALITY_TOLERANCE).ceil() <= self.best_objective - 1.0 + INTEGRALITY_TOLERANCE
    }

    fn expand(&mut self, solution: Solution) {
        let objective = solution.objective();
        if !self.can_improve(objective) {
            return;
        }
        let branch = self
            .order
            .iter()
            .map(|int| (*int, solution[int.var]))
            .find(|(_, value)| !is_integral(*value));

        match branch {
            None => {
                tracing::debug!(objective, "New incumbent");
                self.best_objective = objective;
                self.best = Some(solution);
            }
            Some((int, value)) => {
                let [preferred, other] = children(&int, value);
                self.stack.push(Step {
                    parent: solution.clone(),
                    var: int.var,
                    bound: other,
                });
                self.stack.push(Step {
                    parent: solution,
                    var: int.var,
                    bound: preferred,
                });
            }
        }
    }
}

/// Minimizes `problem` with the variables in `integers` restricted to
/// integers. `problem` itself must hold only continuous variables.
pub(crate) fn branch_and_bound(
    problem: &Problem,
    integers: &[IntegerVar],
    budget: &Budget,
) -> Result<Outcome, microlp::Error> {
    let mut order = integers.to_vec();
    order.sort_by_key(|int| int.rank);

    let root = problem.solve()?;
    let mut search = Search {
        order,
        budget,
        best: None,
        best_objective: f64::INFINITY,
        stack: Vec::new(),
    };
    search.expand(root);

    let mut nodes = 1;
    let mut complete = true;
    while let Some(step) = search.stack.pop() {
        if search.budget.exhausted() {
            complete = false;
            break;
        }
        nodes += 1;
        match step.apply() {
            Ok(solution) => search.expand(solution),
            Err(microlp::Error::Infeasible) => {}
            Err(err) => tracing::debug!(%err, "Pruned numerically unstable node"),
        }
    }

    tracing::debug!(nodes, complete, objective = search.best_objective, "Branch and bound finished");
    Ok(Outcome {
        best: search.best,
        complete,
        nodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use microlp::OptimizationDirection;

    fn budget(secs: u64) -> Budget {
        Budget::new(Duration::from_secs(secs), Arc::new(AtomicBool::new(false)))
    }

    #[test]
    fn finds_integer_optimum() {
        // maximize x + y  s.t.  2x + 2y <= 7, as a minimization
        let mut problem = Problem::new(OptimizationDirection::Minimize);
        let x = problem.add_var(-1.0, (0.0, 10.0));
        let y = problem.add_var(-1.0, (0.0, 10.0));
        problem.add_constraint([(x, 2.0), (y, 2.0)], ComparisonOp::Le, 7.0);
        let ints = [
            IntegerVar { var: x, rank: Rank::Coordinate, binary: false },
            IntegerVar { var: y, rank: Rank::Coordinate, binary: false },
        ];
        let outcome = branch_and_bound(&problem, &ints, &budget(10)).unwrap();
        assert!(outcome.complete);
        let best = outcome.best.unwrap();
        assert_eq!(best[x].round() + best[y].round(), 3.0);
        assert!(is_integral(best[x]) && is_integral(best[y]));
    }

    #[test]
    fn binary_choice_picks_cheaper_option() {
        let mut problem = Problem::new(OptimizationDirection::Minimize);
        let a = problem.add_var(3.0, (0.0, 1.0));
        let b = problem.add_var(2.0, (0.0, 1.0));
        // one of the two must be on
        problem.add_constraint([(a, 1.0), (b, 1.0)], ComparisonOp::Ge, 1.0);
        let ints = [
            IntegerVar { var: a, rank: Rank::Shape, binary: true },
            IntegerVar { var: b, rank: Rank::Shape, binary: true },
        ];
        let outcome = branch_and_bound(&problem, &ints, &budget(10)).unwrap();
        let best = outcome.best.unwrap();
        assert_eq!(best.objective().round(), 2.0);
        assert_eq!(best[b].round(), 1.0);
    }

    #[test]
    fn raised_stop_flag_ends_search_early() {
        let mut problem = Problem::new(OptimizationDirection::Minimize);
        let x = problem.add_var(-1.0, (0.0, 10.0));
        problem.add_constraint([(x, 2.0)], ComparisonOp::Le, 7.0);
        let ints = [IntegerVar { var: x, rank: Rank::Coordinate, binary: false }];
        let stop = Arc::new(AtomicBool::new(true));
        let outcome =
            branch_and_bound(&problem, &ints, &Budget::new(Duration::from_secs(10), stop)).unwrap();
        // the relaxation is fractional and no branch may run
        assert!(!outcome.complete);
        assert!(outcome.best.is_none());
        assert_eq!(outcome.nodes, 1);
    }

    #[test]
    fn infeasible_root_is_an_error() {
        let mut problem = Problem::new(OptimizationDirection::Minimize);
        let x = problem.add_var(1.0, (0.0, 1.0));
        problem.add_constraint([(x, 1.0)], ComparisonOp::Ge, 2.0);
        let err = branch_and_bound(&problem, &[], &budget(1)).unwrap_err();
        assert!(matches!(err, microlp::Error::Infeasible));
    }
}
