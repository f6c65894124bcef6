// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mixed-integer model of a [`CpInstance`].
//!
//! Each space picks exactly one candidate shape, which keeps `area = w * h`
//! linear: width, height and area deviation are sums over the selection
//! binaries. No-overlap is a big-M disjunction per pair on the same floor.
//! Centres are kept doubled (`2x + w`) so they stay integral.
//!
//! Every objective term is a single variable, so objective weights are set
//! as variable costs when the variable is created. All variables are added
//! as continuous; integrality is enforced by [`branch_and_bound`].

use std::collections::BTreeMap;

use microlp::{ComparisonOp, OptimizationDirection, Problem, Solution, Variable};
use spaceplan_topology::CoreType;

use super::instance::CpInstance;
use super::search::{branch_and_bound, Budget, IntegerVar, Rank};

const AREA_WEIGHT: f64 = 100.0;
const COMPACTNESS_WEIGHT: f64 = 10.0;
const PAIR_WEIGHT: f64 = 1.0;
const CORE_PROXIMITY_WEIGHT: f64 = 5.0;
const CORE_STACK_WEIGHT: f64 = 5.0;
const CIRCULATION_WEIGHT: f64 = 1.0;

/// Solved rectangle, in grid units and floor-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GridPlacement {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

/// Result of a solve that found at least one layout.
#[derive(Debug, Clone)]
pub(crate) struct Solved {
    pub placements: Vec<GridPlacement>,
    /// False when the budget ran out before optimality was proven.
    pub optimal: bool,
}

/// Affine expression with merged coefficients.
#[derive(Debug, Clone, Default)]
struct Affine {
    terms: BTreeMap<Variable, f64>,
    constant: f64,
}

impl Affine {
    fn var(v: Variable) -> Self {
        Self::default().plus(v, 1.0)
    }

    fn plus(mut self, v: Variable, coeff: f64) -> Self {
        *self.terms.entry(v).or_insert(0.0) += coeff;
        self
    }

    fn plus_const(mut self, c: f64) -> Self {
        self.constant += c;
        self
    }

    fn plus_expr(mut self, other: &Affine, scale: f64) -> Self {
        for (&v, &c) in &other.terms {
            *self.terms.entry(v).or_insert(0.0) += c * scale;
        }
        self.constant += other.constant * scale;
        self
    }

    fn minus(self, other: &Affine) -> Self {
        self.plus_expr(other, -1.0)
    }
}

struct SpaceVars {
    x: Variable,
    y: Variable,
    select: Vec<Variable>,
}

struct ModelBuilder<'a> {
    inst: &'a CpInstance,
    problem: Problem,
    spaces: Vec<SpaceVars>,
    integers: Vec<IntegerVar>,
    /// Largest doubled-centre difference.
    span: f64,
}

impl<'a> ModelBuilder<'a> {
    fn new(inst: &'a CpInstance) -> Self {
        let mut builder = Self {
            inst,
            problem: Problem::new(OptimizationDirection::Minimize),
            spaces: Vec::with_capacity(inst.len()),
            integers: Vec::new(),
            span: 2.0 * inst.extent() as f64,
        };
        let max_coord = inst.max_coord as f64;
        for space in &inst.spaces {
            let x = builder.integer(0.0, max_coord, Rank::Coordinate);
            let y = builder.integer(0.0, max_coord, Rank::Coordinate);
            let select = space
                .shapes
                .iter()
                .map(|shape| builder.binary(AREA_WEIGHT * shape.deviation as f64, Rank::Shape))
                .collect();
            builder.spaces.push(SpaceVars { x, y, select });
        }
        builder
    }

    fn integer(&mut self, min: f64, max: f64, rank: Rank) -> Variable {
        let var = self.problem.add_var(0.0, (min, max));
        self.integers.push(IntegerVar {
            var,
            rank,
            binary: false,
        });
        var
    }

    fn binary(&mut self, cost: f64, rank: Rank) -> Variable {
        let var = self.problem.add_var(cost, (0.0, 1.0));
        self.integers.push(IntegerVar {
            var,
            rank,
            binary: true,
        });
        var
    }

    /// Adds `lhs <op> rhs`.
    fn constrain(&mut self, lhs: Affine, op: ComparisonOp, rhs: Affine) {
        let diff = lhs.minus(&rhs);
        let terms: Vec<(Variable, f64)> = diff
            .terms
            .into_iter()
            .filter(|(_, c)| *c != 0.0)
            .collect();
        self.problem.add_constraint(terms, op, -diff.constant);
    }

    fn width(&self, i: usize) -> Affine {
        self.inst.spaces[i]
            .shapes
            .iter()
            .zip(&self.spaces[i].select)
            .fold(Affine::default(), |acc, (shape, &sel)| acc.plus(sel, shape.w as f64))
    }

    fn height(&self, i: usize) -> Affine {
        self.inst.spaces[i]
            .shapes
            .iter()
            .zip(&self.spaces[i].select)
            .fold(Affine::default(), |acc, (shape, &sel)| acc.plus(sel, shape.h as f64))
    }

    fn center_x2(&self, i: usize) -> Affine {
        self.width(i).plus(self.spaces[i].x, 2.0)
    }

    fn center_y2(&self, i: usize) -> Affine {
        self.height(i).plus(self.spaces[i].y, 2.0)
    }

    /// `d >= |diff|`, tight only under minimisation.
    fn abs_bound(&mut self, diff: &Affine, cost: f64) -> Variable {
        let d = self.problem.add_var(cost, (0.0, self.span));
        self.constrain(Affine::var(d), ComparisonOp::Ge, diff.clone());
        self.constrain(Affine::var(d), ComparisonOp::Ge, Affine::default().plus_expr(diff, -1.0));
        d
    }

    /// `d == |diff|`, using a sign binary.
    fn abs_exact(&mut self, diff: &Affine) -> Variable {
        let d = self.abs_bound(diff, 0.0);
        let sign = self.binary(0.0, Rank::Auxiliary);
        let big = 2.0 * self.span;
        let upper_pos = diff.clone().plus_const(big).plus(sign, -big);
        let upper_neg = Affine::default().plus_expr(diff, -1.0).plus(sign, big);
        self.constrain(Affine::var(d), ComparisonOp::Le, upper_pos);
        self.constrain(Affine::var(d), ComparisonOp::Le, upper_neg);
        d
    }

    fn center_diffs(&self, a: usize, b: usize) -> (Affine, Affine) {
        (
            self.center_x2(a).minus(&self.center_x2(b)),
            self.center_y2(a).minus(&self.center_y2(b)),
        )
    }

    fn one_shape_each(&mut self) {
        for i in 0..self.spaces.len() {
            let picked = self.spaces[i]
                .select
                .iter()
                .fold(Affine::default(), |acc, &sel| acc.plus(sel, 1.0));
            self.constrain(picked, ComparisonOp::Eq, Affine::default().plus_const(1.0));
        }
    }

    /// Bounding box over all floors' local coordinates.
    fn bounding_box(&mut self) {
        let extent = self.inst.extent() as f64;
        let max_x = self.problem.add_var(COMPACTNESS_WEIGHT, (0.0, extent));
        let max_y = self.problem.add_var(COMPACTNESS_WEIGHT, (0.0, extent));
        for i in 0..self.spaces.len() {
            let x_end = self.width(i).plus(self.spaces[i].x, 1.0);
            let y_end = self.height(i).plus(self.spaces[i].y, 1.0);
            self.constrain(Affine::var(max_x), ComparisonOp::Ge, x_end);
            self.constrain(Affine::var(max_y), ComparisonOp::Ge, y_end);
        }
    }

    /// Pairwise separation. Each side gets the smallest big-M that relaxes it:
    /// the largest end coordinate of the space that must come first.
    fn no_overlap(&mut self) {
        let inst = self.inst;
        let max_coord = inst.max_coord as f64;
        let n = self.spaces.len();
        for i in 0..n {
            for j in i + 1..n {
                if inst.spaces[i].floor != inst.spaces[j].floor {
                    continue;
                }
                let (xi, yi) = (self.spaces[i].x, self.spaces[i].y);
                let (xj, yj) = (self.spaces[j].x, self.spaces[j].y);

                // i left of j, j left of i, i below j, j below i
                let (si, sj) = (&inst.spaces[i], &inst.spaces[j]);
                let separations = [
                    (self.width(i).plus(xi, 1.0), xj, si.max_width()),
                    (self.width(j).plus(xj, 1.0), xi, sj.max_width()),
                    (self.height(i).plus(yi, 1.0), yj, si.max_height()),
                    (self.height(j).plus(yj, 1.0), yi, sj.max_height()),
                ];
                let mut any = Affine::default();
                for (end, start, reach) in separations {
                    let big = max_coord + reach as f64;
                    let side = self.binary(0.0, Rank::Side);
                    // end <= start + big * (1 - side)
                    self.constrain(
                        end.plus(side, big),
                        ComparisonOp::Le,
                        Affine::var(start).plus_const(big),
                    );
                    any = any.plus(side, 1.0);
                }
                self.constrain(any, ComparisonOp::Ge, Affine::default().plus_const(1.0));
            }
        }
    }

    /// Interchangeable spaces keep their x order.
    fn break_symmetry(&mut self) {
        let inst = self.inst;
        for &(a, b) in &inst.twins {
            let (xa, xb) = (self.spaces[a].x, self.spaces[b].x);
            self.constrain(Affine::var(xa), ComparisonOp::Le, Affine::var(xb));
        }
    }

    /// Doubled centre distance of each desired pair.
    fn pair_distances(&mut self, pairs: &[(usize, usize)], cost: f64) {
        for &(a, b) in pairs {
            let (dx, dy) = self.center_diffs(a, b);
            self.abs_bound(&dx, cost);
            self.abs_bound(&dy, cost);
        }
    }

    /// Penalty `max(0, 2 * max_dim - distance)` per conflicting core pair.
    fn core_proximity(&mut self) {
        let inst = self.inst;
        let reach = 2.0 * inst.max_dim as f64;
        for &(a, b) in &inst.conflicts {
            let (dx, dy) = self.center_diffs(a, b);
            let dx = self.abs_exact(&dx);
            let dy = self.abs_exact(&dy);
            let prox = self.problem.add_var(CORE_PROXIMITY_WEIGHT, (0.0, reach));
            self.constrain(
                Affine::var(prox).plus(dx, 1.0).plus(dy, 1.0),
                ComparisonOp::Ge,
                Affine::default().plus_const(reach),
            );
        }
    }

    /// Distance from each non-core space to its nearest stair and nearest
    /// elevator on the same floor.
    fn circulation(&mut self) {
        let inst = self.inst;
        let big = 2.0 * self.span;
        for kind in [CoreType::Stair, CoreType::Elevator] {
            for (i, space) in inst.spaces.iter().enumerate() {
                if space.core != CoreType::Generic {
                    continue;
                }
                let floor = space.floor;
                let targets: Vec<usize> = inst
                    .spaces
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.core == kind && s.floor == floor)
                    .map(|(j, _)| j)
                    .collect();
                if targets.is_empty() {
                    continue;
                }

                let nearest = self.problem.add_var(CIRCULATION_WEIGHT, (0.0, big));
                let single = targets.len() == 1;
                let mut chosen = Affine::default();
                for j in targets {
                    let (dx, dy) = self.center_diffs(i, j);
                    let dx = self.abs_bound(&dx, 0.0);
                    let dy = self.abs_bound(&dy, 0.0);
                    let dist = Affine::var(dx).plus(dy, 1.0);
                    if single {
                        self.constrain(Affine::var(nearest), ComparisonOp::Ge, dist);
                    } else {
                        // nearest >= dist - big * (1 - pick)
                        let pick = self.binary(0.0, Rank::Auxiliary);
                        self.constrain(
                            Affine::var(nearest).plus_const(big).plus(pick, -big),
                            ComparisonOp::Ge,
                            dist,
                        );
                        chosen = chosen.plus(pick, 1.0);
                    }
                }
                if !single {
                    self.constrain(chosen, ComparisonOp::Eq, Affine::default().plus_const(1.0));
                }
            }
        }
    }

    fn placements(&self, solution: &Solution) -> Vec<GridPlacement> {
        self.spaces
            .iter()
            .zip(&self.inst.spaces)
            .map(|(vars, space)| {
                let picked = vars
                    .select
                    .iter()
                    .zip(&space.shapes)
                    .max_by(|a, b| solution[*a.0].total_cmp(&solution[*b.0]))
                    .map(|(_, shape)| *shape);
                let (w, h) = picked.map_or((1, 1), |s| (s.w, s.h));
                GridPlacement {
                    x: solution[vars.x].round() as i64,
                    y: solution[vars.y].round() as i64,
                    w,
                    h,
                }
            })
            .collect()
    }
}

/// Builds and solves the model within `budget`.
///
/// `Ok(None)` means the budget ran out before any layout was found.
pub(crate) fn solve_instance(
    inst: &CpInstance,
    budget: &Budget,
) -> Result<Option<Solved>, microlp::Error> {
    let mut builder = ModelBuilder::new(inst);
    builder.one_shape_each();
    builder.no_overlap();
    builder.break_symmetry();
    builder.bounding_box();
    builder.pair_distances(&inst.desired, PAIR_WEIGHT);
    builder.core_proximity();
    builder.pair_distances(&inst.stacks, CORE_STACK_WEIGHT);
    if inst.circulation {
        builder.circulation();
    }
    tracing::debug!(
        spaces = inst.len(),
        integers = builder.integers.len(),
        "Integer model built"
    );

    let outcome = branch_and_bound(&builder.problem, &builder.integers, budget)?;
    match outcome.best {
        Some(solution) => {
            tracing::debug!(
                objective = solution.objective(),
                optimal = outcome.complete,
                nodes = outcome.nodes,
                "Integer model solved"
            );
            Ok(Some(Solved {
                placements: builder.placements(&solution),
                optimal: outcome.complete,
            }))
        }
        None if outcome.complete => Err(microlp::Error::Infeasible),
        None => Ok(None),
    }
}
