#![allow(non_snake_case)]

//! Conic reformulation of an engine model, solved by Clarabel.
//!
//! The engine model
//! ```text
//! min  cᵀx + ½xᵀQx
//! s.t. rl ≤ Ax ≤ ru,   cl ≤ x ≤ cu
//! ```
//! is rewritten as `Ax + s = b, s ∈ K` with `K` a zero cone (equality rows
//! and fixed columns) followed by a nonnegative cone (one row for every
//! finite one-sided bound).

use super::*;
use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettings, DefaultSettingsBuilder, DefaultSolver, IPSolver, NonnegativeConeT,
    SolverStatus, SupportedConeT, ZeroConeT,
};

pub(crate) struct ConicSolution {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// `cᵀx + ½xᵀQx`, before the objective offset is applied
    pub objective: f64,
    pub status: i32,
}

// One row of the conic constraint `a x + s = b`.
#[derive(Debug, Clone, Copy)]
enum Origin {
    Row(usize),
    Column(usize),
}

#[derive(Debug, Clone, Copy)]
struct ConicRow {
    origin: Origin,
    sign: f64,
    rhs: f64,
}

// conic row numbers attached to one engine row
#[derive(Debug, Clone, Copy, Default)]
struct RowMap {
    equality: Option<usize>,
    upper: Option<usize>,
    lower: Option<usize>,
}

fn split(origin: Origin, lo: f64, hi: f64, zero: &mut Vec<ConicRow>, nonneg: &mut Vec<ConicRow>) {
    let (has_lo, has_hi) = (!is_infinite_bound(lo), !is_infinite_bound(hi));
    if has_lo && has_hi && lo == hi {
        zero.push(ConicRow {
            origin,
            sign: 1.,
            rhs: hi,
        });
        return;
    }
    if has_hi {
        nonneg.push(ConicRow {
            origin,
            sign: 1.,
            rhs: hi,
        });
    }
    if has_lo {
        nonneg.push(ConicRow {
            origin,
            sign: -1.,
            rhs: -lo,
        });
    }
}

struct Reformulation {
    rows: Vec<ConicRow>,
    nzero: usize,
    row_map: Vec<RowMap>,
}

impl Reformulation {
    fn new(engine: &MemoryEngine) -> Self {
        let rl = engine.row_lower.to_vec::<f64>(engine.num_rows);
        let ru = engine.row_upper.to_vec::<f64>(engine.num_rows);
        let cl = engine.col_lower.to_vec::<f64>(engine.num_cols);
        let cu = engine.col_upper.to_vec::<f64>(engine.num_cols);

        let mut zero = Vec::new();
        let mut nonneg = Vec::new();

        for i in 0..engine.num_rows {
            split(Origin::Row(i), rl[i], ru[i], &mut zero, &mut nonneg);
        }
        for j in 0..engine.num_cols {
            split(Origin::Column(j), cl[j], cu[j], &mut zero, &mut nonneg);
        }

        let nzero = zero.len();
        let rows: Vec<ConicRow> = zero.into_iter().chain(nonneg).collect();

        let mut row_map = vec![RowMap::default(); engine.num_rows];
        for (k, row) in rows.iter().enumerate() {
            if let Origin::Row(i) = row.origin {
                let map = &mut row_map[i];
                if k < nzero {
                    map.equality = Some(k);
                } else if row.sign > 0. {
                    map.upper = Some(k);
                } else {
                    map.lower = Some(k);
                }
            }
        }

        Self {
            rows,
            nzero,
            row_map,
        }
    }

    fn cones(&self) -> Vec<SupportedConeT<f64>> {
        let nnonneg = self.rows.len() - self.nzero;
        let mut cones = Vec::with_capacity(2);
        if self.nzero > 0 {
            cones.push(ZeroConeT(self.nzero));
        }
        if nnonneg > 0 {
            cones.push(NonnegativeConeT(nnonneg));
        }
        cones
    }

    fn rhs(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.rhs).collect()
    }

    // conic constraint matrix, columns sorted by row with no repeats
    fn matrix(&self, A: &CscStore) -> CscMatrix<f64> {
        let n = A.n;

        // conic rows carrying a column bound, grouped by column
        let mut bound_rows: Vec<Vec<(usize, f64)>> = vec![vec![]; n];
        for (k, row) in self.rows.iter().enumerate() {
            if let Origin::Column(j) = row.origin {
                bound_rows[j].push((k, row.sign));
            }
        }

        let mut colptr = Vec::with_capacity(n + 1);
        let mut rowval = Vec::new();
        let mut nzval = Vec::new();
        colptr.push(0);

        for (col, bounds) in bound_rows.iter().enumerate() {
            let mut entries: Vec<(usize, f64)> = bounds.clone();
            for (i, v) in A.canonical_column(col, |_| true) {
                if v == 0. {
                    continue;
                }
                let map = &self.row_map[i];
                if let Some(k) = map.equality {
                    entries.push((k, v));
                }
                if let Some(k) = map.upper {
                    entries.push((k, v));
                }
                if let Some(k) = map.lower {
                    entries.push((k, -v));
                }
            }
            entries.sort_by_key(|&(k, _)| k);
            for (k, v) in entries {
                rowval.push(k);
                nzval.push(v);
            }
            colptr.push(rowval.len());
        }

        CscMatrix::new(self.rows.len(), n, colptr, rowval, nzval)
    }

    // row duals in the engine's sign convention
    fn row_duals(&self, z: &[f64]) -> Vec<f64> {
        self.row_map
            .iter()
            .map(|map| match map.equality {
                Some(k) => -z[k],
                None => {
                    let lo = map.lower.map_or(0., |k| z[k]);
                    let up = map.upper.map_or(0., |k| z[k]);
                    lo - up
                }
            })
            .collect()
    }
}

// upper triangle of the (symmetric) quadratic objective
fn hessian(engine: &MemoryEngine) -> CscMatrix<f64> {
    let n = engine.num_cols;
    let Q = match engine.quadratic_objective() {
        Some(Q) => Q,
        None => return CscMatrix::spalloc((n, n), 0),
    };

    let mut colptr = Vec::with_capacity(n + 1);
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();
    colptr.push(0);
    for col in 0..n {
        for (row, v) in Q.canonical_column(col, |row| row <= col) {
            rowval.push(row);
            nzval.push(v);
        }
        colptr.push(rowval.len());
    }
    CscMatrix::new(n, n, colptr, rowval, nzval)
}

fn backend_settings(settings: &EngineSettings) -> Result<DefaultSettings<f64>, EngineError> {
    DefaultSettingsBuilder::default()
        .max_iter(settings.max_iterations)
        .time_limit(settings.max_seconds)
        .verbose(settings.log_level > 0)
        .tol_feas(settings.primal_tolerance)
        .tol_gap_abs(settings.dual_tolerance)
        .tol_gap_rel(settings.dual_tolerance)
        .presolve_enable(settings.presolve)
        .equilibrate_enable(settings.scaling.is_enabled())
        .build()
        .map_err(|e| EngineError::Backend(e.to_string()))
}

pub(crate) fn status_code(status: SolverStatus) -> i32 {
    match status {
        SolverStatus::Solved | SolverStatus::AlmostSolved => STATUS_OPTIMAL,
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            STATUS_INFEASIBLE
        }
        SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => STATUS_UNBOUNDED,
        SolverStatus::MaxIterations | SolverStatus::MaxTime => STATUS_LIMIT,
        SolverStatus::NumericalError | SolverStatus::InsufficientProgress => STATUS_ERROR,
        _ => STATUS_UNKNOWN,
    }
}

/// `cᵀx + ½xᵀQx`, reading only the upper triangle of `Q`.
pub(crate) fn objective_value(engine: &MemoryEngine, x: &[f64]) -> f64 {
    let c = engine.objective.to_vec::<f64>(engine.num_cols);
    let mut obj: f64 = c.iter().zip(x).map(|(c, x)| c * x).sum();

    if let Some(Q) = engine.quadratic_objective() {
        for col in 0..Q.n {
            for (row, v) in Q.canonical_column(col, |row| row <= col) {
                if row == col {
                    obj += 0.5 * v * x[col] * x[col];
                } else {
                    obj += v * x[row] * x[col];
                }
            }
        }
    }
    obj
}

pub(crate) fn solve(engine: &MemoryEngine) -> Result<ConicSolution, EngineError> {
    let form = Reformulation::new(engine);

    let P = hessian(engine);
    let q = engine.objective.to_vec::<f64>(engine.num_cols);
    let A = form.matrix(&engine.matrix());
    let b = form.rhs();
    let cones = form.cones();
    let settings = backend_settings(&engine.settings)?;

    log::debug!(
        "conic solve: {} variables, {} cone rows ({} zero), {} nonzeros",
        A.n,
        A.m,
        form.nzero,
        A.nnz()
    );

    let mut solver = DefaultSolver::new(&P, &q, &A, &b, &cones, settings)
        .map_err(|e| EngineError::Backend(e.to_string()))?;
    solver.solve();

    let status = status_code(solver.solution.status);
    let x = solver.solution.x.clone();
    let y = form.row_duals(&solver.solution.z);
    let objective = objective_value(engine, &x);

    Ok(ConicSolution {
        x,
        y,
        objective,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> MemoryEngine {
        MemoryEngine::new_model(EngineSettings::default())
    }

    #[test]
    fn test_reformulation_splits_bounds() {
        let mut engine = engine();
        engine.resize(0, 2);
        // x0 + x1 = 1 ; 0 <= x0 - x1 <= 2 ; free row
        engine
            .add_rows(
                &[1., 0., f64::NEG_INFINITY],
                &[1., 2., f64::INFINITY],
                &[0, 2, 4, 5],
                &[0, 1, 0, 1, 0],
                &[1., 1., 1., -1., 1.],
            )
            .unwrap();

        let form = Reformulation::new(&engine);
        // 1 equality, 2 row halves, 2 column lower bounds
        assert_eq!(form.nzero, 1);
        assert_eq!(form.rows.len(), 5);
        assert!(form.row_map[2].upper.is_none() && form.row_map[2].lower.is_none());

        let A = form.matrix(&engine.matrix());
        assert_eq!(A.m, 5);
        assert_eq!(A.nnz(), 8);
        assert_eq!(form.rhs(), vec![1., 2., -0., -0., -0.]);
    }

    #[test]
    fn test_row_duals_sign() {
        let form = Reformulation {
            rows: vec![],
            nzero: 1,
            row_map: vec![
                RowMap {
                    equality: Some(0),
                    ..Default::default()
                },
                RowMap {
                    upper: Some(1),
                    lower: Some(2),
                    ..Default::default()
                },
            ],
        };
        assert_eq!(form.row_duals(&[3., 1., 0.5]), vec![-3., -0.5]);
    }

    #[test]
    fn test_objective_value_reads_upper_triangle() {
        let mut engine = engine();
        engine.resize(0, 2);
        engine.objective.view_mut::<f64>().copy_from_slice(&[1., 1.]);
        // Q = [2 1; 1 4], stored in full
        engine
            .load_quadratic_objective(&[0, 2, 4], &[0, 1, 0, 1], &[2., 1., 1., 4.])
            .unwrap();

        // x = (1,1): 2 + ½(2 + 2 + 4) = 6
        let obj = objective_value(&engine, &[1., 1.]);
        assert!(f64::abs(obj - 6.) <= 1e-12);
    }

    #[test]
    fn test_solve_small_lp() {
        // max x0 + x1  s.t. x0 + 2 x1 <= 4, x0 <= 3
        let mut engine = engine();
        engine.resize(0, 2);
        engine.objective.view_mut::<f64>().copy_from_slice(&[-1., -1.]);
        engine.col_upper.view_mut::<f64>().set(0, 3.);
        engine
            .add_rows(&[f64::NEG_INFINITY], &[4.], &[0, 2], &[0, 1], &[1., 2.])
            .unwrap();

        let sol = solve(&engine).unwrap();
        assert_eq!(sol.status, STATUS_OPTIMAL);
        assert!(f64::abs(sol.x[0] - 3.) <= 1e-6);
        assert!(f64::abs(sol.x[1] - 0.5) <= 1e-6);
        assert!(f64::abs(sol.objective + 3.5) <= 1e-6);
        // binding <= row in a minimisation has a nonpositive dual
        assert!(f64::abs(sol.y[0] + 0.5) <= 1e-5);
    }

    #[test]
    fn test_scaling_modes() {
        for (scaling, enabled) in [
            (Scaling::Off, false),
            (Scaling::Equilibrium, true),
            (Scaling::Geometric, true),
            (Scaling::Auto, true),
        ] {
            let settings = EngineSettingsBuilder::default()
                .scaling(scaling)
                .build()
                .unwrap();
            let backend = backend_settings(&settings).unwrap();
            assert_eq!(backend.equilibrate_enable, enabled);
        }
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_code(SolverStatus::AlmostSolved), STATUS_OPTIMAL);
        assert_eq!(status_code(SolverStatus::MaxTime), STATUS_LIMIT);
        assert_eq!(status_code(SolverStatus::Unsolved), STATUS_UNKNOWN);
    }
}
