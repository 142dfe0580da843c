//! The solving engine collaborator.
//!
//! The model layer never touches solver internals.  It talks to an engine
//! model through the [`SolvingEngine`] trait, which mirrors the C-style API
//! of a native simplex library: bulk row/column loading, raw vector handles
//! that may move after any structural call, a status-code returning solve.
//!
//! [`MemoryEngine`] is the engine shipped with this crate.  It keeps every
//! vector in a [`NativeBlock`], stores the constraint matrix in CSC form and
//! solves through a conic reformulation handed to Clarabel.

use crate::algebra::NativeBlock;
use std::path::Path;
use thiserror::Error;

mod conic;
mod csc;
pub use csc::CscStore;
mod memory_model;
pub use memory_model::*;
mod settings;
pub use settings::*;
#[cfg(feature = "serde")]
mod json;

/// Largest representable bound.  The engine stores infinite bounds as
/// `±ENGINE_INFINITY` on its bulk loading paths.
pub const ENGINE_INFINITY: f64 = f64::MAX;

/// Bounds of at least this magnitude are treated as infinite when solving.
pub const INFINITY_THRESHOLD: f64 = 1e30;

/// Engine status code: optimal solution found.
pub const STATUS_OPTIMAL: i32 = 0;
/// Engine status code: primal infeasible.
pub const STATUS_INFEASIBLE: i32 = 1;
/// Engine status code: unbounded (dual infeasible).
pub const STATUS_UNBOUNDED: i32 = 2;
/// Engine status code: iteration or time limit reached.
pub const STATUS_LIMIT: i32 = 3;
/// Engine status code: numerical failure.
pub const STATUS_ERROR: i32 = 4;
/// Engine status code: no solve attempted / unrecognised outcome.
pub const STATUS_UNKNOWN: i32 = 5;

/// Error type returned by engine model operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Array lengths are incompatible with each other or the model size
    #[error("Array lengths are incompatible with the model dimensions")]
    IncompatibleDimension,
    /// A row or column index refers past the end of the model
    #[error("{kind} index {index} out of range for dimension {dim}")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        dim: usize,
    },
    /// The solve backend refused the problem data
    #[error("Solve backend error: {0}")]
    Backend(String),
    /// Failure reading or writing a model file
    #[error("Model file I/O error")]
    Io(#[from] std::io::Error),
    /// A model file could not be (de)serialized
    #[cfg(feature = "serde")]
    #[error("Malformed model file")]
    Serialization(#[from] serde_json::Error),
}

/// Handles to the `f64` vectors held by an engine model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VectorKind {
    /// objective coefficients, one per column
    Objective,
    /// column lower bounds
    ColLower,
    /// column upper bounds
    ColUpper,
    /// row lower bounds
    RowLower,
    /// row upper bounds
    RowUpper,
    /// CSC values of the constraint matrix
    Elements,
    /// primal column solution
    Primal,
    /// dual row solution
    Dual,
}

/// Operations consumed from a native solving engine.
///
/// Index vectors are passed as `usize` slices and stored natively as `i32`.
/// Handles returned by [`vector`](SolvingEngine::vector) and friends are only
/// valid until the next structural call (`resize`, `add_rows`, `add_columns`,
/// `load_quadratic_objective`, `restore_model`).
pub trait SolvingEngine: Sized {
    /// Create an empty model (0 rows, 0 columns).
    fn new_model(settings: EngineSettings) -> Self;

    fn settings(&self) -> &EngineSettings;
    fn settings_mut(&mut self) -> &mut EngineSettings;

    fn num_rows(&self) -> usize;
    fn num_cols(&self) -> usize;
    fn num_elements(&self) -> usize;

    /// Grow or shrink the model to `rows` x `cols`.
    fn resize(&mut self, rows: usize, cols: usize);

    /// Append `lower.len()` rows given in CSR form.
    fn add_rows(
        &mut self,
        lower: &[f64],
        upper: &[f64],
        starts: &[usize],
        columns: &[usize],
        elements: &[f64],
    ) -> Result<(), EngineError>;

    /// Append `lower.len()` columns given in CSC form.
    #[allow(clippy::too_many_arguments)]
    fn add_columns(
        &mut self,
        lower: &[f64],
        upper: &[f64],
        objective: &[f64],
        starts: &[usize],
        rows: &[usize],
        elements: &[f64],
    ) -> Result<(), EngineError>;

    /// Replace the quadratic objective with the CSC matrix given.  The
    /// objective contributes `½ xᵀQx`.
    fn load_quadratic_objective(
        &mut self,
        starts: &[usize],
        columns: &[usize],
        elements: &[f64],
    ) -> Result<(), EngineError>;

    /// The quadratic objective currently loaded, if any.
    fn quadratic_objective(&self) -> Option<&CscStore>;

    /// Current handle for a vector block.
    fn vector(&self, kind: VectorKind) -> &NativeBlock;
    /// Current mutable handle for a vector block.
    fn vector_mut(&mut self, kind: VectorKind) -> &mut NativeBlock;

    /// CSC row indices of the constraint matrix (`i32`, one per element).
    fn indices(&self) -> &NativeBlock;
    /// CSC column starts of the constraint matrix (`i32`, columns + 1).
    fn vector_starts(&self) -> &NativeBlock;

    /// Solve from scratch and return a status code.
    fn initial_solve(&mut self) -> i32;
    /// Status code of the last solve.
    fn status(&self) -> i32;
    /// Objective value of the last solve, net of the objective offset.
    fn objective_value(&self) -> f64;

    fn set_objective_offset(&mut self, offset: f64);
    fn objective_offset(&self) -> f64;

    /// Record the optimization direction (1 minimize, -1 maximize).  The
    /// stored objective is always in minimization form.
    fn set_objective_sense(&mut self, sense: f64);
    fn objective_sense(&self) -> f64;

    fn set_log_level(&mut self, level: u32) {
        self.settings_mut().log_level = level;
    }

    /// Write the model to `path`.
    fn save_model(&self, path: &Path) -> Result<(), EngineError>;
    /// Replace the model by the one stored at `path`.
    fn restore_model(&mut self, path: &Path) -> Result<(), EngineError>;
}

/// Replace IEEE infinities by the engine's finite sentinel.
#[inline]
pub(crate) fn clamp_infinite(v: f64) -> f64 {
    if v >= ENGINE_INFINITY {
        ENGINE_INFINITY
    } else if v <= -ENGINE_INFINITY {
        -ENGINE_INFINITY
    } else {
        v
    }
}

/// True for bounds the solve backend treats as absent.
#[inline]
pub fn is_infinite_bound(v: f64) -> bool {
    v.abs() >= INFINITY_THRESHOLD
}
