//! Incremental model building on top of a [`SolvingEngine`].
//!
//! New variables and constraints are staged in lightweight buffers and
//! committed to the engine in batches.  A flush happens when a buffer
//! reaches [`ModelSettings::buffer_size`], or when an operation needs the
//! committed state (solving, reading a solution, rendering the model).
//! Coefficients that are already committed are overwritten in place.
//!
//! Handles are plain indices.  A setter given a handle this model never
//! issued leaves the model unchanged, a getter reads it as NaN, and the
//! fallible operations reject it with [`ModelError::InvalidArgument`].
//!
//! ```
//! use lpmodel::model::{ConstraintKind, Model, SolveStatus};
//!
//! let mut model = Model::new();
//! let x = model.add_variable();
//! let y = model.add_variable();
//! model.set_objective_coefficient(x, 1.);
//! model.set_objective_coefficient(y, 2.);
//! model.add_constraint(&[(x, 1.), (y, 1.)], ConstraintKind::Leq, 4.).unwrap();
//!
//! assert_eq!(model.maximize().unwrap(), SolveStatus::Optimal);
//! assert!(f64::abs(model.objective_value() - 8.) <= 1e-6);
//! ```

use crate::algebra::Normalizer;
use crate::engine::*;
use std::collections::HashMap;
use std::path::Path;

mod error;
pub use error::*;
mod expression;
pub use expression::*;
mod flush;
mod handles;
pub use handles::*;
mod locator;
mod lpformat;
mod quadratic;
mod settings;
pub use settings::*;
mod staging;
mod view;

use handles::Slot;
use quadratic::QuadraticDiagonal;
use staging::{ColumnBuffer, RowBuffer};
use view::NativeMatrixView;

/// A linear / diagonally quadratic optimization model.
#[derive(Debug)]
pub struct Model<E = MemoryEngine>
where
    E: SolvingEngine,
{
    settings: ModelSettings,
    normalizer: Normalizer,

    var_names: HashMap<usize, String>,
    ctr_names: HashMap<usize, String>,

    // totals, staged entities included
    num_cols: usize,
    num_rows: usize,

    maximize: bool,
    offset: f64,
    objective_value: f64,

    columns: ColumnBuffer,
    rows: RowBuffer,
    quadratic: Option<QuadraticDiagonal>,
    view: NativeMatrixView<E>,
}

impl Model<MemoryEngine> {
    /// An empty model with default settings.
    pub fn new() -> Self {
        Self::with_settings(ModelSettings::default(), EngineSettings::default())
    }
}

impl Default for Model<MemoryEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Model<E>
where
    E: SolvingEngine,
{
    pub fn with_settings(settings: ModelSettings, engine_settings: EngineSettings) -> Self {
        let normalizer = Normalizer::new(settings.smallest_element);
        Self {
            settings,
            normalizer,
            var_names: HashMap::new(),
            ctr_names: HashMap::new(),
            num_cols: 0,
            num_rows: 0,
            maximize: false,
            offset: 0.,
            objective_value: f64::NAN,
            columns: ColumnBuffer::default(),
            rows: RowBuffer::default(),
            quadratic: None,
            view: NativeMatrixView::new(E::new_model(engine_settings)),
        }
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn engine_settings(&self) -> &EngineSettings {
        self.view.engine().settings()
    }

    /// The engine model holding the committed state.
    pub fn engine(&self) -> &E {
        self.view.engine()
    }

    #[inline]
    fn normalize(&self, x: f64) -> f64 {
        self.normalizer.normalize(x)
    }

    #[inline]
    fn column_slot(&self, var: Variable) -> Slot {
        Slot::resolve(var.index, self.view.num_cols)
    }

    #[inline]
    fn row_slot(&self, ctr: Constraint) -> Slot {
        Slot::resolve(ctr.index, self.view.num_rows)
    }

    // Setters ignore handles this model never issued and getters read them
    // as NaN.
    fn owns_variable(&self, var: Variable) -> bool {
        let owned = var.index < self.num_cols;
        if !owned {
            log::warn!("variable index {} is not part of this model", var.index);
        }
        owned
    }

    fn owns_constraint(&self, ctr: Constraint) -> bool {
        let owned = ctr.index < self.num_rows;
        if !owned {
            log::warn!("constraint index {} is not part of this model", ctr.index);
        }
        owned
    }

    // objective coefficients are stored as if minimising
    #[inline]
    fn sense(&self) -> f64 {
        if self.maximize {
            -1.
        } else {
            1.
        }
    }

    // ---------------------------------------------------------
    // variables
    // ---------------------------------------------------------

    /// Add a variable with objective 0 and bounds `[0, ∞)`.
    pub fn add_variable(&mut self) -> Variable {
        if self.columns.len() >= self.settings.buffer_size {
            self.append_columns();
        }
        self.columns.add_column();
        let var = Variable {
            index: self.num_cols,
        };
        self.num_cols += 1;
        var
    }

    /// Start building `size` variables sharing bounds, objective and a name
    /// prefix.
    pub fn add_variables(&mut self, size: usize) -> VariableSet<'_, E> {
        VariableSet::new(self, size)
    }

    pub fn num_variables(&self) -> usize {
        self.num_cols
    }

    pub fn set_variable_bounds(&mut self, var: Variable, lb: f64, ub: f64) {
        if !self.owns_variable(var) {
            return;
        }
        let (lb, ub) = (self.normalize(lb), self.normalize(ub));
        match self.column_slot(var) {
            Slot::Committed { index } => {
                self.view.set(VectorKind::ColLower, index, lb);
                self.view.set(VectorKind::ColUpper, index, ub);
            }
            Slot::Staged { offset } => {
                self.columns.lower.insert(offset, lb);
                self.columns.upper.insert(offset, ub);
            }
        }
    }

    pub fn set_variable_lower_bound(&mut self, var: Variable, value: f64) {
        if !self.owns_variable(var) {
            return;
        }
        let value = self.normalize(value);
        match self.column_slot(var) {
            Slot::Committed { index } => self.view.set(VectorKind::ColLower, index, value),
            Slot::Staged { offset } => {
                self.columns.lower.insert(offset, value);
            }
        }
    }

    pub fn set_variable_upper_bound(&mut self, var: Variable, value: f64) {
        if !self.owns_variable(var) {
            return;
        }
        let value = self.normalize(value);
        match self.column_slot(var) {
            Slot::Committed { index } => self.view.set(VectorKind::ColUpper, index, value),
            Slot::Staged { offset } => {
                self.columns.upper.insert(offset, value);
            }
        }
    }

    /// Remove both bounds of a variable.
    pub fn free_variable(&mut self, var: Variable) {
        self.set_variable_bounds(var, f64::NEG_INFINITY, f64::INFINITY);
    }

    pub fn variable_lower_bound(&self, var: Variable) -> f64 {
        if !self.owns_variable(var) {
            return f64::NAN;
        }
        match self.column_slot(var) {
            Slot::Committed { index } => from_sentinel(self.view.get(VectorKind::ColLower, index)),
            Slot::Staged { offset } => self.columns.lower_bound(offset),
        }
    }

    pub fn variable_upper_bound(&self, var: Variable) -> f64 {
        if !self.owns_variable(var) {
            return f64::NAN;
        }
        match self.column_slot(var) {
            Slot::Committed { index } => from_sentinel(self.view.get(VectorKind::ColUpper, index)),
            Slot::Staged { offset } => self.columns.upper_bound(offset),
        }
    }

    pub fn set_variable_name(&mut self, var: Variable, name: impl Into<String>) {
        self.var_names.insert(var.index, name.into());
    }

    /// The variable's name, `x_<index>` unless one was set.
    pub fn variable_name(&self, var: Variable) -> String {
        self.column_name(var.index)
    }

    pub(crate) fn column_name(&self, index: usize) -> String {
        match self.var_names.get(&index) {
            Some(name) => name.clone(),
            None => format!("x_{index}"),
        }
    }

    // ---------------------------------------------------------
    // objective
    // ---------------------------------------------------------

    pub fn set_objective_coefficient(&mut self, var: Variable, value: f64) {
        if !self.owns_variable(var) {
            return;
        }
        let value = self.sense() * self.normalize(value);
        match self.column_slot(var) {
            Slot::Committed { index } => self.view.set(VectorKind::Objective, index, value),
            Slot::Staged { offset } => {
                self.columns.objectives.insert(offset, value);
            }
        }
    }

    pub fn objective_coefficient(&self, var: Variable) -> f64 {
        if !self.owns_variable(var) {
            return f64::NAN;
        }
        let stored = match self.column_slot(var) {
            Slot::Committed { index } => self.view.get(VectorKind::Objective, index),
            Slot::Staged { offset } => self.columns.objective(offset),
        };
        self.sense() * stored
    }

    /// Set the coefficient `q` of the objective term `q·x²`.
    ///
    /// A maximising model rejects `q > 0`, a minimising one `q < 0`.
    pub fn set_quadratic_coefficient(&mut self, var: Variable, value: f64) -> Result<(), ModelError> {
        let value = self.normalize(value);
        if self.maximize && value > 0. {
            return Err(ModelError::invalid(format!(
                "Quadratic objective coefficient of variable {} must not be greater than zero.",
                self.variable_name(var)
            )));
        }
        if !self.maximize && value < 0. {
            return Err(ModelError::invalid(format!(
                "Quadratic objective coefficient of variable {} must not be less than zero.",
                self.variable_name(var)
            )));
        }
        self.check_variable(var)?;

        let stored = 2. * self.sense() * value;
        self.quadratic
            .get_or_insert_with(QuadraticDiagonal::default)
            .put(var.index, stored);
        Ok(())
    }

    pub fn quadratic_coefficient(&self, var: Variable) -> f64 {
        if !self.owns_variable(var) {
            return f64::NAN;
        }
        match &self.quadratic {
            Some(q) => 0.5 * self.sense() * q.get(var.index),
            None => 0.,
        }
    }

    pub fn set_objective_offset(&mut self, value: f64) {
        self.offset = self.normalize(value);
    }

    pub fn objective_offset(&self) -> f64 {
        self.offset
    }

    /// Set objective coefficients for the given terms and add `offset` to
    /// the objective constant.  Coefficients of other variables are kept.
    pub fn add_objective(&mut self, terms: &[(Variable, f64)], offset: f64) {
        for &(var, value) in terms {
            self.set_objective_coefficient(var, value);
        }
        self.set_objective_offset(self.offset + offset);
    }

    // ---------------------------------------------------------
    // constraints
    // ---------------------------------------------------------

    fn check_variable(&self, var: Variable) -> Result<(), ModelError> {
        if var.index < self.num_cols {
            Ok(())
        } else {
            Err(ModelError::invalid(format!(
                "Variable index {} is not part of this model.",
                var.index
            )))
        }
    }

    fn check_constraint(&self, ctr: Constraint) -> Result<(), ModelError> {
        if ctr.index < self.num_rows {
            Ok(())
        } else {
            Err(ModelError::invalid(format!(
                "Constraint index {} is not part of this model.",
                ctr.index
            )))
        }
    }

    /// Add the constraint `Σ coef·var (kind) rhs`.
    ///
    /// Every term reserves a structural entry, including terms whose
    /// coefficient is zero, so that it can be changed later.
    pub fn add_constraint(
        &mut self,
        terms: &[(Variable, f64)],
        kind: ConstraintKind,
        rhs: f64,
    ) -> Result<Constraint, ModelError> {
        if terms.is_empty() {
            return Err(ModelError::invalid("The constraint does not contain variables."));
        }
        for &(var, _) in terms {
            self.check_variable(var)?;
        }

        if self.rows.len() >= self.settings.buffer_size {
            self.flush_all()?;
        }
        self.rows.add_row(
            terms.iter().map(|&(var, value)| (var.index, value)),
            kind,
            rhs,
            &self.normalizer,
        );
        let ctr = Constraint {
            index: self.num_rows,
            kind,
        };
        self.num_rows += 1;
        Ok(ctr)
    }

    /// [`add_constraint`](Model::add_constraint) with the terms given as
    /// two parallel slices.
    pub fn add_constraint_from(
        &mut self,
        variables: &[Variable],
        coefficients: &[f64],
        kind: ConstraintKind,
        rhs: f64,
    ) -> Result<Constraint, ModelError> {
        if variables.len() != coefficients.len() {
            return Err(ModelError::invalid("Arrays of unequal size."));
        }
        let terms: Vec<(Variable, f64)> = variables
            .iter()
            .copied()
            .zip(coefficients.iter().copied())
            .collect();
        self.add_constraint(&terms, kind, rhs)
    }

    pub fn num_constraints(&self) -> usize {
        self.num_rows
    }

    fn structure_error(&self, ctr: Constraint, var: Variable) -> ModelError {
        ModelError::Structure {
            constraint: self.constraint_name(ctr),
            variable: self.variable_name(var),
        }
    }

    /// Overwrite the coefficient of `var` in `ctr`.  Fails with
    /// [`ModelError::Structure`] unless `var` was one of the terms the
    /// constraint was created with.
    pub fn set_constraint_coefficient(
        &mut self,
        ctr: Constraint,
        var: Variable,
        value: f64,
    ) -> Result<(), ModelError> {
        self.check_constraint(ctr)?;
        self.check_variable(var)?;
        let value = self.normalize(value);
        match self.row_slot(ctr) {
            Slot::Committed { index: row } => {
                let slot = match self.column_slot(var) {
                    Slot::Committed { index: col } => self.view.locate(row, col),
                    Slot::Staged { .. } => None,
                };
                match slot {
                    Some(k) => {
                        log::trace!("coefficient ({row}, {}) at element {k} set to {value}", var.index);
                        self.view.set(VectorKind::Elements, k, value);
                        Ok(())
                    }
                    None => Err(self.structure_error(ctr, var)),
                }
            }
            Slot::Staged { offset } => {
                if self.rows.set_element(offset, var.index, value) {
                    Ok(())
                } else {
                    Err(self.structure_error(ctr, var))
                }
            }
        }
    }

    /// Current coefficient of `var` in `ctr`.
    pub fn constraint_coefficient(&mut self, ctr: Constraint, var: Variable) -> Result<f64, ModelError> {
        self.check_constraint(ctr)?;
        self.check_variable(var)?;
        let value = match self.row_slot(ctr) {
            Slot::Committed { index: row } => match self.column_slot(var) {
                Slot::Committed { index: col } => self
                    .view
                    .locate(row, col)
                    .map(|k| self.view.get(VectorKind::Elements, k)),
                Slot::Staged { .. } => None,
            },
            Slot::Staged { offset } => self.rows.element(offset, var.index),
        };
        value.ok_or_else(|| self.structure_error(ctr, var))
    }

    fn write_row_bounds(&mut self, ctr: Constraint, lb: Option<f64>, ub: Option<f64>) {
        if !self.owns_constraint(ctr) {
            return;
        }
        let lb = lb.map(|v| self.normalize(v));
        let ub = ub.map(|v| self.normalize(v));
        match self.row_slot(ctr) {
            Slot::Committed { index } => {
                if let Some(lb) = lb {
                    self.view.set(VectorKind::RowLower, index, lb);
                }
                if let Some(ub) = ub {
                    self.view.set(VectorKind::RowUpper, index, ub);
                }
            }
            Slot::Staged { offset } => self.rows.set_bounds(offset, lb, ub),
        }
    }

    pub fn set_constraint_bounds(&mut self, ctr: Constraint, lb: f64, ub: f64) {
        self.write_row_bounds(ctr, Some(lb), Some(ub));
    }

    pub fn set_constraint_lower_bound(&mut self, ctr: Constraint, value: f64) {
        self.write_row_bounds(ctr, Some(value), None);
    }

    pub fn set_constraint_upper_bound(&mut self, ctr: Constraint, value: f64) {
        self.write_row_bounds(ctr, None, Some(value));
    }

    /// Set the right-hand side according to the constraint's kind.  Free
    /// constraints are left unchanged.
    pub fn set_rhs(&mut self, ctr: Constraint, rhs: f64) {
        match ctr.kind {
            ConstraintKind::Eq => self.set_constraint_bounds(ctr, rhs, rhs),
            ConstraintKind::Geq => self.set_constraint_lower_bound(ctr, rhs),
            ConstraintKind::Leq => self.set_constraint_upper_bound(ctr, rhs),
            ConstraintKind::Free => {}
        }
    }

    /// Remove both bounds of a constraint.
    pub fn free_constraint(&mut self, ctr: Constraint) {
        self.set_constraint_bounds(ctr, f64::NEG_INFINITY, f64::INFINITY);
    }

    pub fn constraint_lower_bound(&self, ctr: Constraint) -> f64 {
        if !self.owns_constraint(ctr) {
            return f64::NAN;
        }
        match self.row_slot(ctr) {
            Slot::Committed { index } => from_sentinel(self.view.get(VectorKind::RowLower, index)),
            Slot::Staged { offset } => self.rows.lower[offset],
        }
    }

    pub fn constraint_upper_bound(&self, ctr: Constraint) -> f64 {
        if !self.owns_constraint(ctr) {
            return f64::NAN;
        }
        match self.row_slot(ctr) {
            Slot::Committed { index } => from_sentinel(self.view.get(VectorKind::RowUpper, index)),
            Slot::Staged { offset } => self.rows.upper[offset],
        }
    }

    pub fn set_constraint_name(&mut self, ctr: Constraint, name: impl Into<String>) {
        self.ctr_names.insert(ctr.index, name.into());
    }

    /// The constraint's name, `ctr_<index>` unless one was set.
    pub fn constraint_name(&self, ctr: Constraint) -> String {
        self.row_name(ctr.index)
    }

    pub(crate) fn row_name(&self, index: usize) -> String {
        match self.ctr_names.get(&index) {
            Some(name) => name.clone(),
            None => format!("ctr_{index}"),
        }
    }

    // ---------------------------------------------------------
    // direction and solving
    // ---------------------------------------------------------

    // flip every stored objective and quadratic coefficient
    fn negate_objective(&mut self) {
        self.view
            .engine_mut()
            .vector_mut(VectorKind::Objective)
            .view_mut::<f64>()
            .update(|c| -c);
        self.columns.negate_objectives();
        if let Some(q) = self.quadratic.as_mut() {
            q.negate();
        }
    }

    /// Treat the model as a maximisation problem.
    pub fn maximization(&mut self) -> &mut Self {
        if !self.maximize {
            self.negate_objective();
        }
        self.maximize = true;
        self
    }

    /// Treat the model as a minimisation problem.
    pub fn minimization(&mut self) -> &mut Self {
        if self.maximize {
            self.negate_objective();
        }
        self.maximize = false;
        self
    }

    pub fn is_maximization(&self) -> bool {
        self.maximize
    }

    /// Commit all staged data and solve.
    pub fn solve(&mut self) -> Result<SolveStatus, ModelError> {
        self.flush_all()?;
        let engine = self.view.engine_mut();

        log::debug!(
            "solving model with {} variables, {} constraints, {} elements",
            engine.num_cols(),
            engine.num_rows(),
            engine.num_elements()
        );
        let code = engine.initial_solve();
        self.objective_value = engine.objective_value();

        let status = SolveStatus::from_code(code);
        if status == SolveStatus::Error {
            log::warn!("solve finished with status {status}");
        } else {
            log::debug!("solve finished with status {status}");
        }
        Ok(status)
    }

    /// Solve as a maximisation problem.
    pub fn maximize(&mut self) -> Result<SolveStatus, ModelError> {
        self.maximization();
        self.solve()
    }

    /// Solve as a minimisation problem.
    pub fn minimize(&mut self) -> Result<SolveStatus, ModelError> {
        self.minimization();
        self.solve()
    }

    /// Objective value of the last solve, offset included.
    pub fn objective_value(&self) -> f64 {
        self.sense() * self.objective_value
    }

    /// Primal value of `var` in the last solution.
    pub fn solution(&mut self, var: Variable) -> Result<f64, ModelError> {
        self.check_variable(var)?;
        if var.index >= self.view.num_cols {
            self.flush_all()?;
        }
        Ok(self.view.get(VectorKind::Primal, var.index))
    }

    /// Dual value of `ctr` in the last solution.
    pub fn dual_solution(&mut self, ctr: Constraint) -> Result<f64, ModelError> {
        self.check_constraint(ctr)?;
        if ctr.index >= self.view.num_rows {
            self.flush_all()?;
        }
        Ok(self.sense() * self.view.get(VectorKind::Dual, ctr.index))
    }

    // ---------------------------------------------------------
    // settings
    // ---------------------------------------------------------

    /// Engine log level, 0 (none) through 4 (verbose).
    pub fn verbose(&mut self, level: u32) -> &mut Self {
        self.view.engine_mut().set_log_level(level);
        self
    }

    /// Number of staged variables or constraints that triggers a flush.
    pub fn buffer(&mut self, size: usize) -> &mut Self {
        self.settings.buffer_size = size;
        self
    }

    /// Coefficients below `value` in magnitude are stored as zero.  Values
    /// already stored are not revisited.
    pub fn smallest_coefficient(&mut self, value: f64) -> Result<&mut Self, ModelError> {
        if settings::validate_smallest_element(value).is_err() {
            return Err(ModelError::invalid("The smallest coefficient must be >= 0"));
        }
        self.settings.smallest_element = value;
        self.normalizer.set_epsilon(value);
        Ok(self)
    }

    // apply a change to the engine settings, reverting it if invalid
    fn update_engine_settings(
        &mut self,
        f: impl FnOnce(&mut EngineSettings),
    ) -> Result<&mut Self, ModelError> {
        let settings = self.view.engine_mut().settings_mut();
        let saved = settings.clone();
        f(&mut *settings);
        if let Err(e) = settings.validate() {
            *settings = saved;
            return Err(e.into());
        }
        Ok(self)
    }

    pub fn max_iterations(&mut self, iterations: u32) -> &mut Self {
        self.view.engine_mut().settings_mut().max_iterations = iterations;
        self
    }

    pub fn max_seconds(&mut self, seconds: f64) -> Result<&mut Self, ModelError> {
        self.update_engine_settings(|s| s.max_seconds = seconds)
    }

    pub fn primal_tolerance(&mut self, value: f64) -> Result<&mut Self, ModelError> {
        self.update_engine_settings(|s| s.primal_tolerance = value)
    }

    pub fn dual_tolerance(&mut self, value: f64) -> Result<&mut Self, ModelError> {
        self.update_engine_settings(|s| s.dual_tolerance = value)
    }

    pub fn presolve(&mut self, on: bool) -> &mut Self {
        self.view.engine_mut().settings_mut().presolve = on;
        self
    }

    pub fn scaling(&mut self, scaling: Scaling) -> &mut Self {
        self.view.engine_mut().settings_mut().scaling = scaling;
        self
    }

    // ---------------------------------------------------------
    // model files
    // ---------------------------------------------------------

    /// Commit all staged data and write the engine model to `path`.
    pub fn store_model(&mut self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        self.flush_all()?;
        self.view.engine().save_model(path.as_ref())?;
        Ok(())
    }

    /// Replace the model by one written with
    /// [`store_model`](Model::store_model).  Names are kept and staged
    /// data is discarded.
    pub fn restore_model(&mut self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        if let Err(e) = std::fs::File::open(path) {
            return Err(ModelError::Io(std::io::Error::new(
                e.kind(),
                format!("File '{}' does not exist or cannot be read.", path.display()),
            )));
        }
        self.view.engine_mut().restore_model(path)?;
        self.view.sync_counts();

        let engine = self.view.engine();
        self.maximize = engine.objective_sense() == -1.;
        self.offset = self.sense() * -engine.objective_offset();
        self.objective_value = engine.objective_value();
        self.quadratic = engine.quadratic_objective().map(|hessian| {
            let diagonal = (0..hessian.n)
                .map(|j| hessian.get_entry((j, j)).unwrap_or(0.))
                .collect();
            QuadraticDiagonal::from_committed(diagonal)
        });

        self.num_cols = self.view.num_cols;
        self.num_rows = self.view.num_rows;
        self.columns = ColumnBuffer::default();
        self.rows = RowBuffer::default();
        log::debug!(
            "restored model with {} variables, {} constraints from {}",
            self.num_cols,
            self.num_rows,
            path.display()
        );
        Ok(())
    }
}

// engine sentinels read back as IEEE infinities
#[inline]
pub(crate) fn from_sentinel(v: f64) -> f64 {
    if v >= ENGINE_INFINITY {
        f64::INFINITY
    } else if v <= -ENGINE_INFINITY {
        f64::NEG_INFINITY
    } else {
        v
    }
}
