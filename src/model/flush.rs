//! Moving staged data into the engine.

use super::{Model, ModelError};
use crate::engine::*;

impl<E> Model<E>
where
    E: SolvingEngine,
{
    /// Commit everything that is staged.
    ///
    /// The engine's direction and offset sign must match the model before
    /// anything is appended, and columns must exist before the rows that
    /// reference them.
    pub(crate) fn flush_all(&mut self) -> Result<(), ModelError> {
        let sense = self.sense();
        let engine = self.view.engine_mut();
        engine.set_objective_sense(sense);
        engine.set_objective_offset(-sense * self.offset);

        if !self.columns.is_empty() {
            self.append_columns();
        }
        if self.num_rows == 0 && self.num_cols > 0 {
            log::debug!("model has no constraints, adding a free dummy row");
            self.rows.add_dummy_row();
            self.num_rows += 1;
        }
        if !self.rows.is_empty() {
            self.append_rows()?;
        }
        self.push_quadratic()?;
        Ok(())
    }

    /// Grow the engine by the staged columns and write their explicit
    /// values.
    pub(crate) fn append_columns(&mut self) {
        let columns = std::mem::take(&mut self.columns);
        let first = self.view.num_cols;
        let total = first + columns.len();

        let rows = self.view.num_rows;
        self.view.engine_mut().resize(rows, total);

        // handles may have moved on resize
        for (&offset, &value) in &columns.objectives {
            self.view.set(VectorKind::Objective, first + offset, value);
        }
        for (&offset, &value) in &columns.lower {
            self.view.set(VectorKind::ColLower, first + offset, value);
        }
        for (&offset, &value) in &columns.upper {
            self.view.set(VectorKind::ColUpper, first + offset, value);
        }

        self.view.num_cols = total;
        self.view.invalidate();
        log::debug!("appended {} columns, {} committed", columns.len(), total);
    }

    /// Hand the staged rows to the engine in one batch.
    pub(crate) fn append_rows(&mut self) -> Result<(), ModelError> {
        let rows = &self.rows;
        self.view.engine_mut().add_rows(
            &rows.lower,
            &rows.upper,
            &rows.starts,
            &rows.columns,
            &rows.elements,
        )?;

        let rows = std::mem::take(&mut self.rows);
        let first = self.view.num_rows;

        // the bulk call stores infinities as the engine sentinel
        for (i, (&lb, &ub)) in rows.lower.iter().zip(&rows.upper).enumerate() {
            if lb == f64::NEG_INFINITY {
                self.view.set(VectorKind::RowLower, first + i, lb);
            }
            if ub == f64::INFINITY {
                self.view.set(VectorKind::RowUpper, first + i, ub);
            }
        }

        self.view.num_rows = first + rows.len();
        self.view.num_elements += rows.elements.len();
        self.view.invalidate();
        log::debug!(
            "appended {} rows with {} elements, {} committed",
            rows.len(),
            rows.elements.len(),
            self.view.num_rows
        );
        Ok(())
    }

    fn push_quadratic(&mut self) -> Result<(), ModelError> {
        let num_cols = self.view.num_cols;
        if let Some(diagonal) = self.quadratic.as_mut().and_then(|q| q.flush(num_cols)) {
            self.view.engine_mut().load_quadratic_objective(
                &diagonal.starts,
                &diagonal.columns,
                &diagonal.elements,
            )?;
            log::debug!("loaded quadratic diagonal over {num_cols} columns");
        }
        Ok(())
    }

    /// Rebuild the engine model from scratch.
    ///
    /// All staged data is committed first, then the complete committed
    /// state is copied into a fresh engine model in one bulk load, which
    /// compacts any fragmentation left by incremental appends.  The old
    /// engine model is dropped.
    pub fn rebuild(&mut self) -> Result<(), ModelError> {
        self.flush_all()?;

        let (m, n) = (self.view.num_rows, self.view.num_cols);
        let nnz = self.view.num_elements;

        let col_lower = self.view.read(VectorKind::ColLower, n);
        let col_upper = self.view.read(VectorKind::ColUpper, n);
        let objective = self.view.read(VectorKind::Objective, n);
        let row_lower = self.view.read(VectorKind::RowLower, m);
        let row_upper = self.view.read(VectorKind::RowUpper, m);
        let elements = self.view.read(VectorKind::Elements, nnz);

        self.view.invalidate();
        let (starts, rows) = self.view.index_caches();
        let (starts, rows) = (starts.to_vec(), rows.to_vec());

        let old = self.view.engine();
        let mut engine = E::new_model(old.settings().clone());
        engine.set_objective_offset(old.objective_offset());
        engine.set_objective_sense(old.objective_sense());
        engine.resize(m, 0);
        engine.add_columns(&col_lower, &col_upper, &objective, &starts, &rows, &elements)?;

        // bounds are copied verbatim, literal infinities included
        for (kind, values) in [
            (VectorKind::ColLower, &col_lower),
            (VectorKind::ColUpper, &col_upper),
            (VectorKind::RowLower, &row_lower),
            (VectorKind::RowUpper, &row_upper),
        ] {
            engine.vector_mut(kind).view_mut::<f64>().copy_from_slice(values);
        }

        if let Some(hessian) = old.quadratic_objective() {
            engine.load_quadratic_objective(&hessian.colptr, &hessian.rowval, &hessian.nzval)?;
        }

        drop(self.view.replace_engine(engine));
        log::debug!("rebuilt engine model: {m} rows, {n} columns, {nnz} elements");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_flush_order_and_dummy_row() {
        let mut model = Model::new();
        let x = model.add_variable();
        model.set_objective_coefficient(x, 1.);
        model.flush_all().unwrap();

        // the dummy row occupies row 0
        assert_eq!(model.num_constraints(), 1);
        assert_eq!(model.view.num_rows, 1);
        assert_eq!(model.view.num_elements, 1);
        assert_eq!(model.view.get(VectorKind::RowLower, 0), f64::NEG_INFINITY);
        assert_eq!(model.view.get(VectorKind::RowUpper, 0), f64::INFINITY);
        assert!(model.columns.is_empty() && model.rows.is_empty());

        // a second flush adds nothing
        model.flush_all().unwrap();
        assert_eq!(model.view.num_rows, 1);
    }

    #[test]
    fn test_flush_writes_direction() {
        let mut model = Model::new();
        model.maximization();
        let x = model.add_variable();
        model.set_objective_coefficient(x, 1.);
        model.set_objective_offset(5.);
        model.flush_all().unwrap();

        assert_eq!(model.engine().objective_sense(), -1.);
        assert_eq!(model.engine().objective_offset(), 5.);

        model.minimization();
        model.flush_all().unwrap();
        assert_eq!(model.engine().objective_sense(), 1.);
        assert_eq!(model.engine().objective_offset(), -5.);
    }

    #[test]
    fn test_append_rows_patches_infinities() {
        let mut model = Model::new();
        let x = model.add_variable();
        let c = model.add_constraint(&[(x, 1.)], ConstraintKind::Geq, 2.).unwrap();
        model.flush_all().unwrap();

        assert_eq!(model.view.get(VectorKind::RowUpper, c.index), f64::INFINITY);
        assert_eq!(model.view.get(VectorKind::RowLower, c.index), 2.);
    }

    #[test]
    fn test_column_append_invalidates_caches() {
        let mut model = Model::new();
        let x = model.add_variable();
        model.add_constraint(&[(x, 1.)], ConstraintKind::Leq, 1.).unwrap();
        model.flush_all().unwrap();
        model.view.index_caches();
        assert!(model.view.caches_valid());

        model.add_variable();
        model.flush_all().unwrap();
        assert!(!model.view.caches_valid());
        let (starts, _) = model.view.index_caches();
        assert_eq!(starts.len(), 3);
    }

    #[test]
    fn test_rebuild_keeps_committed_state() {
        let mut model = Model::new();
        let x = model.add_variable();
        let y = model.add_variable();
        model.free_variable(y);
        model.set_objective_offset(3.);
        model.set_quadratic_coefficient(x, 0.5).unwrap();
        let c = model
            .add_constraint(&[(x, 1.), (y, -2.)], ConstraintKind::Leq, 4.)
            .unwrap();
        model.flush_all().unwrap();

        model.rebuild().unwrap();

        assert_eq!(model.view.num_cols, 2);
        assert_eq!(model.view.num_rows, 1);
        assert_eq!(model.variable_lower_bound(y), f64::NEG_INFINITY);
        assert_eq!(model.constraint_lower_bound(c), f64::NEG_INFINITY);
        assert_eq!(model.constraint_coefficient(c, y).unwrap(), -2.);
        assert_eq!(model.engine().objective_offset(), -3.);
        assert_eq!(model.quadratic_coefficient(x), 0.5);
        let hessian = model.engine().quadratic_objective().unwrap();
        assert_eq!(hessian.get_entry((0, 0)), Some(1.));
    }
}
