use super::csc::{check_compressed, check_indices};
use super::*;
use itertools::izip;
use std::path::Path;

/// In-memory engine model.
///
/// Vectors live in [`NativeBlock`]s and are handed out through the
/// [`SolvingEngine`] accessors.  The constraint matrix is kept in CSC form
/// across three blocks (`elements`, `indices`, `starts`).  Every structural
/// call reallocates the affected blocks, so handles must be fetched again
/// afterwards.
#[derive(Debug, Clone)]
pub struct MemoryEngine {
    pub(crate) settings: EngineSettings,
    pub(crate) num_rows: usize,
    pub(crate) num_cols: usize,

    pub(crate) objective: NativeBlock,
    pub(crate) col_lower: NativeBlock,
    pub(crate) col_upper: NativeBlock,
    pub(crate) row_lower: NativeBlock,
    pub(crate) row_upper: NativeBlock,

    // constraint matrix, CSC
    pub(crate) elements: NativeBlock,
    pub(crate) indices: NativeBlock,
    pub(crate) starts: NativeBlock,

    pub(crate) quadratic: Option<CscStore>,

    pub(crate) primal: NativeBlock,
    pub(crate) dual: NativeBlock,

    pub(crate) objective_offset: f64,
    pub(crate) objective_sense: f64,
    pub(crate) objective_value: f64,
    pub(crate) status: i32,
}

impl MemoryEngine {
    /// Copy of the constraint matrix.
    pub fn matrix(&self) -> CscStore {
        let nnz = self.num_elements();
        let colptr = to_usize(&self.starts, self.num_cols + 1);
        let rowval = to_usize(&self.indices, nnz);
        let nzval = self.elements.to_vec::<f64>(nnz);
        CscStore::new(self.num_rows, self.num_cols, colptr, rowval, nzval)
    }

    // write a matrix back into freshly allocated blocks
    pub(crate) fn store_matrix(&mut self, A: CscStore) -> Result<(), EngineError> {
        let starts = from_usize(&A.colptr)?;
        let indices = from_usize(&A.rowval)?;
        self.starts = starts;
        self.indices = indices;
        self.elements = NativeBlock::from_slice(&A.nzval);
        Ok(())
    }

    fn resize_column_vectors(&mut self, cols: usize) {
        self.objective.resize::<f64>(cols, 0.);
        self.col_lower.resize::<f64>(cols, 0.);
        self.col_upper.resize::<f64>(cols, ENGINE_INFINITY);
        self.primal.resize::<f64>(cols, 0.);
        if let Some(Q) = self.quadratic.as_mut() {
            Q.resize(cols, cols);
        }
    }

    fn resize_row_vectors(&mut self, rows: usize) {
        self.row_lower.resize::<f64>(rows, -ENGINE_INFINITY);
        self.row_upper.resize::<f64>(rows, ENGINE_INFINITY);
        self.dual.resize::<f64>(rows, 0.);
    }
}

#[allow(non_snake_case)]
impl SolvingEngine for MemoryEngine {
    fn new_model(settings: EngineSettings) -> Self {
        Self {
            settings,
            num_rows: 0,
            num_cols: 0,
            objective: NativeBlock::default(),
            col_lower: NativeBlock::default(),
            col_upper: NativeBlock::default(),
            row_lower: NativeBlock::default(),
            row_upper: NativeBlock::default(),
            elements: NativeBlock::default(),
            indices: NativeBlock::default(),
            starts: NativeBlock::from_slice(&[0i32]),
            quadratic: None,
            primal: NativeBlock::default(),
            dual: NativeBlock::default(),
            objective_offset: 0.,
            objective_sense: 1.,
            objective_value: f64::NAN,
            status: STATUS_UNKNOWN,
        }
    }

    fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut EngineSettings {
        &mut self.settings
    }

    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn num_cols(&self) -> usize {
        self.num_cols
    }

    fn num_elements(&self) -> usize {
        self.starts.view::<i32>().get(self.num_cols) as usize
    }

    fn resize(&mut self, rows: usize, cols: usize) {
        let mut A = self.matrix();
        A.resize(rows, cols);
        // a resize never adds entries, so every index already fits
        if let Err(e) = self.store_matrix(A) {
            log::error!("resize to {rows}x{cols} failed: {e}");
            return;
        }

        self.resize_column_vectors(cols);
        self.resize_row_vectors(rows);
        self.num_rows = rows;
        self.num_cols = cols;
    }

    fn add_rows(
        &mut self,
        lower: &[f64],
        upper: &[f64],
        starts: &[usize],
        columns: &[usize],
        elements: &[f64],
    ) -> Result<(), EngineError> {
        let n = lower.len();
        if upper.len() != n || starts.len() != n + 1 {
            return Err(EngineError::IncompatibleDimension);
        }

        let mut A = self.matrix();
        A.append_rows(starts, columns, elements)?;
        self.store_matrix(A)?;

        let first = self.num_rows;
        self.resize_row_vectors(first + n);
        let mut rl = self.row_lower.view_mut::<f64>();
        for (i, &v) in lower.iter().enumerate() {
            rl.set(first + i, clamp_infinite(v));
        }
        let mut ru = self.row_upper.view_mut::<f64>();
        for (i, &v) in upper.iter().enumerate() {
            ru.set(first + i, clamp_infinite(v));
        }
        self.num_rows += n;
        Ok(())
    }

    fn add_columns(
        &mut self,
        lower: &[f64],
        upper: &[f64],
        objective: &[f64],
        starts: &[usize],
        rows: &[usize],
        elements: &[f64],
    ) -> Result<(), EngineError> {
        let n = lower.len();
        if upper.len() != n || objective.len() != n || starts.len() != n + 1 {
            return Err(EngineError::IncompatibleDimension);
        }

        let mut A = self.matrix();
        A.append_columns(starts, rows, elements)?;
        self.store_matrix(A)?;

        let first = self.num_cols;
        self.resize_column_vectors(first + n);
        for (i, lb, ub, c) in izip!(0..n, lower, upper, objective) {
            self.col_lower.view_mut::<f64>().set(first + i, clamp_infinite(*lb));
            self.col_upper.view_mut::<f64>().set(first + i, clamp_infinite(*ub));
            self.objective.view_mut::<f64>().set(first + i, *c);
        }
        self.num_cols += n;
        Ok(())
    }

    fn load_quadratic_objective(
        &mut self,
        starts: &[usize],
        columns: &[usize],
        elements: &[f64],
    ) -> Result<(), EngineError> {
        let n = self.num_cols;
        if starts.len() != n + 1 {
            return Err(EngineError::IncompatibleDimension);
        }
        check_compressed(starts, columns.len(), elements.len())?;
        check_indices(columns, n, "column")?;

        self.quadratic = Some(CscStore::new(
            n,
            n,
            starts.to_vec(),
            columns.to_vec(),
            elements.to_vec(),
        ));
        // the objective block is reallocated along with the hessian
        self.objective = NativeBlock::from_slice(&self.objective.to_vec::<f64>(n));
        Ok(())
    }

    fn quadratic_objective(&self) -> Option<&CscStore> {
        self.quadratic.as_ref()
    }

    fn vector(&self, kind: VectorKind) -> &NativeBlock {
        match kind {
            VectorKind::Objective => &self.objective,
            VectorKind::ColLower => &self.col_lower,
            VectorKind::ColUpper => &self.col_upper,
            VectorKind::RowLower => &self.row_lower,
            VectorKind::RowUpper => &self.row_upper,
            VectorKind::Elements => &self.elements,
            VectorKind::Primal => &self.primal,
            VectorKind::Dual => &self.dual,
        }
    }

    fn vector_mut(&mut self, kind: VectorKind) -> &mut NativeBlock {
        match kind {
            VectorKind::Objective => &mut self.objective,
            VectorKind::ColLower => &mut self.col_lower,
            VectorKind::ColUpper => &mut self.col_upper,
            VectorKind::RowLower => &mut self.row_lower,
            VectorKind::RowUpper => &mut self.row_upper,
            VectorKind::Elements => &mut self.elements,
            VectorKind::Primal => &mut self.primal,
            VectorKind::Dual => &mut self.dual,
        }
    }

    fn indices(&self) -> &NativeBlock {
        &self.indices
    }

    fn vector_starts(&self) -> &NativeBlock {
        &self.starts
    }

    fn initial_solve(&mut self) -> i32 {
        if self.num_cols == 0 {
            self.objective_value = -self.objective_offset;
            self.status = STATUS_OPTIMAL;
            return self.status;
        }

        match conic::solve(self) {
            Ok(solution) => {
                self.primal.view_mut::<f64>().copy_from_slice(&solution.x);
                self.dual.view_mut::<f64>().copy_from_slice(&solution.y);
                self.objective_value = solution.objective - self.objective_offset;
                self.status = solution.status;
            }
            Err(e) => {
                log::warn!("solve backend rejected the model: {e}");
                self.objective_value = f64::NAN;
                self.status = STATUS_ERROR;
            }
        }
        self.status
    }

    fn status(&self) -> i32 {
        self.status
    }

    fn objective_value(&self) -> f64 {
        self.objective_value
    }

    fn set_objective_offset(&mut self, offset: f64) {
        self.objective_offset = offset;
    }

    fn objective_offset(&self) -> f64 {
        self.objective_offset
    }

    fn set_objective_sense(&mut self, sense: f64) {
        self.objective_sense = sense;
    }

    fn objective_sense(&self) -> f64 {
        self.objective_sense
    }

    #[cfg(feature = "serde")]
    fn save_model(&self, path: &Path) -> Result<(), EngineError> {
        let mut file = std::fs::File::create(path)?;
        self.write_to_file(&mut file)
    }

    #[cfg(feature = "serde")]
    fn restore_model(&mut self, path: &Path) -> Result<(), EngineError> {
        let mut file = std::fs::File::open(path)?;
        *self = Self::read_from_file(&mut file)?;
        Ok(())
    }

    #[cfg(not(feature = "serde"))]
    fn save_model(&self, _path: &Path) -> Result<(), EngineError> {
        Err(unsupported().into())
    }

    #[cfg(not(feature = "serde"))]
    fn restore_model(&mut self, _path: &Path) -> Result<(), EngineError> {
        Err(unsupported().into())
    }
}

#[cfg(not(feature = "serde"))]
fn unsupported() -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "model files require the \"serde\" feature",
    )
}

fn to_usize(block: &NativeBlock, len: usize) -> Vec<usize> {
    block.to_vec::<i32>(len).into_iter().map(|i| i as usize).collect()
}

// native index arrays are `int`
fn from_usize(values: &[usize]) -> Result<NativeBlock, EngineError> {
    let ints = values
        .iter()
        .map(|&v| i32::try_from(v).map_err(|_| EngineError::IncompatibleDimension))
        .collect::<Result<Vec<i32>, _>>()?;
    Ok(NativeBlock::from_slice(&ints))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with_columns(n: usize) -> MemoryEngine {
        let mut engine = MemoryEngine::new_model(EngineSettings::default());
        engine.resize(0, n);
        engine
    }

    #[test]
    fn test_resize_defaults() {
        let mut engine = engine_with_columns(2);
        engine.resize(1, 2);

        assert_eq!(engine.num_cols(), 2);
        assert_eq!(engine.vector(VectorKind::ColLower).to_vec::<f64>(2), vec![0.; 2]);
        assert_eq!(
            engine.vector(VectorKind::ColUpper).to_vec::<f64>(2),
            vec![ENGINE_INFINITY; 2]
        );
        assert_eq!(
            engine.vector(VectorKind::RowLower).to_vec::<f64>(1),
            vec![-ENGINE_INFINITY]
        );
        assert_eq!(engine.num_elements(), 0);
    }

    #[test]
    fn test_add_rows_clamps_infinite_bounds() {
        let mut engine = engine_with_columns(3);
        engine
            .add_rows(
                &[f64::NEG_INFINITY, 1.],
                &[2., f64::INFINITY],
                &[0, 2, 3],
                &[0, 2, 1],
                &[1., 2., 3.],
            )
            .unwrap();

        assert_eq!(engine.num_rows(), 2);
        assert_eq!(engine.num_elements(), 3);
        assert_eq!(
            engine.vector(VectorKind::RowLower).to_vec::<f64>(2),
            vec![-ENGINE_INFINITY, 1.]
        );
        assert_eq!(
            engine.vector(VectorKind::RowUpper).to_vec::<f64>(2),
            vec![2., ENGINE_INFINITY]
        );

        let A = engine.matrix();
        assert_eq!(A.colptr, vec![0, 1, 2, 3]);
        assert_eq!(A.rowval, vec![0, 1, 0]);
        assert_eq!(A.nzval, vec![1., 3., 2.]);
    }

    #[test]
    fn test_add_rows_unknown_column() {
        let mut engine = engine_with_columns(1);
        let res = engine.add_rows(&[0.], &[1.], &[0, 1], &[3], &[1.]);
        assert!(matches!(res, Err(EngineError::IndexOutOfRange { index: 3, .. })));
        assert_eq!(engine.num_rows(), 0);
    }

    #[test]
    fn test_native_indices_must_fit_int() {
        let big = i32::MAX as usize + 1;
        assert!(matches!(
            from_usize(&[0, big]),
            Err(EngineError::IncompatibleDimension)
        ));
        let block = from_usize(&[0, i32::MAX as usize]).unwrap();
        assert_eq!(to_usize(&block, 2), vec![0, i32::MAX as usize]);
    }

    #[test]
    fn test_add_columns_after_rows() {
        let mut engine = MemoryEngine::new_model(EngineSettings::default());
        engine.resize(2, 0);
        engine
            .add_columns(&[0., -1.], &[1., 1.], &[3., 4.], &[0, 1, 3], &[1, 0, 1], &[5., 6., 7.])
            .unwrap();

        assert_eq!(engine.num_cols(), 2);
        assert_eq!(engine.vector(VectorKind::Objective).to_vec::<f64>(2), vec![3., 4.]);
        assert_eq!(engine.matrix().get_entry((1, 1)), Some(7.));
    }

    #[test]
    fn test_quadratic_follows_resize() {
        let mut engine = engine_with_columns(2);
        engine
            .load_quadratic_objective(&[0, 1, 2], &[0, 1], &[2., 4.])
            .unwrap();
        engine.resize(0, 3);
        let Q = engine.quadratic_objective().unwrap();
        assert_eq!(Q.n, 3);
        assert_eq!(Q.colptr, vec![0, 1, 2, 2]);

        assert!(engine
            .load_quadratic_objective(&[0, 1], &[0], &[1.])
            .is_err());
    }
}
