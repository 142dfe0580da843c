use std::collections::BTreeMap;

/// Diagonal CSC payload for `load_quadratic_objective`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DiagonalCsc {
    pub starts: Vec<usize>,
    pub columns: Vec<usize>,
    pub elements: Vec<f64>,
}

/// Diagonal-only Hessian of the quadratic objective.
///
/// Values are stored doubled (the engine objective contributes `½ xᵀQx`)
/// and in minimisation form.  `committed` covers the committed columns,
/// `pending` holds entries for columns that are still staged.
#[derive(Debug, Clone, Default)]
pub(crate) struct QuadraticDiagonal {
    committed: Vec<f64>,
    pending: BTreeMap<usize, f64>,
    dirty: bool,
}

impl QuadraticDiagonal {
    /// Rebuild from the diagonal of a Hessian read back from an engine.
    pub(crate) fn from_committed(diagonal: Vec<f64>) -> Self {
        Self {
            committed: diagonal,
            pending: BTreeMap::new(),
            dirty: false,
        }
    }

    /// Store an already doubled and signed diagonal value.
    pub(crate) fn put(&mut self, column: usize, value: f64) {
        match self.committed.get_mut(column) {
            Some(slot) => *slot = value,
            None => {
                self.pending.insert(column, value);
            }
        }
        self.dirty = true;
    }

    pub(crate) fn get(&self, column: usize) -> f64 {
        match self.committed.get(column) {
            Some(&v) => v,
            None => self.pending.get(&column).copied().unwrap_or(0.),
        }
    }

    pub(crate) fn negate(&mut self) {
        self.committed.iter_mut().for_each(|v| *v = -*v);
        self.pending.values_mut().for_each(|v| *v = -*v);
        self.dirty = true;
    }

    /// Materialise the diagonal over `num_cols` committed columns.  Returns
    /// `None` when the engine already holds the current diagonal.
    pub(crate) fn flush(&mut self, num_cols: usize) -> Option<DiagonalCsc> {
        if !self.dirty && self.committed.len() == num_cols {
            return None;
        }

        self.committed.resize(num_cols, 0.);
        let staged = self.pending.split_off(&num_cols);
        for (column, value) in std::mem::replace(&mut self.pending, staged) {
            self.committed[column] = value;
        }
        self.dirty = false;

        Some(DiagonalCsc {
            starts: (0..=num_cols).collect(),
            columns: (0..num_cols).collect(),
            elements: self.committed.clone(),
        })
    }
}

#[test]
fn test_diagonal_flush_grows_with_columns() {
    let mut q = QuadraticDiagonal::default();
    q.put(1, 4.);
    q.put(3, -2.);

    let csc = q.flush(2).unwrap();
    assert_eq!(csc.starts, vec![0, 1, 2]);
    assert_eq!(csc.columns, vec![0, 1]);
    assert_eq!(csc.elements, vec![0., 4.]);
    // column 3 is still staged
    assert_eq!(q.get(3), -2.);
    assert!(q.flush(2).is_none());

    let csc = q.flush(4).unwrap();
    assert_eq!(csc.elements, vec![0., 4., 0., -2.]);
}

#[test]
fn test_diagonal_negate_covers_pending() {
    let mut q = QuadraticDiagonal::default();
    q.put(0, 2.);
    q.flush(1);
    q.put(5, 6.);

    q.negate();
    assert_eq!(q.get(0), -2.);
    assert_eq!(q.get(5), -6.);
    q.negate();
    assert_eq!(q.get(0), 2.);
    assert_eq!(q.get(5), 6.);
    assert!(q.flush(1).is_some());
}
