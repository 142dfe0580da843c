#![allow(non_snake_case)]

use super::EngineError;

/// Sparse matrix in Compressed Sparse Column (CSC) format.
///
/// Unlike a solver-ready matrix, entries within a column are kept in the
/// order they were appended and may repeat a row index.  Consumers that
/// need a canonical form call [`canonical_column`](CscStore::canonical_column).
///
/// __Example usage__ : the 2 x 3 matrix
/// ```text
/// A = [1.  0.  2.]
///     [0.  3.  4.]
/// ```
///
/// ```
/// use lpmodel::engine::CscStore;
///
/// let A = CscStore::new(
///    2,                       // m
///    3,                       // n
///    vec![0, 1, 2, 4],        //colptr
///    vec![0, 1, 0, 1],        //rowval
///    vec![1., 3., 2., 4.],    //nzval
///  );
/// assert_eq!(A.nnz(), 4);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CscStore {
    /// number of rows
    pub m: usize,
    /// number of columns
    pub n: usize,
    /// CSC format column pointer, length `n+1`
    pub colptr: Vec<usize>,
    /// vector of row indices
    pub rowval: Vec<usize>,
    /// vector of structural entries
    pub nzval: Vec<f64>,
}

impl CscStore {
    /// `CscStore` constructor.
    ///
    /// # Panics
    /// Makes rudimentary dimensional compatibility checks and panics on
    /// failure.
    pub fn new(m: usize, n: usize, colptr: Vec<usize>, rowval: Vec<usize>, nzval: Vec<f64>) -> Self {
        assert_eq!(rowval.len(), nzval.len());
        assert_eq!(colptr.len(), n + 1);
        assert_eq!(colptr[n], rowval.len());
        CscStore {
            m,
            n,
            colptr,
            rowval,
            nzval,
        }
    }

    /// an m x n matrix with no structural entries
    pub fn zeros(m: usize, n: usize) -> Self {
        CscStore::new(m, n, vec![0; n + 1], vec![], vec![])
    }

    /// number of structural entries
    pub fn nnz(&self) -> usize {
        self.colptr[self.n]
    }

    /// Grow or shrink to `m` x `n`, dropping entries that fall outside.
    pub fn resize(&mut self, m: usize, n: usize) {
        if n < self.n {
            let nnz = self.colptr[n];
            self.colptr.truncate(n + 1);
            self.rowval.truncate(nnz);
            self.nzval.truncate(nnz);
        } else if n > self.n {
            let nnz = self.nnz();
            self.colptr.resize(n + 1, nnz);
        }
        self.n = n;

        if m < self.m {
            self.drop_rows_from(m);
        }
        self.m = m;
    }

    // remove every entry with row index >= m
    fn drop_rows_from(&mut self, m: usize) {
        let mut ptr = 0;
        for col in 0..self.n {
            let (first, last) = (self.colptr[col], self.colptr[col + 1]);
            self.colptr[col] = ptr;
            for k in first..last {
                if self.rowval[k] < m {
                    self.rowval[ptr] = self.rowval[k];
                    self.nzval[ptr] = self.nzval[k];
                    ptr += 1;
                }
            }
        }
        self.colptr[self.n] = ptr;
        self.rowval.truncate(ptr);
        self.nzval.truncate(ptr);
    }

    /// Append rows given in CSR form.  Each term lands at the end of its
    /// column's segment, so row order within a column is preserved.
    pub fn append_rows(
        &mut self,
        starts: &[usize],
        columns: &[usize],
        values: &[f64],
    ) -> Result<(), EngineError> {
        check_compressed(starts, columns.len(), values.len())?;
        check_indices(columns, self.n, "column")?;

        let first_row = self.m;
        let nrows = starts.len() - 1;

        // count the new entries in each column
        let mut counts = vec![0usize; self.n];
        columns.iter().for_each(|&c| counts[c] += 1);

        let mut colptr = vec![0usize; self.n + 1];
        for col in 0..self.n {
            let oldlen = self.colptr[col + 1] - self.colptr[col];
            colptr[col + 1] = colptr[col] + oldlen + counts[col];
        }

        let nnz = colptr[self.n];
        let mut rowval = vec![0usize; nnz];
        let mut nzval = vec![0f64; nnz];

        // copy forward the existing segments and note where each column
        // continues
        let mut cursor = vec![0usize; self.n];
        for col in 0..self.n {
            let (first, last) = (self.colptr[col], self.colptr[col + 1]);
            let dest = colptr[col];
            let len = last - first;
            rowval[dest..dest + len].copy_from_slice(&self.rowval[first..last]);
            nzval[dest..dest + len].copy_from_slice(&self.nzval[first..last]);
            cursor[col] = dest + len;
        }

        for row in 0..nrows {
            for k in starts[row]..starts[row + 1] {
                let col = columns[k];
                rowval[cursor[col]] = first_row + row;
                nzval[cursor[col]] = values[k];
                cursor[col] += 1;
            }
        }

        self.colptr = colptr;
        self.rowval = rowval;
        self.nzval = nzval;
        self.m += nrows;
        Ok(())
    }

    /// Append columns given in CSC form.
    pub fn append_columns(
        &mut self,
        starts: &[usize],
        rows: &[usize],
        values: &[f64],
    ) -> Result<(), EngineError> {
        check_compressed(starts, rows.len(), values.len())?;
        check_indices(rows, self.m, "row")?;

        let nnz = self.nnz();
        self.colptr
            .extend(starts.iter().skip(1).map(|&s| nnz + s));
        self.rowval.extend_from_slice(rows);
        self.nzval.extend_from_slice(values);
        self.n += starts.len() - 1;
        Ok(())
    }

    /// Entries of column `col` sorted by row, repeated rows summed, and
    /// only rows satisfying `keep` retained.
    pub fn canonical_column(&self, col: usize, keep: impl Fn(usize) -> bool) -> Vec<(usize, f64)> {
        let (first, last) = (self.colptr[col], self.colptr[col + 1]);
        let mut entries: Vec<(usize, f64)> = (first..last)
            .filter(|&k| keep(self.rowval[k]))
            .map(|k| (self.rowval[k], self.nzval[k]))
            .collect();
        entries.sort_by_key(|&(row, _)| row);

        let mut merged: Vec<(usize, f64)> = Vec::with_capacity(entries.len());
        for (row, value) in entries {
            match merged.last_mut() {
                Some((last, acc)) if *last == row => *acc += value,
                _ => merged.push((row, value)),
            }
        }
        merged
    }

    /// Returns the value at the given (row,col) index as an Option.
    /// Returns None if the given index is not a structural entry.  Repeated
    /// entries are summed.
    pub fn get_entry(&self, idx: (usize, usize)) -> Option<f64> {
        let (row, col) = idx;
        let (first, last) = (self.colptr[col], self.colptr[col + 1]);
        let mut found = None;
        for k in first..last {
            if self.rowval[k] == row {
                *found.get_or_insert(0.) += self.nzval[k];
            }
        }
        found
    }
}

/// Check a compressed (row or column) pointer array against the lengths of
/// the index and value arrays it describes.
pub(crate) fn check_compressed(
    starts: &[usize],
    nindex: usize,
    nvalues: usize,
) -> Result<(), EngineError> {
    if starts.is_empty() || starts[0] != 0 || nindex != nvalues {
        return Err(EngineError::IncompatibleDimension);
    }
    if starts.windows(2).any(|s| s[0] > s[1]) || starts[starts.len() - 1] != nindex {
        return Err(EngineError::IncompatibleDimension);
    }
    Ok(())
}

pub(crate) fn check_indices(
    indices: &[usize],
    dim: usize,
    kind: &'static str,
) -> Result<(), EngineError> {
    match indices.iter().find(|&&i| i >= dim) {
        Some(&index) => Err(EngineError::IndexOutOfRange { kind, index, dim }),
        None => Ok(()),
    }
}

#[test]
fn test_csc_append_rows_keeps_row_order() {
    // A = [1 . 2]
    let mut A = CscStore::zeros(0, 3);
    A.append_rows(&[0, 2], &[0, 2], &[1., 2.]).unwrap();

    // A = [1 . 2]
    //     [3 4 .]
    A.append_rows(&[0, 2], &[1, 0], &[4., 3.]).unwrap();

    assert_eq!(A.m, 2);
    assert_eq!(A.colptr, vec![0, 2, 3, 4]);
    assert_eq!(A.rowval, vec![0, 1, 1, 0]);
    assert_eq!(A.nzval, vec![1., 3., 4., 2.]);
    assert_eq!(A.get_entry((1, 1)), Some(4.));
    assert_eq!(A.get_entry((0, 1)), None);
}

#[test]
fn test_csc_append_rows_rejects_bad_input() {
    let mut A = CscStore::zeros(0, 2);
    assert!(matches!(
        A.append_rows(&[0, 1], &[2], &[1.]),
        Err(EngineError::IndexOutOfRange { index: 2, .. })
    ));
    assert!(matches!(
        A.append_rows(&[0, 2], &[0], &[1.]),
        Err(EngineError::IncompatibleDimension)
    ));
    assert_eq!(A, CscStore::zeros(0, 2));
}

#[test]
fn test_csc_resize() {
    let mut A = CscStore::new(3, 2, vec![0, 2, 4], vec![0, 2, 1, 2], vec![1., 2., 3., 4.]);

    A.resize(2, 3);
    assert_eq!(A.colptr, vec![0, 1, 2, 2]);
    assert_eq!(A.rowval, vec![0, 1]);
    assert_eq!(A.nzval, vec![1., 3.]);

    A.resize(2, 1);
    assert_eq!(A.nnz(), 1);
}

#[test]
fn test_csc_canonical_column_merges() {
    let A = CscStore::new(3, 1, vec![0, 3], vec![2, 0, 2], vec![1., 5., 2.]);
    assert_eq!(A.canonical_column(0, |_| true), vec![(0, 5.), (2, 3.)]);
    assert_eq!(A.canonical_column(0, |r| r != 0), vec![(2, 3.)]);
}
