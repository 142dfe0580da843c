//! Staging buffers for variables and constraints that have not yet been
//! committed to the engine.
//!
//! Both buffers are addressed by offset from their first entry.  They are
//! replaced by fresh empty buffers whenever their contents are flushed.

use super::ConstraintKind;
use crate::algebra::Normalizer;
use std::collections::BTreeMap;

/// Pending variables.
///
/// Only values that were explicitly set are recorded.  Columns without an
/// entry get the engine defaults (objective 0, bounds `[0, ∞)`) when they
/// are appended.
#[derive(Debug, Clone, Default)]
pub(crate) struct ColumnBuffer {
    pub(crate) objectives: BTreeMap<usize, f64>,
    pub(crate) lower: BTreeMap<usize, f64>,
    pub(crate) upper: BTreeMap<usize, f64>,
    count: usize,
}

impl ColumnBuffer {
    pub(crate) fn add_column(&mut self) {
        self.count += 1;
    }

    pub(crate) fn len(&self) -> usize {
        self.count
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub(crate) fn objective(&self, offset: usize) -> f64 {
        self.objectives.get(&offset).copied().unwrap_or(0.)
    }

    pub(crate) fn lower_bound(&self, offset: usize) -> f64 {
        self.lower.get(&offset).copied().unwrap_or(0.)
    }

    pub(crate) fn upper_bound(&self, offset: usize) -> f64 {
        self.upper.get(&offset).copied().unwrap_or(f64::INFINITY)
    }

    pub(crate) fn negate_objectives(&mut self) {
        self.objectives.values_mut().for_each(|c| *c = -*c);
    }
}

/// Pending constraints in CSR form.
///
/// `starts` always holds one more entry than there are rows.  Terms are
/// kept in the order supplied: no deduplication, no sorting and no zero
/// suppression, so a zero coefficient still reserves a structural entry.
#[derive(Debug, Clone)]
pub(crate) struct RowBuffer {
    pub(crate) lower: Vec<f64>,
    pub(crate) upper: Vec<f64>,
    pub(crate) starts: Vec<usize>,
    pub(crate) columns: Vec<usize>,
    pub(crate) elements: Vec<f64>,
}

impl Default for RowBuffer {
    fn default() -> Self {
        Self {
            lower: vec![],
            upper: vec![],
            starts: vec![0],
            columns: vec![],
            elements: vec![],
        }
    }
}

impl RowBuffer {
    pub(crate) fn len(&self) -> usize {
        self.lower.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// Stage one row.  The right-hand side and every coefficient pass
    /// through `norm`.
    pub(crate) fn add_row<I>(&mut self, terms: I, kind: ConstraintKind, rhs: f64, norm: &Normalizer)
    where
        I: IntoIterator<Item = (usize, f64)>,
    {
        let (lower, upper) = kind.bounds(norm.normalize(rhs));
        self.lower.push(lower);
        self.upper.push(upper);

        for (column, value) in terms {
            self.columns.push(column);
            self.elements.push(norm.normalize(value));
        }
        self.starts.push(self.elements.len());
    }

    /// Stage a free row with a single unit coefficient on column 0.
    pub(crate) fn add_dummy_row(&mut self) {
        self.add_row([(0, 1.)], ConstraintKind::Free, 0., &Normalizer::new(0.));
    }

    // position of the first term of `row` on `column`
    fn position(&self, row: usize, column: usize) -> Option<usize> {
        let (first, last) = (self.starts[row], self.starts[row + 1]);
        (first..last).find(|&k| self.columns[k] == column)
    }

    pub(crate) fn element(&self, row: usize, column: usize) -> Option<f64> {
        self.position(row, column).map(|k| self.elements[k])
    }

    /// Overwrite the coefficient of an existing term.  Returns `false`, and
    /// changes nothing, if `row` has no term on `column`.
    pub(crate) fn set_element(&mut self, row: usize, column: usize, value: f64) -> bool {
        match self.position(row, column) {
            Some(k) => {
                self.elements[k] = value;
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_bounds(&mut self, row: usize, lower: Option<f64>, upper: Option<f64>) {
        if let Some(lb) = lower {
            self.lower[row] = lb;
        }
        if let Some(ub) = upper {
            self.upper[row] = ub;
        }
    }
}
