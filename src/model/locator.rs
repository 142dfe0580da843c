use super::view::NativeMatrixView;
use crate::engine::SolvingEngine;

/// Position of the committed entry `(row, column)` inside the CSC
/// `indices` / `elements` arrays, scanning the column's segment.
///
/// Structural patterns are fixed after commit, so a miss is final: there is
/// no implicit insertion.
pub(crate) fn locate(starts: &[usize], rows: &[usize], row: usize, column: usize) -> Option<usize> {
    let (first, last) = (starts[column], starts[column + 1]);
    (first..last).find(|&k| rows[k] == row)
}

impl<E> NativeMatrixView<E>
where
    E: SolvingEngine,
{
    /// Storage slot of a committed coefficient.
    pub(crate) fn locate(&mut self, row: usize, column: usize) -> Option<usize> {
        let (starts, rows) = self.index_caches();
        locate(starts, rows, row, column)
    }
}

#[test]
fn test_locate_scans_segment() {
    // columns: [r0 r2] [] [r1 r0]
    let starts = [0, 2, 2, 4];
    let rows = [0, 2, 1, 0];

    assert_eq!(locate(&starts, &rows, 2, 0), Some(1));
    assert_eq!(locate(&starts, &rows, 0, 2), Some(3));
    assert_eq!(locate(&starts, &rows, 1, 0), None);
    // empty segment
    assert_eq!(locate(&starts, &rows, 0, 1), None);
}
