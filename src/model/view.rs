use crate::engine::*;

/// The committed model state.
///
/// Owns the engine model exclusively.  Vector handles are fetched from the
/// engine on every access and never held across a structural call.  The
/// two integer index arrays of the constraint matrix are copied out lazily
/// and cached until the next structural change.
#[derive(Debug)]
pub(crate) struct NativeMatrixView<E> {
    engine: E,
    pub(crate) num_cols: usize,
    pub(crate) num_rows: usize,
    pub(crate) num_elements: usize,
    column_starts: Option<Vec<usize>>,
    row_indices: Option<Vec<usize>>,
}

impl<E> NativeMatrixView<E>
where
    E: SolvingEngine,
{
    pub(crate) fn new(engine: E) -> Self {
        let mut view = Self {
            engine,
            num_cols: 0,
            num_rows: 0,
            num_elements: 0,
            column_starts: None,
            row_indices: None,
        };
        view.sync_counts();
        view
    }

    pub(crate) fn engine(&self) -> &E {
        &self.engine
    }

    pub(crate) fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Swap in a new engine model and return the old one.
    pub(crate) fn replace_engine(&mut self, engine: E) -> E {
        let old = std::mem::replace(&mut self.engine, engine);
        self.sync_counts();
        old
    }

    /// Re-read the dimensions from the engine and drop the caches.
    pub(crate) fn sync_counts(&mut self) {
        self.num_cols = self.engine.num_cols();
        self.num_rows = self.engine.num_rows();
        self.num_elements = self.engine.num_elements();
        self.invalidate();
    }

    pub(crate) fn invalidate(&mut self) {
        self.column_starts = None;
        self.row_indices = None;
    }

    #[inline]
    pub(crate) fn get(&self, kind: VectorKind, i: usize) -> f64 {
        self.engine.vector(kind).view::<f64>().get(i)
    }

    #[inline]
    pub(crate) fn set(&mut self, kind: VectorKind, i: usize, value: f64) {
        self.engine.vector_mut(kind).view_mut::<f64>().set(i, value);
    }

    /// Copy of the first `len` entries of a vector.
    pub(crate) fn read(&self, kind: VectorKind, len: usize) -> Vec<f64> {
        self.engine.vector(kind).to_vec::<f64>(len)
    }

    /// `(column_starts, row_indices)`, copied out of the engine if a
    /// structural change cleared the caches.
    pub(crate) fn index_caches(&mut self) -> (&[usize], &[usize]) {
        let engine = &self.engine;
        let (num_cols, num_elements) = (self.num_cols, self.num_elements);

        let starts = self.column_starts.get_or_insert_with(|| {
            let starts = engine.vector_starts().to_vec::<i32>(num_cols + 1);
            starts.into_iter().map(|s| s as usize).collect()
        });
        let rows = self.row_indices.get_or_insert_with(|| {
            let rows = engine.indices().to_vec::<i32>(num_elements);
            rows.into_iter().map(|r| r as usize).collect()
        });
        (starts.as_slice(), rows.as_slice())
    }

    #[cfg(test)]
    pub(crate) fn caches_valid(&self) -> bool {
        self.column_starts.is_some() && self.row_indices.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caches_invalidate_on_structural_change() {
        let mut view = NativeMatrixView::new(MemoryEngine::new_model(EngineSettings::default()));
        view.engine_mut().resize(0, 2);
        view.engine_mut()
            .add_rows(&[0.], &[1.], &[0, 2], &[1, 0], &[5., 6.])
            .unwrap();
        view.sync_counts();

        let (starts, rows) = view.index_caches();
        assert_eq!(starts, &[0, 1, 2]);
        assert_eq!(rows, &[0, 0]);
        assert!(view.caches_valid());

        view.invalidate();
        assert!(!view.caches_valid());
        assert_eq!(view.get(VectorKind::Elements, 1), 5.);
    }
}
