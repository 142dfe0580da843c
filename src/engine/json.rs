use super::*;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::{fs::File, io::Read};

// Everything needed to recreate a MemoryEngine, in plain vectors.  JSON
// has no representation for infinities, so they are written as ±f64::MAX.

#[derive(Serialize, Deserialize)]
#[allow(non_snake_case)]
struct JsonEngineModel {
    pub settings: EngineSettings,
    pub A: CscStore,
    pub Q: Option<CscStore>,
    pub objective: Vec<f64>,
    pub col_lower: Vec<f64>,
    pub col_upper: Vec<f64>,
    pub row_lower: Vec<f64>,
    pub row_upper: Vec<f64>,
    pub primal: Vec<f64>,
    pub dual: Vec<f64>,
    pub objective_offset: f64,
    pub objective_sense: f64,
    pub objective_value: Option<f64>,
    pub status: i32,
}

impl MemoryEngine {
    /// Write the model as JSON.
    pub fn write_to_file(&self, file: &mut File) -> Result<(), EngineError> {
        let (m, n) = (self.num_rows, self.num_cols);
        let mut json_data = JsonEngineModel {
            settings: self.settings.clone(),
            A: self.matrix(),
            Q: self.quadratic.clone(),
            objective: self.objective.to_vec(n),
            col_lower: self.col_lower.to_vec(n),
            col_upper: self.col_upper.to_vec(n),
            row_lower: self.row_lower.to_vec(m),
            row_upper: self.row_upper.to_vec(m),
            primal: self.primal.to_vec(n),
            dual: self.dual.to_vec(m),
            objective_offset: self.objective_offset,
            objective_sense: self.objective_sense,
            objective_value: Some(self.objective_value).filter(|v| v.is_finite()),
            status: self.status,
        };

        sanitize(&mut json_data);

        let json = serde_json::to_string(&json_data)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Read a model written by [`write_to_file`](MemoryEngine::write_to_file).
    pub fn read_from_file(file: &mut File) -> Result<Self, EngineError> {
        let mut buffer = String::new();
        file.read_to_string(&mut buffer)?;
        let mut json_data: JsonEngineModel = serde_json::from_str(&buffer)?;

        // restore sanitized settings to their (likely) original values
        if json_data.settings.max_seconds == f64::MAX {
            json_data.settings.max_seconds = f64::INFINITY;
        }

        let (m, n) = (json_data.A.m, json_data.A.n);
        let lengths_ok = [
            &json_data.objective,
            &json_data.col_lower,
            &json_data.col_upper,
            &json_data.primal,
        ]
        .iter()
        .all(|v| v.len() == n)
            && [&json_data.row_lower, &json_data.row_upper, &json_data.dual]
                .iter()
                .all(|v| v.len() == m)
            && json_data.A.colptr.len() == n + 1
            && json_data.Q.as_ref().map_or(true, |Q| Q.n == n && Q.colptr.len() == n + 1);
        if !lengths_ok {
            return Err(EngineError::IncompatibleDimension);
        }

        let mut engine = Self::new_model(json_data.settings);
        engine.num_rows = m;
        engine.num_cols = n;
        engine.store_matrix(json_data.A)?;
        engine.quadratic = json_data.Q;
        engine.objective = NativeBlock::from_slice(&json_data.objective);
        engine.col_lower = NativeBlock::from_slice(&json_data.col_lower);
        engine.col_upper = NativeBlock::from_slice(&json_data.col_upper);
        engine.row_lower = NativeBlock::from_slice(&json_data.row_lower);
        engine.row_upper = NativeBlock::from_slice(&json_data.row_upper);
        engine.primal = NativeBlock::from_slice(&json_data.primal);
        engine.dual = NativeBlock::from_slice(&json_data.dual);
        engine.objective_offset = json_data.objective_offset;
        engine.objective_sense = json_data.objective_sense;
        engine.objective_value = json_data.objective_value.unwrap_or(f64::NAN);
        engine.status = json_data.status;
        Ok(engine)
    }
}

fn sanitize(json_data: &mut JsonEngineModel) {
    if json_data.settings.max_seconds == f64::INFINITY {
        json_data.settings.max_seconds = f64::MAX;
    }
    for v in [
        &mut json_data.col_lower,
        &mut json_data.col_upper,
        &mut json_data.row_lower,
        &mut json_data.row_upper,
    ] {
        v.iter_mut().for_each(|x| *x = clamp_infinite(*x));
    }
}

#[test]
fn test_json_io() {
    use std::io::{Seek, SeekFrom};

    let mut engine = MemoryEngine::new_model(EngineSettings::default());
    engine.resize(0, 2);
    engine
        .add_rows(&[1.], &[f64::INFINITY], &[0, 2], &[0, 1], &[1., 1.])
        .unwrap();
    engine.row_upper.view_mut::<f64>().set(0, f64::INFINITY);
    engine.objective.view_mut::<f64>().copy_from_slice(&[1., 2.]);
    engine.set_objective_offset(0.5);

    let mut file = tempfile::tempfile().unwrap();
    engine.write_to_file(&mut file).unwrap();

    file.seek(SeekFrom::Start(0)).unwrap();
    let engine2 = MemoryEngine::read_from_file(&mut file).unwrap();

    assert_eq!(engine2.matrix(), engine.matrix());
    assert_eq!(engine2.objective.to_vec::<f64>(2), vec![1., 2.]);
    assert_eq!(engine2.row_upper.to_vec::<f64>(1), vec![ENGINE_INFINITY]);
    assert_eq!(engine2.objective_offset(), 0.5);
    assert!(engine2.settings().max_seconds.is_infinite());
}
