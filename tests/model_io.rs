#![allow(non_snake_case)]

use lpmodel::model::*;

fn production_model() -> (Model, Variable, Variable, Constraint) {
    // max 3x + 2y  s.t.  x + y <= 4,  x + 3y <= 6,  x <= 3
    let mut model = Model::new();
    model.maximization();
    let x = model.add_variable();
    let y = model.add_variable();
    model.set_variable_upper_bound(x, 3.);
    model.set_objective_coefficient(x, 3.);
    model.set_objective_coefficient(y, 2.);
    model.set_variable_name(x, "chairs");
    model.set_objective_offset(1.);

    let c = Expression::new()
        .add_var(x)
        .add_var(y)
        .leq(&mut model, 4.)
        .unwrap();
    Expression::new()
        .add_var(x)
        .add(3., y)
        .leq(&mut model, 6.)
        .unwrap();
    (model, x, y, c)
}

#[test]
fn test_rebuild() {
    let (mut model, x, y, c) = production_model();
    assert_eq!(model.solve().unwrap(), SolveStatus::Optimal);
    let before = model.objective_value();
    let lp = model.to_lp_string().unwrap();

    model.rebuild().unwrap();

    assert_eq!(model.to_lp_string().unwrap(), lp);
    assert_eq!(model.solve().unwrap(), SolveStatus::Optimal);
    assert!(f64::abs(model.objective_value() - before) <= 1e-6);
    assert!(f64::abs(model.objective_value() - 12.) <= 1e-6);
    assert!(f64::abs(model.solution(x).unwrap() - 3.) <= 1e-6);
    assert!(f64::abs(model.solution(y).unwrap() - 1.) <= 1e-6);

    // the rebuilt engine accepts further edits
    model.set_constraint_coefficient(c, y, 2.).unwrap();
    assert_eq!(model.solve().unwrap(), SolveStatus::Optimal);
    assert!(f64::abs(model.objective_value() - 11.) <= 1e-6);
}

#[cfg(feature = "serde")]
#[test]
fn test_store_and_restore() {
    let (mut model, x, y, _) = production_model();
    model.max_iterations(50);
    let lp = model.to_lp_string().unwrap();

    let file = tempfile::NamedTempFile::new().unwrap();
    model.store_model(file.path()).unwrap();

    let mut restored = Model::new();
    // names live in the model, not in the file
    restored.set_variable_name(x, "chairs");
    restored.restore_model(file.path()).unwrap();

    assert!(restored.is_maximization());
    assert_eq!(restored.num_variables(), 2);
    assert_eq!(restored.num_constraints(), 2);
    assert_eq!(restored.objective_offset(), 1.);
    assert_eq!(restored.engine_settings().max_iterations, 50);
    assert_eq!(restored.variable_upper_bound(x), 3.);
    assert_eq!(restored.variable_upper_bound(y), f64::INFINITY);
    assert_eq!(restored.to_lp_string().unwrap(), lp);

    assert_eq!(restored.solve().unwrap(), SolveStatus::Optimal);
    assert!(f64::abs(restored.objective_value() - 12.) <= 1e-6);
}

#[cfg(feature = "serde")]
#[test]
fn test_restore_quadratic() {
    let mut model = Model::new();
    let x = model.add_variable();
    model.free_variable(x);
    model.set_objective_coefficient(x, -2.);
    model.set_quadratic_coefficient(x, 0.5).unwrap();

    let file = tempfile::NamedTempFile::new().unwrap();
    model.store_model(file.path()).unwrap();

    let mut restored = Model::new();
    restored.restore_model(file.path()).unwrap();
    assert_eq!(restored.quadratic_coefficient(x), 0.5);

    // min 0.5 x^2 - 2x
    assert_eq!(restored.solve().unwrap(), SolveStatus::Optimal);
    assert!(f64::abs(restored.solution(x).unwrap() - 2.) <= 1e-6);
    assert!(f64::abs(restored.objective_value() + 2.) <= 1e-6);
}

#[test]
fn test_restore_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.json");

    let (mut model, ..) = production_model();
    let err = model.restore_model(&path).unwrap_err();
    assert!(matches!(err, ModelError::Io(_)));
    assert!(err.to_string().contains("does not exist or cannot be read"));

    // the model is untouched
    assert_eq!(model.num_variables(), 2);
    assert_eq!(model.num_constraints(), 2);
}

#[cfg(feature = "serde")]
#[test]
fn test_restore_minimization_with_offset() {
    // min x + 2y - 2.5  s.t.  x + y >= 1
    let mut model = Model::new();
    let x = model.add_variable();
    let y = model.add_variable();
    model.set_objective_coefficient(x, 1.);
    model.set_objective_coefficient(y, 2.);
    model.set_objective_offset(-2.5);
    Expression::new()
        .add_var(x)
        .add_var(y)
        .geq(&mut model, 1.)
        .unwrap();

    let file = tempfile::NamedTempFile::new().unwrap();
    model.store_model(file.path()).unwrap();

    let mut restored = Model::new();
    restored.restore_model(file.path()).unwrap();
    assert!(!restored.is_maximization());
    assert_eq!(restored.objective_offset(), -2.5);
    assert_eq!(restored.objective_coefficient(x), 1.);
    assert_eq!(restored.objective_coefficient(y), 2.);

    assert_eq!(restored.solve().unwrap(), SolveStatus::Optimal);
    assert!(f64::abs(restored.objective_value() + 1.5) <= 1e-6);
}

#[cfg(feature = "serde")]
#[test]
fn test_store_after_solve() {
    let (mut model, x, ..) = production_model();
    assert_eq!(model.solve().unwrap(), SolveStatus::Optimal);

    let file = tempfile::NamedTempFile::new().unwrap();
    model.store_model(file.path()).unwrap();

    let mut restored = Model::new();
    restored.restore_model(file.path()).unwrap();
    assert!(restored.is_maximization());
    assert_eq!(restored.objective_offset(), 1.);
    assert_eq!(restored.objective_coefficient(x), 3.);
    assert!(f64::abs(restored.objective_value() - 12.) <= 1e-6);
    assert!(f64::abs(restored.solution(x).unwrap() - 3.) <= 1e-6);

    // a direction change after the solve is stored too
    model.minimization();
    model.store_model(file.path()).unwrap();
    restored.restore_model(file.path()).unwrap();
    assert!(!restored.is_maximization());
    assert_eq!(restored.objective_offset(), 1.);
    assert_eq!(restored.objective_coefficient(x), 3.);
}

#[cfg(feature = "serde")]
#[test]
fn test_stale_handles_after_restore() {
    let mut small = Model::new();
    small.add_variable();

    let file = tempfile::NamedTempFile::new().unwrap();
    small.store_model(file.path()).unwrap();

    let (mut model, _, y, _) = production_model();
    model.restore_model(file.path()).unwrap();
    assert_eq!(model.num_variables(), 1);

    // y no longer exists
    model.set_variable_upper_bound(y, 5.);
    model.set_objective_coefficient(y, 1.);
    assert!(model.variable_upper_bound(y).is_nan());
    assert_eq!(model.solve().unwrap(), SolveStatus::Optimal);
}
