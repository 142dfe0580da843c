#![allow(non_snake_case)]

use lpmodel::model::*;

fn small_model(buffer: usize) -> (Model, Vec<Variable>, Vec<Constraint>) {
    let mut model = Model::new();
    model.buffer(buffer);
    let vars = model.add_variables(4).build().unwrap();

    let ctrs = vec![
        model
            .add_constraint(&[(vars[0], 1.), (vars[2], 2.)], ConstraintKind::Leq, 5.)
            .unwrap(),
        model
            .add_constraint(&[(vars[1], -1.), (vars[3], 0.)], ConstraintKind::Geq, -2.)
            .unwrap(),
        model
            .add_constraint(&[(vars[2], 3.), (vars[0], 4.), (vars[3], 1.)], ConstraintKind::Eq, 7.)
            .unwrap(),
    ];
    (model, vars, ctrs)
}

#[test]
fn test_structure_error_before_and_after_flush() {
    let (mut model, x, c) = small_model(100);

    // staged
    assert!(matches!(
        model.set_constraint_coefficient(c[0], x[1], 1.),
        Err(ModelError::Structure { .. })
    ));
    assert!(model.constraint_coefficient(c[0], x[1]).is_err());

    model.to_lp_string().unwrap();

    // committed
    let err = model.set_constraint_coefficient(c[0], x[1], 1.).unwrap_err();
    match &err {
        ModelError::Structure {
            constraint,
            variable,
        } => {
            assert_eq!(constraint, "ctr_0");
            assert_eq!(variable, "x_1");
        }
        _ => panic!("unexpected error {err}"),
    }
    assert!(model.constraint_coefficient(c[0], x[1]).is_err());
}

#[test]
fn test_zero_coefficients_reserve_entries() {
    let (mut model, x, c) = small_model(100);
    model.to_lp_string().unwrap();

    assert_eq!(model.constraint_coefficient(c[1], x[3]).unwrap(), 0.);
    model.set_constraint_coefficient(c[1], x[3], 2.5).unwrap();
    assert_eq!(model.constraint_coefficient(c[1], x[3]).unwrap(), 2.5);
}

#[test]
fn test_pattern_independent_of_flush_timing() {
    // same model with every entity flushed immediately and with nothing
    // flushed until rendering
    let (mut eager, x_e, c_e) = small_model(1);
    let (mut lazy, x_l, c_l) = small_model(100);

    for (&ce, &cl) in c_e.iter().zip(&c_l) {
        for (&xe, &xl) in x_e.iter().zip(&x_l) {
            let a = eager.constraint_coefficient(ce, xe).ok();
            let b = lazy.constraint_coefficient(cl, xl).ok();
            assert_eq!(a, b);
        }
    }
    assert_eq!(eager.to_lp_string().unwrap(), lazy.to_lp_string().unwrap());

    // edits land in the same place either way
    eager.set_constraint_coefficient(c_e[2], x_e[0], -1.).unwrap();
    lazy.set_constraint_coefficient(c_l[2], x_l[0], -1.).unwrap();
    assert_eq!(eager.to_lp_string().unwrap(), lazy.to_lp_string().unwrap());
}

#[test]
fn test_edits_on_staged_and_committed_entities() {
    let (mut model, x, c) = small_model(100);

    // staged edits
    model.set_constraint_coefficient(c[2], x[0], 6.).unwrap();
    model.set_rhs(c[0], 8.);
    model.set_variable_upper_bound(x[1], 4.);
    assert_eq!(model.constraint_upper_bound(c[0]), 8.);
    assert_eq!(model.constraint_lower_bound(c[0]), f64::NEG_INFINITY);

    model.to_lp_string().unwrap();

    assert_eq!(model.constraint_coefficient(c[2], x[0]).unwrap(), 6.);
    assert_eq!(model.constraint_upper_bound(c[0]), 8.);
    assert_eq!(model.constraint_lower_bound(c[0]), f64::NEG_INFINITY);
    assert_eq!(model.variable_upper_bound(x[1]), 4.);

    // committed edits
    model.set_rhs(c[2], 9.);
    assert_eq!(model.constraint_lower_bound(c[2]), 9.);
    assert_eq!(model.constraint_upper_bound(c[2]), 9.);
    model.set_rhs(c[1], -3.);
    assert_eq!(model.constraint_lower_bound(c[1]), -3.);
    assert_eq!(model.constraint_upper_bound(c[1]), f64::INFINITY);

    model.free_constraint(c[1]);
    assert_eq!(model.constraint_lower_bound(c[1]), f64::NEG_INFINITY);
    model.free_variable(x[0]);
    assert_eq!(model.variable_lower_bound(x[0]), f64::NEG_INFINITY);
}

#[test]
fn test_direction_toggle() {
    let mut model = Model::new();
    let x = model.add_variable();
    let y = model.add_variable();
    model.set_objective_coefficient(x, 3.);
    model.set_quadratic_coefficient(x, 0.5).unwrap();
    model.to_lp_string().unwrap();
    // y still staged
    model.set_objective_coefficient(y, -1.5);

    model.maximization();
    assert_eq!(model.objective_coefficient(x), 3.);
    assert_eq!(model.objective_coefficient(y), -1.5);
    assert_eq!(model.quadratic_coefficient(x), 0.5);

    model.maximization().minimization();
    assert_eq!(model.objective_coefficient(x), 3.);
    assert_eq!(model.objective_coefficient(y), -1.5);
    assert_eq!(model.quadratic_coefficient(x), 0.5);
    assert!(!model.is_maximization());
}

#[test]
fn test_invalid_arguments() {
    let mut model = Model::new();
    let x = model.add_variable();

    assert!(matches!(
        model.add_constraint(&[], ConstraintKind::Leq, 1.),
        Err(ModelError::InvalidArgument(_))
    ));
    assert!(matches!(
        model.add_constraint_from(&[x], &[1., 2.], ConstraintKind::Leq, 1.),
        Err(ModelError::InvalidArgument(_))
    ));

    let mut other = Model::new();
    other.add_variable();
    let foreign = other.add_variable();
    assert!(model
        .add_constraint(&[(foreign, 1.)], ConstraintKind::Eq, 0.)
        .is_err());
    assert!(model.solution(foreign).is_err());
    assert_eq!(model.num_constraints(), 0);
}

#[test]
fn test_small_coefficients_dropped() {
    let mut model = Model::new();
    model.smallest_coefficient(1e-6).unwrap();
    let x = model.add_variable();
    let y = model.add_variable();
    let c = model
        .add_constraint(&[(x, 1e-9), (y, 1.)], ConstraintKind::Leq, 1.)
        .unwrap();
    model.set_objective_coefficient(x, -1e-7);

    assert_eq!(model.constraint_coefficient(c, x).unwrap(), 0.);
    assert_eq!(model.objective_coefficient(x), 0.);

    assert!(matches!(
        model.smallest_coefficient(-1.),
        Err(ModelError::InvalidArgument(_))
    ));
    assert_eq!(model.settings().smallest_element, 1e-6);
}

#[test]
fn test_foreign_handles_leave_model_unchanged() {
    let mut other = Model::new();
    let other_vars = other.add_variables(3).build().unwrap();
    let other_ctrs: Vec<Constraint> = (0..2)
        .map(|_| {
            other
                .add_constraint(&[(other_vars[0], 1.)], ConstraintKind::Leq, 1.)
                .unwrap()
        })
        .collect();
    let (var, ctr) = (other_vars[2], other_ctrs[1]);

    let mut model = Model::new();
    let x = model.add_variable();
    model.set_objective_coefficient(x, 1.);
    model.set_variable_upper_bound(x, 2.);

    model.set_variable_upper_bound(var, 4.);
    model.set_variable_bounds(var, 1., 4.);
    model.free_variable(var);
    model.set_objective_coefficient(var, 7.);
    assert!(model.variable_upper_bound(var).is_nan());
    assert!(model.objective_coefficient(var).is_nan());

    model.set_constraint_upper_bound(ctr, 3.);
    model.set_rhs(ctr, 3.);
    model.free_constraint(ctr);
    assert!(model.constraint_upper_bound(ctr).is_nan());
    assert!(matches!(
        model.set_constraint_coefficient(ctr, x, 1.),
        Err(ModelError::InvalidArgument(_))
    ));
    assert!(matches!(
        model.constraint_coefficient(ctr, x),
        Err(ModelError::InvalidArgument(_))
    ));

    assert_eq!(model.num_variables(), 1);
    assert_eq!(model.num_constraints(), 0);
    assert_eq!(model.maximize().unwrap(), SolveStatus::Optimal);
    assert!(f64::abs(model.objective_value() - 2.) <= 1e-6);
    assert!(model.dual_solution(ctr).is_err());

    // committed state rejects the same handles
    model.set_variable_lower_bound(var, 1.);
    model.set_constraint_lower_bound(ctr, 1.);
    assert!(model.variable_lower_bound(var).is_nan());
    assert!(model.constraint_lower_bound(ctr).is_nan());
    assert_eq!(model.variable_upper_bound(x), 2.);
}

#[test]
fn test_foreign_variable_in_staged_constraint() {
    let mut other = Model::new();
    other.add_variable();
    let foreign = other.add_variable();

    let mut model = Model::new();
    let x = model.add_variable();
    let c = model.add_constraint(&[(x, 1.)], ConstraintKind::Leq, 1.).unwrap();
    assert!(matches!(
        model.set_constraint_coefficient(c, foreign, 1.),
        Err(ModelError::InvalidArgument(_))
    ));
    assert_eq!(model.constraint_coefficient(c, x).unwrap(), 1.);
}
