use lpmodel::engine::Scaling;
use lpmodel::model::*;

fn main() {
    // min (x - 1)^2 + (y - 2)^2  s.t.  x + y <= 2
    let mut model = Model::new();
    model.scaling(Scaling::Equilibrium).verbose(1);

    let x = model.add_variable();
    let y = model.add_variable();
    model.set_quadratic_coefficient(x, 1.).unwrap();
    model.set_quadratic_coefficient(y, 1.).unwrap();
    Expression::new()
        .add(-2., x)
        .add(-4., y)
        .add_constant(5.)
        .as_objective(&mut model);
    Expression::new()
        .add_var(x)
        .add_var(y)
        .leq(&mut model, 2.)
        .unwrap();

    model.print_model().unwrap();

    let status = model.solve().unwrap();
    println!("status    = {status}");
    println!("objective = {:.6}", model.objective_value());
    println!(
        "x = {:.6}, y = {:.6}",
        model.solution(x).unwrap(),
        model.solution(y).unwrap()
    );
}
