use lpmodel::model::*;

fn main() {
    // max x + 2y  s.t.  x + y <= 4,  x - y >= -2
    let mut model = Model::new();
    let x = model.add_variable();
    let y = model.add_variable();
    model.set_objective_coefficient(x, 1.);
    model.set_objective_coefficient(y, 2.);

    Expression::new()
        .add_var(x)
        .add_var(y)
        .leq(&mut model, 4.)
        .unwrap();
    Expression::new()
        .add_var(x)
        .add(-1., y)
        .geq(&mut model, -2.)
        .unwrap();

    model.print_model().unwrap();

    let status = model.maximize().unwrap();
    println!("status    = {status}");
    println!("objective = {}", model.objective_value());
    println!("x = {}, y = {}", model.solution(x).unwrap(), model.solution(y).unwrap());
}
