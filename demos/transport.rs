use lpmodel::model::*;

fn main() {
    let supply = [30., 25., 45.];
    let demand = [20., 30., 15., 35.];
    let cost = [
        [8., 6., 10., 9.],
        [9., 12., 13., 7.],
        [14., 9., 16., 5.],
    ];

    let mut model = Model::new();
    model.buffer(4);

    let flows: Vec<Vec<Variable>> = supply
        .iter()
        .enumerate()
        .map(|(i, _)| {
            model
                .add_variables(demand.len())
                .name(format!("ship_{i}"))
                .build()
                .unwrap()
        })
        .collect();

    for (i, row) in flows.iter().enumerate() {
        Expression::new()
            .add_terms(&cost[i], row)
            .unwrap()
            .as_objective(&mut model);
        let ctr = Expression::new()
            .add_vars(row)
            .leq(&mut model, supply[i])
            .unwrap();
        model.set_constraint_name(ctr, format!("supply_{i}"));
    }
    for (j, &d) in demand.iter().enumerate() {
        let column: Vec<Variable> = flows.iter().map(|row| row[j]).collect();
        let ctr = Expression::new()
            .add_vars(&column)
            .geq(&mut model, d)
            .unwrap();
        model.set_constraint_name(ctr, format!("demand_{j}"));
    }

    let status = model.minimize().unwrap();
    println!("status = {status}, cost = {:.3}", model.objective_value());

    for row in &flows {
        for &var in row {
            let amount = model.solution(var).unwrap();
            if amount > 1e-6 {
                println!("{:>10} = {amount:.3}", model.variable_name(var));
            }
        }
    }

    // compact the engine model after the incremental build and solve again
    model.rebuild().unwrap();
    let status = model.minimize().unwrap();
    println!("after rebuild: status = {status}, cost = {:.3}", model.objective_value());
}
