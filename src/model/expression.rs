use super::{Constraint, ConstraintKind, Model, ModelError, Variable};
use crate::engine::{MemoryEngine, SolvingEngine};
use indexmap::IndexMap;

/// A linear expression `Σ coef·var + constant`.
///
/// Repeated variables are merged by summing their coefficients.  Terms
/// keep the order in which each variable was first added.
///
/// ```
/// use lpmodel::model::{Expression, Model};
///
/// let mut model = Model::new();
/// let x = model.add_variable();
/// let y = model.add_variable();
///
/// let ctr = Expression::new()
///     .add(2., x)
///     .add(1., y)
///     .add(-0.5, x)
///     .add_constant(1.)
///     .leq(&mut model, 4.)
///     .unwrap();
///
/// assert_eq!(model.constraint_coefficient(ctr, x).unwrap(), 1.5);
/// assert_eq!(model.constraint_upper_bound(ctr), 3.);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expression {
    terms: IndexMap<Variable, f64>,
    constant: f64,
}

impl Expression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value·var`.
    pub fn add(mut self, value: f64, var: Variable) -> Self {
        *self.terms.entry(var).or_insert(0.) += value;
        self
    }

    /// Add `var` with coefficient 1.
    pub fn add_var(self, var: Variable) -> Self {
        self.add(1., var)
    }

    /// Add the sum of `vars`.
    pub fn add_vars(self, vars: &[Variable]) -> Self {
        self.add_scaled(1., vars)
    }

    /// Add the sum of `vars`, each multiplied by `value`.
    pub fn add_scaled(self, value: f64, vars: &[Variable]) -> Self {
        vars.iter().fold(self, |e, &var| e.add(value, var))
    }

    /// Add `Σ values[i]·vars[i]`.
    pub fn add_terms(self, values: &[f64], vars: &[Variable]) -> Result<Self, ModelError> {
        if values.len() != vars.len() {
            return Err(ModelError::invalid("Arrays must be of equal length."));
        }
        Ok(values
            .iter()
            .zip(vars)
            .fold(self, |e, (&value, &var)| e.add(value, var)))
    }

    pub fn add_constant(mut self, value: f64) -> Self {
        self.constant += value;
        self
    }

    pub fn terms(&self) -> impl Iterator<Item = (Variable, f64)> + '_ {
        self.terms.iter().map(|(&var, &value)| (var, value))
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    fn add_to<E: SolvingEngine>(
        &self,
        model: &mut Model<E>,
        kind: ConstraintKind,
        rhs: f64,
    ) -> Result<Constraint, ModelError> {
        let terms: Vec<(Variable, f64)> = self.terms().collect();
        model.add_constraint(&terms, kind, rhs - self.constant)
    }

    /// Add `self <= rhs` to the model.
    pub fn leq<E: SolvingEngine>(&self, model: &mut Model<E>, rhs: f64) -> Result<Constraint, ModelError> {
        self.add_to(model, ConstraintKind::Leq, rhs)
    }

    /// Add `self >= rhs` to the model.
    pub fn geq<E: SolvingEngine>(&self, model: &mut Model<E>, rhs: f64) -> Result<Constraint, ModelError> {
        self.add_to(model, ConstraintKind::Geq, rhs)
    }

    /// Add `self == rhs` to the model.
    pub fn eq<E: SolvingEngine>(&self, model: &mut Model<E>, rhs: f64) -> Result<Constraint, ModelError> {
        self.add_to(model, ConstraintKind::Eq, rhs)
    }

    /// Add `self` as a free row.  Its bounds can be set later.
    pub fn free<E: SolvingEngine>(&self, model: &mut Model<E>, rhs: f64) -> Result<Constraint, ModelError> {
        self.add_to(model, ConstraintKind::Free, rhs)
    }

    /// Use the terms as objective coefficients and add the constant to the
    /// objective offset.  Coefficients of other variables are kept.
    pub fn as_objective<E: SolvingEngine>(&self, model: &mut Model<E>) {
        let terms: Vec<(Variable, f64)> = self.terms().collect();
        model.add_objective(&terms, self.constant);
    }
}

/// Builder for a batch of variables sharing bounds, objective coefficient
/// and a name prefix.  Create it with [`Model::add_variables`].
#[derive(Debug)]
pub struct VariableSet<'a, E = MemoryEngine>
where
    E: SolvingEngine,
{
    model: &'a mut Model<E>,
    size: usize,
    lb: f64,
    ub: f64,
    obj: f64,
    name: Option<String>,
}

impl<'a, E> VariableSet<'a, E>
where
    E: SolvingEngine,
{
    pub(crate) fn new(model: &'a mut Model<E>, size: usize) -> Self {
        Self {
            model,
            size,
            lb: 0.,
            ub: f64::INFINITY,
            obj: 0.,
            name: None,
        }
    }

    /// Variables are named `<prefix>_<i>`.
    pub fn name(mut self, prefix: impl Into<String>) -> Self {
        self.name = Some(prefix.into());
        self
    }

    pub fn obj(mut self, value: f64) -> Self {
        self.obj = value;
        self
    }

    pub fn lb(mut self, value: f64) -> Self {
        self.lb = value;
        self
    }

    pub fn ub(mut self, value: f64) -> Self {
        self.ub = value;
        self
    }

    pub fn free(mut self) -> Self {
        self.lb = f64::NEG_INFINITY;
        self.ub = f64::INFINITY;
        self
    }

    pub fn build(self) -> Result<Vec<Variable>, ModelError> {
        if self.size < 1 {
            return Err(ModelError::invalid(
                "The size of the set of variables must be at least 1.",
            ));
        }
        let model = self.model;
        let vars = (0..self.size)
            .map(|i| {
                let var = model.add_variable();
                if let Some(prefix) = &self.name {
                    model.set_variable_name(var, format!("{prefix}_{i}"));
                }
                if self.lb != 0. {
                    model.set_variable_lower_bound(var, self.lb);
                }
                if self.ub != f64::INFINITY {
                    model.set_variable_upper_bound(var, self.ub);
                }
                if self.obj != 0. {
                    model.set_objective_coefficient(var, self.obj);
                }
                var
            })
            .collect();
        Ok(vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_merges_terms() {
        let mut model = Model::new();
        let x = model.add_variable();
        let y = model.add_variable();

        let e = Expression::new().add(-2., x).add_var(y).add(-1.484345, x);
        let terms: Vec<_> = e.terms().collect();
        assert_eq!(terms, vec![(x, -3.4843450000000002), (y, 1.)]);
    }

    #[test]
    fn test_expression_empty_constraint_rejected() {
        let mut model = Model::new();
        let res = Expression::new().add_constant(1.).eq(&mut model, 2.);
        assert!(matches!(res, Err(ModelError::InvalidArgument(_))));
        assert_eq!(model.num_constraints(), 0);
    }

    #[test]
    fn test_expression_add_terms_length() {
        let mut model = Model::new();
        let x = model.add_variable();
        assert!(Expression::new().add_terms(&[1., 2.], &[x]).is_err());
        let e = Expression::new().add_terms(&[1., 2.], &[x, x]).unwrap();
        assert_eq!(e.len(), 1);
    }

    #[test]
    fn test_variable_set() {
        let mut model = Model::new();
        let vars = model.add_variables(3).name("flow").ub(2.).obj(1.5).build().unwrap();

        assert_eq!(vars.len(), 3);
        assert_eq!(model.variable_name(vars[2]), "flow_2");
        assert_eq!(model.variable_upper_bound(vars[1]), 2.);
        assert_eq!(model.variable_lower_bound(vars[1]), 0.);
        assert_eq!(model.objective_coefficient(vars[0]), 1.5);

        assert!(model.add_variables(0).build().is_err());
        assert_eq!(model.num_variables(), 3);
    }
}
