use super::{Model, ModelError};
use crate::engine::*;

// bound values at or beyond the largest float count as infinite
fn is_pos_inf(v: f64) -> bool {
    v >= f64::MAX
}

fn is_neg_inf(v: f64) -> bool {
    v <= -f64::MAX
}

// shortest round-trip representation, `1.0` for integral values
fn number(v: f64) -> String {
    format!("{v:?}")
}

fn term(value: f64, name: &str) -> String {
    if value == 0. {
        String::new()
    } else if value == 1. {
        format!(" + {name}")
    } else if value == -1. {
        format!(" - {name}")
    } else if value > 0. {
        format!(" + {} {name}", number(value))
    } else {
        format!(" - {} {name}", number(-value))
    }
}

impl<E> Model<E>
where
    E: SolvingEngine,
{
    /// The model in LP format.  Commits all staged data first.
    ///
    /// Free constraints are omitted, and so are the bounds of variables
    /// with the default bounds `[0, ∞)`.
    pub fn to_lp_string(&mut self) -> Result<String, ModelError> {
        self.flush_all()?;

        let (m, n) = (self.view.num_rows, self.view.num_cols);
        let sense = self.sense();
        let mut out = String::new();

        out.push_str(if self.maximize { "Maximize" } else { "Minimize" });
        out.push_str("\nobj:");
        if self.offset != 0. {
            out.push_str(&format!(" {}", number(self.offset)));
        }
        for col in 0..n {
            let c = self.view.get(VectorKind::Objective, col);
            out.push_str(&term(sense * c, &self.column_name(col)));
        }
        if let Some(q) = &self.quadratic {
            out.push_str(" + [");
            for col in 0..n {
                let name = format!("{}^2", self.column_name(col));
                out.push_str(&term(sense * q.get(col), &name));
            }
            out.push_str(" ] / 2");
        }

        out.push_str("\nSubject To\n");
        let mut lines: Vec<String> = (0..m).map(|row| format!("{}:", self.row_name(row))).collect();
        let elements = self.view.read(VectorKind::Elements, self.view.num_elements);
        let names: Vec<String> = (0..n).map(|col| self.column_name(col)).collect();
        let (starts, rows) = self.view.index_caches();
        for col in 0..n {
            for k in starts[col]..starts[col + 1] {
                lines[rows[k]].push_str(&term(elements[k], &names[col]));
            }
        }
        for (row, mut line) in lines.into_iter().enumerate() {
            let lb = self.view.get(VectorKind::RowLower, row);
            let ub = self.view.get(VectorKind::RowUpper, row);
            if lb == ub {
                line.push_str(&format!(" = {}", number(lb)));
            } else if is_neg_inf(lb) && !is_pos_inf(ub) {
                line.push_str(&format!(" <= {}", number(ub)));
            } else if is_pos_inf(ub) && !is_neg_inf(lb) {
                line.push_str(&format!(" >= {}", number(lb)));
            } else {
                continue;
            }
            out.push_str(&line);
            out.push('\n');
        }

        out.push_str("Bounds\n");
        for (col, name) in names.iter().enumerate() {
            let lb = self.view.get(VectorKind::ColLower, col);
            let ub = self.view.get(VectorKind::ColUpper, col);
            let line = if lb == 0. && !is_pos_inf(ub) {
                format!("{name} <= {}", number(ub))
            } else if is_neg_inf(lb) && is_pos_inf(ub) {
                format!("-inf <= {name} <= inf")
            } else if lb != 0. && !is_neg_inf(lb) && is_pos_inf(ub) {
                format!("{} <= {name} <= inf", number(lb))
            } else if is_neg_inf(lb) && !is_pos_inf(ub) {
                format!("-inf <= {name} <= {}", number(ub))
            } else if !is_neg_inf(lb) && !is_pos_inf(ub) {
                format!("{} <= {name} <= {}", number(lb), number(ub))
            } else {
                continue;
            };
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str("End");
        Ok(out)
    }

    /// Print the LP format rendering to standard output.
    pub fn print_model(&mut self) -> Result<(), ModelError> {
        println!("{}", self.to_lp_string()?);
        Ok(())
    }
}

#[test]
fn test_term_formatting() {
    assert_eq!(term(0., "x"), "");
    assert_eq!(term(1., "x"), " + x");
    assert_eq!(term(-1., "x"), " - x");
    assert_eq!(term(2.5, "x"), " + 2.5 x");
    assert_eq!(term(-3., "x"), " - 3.0 x");
    assert_eq!(term(-2. - 1.484345, "x"), " - 3.4843450000000002 x");
}
