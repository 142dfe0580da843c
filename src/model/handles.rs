use crate::engine::*;

/// Handle to a model variable (a column).
///
/// The index is assigned when the variable is added and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    pub(crate) index: usize,
}

impl Variable {
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Relation of a constraint's left-hand side to its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// `lhs <= rhs`
    Leq,
    /// `lhs >= rhs`
    Geq,
    /// `lhs == rhs`
    Eq,
    /// no relation, the row is free
    Free,
}

impl ConstraintKind {
    /// Row `(lower, upper)` bounds for a right-hand side.
    pub fn bounds(self, rhs: f64) -> (f64, f64) {
        match self {
            ConstraintKind::Eq => (rhs, rhs),
            ConstraintKind::Geq => (rhs, f64::INFINITY),
            ConstraintKind::Leq => (f64::NEG_INFINITY, rhs),
            ConstraintKind::Free => (f64::NEG_INFINITY, f64::INFINITY),
        }
    }
}

/// Handle to a model constraint (a row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Constraint {
    pub(crate) index: usize,
    pub(crate) kind: ConstraintKind,
}

impl Constraint {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }
}

/// Where an entity's data currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    /// in a staging buffer, at `offset` from the buffer's first entry
    Staged { offset: usize },
    /// in native memory at absolute `index`
    Committed { index: usize },
}

impl Slot {
    /// Resolve an absolute index against the number of committed entities.
    #[inline]
    pub(crate) fn resolve(index: usize, committed: usize) -> Slot {
        if index < committed {
            Slot::Committed { index }
        } else {
            Slot::Staged {
                offset: index - committed,
            }
        }
    }
}

/// Outcome of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    Limit,
    Error,
    Unknown,
}

impl SolveStatus {
    /// Map an engine status code.
    pub fn from_code(code: i32) -> Self {
        match code {
            STATUS_OPTIMAL => SolveStatus::Optimal,
            STATUS_INFEASIBLE => SolveStatus::Infeasible,
            STATUS_UNBOUNDED => SolveStatus::Unbounded,
            STATUS_LIMIT => SolveStatus::Limit,
            STATUS_ERROR => SolveStatus::Error,
            _ => SolveStatus::Unknown,
        }
    }
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[test]
fn test_slot_resolve() {
    assert_eq!(Slot::resolve(2, 3), Slot::Committed { index: 2 });
    assert_eq!(Slot::resolve(3, 3), Slot::Staged { offset: 0 });
    assert_eq!(Slot::resolve(7, 3), Slot::Staged { offset: 4 });
}

#[test]
fn test_status_codes() {
    assert_eq!(SolveStatus::from_code(0), SolveStatus::Optimal);
    assert_eq!(SolveStatus::from_code(3), SolveStatus::Limit);
    assert_eq!(SolveStatus::from_code(-1), SolveStatus::Unknown);
    assert_eq!(SolveStatus::from_code(17), SolveStatus::Unknown);
}
