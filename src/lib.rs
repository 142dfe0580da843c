//! __lpmodel__ builds sparse linear programs, and LPs with a diagonal
//! quadratic objective, incrementally on top of a native solving engine.
//!
//! The problem solved is
//!
//! $$
//! \begin{array}{rl}
//! \text{minimize (or maximize)} & c^T x + \sum_j q_j x_j^2 + c_0\\\\\[2ex\]
//!  \text{subject to} & \ell_r \le A x \le u_r \\\\\[1ex\]
//!         & \ell_c \le x \le u_c
//!  \end{array}
//! $$
//!
//! with a sparse constraint matrix $A$ stored in compressed sparse column
//! form inside the engine.
//!
//! Variables and constraints are first staged in buffers owned by the
//! [`Model`](model::Model), then committed to the engine in batches.  Once
//! committed, coefficients are edited in place through typed views over the
//! engine's own memory, so updating a large model never copies it.
//!
//! ## Features
//!
//! * __Batched construction__: staged rows and columns are flushed in bulk
//!   when a buffer fills up or the committed state is needed.
//!
//! * __Fixed structure__: a constraint's nonzero pattern is the set of
//!   variables it was created with.  Coefficients can be changed, but new
//!   entries cannot be inserted.
//!
//! * __Model files__: with the `serde` feature an engine model can be
//!   written to and read back from JSON.
//!
//! # License
//!
//! Licensed under Apache License, Version 2.0.

pub mod algebra;
pub mod engine;
pub mod model;

pub use engine::{EngineSettings, EngineSettingsBuilder, MemoryEngine, Scaling, SolvingEngine};
pub use model::{
    Constraint, ConstraintKind, Expression, Model, ModelError, ModelSettings, SolveStatus, Variable,
};
