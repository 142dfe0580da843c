use crate::engine::{EngineError, SettingsError};
use thiserror::Error;

/// Error type returned by model building operations.
///
/// Every fallible operation validates its input before touching any model
/// state, so an `Err` always leaves the model as it was.
#[derive(Error, Debug)]
pub enum ModelError {
    /// An argument was rejected before any state changed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// A coefficient refers to a (constraint, variable) pair that is not a
    /// structural entry of the constraint matrix
    #[error("Constraint {constraint} does not contain variable {variable}. Coefficient not set.")]
    Structure {
        constraint: String,
        variable: String,
    },
    /// A model file could not be read or written
    #[error("Model file error: {0}")]
    Io(#[from] std::io::Error),
    /// The engine rejected a bulk load
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// A settings value was out of range
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl ModelError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ModelError::InvalidArgument(msg.into())
    }
}
