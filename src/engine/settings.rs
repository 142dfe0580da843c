use derive_builder::Builder;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Error, Debug)]
/// Error type returned by settings validation
pub enum SettingsError {
    /// An error attributable to one of the fields
    #[error("Bad value for field \"{0}\"")]
    BadFieldValue(&'static str),
}

/// Parameter scaling applied by the solve backend before iterating.
///
/// The Clarabel backend has a single scaling method, Ruiz equilibration.
/// `Equilibrium`, `Geometric` and `Auto` all select it and only `Off`
/// disables it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Scaling {
    Off,
    Equilibrium,
    Geometric,
    #[default]
    Auto,
}

impl Scaling {
    /// Whether the backend equilibrates the problem data.
    pub fn is_enabled(self) -> bool {
        !matches!(self, Scaling::Off)
    }
}

/// Settings of a [`MemoryEngine`](crate::engine::MemoryEngine) model.
///
/// ```
/// use lpmodel::engine::EngineSettingsBuilder;
///
/// let settings = EngineSettingsBuilder::default()
///     .max_iterations(50)
///     .presolve(false)
///     .build()
///     .unwrap();
/// assert_eq!(settings.max_iterations, 50);
/// ```
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineSettings {
    ///engine log level, 0 (none) through 4 (verbose)
    #[builder(default = "0")]
    pub log_level: u32,

    ///maximum number of iterations
    #[builder(default = "200")]
    pub max_iterations: u32,

    ///maximum run time (seconds)
    #[builder(default = "f64::INFINITY")]
    pub max_seconds: f64,

    ///primal feasibility tolerance
    #[builder(default = "1e-8")]
    pub primal_tolerance: f64,

    ///dual feasibility / optimality gap tolerance
    #[builder(default = "1e-8")]
    pub dual_tolerance: f64,

    ///enable presolve
    #[builder(default = "true")]
    pub presolve: bool,

    ///parameter scaling
    #[builder(default = "Scaling::Auto")]
    pub scaling: Scaling,
}

impl Default for EngineSettings {
    fn default() -> EngineSettings {
        EngineSettingsBuilder::default().build().unwrap()
    }
}

impl EngineSettings {
    /// Checks that numeric fields are within their legal ranges.
    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_tolerance(self.primal_tolerance, "primal_tolerance")?;
        validate_tolerance(self.dual_tolerance, "dual_tolerance")?;
        validate_seconds(self.max_seconds)?;
        Ok(())
    }
}

impl From<SettingsError> for EngineSettingsBuilderError {
    fn from(e: SettingsError) -> Self {
        EngineSettingsBuilderError::ValidationError(e.to_string())
    }
}

/// Automatic pre-build settings validation
impl EngineSettingsBuilder {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(tol) = self.primal_tolerance {
            validate_tolerance(tol, "primal_tolerance")?;
        }
        if let Some(tol) = self.dual_tolerance {
            validate_tolerance(tol, "dual_tolerance")?;
        }
        if let Some(secs) = self.max_seconds {
            validate_seconds(secs)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------
// individual validation functions go here
// ---------------------------------------------------------

fn validate_tolerance(tol: f64, field: &'static str) -> Result<(), SettingsError> {
    if tol > 0.0 && tol.is_finite() {
        Ok(())
    } else {
        Err(SettingsError::BadFieldValue(field))
    }
}

fn validate_seconds(secs: f64) -> Result<(), SettingsError> {
    // NaN fails this check
    if secs >= 0.0 {
        Ok(())
    } else {
        Err(SettingsError::BadFieldValue("max_seconds"))
    }
}

#[test]
fn test_engine_settings_validate() {
    assert!(EngineSettingsBuilder::default()
        .primal_tolerance(0.)
        .build()
        .is_err());
    assert!(EngineSettingsBuilder::default()
        .max_seconds(-1.)
        .build()
        .is_err());

    let settings = EngineSettings::default();
    assert!(settings.validate().is_ok());
    assert_eq!(settings.scaling, Scaling::Auto);
    assert!(settings.max_seconds.is_infinite());
}
