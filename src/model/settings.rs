use crate::algebra::DEFAULT_SMALLEST_ELEMENT;
use crate::engine::SettingsError;
use derive_builder::Builder;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Model-wide configuration.
///
/// ```
/// use lpmodel::model::ModelSettingsBuilder;
///
/// let settings = ModelSettingsBuilder::default()
///     .buffer_size(10)
///     .build()
///     .unwrap();
/// assert_eq!(settings.buffer_size, 10);
/// assert_eq!(settings.smallest_element, 1e-20);
/// ```
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ModelSettings {
    ///number of staged variables or constraints that triggers a flush
    #[builder(default = "100_000")]
    pub buffer_size: usize,

    ///coefficients smaller than this in magnitude are stored as zero
    #[builder(default = "DEFAULT_SMALLEST_ELEMENT")]
    pub smallest_element: f64,
}

impl Default for ModelSettings {
    fn default() -> ModelSettings {
        ModelSettingsBuilder::default().build().unwrap()
    }
}

impl ModelSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_smallest_element(self.smallest_element)
    }
}

impl From<SettingsError> for ModelSettingsBuilderError {
    fn from(e: SettingsError) -> Self {
        ModelSettingsBuilderError::ValidationError(e.to_string())
    }
}

/// Automatic pre-build settings validation
impl ModelSettingsBuilder {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(eps) = self.smallest_element {
            validate_smallest_element(eps)?;
        }
        Ok(())
    }
}

pub(crate) fn validate_smallest_element(eps: f64) -> Result<(), SettingsError> {
    // NaN fails this check
    if eps >= 0.0 {
        Ok(())
    } else {
        Err(SettingsError::BadFieldValue("smallest_element"))
    }
}

#[test]
fn test_model_settings_validate() {
    assert!(ModelSettingsBuilder::default()
        .smallest_element(-1e-9)
        .build()
        .is_err());
    assert!(ModelSettingsBuilder::default()
        .smallest_element(0.)
        .build()
        .is_ok());
    assert_eq!(ModelSettings::default().buffer_size, 100_000);
}
