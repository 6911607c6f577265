//! Experiment validation utilities

use thiserror::Error;

/// Validation errors for experiments and variants
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExperimentValidationError {
    #[error("Experiment name cannot be empty")]
    EmptyName,

    #[error("Experiment must declare at least one variant")]
    NoVariants,

    #[error("Variant tag cannot be empty")]
    EmptyVariantTag,

    #[error("Duplicate variant tag: '{0}'")]
    DuplicateVariant(String),

    #[error("Weight at position {index} must be a non-negative finite number, got {value}")]
    InvalidWeight { index: usize, value: f64 },
}

/// Validate an experiment name
pub fn validate_experiment_name(name: &str) -> Result<(), ExperimentValidationError> {
    if name.trim().is_empty() {
        return Err(ExperimentValidationError::EmptyName);
    }

    Ok(())
}

/// Validate a variant tag
pub fn validate_variant_tag(tag: &str) -> Result<(), ExperimentValidationError> {
    if tag.trim().is_empty() {
        return Err(ExperimentValidationError::EmptyVariantTag);
    }

    Ok(())
}

/// Validate a weight list
///
/// Length is deliberately not checked here: a length mismatch is not an error,
/// the weights are simply ignored at assignment time.
pub fn validate_weights(weights: &[f64]) -> Result<(), ExperimentValidationError> {
    for (index, &value) in weights.iter().enumerate() {
        if !value.is_finite() || value < 0.0 {
            return Err(ExperimentValidationError::InvalidWeight { index, value });
        }
    }

    Ok(())
}
