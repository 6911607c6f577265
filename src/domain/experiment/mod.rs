//! Experiment domain module for A/B testing
//!
//! This module provides the types that describe an experiment as declared by
//! a consumer: its name, its ordered variant tags and optional weights.

mod entity;
mod validation;

pub use entity::{
    AssignmentStrategy, ExperimentConfig, VariantTag, DEFAULT_VARIANT, SECONDARY_VARIANT,
};
pub use validation::{
    validate_experiment_name, validate_variant_tag, validate_weights, ExperimentValidationError,
};
