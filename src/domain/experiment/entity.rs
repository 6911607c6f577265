//! Experiment domain entities

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::validation::{
    validate_experiment_name, validate_variant_tag, validate_weights, ExperimentValidationError,
};

/// Tag of the variant every experiment falls back to
pub const DEFAULT_VARIANT: &str = "A";

/// Tag of the second variant registered when none are declared
pub const SECONDARY_VARIANT: &str = "B";

// ============================================================================
// VariantTag
// ============================================================================

/// Name of one treatment within an experiment, e.g. `"A"` or `"B"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VariantTag(String);

impl VariantTag {
    /// Create a new variant tag with validation
    pub fn new(tag: impl Into<String>) -> Result<Self, ExperimentValidationError> {
        let tag = tag.into();
        validate_variant_tag(&tag)?;
        Ok(Self(tag))
    }

    /// The canonical default variant, `"A"`
    pub fn default_variant() -> Self {
        Self(DEFAULT_VARIANT.to_string())
    }

    /// Get the tag as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VariantTag {
    fn default() -> Self {
        Self::default_variant()
    }
}

impl TryFrom<String> for VariantTag {
    type Error = ExperimentValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for VariantTag {
    type Error = ExperimentValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VariantTag> for String {
    fn from(tag: VariantTag) -> Self {
        tag.0
    }
}

impl fmt::Display for VariantTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for VariantTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for VariantTag {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for VariantTag {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// ============================================================================
// AssignmentStrategy
// ============================================================================

/// How a new assignment is computed for an experiment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssignmentStrategy<'a> {
    /// Random draw over the cumulative weights, one per variant
    Weighted(&'a [f64]),
    /// Deterministic hash of visitor id and experiment name
    Hashed,
}

// ============================================================================
// ExperimentConfig
// ============================================================================

/// An experiment as declared by a consumer
///
/// Configs are only ever built through [`ExperimentConfig::new`], so every
/// instance has a valid name and a non-empty, duplicate-free variant list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentConfig {
    name: String,
    variants: Vec<VariantTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    weights: Option<Vec<f64>>,
}

impl ExperimentConfig {
    /// Create a config with the given variants and no weights
    pub fn new<I, T>(name: impl Into<String>, variants: I) -> Result<Self, ExperimentValidationError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let name = name.into();
        validate_experiment_name(&name)?;

        let mut seen = HashSet::new();
        let mut tags = Vec::new();

        for variant in variants {
            let tag = VariantTag::new(variant)?;

            if !seen.insert(tag.clone()) {
                return Err(ExperimentValidationError::DuplicateVariant(
                    tag.as_str().to_string(),
                ));
            }

            tags.push(tag);
        }

        if tags.is_empty() {
            return Err(ExperimentValidationError::NoVariants);
        }

        Ok(Self {
            name,
            variants: tags,
            weights: None,
        })
    }

    /// Create the default two-variant `A`/`B` experiment
    pub fn ab(name: impl Into<String>) -> Result<Self, ExperimentValidationError> {
        Self::new(name, [DEFAULT_VARIANT, SECONDARY_VARIANT])
    }

    /// Attach per-variant weights
    ///
    /// Weights must be finite and non-negative. A list whose length differs
    /// from the variant list is kept but ignored when assigning.
    pub fn with_weights(mut self, weights: Vec<f64>) -> Result<Self, ExperimentValidationError> {
        validate_weights(&weights)?;
        self.weights = Some(weights);
        Ok(self)
    }

    /// Get the experiment name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the variants in declared order
    pub fn variants(&self) -> &[VariantTag] {
        &self.variants
    }

    /// Get the declared weights, if any
    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    /// First declared variant
    pub fn first_variant(&self) -> &VariantTag {
        &self.variants[0]
    }

    /// Check whether a tag is one of the declared variants
    pub fn has_variant(&self, tag: &str) -> bool {
        self.variants.iter().any(|v| v.as_str() == tag)
    }

    /// Strategy used to pick a variant for a new visitor
    pub fn strategy(&self) -> AssignmentStrategy<'_> {
        match self.weights.as_deref() {
            Some(weights) if weights.len() == self.variants.len() => {
                AssignmentStrategy::Weighted(weights)
            }
            _ => AssignmentStrategy::Hashed,
        }
    }
}
