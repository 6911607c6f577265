//! Per-experiment handle returned by [`ExperimentContext::use_experiment`]
//!
//! [`ExperimentContext::use_experiment`]: super::ExperimentContext::use_experiment

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::domain::experiment::VariantTag;
use crate::domain::telemetry::{EventProperties, PROP_EXPERIMENT, PROP_VARIANT};

use super::ExperimentContext;

/// Callback invoked once per exposure with the experiment name and variant
pub type ExposureCallback = Box<dyn Fn(&str, &VariantTag) + Send + Sync>;

/// Declaration options for [`ExperimentContext::use_experiment`]
///
/// [`ExperimentContext::use_experiment`]: super::ExperimentContext::use_experiment
#[derive(Default)]
pub struct ExperimentOptions {
    pub(crate) variants: Option<Vec<String>>,
    pub(crate) weights: Option<Vec<f64>>,
    pub(crate) default_variant: Option<String>,
    pub(crate) on_exposure: Option<ExposureCallback>,
}

impl ExperimentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Variants to register, defaults to `A`/`B`
    pub fn with_variants<I, T>(mut self, variants: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.variants = Some(variants.into_iter().map(Into::into).collect());
        self
    }

    /// Weights aligned with the variants
    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Variant used when the declaration is rejected
    pub fn with_default_variant(mut self, variant: impl Into<String>) -> Self {
        self.default_variant = Some(variant.into());
        self
    }

    /// Callback run once per exposure
    pub fn on_exposure<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &VariantTag) + Send + Sync + 'static,
    {
        self.on_exposure = Some(Box::new(callback));
        self
    }

    /// Variant used when the declaration is rejected
    ///
    /// Tries `default_variant`, then the first usable declared variant, then `A`.
    pub(crate) fn fallback_variant(&self) -> VariantTag {
        let declared = self.variants.iter().flatten();

        self.default_variant
            .iter()
            .chain(declared)
            .find_map(|tag| VariantTag::new(tag.as_str()).ok())
            .unwrap_or_default()
    }
}

impl fmt::Debug for ExperimentOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExperimentOptions")
            .field("variants", &self.variants)
            .field("weights", &self.weights)
            .field("default_variant", &self.default_variant)
            .field("on_exposure", &self.on_exposure.is_some())
            .finish()
    }
}

/// How a handle resolves its variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// Assign on first read if the experiment is registered
    Assign,
    /// Read the existing assignment only, `A` when there is none
    Lookup,
    /// Fixed variant of a rejected declaration
    Fallback(VariantTag),
}

/// View of one experiment for the current visitor
pub struct ExperimentHandle<'a> {
    context: &'a ExperimentContext,
    experiment: String,
    resolution: Resolution,
}

impl<'a> ExperimentHandle<'a> {
    pub(crate) fn new(
        context: &'a ExperimentContext,
        experiment: impl Into<String>,
        resolution: Resolution,
    ) -> Self {
        Self {
            context,
            experiment: experiment.into(),
            resolution,
        }
    }

    /// Experiment the handle refers to
    pub fn experiment(&self) -> &str {
        &self.experiment
    }

    /// Variant currently in effect
    ///
    /// A handle from `use_experiment` assigns a registered experiment on first
    /// read. A handle from `ExperimentContext::handle` never assigns.
    pub fn variant(&self) -> VariantTag {
        match &self.resolution {
            Resolution::Assign => self.context.assign_variant(&self.experiment),
            Resolution::Lookup => self
                .context
                .get_variant(&self.experiment)
                .unwrap_or_default(),
            Resolution::Fallback(fallback) => fallback.clone(),
        }
    }

    /// Check whether the current variant is `tag`
    pub fn is_variant(&self, tag: &str) -> bool {
        self.variant().as_str() == tag
    }

    /// Pick the value matching the current variant
    ///
    /// `A` selects `for_a`, `B` selects `for_b`, any other tag is looked up in
    /// `others`. Unknown tags fall back to `for_a`.
    pub fn render_variant<T>(&self, for_a: T, for_b: T, mut others: HashMap<String, T>) -> T {
        let variant = self.variant();

        match variant.as_str() {
            "A" => for_a,
            "B" => for_b,
            tag => others.remove(tag).unwrap_or(for_a),
        }
    }

    /// Report a conversion attributed to this experiment
    ///
    /// `experiment` and `variant` override any caller property of the same
    /// name.
    pub fn track_conversion(&self, event: &str, mut properties: EventProperties) {
        let variant = self.variant();

        properties.insert(
            PROP_EXPERIMENT.to_string(),
            Value::String(self.experiment.clone()),
        );
        properties.insert(
            PROP_VARIANT.to_string(),
            Value::String(variant.as_str().to_string()),
        );

        self.context.track_event(event, properties);
    }
}

impl fmt::Debug for ExperimentHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExperimentHandle")
            .field("experiment", &self.experiment)
            .field("resolution", &self.resolution)
            .finish()
    }
}
