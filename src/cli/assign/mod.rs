//! Assign command - resolves and prints the variant for an experiment

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::context::ExperimentOptions;

/// Arguments for the assign command
#[derive(Args, Clone, Debug)]
pub struct AssignArgs {
    /// Experiment name
    pub experiment: String,

    /// Variants to declare, comma separated (defaults to A,B)
    #[arg(long, value_delimiter = ',')]
    pub variants: Option<Vec<String>>,

    /// Weights aligned with the variants, comma separated
    #[arg(long, value_delimiter = ',')]
    pub weights: Option<Vec<f64>>,

    /// Variant used if the declaration is rejected
    #[arg(long)]
    pub default_variant: Option<String>,
}

impl AssignArgs {
    fn options(&self) -> ExperimentOptions {
        let mut options = ExperimentOptions::new();

        if let Some(variants) = &self.variants {
            options = options.with_variants(variants.iter().cloned());
        }
        if let Some(weights) = &self.weights {
            options = options.with_weights(weights.clone());
        }
        if let Some(default_variant) = &self.default_variant {
            options = options.with_default_variant(default_variant.clone());
        }

        options
    }
}

/// Run the assign command
pub fn run(config: Option<&PathBuf>, args: AssignArgs) -> anyhow::Result<()> {
    let context = super::bootstrap(config)?;

    let handle = context.use_experiment(&args.experiment, args.options());
    let variant = handle.variant();

    info!(
        experiment = %args.experiment,
        variant = %variant,
        visitor_id = %context.visitor_id(),
        "Resolved variant"
    );

    println!("{}", variant);
    Ok(())
}
