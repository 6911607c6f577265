//! Weighted random selection over declared variant weights

use crate::domain::experiment::VariantTag;

/// Picks a variant from a uniform draw and cumulative weights
#[derive(Debug, Clone, Copy)]
pub struct WeightedSelector;

impl WeightedSelector {
    /// Select the variant for a draw in `[0, 1)`
    ///
    /// Walks the cumulative weights in declared order and returns the first
    /// variant whose cumulative weight reaches the draw. When the weights sum
    /// to less than the draw the last variant is returned. Returns `None` only
    /// for an empty variant list.
    pub fn select<'a>(
        variants: &'a [VariantTag],
        weights: &[f64],
        draw: f64,
    ) -> Option<&'a VariantTag> {
        let mut cumulative = 0.0;

        for (variant, weight) in variants.iter().zip(weights) {
            cumulative += weight;

            if cumulative >= draw {
                return Some(variant);
            }
        }

        variants.last()
    }
}
