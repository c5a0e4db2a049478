//! Equal-weight fusion.

use ronda_traits::Result;

use crate::strategy::{standardize_rows, weighted_composite, FusionInputs, FusionOutcome, FusionStrategy};
use crate::weights::WeightVector;

/// Combines every eligible factor with weight `1 / n`. The baseline the
/// other strategies fall back to.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualWeight;

impl FusionStrategy for EqualWeight {
    fn name(&self) -> &'static str {
        "equal_weight"
    }

    fn fuse(&self, inputs: &FusionInputs<'_>) -> Result<FusionOutcome> {
        let factors = inputs.eligible_factors();
        let weights = WeightVector::equal(&factors)?;
        let template = inputs.template()?;
        let composite = weighted_composite(
            inputs.standardized,
            &factors,
            template,
            |_, name| weights.get(name),
        )?;
        Ok(FusionOutcome {
            strategy: self.name().to_string(),
            composite: standardize_rows(&composite),
            weights,
            fell_back: false,
        })
    }
}
