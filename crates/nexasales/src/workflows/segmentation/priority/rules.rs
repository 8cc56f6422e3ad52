use super::{FactorScore, PriorityInput, ScoreFactor};

/// Batch-wide denominators for the relative factors.
pub(crate) struct Normalizer {
    max_evc: f64,
    max_market_size: f64,
}

pub(crate) const GROWTH_SATURATION: f64 = 0.10;

impl Normalizer {
    pub(crate) fn for_batch(inputs: &[PriorityInput]) -> Self {
        Self {
            max_evc: positive_max(inputs.iter().map(|input| input.evc_value)),
            max_market_size: positive_max(inputs.iter().map(|input| input.market_size)),
        }
    }

    pub(crate) fn normalize(&self, factor: ScoreFactor, input: &PriorityInput) -> (f64, f64) {
        let raw = match factor {
            ScoreFactor::Evc => input.evc_value,
            ScoreFactor::MarketSize => input.market_size,
            ScoreFactor::AcquisitionProbability => input.acquisition_probability,
            ScoreFactor::GrowthRate => input.growth_rate,
        };
        let normalized = match factor {
            ScoreFactor::Evc => raw / self.max_evc,
            ScoreFactor::MarketSize => raw / self.max_market_size,
            ScoreFactor::AcquisitionProbability => raw,
            ScoreFactor::GrowthRate => (raw / GROWTH_SATURATION).min(1.0),
        };
        (raw, unit(normalized))
    }
}

/// Largest value, or 1 when the batch is empty or has no positive value.
fn positive_max(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.filter(|value| value.is_finite()).fold(0.0_f64, f64::max);
    if max > 0.0 {
        max
    } else {
        1.0
    }
}

fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

pub(crate) fn score_components(
    normalizer: &Normalizer,
    input: &PriorityInput,
) -> (Vec<(ScoreFactor, FactorScore)>, f64) {
    let mut components = Vec::with_capacity(4);
    let mut total = 0.0;

    for factor in ScoreFactor::ordered() {
        let (raw_value, normalized_value) = normalizer.normalize(factor, input);
        let weight = factor.weight();
        let contribution = weight * normalized_value;
        total += contribution;
        components.push((
            factor,
            FactorScore {
                raw_value,
                normalized_value,
                weight,
                contribution,
            },
        ));
    }

    (components, unit(total))
}
