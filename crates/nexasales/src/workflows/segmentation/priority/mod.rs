mod rank;
mod rules;

pub use rank::PriorityRank;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use rules::{score_components, Normalizer};

/// Factors feeding the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFactor {
    Evc,
    MarketSize,
    AcquisitionProbability,
    GrowthRate,
}

impl ScoreFactor {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::Evc,
            Self::MarketSize,
            Self::AcquisitionProbability,
            Self::GrowthRate,
        ]
    }

    /// Fixed weights; they sum to 1.
    pub const fn weight(self) -> f64 {
        match self {
            Self::Evc => 0.4,
            Self::MarketSize => 0.2,
            Self::AcquisitionProbability => 0.3,
            Self::GrowthRate => 0.1,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Evc => "EVC",
            Self::MarketSize => "市場規模",
            Self::AcquisitionProbability => "獲得確率",
            Self::GrowthRate => "成長率",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityInput {
    pub segment_id: String,
    pub segment_name: String,
    pub evc_value: f64,
    pub market_size: f64,
    pub acquisition_probability: f64,
    pub growth_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    pub raw_value: f64,
    pub normalized_value: f64,
    pub weight: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityScore {
    pub segment_id: String,
    pub segment_name: String,
    pub priority_score: f64,
    pub priority_rank: PriorityRank,
    pub score_components: BTreeMap<ScoreFactor, FactorScore>,
}

/// Stateless scorer ranking a batch of segments against each other.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorityScorer;

impl PriorityScorer {
    pub fn new() -> Self {
        Self
    }

    /// Scores every input relative to the batch maxima and returns the scores
    /// sorted by descending score, ties in input order.
    pub fn score(&self, inputs: &[PriorityInput]) -> Vec<PriorityScore> {
        let normalizer = Normalizer::for_batch(inputs);

        let mut scores: Vec<PriorityScore> = inputs
            .iter()
            .map(|input| {
                let (components, priority_score) = score_components(&normalizer, input);
                PriorityScore {
                    segment_id: input.segment_id.clone(),
                    segment_name: input.segment_name.clone(),
                    priority_score,
                    priority_rank: PriorityRank::from_score(priority_score),
                    score_components: components.into_iter().collect(),
                }
            })
            .collect();

        scores.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));
        scores
    }
}
