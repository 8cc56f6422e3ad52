use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::strategy::ActionPlan;
use crate::workflows::segmentation::priority::{FactorScore, PriorityRank, ScoreFactor};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSegment {
    pub segment_id: String,
    pub segment_name: String,
    pub priority_score: f64,
    pub priority_rank: PriorityRank,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_segments: usize,
    /// Counts for all five ranks, zeros included.
    pub priority_distribution: BTreeMap<PriorityRank, usize>,
    pub top_priority_segments: Vec<RankedSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentEvaluation {
    pub segment_id: String,
    pub segment_name: String,
    pub priority_score: f64,
    pub priority_rank: PriorityRank,
    pub score_components: BTreeMap<ScoreFactor, FactorScore>,
    pub strategy: String,
    pub resource_allocation: String,
    pub timeline: String,
    pub value_proposition: String,
    pub key_tactics: Vec<String>,
    pub action_plan: ActionPlan,
}

/// Percent of each resource pool per rank. Not derived from scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAllocation {
    pub sales: BTreeMap<PriorityRank, u8>,
    pub marketing: BTreeMap<PriorityRank, u8>,
    pub product_development: BTreeMap<PriorityRank, u8>,
}

impl ResourceAllocation {
    pub fn standard() -> Self {
        let table = |percents: [u8; 5]| -> BTreeMap<PriorityRank, u8> {
            PriorityRank::ordered().into_iter().zip(percents).collect()
        };
        Self {
            sales: table([40, 30, 20, 10, 0]),
            marketing: table([30, 30, 20, 15, 5]),
            product_development: table([35, 25, 20, 15, 5]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallStrategy {
    pub resource_allocation: ResourceAllocation,
    pub immediate_focus_areas: Vec<String>,
    pub quarterly_review_points: Vec<String>,
}

/// Terminal artifact of a run. Carries no timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityReport {
    pub title: String,
    pub summary: ReportSummary,
    pub segment_evaluations: Vec<SegmentEvaluation>,
    pub overall_strategy: OverallStrategy,
    pub key_insights: Vec<String>,
    pub recommendations: Vec<String>,
}
