mod insights;
mod strategy;
mod views;

pub use strategy::{create_action_plans, generate_strategies, ActionPlan, SegmentStrategy};
pub use views::{
    OverallStrategy, PriorityReport, RankedSegment, ReportSummary, ResourceAllocation,
    SegmentEvaluation,
};

use std::collections::BTreeMap;

use super::priority::{PriorityRank, PriorityScore};
use strategy::{IMMEDIATE_FOCUS_AREAS, QUARTERLY_REVIEW_POINTS};

pub const REPORT_TITLE: &str = "顧客セグメント優先度評価レポート";

/// Joins scores with strategies and action plans by segment id.
///
/// Segments without a strategy or plan get empty fields. Scores are taken in
/// the order given.
pub fn assemble(
    scores: &[PriorityScore],
    strategies: &[SegmentStrategy],
    action_plans: &[ActionPlan],
) -> PriorityReport {
    let strategies: BTreeMap<&str, &SegmentStrategy> = strategies
        .iter()
        .map(|strategy| (strategy.segment_id.as_str(), strategy))
        .collect();
    let action_plans: BTreeMap<&str, &ActionPlan> = action_plans
        .iter()
        .map(|plan| (plan.segment_id.as_str(), plan))
        .collect();

    let segment_evaluations = scores
        .iter()
        .map(|score| {
            let (approach, resource_allocation, timeline, value_proposition, key_tactics) =
                match strategies.get(score.segment_id.as_str()) {
                    Some(strategy) => (
                        strategy.approach.clone(),
                        strategy.resource_allocation.clone(),
                        strategy.timeline.clone(),
                        strategy.value_proposition.clone(),
                        strategy.key_tactics.clone(),
                    ),
                    None => Default::default(),
                };
            let action_plan = action_plans
                .get(score.segment_id.as_str())
                .map(|plan| (*plan).clone())
                .unwrap_or_else(|| ActionPlan {
                    segment_id: score.segment_id.clone(),
                    segment_name: score.segment_name.clone(),
                    ..ActionPlan::default()
                });

            SegmentEvaluation {
                segment_id: score.segment_id.clone(),
                segment_name: score.segment_name.clone(),
                priority_score: score.priority_score,
                priority_rank: score.priority_rank,
                score_components: score.score_components.clone(),
                strategy: approach,
                resource_allocation,
                timeline,
                value_proposition,
                key_tactics,
                action_plan,
            }
        })
        .collect();

    PriorityReport {
        title: REPORT_TITLE.to_string(),
        summary: summarize(scores),
        segment_evaluations,
        overall_strategy: OverallStrategy {
            resource_allocation: ResourceAllocation::standard(),
            immediate_focus_areas: IMMEDIATE_FOCUS_AREAS.iter().map(|s| s.to_string()).collect(),
            quarterly_review_points: QUARTERLY_REVIEW_POINTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        },
        key_insights: insights::key_insights(scores),
        recommendations: insights::recommendations(scores),
    }
}

fn summarize(scores: &[PriorityScore]) -> ReportSummary {
    let mut priority_distribution: BTreeMap<PriorityRank, usize> = PriorityRank::ordered()
        .into_iter()
        .map(|rank| (rank, 0))
        .collect();
    for score in scores {
        *priority_distribution.entry(score.priority_rank).or_insert(0) += 1;
    }

    ReportSummary {
        total_segments: scores.len(),
        priority_distribution,
        top_priority_segments: scores
            .iter()
            .take(2)
            .map(|score| RankedSegment {
                segment_id: score.segment_id.clone(),
                segment_name: score.segment_name.clone(),
                priority_score: score.priority_score,
                priority_rank: score.priority_rank,
            })
            .collect(),
    }
}
