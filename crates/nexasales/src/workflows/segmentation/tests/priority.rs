use super::common::*;
use crate::workflows::segmentation::priority::{PriorityRank, PriorityScorer, ScoreFactor};

#[test]
fn segment_holding_every_maximum_scores_one() {
    let inputs = vec![
        priority_input("s1", 400_000.0, 5_000.0, 1.0, 0.25),
        priority_input("s2", 100_000.0, 2_000.0, 0.3, 0.05),
        priority_input("s3", -20_000.0, 800.0, 0.0, 0.0),
    ];

    let scores = PriorityScorer::new().score(&inputs);

    assert_eq!(scores[0].segment_id, "s1");
    assert_eq!(scores[0].priority_score, 1.0);
    assert_eq!(scores[0].priority_rank, PriorityRank::Top);
    for score in &scores {
        assert!((0.0..=1.0).contains(&score.priority_score), "{score:?}");
    }
}

#[test]
fn factors_are_weighted_and_normalized() {
    let inputs = vec![
        priority_input("s1", 200.0, 1_000.0, 0.5, 0.05),
        priority_input("s2", 100.0, 4_000.0, 0.2, 0.0),
    ];

    let scores = PriorityScorer::new().score(&inputs);
    let s1 = scores
        .iter()
        .find(|score| score.segment_id == "s1")
        .expect("s1 scored");

    let evc = &s1.score_components[&ScoreFactor::Evc];
    assert_eq!(evc.normalized_value, 1.0);
    assert_eq!(evc.weight, 0.4);
    let market = &s1.score_components[&ScoreFactor::MarketSize];
    assert_eq!(market.normalized_value, 0.25);
    assert_eq!(market.raw_value, 1_000.0);
    let growth = &s1.score_components[&ScoreFactor::GrowthRate];
    assert!((growth.normalized_value - 0.5).abs() < 1e-12);

    let expected = 0.4 + 0.2 * 0.25 + 0.3 * 0.5 + 0.1 * 0.5;
    assert!((s1.priority_score - expected).abs() < 1e-12);
    let total: f64 = s1.score_components.values().map(|c| c.contribution).sum();
    assert!((s1.priority_score - total).abs() < 1e-12);
}

#[test]
fn negative_values_clamp_to_zero_and_empty_batches_are_safe() {
    let scores = PriorityScorer::new().score(&[priority_input("s4", -5.0, 0.0, -0.3, -0.1)]);

    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].priority_score, 0.0);
    assert_eq!(scores[0].priority_rank, PriorityRank::Lowest);
    assert!(PriorityScorer::new().score(&[]).is_empty());
}

#[test]
fn ties_keep_input_order() {
    let inputs = vec![
        priority_input("s2", 100.0, 100.0, 0.1, 0.0),
        priority_input("s1", 100.0, 100.0, 0.1, 0.0),
        priority_input("s3", 300.0, 100.0, 0.1, 0.0),
    ];

    let order: Vec<_> = PriorityScorer::new()
        .score(&inputs)
        .into_iter()
        .map(|score| score.segment_id)
        .collect();

    assert_eq!(order, ["s3", "s2", "s1"]);
}

#[test]
fn growth_saturates_at_ten_percent() {
    let scores = PriorityScorer::new().score(&[
        priority_input("s1", 1.0, 1.0, 0.0, 0.10),
        priority_input("s2", 1.0, 1.0, 0.0, 0.40),
    ]);

    for score in &scores {
        assert_eq!(score.score_components[&ScoreFactor::GrowthRate].normalized_value, 1.0);
    }
}

#[test]
fn rank_boundaries_are_strict() {
    assert_eq!(PriorityRank::from_score(0.8), PriorityRank::Top);
    assert_eq!(PriorityRank::from_score(0.79999), PriorityRank::High);
    assert_eq!(PriorityRank::from_score(0.6), PriorityRank::High);
    assert_eq!(PriorityRank::from_score(0.4), PriorityRank::Medium);
    assert_eq!(PriorityRank::from_score(0.2), PriorityRank::Low);
    assert_eq!(PriorityRank::from_score(0.19999), PriorityRank::Lowest);
}
