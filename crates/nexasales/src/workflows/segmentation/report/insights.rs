use crate::workflows::segmentation::priority::{PriorityRank, PriorityScore, ScoreFactor};

fn dominant_factor(score: &PriorityScore) -> Option<ScoreFactor> {
    score
        .score_components
        .iter()
        .max_by(|(_, a), (_, b)| a.contribution.total_cmp(&b.contribution))
        .map(|(factor, _)| *factor)
}

pub(crate) fn key_insights(scores: &[PriorityScore]) -> Vec<String> {
    let mut insights = Vec::new();

    let Some(top) = scores.first() else {
        return insights;
    };
    let driver = dominant_factor(top).map_or("", ScoreFactor::label);
    insights.push(format!(
        "「{}」は優先度スコア{:.2}（{}）で最も高く、最大の寄与要因は{}です。",
        top.segment_name,
        top.priority_score,
        top.priority_rank.label(),
        driver
    ));

    if let Some(bottom) = scores.last().filter(|_| scores.len() > 1) {
        insights.push(format!(
            "「{}」は優先度スコア{:.2}（{}）で最も低くなっています。",
            bottom.segment_name,
            bottom.priority_score,
            bottom.priority_rank.label()
        ));
    }

    for score in scores {
        let evc = score.score_components.get(&ScoreFactor::Evc);
        if evc.is_some_and(|factor| factor.raw_value <= 0.0) {
            insights.push(format!(
                "「{}」はEVCが0以下で、導入コストが価値を上回っています。",
                score.segment_name
            ));
        }
    }

    let focused = scores
        .iter()
        .filter(|score| matches!(score.priority_rank, PriorityRank::Top | PriorityRank::High))
        .count();
    insights.push(format!(
        "最優先・高優先のセグメントは{focused}件です。リソース配分はこれらに集中させ、低優先および最低優先セグメントには効率的なアプローチを採用することが推奨されます。"
    ));

    insights
}

fn any_ranked(scores: &[PriorityScore], ranks: &[PriorityRank]) -> bool {
    scores
        .iter()
        .any(|score| ranks.contains(&score.priority_rank))
}

pub(crate) fn recommendations(scores: &[PriorityScore]) -> Vec<String> {
    let mut recommendations = Vec::new();
    if any_ranked(scores, &[PriorityRank::Top]) {
        recommendations.push(
            "最優先セグメントには専任営業チームを編成し、トップマネジメントへの直接アプローチを行うことで、高いEVC値を持つ案件の獲得を目指します。".to_string(),
        );
    }
    if any_ranked(scores, &[PriorityRank::High]) {
        recommendations.push(
            "高優先セグメントには専門営業担当者をアサインし、セグメント特化型の訴求と紹介プログラムで獲得を加速します。".to_string(),
        );
    }
    if any_ranked(scores, &[PriorityRank::Medium]) {
        recommendations.push(
            "中優先セグメントにはデジタルマーケティングとパートナー企業との協業を活用し、選択的に投資します。".to_string(),
        );
    }
    if any_ranked(scores, &[PriorityRank::Low, PriorityRank::Lowest]) {
        recommendations.push(
            "低優先および最低優先セグメントには、デジタルマーケティングとセルフサービス型の導入プロセスを活用し、最小限のリソースで効率的にアプローチします。".to_string(),
        );
    }
    recommendations.push(
        "四半期ごとに優先度評価を見直し、市場環境や競合状況の変化に応じて戦略とリソース配分を調整します。".to_string(),
    );
    recommendations
}
