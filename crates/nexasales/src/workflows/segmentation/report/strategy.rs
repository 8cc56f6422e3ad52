use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::workflows::segmentation::domain::SegmentType;
use crate::workflows::segmentation::priority::{PriorityRank, PriorityScore};

struct RankStrategy {
    approach: &'static str,
    resource_allocation: &'static str,
    timeline: &'static str,
    key_tactics: &'static [&'static str],
}

struct RankActionPlan {
    immediate_actions: &'static [&'static str],
    short_term_actions: &'static [&'static str],
    mid_term_actions: &'static [&'static str],
    kpis: &'static [&'static str],
}

/// Go-to-market material specific to a segment type.
struct Playbook {
    tactics: &'static [&'static str],
    value_proposition: &'static str,
    immediate_actions: &'static [&'static str],
    kpis: &'static [&'static str],
}

const fn rank_strategy(rank: PriorityRank) -> RankStrategy {
    match rank {
        PriorityRank::Top => RankStrategy {
            approach: "積極的投資",
            resource_allocation: "最大リソース配分",
            timeline: "即時開始",
            key_tactics: &[
                "専任営業チームの編成",
                "カスタマイズされた提案資料の作成",
                "トップマネジメントへの直接アプローチ",
                "業界イベントでの集中的なプロモーション",
            ],
        },
        PriorityRank::High => RankStrategy {
            approach: "重点投資",
            resource_allocation: "高リソース配分",
            timeline: "1-2ヶ月以内に開始",
            key_tactics: &[
                "専門営業担当者のアサイン",
                "セグメント特化型マーケティング資料の作成",
                "業界セミナーの開催",
                "既存顧客からの紹介プログラムの活用",
            ],
        },
        PriorityRank::Medium => RankStrategy {
            approach: "選択的投資",
            resource_allocation: "中程度のリソース配分",
            timeline: "3-6ヶ月以内に開始",
            key_tactics: &[
                "標準的な営業プロセスの適用",
                "デジタルマーケティングの活用",
                "パートナー企業との協業",
                "成功事例の共有",
            ],
        },
        PriorityRank::Low => RankStrategy {
            approach: "効率的アプローチ",
            resource_allocation: "限定的なリソース配分",
            timeline: "6-12ヶ月以内に開始",
            key_tactics: &[
                "インバウンドマーケティングの活用",
                "セルフサービス型の導入プロセス",
                "オンラインセミナーの開催",
                "自動化されたフォローアップ",
            ],
        },
        PriorityRank::Lowest => RankStrategy {
            approach: "最小限の投資",
            resource_allocation: "最小限のリソース配分",
            timeline: "機会があれば対応",
            key_tactics: &[
                "標準製品の提供",
                "セルフサービスポータルの活用",
                "自動化されたマーケティング",
                "パートナー企業への委託",
            ],
        },
    }
}

const fn rank_action_plan(rank: PriorityRank) -> RankActionPlan {
    match rank {
        PriorityRank::Top => RankActionPlan {
            immediate_actions: &[
                "専任営業チームの編成（1週間以内）",
                "カスタマイズされた提案資料の作成（2週間以内）",
                "トップ企業リストの作成（1週間以内）",
                "初回アプローチ計画の策定（2週間以内）",
            ],
            short_term_actions: &[
                "トップマネジメントへの直接アプローチ開始（1ヶ月以内）",
                "業界イベントでのプロモーション計画策定（1ヶ月以内）",
                "初回商談の実施（1-2ヶ月以内）",
                "フィードバックの収集と提案の改善（2-3ヶ月以内）",
            ],
            mid_term_actions: &[
                "成約率向上のための戦略見直し（3ヶ月ごと）",
                "成功事例の作成と共有（6ヶ月以内）",
                "アップセル・クロスセル戦略の策定（6ヶ月以内）",
            ],
            kpis: &[
                "初回商談実施数：月間10件",
                "提案書提出数：月間5件",
                "成約数：四半期5件",
                "平均成約額：1,500万円",
            ],
        },
        PriorityRank::High => RankActionPlan {
            immediate_actions: &[
                "専門営業担当者のアサイン（2週間以内）",
                "セグメント特化型マーケティング資料の作成（3週間以内）",
                "ターゲット企業リストの作成（2週間以内）",
            ],
            short_term_actions: &[
                "業界セミナーの企画（1-2ヶ月以内）",
                "既存顧客からの紹介プログラムの開始（1-2ヶ月以内）",
                "初回アプローチの開始（1ヶ月以内）",
            ],
            mid_term_actions: &[
                "セミナー実施と見込み客の獲得（3-4ヶ月以内）",
                "成功事例の作成（6ヶ月以内）",
                "アプローチ方法の見直し（四半期ごと）",
            ],
            kpis: &[
                "初回商談実施数：月間5件",
                "提案書提出数：月間3件",
                "成約数：四半期3件",
                "平均成約額：1,000万円",
            ],
        },
        PriorityRank::Medium => RankActionPlan {
            immediate_actions: &[
                "標準的な営業プロセスの準備（1ヶ月以内）",
                "デジタルマーケティング施策の計画（1ヶ月以内）",
            ],
            short_term_actions: &[
                "デジタルマーケティングの開始（2-3ヶ月以内）",
                "パートナー企業との協業計画の策定（2-3ヶ月以内）",
                "成功事例の収集（3-4ヶ月以内）",
            ],
            mid_term_actions: &[
                "パートナー企業との協業開始（4-6ヶ月以内）",
                "成功事例の共有開始（6ヶ月以内）",
                "アプローチ方法の効果測定と改善（半年ごと）",
            ],
            kpis: &[
                "マーケティングリード獲得数：月間10件",
                "初回商談実施数：月間3件",
                "成約数：四半期2件",
                "平均成約額：500万円",
            ],
        },
        PriorityRank::Low => RankActionPlan {
            immediate_actions: &[
                "インバウンドマーケティング施策の計画（2ヶ月以内）",
                "セルフサービス型導入プロセスの準備（2ヶ月以内）",
            ],
            short_term_actions: &[
                "オンラインセミナーの企画（3-4ヶ月以内）",
                "自動化されたフォローアップの設定（3-4ヶ月以内）",
            ],
            mid_term_actions: &[
                "オンラインセミナーの実施（6ヶ月以内）",
                "インバウンドマーケティングの効果測定と改善（半年ごと）",
            ],
            kpis: &[
                "ウェブサイト訪問数：月間100件",
                "資料ダウンロード数：月間20件",
                "問い合わせ数：月間5件",
                "成約数：四半期1件",
                "平均成約額：300万円",
            ],
        },
        PriorityRank::Lowest => RankActionPlan {
            immediate_actions: &[
                "標準製品の提供準備（3ヶ月以内）",
                "セルフサービスポータルの準備（3ヶ月以内）",
            ],
            short_term_actions: &[
                "自動化されたマーケティングの設定（6ヶ月以内）",
                "パートナー企業への委託計画の策定（6ヶ月以内）",
            ],
            mid_term_actions: &[
                "パートナー企業への委託開始（9-12ヶ月以内）",
                "効果測定と改善（年1回）",
            ],
            kpis: &[
                "資料ダウンロード数：月間10件",
                "問い合わせ数：月間2件",
                "成約数：半年1件",
                "平均成約額：100万円",
            ],
        },
    }
}

const fn playbook(segment_type: SegmentType) -> Playbook {
    match segment_type {
        SegmentType::HighValueLowBarrier => Playbook {
            tactics: &[
                "AIを活用した高精度な売上予測機能の強調",
                "エンタープライズ統合機能の強化",
                "セキュリティ機能の強調",
                "トップマネジメント向けのエグゼクティブブリーフィングの実施",
            ],
            value_proposition: "高度な分析機能とエンタープライズ統合による業務効率化と売上向上",
            immediate_actions: &[
                "AIを活用した高精度な売上予測機能のデモ準備（2週間以内）",
                "エンタープライズ統合機能の事例集作成（2週間以内）",
                "セキュリティ機能の説明資料作成（1週間以内）",
                "トップマネジメント向けエグゼクティブブリーフィングの準備（2週間以内）",
            ],
            kpis: &[
                "エグゼクティブブリーフィング実施数：月間2件",
                "PoC実施数：四半期2件",
                "大規模導入案件成約数：半年2件",
            ],
        },
        SegmentType::LowValueLowBarrier => Playbook {
            tactics: &[
                "コスト最適化価値の明確な提示",
                "既存システムとの統合の容易さの強調",
                "シンプルな操作性の強調",
                "段階的な導入プランの提案",
            ],
            value_proposition: "コスト効率と既存システム統合による業務プロセスの最適化",
            immediate_actions: &[
                "コスト最適化価値の数値化資料作成（2週間以内）",
                "既存システム統合事例の収集（2週間以内）",
                "段階的導入プランのテンプレート作成（1週間以内）",
            ],
            kpis: &[
                "コスト削減効果提示数：月間3件",
                "既存システム統合提案数：月間2件",
                "段階的導入提案採用率：50%",
            ],
        },
        SegmentType::HighValueHighBarrier => Playbook {
            tactics: &[
                "成長支援機能の強調",
                "コストパフォーマンスの高さの提示",
                "使いやすさと短期間での導入の強調",
                "成功事例の共有",
            ],
            value_proposition: "成長企業向けの機能とコストパフォーマンスによる競争力強化",
            immediate_actions: &[
                "成長支援機能のデモ準備（2週間以内）",
                "コストパフォーマンス比較資料作成（1週間以内）",
                "短期導入事例の収集（2週間以内）",
            ],
            kpis: &[
                "成長企業向けセミナー参加者数：月間20名",
                "トライアル開始数：月間5件",
                "トライアルからの成約率：40%",
            ],
        },
        SegmentType::LowValueHighBarrier => Playbook {
            tactics: &[
                "低価格プランの提供",
                "シンプルな機能セットの強調",
                "セルフサービス型の導入プロセスの提供",
                "オンラインサポートの充実",
            ],
            value_proposition: "低コストで導入可能なシンプルなソリューションによる業務効率化",
            immediate_actions: &[
                "低価格プランの詳細設計（2週間以内）",
                "セルフサービス型導入ガイドの作成（2週間以内）",
                "オンラインサポート体制の整備（1週間以内）",
            ],
            kpis: &[
                "低価格プラン問い合わせ数：月間10件",
                "セルフサービス導入完了率：30%",
                "サポート満足度：80%以上",
            ],
        },
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

/// `primary` followed by the entries of `secondary` it does not already hold.
fn merged(primary: &[&str], secondary: &[&str]) -> Vec<String> {
    let mut items = owned(primary);
    for item in secondary {
        if !primary.contains(item) {
            items.push(item.to_string());
        }
    }
    items
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentStrategy {
    pub segment_id: String,
    pub segment_name: String,
    pub priority_rank: PriorityRank,
    pub priority_score: f64,
    pub approach: String,
    pub resource_allocation: String,
    pub timeline: String,
    pub value_proposition: String,
    pub key_tactics: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub segment_id: String,
    pub segment_name: String,
    pub immediate_actions: Vec<String>,
    pub short_term_actions: Vec<String>,
    pub mid_term_actions: Vec<String>,
    pub kpis: Vec<String>,
}

/// Strategy for each scored segment whose type is known.
pub fn generate_strategies(
    scores: &[PriorityScore],
    segment_types: &BTreeMap<String, SegmentType>,
) -> Vec<SegmentStrategy> {
    scores
        .iter()
        .filter_map(|score| {
            let segment_type = *segment_types.get(&score.segment_id)?;
            let template = rank_strategy(score.priority_rank);
            let playbook = playbook(segment_type);
            Some(SegmentStrategy {
                segment_id: score.segment_id.clone(),
                segment_name: score.segment_name.clone(),
                priority_rank: score.priority_rank,
                priority_score: score.priority_score,
                approach: template.approach.to_string(),
                resource_allocation: template.resource_allocation.to_string(),
                timeline: template.timeline.to_string(),
                value_proposition: playbook.value_proposition.to_string(),
                key_tactics: merged(playbook.tactics, template.key_tactics),
            })
        })
        .collect()
}

/// Rank timeline merged with the type playbook. Immediate actions and KPIs
/// list the type-specific entries first, then rank entries not already present.
pub fn create_action_plans(
    scores: &[PriorityScore],
    segment_types: &BTreeMap<String, SegmentType>,
) -> Vec<ActionPlan> {
    scores
        .iter()
        .filter_map(|score| {
            let segment_type = *segment_types.get(&score.segment_id)?;
            let template = rank_action_plan(score.priority_rank);
            let playbook = playbook(segment_type);

            Some(ActionPlan {
                segment_id: score.segment_id.clone(),
                segment_name: score.segment_name.clone(),
                immediate_actions: merged(playbook.immediate_actions, template.immediate_actions),
                short_term_actions: owned(template.short_term_actions),
                mid_term_actions: owned(template.mid_term_actions),
                kpis: merged(playbook.kpis, template.kpis),
            })
        })
        .collect()
}

pub(crate) const IMMEDIATE_FOCUS_AREAS: [&str; 3] = [
    "最優先セグメントへの専任チーム編成と集中的アプローチ",
    "高優先セグメント向けのマーケティング資料と営業プロセスの整備",
    "全セグメントのターゲット企業リストの作成と優先順位付け",
];

pub(crate) const QUARTERLY_REVIEW_POINTS: [&str; 5] = [
    "セグメント別KPI達成状況の評価",
    "市場環境の変化の分析",
    "競合状況の変化の分析",
    "優先度ランクの見直し",
    "リソース配分の調整",
];
