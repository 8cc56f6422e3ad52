use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::EvcResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvcExtreme {
    pub segment_id: String,
    pub segment_name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentComparison {
    pub evc_value: f64,
    pub relative_to_average: f64,
    pub percentage_of_max: f64,
}

/// Share of each part in the positive side of the formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentContribution {
    pub reference_price_share: f64,
    pub revenue_enhancement_share: f64,
    pub cost_optimization_share: f64,
    /// Implementation cost relative to positive value plus the cost itself.
    pub implementation_cost_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvcAnalysis {
    pub max_evc: Option<EvcExtreme>,
    pub min_evc: Option<EvcExtreme>,
    pub average_evc: f64,
    pub evc_range: f64,
    pub segment_comparison: BTreeMap<String, SegmentComparison>,
    pub component_contributions: BTreeMap<String, ComponentContribution>,
    pub key_insights: Vec<String>,
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

fn extreme(result: &EvcResult) -> EvcExtreme {
    EvcExtreme {
        segment_id: result.segment_id.clone(),
        segment_name: result.segment_name.clone(),
        value: result.evc_value,
    }
}

/// Summarizes a batch of EVC results. An empty batch yields zeroed figures.
pub fn analyze_evc_results(results: &[EvcResult]) -> EvcAnalysis {
    let max = results
        .iter()
        .fold(None::<&EvcResult>, |best, result| match best {
            Some(best) if best.evc_value >= result.evc_value => Some(best),
            _ => Some(result),
        });
    let min = results
        .iter()
        .fold(None::<&EvcResult>, |best, result| match best {
            Some(best) if best.evc_value <= result.evc_value => Some(best),
            _ => Some(result),
        });

    let max_value = max.map_or(0.0, |result| result.evc_value);
    let min_value = min.map_or(0.0, |result| result.evc_value);
    let average_evc = if results.is_empty() {
        0.0
    } else {
        results.iter().map(|result| result.evc_value).sum::<f64>() / results.len() as f64
    };

    let segment_comparison = results
        .iter()
        .map(|result| {
            (
                result.segment_id.clone(),
                SegmentComparison {
                    evc_value: result.evc_value,
                    relative_to_average: ratio(result.evc_value, average_evc),
                    percentage_of_max: ratio(result.evc_value, max_value),
                },
            )
        })
        .collect();

    let component_contributions = results
        .iter()
        .map(|result| {
            let positive = result.reference_price
                + result.revenue_enhancement.value
                + result.cost_optimization.value;
            (
                result.segment_id.clone(),
                ComponentContribution {
                    reference_price_share: ratio(result.reference_price, positive),
                    revenue_enhancement_share: ratio(result.revenue_enhancement.value, positive),
                    cost_optimization_share: ratio(result.cost_optimization.value, positive),
                    implementation_cost_share: ratio(
                        result.implementation_cost,
                        positive + result.implementation_cost,
                    ),
                },
            )
        })
        .collect();

    let mut key_insights = Vec::new();
    if let Some(best) = max {
        key_insights.push(format!(
            "最も高いEVC値を持つセグメントは「{}」で、値は{:.0}円です。",
            best.segment_name, best.evc_value
        ));
        key_insights.push(format!(
            "セグメント間のEVC値の差は{:.0}円で、これは最大値の{:.1}%に相当します。",
            max_value - min_value,
            ratio(max_value - min_value, max_value) * 100.0
        ));
    }
    if let Some(worst) = min.filter(|result| result.evc_value < 0.0) {
        key_insights.push(format!(
            "「{}」ではEVCが負となり、参照価格に対して価値を毀損しています。",
            worst.segment_name
        ));
    }

    EvcAnalysis {
        max_evc: max.map(extreme),
        min_evc: min.map(extreme),
        average_evc,
        evc_range: max_value - min_value,
        segment_comparison,
        component_contributions,
        key_insights,
    }
}
