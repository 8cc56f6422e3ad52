use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{Segment, SegmentTraits, SegmentType};
use super::evc::{ComponentPlan, EvcParameters, Parameter};
use super::ingest::characteristics::CharacteristicsProfile;

pub const BASE_FORMULA: &str = "EVC = R + (Re + Co) - I";

/// The four terms of the EVC formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EvcComponent {
    #[serde(rename = "R")]
    ReferencePrice,
    #[serde(rename = "Re")]
    RevenueEnhancement,
    #[serde(rename = "Co")]
    CostOptimization,
    #[serde(rename = "I")]
    ImplementationCost,
}

impl EvcComponent {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::ReferencePrice,
            Self::RevenueEnhancement,
            Self::CostOptimization,
            Self::ImplementationCost,
        ]
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::ReferencePrice => "R",
            Self::RevenueEnhancement => "Re",
            Self::CostOptimization => "Co",
            Self::ImplementationCost => "I",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::ReferencePrice => "参照価格",
            Self::RevenueEnhancement => "収益向上価値",
            Self::CostOptimization => "コスト最適化価値",
            Self::ImplementationCost => "導入コスト",
        }
    }

    pub const fn calculation(self) -> &'static str {
        match self {
            Self::ReferencePrice => "市場平均価格",
            Self::RevenueEnhancement => "売上増加率 × 年間売上 × 導入年数",
            Self::CostOptimization => "コスト削減率 × 年間コスト × 導入年数",
            Self::ImplementationCost => "初期費用 + 運用コスト × 導入年数",
        }
    }
}

/// Per-term multipliers. Serialized with the formula symbols as keys.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentWeights {
    #[serde(rename = "R")]
    pub r: f64,
    #[serde(rename = "Re")]
    pub re: f64,
    #[serde(rename = "Co")]
    pub co: f64,
    #[serde(rename = "I")]
    pub i: f64,
}

impl ComponentWeights {
    pub const BASE: Self = Self {
        r: 1.0,
        re: 1.2,
        co: 1.0,
        i: 0.9,
    };

    pub const fn get(&self, component: EvcComponent) -> f64 {
        match component {
            EvcComponent::ReferencePrice => self.r,
            EvcComponent::RevenueEnhancement => self.re,
            EvcComponent::CostOptimization => self.co,
            EvcComponent::ImplementationCost => self.i,
        }
    }

    /// `base * (1 + factor)` for each term.
    pub fn adjusted(&self, adjustments: &WeightAdjustments) -> Self {
        Self {
            r: self.r * (1.0 + adjustments.r),
            re: self.re * (1.0 + adjustments.re),
            co: self.co * (1.0 + adjustments.co),
            i: self.i * (1.0 + adjustments.i),
        }
    }
}

impl Default for ComponentWeights {
    fn default() -> Self {
        Self::BASE
    }
}

/// Additive factors applied on top of the base weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightAdjustments {
    #[serde(rename = "R")]
    pub r: f64,
    #[serde(rename = "Re")]
    pub re: f64,
    #[serde(rename = "Co")]
    pub co: f64,
    #[serde(rename = "I")]
    pub i: f64,
}

impl WeightAdjustments {
    pub fn for_traits(traits: SegmentTraits) -> Self {
        Self {
            r: 0.0,
            re: if traits.is_high_value { 0.2 } else { -0.2 },
            co: if traits.is_high_value { -0.1 } else { 0.2 },
            i: if traits.is_enterprise { -0.2 } else { 0.2 },
        }
    }
}

/// The single source of default EVC parameters.
pub struct DefaultParameterTable;

impl DefaultParameterTable {
    pub const REFERENCE_PRICE: f64 = 15_000.0;
    pub const IMPLEMENTATION_YEARS: f64 = 3.0;

    pub fn lookup(traits: SegmentTraits) -> EvcParameters {
        let (annual_revenue, annual_cost, revenue_increase_rate, cost_reduction_rate, initial_cost, operation_cost) =
            match (traits.is_enterprise, traits.is_high_value) {
                (true, true) => (1_000_000_000.0, 500_000_000.0, 0.05, 0.15, 500_000.0, 10_000.0),
                (true, false) => (800_000_000.0, 400_000_000.0, 0.03, 0.20, 400_000.0, 8_000.0),
                (false, true) => (200_000_000.0, 100_000_000.0, 0.08, 0.12, 200_000.0, 5_000.0),
                (false, false) => (50_000_000.0, 25_000_000.0, 0.02, 0.10, 100_000.0, 3_000.0),
            };

        EvcParameters {
            reference_price: Self::REFERENCE_PRICE,
            annual_revenue,
            annual_cost,
            revenue_increase_rate,
            cost_reduction_rate,
            initial_cost,
            operation_cost,
            implementation_years: Self::IMPLEMENTATION_YEARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    pub description: String,
    pub calculation: String,
    pub weight: f64,
}

/// Segment-specific formula handed to the EVC calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomizedFormula {
    pub segment_id: String,
    pub segment_name: String,
    pub segment_type: SegmentType,
    pub segment_type_label: String,
    pub base_formula: String,
    pub adjustments: WeightAdjustments,
    pub weights: ComponentWeights,
    pub components: BTreeMap<EvcComponent, ComponentSpec>,
    pub parameters: EvcParameters,
    /// Parameters taken from the default table rather than the characteristics.
    pub defaulted_parameters: Vec<Parameter>,
    pub component_plan: ComponentPlan,
    pub characteristic_hints: BTreeMap<String, String>,
    pub adjustment_justification: String,
}

pub struct FormulaCustomizer {
    base: ComponentWeights,
}

impl Default for FormulaCustomizer {
    fn default() -> Self {
        Self::new(ComponentWeights::BASE)
    }
}

impl FormulaCustomizer {
    pub fn new(base: ComponentWeights) -> Self {
        Self { base }
    }

    pub fn customize(
        &self,
        segment: &Segment,
        characteristics: &CharacteristicsProfile,
    ) -> CustomizedFormula {
        let traits = segment.traits();
        let segment_type = traits.segment_type();
        let adjustments = WeightAdjustments::for_traits(traits);
        let weights = self.base.adjusted(&adjustments);

        let mut parameters = DefaultParameterTable::lookup(traits);
        let mut defaulted_parameters = Vec::new();
        for parameter in Parameter::ordered() {
            match characteristics.overrides.get(&parameter) {
                Some(&value) => match parameter.check(value) {
                    Ok(()) => parameters.set(parameter, value),
                    Err(err) => {
                        warn!(
                            segment_id = %segment.id,
                            parameter = parameter.key(),
                            error = %err,
                            "dropping invalid parameter override; using table default"
                        );
                        defaulted_parameters.push(parameter);
                    }
                },
                None => defaulted_parameters.push(parameter),
            }
        }

        let components = EvcComponent::ordered()
            .into_iter()
            .map(|component| {
                (
                    component,
                    ComponentSpec {
                        description: component.description().to_string(),
                        calculation: component.calculation().to_string(),
                        weight: weights.get(component),
                    },
                )
            })
            .collect();

        CustomizedFormula {
            segment_id: segment.id.clone(),
            segment_name: segment.name.clone(),
            segment_type,
            segment_type_label: segment_type.label().to_string(),
            base_formula: BASE_FORMULA.to_string(),
            adjustments,
            weights,
            components,
            parameters,
            defaulted_parameters,
            component_plan: characteristics.component_plan.clone(),
            characteristic_hints: characteristics.hints.clone(),
            adjustment_justification: justification(traits),
        }
    }
}

fn justification(traits: SegmentTraits) -> String {
    let company = if traits.is_enterprise { "大企業" } else { "中小企業" };
    let value = if traits.is_high_value { "高価値" } else { "低価値" };
    let emphasis = match (traits.is_enterprise, traits.is_high_value) {
        (true, true) => "収益向上価値を重視し、導入コストへの感度が低い",
        (true, false) => "コスト最適化価値を重視し、収益向上価値への感度が低い",
        (false, true) => "収益向上価値を重視するが、導入コストへの感度も高い",
        (false, false) => "コスト削減をある程度重視するが、導入コストへの感度が非常に高い",
    };
    format!("{company}・{value}セグメントは{emphasis}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaValidation {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Checks weights and parameters, and suggests weight tweaks for the extreme segments.
pub fn validate_formula(formula: &CustomizedFormula) -> FormulaValidation {
    let mut issues = Vec::new();
    let mut recommendations = Vec::new();

    if formula.base_formula.trim().is_empty() {
        issues.push("基本フォーミュラが定義されていません".to_string());
    }

    for component in EvcComponent::ordered() {
        let weight = formula.weights.get(component);
        if !weight.is_finite() || weight <= 0.0 {
            issues.push(format!(
                "コンポーネント '{}' の重みは正の値である必要があります",
                component.symbol()
            ));
        }
    }

    for parameter in Parameter::ordered() {
        if let Err(err) = parameter.check(formula.parameters.get(parameter)) {
            issues.push(format!("パラメータ '{}' が不正です: {err}", parameter.key()));
        }
    }

    match formula.segment_type {
        SegmentType::LowValueHighBarrier if formula.weights.i < 1.2 => {
            recommendations.push(
                "中小企業・低価値セグメントでは、導入コストの重みをより高く設定することを検討してください"
                    .to_string(),
            );
        }
        SegmentType::HighValueLowBarrier if formula.weights.re < 1.1 => {
            recommendations.push(
                "大企業・高価値セグメントでは、収益向上価値の重みをより高く設定することを検討してください"
                    .to_string(),
            );
        }
        _ => {}
    }

    FormulaValidation {
        is_valid: issues.is_empty(),
        issues,
        recommendations,
    }
}
