use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::params::EvcParameters;

/// Which value component a sub-component feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Revenue,
    Cost,
}

impl ValueKind {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Revenue => "Re",
            Self::Cost => "Co",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Revenue => "収益向上価値",
            Self::Cost => "コスト最適化価値",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Revenue => "サービス導入による売上向上効果",
            Self::Cost => "サービス導入によるコスト削減効果",
        }
    }

    /// Sub-component names with built-in calculation modes.
    pub const fn catalog(self) -> &'static [&'static str] {
        match self {
            Self::Revenue => &[
                "revenue_growth",
                "new_revenue",
                "retention_revenue",
                "pricing_revenue",
                "transaction_revenue",
            ],
            Self::Cost => &[
                "cost_reduction",
                "direct_cost_reduction",
                "quality_cost_reduction",
                "risk_cost_reduction",
                "time_cost_reduction",
            ],
        }
    }
}

/// Enables one catalog sub-component in a given calculation mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubComponentConfig {
    pub mode: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
}

impl SubComponentConfig {
    pub fn new(mode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: f64) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }
}

/// Named component carrying a pre-computed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomComponent {
    pub calculated_value: f64,
    #[serde(default)]
    pub formula: String,
}

/// Which sub-components contribute to Re and Co, and with what inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentPlan {
    pub revenue: BTreeMap<String, SubComponentConfig>,
    pub cost: BTreeMap<String, SubComponentConfig>,
    pub custom_revenue: BTreeMap<String, CustomComponent>,
    pub custom_cost: BTreeMap<String, CustomComponent>,
    /// Inputs shared by every sub-component that does not set its own.
    pub extra_parameters: BTreeMap<String, f64>,
}

impl Default for ComponentPlan {
    /// Baseline plan: revenue growth and cost reduction in standard mode.
    fn default() -> Self {
        let mut plan = Self::empty();
        plan.revenue
            .insert("revenue_growth".to_string(), SubComponentConfig::new("standard"));
        plan.cost
            .insert("cost_reduction".to_string(), SubComponentConfig::new("standard"));
        plan
    }
}

impl ComponentPlan {
    pub fn empty() -> Self {
        Self {
            revenue: BTreeMap::new(),
            cost: BTreeMap::new(),
            custom_revenue: BTreeMap::new(),
            custom_cost: BTreeMap::new(),
            extra_parameters: BTreeMap::new(),
        }
    }

    pub fn configs(&self, kind: ValueKind) -> &BTreeMap<String, SubComponentConfig> {
        match kind {
            ValueKind::Revenue => &self.revenue,
            ValueKind::Cost => &self.cost,
        }
    }

    pub fn configs_mut(&mut self, kind: ValueKind) -> &mut BTreeMap<String, SubComponentConfig> {
        match kind {
            ValueKind::Revenue => &mut self.revenue,
            ValueKind::Cost => &mut self.cost,
        }
    }

    pub fn customs(&self, kind: ValueKind) -> &BTreeMap<String, CustomComponent> {
        match kind {
            ValueKind::Revenue => &self.custom_revenue,
            ValueKind::Cost => &self.custom_cost,
        }
    }

    pub fn customs_mut(&mut self, kind: ValueKind) -> &mut BTreeMap<String, CustomComponent> {
        match kind {
            ValueKind::Revenue => &mut self.custom_revenue,
            ValueKind::Cost => &mut self.custom_cost,
        }
    }
}

/// Audit entry for one enabled sub-component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubComponentDetail {
    pub mode: String,
    pub formula: String,
    pub raw_value: f64,
    pub parameters: BTreeMap<String, f64>,
}

struct Formula {
    text: &'static str,
    inputs: &'static [&'static str],
    eval: fn(&[f64]) -> f64,
}

const CUSTOM: Formula = Formula {
    text: "calculated_value",
    inputs: &["calculated_value"],
    eval: |v| v[0],
};

fn formula(kind: ValueKind, name: &str, mode: &str) -> Option<Formula> {
    if mode == "custom" {
        return kind.catalog().contains(&name).then_some(CUSTOM);
    }

    let formula = match (kind, name, mode) {
        (ValueKind::Revenue, "revenue_growth", "standard") => Formula {
            text: "revenue_increase_rate × annual_revenue × implementation_years",
            inputs: &["revenue_increase_rate", "annual_revenue", "implementation_years"],
            eval: |v| v[0] * v[1] * v[2],
        },
        (ValueKind::Revenue, "new_revenue", "standard") => Formula {
            text: "new_customers × average_customer_value + new_products × product_revenue",
            inputs: &[
                "new_customers",
                "average_customer_value",
                "new_products",
                "product_revenue",
            ],
            eval: |v| v[0] * v[1] + v[2] * v[3],
        },
        (ValueKind::Revenue, "new_revenue", "saas") => Formula {
            text: "new_customers × average_arpu + expansion_revenue",
            inputs: &["new_customers", "average_arpu", "expansion_revenue"],
            eval: |v| v[0] * v[1] + v[2],
        },
        (ValueKind::Revenue, "new_revenue", "manufacturing") => Formula {
            text: "new_clients × units_per_client × unit_price",
            inputs: &["new_clients", "units_per_client", "unit_price"],
            eval: |v| v[0] * v[1] * v[2],
        },
        (ValueKind::Revenue, "retention_revenue", "standard") => Formula {
            text: "retained_customers × customer_lifetime_value",
            inputs: &["retained_customers", "customer_lifetime_value"],
            eval: |v| v[0] * v[1],
        },
        (ValueKind::Revenue, "retention_revenue", "subscription") => Formula {
            text: "churn_reduction × current_customers × annual_contract_value",
            inputs: &["churn_reduction", "current_customers", "annual_contract_value"],
            eval: |v| v[0] * v[1] * v[2],
        },
        (ValueKind::Revenue, "pricing_revenue", "standard") => Formula {
            text: "price_increase × customer_base × revenue_per_customer",
            inputs: &["price_increase", "customer_base", "revenue_per_customer"],
            eval: |v| v[0] * v[1] * v[2],
        },
        (ValueKind::Revenue, "pricing_revenue", "premium") => Formula {
            text: "price_premium × target_segment_size × revenue_per_customer",
            inputs: &["price_premium", "target_segment_size", "revenue_per_customer"],
            eval: |v| v[0] * v[1] * v[2],
        },
        (ValueKind::Revenue, "transaction_revenue", "standard") => Formula {
            text: "transaction_increase × customer_base × average_transaction_value",
            inputs: &[
                "transaction_increase",
                "customer_base",
                "average_transaction_value",
            ],
            eval: |v| v[0] * v[1] * v[2],
        },
        (ValueKind::Cost, "cost_reduction", "standard") => Formula {
            text: "cost_reduction_rate × annual_cost × implementation_years",
            inputs: &["cost_reduction_rate", "annual_cost", "implementation_years"],
            eval: |v| v[0] * v[1] * v[2],
        },
        (ValueKind::Cost, "direct_cost_reduction", "standard") => Formula {
            text: "(manual_hours - automated_hours) × hourly_rate + resource_savings",
            inputs: &[
                "manual_hours",
                "automated_hours",
                "hourly_rate",
                "resource_savings",
            ],
            eval: |v| (v[0] - v[1]) * v[2] + v[3],
        },
        (ValueKind::Cost, "direct_cost_reduction", "cloud_migration") => Formula {
            text: "(infrastructure_cost_current - infrastructure_cost_cloud) + maintenance_reduction",
            inputs: &[
                "infrastructure_cost_current",
                "infrastructure_cost_cloud",
                "maintenance_reduction",
            ],
            eval: |v| (v[0] - v[1]) + v[2],
        },
        (ValueKind::Cost, "quality_cost_reduction", "standard") => Formula {
            text: "defect_reduction × defect_cost + complaint_reduction × complaint_cost",
            inputs: &[
                "defect_reduction",
                "defect_cost",
                "complaint_reduction",
                "complaint_cost",
            ],
            eval: |v| v[0] * v[1] + v[2] * v[3],
        },
        (ValueKind::Cost, "quality_cost_reduction", "six_sigma") => Formula {
            text: "defect_rate_reduction × quality_cost_per_defect × production_volume",
            inputs: &[
                "defect_rate_reduction",
                "quality_cost_per_defect",
                "production_volume",
            ],
            eval: |v| v[0] * v[1] * v[2],
        },
        (ValueKind::Cost, "risk_cost_reduction", "standard") => Formula {
            text: "risk_reduction_factor × risk_exposure_value",
            inputs: &["risk_reduction_factor", "risk_exposure_value"],
            eval: |v| v[0] * v[1],
        },
        (ValueKind::Cost, "risk_cost_reduction", "compliance") => Formula {
            text: "compliance_penalty_reduction + incident_probability_reduction × average_incident_cost",
            inputs: &[
                "compliance_penalty_reduction",
                "incident_probability_reduction",
                "average_incident_cost",
            ],
            eval: |v| v[0] + v[1] * v[2],
        },
        (ValueKind::Cost, "time_cost_reduction", "standard") => Formula {
            text: "decision_time_savings × opportunity_cost_rate",
            inputs: &["decision_time_savings", "opportunity_cost_rate"],
            eval: |v| v[0] * v[1],
        },
        (ValueKind::Cost, "time_cost_reduction", "process_improvement") => Formula {
            text: "process_time_reduction × process_frequency × employee_cost_per_hour / 60",
            inputs: &[
                "process_time_reduction",
                "process_frequency",
                "employee_cost_per_hour",
            ],
            eval: |v| v[0] * v[1] * v[2] / 60.0,
        },
        _ => return None,
    };
    Some(formula)
}

/// Sums every enabled sub-component of `kind`, before weighting.
///
/// Sub-components with an unknown mode or a missing input are skipped and do
/// not appear in the returned breakdown.
pub(crate) fn evaluate(
    kind: ValueKind,
    plan: &ComponentPlan,
    params: &EvcParameters,
) -> (f64, BTreeMap<String, SubComponentDetail>) {
    let mut details = BTreeMap::new();

    for (name, config) in plan.configs(kind) {
        let Some(formula) = formula(kind, name, &config.mode) else {
            debug!(component = %name, mode = %config.mode, "unknown calculation mode; sub-component disabled");
            continue;
        };

        let resolved: Option<Vec<f64>> = formula
            .inputs
            .iter()
            .map(|input| {
                config
                    .parameters
                    .get(*input)
                    .copied()
                    .or_else(|| params.lookup(input))
                    .or_else(|| plan.extra_parameters.get(*input).copied())
            })
            .collect();

        let Some(values) = resolved else {
            debug!(component = %name, mode = %config.mode, "missing input; sub-component disabled");
            continue;
        };

        let raw_value = (formula.eval)(&values);
        let parameters = formula
            .inputs
            .iter()
            .map(|input| input.to_string())
            .zip(values)
            .collect();

        details.insert(
            name.clone(),
            SubComponentDetail {
                mode: config.mode.clone(),
                formula: formula.text.to_string(),
                raw_value,
                parameters,
            },
        );
    }

    for (name, custom) in plan.customs(kind) {
        if details.contains_key(name) {
            continue;
        }
        let formula = if custom.formula.trim().is_empty() {
            CUSTOM.text.to_string()
        } else {
            custom.formula.clone()
        };
        details.insert(
            name.clone(),
            SubComponentDetail {
                mode: "custom".to_string(),
                formula,
                raw_value: custom.calculated_value,
                parameters: BTreeMap::from([(
                    "calculated_value".to_string(),
                    custom.calculated_value,
                )]),
            },
        );
    }

    let total = details.values().map(|detail| detail.raw_value).sum();
    (total, details)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> EvcParameters {
        EvcParameters {
            reference_price: 15_000.0,
            annual_revenue: 200_000_000.0,
            annual_cost: 100_000_000.0,
            revenue_increase_rate: 0.08,
            cost_reduction_rate: 0.12,
            initial_cost: 200_000.0,
            operation_cost: 5_000.0,
            implementation_years: 3.0,
        }
    }

    #[test]
    fn default_plan_uses_base_parameters() {
        let (revenue, details) = evaluate(ValueKind::Revenue, &ComponentPlan::default(), &params());
        assert!((revenue - 48_000_000.0).abs() < 1e-6);
        assert_eq!(details["revenue_growth"].parameters["annual_revenue"], 200_000_000.0);

        let (cost, _) = evaluate(ValueKind::Cost, &ComponentPlan::default(), &params());
        assert!((cost - 36_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn empty_plan_contributes_nothing() {
        let (revenue, details) = evaluate(ValueKind::Revenue, &ComponentPlan::empty(), &params());
        assert_eq!(revenue, 0.0);
        assert!(details.is_empty());
    }

    #[test]
    fn missing_inputs_and_unknown_modes_are_skipped() {
        let mut plan = ComponentPlan::empty();
        plan.revenue.insert(
            "new_revenue".into(),
            SubComponentConfig::new("saas").with_parameter("new_customers", 10.0),
        );
        plan.revenue
            .insert("pricing_revenue".into(), SubComponentConfig::new("auction"));
        plan.cost.insert(
            "time_cost_reduction".into(),
            SubComponentConfig::new("process_improvement")
                .with_parameter("process_time_reduction", 30.0)
                .with_parameter("process_frequency", 1_000.0)
                .with_parameter("employee_cost_per_hour", 3_000.0),
        );

        let (revenue, details) = evaluate(ValueKind::Revenue, &plan, &params());
        assert_eq!(revenue, 0.0);
        assert!(details.is_empty());

        let (cost, details) = evaluate(ValueKind::Cost, &plan, &params());
        assert!((cost - 1_500_000.0).abs() < 1e-6);
        assert_eq!(details["time_cost_reduction"].mode, "process_improvement");
    }

    #[test]
    fn extra_parameters_fill_shared_inputs() {
        let mut plan = ComponentPlan::empty();
        plan.extra_parameters.insert("new_customers".into(), 20.0);
        plan.extra_parameters.insert("average_arpu".into(), 50_000.0);
        plan.revenue.insert(
            "new_revenue".into(),
            SubComponentConfig::new("saas").with_parameter("expansion_revenue", 100_000.0),
        );
        plan.custom_revenue.insert(
            "partner_referrals".into(),
            CustomComponent {
                calculated_value: 250_000.0,
                formula: String::new(),
            },
        );

        let (revenue, details) = evaluate(ValueKind::Revenue, &plan, &params());
        assert!((revenue - 1_350_000.0).abs() < 1e-6);
        assert_eq!(details["partner_referrals"].formula, "calculated_value");
    }

    #[test]
    fn custom_mode_reads_calculated_value() {
        let mut plan = ComponentPlan::empty();
        plan.cost.insert(
            "risk_cost_reduction".into(),
            SubComponentConfig::new("custom").with_parameter("calculated_value", 42.0),
        );
        plan.cost
            .insert("not_in_catalog".into(), SubComponentConfig::new("custom"));
        let (cost, details) = evaluate(ValueKind::Cost, &plan, &params());
        assert_eq!(cost, 42.0);
        assert_eq!(details.len(), 1);
    }
}
