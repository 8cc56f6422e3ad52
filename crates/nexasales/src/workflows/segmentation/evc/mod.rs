mod analysis;
mod components;
mod params;

pub use analysis::{
    analyze_evc_results, ComponentContribution, EvcAnalysis, EvcExtreme, SegmentComparison,
};
pub use components::{
    ComponentPlan, CustomComponent, SubComponentConfig, SubComponentDetail, ValueKind,
};
pub use params::{EvcParameters, Parameter, ParameterError};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::formula::{ComponentWeights, CustomizedFormula, EvcComponent, BASE_FORMULA};

/// Labeled contribution to EVC plus the trail of what produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueComponent {
    pub name: String,
    pub description: String,
    pub formula: String,
    pub value: f64,
    pub calculation_details: CalculationDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationDetails {
    /// Unweighted sum of the enabled sub-components.
    pub raw_total: f64,
    pub weight: f64,
    pub components: BTreeMap<String, SubComponentDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplementationCostDetails {
    pub formula: String,
    pub initial_cost: f64,
    pub recurring_cost: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvcResult {
    pub segment_id: String,
    pub segment_name: String,
    pub formula: String,
    pub evc_value: f64,
    pub reference_price: f64,
    pub revenue_enhancement: ValueComponent,
    pub cost_optimization: ValueComponent,
    pub implementation_cost: f64,
    pub implementation_details: ImplementationCostDetails,
    pub weights: ComponentWeights,
    pub parameters: EvcParameters,
}

impl EvcResult {
    /// Recomputes `R + (Re + Co) - I` from the stored parts.
    pub fn identity_value(&self) -> f64 {
        self.reference_price
            + (self.revenue_enhancement.value + self.cost_optimization.value)
            - self.implementation_cost
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvcError {
    #[error("invalid parameters for segment {segment_id}: {source}")]
    InvalidParameters {
        segment_id: String,
        #[source]
        source: ParameterError,
    },
    #[error("weight for {component} must be positive and finite (got {value})")]
    InvalidWeight { component: &'static str, value: f64 },
}

/// Evaluates a customized formula.
pub fn calculate_formula(formula: &CustomizedFormula) -> Result<EvcResult, EvcError> {
    calculate(
        &formula.segment_id,
        &formula.segment_name,
        &formula.weights,
        &formula.parameters,
        &formula.component_plan,
    )
}

/// Computes `EVC = R + (Re + Co) - I` for one segment.
///
/// Re and Co are the weighted sums of whichever sub-components in `plan` have
/// all their inputs; a negative result is returned as-is.
pub fn calculate(
    segment_id: &str,
    segment_name: &str,
    weights: &ComponentWeights,
    parameters: &EvcParameters,
    plan: &ComponentPlan,
) -> Result<EvcResult, EvcError> {
    parameters
        .validate()
        .map_err(|source| EvcError::InvalidParameters {
            segment_id: segment_id.to_string(),
            source,
        })?;
    for component in EvcComponent::ordered() {
        let value = weights.get(component);
        if !value.is_finite() || value <= 0.0 {
            return Err(EvcError::InvalidWeight {
                component: component.symbol(),
                value,
            });
        }
    }

    let revenue_enhancement = value_component(ValueKind::Revenue, weights.re, parameters, plan);
    let cost_optimization = value_component(ValueKind::Cost, weights.co, parameters, plan);

    let recurring_cost = parameters.operation_cost * parameters.implementation_years;
    let implementation_cost = (parameters.initial_cost + recurring_cost) * weights.i;
    let reference_price = parameters.reference_price;
    let evc_value =
        reference_price + (revenue_enhancement.value + cost_optimization.value) - implementation_cost;

    debug!(
        segment_id,
        evc_value,
        revenue = revenue_enhancement.value,
        cost = cost_optimization.value,
        implementation_cost,
        "evc calculated"
    );

    Ok(EvcResult {
        segment_id: segment_id.to_string(),
        segment_name: segment_name.to_string(),
        formula: BASE_FORMULA.to_string(),
        evc_value,
        reference_price,
        revenue_enhancement,
        cost_optimization,
        implementation_cost,
        implementation_details: ImplementationCostDetails {
            formula: "I = (initial_cost + operation_cost × implementation_years) × weight".to_string(),
            initial_cost: parameters.initial_cost,
            recurring_cost,
            weight: weights.i,
        },
        weights: *weights,
        parameters: *parameters,
    })
}

fn value_component(
    kind: ValueKind,
    weight: f64,
    parameters: &EvcParameters,
    plan: &ComponentPlan,
) -> ValueComponent {
    let (raw_total, components) = components::evaluate(kind, plan, parameters);
    let terms: Vec<&str> = components.keys().map(String::as_str).collect();
    let formula = if terms.is_empty() {
        format!("{} = 0", kind.symbol())
    } else {
        format!("{} = {}", kind.symbol(), terms.join(" + "))
    };

    ValueComponent {
        name: kind.label().to_string(),
        description: kind.description().to_string(),
        formula,
        value: raw_total * weight,
        calculation_details: CalculationDetails {
            raw_total,
            weight,
            components,
        },
    }
}
