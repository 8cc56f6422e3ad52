use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::{json_object, looks_like_json, number};
use crate::workflows::segmentation::domain::Segment;
use crate::workflows::segmentation::evc::{
    ComponentPlan, CustomComponent, Parameter, SubComponentConfig, ValueKind,
};

/// What a segment's characteristics text contributes to its formula.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacteristicsProfile {
    /// Raw parameter overrides; validated by the formula customizer.
    pub overrides: BTreeMap<Parameter, f64>,
    pub component_plan: ComponentPlan,
    /// Qualitative hints such as `budget = high`.
    pub hints: BTreeMap<String, String>,
    /// Set when the input was neither valid JSON nor `label：a、b` text.
    pub degraded: bool,
}

impl Default for CharacteristicsProfile {
    fn default() -> Self {
        Self {
            overrides: BTreeMap::new(),
            component_plan: ComponentPlan::default(),
            hints: BTreeMap::new(),
            degraded: false,
        }
    }
}

/// Builds the `label：a、b、c` text for a segment's own characteristic list.
pub fn describe_segment(segment: &Segment) -> String {
    format!("{}：{}", segment.name, segment.characteristics.join("、"))
}

pub fn parse_characteristics(text: &str) -> CharacteristicsProfile {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return CharacteristicsProfile::default();
    }

    if looks_like_json(trimmed) {
        return match json_object(trimmed) {
            Some(object) => from_json(&object),
            None => CharacteristicsProfile {
                degraded: true,
                ..CharacteristicsProfile::default()
            },
        };
    }

    let listing = trimmed
        .split_once('：')
        .or_else(|| trimmed.split_once(':'))
        .map(|(_, listing)| listing);

    match listing {
        Some(listing) => CharacteristicsProfile {
            hints: hints_from_items(listing.split(['、', ',']).map(str::trim)),
            ..CharacteristicsProfile::default()
        },
        None => CharacteristicsProfile {
            degraded: true,
            ..CharacteristicsProfile::default()
        },
    }
}

fn hints_from_items<'a>(items: impl Iterator<Item = &'a str>) -> BTreeMap<String, String> {
    let mut hints = BTreeMap::new();
    for item in items {
        if item.contains("予算") {
            let level = if item.contains("豊富") || item.contains("高い") {
                "high"
            } else {
                "low"
            };
            hints.insert("budget".to_string(), level.to_string());
        }
        if item.contains("意思決定") {
            let pace = if item.contains("迅速") { "fast" } else { "slow" };
            hints.insert("decision_making".to_string(), pace.to_string());
        }
        if item.contains("ITリテラシー") {
            let level = if item.contains("高い") { "high" } else { "low" };
            hints.insert("it_literacy".to_string(), level.to_string());
        }
    }
    hints
}

fn from_json(object: &Map<String, Value>) -> CharacteristicsProfile {
    let mut profile = CharacteristicsProfile::default();

    for (key, value) in object {
        match key.as_str() {
            "revenue_components" | "cost_components" | "custom_components" => {}
            "characteristics" => {
                let items = super::string_list(Some(value));
                profile.hints = hints_from_items(items.iter().map(String::as_str));
            }
            _ => match (Parameter::from_key(key), number(value)) {
                (Some(parameter), Some(value)) => {
                    profile.overrides.insert(parameter, value);
                }
                (None, Some(value)) => {
                    profile
                        .component_plan
                        .extra_parameters
                        .insert(key.clone(), value);
                }
                (_, None) => {
                    if let Value::String(text) = value {
                        profile.hints.insert(key.clone(), text.clone());
                    }
                }
            },
        }
    }

    for (key, kind) in [
        ("revenue_components", ValueKind::Revenue),
        ("cost_components", ValueKind::Cost),
    ] {
        if let Some(Value::Object(configs)) = object.get(key) {
            apply_component_configs(&mut profile.component_plan, kind, configs);
        }
    }

    profile
}

/// Replaces the plan's sub-components of `kind` with the configured ones.
fn apply_component_configs(plan: &mut ComponentPlan, kind: ValueKind, configs: &Map<String, Value>) {
    plan.configs_mut(kind).clear();

    for (name, config) in configs {
        let Value::Object(config) = config else {
            continue;
        };

        if name == "custom_components" {
            for (custom_name, custom) in config {
                if let Some(custom) = custom_component(custom) {
                    plan.customs_mut(kind).insert(custom_name.clone(), custom);
                }
            }
            continue;
        }

        let mode = config
            .get("calculation_function")
            .or_else(|| config.get("mode"))
            .and_then(Value::as_str)
            .unwrap_or("standard");
        let mut sub = SubComponentConfig::new(mode);
        if let Some(Value::Object(parameters)) = config.get("parameters") {
            for (key, value) in parameters {
                if let Some(value) = number(value) {
                    sub.parameters.insert(key.clone(), value);
                }
            }
        }
        if let Some(value) = config.get("calculated_value").and_then(number) {
            sub.parameters.insert("calculated_value".to_string(), value);
        }
        plan.configs_mut(kind).insert(name.clone(), sub);
    }
}

fn custom_component(value: &Value) -> Option<CustomComponent> {
    match value {
        Value::Object(object) => Some(CustomComponent {
            calculated_value: object.get("calculated_value").and_then(number)?,
            formula: object
                .get("formula")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }),
        other => number(other).map(|calculated_value| CustomComponent {
            calculated_value,
            formula: String::new(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::segmentation::domain::SegmentCatalog;

    #[test]
    fn listing_text_yields_hints_without_overrides() {
        let profile = parse_characteristics("大企業・高価値：予算が豊富、意思決定が迅速、ITリテラシーが高い");
        assert!(!profile.degraded);
        assert!(profile.overrides.is_empty());
        assert_eq!(profile.hints["budget"], "high");
        assert_eq!(profile.hints["decision_making"], "fast");
        assert_eq!(profile.hints["it_literacy"], "high");
        assert_eq!(profile.component_plan, ComponentPlan::default());
    }

    #[test]
    fn describe_segment_round_trips_catalog_characteristics() {
        let segment = SegmentCatalog::standard().remove(3);
        let profile = parse_characteristics(&describe_segment(&segment));
        assert_eq!(profile.hints["budget"], "low");
        assert_eq!(profile.hints["it_literacy"], "low");
    }

    #[test]
    fn json_overrides_and_components_are_read() {
        let profile = parse_characteristics(
            r#"{
                "annual_revenue": "300,000,000",
                "implementation_years": 5,
                "industry": "SaaS",
                "new_customers": 40,
                "revenue_components": {
                    "new_revenue": {"calculation_function": "saas", "parameters": {"average_arpu": 120000, "expansion_revenue": 0}},
                    "custom_components": {"partner_referrals": {"calculated_value": 900000, "formula": "referrals × fee"}}
                }
            }"#,
        );
        assert!(!profile.degraded);
        assert_eq!(profile.overrides[&Parameter::AnnualRevenue], 300_000_000.0);
        assert_eq!(profile.overrides[&Parameter::ImplementationYears], 5.0);
        assert_eq!(profile.hints["industry"], "SaaS");
        assert_eq!(profile.component_plan.extra_parameters["new_customers"], 40.0);

        let plan = &profile.component_plan;
        assert!(!plan.revenue.contains_key("revenue_growth"));
        assert_eq!(plan.revenue["new_revenue"].mode, "saas");
        assert_eq!(plan.custom_revenue["partner_referrals"].calculated_value, 900_000.0);
        assert!(plan.cost.contains_key("cost_reduction"));
    }

    #[test]
    fn malformed_input_degrades_to_defaults() {
        for text in ["{'annual_revenue': 1}", "just some prose"] {
            let profile = parse_characteristics(text);
            assert!(profile.degraded, "{text}");
            assert!(profile.overrides.is_empty());
            assert_eq!(profile.component_plan, ComponentPlan::default());
        }
        assert!(!parse_characteristics("   ").degraded);
    }
}
