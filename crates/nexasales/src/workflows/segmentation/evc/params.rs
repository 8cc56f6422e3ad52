use serde::{Deserialize, Serialize};

/// Numeric inputs for one segment's EVC evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvcParameters {
    pub reference_price: f64,
    pub annual_revenue: f64,
    pub annual_cost: f64,
    pub revenue_increase_rate: f64,
    pub cost_reduction_rate: f64,
    pub initial_cost: f64,
    pub operation_cost: f64,
    pub implementation_years: f64,
}

impl EvcParameters {
    pub fn get(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::ReferencePrice => self.reference_price,
            Parameter::AnnualRevenue => self.annual_revenue,
            Parameter::AnnualCost => self.annual_cost,
            Parameter::RevenueIncreaseRate => self.revenue_increase_rate,
            Parameter::CostReductionRate => self.cost_reduction_rate,
            Parameter::InitialCost => self.initial_cost,
            Parameter::OperationCost => self.operation_cost,
            Parameter::ImplementationYears => self.implementation_years,
        }
    }

    pub fn set(&mut self, parameter: Parameter, value: f64) {
        let slot = match parameter {
            Parameter::ReferencePrice => &mut self.reference_price,
            Parameter::AnnualRevenue => &mut self.annual_revenue,
            Parameter::AnnualCost => &mut self.annual_cost,
            Parameter::RevenueIncreaseRate => &mut self.revenue_increase_rate,
            Parameter::CostReductionRate => &mut self.cost_reduction_rate,
            Parameter::InitialCost => &mut self.initial_cost,
            Parameter::OperationCost => &mut self.operation_cost,
            Parameter::ImplementationYears => &mut self.implementation_years,
        };
        *slot = value;
    }

    /// Looks a parameter up by its snake_case key.
    pub fn lookup(&self, key: &str) -> Option<f64> {
        Parameter::from_key(key).map(|parameter| self.get(parameter))
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        Parameter::ordered()
            .into_iter()
            .try_for_each(|parameter| parameter.check(self.get(parameter)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    ReferencePrice,
    AnnualRevenue,
    AnnualCost,
    RevenueIncreaseRate,
    CostReductionRate,
    InitialCost,
    OperationCost,
    ImplementationYears,
}

impl Parameter {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::ReferencePrice,
            Self::AnnualRevenue,
            Self::AnnualCost,
            Self::RevenueIncreaseRate,
            Self::CostReductionRate,
            Self::InitialCost,
            Self::OperationCost,
            Self::ImplementationYears,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::ReferencePrice => "reference_price",
            Self::AnnualRevenue => "annual_revenue",
            Self::AnnualCost => "annual_cost",
            Self::RevenueIncreaseRate => "revenue_increase_rate",
            Self::CostReductionRate => "cost_reduction_rate",
            Self::InitialCost => "initial_cost",
            Self::OperationCost => "operation_cost",
            Self::ImplementationYears => "implementation_years",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ReferencePrice => "参照価格",
            Self::AnnualRevenue => "年間売上",
            Self::AnnualCost => "年間コスト",
            Self::RevenueIncreaseRate => "売上増加率",
            Self::CostReductionRate => "コスト削減率",
            Self::InitialCost => "初期費用",
            Self::OperationCost => "運用コスト",
            Self::ImplementationYears => "導入年数",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|parameter| parameter.key() == key)
    }

    const fn is_rate(self) -> bool {
        matches!(self, Self::RevenueIncreaseRate | Self::CostReductionRate)
    }

    /// Checks a single value against the invariant for this parameter.
    pub fn check(self, value: f64) -> Result<(), ParameterError> {
        if !value.is_finite() {
            return Err(ParameterError::NotFinite { parameter: self });
        }
        if self == Self::ImplementationYears {
            if value <= 0.0 {
                return Err(ParameterError::NonPositiveYears(value));
            }
            return Ok(());
        }
        if self.is_rate() && !(0.0..=1.0).contains(&value) {
            return Err(ParameterError::RateOutOfRange {
                parameter: self,
                value,
            });
        }
        if value < 0.0 {
            return Err(ParameterError::NegativeAmount {
                parameter: self,
                value,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    #[error("{} must be a finite number", .parameter.key())]
    NotFinite { parameter: Parameter },
    #[error("implementation_years must be greater than zero (got {0})")]
    NonPositiveYears(f64),
    #[error("{} must lie within [0, 1] (got {value})", .parameter.key())]
    RateOutOfRange { parameter: Parameter, value: f64 },
    #[error("{} must not be negative (got {value})", .parameter.key())]
    NegativeAmount { parameter: Parameter, value: f64 },
}
