use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::domain::Segment;
use super::ingest::{json_object, number};
use super::pipeline::{Collaborator, CollaboratorError, CollaboratorRequest, CollaboratorTask};

/// A `{min, expected, max}` triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate<T> {
    pub min: T,
    pub expected: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Estimate<T> {
    pub fn is_monotonic(&self) -> bool {
        self.min <= self.expected && self.expected <= self.max
    }
}

impl Estimate<u64> {
    pub const FALLBACK_COMPANIES: Self = Self {
        min: 100,
        expected: 500,
        max: 1000,
    };
}

impl Estimate<f64> {
    pub const FALLBACK_ACQUISITION_RATE: Self = Self {
        min: 0.05,
        expected: 0.15,
        max: 0.30,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateSource {
    Collaborator,
    Fallback,
}

/// An estimate together with its rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcedEstimate<T> {
    pub estimate: Estimate<T>,
    pub logic: String,
    pub source: EstimateSource,
}

#[derive(Debug, thiserror::Error)]
pub enum EstimationError {
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error("estimate is not a {{min, expected, max}} object: {0}")]
    Malformed(String),
    #[error("estimate violates min <= expected <= max")]
    NonMonotonic,
    #[error("estimated value {0} is out of range")]
    OutOfRange(f64),
}

/// Source of company-count and acquisition-rate triples for a segment.
pub trait MarketEstimator {
    fn estimate_companies(&self, segment: &Segment)
        -> Result<SourcedEstimate<u64>, EstimationError>;

    fn estimate_acquisition_rate(
        &self,
        segment: &Segment,
        evc_value: f64,
    ) -> Result<SourcedEstimate<f64>, EstimationError>;
}

/// Asks the collaborator for estimates and parses the reply strictly.
pub struct CollaboratorEstimator<'a, C: ?Sized> {
    collaborator: &'a C,
}

impl<'a, C: Collaborator + ?Sized> CollaboratorEstimator<'a, C> {
    pub fn new(collaborator: &'a C) -> Self {
        Self { collaborator }
    }

    fn ask(
        &self,
        task: CollaboratorTask,
        segment: &Segment,
        prompt: String,
    ) -> Result<(Estimate<f64>, String), EstimationError> {
        let request = CollaboratorRequest {
            task,
            segment_id: Some(segment.id.clone()),
            prompt,
        };
        let reply = self.collaborator.respond(&request)?;
        parse_triple(&reply)
    }
}

impl<C: Collaborator + ?Sized> MarketEstimator for CollaboratorEstimator<'_, C> {
    fn estimate_companies(
        &self,
        segment: &Segment,
    ) -> Result<SourcedEstimate<u64>, EstimationError> {
        let hint = segment
            .market_size_hint
            .map(|size| format!("\n参考企業数: {size}"))
            .unwrap_or_default();
        let prompt = format!(
            "セグメント「{}」に該当する企業数を推定してください。\n特性: {}{hint}\n\
             {{\"min\", \"expected\", \"max\", \"logic\"}} のJSONで回答してください。",
            segment.name,
            segment.characteristics.join("、"),
        );
        let (estimate, logic) = self.ask(CollaboratorTask::CompanyCount, segment, prompt)?;
        for value in [estimate.min, estimate.expected, estimate.max] {
            if value < 0.0 {
                return Err(EstimationError::OutOfRange(value));
            }
        }
        Ok(SourcedEstimate {
            estimate: Estimate {
                min: estimate.min.floor() as u64,
                expected: estimate.expected.floor() as u64,
                max: estimate.max.floor() as u64,
            },
            logic,
            source: EstimateSource::Collaborator,
        })
    }

    fn estimate_acquisition_rate(
        &self,
        segment: &Segment,
        evc_value: f64,
    ) -> Result<SourcedEstimate<f64>, EstimationError> {
        let hint = segment
            .acquisition_probability_hint
            .map(|rate| format!("\n参考獲得率: {rate}"))
            .unwrap_or_default();
        let prompt = format!(
            "セグメント「{}」の獲得率を0から1の範囲で推定してください。\nEVC: {evc_value:.0}円{hint}\n\
             {{\"min\", \"expected\", \"max\", \"logic\"}} のJSONで回答してください。",
            segment.name,
        );
        let (estimate, logic) = self.ask(CollaboratorTask::AcquisitionRate, segment, prompt)?;
        for value in [estimate.min, estimate.expected, estimate.max] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EstimationError::OutOfRange(value));
            }
        }
        Ok(SourcedEstimate {
            estimate,
            logic,
            source: EstimateSource::Collaborator,
        })
    }
}

fn parse_triple(reply: &str) -> Result<(Estimate<f64>, String), EstimationError> {
    let object = json_object(reply).ok_or_else(|| EstimationError::Malformed(excerpt(reply)))?;
    let field = |key: &str| {
        object
            .get(key)
            .and_then(number)
            .ok_or_else(|| EstimationError::Malformed(format!("missing numeric '{key}'")))
    };
    let estimate = Estimate {
        min: field("min")?,
        expected: field("expected")?,
        max: field("max")?,
    };
    if !estimate.is_monotonic() {
        return Err(EstimationError::NonMonotonic);
    }
    let logic = object
        .get("logic")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Ok((estimate, logic))
}

fn excerpt(text: &str) -> String {
    text.chars().take(50).collect()
}

/// Explicit error value returned instead of a potential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{error}: {message}")]
pub struct PotentialError {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketPotential {
    pub segment_id: String,
    pub segment_name: String,
    pub evc_value: f64,
    pub companies: Estimate<u64>,
    pub companies_logic: String,
    pub companies_source: EstimateSource,
    pub acquisition_rate: Estimate<f64>,
    pub acquisition_logic: String,
    pub acquisition_source: EstimateSource,
    /// Element-wise `companies.X × acquisition_rate.X × evc_value`; not re-sorted.
    pub potential_value: Estimate<f64>,
    pub acquirable_companies: u64,
    pub calculation_formula: String,
}

/// Combines the estimator's triples with a segment's EVC.
///
/// Estimator failures fall back to the default triples. A missing or zero EVC
/// is reported as a [`PotentialError`].
pub fn estimate_potential<E: MarketEstimator + ?Sized>(
    estimator: &E,
    segment: &Segment,
    evc_value: Option<f64>,
) -> Result<MarketPotential, PotentialError> {
    let evc_value = match evc_value {
        Some(value) if value != 0.0 && value.is_finite() => value,
        _ => {
            return Err(PotentialError {
                error: "missing_evc".to_string(),
                message: format!(
                    "セグメント {} のEVC値がないため市場ポテンシャルを計算できません",
                    segment.id
                ),
            })
        }
    };

    let companies = estimator.estimate_companies(segment).unwrap_or_else(|err| {
        warn!(segment_id = %segment.id, error = %err, "company estimate rejected; using fallback");
        SourcedEstimate {
            estimate: Estimate::FALLBACK_COMPANIES,
            logic: "デフォルト推定値".to_string(),
            source: EstimateSource::Fallback,
        }
    });
    let acquisition = estimator
        .estimate_acquisition_rate(segment, evc_value)
        .unwrap_or_else(|err| {
            warn!(segment_id = %segment.id, error = %err, "acquisition estimate rejected; using fallback");
            SourcedEstimate {
                estimate: Estimate::FALLBACK_ACQUISITION_RATE,
                logic: "デフォルト推定値".to_string(),
                source: EstimateSource::Fallback,
            }
        });

    let c = companies.estimate;
    let r = acquisition.estimate;
    let potential_value = Estimate {
        min: c.min as f64 * r.min * evc_value,
        expected: c.expected as f64 * r.expected * evc_value,
        max: c.max as f64 * r.max * evc_value,
    };

    Ok(MarketPotential {
        segment_id: segment.id.clone(),
        segment_name: segment.name.clone(),
        evc_value,
        companies: c,
        companies_logic: companies.logic,
        companies_source: companies.source,
        acquisition_rate: r,
        acquisition_logic: acquisition.logic,
        acquisition_source: acquisition.source,
        potential_value,
        acquirable_companies: (c.expected as f64 * r.expected).floor() as u64,
        calculation_formula: "市場ポテンシャル = 企業数 × 獲得率 × EVC".to_string(),
    })
}

pub const MARKET_REPORT_TITLE: &str = "市場ポテンシャル分析レポート";

/// Per-segment potentials with their totals across the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketPotentialReport {
    pub title: String,
    pub segments: Vec<MarketPotential>,
    /// Sum of `potential_value.expected`.
    pub total_market_value: f64,
    pub total_acquirable_companies: u64,
}

impl MarketPotentialReport {
    pub fn new(segments: Vec<MarketPotential>) -> Self {
        let total_market_value = segments
            .iter()
            .map(|potential| potential.potential_value.expected)
            .sum();
        let total_acquirable_companies = segments
            .iter()
            .map(|potential| potential.acquirable_companies)
            .sum();
        Self {
            title: MARKET_REPORT_TITLE.to_string(),
            segments,
            total_market_value,
            total_acquirable_companies,
        }
    }
}
