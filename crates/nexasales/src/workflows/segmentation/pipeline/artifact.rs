use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::segmentation::domain::Segment;
use crate::workflows::segmentation::evc::{EvcAnalysis, EvcResult};
use crate::workflows::segmentation::formula::{CustomizedFormula, FormulaValidation};
use crate::workflows::segmentation::ingest::market::MarketSignals;
use crate::workflows::segmentation::market::MarketPotentialReport;
use crate::workflows::segmentation::priority::PriorityInput;
use crate::workflows::segmentation::report::PriorityReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ServiceAnalysis,
    CustomerSegments,
    ReferenceProducts,
    ValueComparison,
    FormulaDesign,
    EvcCalculation,
    MarketPotential,
    PriorityEvaluation,
}

impl Stage {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::ServiceAnalysis,
            Self::CustomerSegments,
            Self::ReferenceProducts,
            Self::ValueComparison,
            Self::FormulaDesign,
            Self::EvcCalculation,
            Self::MarketPotential,
            Self::PriorityEvaluation,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::ServiceAnalysis => "service_analysis",
            Self::CustomerSegments => "customer_segments",
            Self::ReferenceProducts => "reference_products",
            Self::ValueComparison => "value_comparison",
            Self::FormulaDesign => "formula_design",
            Self::EvcCalculation => "evc_calculation",
            Self::MarketPotential => "market_potential",
            Self::PriorityEvaluation => "priority_evaluation",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ServiceAnalysis => "サービス分析",
            Self::CustomerSegments => "顧客セグメント",
            Self::ReferenceProducts => "参照製品",
            Self::ValueComparison => "価値比較",
            Self::FormulaDesign => "フォーミュラ設計",
            Self::EvcCalculation => "EVC計算",
            Self::MarketPotential => "市場ポテンシャル",
            Self::PriorityEvaluation => "優先度評価",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaDesignOutput {
    pub segments: Vec<Segment>,
    pub formulas: Vec<CustomizedFormula>,
    pub validations: BTreeMap<String, FormulaValidation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvcCalculationOutput {
    pub results: Vec<EvcResult>,
    pub analysis: EvcAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityEvaluationOutput {
    pub market_signals: MarketSignals,
    pub inputs: Vec<PriorityInput>,
    pub report: PriorityReport,
}

/// Every stage output computed so far, in pipeline order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageOutputs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_segments: Option<Vec<Segment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_products: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_comparison: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula_design: Option<FormulaDesignOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evc_calculation: Option<EvcCalculationOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_potential: Option<MarketPotentialReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_evaluation: Option<PriorityEvaluationOutput>,
}

impl StageOutputs {
    pub fn completed(&self) -> Vec<Stage> {
        let present = [
            self.service_analysis.is_some(),
            self.customer_segments.is_some(),
            self.reference_products.is_some(),
            self.value_comparison.is_some(),
            self.formula_design.is_some(),
            self.evc_calculation.is_some(),
            self.market_potential.is_some(),
            self.priority_evaluation.is_some(),
        ];
        Stage::ordered()
            .into_iter()
            .zip(present)
            .filter_map(|(stage, present)| present.then_some(stage))
            .collect()
    }
}

/// Outcome of one pipeline run, persisted as the run's output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunArtifact {
    pub workflow_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<Stage>,
    pub stages: StageOutputs,
}

impl RunArtifact {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }

    pub fn report(&self) -> Option<&PriorityReport> {
        self.stages
            .priority_evaluation
            .as_ref()
            .map(|output| &output.report)
    }

    pub fn failure(&self) -> Option<WorkflowError> {
        match (self.status, self.failed_stage) {
            (RunStatus::Failed, Some(stage)) => Some(WorkflowError::RunFailed {
                workflow_id: self.workflow_id.clone(),
                stage,
                message: self.error.clone().unwrap_or_default(),
            }),
            _ => None,
        }
    }
}

/// A failed run surfaced to callers that need a `Result`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("{workflow_id} failed at {stage}: {message}")]
    RunFailed {
        workflow_id: String,
        stage: Stage,
        message: String,
    },
}
