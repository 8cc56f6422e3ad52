//! Eight-stage segmentation run, from service description to priority report.
//!
//! Stages run strictly in order. A stage failure stops the run; outputs of the
//! stages that finished are kept in the [`RunArtifact`].

mod artifact;
mod collaborator;

pub use artifact::{
    EvcCalculationOutput, FormulaDesignOutput, PriorityEvaluationOutput, RunArtifact, RunStatus,
    Stage, StageOutputs, WorkflowError,
};
pub use collaborator::{
    Collaborator, CollaboratorError, CollaboratorRequest, CollaboratorTask, OfflineCollaborator,
    ScriptedCollaborator, ScriptedReply,
};

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, info_span, warn};

use crate::config::WorkflowConfig;

use super::domain::{Segment, SegmentCatalog, SegmentEnrichment, SegmentType};
use super::evc::{analyze_evc_results, calculate_formula, EvcError};
use super::formula::{validate_formula, FormulaCustomizer};
use super::ingest::characteristics::{describe_segment, parse_characteristics};
use super::ingest::market::parse_market_data;
use super::ingest::segments::extract_segments;
use super::ingest::{json_object, json_value};
use super::market::{
    estimate_potential, CollaboratorEstimator, MarketPotentialReport, PotentialError,
};
use super::priority::{PriorityInput, PriorityScorer};
use super::report::{assemble, create_action_plans, generate_strategies};

/// What a caller hands to one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineInput {
    pub service_description: String,
    pub market_data: String,
    /// Characteristics text per segment id, used instead of the segment's own
    /// description when present.
    #[serde(default)]
    pub segment_parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorkflowSettings {
    pub market_growth_rate: Option<f64>,
}

impl From<&WorkflowConfig> for WorkflowSettings {
    fn from(config: &WorkflowConfig) -> Self {
        Self {
            market_growth_rate: config.market_growth_rate,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error("collaborator reported an error: {0}")]
    Reported(String),
    #[error(transparent)]
    Evc(#[from] EvcError),
    #[error(transparent)]
    Potential(#[from] PotentialError),
}

#[derive(Debug, thiserror::Error)]
#[error("{stage} failed: {source}")]
pub struct StageFailure {
    pub stage: Stage,
    #[source]
    pub source: StageError,
}

/// Drives one run against a [`Collaborator`].
pub struct SegmentationWorkflow<C> {
    collaborator: C,
    customizer: FormulaCustomizer,
    scorer: PriorityScorer,
    settings: WorkflowSettings,
}

impl<C: Collaborator> SegmentationWorkflow<C> {
    pub fn new(collaborator: C, settings: WorkflowSettings) -> Self {
        Self {
            collaborator,
            customizer: FormulaCustomizer::default(),
            scorer: PriorityScorer::new(),
            settings,
        }
    }

    pub fn with_customizer(mut self, customizer: FormulaCustomizer) -> Self {
        self.customizer = customizer;
        self
    }

    pub fn collaborator(&self) -> &C {
        &self.collaborator
    }

    pub fn run(&self, input: &PipelineInput) -> RunArtifact {
        let started_at = Utc::now();
        let workflow_id = format!("workflow-{}", started_at.format("%Y%m%d-%H%M%S"));
        let span = info_span!("segmentation_run", workflow_id = %workflow_id);
        let _entered = span.enter();

        info!("segmentation run started");
        let mut stages = StageOutputs::default();
        let outcome = self.execute(input, &mut stages);
        let completed_at = Utc::now();

        match outcome {
            Ok(()) => {
                info!("segmentation run completed");
                RunArtifact {
                    workflow_id,
                    started_at,
                    completed_at,
                    status: RunStatus::Success,
                    error: None,
                    failed_stage: None,
                    stages,
                }
            }
            Err(failure) => {
                error!(stage = failure.stage.key(), error = %failure.source, "segmentation run failed");
                RunArtifact {
                    workflow_id,
                    started_at,
                    completed_at,
                    status: RunStatus::Failed,
                    error: Some(failure.source.to_string()),
                    failed_stage: Some(failure.stage),
                    stages,
                }
            }
        }
    }

    fn execute(&self, input: &PipelineInput, stages: &mut StageOutputs) -> Result<(), StageFailure> {
        let analysis = run_stage(Stage::ServiceAnalysis, || {
            self.ask(Stage::ServiceAnalysis, input.service_description.clone())
        })?;
        stages.service_analysis = Some(analysis.clone());

        let segments = run_stage(Stage::CustomerSegments, || {
            let reply = self.ask(
                Stage::CustomerSegments,
                format!("サービス分析:\n{analysis}\n\n市場データ:\n{}", input.market_data),
            )?;
            Ok(segments_from(&reply))
        })?;
        stages.customer_segments = Some(segments.clone());

        let references = run_stage(Stage::ReferenceProducts, || {
            self.ask(Stage::ReferenceProducts, analysis.clone())
        })?;
        stages.reference_products = Some(references.clone());

        let comparison = run_stage(Stage::ValueComparison, || {
            self.ask(
                Stage::ValueComparison,
                format!("{analysis}\n\n参照製品:\n{references}"),
            )
        })?;
        stages.value_comparison = Some(comparison);

        let design = run_stage(Stage::FormulaDesign, || {
            Ok(self.design_formulas(segments, &input.segment_parameters))
        })?;
        stages.formula_design = Some(design.clone());

        let evc = run_stage(Stage::EvcCalculation, || {
            let results = design
                .formulas
                .iter()
                .map(calculate_formula)
                .collect::<Result<Vec<_>, _>>()?;
            let analysis = analyze_evc_results(&results);
            Ok(EvcCalculationOutput { results, analysis })
        })?;
        stages.evc_calculation = Some(evc.clone());

        let market = run_stage(Stage::MarketPotential, || {
            let estimator = CollaboratorEstimator::new(&self.collaborator);
            let evc_by_segment: BTreeMap<&str, f64> = evc
                .results
                .iter()
                .map(|result| (result.segment_id.as_str(), result.evc_value))
                .collect();
            design
                .segments
                .iter()
                .map(|segment| {
                    let evc_value = evc_by_segment.get(segment.id.as_str()).copied();
                    estimate_potential(&estimator, segment, evc_value).map_err(StageError::from)
                })
                .collect::<Result<Vec<_>, _>>()
                .map(MarketPotentialReport::new)
        })?;
        stages.market_potential = Some(market.clone());

        let evaluation = run_stage(Stage::PriorityEvaluation, || {
            let market_signals = parse_market_data(&input.market_data);
            if market_signals.degraded {
                warn!("market data could not be parsed; using configured growth rate");
            }
            let inputs: Vec<PriorityInput> = market
                .segments
                .iter()
                .map(|potential| PriorityInput {
                    segment_id: potential.segment_id.clone(),
                    segment_name: potential.segment_name.clone(),
                    evc_value: potential.evc_value,
                    market_size: potential.companies.expected as f64,
                    acquisition_probability: potential.acquisition_rate.expected,
                    growth_rate: market_signals
                        .growth_for(&potential.segment_id, self.settings.market_growth_rate),
                })
                .collect();

            let scores = self.scorer.score(&inputs);
            let segment_types: BTreeMap<String, SegmentType> = design
                .segments
                .iter()
                .map(|segment| (segment.id.clone(), segment.segment_type()))
                .collect();
            let strategies = generate_strategies(&scores, &segment_types);
            let action_plans = create_action_plans(&scores, &segment_types);
            let report = assemble(&scores, &strategies, &action_plans);

            Ok(PriorityEvaluationOutput {
                market_signals,
                inputs,
                report,
            })
        })?;
        stages.priority_evaluation = Some(evaluation);

        Ok(())
    }

    fn ask(&self, stage: Stage, prompt: String) -> Result<String, StageError> {
        let request = CollaboratorRequest {
            task: CollaboratorTask::Stage(stage),
            segment_id: None,
            prompt,
        };
        let reply = self.collaborator.respond(&request)?;
        match reported_error(&reply) {
            Some(message) => Err(StageError::Reported(message)),
            None => Ok(reply),
        }
    }

    fn design_formulas(
        &self,
        segments: Vec<Segment>,
        segment_parameters: &BTreeMap<String, String>,
    ) -> FormulaDesignOutput {
        let mut enriched = Vec::with_capacity(segments.len());
        let mut formulas = Vec::with_capacity(segments.len());
        let mut validations = BTreeMap::new();

        for segment in segments {
            let segment = match self.enrichment_for(&segment) {
                Some(enrichment) => segment.enrich(enrichment),
                None => segment,
            };

            let characteristics = segment_parameters
                .get(&segment.id)
                .cloned()
                .unwrap_or_else(|| describe_segment(&segment));
            let profile = parse_characteristics(&characteristics);
            if profile.degraded {
                warn!(
                    segment_id = %segment.id,
                    "characteristics could not be parsed; using default parameters"
                );
            }

            let formula = self.customizer.customize(&segment, &profile);
            let validation = validate_formula(&formula);
            if !validation.is_valid {
                warn!(segment_id = %segment.id, issues = ?validation.issues, "formula failed validation");
            }
            for recommendation in &validation.recommendations {
                debug!(segment_id = %segment.id, %recommendation, "formula recommendation");
            }

            validations.insert(segment.id.clone(), validation);
            formulas.push(formula);
            enriched.push(segment);
        }

        FormulaDesignOutput {
            segments: enriched,
            formulas,
            validations,
        }
    }

    fn enrichment_for(&self, segment: &Segment) -> Option<SegmentEnrichment> {
        let request = CollaboratorRequest {
            task: CollaboratorTask::SegmentEnrichment,
            segment_id: Some(segment.id.clone()),
            prompt: format!(
                "セグメント「{}」について、業界カテゴリ(industry_categories)、代表的な企業例(example_companies)、BANT情報(bant)をJSONで回答してください。\n{}",
                segment.name, segment.description
            ),
        };
        let reply = match self.collaborator.respond(&request) {
            Ok(reply) => reply,
            Err(CollaboratorError::Declined(_)) => return None,
            Err(err) => {
                warn!(segment_id = %segment.id, error = %err, "segment enrichment unavailable");
                return None;
            }
        };
        if let Some(message) = reported_error(&reply) {
            warn!(segment_id = %segment.id, %message, "segment enrichment reported an error");
            return None;
        }
        match json_value(&reply).map(serde_json::from_value::<SegmentEnrichment>) {
            Some(Ok(enrichment)) => Some(enrichment),
            _ => {
                warn!(segment_id = %segment.id, "segment enrichment was not valid JSON; skipped");
                None
            }
        }
    }
}

fn run_stage<T>(
    stage: Stage,
    body: impl FnOnce() -> Result<T, StageError>,
) -> Result<T, StageFailure> {
    info!(stage = stage.key(), label = stage.label(), "stage started");
    match body() {
        Ok(output) => {
            info!(stage = stage.key(), "stage completed");
            Ok(output)
        }
        Err(source) => Err(StageFailure { stage, source }),
    }
}

fn segments_from(reply: &str) -> Vec<Segment> {
    let segments = extract_segments(reply);
    if segments.is_empty() {
        warn!("no segments found in collaborator reply; using standard catalog");
        return SegmentCatalog::standard();
    }
    segments
}

/// A reply that is a JSON object with a non-empty `error` string.
fn reported_error(reply: &str) -> Option<String> {
    match json_object(reply)?.get("error")? {
        Value::String(message) if !message.trim().is_empty() => Some(message.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reported_error_requires_non_empty_string() {
        assert_eq!(
            reported_error(r#"{"error": "quota exceeded"}"#).as_deref(),
            Some("quota exceeded")
        );
        assert_eq!(reported_error(r#"{"error": ""}"#), None);
        assert_eq!(reported_error(r#"{"error": null}"#), None);
        assert_eq!(reported_error("error: plain text"), None);
    }

    #[test]
    fn stages_are_listed_in_run_order() {
        let keys: Vec<_> = Stage::ordered().into_iter().map(Stage::key).collect();
        assert_eq!(
            keys,
            [
                "service_analysis",
                "customer_segments",
                "reference_products",
                "value_comparison",
                "formula_design",
                "evc_calculation",
                "market_potential",
                "priority_evaluation",
            ]
        );
    }
}
