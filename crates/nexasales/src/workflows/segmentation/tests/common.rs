use std::sync::atomic::{AtomicUsize, Ordering};

use crate::workflows::segmentation::domain::{Segment, SegmentCatalog};
use crate::workflows::segmentation::evc::{calculate_formula, EvcResult};
use crate::workflows::segmentation::formula::{CustomizedFormula, FormulaCustomizer};
use crate::workflows::segmentation::ingest::characteristics::CharacteristicsProfile;
use crate::workflows::segmentation::market::{
    Estimate, EstimateSource, EstimationError, MarketEstimator, SourcedEstimate,
};
use crate::workflows::segmentation::pipeline::{
    PipelineInput, ScriptedCollaborator, SegmentationWorkflow, WorkflowSettings,
};
use crate::workflows::segmentation::priority::PriorityInput;

pub(super) const MARKET_DATA: &str = "国内SaaS市場規模: 1兆円\n年間成長率: 12%\n";

pub(super) fn catalog_segment(id: &str) -> Segment {
    SegmentCatalog::standard()
        .into_iter()
        .find(|segment| segment.id == id)
        .expect("catalog segment")
}

pub(super) fn default_formula(id: &str) -> CustomizedFormula {
    FormulaCustomizer::default().customize(&catalog_segment(id), &CharacteristicsProfile::default())
}

pub(super) fn default_result(id: &str) -> EvcResult {
    calculate_formula(&default_formula(id)).expect("default parameters are valid")
}

pub(super) fn priority_input(
    id: &str,
    evc_value: f64,
    market_size: f64,
    acquisition_probability: f64,
    growth_rate: f64,
) -> PriorityInput {
    PriorityInput {
        segment_id: id.to_string(),
        segment_name: format!("segment {id}"),
        evc_value,
        market_size,
        acquisition_probability,
        growth_rate,
    }
}

pub(super) fn pipeline_input() -> PipelineInput {
    PipelineInput {
        service_description: "NexaSales: 営業チーム向けAI商談分析SaaS".to_string(),
        market_data: MARKET_DATA.to_string(),
        ..PipelineInput::default()
    }
}

pub(super) fn workflow(collaborator: ScriptedCollaborator) -> SegmentationWorkflow<ScriptedCollaborator> {
    SegmentationWorkflow::new(collaborator, WorkflowSettings::default())
}

/// Estimator returning fixed triples and counting calls.
pub(super) struct FixedEstimator {
    pub companies: Result<Estimate<u64>, ()>,
    pub acquisition: Result<Estimate<f64>, ()>,
    pub calls: AtomicUsize,
}

impl FixedEstimator {
    pub(super) fn new(companies: Estimate<u64>, acquisition: Estimate<f64>) -> Self {
        Self {
            companies: Ok(companies),
            acquisition: Ok(acquisition),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn failing() -> Self {
        Self {
            companies: Err(()),
            acquisition: Err(()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl MarketEstimator for FixedEstimator {
    fn estimate_companies(
        &self,
        _segment: &Segment,
    ) -> Result<SourcedEstimate<u64>, EstimationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.companies
            .map(|estimate| SourcedEstimate {
                estimate,
                logic: "fixed".to_string(),
                source: EstimateSource::Collaborator,
            })
            .map_err(|()| EstimationError::Malformed("fixed failure".to_string()))
    }

    fn estimate_acquisition_rate(
        &self,
        _segment: &Segment,
        _evc_value: f64,
    ) -> Result<SourcedEstimate<f64>, EstimationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.acquisition
            .map(|estimate| SourcedEstimate {
                estimate,
                logic: "fixed".to_string(),
                source: EstimateSource::Collaborator,
            })
            .map_err(|()| EstimationError::NonMonotonic)
    }
}
