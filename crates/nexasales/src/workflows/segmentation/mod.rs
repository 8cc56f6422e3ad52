//! Customer segmentation: EVC formulas per segment, market potential, and a
//! weighted priority ranking with strategy text.

pub mod domain;
pub mod evc;
pub mod formula;
pub mod ingest;
pub mod market;
pub mod pipeline;
pub mod priority;
pub mod report;

#[cfg(test)]
mod tests;

pub use domain::{Rating, Segment, SegmentCatalog, SegmentTraits, SegmentType};
pub use evc::{calculate_formula, EvcError, EvcParameters, EvcResult};
pub use formula::{ComponentWeights, CustomizedFormula, FormulaCustomizer};
pub use market::{estimate_potential, MarketPotential, MarketPotentialReport, PotentialError};
pub use pipeline::{
    Collaborator, OfflineCollaborator, PipelineInput, RunArtifact, RunStatus,
    ScriptedCollaborator, SegmentationWorkflow, Stage, WorkflowError, WorkflowSettings,
};
pub use priority::{PriorityInput, PriorityRank, PriorityScore, PriorityScorer};
pub use report::PriorityReport;
