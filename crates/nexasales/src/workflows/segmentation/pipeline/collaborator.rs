use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::Stage;
use crate::workflows::segmentation::domain::SegmentCatalog;

/// What the collaborator is being asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollaboratorTask {
    Stage(Stage),
    SegmentEnrichment,
    CompanyCount,
    AcquisitionRate,
}

impl CollaboratorTask {
    pub const fn key(self) -> &'static str {
        match self {
            Self::Stage(stage) => stage.key(),
            Self::SegmentEnrichment => "segment_enrichment",
            Self::CompanyCount => "company_count",
            Self::AcquisitionRate => "acquisition_rate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorRequest {
    pub task: CollaboratorTask,
    pub segment_id: Option<String>,
    pub prompt: String,
}

/// Error enumeration for collaborator failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    #[error("collaborator declined {0}")]
    Declined(&'static str),
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}

/// Opaque text producer standing in for the language-model layer.
pub trait Collaborator: Send + Sync {
    fn respond(&self, request: &CollaboratorRequest) -> Result<String, CollaboratorError>;
}

/// Works without any model. Analysis prompts are echoed back. Segmentation
/// and the estimates for catalog segments come from the standard catalog.
/// Anything else is declined.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineCollaborator;

impl Collaborator for OfflineCollaborator {
    fn respond(&self, request: &CollaboratorRequest) -> Result<String, CollaboratorError> {
        match request.task {
            CollaboratorTask::Stage(Stage::CustomerSegments) => Ok(catalog_json()),
            CollaboratorTask::Stage(
                Stage::ServiceAnalysis | Stage::ReferenceProducts | Stage::ValueComparison,
            ) => Ok(request.prompt.clone()),
            CollaboratorTask::CompanyCount | CollaboratorTask::AcquisitionRate => {
                catalog_estimate(request).ok_or(CollaboratorError::Declined(request.task.key()))
            }
            task => Err(CollaboratorError::Declined(task.key())),
        }
    }
}

fn catalog_json() -> String {
    let segments: Vec<_> = SegmentCatalog::standard()
        .into_iter()
        .map(|segment| {
            json!({
                "segment_id": segment.id,
                "name": segment.name,
                "description": segment.description,
                "value_potential": segment.value_potential,
                "implementation_ease": segment.implementation_ease,
                "characteristics": segment.characteristics,
                "market_size": segment.market_size_hint,
                "acquisition_probability": segment.acquisition_probability_hint,
            })
        })
        .collect();
    json!({ "segments": segments }).to_string()
}

/// A triple around the catalog hint, spread like the default fallback triples.
fn catalog_estimate(request: &CollaboratorRequest) -> Option<String> {
    let segment_id = request.segment_id.as_deref()?;
    let segment = SegmentCatalog::standard()
        .into_iter()
        .find(|segment| segment.id == segment_id)?;
    let (min, expected, max) = match request.task {
        CollaboratorTask::CompanyCount => {
            let size = segment.market_size_hint? as f64;
            (size / 5.0, size, size * 2.0)
        }
        CollaboratorTask::AcquisitionRate => {
            let rate = segment.acquisition_probability_hint?;
            (rate / 3.0, rate, (rate * 2.0).min(1.0))
        }
        _ => return None,
    };
    Some(
        json!({
            "min": min,
            "expected": expected,
            "max": max,
            "logic": "標準カタログの参考値",
        })
        .to_string(),
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptedReply {
    Reply(String),
    Fail(String),
}

/// Replays canned replies keyed by `task` or `task:segment_id`, deferring to
/// [`OfflineCollaborator`] for anything not scripted.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCollaborator {
    replies: BTreeMap<String, ScriptedReply>,
    fallback: OfflineCollaborator,
}

impl ScriptedCollaborator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_replies(replies: BTreeMap<String, String>) -> Self {
        Self {
            replies: replies
                .into_iter()
                .map(|(key, reply)| (key, ScriptedReply::Reply(reply)))
                .collect(),
            fallback: OfflineCollaborator,
        }
    }

    pub fn reply(mut self, key: impl Into<String>, reply: impl Into<String>) -> Self {
        self.replies
            .insert(key.into(), ScriptedReply::Reply(reply.into()));
        self
    }

    pub fn fail(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.replies
            .insert(key.into(), ScriptedReply::Fail(message.into()));
        self
    }

    fn lookup(&self, request: &CollaboratorRequest) -> Option<&ScriptedReply> {
        let task = request.task.key();
        request
            .segment_id
            .as_ref()
            .and_then(|segment_id| self.replies.get(&format!("{task}:{segment_id}")))
            .or_else(|| self.replies.get(task))
    }
}

impl Collaborator for ScriptedCollaborator {
    fn respond(&self, request: &CollaboratorRequest) -> Result<String, CollaboratorError> {
        match self.lookup(request) {
            Some(ScriptedReply::Reply(reply)) => Ok(reply.clone()),
            Some(ScriptedReply::Fail(message)) => {
                Err(CollaboratorError::Unavailable(message.clone()))
            }
            None => self.fallback.respond(request),
        }
    }
}
