use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use nexasales::config::AppConfig;
use nexasales::error::AppError;
use nexasales::telemetry;
use nexasales::workflows::segmentation::pipeline::WorkflowSettings;
use nexasales::workflows::segmentation::{PipelineInput, RunArtifact, SegmentationWorkflow, Stage};
use tracing::info;

use crate::infra::{load_collaborator, read_json_map, DEFAULT_MARKET_DATA, DEFAULT_SERVICE_DESCRIPTION};

#[derive(Args, Debug, Default)]
pub(crate) struct RunArgs {
    /// Service description text. Defaults to the bundled NexaSales description.
    #[arg(long, conflicts_with = "service_file")]
    pub(crate) service_description: Option<String>,
    /// Read the service description from a file
    #[arg(long)]
    pub(crate) service_file: Option<PathBuf>,
    /// Read market data text from a file. Defaults to the bundled market summary.
    #[arg(long)]
    pub(crate) market_data_file: Option<PathBuf>,
    /// JSON object of characteristics text keyed by segment id
    #[arg(long)]
    pub(crate) segment_parameters: Option<PathBuf>,
    /// JSON object of canned collaborator replies keyed by task or task:segment_id
    #[arg(long)]
    pub(crate) responses: Option<PathBuf>,
    /// Where to write the run artifact (defaults to APP_OUTPUT_PATH)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

pub(crate) fn run_segmentation(args: RunArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let input = pipeline_input(&args)?;
    let collaborator = load_collaborator(args.responses.as_deref())?;
    let workflow = SegmentationWorkflow::new(collaborator, WorkflowSettings::from(&config.workflow));

    let artifact = workflow.run(&input);
    let output = args
        .output
        .unwrap_or_else(|| config.workflow.output_path.clone());
    write_artifact(&artifact, &output)?;
    info!(path = %output.display(), status = ?artifact.status, "run artifact written");

    print!("{}", render_summary(&artifact, &output));

    match artifact.failure() {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

fn pipeline_input(args: &RunArgs) -> Result<PipelineInput, AppError> {
    let service_description = match (&args.service_description, &args.service_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => fs::read_to_string(path)?,
        (None, None) => DEFAULT_SERVICE_DESCRIPTION.to_string(),
    };
    let market_data = match &args.market_data_file {
        Some(path) => fs::read_to_string(path)?,
        None => DEFAULT_MARKET_DATA.to_string(),
    };
    let segment_parameters = match &args.segment_parameters {
        Some(path) => read_json_map(path)?,
        None => Default::default(),
    };

    Ok(PipelineInput {
        service_description,
        market_data,
        segment_parameters,
    })
}

fn write_artifact(artifact: &RunArtifact, path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(artifact)?;
    fs::write(path, json)?;
    Ok(())
}

fn render_summary(artifact: &RunArtifact, output: &Path) -> String {
    let mut lines = vec![
        "===== 顧客セグメント優先度評価結果 =====".to_string(),
        format!("workflow: {} ({:?})", artifact.workflow_id, artifact.status),
    ];

    let completed = artifact.stages.completed();
    for stage in Stage::ordered() {
        let state = if completed.contains(&stage) {
            "正常完了".to_string()
        } else if artifact.failed_stage == Some(stage) {
            format!("エラー - {}", artifact.error.as_deref().unwrap_or_default())
        } else {
            "未実行".to_string()
        };
        lines.push(format!("- {} ({}): {state}", stage.label(), stage.key()));
    }

    if let Some(report) = artifact.report() {
        lines.push(format!("セグメント数: {}", report.summary.total_segments));
        for evaluation in &report.segment_evaluations {
            lines.push(format!(
                "  {} {}: {:.3} ({})",
                evaluation.segment_id,
                evaluation.segment_name,
                evaluation.priority_score,
                evaluation.priority_rank.label()
            ));
        }
    }

    lines.push(format!("詳細な結果は {} を参照してください。", output.display()));
    lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexasales::workflows::segmentation::{RunStatus, ScriptedCollaborator};
    use std::env;

    fn run_with(collaborator: ScriptedCollaborator) -> RunArtifact {
        let input = pipeline_input(&RunArgs::default()).expect("default input");
        SegmentationWorkflow::new(collaborator, WorkflowSettings::default()).run(&input)
    }

    #[test]
    fn defaults_use_bundled_texts() {
        let input = pipeline_input(&RunArgs::default()).expect("default input");

        assert_eq!(input.service_description, DEFAULT_SERVICE_DESCRIPTION);
        assert_eq!(input.market_data, DEFAULT_MARKET_DATA);
        assert!(input.segment_parameters.is_empty());
    }

    #[test]
    fn summary_lists_every_stage_and_ranked_segments() {
        let artifact = run_with(ScriptedCollaborator::new());

        let summary = render_summary(&artifact, Path::new("output.json"));

        assert_eq!(summary.matches("正常完了").count(), 8);
        assert!(summary.contains("セグメント数: 4"));
        assert!(summary.contains("output.json"));
    }

    #[test]
    fn summary_marks_failed_and_skipped_stages() {
        let artifact = run_with(ScriptedCollaborator::new().fail("customer_segments", "quota"));

        let summary = render_summary(&artifact, Path::new("out.json"));

        assert_eq!(artifact.status, RunStatus::Failed);
        assert!(summary.contains("(customer_segments): エラー"));
        assert!(summary.contains("quota"));
        assert_eq!(summary.matches("未実行").count(), 6);
    }

    #[test]
    fn artifact_is_written_as_pretty_json() {
        let dir = env::temp_dir().join(format!("nexasales-batch-{}", std::process::id()));
        let path = dir.join("nested").join("output.json");
        let artifact = run_with(ScriptedCollaborator::new());

        write_artifact(&artifact, &path).expect("written");
        let raw = fs::read_to_string(&path).expect("readable");
        fs::remove_dir_all(&dir).ok();

        let parsed: RunArtifact = serde_json::from_str(&raw).expect("round trips");
        assert_eq!(parsed.workflow_id, artifact.workflow_id);
        assert!(raw.contains("\n  \"status\": \"success\""));
        assert!(raw.contains("最優先") || raw.contains("高優先"));
    }
}
