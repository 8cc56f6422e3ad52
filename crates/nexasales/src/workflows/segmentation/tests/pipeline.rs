use super::common::*;
use crate::workflows::segmentation::domain::SegmentCatalog;
use crate::workflows::segmentation::pipeline::{
    RunStatus, ScriptedCollaborator, Stage, WorkflowError,
};
use crate::workflows::segmentation::priority::PriorityRank;

#[test]
fn offline_run_completes_every_stage() {
    let artifact = workflow(ScriptedCollaborator::new()).run(&pipeline_input());

    assert_eq!(artifact.status, RunStatus::Success);
    assert!(artifact.error.is_none());
    assert_eq!(artifact.stages.completed(), Stage::ordered().to_vec());
    assert!(artifact.workflow_id.starts_with("workflow-"));
    assert_eq!(artifact.workflow_id.len(), "workflow-20250101-000000".len());
    assert!(artifact.completed_at >= artifact.started_at);

    let report = artifact.report().expect("report");
    let order: Vec<_> = report
        .segment_evaluations
        .iter()
        .map(|evaluation| evaluation.segment_id.as_str())
        .collect();
    assert_eq!(order, ["s1", "s2", "s3", "s4"]);
    assert_eq!(report.segment_evaluations[0].priority_rank, PriorityRank::High);
}

#[test]
fn growth_rate_is_read_from_market_data() {
    let artifact = workflow(ScriptedCollaborator::new()).run(&pipeline_input());

    let evaluation = artifact.stages.priority_evaluation.expect("evaluated");
    assert!(evaluation
        .inputs
        .iter()
        .all(|input| (input.growth_rate - 0.12).abs() < 1e-12));
}

#[test]
fn offline_estimates_reflect_the_catalog_hints() {
    let artifact = workflow(ScriptedCollaborator::new()).run(&pipeline_input());

    let evaluation = artifact.stages.priority_evaluation.expect("evaluated");
    let signals: Vec<_> = evaluation
        .inputs
        .iter()
        .map(|input| (input.market_size, input.acquisition_probability))
        .collect();
    let hints: Vec<_> = SegmentCatalog::standard()
        .iter()
        .map(|segment| {
            (
                segment.market_size_hint.expect("size hint") as f64,
                segment.acquisition_probability_hint.expect("rate hint"),
            )
        })
        .collect();
    assert_eq!(signals, hints);

    let market = artifact.stages.market_potential.expect("market");
    let value: f64 = market
        .segments
        .iter()
        .map(|potential| potential.potential_value.expected)
        .sum();
    let companies: u64 = market
        .segments
        .iter()
        .map(|potential| potential.acquirable_companies)
        .sum();
    assert!((market.total_market_value - value).abs() < 1e-6);
    assert_eq!(market.total_acquirable_companies, companies);
    assert_eq!(market.total_acquirable_companies, 300 + 300 + 1000 + 400);
}

#[test]
fn collaborator_failure_stops_the_run_and_keeps_earlier_outputs() {
    let collaborator = ScriptedCollaborator::new().fail("reference_products", "timeout");

    let artifact = workflow(collaborator).run(&pipeline_input());

    assert_eq!(artifact.status, RunStatus::Failed);
    assert_eq!(artifact.failed_stage, Some(Stage::ReferenceProducts));
    assert!(artifact.error.as_deref().is_some_and(|e| e.contains("timeout")));
    assert_eq!(
        artifact.stages.completed(),
        [Stage::ServiceAnalysis, Stage::CustomerSegments]
    );
    assert!(artifact.report().is_none());

    match artifact.failure() {
        Some(WorkflowError::RunFailed { stage, .. }) => assert_eq!(stage, Stage::ReferenceProducts),
        None => panic!("failed run must surface an error"),
    }
}

#[test]
fn error_field_in_reply_is_a_stage_failure() {
    let collaborator =
        ScriptedCollaborator::new().reply("value_comparison", r#"{"error": "rate limited"}"#);

    let artifact = workflow(collaborator).run(&pipeline_input());

    assert_eq!(artifact.failed_stage, Some(Stage::ValueComparison));
    assert!(artifact
        .error
        .as_deref()
        .is_some_and(|e| e.contains("rate limited")));

    let json = serde_json::to_value(&artifact).expect("json");
    assert_eq!(json["status"], "failed");
    assert_eq!(json["failed_stage"], "value_comparison");
    assert!(json["stages"].get("reference_products").is_some());
    assert!(json["stages"].get("formula_design").is_none());
}

#[test]
fn unparseable_segment_reply_falls_back_to_catalog() {
    let collaborator =
        ScriptedCollaborator::new().reply("customer_segments", "セグメントは特定できませんでした");

    let artifact = workflow(collaborator).run(&pipeline_input());

    assert!(artifact.is_success());
    assert_eq!(artifact.stages.customer_segments, Some(SegmentCatalog::standard()));
}

#[test]
fn segment_parameters_override_table_defaults() {
    let mut input = pipeline_input();
    input
        .segment_parameters
        .insert("s2".to_string(), r#"{"annual_revenue": 2000000000}"#.to_string());

    let artifact = workflow(ScriptedCollaborator::new()).run(&input);

    let design = artifact.stages.formula_design.expect("designed");
    let s2 = design
        .formulas
        .iter()
        .find(|formula| formula.segment_id == "s2")
        .expect("s2 formula");
    assert_eq!(s2.parameters.annual_revenue, 2_000_000_000.0);
    assert!(design.validations.values().all(|validation| validation.is_valid));
}

#[test]
fn enrichment_replies_are_merged_into_segments() {
    let collaborator = ScriptedCollaborator::new()
        .reply(
            "segment_enrichment:s1",
            r#"{"industry_categories": ["製造業", "金融"], "example_companies": ["トヨタ"],
                "bant": {"need": ["商談の可視化"]}}"#,
        )
        .fail("segment_enrichment:s2", "unavailable")
        .reply("segment_enrichment:s3", "not json");

    let artifact = workflow(collaborator).run(&pipeline_input());

    assert!(artifact.is_success());
    let segments = artifact.stages.formula_design.expect("designed").segments;
    assert_eq!(segments[0].industry_categories, ["製造業", "金融"]);
    assert_eq!(segments[0].bant.need, ["商談の可視化"]);
    assert!(segments[1].industry_categories.is_empty());
    assert!(segments[2].industry_categories.is_empty());
}

#[test]
fn clashing_segment_ids_keep_their_own_evc_downstream() {
    let collaborator = ScriptedCollaborator::new().reply(
        "customer_segments",
        r#"[{"segment_id": "s2", "name": "大企業・低価値"},
            {"segment_id": "enterprise-hv", "name": "大企業・高価値"}]"#,
    );

    let artifact = workflow(collaborator).run(&pipeline_input());

    assert!(artifact.is_success());
    let segments = artifact.stages.customer_segments.as_ref().expect("segments");
    let ids: Vec<_> = segments.iter().map(|segment| segment.id.as_str()).collect();
    assert_eq!(ids, ["s2", "s1"]);

    let evc = artifact.stages.evc_calculation.as_ref().expect("evc");
    let evc_for = |id: &str| {
        evc.results
            .iter()
            .find(|result| result.segment_id == id)
            .map(|result| result.evc_value)
            .expect("evc result")
    };
    assert_eq!(evc_for("s2"), default_result("s2").evc_value);
    assert_eq!(evc_for("s1"), default_result("s1").evc_value);

    let market = artifact.stages.market_potential.as_ref().expect("market");
    assert_eq!(market.segments.len(), 2);
    for potential in &market.segments {
        assert_eq!(potential.evc_value, evc_for(&potential.segment_id));
    }

    let report = artifact.report().expect("report");
    let propositions: Vec<_> = report
        .segment_evaluations
        .iter()
        .map(|evaluation| evaluation.value_proposition.as_str())
        .collect();
    assert_ne!(propositions[0], propositions[1]);
}
