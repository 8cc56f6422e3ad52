use nexasales::workflows::segmentation::{
    calculate_formula, domain::SegmentCatalog,
    ingest::characteristics::CharacteristicsProfile, FormulaCustomizer, OfflineCollaborator,
    PipelineInput, RunStatus, ScriptedCollaborator, SegmentationWorkflow, Stage,
    WorkflowSettings,
};

fn input() -> PipelineInput {
    PipelineInput {
        service_description: "NexaSales: AIを活用した営業支援SaaS。商談記録の自動分析と成約予測を提供する。"
            .to_string(),
        market_data: "国内SFA市場は約3,000億円。\n年間成長率は8%と推定される。".to_string(),
        ..PipelineInput::default()
    }
}

#[test]
fn default_parameters_rank_enterprise_high_value_first() {
    let customizer = FormulaCustomizer::default();
    let profile = CharacteristicsProfile::default();

    let results: Vec<_> = SegmentCatalog::standard()
        .iter()
        .map(|segment| {
            let formula = customizer.customize(segment, &profile);
            assert_eq!(formula.parameters.reference_price, 15_000.0);
            assert_eq!(formula.parameters.implementation_years, 3.0);
            (formula.adjustments, calculate_formula(&formula).expect("valid formula"))
        })
        .collect();

    let (s1_adjustments, s1) = &results[0];
    let (s4_adjustments, s4) = &results[3];
    assert_eq!(s1_adjustments.re, 0.2);
    assert_eq!(s1_adjustments.i, -0.2);
    assert_eq!(s4_adjustments.re, -0.2);
    assert_eq!(s4_adjustments.i, 0.2);

    assert!(results
        .iter()
        .all(|(_, result)| (result.evc_value - result.identity_value()).abs() < 1e-9));
    assert!(results
        .windows(2)
        .all(|pair| pair[0].1.evc_value > pair[1].1.evc_value));
    assert!(s1.implementation_details.weight < s4.implementation_details.weight);
}

#[test]
fn offline_run_produces_a_ranked_report() {
    let workflow = SegmentationWorkflow::new(OfflineCollaborator, WorkflowSettings::default());

    let artifact = workflow.run(&input());

    assert_eq!(artifact.status, RunStatus::Success);
    let report = artifact.report().expect("report present");
    assert_eq!(report.summary.total_segments, 4);
    let scores: Vec<f64> = report
        .segment_evaluations
        .iter()
        .map(|evaluation| evaluation.priority_score)
        .collect();
    assert!(scores.windows(2).all(|pair| pair[0] >= pair[1]));
    assert!(scores.iter().all(|score| (0.0..=1.0).contains(score)));
    assert_eq!(report.segment_evaluations[0].segment_id, "s1");
    assert!(report
        .segment_evaluations
        .iter()
        .all(|evaluation| !evaluation.action_plan.kpis.is_empty()));
}

#[test]
fn repeated_runs_yield_identical_report_json() {
    let workflow = SegmentationWorkflow::new(OfflineCollaborator, WorkflowSettings::default());

    let first = workflow.run(&input());
    let second = workflow.run(&input());

    let first = serde_json::to_string(first.report().expect("report")).expect("json");
    let second = serde_json::to_string(second.report().expect("report")).expect("json");
    assert_eq!(first, second);
}

#[test]
fn configured_growth_rate_applies_when_market_data_is_silent() {
    let workflow = SegmentationWorkflow::new(
        ScriptedCollaborator::new(),
        WorkflowSettings {
            market_growth_rate: Some(0.05),
        },
    );
    let input = PipelineInput {
        market_data: "市場規模のみ判明".to_string(),
        ..input()
    };

    let artifact = workflow.run(&input);

    let evaluation = artifact.stages.priority_evaluation.expect("evaluated");
    assert!(evaluation.inputs.iter().all(|input| input.growth_rate == 0.05));
}

#[test]
fn failed_stage_is_recorded_with_partial_outputs() {
    let workflow = SegmentationWorkflow::new(
        ScriptedCollaborator::new().fail("service_analysis", "model offline"),
        WorkflowSettings::default(),
    );

    let artifact = workflow.run(&input());

    assert_eq!(artifact.status, RunStatus::Failed);
    assert_eq!(artifact.failed_stage, Some(Stage::ServiceAnalysis));
    assert!(artifact.stages.completed().is_empty());
    let err = artifact.failure().expect("failure surfaced");
    assert!(err.to_string().contains("service_analysis"));
}
