use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use nexasales::error::AppError;
use nexasales::workflows::segmentation::{ScriptedCollaborator, SegmentationWorkflow};

pub(crate) type Workflow = SegmentationWorkflow<ScriptedCollaborator>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) workflow: Arc<Workflow>,
}

pub(crate) const DEFAULT_SERVICE_DESCRIPTION: &str = "\
NexaSalesは、企業向けの営業支援SaaSプラットフォームです。
主な機能として、顧客データ管理、営業活動追跡、売上予測、営業レポート生成などがあります。
AIを活用した売上予測機能が特徴で、過去の営業データから将来の売上を高精度に予測します。
クラウドベースのサブスクリプションモデルで提供され、月額料金は企業規模に応じて変動します。
大企業向けのエンタープライズプランと中小企業向けのスタンダードプランがあります。";

pub(crate) const DEFAULT_MARKET_DATA: &str = "\
営業支援SaaS市場は年間15%の成長率で拡大しており、2023年の市場規模は約1兆円と推定されています。
大企業セグメントでは、高度な分析機能とエンタープライズ統合が重視されており、セキュリティ要件も厳しいです。
中小企業セグメントでは、使いやすさとコストパフォーマンスが重視されています。
成長企業は特に、成長に合わせてスケールできるソリューションを求めています。
主要な競合としては、SalesForce、HubSpot、Zoholなどがあります。
日本市場では、大企業の約60%、中小企業の約20%が何らかの営業支援ツールを導入しています。";

/// Canned replies from a JSON object file, or none when no file is given.
pub(crate) fn load_collaborator(path: Option<&Path>) -> Result<ScriptedCollaborator, AppError> {
    match path {
        Some(path) => Ok(ScriptedCollaborator::from_replies(read_json_map(path)?)),
        None => Ok(ScriptedCollaborator::new()),
    }
}

pub(crate) fn read_json_map(path: &Path) -> Result<BTreeMap<String, String>, AppError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
