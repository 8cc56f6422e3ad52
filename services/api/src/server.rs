use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use nexasales::config::AppConfig;
use nexasales::error::AppError;
use nexasales::telemetry;
use nexasales::workflows::segmentation::pipeline::WorkflowSettings;
use nexasales::workflows::segmentation::SegmentationWorkflow;
use tracing::info;

use crate::cli::ServeArgs;
use crate::infra::{load_collaborator, AppState};
use crate::routes::router;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let collaborator = load_collaborator(args.responses.as_deref())?;
    let workflow = SegmentationWorkflow::new(collaborator, WorkflowSettings::from(&config.workflow));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        workflow: Arc::new(workflow),
    };

    let app = router()
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "segmentation service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
