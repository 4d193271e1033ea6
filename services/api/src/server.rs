use crate::cli::ServeArgs;
use crate::infra::{seed_stores, AppState, InMemoryDocumentStore, InMemoryProfileStore};
use crate::routes::with_eligibility_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use crs_advisor::config::AppConfig;
use crs_advisor::error::AppError;
use crs_advisor::telemetry;
use crs_advisor::workflows::eligibility::{EligibilityEngine, EligibilityService};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let engine = Arc::new(EligibilityEngine::from_policy(&config.policy)?);
    info!(
        program_maximum = engine.grid().program_maximum,
        medium_from = engine.thresholds().medium_from,
        strong_from = engine.thresholds().strong_from,
        "eligibility policy loaded"
    );

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let profiles = Arc::new(InMemoryProfileStore::default());
    let documents = Arc::new(InMemoryDocumentStore::default());
    if let Some(seed) = args.seed.take() {
        let users = seed_stores(&seed, &profiles, &documents)?;
        info!(users, path = %seed.display(), "profiles preloaded");
    }
    let service = Arc::new(EligibilityService::new(profiles, documents, engine));

    let app = with_eligibility_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "crs eligibility service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
