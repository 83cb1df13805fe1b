use credit_score::config::AppConfig;
use credit_score::currency::{provider_from_config, FixedRate, RateProvider};
use credit_score::error::AppError;
use credit_score::scoring::{FeatureCatalog, ScoringService, TreeEnsembleClassifier};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Overrides applied on top of the environment configuration.
#[derive(Debug, Default)]
pub(crate) struct ServiceOverrides {
    pub(crate) model_path: Option<PathBuf>,
    pub(crate) rate: Option<f64>,
}

/// Load the model and catalog once and wire them into the scoring service.
pub(crate) fn build_scoring_service(
    config: &AppConfig,
    overrides: ServiceOverrides,
) -> Result<ScoringService<TreeEnsembleClassifier>, AppError> {
    let model_path = overrides
        .model_path
        .unwrap_or_else(|| config.model.path.clone());
    let classifier = Arc::new(TreeEnsembleClassifier::from_path(&model_path)?);

    let catalog = Arc::new(FeatureCatalog::load(&config.catalog)?);
    info!(
        features = catalog.feature_count(),
        locale = ?config.catalog.locale,
        "feature catalog loaded"
    );

    let rates: Arc<dyn RateProvider> = match overrides.rate {
        Some(rate) => Arc::new(FixedRate::new(rate)?),
        None => provider_from_config(&config.currency)?,
    };

    Ok(ScoringService::new(
        classifier,
        rates,
        catalog,
        config.model.ratio_scaling,
    ))
}
