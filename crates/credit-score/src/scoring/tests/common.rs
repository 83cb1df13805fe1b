use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::currency::{CurrencyError, FixedRate, RateProvider};
use crate::scoring::classifier::{Classifier, ClassifierError};
use crate::scoring::{
    BorrowerProfile, FeatureCatalog, FeatureKey, FeatureValues, RatioScaling, ScoringService,
    MODEL_FEATURE_ORDER,
};

/// Classifier double returning a fixed label and caller-chosen importances.
pub(super) struct StubClassifier {
    pub(super) label: f64,
    pub(super) importances: Vec<f64>,
}

impl Classifier for StubClassifier {
    fn predict(&self, features: &[f64]) -> Result<f64, ClassifierError> {
        if features.len() != MODEL_FEATURE_ORDER.len() {
            return Err(ClassifierError::InputLength {
                expected: MODEL_FEATURE_ORDER.len(),
                found: features.len(),
            });
        }
        Ok(self.label)
    }

    fn feature_importances(&self) -> &[f64] {
        &self.importances
    }
}

pub(super) struct UnavailableRates;

#[async_trait]
impl RateProvider for UnavailableRates {
    async fn rate(&self) -> Result<f64, CurrencyError> {
        Err(CurrencyError::Status(503))
    }
}

pub(super) fn weights(pairs: &[(FeatureKey, f64)]) -> Vec<f64> {
    MODEL_FEATURE_ORDER
        .iter()
        .map(|key| {
            pairs
                .iter()
                .find(|(candidate, _)| candidate == key)
                .map(|(_, weight)| *weight)
                .unwrap_or(0.0)
        })
        .collect()
}

pub(super) fn catalog() -> Arc<FeatureCatalog> {
    Arc::new(FeatureCatalog::english().expect("english catalog"))
}

pub(super) fn classifier(label: f64, pairs: &[(FeatureKey, f64)]) -> Arc<StubClassifier> {
    Arc::new(StubClassifier {
        label,
        importances: weights(pairs),
    })
}

/// Values sitting on the good side of every configured threshold.
pub(super) fn healthy_values(catalog: &FeatureCatalog) -> FeatureValues {
    MODEL_FEATURE_ORDER
        .iter()
        .map(|&key| {
            let value = match catalog.lookup(key) {
                Some(config) if config.status.is_negative => 0.0,
                Some(config) => config.threshold.good + 1.0,
                None => 1.0,
            };
            (key, value)
        })
        .collect()
}

pub(super) fn profile() -> BorrowerProfile {
    BorrowerProfile {
        total_credit_limit: 200000.0,
        used_credit_amount: 20000.0,
        available_credit_limit: 180000.0,
        accounts_with_late_payments: 0,
        total_accounts: 8,
        number_of_derogatory_records: 0,
        number_of_collections: 0,
        months_since_first_credit: 200,
        accounts_with_75_percent_limit: 0,
        credits_overdue_120_days: 0,
        total_taken_credits: 6,
        credits_taken_last_2_years: 1,
        total_card_balance: 160000.0,
        total_income: 50000.0,
        monthly_debt_payments: 10.0,
        credits_overdue_30_days: 0,
        home_ownership_rent: false,
        home_ownership_mortgage: false,
        home_ownership_own: true,
        home_ownership_any: false,
        home_ownership_other: false,
        home_ownership_none: false,
    }
}

pub(super) fn service(
    label: f64,
    pairs: &[(FeatureKey, f64)],
    rate: f64,
) -> ScoringService<StubClassifier> {
    ScoringService::new(
        classifier(label, pairs),
        Arc::new(FixedRate::new(rate).expect("valid rate")),
        catalog(),
        RatioScaling::TruncatedPercent,
    )
}

pub(super) fn unavailable_rate_service(pairs: &[(FeatureKey, f64)]) -> ScoringService<StubClassifier> {
    ScoringService::new(
        classifier(700.0, pairs),
        Arc::new(UnavailableRates),
        catalog(),
        RatioScaling::TruncatedPercent,
    )
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
