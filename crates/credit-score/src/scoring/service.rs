use std::sync::Arc;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::analyzer::FeatureAnalyzer;
use super::catalog::FeatureCatalog;
use super::classifier::{Classifier, ClassifierError};
use super::features::{BorrowerProfile, ModelInput, RatioScaling, ValidationError};
use super::recommendation::RecommendationResult;
use super::ScoringError;
use crate::currency::{convert_to_usd, CurrencyError, RateProvider};

/// Combined classifier output and feature advice for one borrower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: i64,
    pub recommendations: RecommendationResult,
}

/// Coarse guidance derived from a predicted score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanAdvice {
    pub recommendation: String,
}

pub fn loan_advice(prediction: f64) -> LoanAdvice {
    let recommendation = if prediction < 600.0 {
        "You should not apply for a loan"
    } else if prediction < 700.0 {
        "You should apply for a loan with caution"
    } else {
        "You should apply for a loan"
    };
    LoanAdvice {
        recommendation: recommendation.to_string(),
    }
}

/// Service composing currency normalization, the classifier, and the feature analyzer.
pub struct ScoringService<C> {
    classifier: Arc<C>,
    rates: Arc<dyn RateProvider>,
    analyzer: FeatureAnalyzer<C>,
    ratio_scaling: RatioScaling,
}

impl<C> ScoringService<C>
where
    C: Classifier + 'static,
{
    pub fn new(
        classifier: Arc<C>,
        rates: Arc<dyn RateProvider>,
        catalog: Arc<FeatureCatalog>,
        ratio_scaling: RatioScaling,
    ) -> Self {
        let analyzer = FeatureAnalyzer::new(catalog, classifier.clone());
        Self {
            classifier,
            rates,
            analyzer,
            ratio_scaling,
        }
    }

    /// Score a borrower and attach ranked improvement advice.
    pub async fn predict(
        &self,
        profile: BorrowerProfile,
    ) -> Result<PredictionResponse, ScoringServiceError> {
        let input = self.prepare(profile).await?;
        let label = self.classifier.predict(&input.vector())?;
        let recommendations = self.analyzer.analyze(input.values())?;

        info!(
            prediction = label,
            recommendations = recommendations.recommendations().len(),
            "credit score predicted"
        );

        Ok(PredictionResponse {
            prediction: label.trunc() as i64,
            recommendations,
        })
    }

    /// Produce improvement advice without reporting the score.
    pub async fn recommend(
        &self,
        profile: BorrowerProfile,
    ) -> Result<RecommendationResult, ScoringServiceError> {
        let input = self.prepare(profile).await?;
        Ok(self.analyzer.analyze(input.values())?)
    }

    async fn prepare(&self, profile: BorrowerProfile) -> Result<ModelInput, ScoringServiceError> {
        profile.validate()?;
        let rate = self.rates.rate().await?;
        debug!(rate, "normalizing profile amounts to USD");
        let converted = convert_to_usd(&profile, rate);
        Ok(ModelInput::derive(&converted, self.ratio_scaling))
    }
}

/// Error raised by the scoring service.
#[derive(Debug, thiserror::Error)]
pub enum ScoringServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("currency conversion unavailable: {0}")]
    Currency(#[from] CurrencyError),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

impl ScoringServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ScoringServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ScoringServiceError::Currency(_) => StatusCode::BAD_GATEWAY,
            ScoringServiceError::Classifier(_) | ScoringServiceError::Scoring(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
