//! Credit scoring: feature derivation, the classifier adapter, and the recommendation engine.

pub mod analyzer;
pub mod catalog;
pub mod classifier;
pub mod features;
pub mod impact;
pub mod recommendation;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use analyzer::FeatureAnalyzer;
pub use catalog::{
    CatalogError, FeatureCatalog, FeatureConfig, FeatureStatus, Locale, MessageTemplates,
    ThresholdBand,
};
pub use classifier::{Classifier, ClassifierError, TreeEnsembleClassifier};
pub use features::{
    BorrowerProfile, FeatureKey, FeatureValues, ModelInput, RatioScaling, ValidationError,
    MODEL_FEATURE_ORDER,
};
pub use recommendation::{
    NotNeedImprovement, Recommendation, RecommendationResult, RELEVANCE_THRESHOLD,
};
pub use router::scoring_router;
pub use service::{loan_advice, LoanAdvice, PredictionResponse, ScoringService, ScoringServiceError};

/// Contract violations raised while turning a feature set into advice.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("missing field: {0}")]
    MissingFeature(FeatureKey),
    #[error("feature {feature} has invalid normalization ceiling {ceiling}")]
    InvalidCeiling { feature: FeatureKey, ceiling: f64 },
}
